//! Terminal tables for `mb plan`.
//!
//! Columns size to their widest cell (ANSI colors ignored) and shrink to the
//! terminal width, widest column first.

use colored::*;
use console::{measure_text_width, truncate_str};

/// Narrowest a column gets when the table has to shrink.
const MIN_COLUMN: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        for line in self.render(term_width as usize) {
            println!("{}", line);
        }
    }

    /// Lines of the table, fitted to `max_width` columns where possible.
    pub fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }

        let widths = self.column_widths(max_width);
        let border = |left: &str, mid: &str, right: &str| {
            let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, inner.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| {
            let mut out = String::from("  │");
            for (cell, &width) in cells.iter().zip(&widths) {
                let flat = flatten(cell);
                let text = truncate_str(&flat, width, "...");
                let pad = width.saturating_sub(measure_text_width(&text));
                let text = if bold {
                    text.bold().to_string()
                } else {
                    text.to_string()
                };
                out.push_str(&format!(" {}{} │", text, " ".repeat(pad)));
            }
            out
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 4);
        lines.push(border("┌", "┬", "┐"));
        lines.push(line(&self.headers, true));
        lines.push(border("├", "┼", "┤"));
        for row in &self.rows {
            lines.push(line(row, false));
        }
        lines.push(border("└", "┴", "┘"));
        lines
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| measure_text_width(h))
            .collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(measure_text_width(&flatten(cell)));
            }
        }

        // indent + outer borders + " x │" per column
        let overhead = 3 + 3 * widths.len();
        let available = max_width.saturating_sub(overhead);
        let mut total: usize = widths.iter().sum();
        while total > available {
            let Some(widest) = widths
                .iter_mut()
                .filter(|w| **w > MIN_COLUMN)
                .max_by_key(|w| **w)
            else {
                break;
            };
            *widest -= 1;
            total -= 1;
        }
        widths
    }
}

fn flatten(s: &str) -> String {
    s.replace(['\n', '\r', '\t'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: Vec<String>) -> Vec<String> {
        lines
            .iter()
            .map(|l| console::strip_ansi_codes(l).to_string())
            .collect()
    }

    #[test]
    fn test_render_aligns_columns() {
        let mut table = Table::new(&["Module", "Status"]);
        table.add_row(vec!["ui.widget".into(), "fresh".into()]);
        table.add_row(vec!["a".into(), "changed".into()]);

        let lines = plain(table.render(200));
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "  │ Module    │ Status  │");
        assert_eq!(lines[3], "  │ ui.widget │ fresh   │");
        assert_eq!(lines[4], "  │ a         │ changed │");
        assert!(lines[0].starts_with("  ┌"));
    }

    #[test]
    fn test_render_shrinks_widest_column() {
        let mut table = Table::new(&["Module", "Status"]);
        table.add_row(vec!["x".repeat(40), "ok".into()]);

        let lines = plain(table.render(30));
        assert!(lines.iter().all(|l| measure_text_width(l) <= 30));
        assert!(lines[3].contains("..."));
    }

    #[test]
    fn test_mismatched_rows_are_dropped() {
        let mut table = Table::new(&["A", "B"]);
        table.add_row(vec!["only one".into()]);
        assert!(table.is_empty());
        assert!(Table::new(&[]).render(80).is_empty());
    }
}
