use colored::*;

pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str) -> Option<String> {
        // 1. Compiler could not be spawned at all
        if output.contains("Failed to execute") {
            return Some(format!(
                "The compiler could not be started.\nInstall {} or point {} (or {}) at a module-capable compiler.",
                "clang++".bold().yellow(),
                "[build] compiler".bold().green(),
                "$CXX".bold().green()
            ));
        }

        // 2. Compiler without --precompile support (e.g. g++)
        if output.contains("--precompile")
            && (output.contains("unrecognized") || output.contains("unknown argument"))
        {
            return Some(format!(
                "This compiler does not understand {}.\nModule builds need {}; set {} in mb.toml.",
                "--precompile".bold(),
                "clang++".bold().yellow(),
                "[build] compiler".bold().green()
            ));
        }

        // 3. Import of a module with no precompiled artifact
        if output.contains("module file") && output.contains("not found")
            || output.contains("could not find module")
            || (output.contains("module '") && output.contains("not found"))
        {
            return Some(format!(
                "A {} could not be resolved.\nCheck the import name against its {} declaration, or an earlier failure in one of its imports.",
                "Module Import".bold().red(),
                "export module".bold().yellow()
            ));
        }

        // 4. Entry file without main (Linker Error)
        if output.contains("undefined reference to `main'")
            || output.contains("entry point must be defined")
        {
            return Some(format!(
                "Your entry file is missing a {} function.\nCheck {} in mb.toml.",
                "main()".bold().yellow(),
                "[project] entry".bold().green()
            ));
        }

        // 5. Generic Missing Library (Linker Error)
        if output.contains("undefined reference to") || output.contains("LNK2019") {
            return Some(format!(
                "It looks like a {} error.\nYou might be missing a library in {}.",
                "Linker".bold().red(),
                "[build] libs".bold().yellow()
            ));
        }

        None
    }
}
