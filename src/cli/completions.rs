//! Completions command implementation

use crate::cli::{Cli, CompletionsArgs};
use clap::CommandFactory;
use clap_complete::generate;
use std::io;

/// Handle `rotor completions`.
pub fn handle_completions(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, bin_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap_complete::Shell;

    #[test]
    fn command_definition_is_consistent() {
        // generate() relies on a well-formed command tree; debug_assert
        // catches conflicting flags and missing subcommand metadata.
        Cli::command().debug_assert();
    }

    #[test]
    fn completions_render_for_bash() {
        let mut cmd = Cli::command();
        let mut out = Vec::new();
        generate(Shell::Bash, &mut cmd, "rotor", &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("rotor"));
    }
}
