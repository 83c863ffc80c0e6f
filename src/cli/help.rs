//! `help-all`: every command's help in one document.

use anyhow::Result;
use clap::{Command, CommandFactory, Parser};

/// Help command for displaying comprehensive usage information.
#[derive(Parser)]
pub struct HelpCommand {}

/// Collects the help text of a command tree.
pub struct HelpGenerator {
    app: Command,
}

impl HelpGenerator {
    /// Creates a generator for the reportr command tree.
    pub fn new() -> Self {
        Self {
            app: crate::cli::Cli::command(),
        }
    }
}

impl Default for HelpGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpGenerator {
    /// Help for the root command followed by every subcommand, depth first.
    ///
    /// Subcommands are sorted by name so the output is stable.
    pub fn generate_all_help(&self) -> Result<String> {
        let mut sections = vec![render_command_help(&self.app, "")];
        collect_help(&self.app, "", &mut sections);
        let separator = format!("\n\n{}\n\n", "=".repeat(80));
        Ok(sections.join(&separator))
    }
}

fn collect_help(cmd: &Command, prefix: &str, sections: &mut Vec<String>) {
    let mut subcommands: Vec<&Command> = cmd
        .get_subcommands()
        .filter(|sub| sub.get_name() != "help")
        .collect();
    subcommands.sort_by(|a, b| a.get_name().cmp(b.get_name()));

    for sub in subcommands {
        let path = if prefix.is_empty() {
            sub.get_name().to_string()
        } else {
            format!("{prefix} {}", sub.get_name())
        };
        sections.push(render_command_help(sub, &path));
        collect_help(sub, &path, sections);
    }
}

fn render_command_help(cmd: &Command, path: &str) -> String {
    let name = if path.is_empty() {
        cmd.get_name().to_string()
    } else {
        format!("reportr {path}")
    };
    let about = cmd
        .get_about()
        .map_or_else(|| "No description available".to_string(), ToString::to_string);
    format!("{name} - {about}\n\n{}", cmd.clone().render_help())
}

impl HelpCommand {
    /// Prints help for every command.
    pub fn execute(self) -> Result<()> {
        println!("{}", HelpGenerator::new().generate_all_help()?);
        Ok(())
    }
}
