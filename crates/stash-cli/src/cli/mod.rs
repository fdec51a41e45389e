use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `stash` binary.
#[derive(Debug, Parser)]
#[command(
    name = "stash",
    version,
    about = "Stash - capture thoughts now, let them file themselves"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub const fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::subcommands::{ProjectCommands, ReviewCommands, TaskCommands};
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from(["stash", "--format", "table", "--limit", "10", "inbox"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(cli.limit, Some(10));
        assert!(matches!(cli.command, Commands::Inbox(_)));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["stash", "process", "--format", "raw", "--quiet"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Process));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["stash", "--format", "xml", "inbox"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn capture_joins_words_into_one_thought() {
        let cli = Cli::try_parse_from(["stash", "capture", "buy", "milk", "tomorrow"])
            .expect("cli should parse");

        let Commands::Capture(args) = cli.command else {
            panic!("expected capture");
        };
        assert_eq!(args.text.join(" "), "buy milk tomorrow");
    }

    #[test]
    fn ask_joins_words_into_one_question() {
        let cli = Cli::try_parse_from(["stash", "ask", "what's", "due", "--format", "raw"])
            .expect("cli should parse");

        let Commands::Ask(args) = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(args.question.join(" "), "what's due");
        assert!(Cli::try_parse_from(["stash", "ask"]).is_err());
    }

    #[test]
    fn review_edit_accepts_repeated_contexts() {
        let cli = Cli::try_parse_from([
            "stash",
            "review",
            "edit",
            "cap-1",
            "--context",
            "@home",
            "--context",
            "@computer",
            "--new-project",
        ])
        .expect("cli should parse");

        let Commands::Review {
            action: ReviewCommands::Edit(args),
        } = cli.command
        else {
            panic!("expected review edit");
        };
        assert_eq!(args.id, "cap-1");
        assert_eq!(args.context, vec!["@home", "@computer"]);
        assert!(args.new_project);
        assert!(args.project_id.is_none());
    }

    #[test]
    fn review_edit_rejects_new_project_with_project_id() {
        let parsed = Cli::try_parse_from([
            "stash",
            "review",
            "edit",
            "cap-1",
            "--project-id",
            "prj-1",
            "--new-project",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn nested_commands_parse() {
        let cli = Cli::try_parse_from(["stash", "review", "assign", "cap-1", "prj-2"])
            .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Review {
                action: ReviewCommands::Assign { .. }
            }
        ));

        let cli = Cli::try_parse_from(["stash", "task", "list", "--project", "prj-2"])
            .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Task {
                action: TaskCommands::List { .. }
            }
        ));

        let cli = Cli::try_parse_from([
            "stash", "project", "create", "--name", "Garden", "--outcome", "Tidy beds",
        ])
        .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Project {
                action: ProjectCommands::Create { .. }
            }
        ));
    }
}
