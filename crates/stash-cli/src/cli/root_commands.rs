use clap::{Args, Subcommand};

use crate::cli::subcommands::{ProjectCommands, ReviewCommands, TaskCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Capture a thought; it is classified and filed in the background.
    Capture(CaptureArgs),
    /// List captured thoughts, newest first.
    Inbox(InboxArgs),
    /// Classify and file every pending capture once, then exit.
    Process,
    /// Keep classifying and filing captures until interrupted.
    Watch,
    /// Captures the classifier was not sure about.
    Review {
        #[command(subcommand)]
        action: ReviewCommands,
    },
    /// Tasks.
    Task {
        #[command(subcommand)]
        action: TaskCommands,
    },
    /// Projects.
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Activity feed, newest first.
    Activity(ActivityArgs),
    /// Ask the assistant about your tasks and projects.
    Ask(AskArgs),
    /// Dump JSON schema for a wire or entity type.
    Schema(SchemaArgs),
}

/// Arguments for `stash capture`.
#[derive(Clone, Debug, Args)]
pub struct CaptureArgs {
    /// The thought, exactly as it comes to mind.
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

/// Arguments for `stash inbox`.
#[derive(Clone, Debug, Args)]
pub struct InboxArgs {
    /// Only captures with this status (pending, success, needs-review, discarded).
    #[arg(long)]
    pub status: Option<String>,
}

/// Arguments for `stash activity`.
#[derive(Clone, Debug, Args)]
pub struct ActivityArgs {
    /// Only entries of this type (ai-processed, user-update, user-complete, user-create-project).
    #[arg(long = "type")]
    pub activity_type: Option<String>,
}

/// Arguments for `stash ask`.
#[derive(Clone, Debug, Args)]
pub struct AskArgs {
    /// The question, e.g. "what can I do at home in 15 minutes?".
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}

/// Arguments for `stash schema`.
#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// One of: classification, subtasks, grouping, chat, capture, task, project, activity.
    pub type_name: String,
}
