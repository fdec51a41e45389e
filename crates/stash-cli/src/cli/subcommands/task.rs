use clap::Subcommand;

/// Task commands.
#[derive(Clone, Debug, Subcommand)]
pub enum TaskCommands {
    /// List tasks.
    List {
        #[arg(long)]
        project: Option<String>,
        /// GTD list: inbox, next, waiting, someday.
        #[arg(long)]
        list: Option<String>,
        /// todo or done.
        #[arg(long)]
        status: Option<String>,
    },
    /// Get a task by ID.
    Get { id: String },
    /// Mark a task done.
    Complete { id: String },
    /// Break a task into subtasks.
    Decompose { id: String },
}
