use clap::Subcommand;

/// Project commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ProjectCommands {
    /// List projects.
    List {
        /// active, completed or archived.
        #[arg(long)]
        status: Option<String>,
    },
    /// Create a project by hand.
    Create {
        #[arg(long)]
        name: String,
        /// What "done" looks like.
        #[arg(long)]
        outcome: String,
    },
    /// Sort a project's uncategorized tasks into categories.
    Group { id: String },
}
