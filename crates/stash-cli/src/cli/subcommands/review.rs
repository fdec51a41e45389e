use clap::{Args, Subcommand};

/// Review queue commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ReviewCommands {
    /// List captures waiting for review, oldest first.
    List,
    /// Show one capture with its draft.
    Show { id: String },
    /// Edit the draft before accepting it.
    Edit(ReviewEditArgs),
    /// File the capture using its current draft.
    Accept { id: String },
    /// Drop the capture without filing anything.
    Discard { id: String },
    /// File the capture into an existing project.
    Assign { id: String, project_id: String },
    /// File the capture into a new project called NAME.
    #[command(name = "create-project")]
    CreateProject { id: String, name: String },
}

/// Arguments for `stash review edit`.
#[derive(Clone, Debug, Args)]
pub struct ReviewEditArgs {
    pub id: String,
    /// New task title.
    #[arg(long)]
    pub title: Option<String>,
    /// Time estimate: 5, 15, 30 or 60 (minutes).
    #[arg(long)]
    pub time: Option<String>,
    /// Energy level; pass an empty string to clear it.
    #[arg(long)]
    pub energy: Option<String>,
    /// Context tag; repeat for several. Replaces the existing contexts.
    #[arg(long)]
    pub context: Vec<String>,
    /// GTD list: next, waiting, someday.
    #[arg(long)]
    pub list: Option<String>,
    /// Project name shown on the draft.
    #[arg(long)]
    pub project_name: Option<String>,
    /// Point the draft at an existing project id.
    #[arg(long, conflicts_with = "new_project")]
    pub project_id: Option<String>,
    /// File into a new project named by --project-name (or the current name).
    #[arg(long)]
    pub new_project: bool,
    /// Outcome for a new project.
    #[arg(long)]
    pub outcome: Option<String>,
}
