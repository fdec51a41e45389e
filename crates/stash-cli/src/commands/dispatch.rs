use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Capture(args) => commands::capture::handle(&args, ctx, flags).await,
        Commands::Inbox(args) => commands::inbox::handle(&args, ctx, flags).await,
        Commands::Process => commands::process::handle(ctx, flags).await,
        Commands::Watch => commands::watch::handle(ctx, flags).await,
        Commands::Review { action } => commands::review::handle(&action, ctx, flags).await,
        Commands::Task { action } => commands::task::handle(&action, ctx, flags).await,
        Commands::Project { action } => commands::project::handle(&action, ctx, flags).await,
        Commands::Activity(args) => commands::activity::handle(&args, ctx, flags).await,
        Commands::Ask(args) => commands::ask::handle(&args, ctx, flags).await,
        Commands::Schema(args) => commands::schema::handle(&args, flags),
    }
}
