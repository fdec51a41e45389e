mod edit;

use stash_core::enums::CaptureStatus;
use stash_db::repos::capture::CaptureFilter;
use stash_pipeline::review;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ReviewCommands;
use crate::commands::shared::limit::effective_limit;
use crate::context::AppContext;
use crate::output::output;

/// Handle `stash review`.
pub async fn handle(
    action: &ReviewCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let store = ctx.service.as_ref();
    match action {
        ReviewCommands::List => {
            let queue = store
                .list_captures(&CaptureFilter {
                    status: Some(CaptureStatus::NeedsReview),
                    limit: Some(effective_limit(flags.limit, ctx.config.general.default_limit)),
                    oldest_first: true,
                })
                .await?;
            output(&queue, flags.format)
        }
        ReviewCommands::Show { id } => output(&store.get_capture(id).await?, flags.format),
        ReviewCommands::Edit(args) => edit::run(args, ctx, flags).await,
        ReviewCommands::Accept { id } => output(&review::accept(store, id).await?, flags.format),
        ReviewCommands::Discard { id } => output(&review::discard(store, id).await?, flags.format),
        ReviewCommands::Assign { id, project_id } => {
            output(&review::assign(store, id, project_id).await?, flags.format)
        }
        ReviewCommands::CreateProject { id, name } => output(
            &review::create_project_and_accept(store, id, name).await?,
            flags.format,
        ),
    }
}
