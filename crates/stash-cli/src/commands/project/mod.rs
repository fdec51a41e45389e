use stash_core::enums::ProjectStatus;
use stash_pipeline::assist;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ProjectCommands;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `stash project`.
pub async fn handle(
    action: &ProjectCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ProjectCommands::List { status } => {
            let status = status
                .as_deref()
                .map(|raw| parse_enum::<ProjectStatus>(raw, "status"))
                .transpose()?;
            let limit = effective_limit(flags.limit, ctx.config.general.default_limit);
            output(&ctx.service.list_projects(status, limit).await?, flags.format)
        }
        ProjectCommands::Create { name, outcome } => {
            output(&ctx.service.create_project(name, outcome).await?, flags.format)
        }
        ProjectCommands::Group { id } => {
            let classifier = ctx.classifier()?;
            let progress = Progress::spinner("Grouping tasks");
            match assist::group(&ctx.service, classifier.as_ref(), id).await {
                Ok(response) => {
                    progress.finish_clear();
                    output(&response, flags.format)
                }
                Err(error) => {
                    progress.finish_err("grouping failed; tasks unchanged");
                    Err(error.into())
                }
            }
        }
    }
}
