use stash_core::enums::{GtdList, TaskStatus};
use stash_db::repos::task::TaskFilter;
use stash_pipeline::assist;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::TaskCommands;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `stash task`.
pub async fn handle(action: &TaskCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        TaskCommands::List {
            project,
            list,
            status,
        } => {
            let filter = TaskFilter {
                project_id: project.clone(),
                list: list
                    .as_deref()
                    .map(|raw| parse_enum::<GtdList>(raw, "list"))
                    .transpose()?,
                status: status
                    .as_deref()
                    .map(|raw| parse_enum::<TaskStatus>(raw, "status"))
                    .transpose()?,
                uncategorized: false,
                limit: Some(effective_limit(flags.limit, ctx.config.general.default_limit)),
                offset: 0,
            };
            output(&ctx.service.list_tasks(&filter).await?, flags.format)
        }
        TaskCommands::Get { id } => output(&ctx.service.get_task(id).await?, flags.format),
        TaskCommands::Complete { id } => output(&ctx.service.complete_task(id).await?, flags.format),
        TaskCommands::Decompose { id } => {
            let classifier = ctx.classifier()?;
            let progress = Progress::spinner("Breaking task into subtasks");
            let result = assist::decompose(&ctx.service, classifier.as_ref(), id).await;
            match result {
                Ok(response) => {
                    progress.finish_clear();
                    output(&response, flags.format)
                }
                Err(error) => {
                    progress.finish_err("decompose failed; task unchanged");
                    Err(error.into())
                }
            }
        }
    }
}
