use stash_pipeline::assist;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AskArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `stash ask`. Read-only: the assistant sees every task and project
/// but changes nothing.
pub async fn handle(args: &AskArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let question = args.question.join(" ");
    let classifier = ctx.classifier()?;
    let progress = Progress::spinner("Thinking");
    match assist::ask(&ctx.service, classifier.as_ref(), &question).await {
        Ok(response) => {
            progress.finish_clear();
            output(&response, flags.format)
        }
        Err(error) => {
            progress.finish_err("assistant unavailable");
            Err(error.into())
        }
    }
}
