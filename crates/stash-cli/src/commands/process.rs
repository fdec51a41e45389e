use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `stash process`: drain the pending queue once.
///
/// The report is printed even when filing stopped part-way; the command then
/// fails so scripts notice. The stopped capture resumes on the next run.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let scheduler = ctx.scheduler()?;
    let progress = Progress::spinner("Processing pending captures");
    let report = match scheduler.drain().await {
        Ok(report) => report,
        Err(error) => {
            progress.finish_err("processing failed");
            return Err(error.into());
        }
    };
    progress.finish_clear();

    output(&report, flags.format)?;
    if let Some(error) = report.error {
        anyhow::bail!("processing stopped: {error}");
    }
    Ok(())
}
