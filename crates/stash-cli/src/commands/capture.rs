use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CaptureArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `stash capture`. The capture is stored as `pending`; a running
/// `stash watch` (or the next `stash process`) classifies and files it.
pub async fn handle(args: &CaptureArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let text = args.text.join(" ");
    let capture = ctx
        .service
        .create_capture(&text)
        .await
        .context("failed to capture thought")?;
    output(&capture, flags.format)
}
