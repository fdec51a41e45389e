use stash_core::enums::CaptureStatus;
use stash_db::repos::capture::CaptureFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InboxArgs;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `stash inbox`.
pub async fn handle(args: &InboxArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let status = args
        .status
        .as_deref()
        .map(|raw| parse_enum::<CaptureStatus>(raw, "status"))
        .transpose()?;
    let captures = ctx
        .service
        .list_captures(&CaptureFilter {
            status,
            limit: Some(effective_limit(flags.limit, ctx.config.general.default_limit)),
            oldest_first: false,
        })
        .await?;
    output(&captures, flags.format)
}
