use stash_core::enums::ActivityType;
use stash_db::repos::activity::ActivityFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ActivityArgs;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `stash activity`.
pub async fn handle(args: &ActivityArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let activity_type = args
        .activity_type
        .as_deref()
        .map(|raw| parse_enum::<ActivityType>(raw, "type"))
        .transpose()?;
    let entries = ctx
        .service
        .list_activities(&ActivityFilter {
            activity_type,
            limit: Some(effective_limit(flags.limit, ctx.config.general.default_limit)),
        })
        .await?;
    output(&entries, flags.format)
}
