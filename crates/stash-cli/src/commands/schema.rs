use schemars::schema_for;
use stash_core::classification::{
    ChatRequest, ClassificationResult, GroupingResponse, SubtaskResponse,
};
use stash_core::entities::{ActivityLogEntry, CaptureRecord, Project, Task};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;

const TYPE_NAMES: &[&str] = &[
    "classification",
    "subtasks",
    "grouping",
    "chat",
    "capture",
    "task",
    "project",
    "activity",
];

/// Handle `stash schema`. Needs neither config nor database.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&schema(&args.type_name)?, flags.format)
}

fn schema(type_name: &str) -> anyhow::Result<schemars::Schema> {
    Ok(match type_name.trim().to_ascii_lowercase().as_str() {
        "classification" => schema_for!(ClassificationResult),
        "subtasks" => schema_for!(SubtaskResponse),
        "grouping" => schema_for!(GroupingResponse),
        "chat" => schema_for!(ChatRequest),
        "capture" => schema_for!(CaptureRecord),
        "task" => schema_for!(Task),
        "project" => schema_for!(Project),
        "activity" => schema_for!(ActivityLogEntry),
        _ => anyhow::bail!(
            "unknown schema type '{type_name}'; expected one of: {}",
            TYPE_NAMES.join(", ")
        ),
    })
}
