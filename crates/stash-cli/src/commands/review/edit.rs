use stash_core::enums::GtdList;
use stash_db::updates::capture::{DraftUpdate, DraftUpdateBuilder};
use stash_pipeline::review;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ReviewEditArgs;
use crate::commands::shared::parse::{parse_enum, parse_time};
use crate::context::AppContext;
use crate::output::output;

pub async fn run(args: &ReviewEditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    // Pointing at a project by id shows that project's name unless one was given.
    let project_name = match (&args.project_id, &args.project_name) {
        (Some(project_id), None) => Some(ctx.service.get_project(project_id).await?.name),
        (_, name) => name.clone(),
    };
    let update = build_update(args, project_name)?;
    let capture = review::edit(&ctx.service, &args.id, &update).await?;
    output(&capture, flags.format)
}

fn build_update(args: &ReviewEditArgs, project_name: Option<String>) -> anyhow::Result<DraftUpdate> {
    let mut builder = DraftUpdateBuilder::new();
    if let Some(title) = args.title.as_deref() {
        builder = builder.rewritten_text(title);
    }
    if let Some(time) = args.time.as_deref() {
        builder = builder.time(parse_time(time)?);
    }
    if let Some(energy) = args.energy.as_deref() {
        let energy = energy.trim();
        builder = builder.energy((!energy.is_empty()).then(|| energy.to_string()));
    }
    if !args.context.is_empty() {
        builder = builder.contexts(args.context.clone());
    }
    if let Some(list) = args.list.as_deref() {
        builder = builder.list(parse_enum::<GtdList>(list, "list")?);
    }
    if let Some(name) = project_name {
        builder = builder.project_name(name);
    }
    if let Some(project_id) = &args.project_id {
        builder = builder.project_id(Some(project_id.clone())).is_new(false);
    }
    if args.new_project {
        builder = builder.project_id(None).is_new(true);
    }
    if let Some(outcome) = &args.outcome {
        builder = builder.outcome(Some(outcome.clone()));
    }

    let update = builder.build();
    if update.is_empty() {
        anyhow::bail!(
            "nothing to edit: pass at least one of --title, --time, --energy, --context, --list, \
             --project-name, --project-id, --new-project or --outcome"
        );
    }
    Ok(update)
}
