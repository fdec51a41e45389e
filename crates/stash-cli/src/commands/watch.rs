use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use stash_core::enums::CaptureStatus;
use stash_db::events::StoreEvent;
use stash_pipeline::Worker;
use tokio::sync::broadcast::error::RecvError;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct WatchSummary {
    processed: u64,
    remaining_pending: u32,
}

/// Handle `stash watch`: run the worker until Ctrl-C.
///
/// The worker does the processing; this loop only observes the store and
/// prints each capture as it leaves `pending`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let scheduler = ctx.scheduler()?;
    let mut events = ctx.service.subscribe();
    let handle = Worker::new(Arc::new(scheduler))
        .with_poll_interval(Duration::from_secs(ctx.config.pipeline.poll_interval_secs))
        .spawn();

    if !flags.quiet {
        eprintln!("stash: watching for captures (Ctrl-C to stop)");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let observed: anyhow::Result<()> = loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                if let Err(error) = signal {
                    tracing::warn!(%error, "failed to listen for Ctrl-C");
                }
                break Ok(());
            }
            event = events.recv() => match event {
                Ok(StoreEvent::CaptureChanged { capture_id, status }) if status != CaptureStatus::Pending => {
                    let shown = match ctx.service.get_capture(&capture_id).await {
                        Ok(capture) => output(&capture, flags.format),
                        Err(error) => Err(error.into()),
                    };
                    if let Err(error) = shown {
                        break Err(error);
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "watch display lagged behind store events");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    let processed = handle.shutdown().await;
    observed?;

    let remaining_pending = ctx
        .service
        .count_captures(Some(CaptureStatus::Pending))
        .await?;
    output(
        &WatchSummary {
            processed,
            remaining_pending,
        },
        flags.format,
    )
}
