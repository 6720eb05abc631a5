//! Long-running watch handler: schedules every pool and prints
//! recommendation notifications as they fire.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use poolsync_core::adapters::{ChannelNotifier, Notification};
use poolsync_core::{DeviceLifecycle, SyncEngine, SyncOutcome, SyncStatus};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::{config, output};

use super::util::{self, Target};

fn render_notification(format: &OutputFormat, n: &Notification) -> String {
    match format {
        OutputFormat::Table | OutputFormat::Plain => format!("{}: {}", n.pool, n.event.recommendation),
        // One document per line so the stream stays parseable.
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(n).unwrap_or_default(),
        OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(n).unwrap_or_default().trim_end()),
    }
}

/// Add every target, printing the initial outcome of each.
///
/// When an add fails the timers of the pools already added are stopped
/// before the error is returned.
async fn add_targets(engine: &SyncEngine, targets: Vec<Target>, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    for target in targets {
        let outcome = match engine.on_add(target.pool.clone(), target.device()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                engine.shutdown().await;
                return Err(e.into());
            }
        };
        let label = match outcome {
            SyncOutcome::Available { .. } => output::status_label(&SyncStatus::Available, color),
            SyncOutcome::Unavailable { reason, .. } => {
                output::status_label(&SyncStatus::Unavailable { reason }, color)
            }
            SyncOutcome::Skipped => output::skipped_label(color),
        };
        if !global.quiet {
            eprintln!("{} ({}): {label}", target.name, target.pool);
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;

    let mut sync_config = cfg.sync_config();
    if let Some(minutes) = args.interval {
        if minutes == 0 {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be at least 1 minute".into(),
            });
        }
        sync_config.poll_interval = Duration::from_secs(minutes.saturating_mul(60));
    }

    let (notifier, mut notifications) = ChannelNotifier::new();
    let state = util::open_state(&cfg, false).await?;
    let engine = util::build_engine(global, &cfg, sync_config, Arc::new(notifier), state)?;

    let targets = util::resolve_targets(&engine, &cfg, None).await?;
    if targets.is_empty() {
        return Err(CliError::Validation {
            field: "pools".into(),
            reason: "no pools configured or linked to the account".into(),
        });
    }

    add_targets(&engine, targets, global).await?;
    info!(
        pools = engine.scheduler().active_count().await,
        interval_secs = engine.config().poll_interval.as_secs(),
        "watching"
    );

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            () = &mut deadline => break,
            Some(n) = notifications.recv() => {
                output::print_output(&render_notification(&global.output, &n), global.quiet);
            }
        }
    }

    engine.shutdown().await;
    while let Ok(n) = notifications.try_recv() {
        output::print_output(&render_notification(&global.output, &n), global.quiet);
    }
    Ok(())
}
