//! One-shot sync handler.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;

use poolsync_core::adapters::{DeviceSnapshot, LogNotifier};
use poolsync_core::{CoreError, DeviceLifecycle, ErrorKind, PoolId, SyncOutcome, SyncStatus};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::error::CliError;
use crate::{config, output};

use super::util;

#[derive(Serialize)]
struct SyncResult {
    pool: PoolId,
    name: String,
    #[serde(flatten)]
    outcome: SyncOutcome,
    device: DeviceSnapshot,
}

impl SyncResult {
    fn label(&self, color: bool) -> String {
        let status = match &self.outcome {
            SyncOutcome::Available { .. } => SyncStatus::Available,
            SyncOutcome::Unavailable { reason, .. } => SyncStatus::Unavailable {
                reason: reason.clone(),
            },
            // Coalesced into a cycle already running for the same pool.
            SyncOutcome::Skipped => return output::skipped_label(color),
        };
        output::status_label(&status, color)
    }
}

fn detail(results: &[SyncResult], color: bool) -> String {
    let mut out = String::new();
    for (i, r) in results.iter().enumerate() {
        if i > 0 {
            let _ = writeln!(out);
        }
        let _ = writeln!(
            out,
            "{} ({}): {}",
            r.name,
            r.pool,
            r.label(color)
        );

        let _ = writeln!(out, "  Measurements:");
        for (capability, value) in &r.device.capabilities {
            match value {
                Some(v) => {
                    let _ = writeln!(out, "    {capability:<22} {v}");
                }
                None => {
                    let _ = writeln!(out, "    {capability:<22} -");
                }
            }
        }

        if !r.device.settings.is_empty() {
            let _ = writeln!(out, "  Settings:");
            for (key, value) in &r.device.settings {
                let _ = writeln!(out, "    {key:<22} {value}");
            }
        }

        if let Some(report) = r.outcome.report() {
            if !report.new_recommendations.is_empty() {
                let _ = writeln!(out, "  New recommendations:");
                for text in &report.new_recommendations {
                    let _ = writeln!(out, "    - {text}");
                }
            }
        }
    }
    out.trim_end().to_owned()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;

    let mut sync_config = cfg.sync_config();
    if args.no_recommendations {
        sync_config.fetch_recommendations = false;
    }

    let state = util::open_state(&cfg, args.no_state).await?;
    let engine = util::build_engine(global, &cfg, sync_config, Arc::new(LogNotifier), state)?;
    let targets = util::resolve_targets(&engine, &cfg, args.pool.as_deref()).await?;

    let mut results = Vec::with_capacity(targets.len());
    for target in targets {
        let device = target.device();
        let outcome = engine.on_add(target.pool.clone(), device.clone()).await;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                engine.shutdown().await;
                return Err(e.into());
            }
        };
        results.push(SyncResult {
            pool: target.pool,
            name: target.name,
            outcome,
            device: device.snapshot(),
        });
    }
    engine.shutdown().await;

    if results.is_empty() {
        if !global.quiet {
            eprintln!("No pools found for this account");
        }
        return Ok(());
    }

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &results,
        |r| detail(r, color),
        |r| {
            r.iter()
                .map(|x| format!("{}\t{}", x.pool, x.label(false)))
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, global.quiet);

    // Scripts see the first failure in the exit code.
    let failure = results
        .into_iter()
        .find_map(|r| match r.outcome {
            SyncOutcome::Unavailable { kind, reason, .. } => Some((r.pool, kind, reason)),
            _ => None,
        });
    match failure {
        Some((pool, ErrorKind::NotFound, _)) => Err(CliError::NotFound {
            resource_type: "pool".into(),
            identifier: pool.to_string(),
            list_command: "pools".into(),
        }),
        Some((_, kind, reason)) => Err(CoreError::Api {
            kind,
            message: reason,
            status: None,
        }
        .into()),
        None => Ok(()),
    }
}
