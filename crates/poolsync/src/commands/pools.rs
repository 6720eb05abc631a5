//! Pool discovery handler.

use std::sync::Arc;

use tabled::Tabled;

use poolsync_core::PairingCandidate;
use poolsync_core::adapters::LogNotifier;
use poolsync_core::model::SETTING_VOLUME;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::{config, output};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PoolRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Volume")]
    volume: String,
    #[tabled(rename = "Paired")]
    paired: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let state = util::open_state(&cfg, true).await?;
    let engine = util::build_engine(global, &cfg, cfg.sync_config(), Arc::new(LogNotifier), state)?;

    let candidates = engine.discover().await?;
    let is_paired = |c: &PairingCandidate| cfg.pools.iter().any(|p| p.id == c.id.as_str());

    let out = output::render_list(
        &global.output,
        &candidates,
        |c| PoolRow {
            id: c.id.to_string(),
            name: c.name.clone(),
            volume: c.settings.get(SETTING_VOLUME).cloned().unwrap_or_default(),
            paired: if is_paired(c) { "yes".into() } else { String::new() },
        },
        |c| c.id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
