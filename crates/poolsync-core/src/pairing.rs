// Pairing candidates offered to the host during device discovery.

use serde::Serialize;

use poolsync_api::{PoolId, PoolSummary};

use crate::model::{SETTING_VOLUME, Settings, format_volume};

/// A pool the user can pair as a device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairingCandidate {
    pub name: String,
    pub id: PoolId,
    /// Initial device settings. `volume` is left out when unknown.
    pub settings: Settings,
}

pub fn pairing_candidates(pools: &[PoolSummary]) -> Vec<PairingCandidate> {
    pools
        .iter()
        .map(|pool| {
            let mut settings = Settings::new();
            if let Some(volume) = pool.volume {
                settings.insert(SETTING_VOLUME.to_owned(), format_volume(volume));
            }
            PairingCandidate {
                name: pool.name.clone(),
                id: pool.id.clone(),
                settings,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::summary;

    #[test]
    fn candidates_carry_formatted_volume() {
        let pools = [summary("1234", "Backyard", Some(42.0)), summary("5", "Spa", None)];

        let candidates = pairing_candidates(&pools);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "Backyard");
        assert_eq!(candidates[0].id, PoolId::from("1234"));
        assert_eq!(candidates[0].settings.get("volume").map(String::as_str), Some("42 m³"));
        assert!(candidates[1].settings.is_empty());
    }
}
