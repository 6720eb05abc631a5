// Pool endpoints
//
// Discovery is account-scoped (`/pools`); everything else is scoped to one
// pool (`/pools/{id}/...`).

use tracing::debug;

use crate::client::PoolClient;
use crate::error::Error;
use crate::models::{DeviceMetadata, MeasureType, Measurement, PoolId, PoolSummary, Recommendation};

impl PoolClient {
    /// List the pools linked to the account.
    ///
    /// `GET /pools`. An empty or `null` body yields an empty list.
    pub async fn discover_pools(&self) -> Result<Vec<PoolSummary>, Error> {
        debug!("discovering pools");
        self.get_list("pools", &[]).await
    }

    /// Hardware information for the ICO attached to a pool.
    ///
    /// `GET /pools/{id}/device`
    pub async fn fetch_device(&self, id: &PoolId) -> Result<DeviceMetadata, Error> {
        debug!(pool = %id, "fetching device");
        self.get(&format!("pools/{id}/device"), &[]).await
    }

    /// Latest value of every measurement type.
    ///
    /// `GET /pools/{id}/lastmeasures?types[]=temperature&types[]=ph&...`
    pub async fn fetch_measurements(&self, id: &PoolId) -> Result<Vec<Measurement>, Error> {
        debug!(pool = %id, "fetching last measures");
        let query: Vec<(&str, &str)> = MeasureType::ALL
            .iter()
            .map(|t| ("types[]", t.as_str()))
            .collect();
        self.get(&format!("pools/{id}/lastmeasures"), &query).await
    }

    /// Maintenance recommendations, active and past.
    ///
    /// `GET /pools/{id}/recommendations`. An empty or `null` body means the
    /// pool has none.
    pub async fn fetch_recommendations(&self, id: &PoolId) -> Result<Vec<Recommendation>, Error> {
        debug!(pool = %id, "fetching recommendations");
        self.get_list(&format!("pools/{id}/recommendations"), &[]).await
    }
}
