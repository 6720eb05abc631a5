// poolsync-api: Async Rust client for the Ondilo ICO customer API

pub mod client;
pub mod error;
pub mod models;
pub mod pools;
pub mod session;
pub mod transport;

pub use client::PoolClient;
pub use error::{Error, ErrorKind};
pub use models::{
    DeviceMetadata, MeasureType, Measurement, PoolId, PoolSummary, Recommendation,
    RecommendationStatus,
};
pub use session::{StaticToken, TokenSource};
pub use transport::TransportConfig;

/// Production base URL of the vendor customer API.
pub const DEFAULT_API_URL: &str = "https://interop.ondilo.com/api/customer/v1";
