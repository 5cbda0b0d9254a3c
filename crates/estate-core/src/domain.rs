use crate::ids::EstateId;
use serde::{Deserialize, Serialize};

/// A rentable property. Rows are append-only, so a snapshot never goes stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estate {
    pub id: EstateId,
    pub name: String,
    pub description: String,
    pub thumbnail: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rent: i64,
    pub door_height: i64,
    pub door_width: i64,
    pub features: String,
    /// Ranking key for search results; not exposed to clients.
    #[serde(skip_serializing, default)]
    pub popularity: i64,
}
