//! Response Models
//!
//! Bloc records as returned by the remote database, geometry still in wire form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::WirePolygon;

/// Lifecycle state of a bloc.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlocStatus {
    #[default]
    Active,
    Retired,
}

/// A stored bloc. `coordinates_wkt` must be decoded before display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlocRecord {
    /// Server-assigned identifier
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub coordinates_wkt: Option<WirePolygon>,
    pub area_hectares: f64,
    #[serde(default)]
    pub field_id: Option<String>,
    #[serde(default)]
    pub status: BlocStatus,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Set when the bloc was retired
    #[serde(default)]
    pub retired_date: Option<DateTime<Utc>>,
}
