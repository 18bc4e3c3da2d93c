//! Request Models
//!
//! Shapes handed to the record service by the map UI, and the insert payload
//! sent on to the remote database.

use serde::{Deserialize, Serialize};

use crate::geometry::{Polygon, WirePolygon};

/// An area drawn on the map, in drawing order.
///
/// # Fields
/// - `id`: Client-side identifier of the drawing
/// - `coordinates`: Ring points as `[lat, lng]`
/// - `area`: Area in hectares as measured by the map
/// - `fieldIds`: Fields the drawing overlaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawnArea {
    pub id: String,
    pub coordinates: Polygon,
    #[serde(rename = "area")]
    pub area_hectares: f64,
    #[serde(default)]
    pub field_ids: Vec<String>,
}

/// Insert payload for a new bloc, with geometry already in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBloc {
    #[serde(rename = "bloc_name")]
    pub name: String,
    #[serde(rename = "bloc_description", default)]
    pub description: Option<String>,
    pub polygon_wkt: WirePolygon,
    #[serde(rename = "bloc_area_hectares")]
    pub area_hectares: f64,
}

impl NewBloc {
    /// Builds the insert payload for a drawn area whose ring encoded to `wire`.
    pub fn from_drawn_area(area: &DrawnArea, wire: WirePolygon) -> Self {
        Self {
            name: format!("Bloc {}", area.id),
            description: Some("Bloc created from map drawing".to_string()),
            polygon_wkt: wire,
            area_hectares: area.area_hectares,
        }
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("Bloc name cannot be empty".to_string());
        }
        if !self.area_hectares.is_finite() || self.area_hectares < 0.0 {
            return Some(format!(
                "Bloc area must be a non-negative number, got {}",
                self.area_hectares
            ));
        }
        None
    }
}
