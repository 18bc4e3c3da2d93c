//! Bloc Service
//!
//! Persists drawn areas as bloc records and turns stored records back into
//! drawable areas. Every remote call runs under auto-recovery.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::ServiceError;
use crate::geometry::PolygonCodec;
use crate::models::{BlocRecord, BlocStatus, DrawnArea, NewBloc};
use crate::recovery::AutoRecovery;
use crate::service::SpatialRepository;

/// Result of saving several drawn areas.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub saved: Vec<BlocRecord>,
    /// Drawn area id and the reason it was not saved
    pub failed: Vec<(String, ServiceError)>,
}

/// Bloc CRUD on top of a [`SpatialRepository`].
#[derive(Debug)]
pub struct BlocService<R> {
    repository: Arc<R>,
    recovery: AutoRecovery,
    codec: PolygonCodec,
}

impl<R: SpatialRepository> BlocService<R> {
    pub fn new(repository: Arc<R>, cache: Arc<CacheStore>, codec: PolygonCodec) -> Self {
        Self {
            repository,
            recovery: AutoRecovery::new(cache),
            codec,
        }
    }

    pub fn codec(&self) -> &PolygonCodec {
        &self.codec
    }

    // == Save ==
    /// Encodes the drawn ring and inserts it as a new bloc.
    pub async fn save_drawn_area(&self, area: &DrawnArea) -> Result<BlocRecord, ServiceError> {
        let wire = self.codec.encode(&area.coordinates)?;
        let request = NewBloc::from_drawn_area(area, wire);
        if let Some(reason) = request.validate() {
            return Err(ServiceError::InvalidRequest(reason));
        }
        debug!(
            area = area.id.as_str(),
            points = area.coordinates.len(),
            "Converted drawn area to WKT"
        );

        let repository = &self.repository;
        let request = &request;
        let record = self
            .recovery
            .run("save bloc", move || repository.insert_bloc(request))
            .await?;

        info!(area = area.id.as_str(), bloc = record.id.as_str(), "Saved drawn area as bloc");
        Ok(record)
    }

    /// Saves each area in turn, continuing past failures.
    pub async fn save_drawn_areas(&self, areas: &[DrawnArea]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for area in areas {
            match self.save_drawn_area(area).await {
                Ok(record) => outcome.saved.push(record),
                Err(err) => {
                    warn!(area = area.id.as_str(), error = %err, "Failed to save bloc");
                    outcome.failed.push((area.id.clone(), err));
                }
            }
        }
        outcome
    }

    // == Read ==
    pub async fn list_blocs(&self) -> Result<Vec<BlocRecord>, ServiceError> {
        let repository = &self.repository;
        let blocs = self
            .recovery
            .run("list blocs", move || repository.list_blocs())
            .await?;
        Ok(blocs)
    }

    pub async fn get_bloc(&self, id: &str) -> Result<BlocRecord, ServiceError> {
        let repository = &self.repository;
        let bloc = self
            .recovery
            .run("get bloc", move || repository.get_bloc(id))
            .await?;
        Ok(bloc)
    }

    // == Update ==
    pub async fn update_status(&self, id: &str, status: BlocStatus) -> Result<(), ServiceError> {
        let repository = &self.repository;
        self.recovery
            .run("update bloc status", move || {
                repository.update_bloc_status(id, status)
            })
            .await?;
        info!(bloc = id, ?status, "Updated bloc status");
        Ok(())
    }

    // == Delete ==
    pub async fn delete_bloc(&self, id: &str) -> Result<(), ServiceError> {
        let repository = &self.repository;
        self.recovery
            .run("delete bloc", move || repository.delete_bloc(id))
            .await?;
        info!(bloc = id, "Deleted bloc");
        Ok(())
    }

    // == Convert ==
    /// Decodes a stored record's geometry back into a drawable area.
    pub fn to_drawn_area(&self, record: &BlocRecord) -> Result<DrawnArea, ServiceError> {
        let wire = record
            .coordinates_wkt
            .as_ref()
            .ok_or_else(|| ServiceError::MissingGeometry(record.id.clone()))?;
        let decoded = self.codec.decode(wire.as_str())?;
        for warning in &decoded.warnings {
            warn!(bloc = record.id.as_str(), %warning, "Stored bloc geometry needed normalization");
        }

        Ok(DrawnArea {
            id: record.id.clone(),
            coordinates: decoded.polygon,
            area_hectares: record.area_hectares,
            field_ids: record.field_id.iter().cloned().collect(),
        })
    }

    /// Lists blocs and converts each one, skipping records with unusable geometry.
    pub async fn list_drawn_areas(&self) -> Result<Vec<DrawnArea>, ServiceError> {
        let blocs = self.list_blocs().await?;
        let areas = blocs
            .iter()
            .filter_map(|record| match self.to_drawn_area(record) {
                Ok(area) => Some(area),
                Err(err) => {
                    warn!(bloc = record.id.as_str(), error = %err, "Skipping bloc");
                    None
                }
            })
            .collect();
        Ok(areas)
    }
}
