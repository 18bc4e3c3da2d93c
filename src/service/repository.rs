//! Spatial Repository
//!
//! The remote persistence collaborator as seen by this crate.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::{BlocRecord, BlocStatus, NewBloc};

/// Remote store of bloc records. Geometry travels in wire form both ways.
///
/// Implementations wrap the actual database client (RPC or query API) and map
/// its failures into [`RemoteError`], keeping provider error codes intact so
/// they can be classified.
#[async_trait]
pub trait SpatialRepository: Send + Sync {
    /// Inserts a bloc and returns it with its server-assigned id.
    async fn insert_bloc(&self, bloc: &NewBloc) -> Result<BlocRecord, RemoteError>;

    /// All blocs with geometry rendered as WKT.
    async fn list_blocs(&self) -> Result<Vec<BlocRecord>, RemoteError>;

    async fn get_bloc(&self, id: &str) -> Result<BlocRecord, RemoteError>;

    async fn update_bloc_status(&self, id: &str, status: BlocStatus) -> Result<(), RemoteError>;

    async fn delete_bloc(&self, id: &str) -> Result<(), RemoteError>;
}
