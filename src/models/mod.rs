//! Data Models
//!
//! Request and response shapes exchanged with the map UI and the remote
//! database.

mod requests;
mod responses;

pub use requests::{DrawnArea, NewBloc};
pub use responses::{BlocRecord, BlocStatus};
