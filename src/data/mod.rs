//! Data ingestion and storage
//!
//! Results API sources, the qualifying/race join and per-season CSV storage.

pub mod merge;
pub mod sources;
pub mod store;
pub mod summary;

pub use merge::inner_join;
pub use sources::ResultsSource;
pub use store::SeasonStore;
