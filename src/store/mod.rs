//! Persistence collaborator for analysis history and feedback.
//!
//! The engine never fabricates identifiers: a store assigns the durable id
//! and creation time when an [`AnalysisResult`] is saved.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryAnalysisStore;
pub use sqlite::SqliteAnalysisStore;

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{AnalysisResult, Feedback, HistoryFilter, StoredAnalysis};

pub type AnalysisId = Uuid;
pub type FeedbackId = Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Analysis not found: {0}")]
    NotFound(AnalysisId),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

pub trait AnalysisStore: Send + Sync {
    /// Persist a finished analysis and assign its id.
    fn save_analysis(&self, result: &AnalysisResult) -> Result<AnalysisId, StoreError>;

    fn get_analysis(&self, id: &AnalysisId) -> Result<Option<StoredAnalysis>, StoreError>;

    /// Stored analyses matching `filter`, newest first.
    fn query(&self, filter: &HistoryFilter) -> Result<Vec<StoredAnalysis>, StoreError>;

    /// Flip the favorite flag and return the new value.
    fn toggle_favorite(&self, id: &AnalysisId) -> Result<bool, StoreError>;

    fn set_notes(&self, id: &AnalysisId, notes: &str) -> Result<(), StoreError>;

    /// Remove an analysis together with its feedback.
    fn delete_analysis(&self, id: &AnalysisId) -> Result<(), StoreError>;

    /// Record feedback. A second submission for the same analysis replaces
    /// the first and keeps its id.
    fn save_feedback(&self, feedback: &Feedback) -> Result<FeedbackId, StoreError>;

    fn get_feedback(&self, analysis_id: &AnalysisId) -> Result<Option<Feedback>, StoreError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_is_object_safe() {
        fn _assert_store(_: &dyn AnalysisStore) {}
    }

    #[test]
    fn invalid_rating_message() {
        assert_eq!(
            StoreError::InvalidRating(7).to_string(),
            "Rating must be between 1 and 5, got 7"
        );
    }
}
