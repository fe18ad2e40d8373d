use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Local;
use rusqlite::Connection;
use uuid::Uuid;

use super::{AnalysisId, AnalysisStore, FeedbackId, StoreError};
use crate::config;
use crate::db::{self, repository};
use crate::models::{AnalysisResult, Feedback, HistoryFilter, StoredAnalysis};

/// SQLite-backed store. One connection, serialized behind a mutex.
pub struct SqliteAnalysisStore {
    conn: Mutex<Connection>,
}

impl SqliteAnalysisStore {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = db::open_database(path)?;
        tracing::info!(path = %path.display(), "Analysis history database opened");
        Ok(Self::from_connection(conn))
    }

    /// Open the history database at the default location under the app data dir.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&config::database_path())
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::from_connection(db::open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl AnalysisStore for SqliteAnalysisStore {
    fn save_analysis(&self, result: &AnalysisResult) -> Result<AnalysisId, StoreError> {
        let id = Uuid::new_v4();
        let created_at = Local::now().naive_local();
        let conn = self.conn()?;
        repository::insert_analysis(&conn, &id, &created_at, result)?;
        tracing::debug!(analysis_id = %id, modality = %result.modality(), "Analysis saved");
        Ok(id)
    }

    fn get_analysis(&self, id: &AnalysisId) -> Result<Option<StoredAnalysis>, StoreError> {
        let conn = self.conn()?;
        Ok(repository::get_analysis(&conn, id)?)
    }

    fn query(&self, filter: &HistoryFilter) -> Result<Vec<StoredAnalysis>, StoreError> {
        let conn = self.conn()?;
        Ok(repository::list_analyses(&conn, filter)?)
    }

    fn toggle_favorite(&self, id: &AnalysisId) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let flag = repository::toggle_favorite(&conn, id)?.ok_or(StoreError::NotFound(*id))?;
        tracing::debug!(analysis_id = %id, is_favorite = flag, "Favorite toggled");
        Ok(flag)
    }

    fn set_notes(&self, id: &AnalysisId, notes: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        if !repository::update_notes(&conn, id, notes)? {
            return Err(StoreError::NotFound(*id));
        }
        tracing::debug!(analysis_id = %id, "Notes updated");
        Ok(())
    }

    fn delete_analysis(&self, id: &AnalysisId) -> Result<(), StoreError> {
        let conn = self.conn()?;
        if !repository::delete_analysis(&conn, id)? {
            return Err(StoreError::NotFound(*id));
        }
        tracing::debug!(analysis_id = %id, "Analysis deleted");
        Ok(())
    }

    fn save_feedback(&self, feedback: &Feedback) -> Result<FeedbackId, StoreError> {
        let conn = self.conn()?;
        if !repository::analysis_exists(&conn, &feedback.analysis_id)? {
            return Err(StoreError::NotFound(feedback.analysis_id));
        }
        let now = Local::now().naive_local();
        let id = repository::upsert_feedback(&conn, feedback, &now)?;
        tracing::debug!(
            analysis_id = %feedback.analysis_id,
            feedback_id = %id,
            rating = feedback.rating.value(),
            "Feedback saved"
        );
        Ok(id)
    }

    fn get_feedback(&self, analysis_id: &AnalysisId) -> Result<Option<Feedback>, StoreError> {
        let conn = self.conn()?;
        Ok(repository::get_feedback(&conn, analysis_id)?)
    }
}
