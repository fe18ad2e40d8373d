use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Local;
use uuid::Uuid;

use super::{AnalysisId, AnalysisStore, FeedbackId, StoreError};
use crate::models::{AnalysisResult, Feedback, HistoryFilter, StoredAnalysis};

/// Volatile store for tests and embedders that do not need history on disk.
#[derive(Default)]
pub struct InMemoryAnalysisStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Insertion order; newest last.
    analyses: Vec<StoredAnalysis>,
    feedback: Vec<(FeedbackId, Feedback)>,
}

impl InMemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().map(|inner| inner.analyses.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Inner {
    fn analysis_mut(&mut self, id: &AnalysisId) -> Result<&mut StoredAnalysis, StoreError> {
        self.analyses
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or(StoreError::NotFound(*id))
    }
}

impl AnalysisStore for InMemoryAnalysisStore {
    fn save_analysis(&self, result: &AnalysisResult) -> Result<AnalysisId, StoreError> {
        let id = Uuid::new_v4();
        self.write()?.analyses.push(StoredAnalysis {
            id,
            created_at: Local::now().naive_local(),
            is_favorite: false,
            notes: String::new(),
            result: result.clone(),
        });
        tracing::debug!(analysis_id = %id, modality = %result.modality(), "Analysis saved");
        Ok(id)
    }

    fn get_analysis(&self, id: &AnalysisId) -> Result<Option<StoredAnalysis>, StoreError> {
        Ok(self.read()?.analyses.iter().find(|a| a.id == *id).cloned())
    }

    fn query(&self, filter: &HistoryFilter) -> Result<Vec<StoredAnalysis>, StoreError> {
        let inner = self.read()?;
        let matches = inner
            .analyses
            .iter()
            .rev()
            .filter(|a| filter.modality.map_or(true, |m| a.result.modality() == m))
            .filter(|a| !filter.favorites_only || a.is_favorite)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matches)
    }

    fn toggle_favorite(&self, id: &AnalysisId) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        let analysis = inner.analysis_mut(id)?;
        analysis.is_favorite = !analysis.is_favorite;
        Ok(analysis.is_favorite)
    }

    fn set_notes(&self, id: &AnalysisId, notes: &str) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.analysis_mut(id)?.notes = notes.to_string();
        Ok(())
    }

    fn delete_analysis(&self, id: &AnalysisId) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let before = inner.analyses.len();
        inner.analyses.retain(|a| a.id != *id);
        if inner.analyses.len() == before {
            return Err(StoreError::NotFound(*id));
        }
        inner.feedback.retain(|(_, f)| f.analysis_id != *id);
        tracing::debug!(analysis_id = %id, "Analysis deleted");
        Ok(())
    }

    fn save_feedback(&self, feedback: &Feedback) -> Result<FeedbackId, StoreError> {
        let mut inner = self.write()?;
        inner.analysis_mut(&feedback.analysis_id)?;

        if let Some((id, existing)) = inner
            .feedback
            .iter_mut()
            .find(|(_, f)| f.analysis_id == feedback.analysis_id)
        {
            *existing = feedback.clone();
            return Ok(*id);
        }

        let id = Uuid::new_v4();
        inner.feedback.push((id, feedback.clone()));
        tracing::debug!(analysis_id = %feedback.analysis_id, feedback_id = %id, "Feedback saved");
        Ok(id)
    }

    fn get_feedback(&self, analysis_id: &AnalysisId) -> Result<Option<Feedback>, StoreError> {
        Ok(self
            .read()?
            .feedback
            .iter()
            .find(|(_, f)| f.analysis_id == *analysis_id)
            .map(|(_, f)| f.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    #[test]
    fn save_and_get() {
        contract::save_and_get(&InMemoryAnalysisStore::new());
    }

    #[test]
    fn ids_are_unique() {
        contract::ids_are_unique(&InMemoryAnalysisStore::new());
    }

    #[test]
    fn query_filters_newest_first() {
        contract::query_filters_newest_first(&InMemoryAnalysisStore::new());
    }

    #[test]
    fn favorites_and_notes() {
        contract::favorites_and_notes(&InMemoryAnalysisStore::new());
    }

    #[test]
    fn feedback_upsert() {
        contract::feedback_upsert(&InMemoryAnalysisStore::new());
    }

    #[test]
    fn delete_cascades_feedback() {
        contract::delete_cascades_feedback(&InMemoryAnalysisStore::new());
    }

    #[test]
    fn len_tracks_saves() {
        let store = InMemoryAnalysisStore::new();
        assert!(store.is_empty());
        store.save_analysis(&contract::sample(crate::models::Modality::Text)).unwrap();
        assert_eq!(store.len(), 1);
    }
}
