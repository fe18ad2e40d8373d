use super::enums::Modality;

/// History query filters. Default = everything, newest first.
#[derive(Debug, Default, Clone)]
pub struct HistoryFilter {
    pub modality: Option<Modality>,
    pub favorites_only: bool,
    pub limit: Option<usize>,
}
