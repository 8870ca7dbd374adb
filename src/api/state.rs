use std::sync::Arc;

use tokio::sync::RwLock;

use super::error::{ApiError, Result};
use crate::config::Settings;
use crate::pipeline::PipelineState;

/// Shared by every handler: the settings and the last processed dataset.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    data: Arc<RwLock<Option<Arc<PipelineState>>>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            data: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn replace(&self, pipeline: PipelineState) {
        *self.data.write().await = Some(Arc::new(pipeline));
    }

    /// The current dataset, or `NoData` when nothing usable has been loaded.
    pub async fn require_data(&self) -> Result<Arc<PipelineState>> {
        match self.data.read().await.as_ref() {
            Some(pipeline) if !pipeline.clean.is_empty() => Ok(Arc::clone(pipeline)),
            _ => Err(ApiError::NoData),
        }
    }
}
