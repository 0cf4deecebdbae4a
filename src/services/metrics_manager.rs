use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default, Clone, Serialize)]
pub struct MetricsData {
    /// Completed turns per handler kind (text, pdf, image, audio).
    pub turn_usage: HashMap<String, u64>,
    /// Failures per error category.
    pub error_usage: HashMap<String, u64>,
}

#[derive(Debug, Clone)]
pub struct MetricsManager {
    inner: Arc<RwLock<MetricsData>>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsData::default())),
        }
    }

    pub async fn increment_turn(&self, kind: &str) {
        let mut data = self.inner.write().await;
        *data.turn_usage.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub async fn increment_error(&self, category: &str) {
        let mut data = self.inner.write().await;
        *data.error_usage.entry(category.to_string()).or_insert(0) += 1;
    }

    pub async fn get_metrics(&self) -> MetricsData {
        self.inner.read().await.clone()
    }
}
