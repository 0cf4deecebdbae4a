// src/services/knowledge_store.rs
//! HTTP adapter for the external vector-search service (Chroma-style REST
//! API). Embedding and persistence are owned by the service; this side only
//! assigns ids and metadata.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct KnowledgeStore {
    client: Client,
    base_url: String,
    collection_name: String,
    /// Collection id resolved lazily on first use.
    collection_id: RwLock<Option<String>>,
}

impl KnowledgeStore {
    pub fn new(client: Client, base_url: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            collection_name: collection_name.into(),
            collection_id: RwLock::new(None),
        }
    }

    /// Store chunk texts with `{source, chunk_index}` metadata. Each chunk
    /// gets a fresh uuid as its id.
    pub async fn store(&self, chunks: &[String], document_name: &str) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let collection_id = self.collection_id().await?;

        let ids: Vec<String> = chunks.iter().map(|_| Uuid::new_v4().to_string()).collect();
        let metadatas: Vec<Value> = (0..chunks.len())
            .map(|i| json!({ "source": document_name, "chunk_index": i }))
            .collect();

        let url = format!("{}/api/v1/collections/{}/add", self.base_url, collection_id);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "ids": ids,
                "documents": chunks,
                "metadatas": metadatas,
            }))
            .send()
            .await
            .context("vector store add request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "vector store add returned HTTP {}",
                response.status()
            ));
        }

        tracing::debug!(count = chunks.len(), source = document_name, "stored chunks");
        Ok(chunks.len())
    }

    /// Return up to `k` relevant chunk texts for the query. An empty store
    /// or any upstream failure yields an empty result, never an error.
    pub async fn query(&self, text: &str, k: usize) -> Vec<String> {
        match self.try_query(text, k).await {
            Ok(chunks) => chunks,
            Err(err) => {
                tracing::warn!(error = %err, "knowledge store query failed, continuing without context");
                Vec::new()
            }
        }
    }

    async fn try_query(&self, text: &str, k: usize) -> Result<Vec<String>> {
        let collection_id = self.collection_id().await?;

        let url = format!("{}/api/v1/collections/{}/query", self.base_url, collection_id);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "query_texts": [text],
                "n_results": k,
            }))
            .send()
            .await
            .context("vector store query request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "vector store query returned HTTP {}",
                response.status()
            ));
        }

        let body: Value = response.json().await.context("invalid query response")?;
        let chunks = body["documents"]
            .as_array()
            .and_then(|d| d.first())
            .and_then(|d| d.as_array())
            .map(|docs| {
                docs.iter()
                    .filter_map(|d| d.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(chunks)
    }

    /// Create-or-get the collection and cache its id.
    async fn collection_id(&self) -> Result<String> {
        {
            let guard = self.collection_id.read().await;
            if let Some(id) = guard.as_ref() {
                return Ok(id.clone());
            }
        }

        let url = format!("{}/api/v1/collections", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "name": self.collection_name,
                "get_or_create": true,
            }))
            .send()
            .await
            .context("vector store collection request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "vector store collection create returned HTTP {}",
                response.status()
            ));
        }

        let body: Value = response.json().await.context("invalid collection response")?;
        let id = body["id"]
            .as_str()
            .ok_or_else(|| anyhow!("collection response missing id"))?
            .to_string();

        let mut guard = self.collection_id.write().await;
        *guard = Some(id.clone());
        Ok(id)
    }
}
