use crate::config::RetrievalConfig;
use crate::error::app_error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A chunk of indexed source material together with its ingestion
/// metadata (`doc_id`, `filename`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

/// Handle shared with request handlers through Rocket's managed state.
pub type SharedIndex = std::sync::Arc<dyn DocumentIndex>;

/// Narrow interface to the retrieval/embedding store. The ingestion and
/// OCR pipeline lives behind it; this side only writes chunks, reads
/// metadata for the document census and runs similarity search.
#[async_trait::async_trait]
pub trait DocumentIndex: Send + Sync {
    async fn add_documents(&self, documents: &[Document], ids: &[String]) -> Result<(), AppError>;

    /// Metadata of every stored chunk.
    async fn metadata(&self) -> Result<Vec<BTreeMap<String, String>>, AppError>;

    async fn delete(&self, ids: &[String]) -> Result<(), AppError>;

    async fn search(&self, query: &str, top_k: usize, score_threshold: f32) -> Result<Vec<Document>, AppError>;
}

/// Client for the retrieval service's HTTP API.
pub struct HttpRetriever {
    client: reqwest::Client,
    config: RetrievalConfig,
}

impl HttpRetriever {
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }
}

#[derive(Serialize)]
struct AddDocumentsRequest<'a> {
    documents: &'a [Document],
    ids: &'a [String],
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
    score_threshold: f32,
}

#[async_trait::async_trait]
impl DocumentIndex for HttpRetriever {
    async fn add_documents(&self, documents: &[Document], ids: &[String]) -> Result<(), AppError> {
        self.client
            .post(self.endpoint("documents"))
            .json(&AddDocumentsRequest { documents, ids })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn metadata(&self) -> Result<Vec<BTreeMap<String, String>>, AppError> {
        let metadata = self
            .client
            .get(self.endpoint("documents/metadata"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(metadata)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), AppError> {
        self.client
            .delete(self.endpoint("documents"))
            .json(&DeleteRequest { ids })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize, score_threshold: f32) -> Result<Vec<Document>, AppError> {
        let documents = self
            .client
            .post(self.endpoint("search"))
            .json(&SearchRequest {
                query,
                top_k,
                score_threshold,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(documents)
    }
}
