//! Document processor client: text extraction from uploaded files and
//! tracked-changes `.docx` generation.

use std::path::Path;

use dealvelocity_core::RedlineChange;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub file_type: String,
    /// Classification such as `RFP` or `Contract`.
    pub doc_type: String,
    #[serde(default)]
    pub extracted_dates: Vec<String>,
    #[serde(default)]
    pub extracted_values: Vec<String>,
    #[serde(default)]
    pub page_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Response of `POST /parse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub sections: Vec<DocumentChunk>,
    pub full_text: String,
}

#[derive(Serialize)]
struct RedlineRequest<'a> {
    original_text: &'a str,
    changes: &'a [RedlineChange],
}

/// HTTP client for the document processor service.
pub struct DocumentClient {
    client: reqwest::Client,
    base_url: String,
}

impl DocumentClient {
    /// `base_url` is like `http://localhost:8000`; a trailing slash is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn health(&self) -> Result<HealthStatus, ServiceError> {
        let url = format!("{}/health", self.base_url);
        let resp = ServiceError::check(self.client.get(&url).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Upload a document and get its extracted text and metadata back.
    pub async fn parse(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ParsedDocument, ServiceError> {
        let url = format!("{}/parse", self.base_url);
        info!(url = %url, filename, size = bytes.len(), "uploading document for parsing");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.to_string()));
        let resp = self.client.post(&url).multipart(form).send().await?;
        let parsed: ParsedDocument = ServiceError::check(resp).await?.json().await?;

        info!(
            doc_type = %parsed.metadata.doc_type,
            pages = parsed.metadata.page_count,
            sections = parsed.sections.len(),
            "document parsed"
        );
        Ok(parsed)
    }

    /// Read `path` from disk and [`parse`](Self::parse) it.
    pub async fn parse_file(&self, path: &Path) -> Result<ParsedDocument, ServiceError> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.parse(&filename, bytes).await
    }

    /// Render `changes` against `original_text` as a tracked-changes `.docx`.
    pub async fn redline(
        &self,
        original_text: &str,
        changes: &[RedlineChange],
    ) -> Result<Vec<u8>, ServiceError> {
        let url = format!("{}/redline", self.base_url);
        info!(url = %url, changes = changes.len(), "requesting redlined document");

        let body = RedlineRequest {
            original_text,
            changes,
        };
        let resp = self.client.post(&url).json(&body).send().await?;
        let bytes = ServiceError::check(resp).await?.bytes().await?;

        info!(size = bytes.len(), "received redlined document");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_document_from_processor_json() {
        let json = r#"{
            "metadata": {
                "filename": "msa.pdf",
                "file_type": "pdf",
                "doc_type": "Contract",
                "extracted_dates": ["2026-01-01"],
                "extracted_values": ["$250,000"],
                "page_count": 14
            },
            "sections": [
                {"text": "1. Definitions", "metadata": {"page": 1}},
                {"text": "2. Liability", "metadata": {}}
            ],
            "full_text": "1. Definitions\n2. Liability"
        }"#;
        let doc: ParsedDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.metadata.doc_type, "Contract");
        assert_eq!(doc.metadata.page_count, 14);
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].metadata["page"], 1);
        assert!(doc.full_text.contains("Liability"));
    }

    #[test]
    fn sparse_metadata_defaults() {
        let json = r#"{
            "metadata": {"filename": "rfp.docx", "file_type": "docx", "doc_type": "RFP"},
            "full_text": "Scope of work."
        }"#;
        let doc: ParsedDocument = serde_json::from_str(json).unwrap();
        assert!(doc.sections.is_empty());
        assert!(doc.metadata.extracted_dates.is_empty());
        assert_eq!(doc.metadata.page_count, 0);
    }

    #[test]
    fn redline_request_shape() {
        let changes = vec![RedlineChange {
            original: "Liability is unlimited.".into(),
            new: "Liability is capped at fees paid.".into(),
        }];
        let body = RedlineRequest {
            original_text: "Liability is unlimited. Notices in writing.",
            changes: &changes,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["original_text"], "Liability is unlimited. Notices in writing.");
        assert_eq!(json["changes"][0]["original"], "Liability is unlimited.");
        assert_eq!(json["changes"][0]["new"], "Liability is capped at fees paid.");
    }

    #[test]
    fn health_status() {
        let health: HealthStatus = serde_json::from_str(r#"{"status": "healthy"}"#).unwrap();
        assert!(health.is_healthy());
        let health: HealthStatus = serde_json::from_str(r#"{"status": "degraded"}"#).unwrap();
        assert!(!health.is_healthy());
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = DocumentClient::new("http://localhost:8000/");
        assert_eq!(client.base_url, "http://localhost:8000");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let client = DocumentClient::new("http://localhost:8000");
        let err = client
            .parse_file(Path::new("/nonexistent/contract.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)));
    }
}
