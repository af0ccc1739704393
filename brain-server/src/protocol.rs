//! JSON bodies exchanged over HTTP. Field names are camelCase on the wire.

use brain_rag::{IngestReport, NewDocument, QueryAnswer, RagError, Source};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/add`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AddRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<AddRequest> for NewDocument {
    fn from(request: AddRequest) -> Self {
        NewDocument { text: request.text, url: request.url, source: request.source }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddResponse {
    pub document_id: String,
    pub fragments_total: usize,
    pub fragments_stored: usize,
}

impl From<IngestReport> for AddResponse {
    fn from(report: IngestReport) -> Self {
        Self {
            document_id: report.document_id,
            fragments_total: report.fragments_total,
            fragments_stored: report.fragments_stored,
        }
    }
}

/// Body of `POST /api/query`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QueryRequestBody {
    #[serde(default)]
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourcePayload {
    pub document_id: String,
    pub snippet: String,
    pub score: f32,
}

impl From<Source> for SourcePayload {
    fn from(source: Source) -> Self {
        Self { document_id: source.document_id, snippet: source.snippet, score: source.score }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourcePayload>,
}

impl From<QueryAnswer> for QueryResponse {
    fn from(answer: QueryAnswer) -> Self {
        Self {
            answer: answer.answer,
            sources: answer.sources.into_iter().map(SourcePayload::from).collect(),
        }
    }
}

/// Error body. Ingestion counters are present only for partial ingestion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragments_stored: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragments_failed: Option<usize>,
}

impl From<&RagError> for ErrorPayload {
    fn from(err: &RagError) -> Self {
        let mut payload = Self {
            error: err.to_string(),
            stage: err.stage().map(|stage| stage.as_str().to_string()),
            document_id: None,
            fragments_stored: None,
            fragments_failed: None,
        };
        if let RagError::PartialIngestion(report) = err {
            payload.document_id = Some(report.document_id.clone());
            payload.fragments_stored = Some(report.fragments_stored);
            payload.fragments_failed = Some(report.fragments_failed());
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use brain_rag::{FragmentFailure, Stage};
    use serde_json::json;

    use super::*;

    #[test]
    fn add_request_accepts_mobile_payload() {
        let request: AddRequest = serde_json::from_value(json!({
            "text": "buy milk",
            "url": "https://example.com",
            "source": "mobile"
        }))
        .unwrap();
        let document = NewDocument::from(request);
        assert_eq!(document.text, "buy milk");
        assert_eq!(document.source.as_deref(), Some("mobile"));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let request: AddRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.text.is_empty());
        let query: QueryRequestBody = serde_json::from_value(json!({})).unwrap();
        assert!(query.question.is_empty());
        assert_eq!(query.k, None);
    }

    #[test]
    fn sources_serialize_camel_case() {
        let response = QueryResponse::from(QueryAnswer {
            answer: "a".into(),
            sources: vec![Source { document_id: "d1".into(), snippet: "s".into(), score: 0.5 }],
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["sources"][0]["documentId"], "d1");
        assert_eq!(value["sources"][0]["score"], 0.5);
    }

    #[test]
    fn partial_ingestion_payload_carries_counts() {
        let err = RagError::PartialIngestion(IngestReport {
            document_id: "doc-1".into(),
            fragments_total: 3,
            fragments_stored: 2,
            failures: vec![FragmentFailure { sequence: 1, error: "boom".into() }],
        });
        let value = serde_json::to_value(ErrorPayload::from(&err)).unwrap();
        assert_eq!(value["documentId"], "doc-1");
        assert_eq!(value["fragmentsStored"], 2);
        assert_eq!(value["fragmentsFailed"], 1);
    }

    #[test]
    fn plain_errors_omit_counts() {
        let err = RagError::DependencyUnavailable { stage: Stage::Ranking, message: "down".into() };
        let value = serde_json::to_value(ErrorPayload::from(&err)).unwrap();
        assert_eq!(value["stage"], "ranking");
        assert!(value.get("documentId").is_none());
    }
}
