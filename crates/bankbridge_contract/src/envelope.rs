use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of product requested by an application.
///
/// Anything other than `credit` or `guarantee` is kept verbatim in
/// `Unrecognized` so it survives a round trip and can be rejected by
/// validation instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApplicationType {
    Credit,
    Guarantee,
    Unrecognized(String),
}

impl ApplicationType {
    pub fn as_str(&self) -> &str {
        match self {
            ApplicationType::Credit => "credit",
            ApplicationType::Guarantee => "guarantee",
            ApplicationType::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ApplicationType::Unrecognized(_))
    }
}

impl From<String> for ApplicationType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "credit" => ApplicationType::Credit,
            "guarantee" => ApplicationType::Guarantee,
            _ => ApplicationType::Unrecognized(raw),
        }
    }
}

impl From<&str> for ApplicationType {
    fn from(raw: &str) -> Self {
        ApplicationType::from(raw.to_string())
    }
}

impl From<ApplicationType> for String {
    fn from(kind: ApplicationType) -> Self {
        match kind {
            ApplicationType::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document attached to an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size: u64,
    #[serde(with = "base64_bytes", default)]
    pub content: Vec<u8>,
    pub mime_type: String,
}

/// Risk classification produced by the scoring service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub risk_class: String,
}

/// Provider-agnostic application handed to the dispatch layer.
///
/// `client_data` and `scoring` are carried uninterpreted; each adapter reads
/// only the sub-fields it maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub application_type: ApplicationType,
    pub amount: f64,
    #[serde(default)]
    pub client_data: Value,
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
    #[serde(rename = "scoring_data", default, skip_serializing_if = "Option::is_none")]
    pub scoring: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl ApplicationEnvelope {
    pub fn new(
        id: impl Into<String>,
        application_type: impl Into<ApplicationType>,
        amount: f64,
        client_data: Value,
    ) -> Self {
        Self {
            id: id.into(),
            application_type: application_type.into(),
            amount,
            client_data,
            files: Vec::new(),
            scoring: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_files(mut self, files: Vec<FileDescriptor>) -> Self {
        self.files = files;
        self
    }

    pub fn with_scoring_payload(mut self, payload: Value) -> Self {
        self.scoring = Some(payload);
        self
    }

    /// Attaches a scoring result as `{"score": .., "risk_class": ..}`.
    pub fn with_scoring(self, assessment: &RiskAssessment) -> Self {
        let payload = serde_json::json!({
            "score": assessment.score,
            "risk_class": assessment.risk_class,
        });
        self.with_scoring_payload(payload)
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?;
        match encoded {
            Some(text) => STANDARD.decode(text.as_bytes()).map_err(D::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_type_is_preserved() {
        let kind: ApplicationType = serde_json::from_value(json!("leasing")).expect("decode");
        assert_eq!(kind, ApplicationType::Unrecognized("leasing".to_string()));
        assert!(!kind.is_recognized());
        assert_eq!(serde_json::to_value(&kind).expect("encode"), json!("leasing"));
    }

    #[test]
    fn type_match_is_exact() {
        assert_eq!(ApplicationType::from("credit"), ApplicationType::Credit);
        assert_eq!(ApplicationType::from("guarantee"), ApplicationType::Guarantee);
        assert!(!ApplicationType::from("Credit").is_recognized());
    }

    #[test]
    fn file_content_travels_as_base64() {
        let file = FileDescriptor {
            id: "f1".to_string(),
            name: "passport.pdf".to_string(),
            file_type: "passport".to_string(),
            size: 3,
            content: vec![1, 2, 3],
            mime_type: "application/pdf".to_string(),
        };

        let value = serde_json::to_value(&file).expect("encode");
        assert_eq!(value["content"], json!("AQID"));
        assert_eq!(value["type"], json!("passport"));

        let decoded: FileDescriptor = serde_json::from_value(value).expect("decode");
        assert_eq!(decoded.content, vec![1, 2, 3]);
    }

    #[test]
    fn envelope_accepts_minimal_json() {
        let envelope: ApplicationEnvelope = serde_json::from_value(json!({
            "id": "42",
            "type": "guarantee",
            "amount": 750000.0,
            "created_at": "2024-03-01T10:00:00Z"
        }))
        .expect("decode");

        assert_eq!(envelope.application_type, ApplicationType::Guarantee);
        assert!(envelope.client_data.is_null());
        assert!(envelope.files.is_empty());
        assert!(envelope.scoring.is_none());
    }

    #[test]
    fn scoring_is_attached_unmodified() {
        let envelope = ApplicationEnvelope::new("7", "credit", 1_000_000.0, json!({}))
            .with_scoring(&RiskAssessment {
                score: 85.5,
                risk_class: "A".to_string(),
            });

        assert_eq!(
            envelope.scoring,
            Some(json!({ "score": 85.5, "risk_class": "A" }))
        );
    }
}
