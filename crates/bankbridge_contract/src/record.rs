use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{ApplicationEnvelope, ApplicationType};

/// An application as materialised by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub application_type: ApplicationType,
    pub amount: f64,
    #[serde(default)]
    pub personal_data: Value,
    #[serde(default)]
    pub scoring: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<ApplicationRecord> for ApplicationEnvelope {
    fn from(record: ApplicationRecord) -> Self {
        Self {
            id: record.id.to_string(),
            application_type: record.application_type,
            amount: record.amount,
            client_data: record.personal_data,
            files: Vec::new(),
            scoring: record.scoring,
            created_at: record.created_at,
        }
    }
}
