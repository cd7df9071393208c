use std::time::Duration;

use async_trait::async_trait;
use bankbridge_contract::{
    encode_canonical, ApplicationEnvelope, ApplicationStatus, BankInfo, BankResponse, CodecError,
};
use serde_json::Value;
use thiserror::Error;

/// Failures of the adapter call itself, as opposed to business-rule
/// rejections, which are reported as unsuccessful `BankResponse`s.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("provider communication failed: {0}")]
    Communication(String),
    #[error("provider {bank_id} did not answer within {after:?}")]
    Timeout { bank_id: String, after: Duration },
    #[error("application {0} is unknown to the provider")]
    ApplicationNotFound(String),
}

/// One external provider that can take applications and report on them.
#[async_trait]
pub trait BankAdapter: Send + Sync {
    fn bank_info(&self) -> &BankInfo;

    /// Validates then submits. A business-rule rejection is `Ok` with
    /// `success == false`; `Err` is reserved for failures of the call.
    async fn send_application(
        &self,
        envelope: &ApplicationEnvelope,
    ) -> Result<BankResponse, AdapterError>;

    /// Looks up a previously submitted application. Implementations backed by
    /// a real system of record return `ApplicationNotFound` for ids they never
    /// issued.
    async fn application_status(
        &self,
        application_id: &str,
    ) -> Result<ApplicationStatus, AdapterError>;

    /// Maps the envelope into the provider's field naming. Pure.
    fn transform(&self, envelope: &ApplicationEnvelope) -> Value;

    /// Upper bound for one call to this provider; `None` defers to the
    /// dispatcher's default.
    fn call_timeout(&self) -> Option<Duration> {
        None
    }

    fn encode_wire(&self, envelope: &ApplicationEnvelope) -> Result<Vec<u8>, CodecError> {
        encode_canonical(&self.transform(envelope))
    }
}
