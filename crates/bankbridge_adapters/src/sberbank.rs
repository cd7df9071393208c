//! Simulated Sberbank integration.

use std::time::Duration;

use async_trait::async_trait;
use bankbridge_contract::{
    error_codes, ApplicationEnvelope, ApplicationStatus, ApplicationType, BankInfo, BankResponse,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::adapter::{AdapterError, BankAdapter};
use crate::client::ClientSections;
use crate::sandbox::{self, ApprovalTerms, Ledger, SandboxProfile};

pub const BANK_ID: &str = "sberbank";

const STATUSES: &[&str] = &["processing", "approved", "rejected", "pending_documents"];

#[derive(Debug)]
pub struct SberbankSandbox {
    info: BankInfo,
    profile: SandboxProfile,
    ledger: Ledger,
}

impl SberbankSandbox {
    pub fn new() -> Self {
        Self::with_profile(Self::default_profile())
    }

    pub fn default_profile() -> SandboxProfile {
        SandboxProfile {
            active: true,
            acceptance_rate: 0.8,
            submit_latency: Duration::from_millis(100),
            status_latency: Duration::from_millis(50),
            timeout: Duration::from_secs(30),
            strict_status_lookup: false,
        }
    }

    pub fn with_profile(profile: SandboxProfile) -> Self {
        let info = BankInfo {
            id: BANK_ID.to_string(),
            name: "Sberbank".to_string(),
            code: "SBER".to_string(),
            api_endpoint: "https://api.sberbank.ru/sandbox".to_string(),
            is_active: profile.active,
            supported_types: vec![ApplicationType::Credit, ApplicationType::Guarantee],
            max_amount: 50_000_000.0,
            min_amount: 100_000.0,
            processing_time: "1-3 business days".to_string(),
        };
        Self {
            info,
            ledger: Ledger::for_profile(&profile),
            profile,
        }
    }

    fn submission_outcome(&self) -> BankResponse {
        let accepted = self.profile.draw_acceptance();
        let mut response = BankResponse {
            success: accepted,
            application_id: self.ledger.issue(&self.info.code),
            bank_id: BANK_ID.to_string(),
            status: String::new(),
            message: String::new(),
            error_code: None,
            timestamp: Utc::now(),
        };

        if accepted {
            response.status = "received".to_string();
            response.message = "Application accepted for review".to_string();
        } else {
            response.status = "rejected".to_string();
            response.message = "Application rejected at the primary check".to_string();
            response.error_code = Some(error_codes::PRIMARY_CHECK_FAILED.to_string());
        }
        response
    }

    fn status_for(&self, application_id: &str) -> ApplicationStatus {
        let status = sandbox::pick(STATUSES);
        let mut record = ApplicationStatus {
            application_id: application_id.to_string(),
            bank_id: BANK_ID.to_string(),
            status: status.to_string(),
            decision: None,
            amount: None,
            rate: None,
            term_months: None,
            message: String::new(),
            updated_at: Utc::now(),
        };

        match status {
            "approved" => {
                let terms = ApprovalTerms::draw(1_000_000.0..6_000_000.0, 12.5..17.5, 12..72);
                record.decision = Some("approved".to_string());
                record.amount = Some(terms.amount);
                record.rate = Some(terms.rate);
                record.term_months = Some(terms.term_months);
                record.message = "Approved, awaiting document signing".to_string();
            }
            "rejected" => {
                record.decision = Some("rejected".to_string());
                record.message = "Rejected based on scoring results".to_string();
            }
            "processing" => record.message = "Application is under review".to_string(),
            _ => record.message = "Additional documents are required".to_string(),
        }
        record
    }
}

impl Default for SberbankSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BankAdapter for SberbankSandbox {
    fn bank_info(&self) -> &BankInfo {
        &self.info
    }

    async fn send_application(
        &self,
        envelope: &ApplicationEnvelope,
    ) -> Result<BankResponse, AdapterError> {
        let response =
            sandbox::submit(&self.info, &self.profile, envelope, || self.submission_outcome()).await;
        Ok(response)
    }

    async fn application_status(
        &self,
        application_id: &str,
    ) -> Result<ApplicationStatus, AdapterError> {
        sandbox::look_up(&self.profile, &self.ledger, application_id, || {
            self.status_for(application_id)
        })
        .await
    }

    fn transform(&self, envelope: &ApplicationEnvelope) -> Value {
        let client = ClientSections::new(&envelope.client_data);
        json!({
            "application_id": envelope.id,
            "product_type": envelope.application_type.as_str(),
            "amount": envelope.amount,
            "currency": "RUB",
            "client": {
                "personal": {
                    "surname": client.identity("lastName"),
                    "name": client.identity("firstName"),
                    "patronymic": client.identity("middleName"),
                    "birth_date": client.identity("birthDate"),
                    "birth_place": client.identity("birthPlace"),
                    "gender": client.identity("gender"),
                    "citizenship": client.identity("citizenship"),
                },
                "contact": {
                    "phone": client.contact("primaryPhone"),
                    "email": client.contact("email"),
                    "reg_address": client.contact("registrationAddress"),
                },
                "employment": {
                    "employer": client.employment("companyName"),
                    "position": client.employment("position"),
                    "income": client.employment("monthlyIncome"),
                },
            },
            "files": envelope.files,
            "scoring": envelope.scoring,
        })
    }

    fn call_timeout(&self) -> Option<Duration> {
        Some(self.profile.timeout)
    }
}
