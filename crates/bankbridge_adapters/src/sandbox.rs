//! Scaffolding for simulated providers.
//!
//! Nothing here talks to a bank. Latencies, acceptance odds and status draws
//! stand in for provider behaviour so the dispatch layer can be exercised
//! end to end; none of it is a contract callers may rely on.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bankbridge_contract::{ApplicationEnvelope, ApplicationStatus, BankInfo, BankResponse};
use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, info};

use crate::adapter::AdapterError;
use crate::validation::{self, validate};

/// Tunables of one simulated provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxProfile {
    pub active: bool,
    /// Probability in `[0, 1]` that a valid submission is accepted.
    pub acceptance_rate: f64,
    pub submit_latency: Duration,
    pub status_latency: Duration,
    pub timeout: Duration,
    /// Reject status lookups for ids this sandbox never issued.
    pub strict_status_lookup: bool,
}

impl SandboxProfile {
    /// Zero latency with a fixed outcome; intended for tests.
    pub fn deterministic(accept: bool) -> Self {
        Self {
            active: true,
            acceptance_rate: if accept { 1.0 } else { 0.0 },
            submit_latency: Duration::ZERO,
            status_latency: Duration::ZERO,
            timeout: Duration::from_secs(5),
            strict_status_lookup: false,
        }
    }

    pub(crate) fn draw_acceptance(&self) -> bool {
        let p = if self.acceptance_rate.is_nan() {
            0.0
        } else {
            self.acceptance_rate.clamp(0.0, 1.0)
        };
        rand::rng().random_bool(p)
    }
}

/// Issues provider application ids. Ids are only retained when the sandbox
/// does strict status lookups.
#[derive(Debug)]
pub(crate) struct Ledger {
    sequence: AtomicU64,
    issued: Option<Mutex<HashSet<String>>>,
}

impl Ledger {
    pub(crate) fn new(remember: bool) -> Self {
        let seed = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        Self {
            sequence: AtomicU64::new(seed),
            issued: remember.then(|| Mutex::new(HashSet::new())),
        }
    }

    pub(crate) fn for_profile(profile: &SandboxProfile) -> Self {
        Self::new(profile.strict_status_lookup)
    }

    /// `<CODE>_<n>` with `n` strictly increasing per sandbox.
    pub(crate) fn issue(&self, code: &str) -> String {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed);
        let id = format!("{code}_{n}");
        if let Some(issued) = &self.issued {
            issued.lock().insert(id.clone());
        }
        id
    }

    pub(crate) fn knows(&self, application_id: &str) -> bool {
        self.issued
            .as_ref()
            .is_some_and(|issued| issued.lock().contains(application_id))
    }

    #[cfg(test)]
    fn retained(&self) -> usize {
        self.issued.as_ref().map_or(0, |issued| issued.lock().len())
    }
}

/// Runs shared validation, waits out the submit latency, then takes the
/// provider's answer. Invalid envelopes return immediately.
pub(crate) async fn submit(
    info: &BankInfo,
    profile: &SandboxProfile,
    envelope: &ApplicationEnvelope,
    answer: impl FnOnce() -> BankResponse,
) -> BankResponse {
    if let Err(error) = validate(envelope, info) {
        debug!(bank_id = %info.id, application_id = %envelope.id, %error, "application failed validation");
        return validation::rejection(info, &error);
    }

    tokio::time::sleep(profile.submit_latency).await;
    let response = answer();
    info!(
        bank_id = %info.id,
        application_id = %envelope.id,
        provider_application_id = %response.application_id,
        status = %response.status,
        "sandbox submission answered"
    );
    response
}

pub(crate) async fn look_up(
    profile: &SandboxProfile,
    ledger: &Ledger,
    application_id: &str,
    answer: impl FnOnce() -> ApplicationStatus,
) -> Result<ApplicationStatus, AdapterError> {
    tokio::time::sleep(profile.status_latency).await;
    if profile.strict_status_lookup && !ledger.knows(application_id) {
        return Err(AdapterError::ApplicationNotFound(application_id.to_string()));
    }
    Ok(answer())
}

/// Picks one entry uniformly.
pub(crate) fn pick<'a>(choices: &[&'a str]) -> &'a str {
    let index = rand::rng().random_range(0..choices.len());
    choices[index]
}

/// Terms attached to a simulated approval.
pub(crate) struct ApprovalTerms {
    pub amount: f64,
    pub rate: f64,
    pub term_months: u32,
}

impl ApprovalTerms {
    pub(crate) fn draw(
        amount: std::ops::Range<f64>,
        rate: std::ops::Range<f64>,
        term_months: std::ops::Range<u32>,
    ) -> Self {
        let mut rng = rand::rng();
        Self {
            amount: rng.random_range(amount),
            rate: rng.random_range(rate),
            term_months: rng.random_range(term_months),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_ids_are_prefixed_and_increasing() {
        let ledger = Ledger::new(true);
        let first = ledger.issue("SBER");
        let second = ledger.issue("SBER");

        let n = |id: &str| -> u64 {
            id.strip_prefix("SBER_")
                .and_then(|rest| rest.parse().ok())
                .expect("numeric suffix")
        };
        assert!(n(&second) > n(&first));
        assert!(ledger.knows(&first));
        assert!(!ledger.knows("SBER_0"));
    }

    #[test]
    fn lenient_ledger_retains_nothing() {
        let ledger = Ledger::for_profile(&SandboxProfile::deterministic(true));
        let ids: Vec<_> = (0..10_000).map(|_| ledger.issue("VTB")).collect();

        assert_eq!(ledger.retained(), 0);
        assert!(!ledger.knows(&ids[0]));
        assert_ne!(ids[0], ids[9_999]);
    }

    #[test]
    fn strict_ledger_retains_each_issued_id() {
        let mut profile = SandboxProfile::deterministic(true);
        profile.strict_status_lookup = true;
        let ledger = Ledger::for_profile(&profile);
        for _ in 0..3 {
            ledger.issue("SBER");
        }
        assert_eq!(ledger.retained(), 3);
    }

    #[test]
    fn fixed_rates_are_fixed() {
        assert!(SandboxProfile::deterministic(true).draw_acceptance());
        assert!(!SandboxProfile::deterministic(false).draw_acceptance());

        let mut broken = SandboxProfile::deterministic(true);
        broken.acceptance_rate = f64::NAN;
        assert!(!broken.draw_acceptance());
    }

    #[test]
    fn drawn_terms_stay_in_range() {
        for _ in 0..50 {
            let terms = ApprovalTerms::draw(1.0..2.0, 10.0..11.0, 6..12);
            assert!((1.0..2.0).contains(&terms.amount));
            assert!((10.0..11.0).contains(&terms.rate));
            assert!((6..12).contains(&terms.term_months));
        }
    }
}
