//! `AdapterManager`: the registry of provider adapters and the fan-out
//! operations built on it.
//!
//! The registry is guarded by a read/write lock. Every operation copies what
//! it needs out of the map and releases the lock before any adapter call, so
//! slow providers never block registration or other readers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bankbridge_adapters::{AdapterError, BankAdapter, SberbankSandbox, VtbSandbox};
use bankbridge_contract::{
    error_codes, ApplicationEnvelope, ApplicationStatus, ApplicationType, BankInfo, BankResponse,
};
use futures::future::join_all;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ManagerConfig;

pub type SharedAdapter = Arc<dyn BankAdapter>;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("no adapter registered for bank {0}")]
    ProviderNotFound(String),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

#[derive(Clone)]
pub struct AdapterManager {
    adapters: Arc<RwLock<HashMap<String, SharedAdapter>>>,
    default_timeout: Duration,
}

impl AdapterManager {
    /// Registry with both sandbox providers in their built-in profiles.
    pub fn new() -> Self {
        Self::from_config(&ManagerConfig::default())
    }

    pub fn from_config(config: &ManagerConfig) -> Self {
        let manager = Self::empty(config.dispatch.default_timeout());
        let sberbank = config.profile_for(
            bankbridge_adapters::sberbank::BANK_ID,
            SberbankSandbox::default_profile(),
        );
        let vtb = config.profile_for(
            bankbridge_adapters::vtb::BANK_ID,
            VtbSandbox::default_profile(),
        );
        manager.register(Arc::new(SberbankSandbox::with_profile(sberbank)));
        manager.register(Arc::new(VtbSandbox::with_profile(vtb)));
        manager
    }

    pub fn empty(default_timeout: Duration) -> Self {
        Self {
            adapters: Arc::new(RwLock::new(HashMap::new())),
            default_timeout,
        }
    }

    /// Inserts `adapter` under its descriptor id, replacing any previous one.
    pub fn register(&self, adapter: SharedAdapter) {
        let bank_id = adapter.bank_info().id.clone();
        let replaced = self
            .adapters
            .write()
            .insert(bank_id.clone(), adapter)
            .is_some();
        info!(bank_id = %bank_id, replaced, "bank adapter registered");
    }

    pub fn get(&self, bank_id: &str) -> Result<SharedAdapter, ManagerError> {
        self.adapters
            .read()
            .get(bank_id)
            .cloned()
            .ok_or_else(|| ManagerError::ProviderNotFound(bank_id.to_string()))
    }

    /// Copy of the registry.
    pub fn list_all(&self) -> HashMap<String, SharedAdapter> {
        self.adapters.read().clone()
    }

    /// Copy of the registry restricted to active providers.
    pub fn list_active(&self) -> HashMap<String, SharedAdapter> {
        self.adapters
            .read()
            .iter()
            .filter(|(_, adapter)| adapter.bank_info().is_active)
            .map(|(id, adapter)| (id.clone(), Arc::clone(adapter)))
            .collect()
    }

    /// Submits to every active provider; one response per provider, in no
    /// particular order. Never fails as a whole.
    pub async fn send_to_all(&self, envelope: &ApplicationEnvelope) -> Vec<BankResponse> {
        let targets = self
            .list_active()
            .into_iter()
            .map(|(id, adapter)| (id, Some(adapter)))
            .collect();
        self.fan_out(envelope, targets, error_codes::ADAPTER_ERROR)
            .await
    }

    /// Submits to each requested provider; one response per requested id, in
    /// request order. Duplicates are sent twice.
    pub async fn send_to_specific<S>(
        &self,
        envelope: &ApplicationEnvelope,
        bank_ids: &[S],
    ) -> Vec<BankResponse>
    where
        S: AsRef<str> + Sync,
    {
        let targets = {
            let adapters = self.adapters.read();
            bank_ids
                .iter()
                .map(|id| (id.as_ref().to_string(), adapters.get(id.as_ref()).cloned()))
                .collect()
        };
        self.fan_out(envelope, targets, error_codes::SEND_ERROR).await
    }

    /// `send_to_all` when no ids are given, `send_to_specific` otherwise.
    pub async fn dispatch<S>(
        &self,
        envelope: &ApplicationEnvelope,
        bank_ids: &[S],
    ) -> Vec<BankResponse>
    where
        S: AsRef<str> + Sync,
    {
        if bank_ids.is_empty() {
            self.send_to_all(envelope).await
        } else {
            self.send_to_specific(envelope, bank_ids).await
        }
    }

    pub fn summarize(&self) -> Vec<BankInfo> {
        self.list_active()
            .values()
            .map(|adapter| adapter.bank_info().clone())
            .collect()
    }

    pub fn is_available(&self, bank_id: &str) -> bool {
        self.get(bank_id)
            .map(|adapter| adapter.bank_info().is_active)
            .unwrap_or(false)
    }

    pub fn supported_for(&self, application_type: &ApplicationType) -> Vec<BankInfo> {
        self.summarize()
            .into_iter()
            .filter(|info| info.supports(application_type))
            .collect()
    }

    /// Status of one application at one provider. Unknown banks and adapter
    /// failures are returned to the caller.
    pub async fn application_status(
        &self,
        application_id: &str,
        bank_id: &str,
    ) -> Result<ApplicationStatus, ManagerError> {
        let adapter = self.get(bank_id)?;
        let limit = self.timeout_for(adapter.as_ref());
        match tokio::time::timeout(limit, adapter.application_status(application_id)).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(bank_id, application_id, ?limit, "status query timed out");
                Err(AdapterError::Timeout {
                    bank_id: bank_id.to_string(),
                    after: limit,
                }
                .into())
            }
        }
    }

    fn timeout_for(&self, adapter: &dyn BankAdapter) -> Duration {
        adapter.call_timeout().unwrap_or(self.default_timeout)
    }

    /// Runs each resolved target on its own task and joins the results in
    /// target order. Unresolved targets become `ADAPTER_NOT_FOUND`; call
    /// failures, timeouts and panics become `failure_code`.
    async fn fan_out(
        &self,
        envelope: &ApplicationEnvelope,
        targets: Vec<(String, Option<SharedAdapter>)>,
        failure_code: &'static str,
    ) -> Vec<BankResponse> {
        info!(application_id = %envelope.id, targets = targets.len(), "dispatching application");
        let envelope = Arc::new(envelope.clone());

        let calls = targets.into_iter().map(|(bank_id, adapter)| {
            let envelope = Arc::clone(&envelope);
            let limit = adapter.as_deref().map(|a| self.timeout_for(a));
            async move {
                let (Some(adapter), Some(limit)) = (adapter, limit) else {
                    warn!(bank_id = %bank_id, "no adapter registered");
                    let message = ManagerError::ProviderNotFound(bank_id.clone()).to_string();
                    return BankResponse::failure(bank_id, error_codes::ADAPTER_NOT_FOUND, message);
                };

                let outcome = match tokio::spawn(submit(adapter, envelope, limit)).await {
                    Ok(result) => result,
                    Err(join_error) => Err(AdapterError::Communication(format!(
                        "adapter task aborted: {join_error}"
                    ))),
                };

                match outcome {
                    Ok(mut response) => {
                        if response.bank_id.is_empty() {
                            response.bank_id = bank_id;
                        }
                        response
                    }
                    Err(error) => {
                        warn!(bank_id = %bank_id, %error, "adapter call failed");
                        BankResponse::failure(bank_id, failure_code, format!("send failed: {error}"))
                    }
                }
            }
        });

        let responses = join_all(calls).await;
        let accepted = responses.iter().filter(|r| r.success).count();
        info!(
            application_id = %envelope.id,
            accepted,
            rejected = responses.len() - accepted,
            "dispatch finished"
        );
        responses
    }
}

async fn submit(
    adapter: SharedAdapter,
    envelope: Arc<ApplicationEnvelope>,
    limit: Duration,
) -> Result<BankResponse, AdapterError> {
    match tokio::time::timeout(limit, adapter.send_application(&envelope)).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout {
            bank_id: adapter.bank_info().id.clone(),
            after: limit,
        }),
    }
}

impl Default for AdapterManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AdapterManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<String> = self.adapters.read().keys().cloned().collect();
        ids.sort();
        f.debug_struct("AdapterManager")
            .field("adapters", &ids)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}
