pub mod config;
pub mod manager;
pub mod task;

pub use config::{ConfigError, DispatchSection, ManagerConfig, ProviderOverrides};
pub use manager::{AdapterManager, ManagerError, SharedAdapter};
pub use task::{
    BankTask, BankTaskProcessor, QueueError, TaskKind, TaskOutcome, TaskQueue, TaskResult,
    TaskState,
};
