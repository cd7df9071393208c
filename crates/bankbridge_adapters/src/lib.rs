pub mod adapter;
mod client;
pub mod sandbox;
pub mod sberbank;
pub mod validation;
pub mod vtb;

pub use adapter::{AdapterError, BankAdapter};
pub use sandbox::SandboxProfile;
pub use sberbank::SberbankSandbox;
pub use validation::{validate, ValidationError};
pub use vtb::VtbSandbox;
