pub mod bank;
pub mod codec;
pub mod envelope;
pub mod error_codes;
pub mod record;

pub use bank::{ApplicationStatus, BankInfo, BankResponse, STATUS_FAILED};
pub use codec::{decode_canonical, encode_canonical, CodecError};
pub use envelope::{ApplicationEnvelope, ApplicationType, FileDescriptor, RiskAssessment};
pub use record::ApplicationRecord;
