pub mod cbor;
pub mod error;
pub mod payload;
pub mod ur;
pub mod ur_type;

pub use cbor::Value;
pub use error::{Result, UrError};
pub use payload::{DecodedPayload, RecoveredPayload};
pub use ur::{FragmentHeader, Sequence, Ur};
pub use ur_type::UrType;

// UniFFI scaffolding
uniffi::setup_scaffolding!();
