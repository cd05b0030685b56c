pub mod account;
pub mod account_store;
pub mod config;
pub mod envelope;
pub mod import_manager;
pub mod reassembler;

pub(crate) mod build;
pub(crate) mod logging;

#[cfg(test)]
mod test_fixtures;

pub use account::{AccountRecord, BytesOrText, CoinMeta, CoinType, WalletInfo};
pub use account_store::{AccountStore, MemoryAccountStore};
pub use config::ImportConfig;
pub use envelope::{AccountEnvelope, EnvelopeDecoder, EnvelopeError, FlateInflater, Inflate};
pub use import_manager::{ImportError, ImportErrorKind, ImportEvent, ImportSession};
pub use reassembler::{Outcome, PartReassembler, ReassemblyError, ScanProgress};

uniffi::setup_scaffolding!();
