//! End-to-end scan session: fragments in, account records out.
//!
//! State transitions:
//! - Idle → Reassembling (first fragment of a multi-part UR)
//! - Idle / Reassembling → Completed (payload recovered and decoded)
//! - Idle / Reassembling → Idle (any failure, the next fragment starts over)
//! - Completed → ignores fragments until [`ImportSession::begin`]

use std::sync::Arc;

use flume::{Receiver, Sender};
use folio_ur::UrError;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    account::{self, AccountRecord},
    account_store::AccountStore,
    config::ImportConfig,
    envelope::{EnvelopeDecoder, EnvelopeError, FlateInflater, Inflate},
    reassembler::{Outcome, PartReassembler, ReassemblyError, ScanProgress},
};

/// Haptic feedback hint for the platform to trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum HapticFeedback {
    /// Light tap, new part scanned in a multi-part QR
    Progress,
    /// Success notification, accounts recovered
    Success,
    /// Failure notification, the scan has to be retried
    Error,
    /// No haptic feedback (duplicate part, ignored frame)
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum, strum::Display)]
pub enum ImportErrorKind {
    Rejected,
    ReconstructionError,
    MalformedEnvelope,
    DecodeError,
    UnsupportedPayloadShape,
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Error, thiserror::Error)]
#[uniffi::export(Display)]
pub enum ImportError {
    #[error("QR code rejected: {0}")]
    Rejected(String),

    #[error("failed to reconstruct scanned data: {0}")]
    ReconstructionError(String),

    #[error("malformed UR message: {0}")]
    MalformedEnvelope(String),

    #[error("failed to decode account export: {0}")]
    DecodeError(String),

    #[error("unsupported account export (ur:{ur_type})")]
    UnsupportedPayloadShape { ur_type: String },
}

/// What a scanned frame did to the session
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum ImportEvent {
    /// Multi-part scan in progress, keep scanning
    NeedMore { progress: ScanProgress, haptic: HapticFeedback },
    /// Session finished, possibly with zero accounts
    Recovered { records: Vec<AccountRecord> },
    /// Session failed and was reset
    Failed { kind: ImportErrorKind, message: String },
    /// Frame arrived after the session completed
    Ignored,
}

#[derive(Debug)]
enum SessionState {
    Idle,
    Reassembling(PartReassembler),
    Completed,
}

/// One scan session at a time, owned by the scanner screen
#[derive(Debug)]
pub struct ImportSession<I = FlateInflater> {
    state: SessionState,
    envelope_decoder: EnvelopeDecoder<I>,
    max_message_len: u64,
}

type Result<T, E = ImportError> = std::result::Result<T, E>;

impl ImportError {
    pub fn kind(&self) -> ImportErrorKind {
        match self {
            Self::Rejected(_) => ImportErrorKind::Rejected,
            Self::ReconstructionError(_) => ImportErrorKind::ReconstructionError,
            Self::MalformedEnvelope(_) => ImportErrorKind::MalformedEnvelope,
            Self::DecodeError(_) => ImportErrorKind::DecodeError,
            Self::UnsupportedPayloadShape { .. } => ImportErrorKind::UnsupportedPayloadShape,
        }
    }
}

impl From<ReassemblyError> for ImportError {
    fn from(error: ReassemblyError) -> Self {
        match error {
            ReassemblyError::Rejected(reason) => Self::Rejected(reason.to_string()),
            error @ (ReassemblyError::NotComplete | ReassemblyError::Reconstruction(_)) => {
                Self::ReconstructionError(error.to_string())
            }
        }
    }
}

impl From<UrError> for ImportError {
    fn from(error: UrError) -> Self {
        match error {
            UrError::MalformedEnvelope(message) => Self::MalformedEnvelope(message),
            other => Self::MalformedEnvelope(other.to_string()),
        }
    }
}

impl From<EnvelopeError> for ImportError {
    fn from(error: EnvelopeError) -> Self {
        match error {
            EnvelopeError::DecodeError(message) => Self::DecodeError(message),
            EnvelopeError::UnsupportedPayloadShape { ur_type } => {
                Self::UnsupportedPayloadShape { ur_type: ur_type.to_string() }
            }
        }
    }
}

impl From<ImportError> for ImportEvent {
    fn from(error: ImportError) -> Self {
        Self::Failed { kind: error.kind(), message: error.to_string() }
    }
}

#[uniffi::export]
impl ImportEvent {
    pub fn haptic(&self) -> HapticFeedback {
        match self {
            Self::NeedMore { haptic, .. } => *haptic,
            Self::Recovered { .. } => HapticFeedback::Success,
            Self::Failed { .. } => HapticFeedback::Error,
            Self::Ignored => HapticFeedback::None,
        }
    }
}

impl ImportSession<FlateInflater> {
    pub fn new(config: &ImportConfig) -> Self {
        Self::with_envelope_decoder(EnvelopeDecoder::from_config(config), config)
    }
}

impl<I: Inflate> ImportSession<I> {
    pub fn with_envelope_decoder(envelope_decoder: EnvelopeDecoder<I>, config: &ImportConfig) -> Self {
        Self {
            state: SessionState::Idle,
            envelope_decoder,
            max_message_len: config.max_message_len,
        }
    }

    /// Start a new session, dropping any partial or completed scan
    pub fn begin(&mut self) {
        debug!("import session started");
        self.state = SessionState::Idle;
    }

    /// Stop scanning, e.g. when the scanner screen loses focus
    pub fn abandon(&mut self) {
        if let SessionState::Reassembling(reassembler) = &self.state {
            debug!("import session abandoned, progress: {:?}", reassembler.progress());
        }

        self.state = SessionState::Idle;
    }

    /// Whether the next frame will be processed
    pub fn is_accepting_frames(&self) -> bool {
        !matches!(self.state, SessionState::Completed)
    }

    pub fn progress(&self) -> Option<ScanProgress> {
        match &self.state {
            SessionState::Reassembling(reassembler) => reassembler.progress(),
            _ => None,
        }
    }

    /// Feed one scanned frame
    pub fn on_frame(&mut self, frame: &str) -> ImportEvent {
        // take ownership of current state, failures leave it idle
        let current_state = std::mem::replace(&mut self.state, SessionState::Idle);

        let mut reassembler = match current_state {
            SessionState::Completed => {
                debug!("session already completed, ignoring frame");
                self.state = SessionState::Completed;
                return ImportEvent::Ignored;
            }
            SessionState::Idle => PartReassembler::with_max_message_len(self.max_message_len),
            SessionState::Reassembling(reassembler) => reassembler,
        };

        let outcome = match reassembler.receive(frame) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("frame rejected, resetting session: {error}");
                return ImportError::from(error).into();
            }
        };

        match outcome {
            Outcome::Incomplete { progress, new_part } => {
                let haptic = if new_part { HapticFeedback::Progress } else { HapticFeedback::None };
                self.state = SessionState::Reassembling(reassembler);

                ImportEvent::NeedMore { progress, haptic }
            }

            Outcome::Complete => match self.recover(&mut reassembler) {
                Ok(records) => {
                    info!("recovered {} accounts from scan", records.len());
                    self.state = SessionState::Completed;

                    ImportEvent::Recovered { records }
                }
                Err(error) => {
                    warn!("failed to import scanned accounts: {error}");
                    error.into()
                }
            },
        }
    }

    /// Extract, unwrap, decode and normalize a completed scan
    fn recover(&self, reassembler: &mut PartReassembler) -> Result<Vec<AccountRecord>> {
        let recovered = reassembler.extract()?;
        let ur_type = recovered.ur_type.clone();

        let payload = folio_ur::payload::decode(&recovered).inspect_err(|error| {
            warn!("ur:{ur_type} message is malformed: {error}");
        })?;

        let envelope = self.envelope_decoder.decode(&payload).inspect_err(|error| {
            warn!("ur:{ur_type} payload is not an account export: {error}");
        })?;

        Ok(account::normalize(&envelope.entries))
    }
}

// ============================================================================
// FFI manager
// ============================================================================

#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum AccountImportReconcileMessage {
    Progress(ScanProgress),
    AccountsRecovered(Vec<AccountRecord>),
    Error { kind: ImportErrorKind, message: String },
}

#[uniffi::export(callback_interface)]
pub trait AccountImportReconciler: Send + Sync + std::fmt::Debug + 'static {
    /// Tells the frontend to reconcile the view model changes
    fn reconcile(&self, message: AccountImportReconcileMessage);
}

/// Scanner screen entry point from Swift/Kotlin.
///
/// Recovered accounts are upserted into the store before the frontend is told
/// about them.
#[derive(Clone, Debug, uniffi::Object)]
pub struct RustAccountImportManager {
    session: Arc<Mutex<ImportSession>>,
    store: Arc<dyn AccountStore>,
    reconciler: Sender<AccountImportReconcileMessage>,
    reconcile_receiver: Arc<Receiver<AccountImportReconcileMessage>>,
}

#[uniffi::export]
impl RustAccountImportManager {
    #[uniffi::constructor]
    pub fn new(store: Arc<dyn AccountStore>, config: ImportConfig) -> Self {
        let (sender, receiver) = flume::bounded(1000);

        Self {
            session: Arc::new(Mutex::new(ImportSession::new(&config))),
            store,
            reconciler: sender,
            reconcile_receiver: Arc::new(receiver),
        }
    }

    #[uniffi::method]
    pub fn listen_for_updates(&self, reconciler: Box<dyn AccountImportReconciler>) {
        let reconcile_receiver = self.reconcile_receiver.clone();

        std::thread::spawn(move || {
            while let Ok(field) = reconcile_receiver.recv() {
                // call the reconcile method on the frontend
                reconciler.reconcile(field);
            }
        });
    }

    /// Scan one QR frame, recovered accounts are saved to the store
    #[uniffi::method]
    pub fn scan(&self, frame: String) -> ImportEvent {
        let event = self.session.lock().on_frame(&frame);

        match &event {
            ImportEvent::NeedMore { progress, haptic: HapticFeedback::Progress } => {
                self.send(AccountImportReconcileMessage::Progress(progress.clone()));
            }
            ImportEvent::NeedMore { .. } | ImportEvent::Ignored => {}

            ImportEvent::Recovered { records } => {
                for record in records {
                    self.store.upsert(record.clone());
                }

                self.send(AccountImportReconcileMessage::AccountsRecovered(records.clone()));
            }

            ImportEvent::Failed { kind, message } => {
                self.send(AccountImportReconcileMessage::Error {
                    kind: *kind,
                    message: message.clone(),
                });
            }
        }

        event
    }

    #[uniffi::method]
    pub fn begin(&self) {
        self.session.lock().begin();
    }

    #[uniffi::method]
    pub fn abandon(&self) {
        self.session.lock().abandon();
    }

    #[uniffi::method]
    pub fn is_accepting_frames(&self) -> bool {
        self.session.lock().is_accepting_frames()
    }

    #[uniffi::method]
    pub fn progress(&self) -> Option<ScanProgress> {
        self.session.lock().progress()
    }

    /// All accounts in the store
    #[uniffi::method]
    pub fn accounts(&self) -> Vec<AccountRecord> {
        self.store.accounts()
    }
}

impl RustAccountImportManager {
    fn send(&self, message: AccountImportReconcileMessage) {
        if let Err(error) = self.reconciler.try_send(message) {
            warn!("unable to send reconcile message: {error}");
        }
    }
}
