//! Reassembly of UR fragments scanned from single and animated QR codes.
//!
//! [`PartReassembler`] buffers fragments for one scanning session until the
//! original message can be recovered.
//!
//! Reconstruction policy: multi-part URs are fountain coded. Parts `1..=count`
//! are pure fragments and parts above `count` mix several fragments together,
//! so the message is recovered from any sufficient subset of parts, in any order.
//! A sender that only emits the pure fragments requires every one of them.
//! Single-part URs complete immediately without buffering.
//!
//! The first part of a multi-part UR is size-checked against the configured
//! limit before the fountain decoder sees it, every later part must carry the
//! same message length and checksum.

use std::collections::BTreeSet;

use folio_ur::{FragmentHeader, RecoveredPayload, Sequence, Ur, UrType};
use folio_util::result_ext::ResultExt as _;
use foundation_ur::Decoder as UrDecoder;
use tracing::{debug, warn};

use crate::config::ImportConfig;

enum ReassemblyState {
    Empty,
    SinglePart(RecoveredPayload),
    MultiPart(Box<MultiPartProgress>),
}

/// Multi-part UR scanning in progress
struct MultiPartProgress {
    decoder: UrDecoder,
    ur_type: UrType,
    sequence_count: u32,
    /// Header of the first accepted part, later parts must describe the same message
    header: FragmentHeader,
    received: BTreeSet<u32>,
    percentage: f64,
    complete: bool,
}

/// Result of feeding one fragment to the reassembler
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// More parts are needed
    Incomplete {
        progress: ScanProgress,
        /// False when the fragment was a duplicate of one already received
        new_part: bool,
    },
    /// The payload can be extracted
    Complete,
}

/// Progress information for multi-part UR scans
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct ScanProgress {
    /// Distinct parts received so far, pure and mixed
    pub received_parts: u32,
    /// Number of pure fragments the message was split into
    pub expected_parts: u32,
    /// Decoder estimate between 0.0 and 1.0
    pub percentage: f64,
}

#[uniffi::export]
impl ScanProgress {
    /// Display text for the progress (e.g., "Scanned 45%")
    pub fn display_text(&self) -> String {
        let percent = (self.percentage.clamp(0.0, 1.0) * 100.0) as u32;
        format!("Scanned {percent}%")
    }

    /// Detail text for the progress (e.g., "3 parts scanned")
    pub fn detail_text(&self) -> String {
        match self.received_parts {
            1 => "1 part scanned".to_string(),
            parts => format!("{parts} parts scanned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReassemblyError {
    #[error("fragment rejected: {0}")]
    Rejected(#[from] RejectReason),

    #[error("payload is not complete yet")]
    NotComplete,

    #[error("failed to reconstruct payload: {0}")]
    Reconstruction(String),
}

/// Why a fragment was not accepted, the session state is left untouched
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("not a UR fragment: {0}")]
    Unparsable(String),

    #[error("invalid single-part message: {0}")]
    InvalidMessage(String),

    #[error("single-part UR received during a multi-part scan")]
    UnexpectedSinglePart,

    #[error("UR type changed from {expected} to {actual}")]
    TypeMismatch { expected: UrType, actual: UrType },

    #[error("sequence count changed from {expected} to {actual}")]
    SequenceCountMismatch { expected: u32, actual: u32 },

    #[error("inconsistent fragment: {0}")]
    Inconsistent(String),

    #[error("declared message size {declared} exceeds {max} bytes")]
    TooLarge { declared: u64, max: u64 },
}

type Result<T, E = ReassemblyError> = std::result::Result<T, E>;

/// Accumulates the fragments of one scanning session
pub struct PartReassembler {
    state: ReassemblyState,
    max_message_len: u64,
}

impl PartReassembler {
    pub fn new() -> Self {
        Self::with_max_message_len(ImportConfig::DEFAULT_MAX_MESSAGE_LEN)
    }

    /// Multi-part URs declaring a larger message are rejected before anything is buffered
    pub fn with_max_message_len(max_message_len: u64) -> Self {
        Self { state: ReassemblyState::Empty, max_message_len }
    }

    /// Drop all buffered fragments
    pub fn reset(&mut self) {
        self.state = ReassemblyState::Empty;
    }

    /// Feed one scanned fragment.
    ///
    /// Duplicates are accepted and reported with `new_part: false`. Once the
    /// payload is complete further fragments are ignored until [`Self::reset`].
    ///
    /// # Errors
    /// `Rejected` if the fragment is malformed or belongs to a different UR
    pub fn receive(&mut self, fragment: &str) -> Result<Outcome> {
        if self.is_complete() {
            debug!("payload already complete, ignoring fragment");
            return Ok(Outcome::Complete);
        }

        let ur = Ur::parse(fragment).map_err_str(RejectReason::Unparsable)?;

        if let ReassemblyState::MultiPart(progress) = &mut self.state {
            let Some(sequence) = ur.sequence() else {
                return Err(RejectReason::UnexpectedSinglePart.into());
            };

            let new_part = progress.receive(&ur, sequence)?;
            return Ok(progress.outcome(new_part));
        }

        match ur.sequence() {
            None => {
                let message = ur.single_part_message().map_err_str(RejectReason::InvalidMessage)?;

                debug!("single-part UR complete, type: {}, len: {}", ur.ur_type(), message.len());
                let payload = RecoveredPayload::new(message, ur.ur_type().clone());
                self.state = ReassemblyState::SinglePart(payload);

                Ok(Outcome::Complete)
            }

            Some(sequence) => {
                debug!("multi-part UR, type: {}, parts: {}", ur.ur_type(), sequence.count);

                // only keep the session once its first part was accepted
                let progress = MultiPartProgress::start(&ur, sequence, self.max_message_len)?;
                let outcome = progress.outcome(true);
                self.state = ReassemblyState::MultiPart(Box::new(progress));

                Ok(outcome)
            }
        }
    }

    /// Whether enough parts arrived to reconstruct the payload
    pub fn is_complete(&self) -> bool {
        match &self.state {
            ReassemblyState::Empty => false,
            ReassemblyState::SinglePart(_) => true,
            ReassemblyState::MultiPart(progress) => progress.complete,
        }
    }

    /// Progress of a multi-part scan, `None` before the first part or for single-part URs
    pub fn progress(&self) -> Option<ScanProgress> {
        match &self.state {
            ReassemblyState::MultiPart(progress) => Some(progress.progress()),
            _ => None,
        }
    }

    /// Reconstruct the message once [`Self::is_complete`] is true
    ///
    /// # Errors
    /// `NotComplete` if called early, `Reconstruction` if the fountain decoder
    /// fails its checksum
    pub fn extract(&mut self) -> Result<RecoveredPayload> {
        match &mut self.state {
            ReassemblyState::Empty => Err(ReassemblyError::NotComplete),
            ReassemblyState::SinglePart(payload) => Ok(payload.clone()),
            ReassemblyState::MultiPart(progress) if !progress.complete => {
                Err(ReassemblyError::NotComplete)
            }
            ReassemblyState::MultiPart(progress) => {
                let message = progress
                    .decoder
                    .message()
                    .map_err_str(ReassemblyError::Reconstruction)?
                    .ok_or_else(|| ReassemblyError::Reconstruction("no message".into()))?
                    .to_vec();

                debug!("multi-part UR complete, type: {}, len: {}", progress.ur_type, message.len());
                Ok(RecoveredPayload::new(message, progress.ur_type.clone()))
            }
        }
    }
}

folio_macros::impl_default_for!(PartReassembler);

impl std::fmt::Debug for PartReassembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartReassembler")
            .field("max_message_len", &self.max_message_len)
            .field("complete", &self.is_complete())
            .field("progress", &self.progress())
            .finish()
    }
}

impl MultiPartProgress {
    /// Size-check the first part before the fountain decoder allocates its buffers
    fn start(ur: &Ur<'_>, sequence: Sequence, max_message_len: u64) -> Result<Self, RejectReason> {
        let header = ur.fragment_header().map_err_str(RejectReason::Unparsable)?;

        let declared = header.message_length.max(header.buffer_len());
        if declared > max_message_len {
            warn!("multi-part UR declares {declared} bytes, limit is {max_message_len}");
            return Err(RejectReason::TooLarge { declared, max: max_message_len });
        }

        let mut progress = Self {
            decoder: UrDecoder::default(),
            ur_type: ur.ur_type().clone(),
            sequence_count: sequence.count,
            header,
            received: BTreeSet::new(),
            percentage: 0.0,
            complete: false,
        };

        progress.receive(ur, sequence)?;
        Ok(progress)
    }

    /// Returns whether the part was new
    fn receive(&mut self, ur: &Ur<'_>, sequence: Sequence) -> Result<bool, RejectReason> {
        if ur.ur_type() != &self.ur_type {
            return Err(RejectReason::TypeMismatch {
                expected: self.ur_type.clone(),
                actual: ur.ur_type().clone(),
            });
        }

        if sequence.count != self.sequence_count {
            return Err(RejectReason::SequenceCountMismatch {
                expected: self.sequence_count,
                actual: sequence.count,
            });
        }

        let header = ur.fragment_header().map_err_str(RejectReason::Unparsable)?;
        if !header.same_message(&self.header) {
            warn!("UR part {} belongs to a different message", sequence.index);
            return Err(RejectReason::Inconsistent(format!(
                "part {} does not belong to the message being scanned",
                sequence.index
            )));
        }

        if self.received.contains(&sequence.index) {
            debug!("duplicate UR part {}", sequence.index);
            return Ok(false);
        }

        let foundation_ur = ur.to_foundation_ur().map_err_str(RejectReason::Unparsable)?;
        self.decoder.receive(foundation_ur).map_err(|e| {
            warn!("UR decoder rejected part {}: {e}", sequence.index);
            RejectReason::Inconsistent(e.to_string())
        })?;

        self.received.insert(sequence.index);
        self.percentage = self.decoder.estimated_percent_complete();
        self.complete = self.decoder.is_complete();

        Ok(true)
    }

    fn progress(&self) -> ScanProgress {
        ScanProgress {
            received_parts: self.received.len() as u32,
            expected_parts: self.sequence_count,
            percentage: self.percentage,
        }
    }

    fn outcome(&self, new_part: bool) -> Outcome {
        match self.complete {
            true => Outcome::Complete,
            false => Outcome::Incomplete { progress: self.progress(), new_part },
        }
    }
}
