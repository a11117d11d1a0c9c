//! Error types for the sync subsystem

use pop_types::{DataError, EnvelopeError, MessageId, PublicKey};
use thiserror::Error;

/// Sync subsystem errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// No LAO with this id is known locally
    #[error("Unknown LAO: {0}")]
    UnknownLao(String),

    /// No roll call with this (current) id in the LAO
    #[error("Unknown roll call: {0}")]
    UnknownRollCall(String),

    /// No election with this id in the LAO
    #[error("Unknown election: {0}")]
    UnknownElection(String),

    /// Signature for a message nobody asked witnesses to sign (yet)
    #[error("Unknown witness message: {0}")]
    UnknownWitnessMessage(MessageId),

    /// The (object, action) pair has no handler
    #[error("Unhandled data type: {object}#{action}")]
    UnhandledDataType { object: String, action: String },

    /// The message references another message that is not known (yet)
    #[error("Message references unknown message {0}")]
    InvalidMessageId(MessageId),

    /// A signature does not verify
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// The payload is well-formed but not applicable to the current state
    #[error("Cannot handle data: {0}")]
    DataHandling(String),

    /// Signer is neither a witness nor the organizer of the LAO
    #[error("{0} is not a witness of the LAO")]
    NotAWitness(PublicKey),

    /// Envelope or payload could not be decoded
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// Outbound side effect failed
    #[error("Transport error: {0}")]
    Transport(String),
}

impl SyncError {
    /// Whether the message may succeed once more messages have arrived.
    ///
    /// Recoverable errors park the message on the deferred queue instead of
    /// dropping it.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidMessageId(_) | Self::UnknownWitnessMessage(_)
        )
    }

    /// Short label used in logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownLao(_) => "unknown_lao",
            Self::UnknownRollCall(_) => "unknown_roll_call",
            Self::UnknownElection(_) => "unknown_election",
            Self::UnknownWitnessMessage(_) => "unknown_witness_message",
            Self::UnhandledDataType { .. } => "unhandled_data_type",
            Self::InvalidMessageId(_) => "invalid_message_id",
            Self::InvalidSignature(_) => "invalid_signature",
            Self::DataHandling(_) => "data_handling",
            Self::NotAWitness(_) => "not_a_witness",
            Self::Malformed(_) => "malformed",
            Self::Transport(_) => "transport",
        }
    }
}

impl From<DataError> for SyncError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::UnhandledDataType { object, action } => {
                Self::UnhandledDataType { object, action }
            }
            other => Self::Malformed(other.to_string()),
        }
    }
}

impl From<EnvelopeError> for SyncError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            // Never recoverable: the id is wrong, not missing
            EnvelopeError::MessageIdMismatch => Self::Malformed(err.to_string()),
            other => Self::InvalidSignature(other.to_string()),
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
