use shared::domain::{ColumnId, TicketId};
use thiserror::Error;

use crate::snapshot::SnapshotError;

/// Everything the board surface can report. Nothing here is fatal to the
/// process; the controller converts each variant into user-visible state.
#[derive(Debug, Error)]
pub enum BoardError {
    /// One of the four parallel board reads failed. The whole board is in
    /// an error state; retry by re-invoking `load_board`.
    #[error("failed to load board: {reason}")]
    Load { reason: String },

    /// The remote store rejected the move. The optimistic mutation has
    /// already been rolled back; no retry is attempted.
    #[error("move rejected: {reason}")]
    MoveRejected { reason: String },

    /// A drag targeted a column the current snapshot does not know about.
    /// Handled exactly like a remote rejection, except no remote call was
    /// ever issued.
    #[error("unknown destination column {column_id}")]
    InvalidColumn { column_id: ColumnId },

    /// The dragged ticket vanished from the local snapshot. Defensive;
    /// should not happen while all mutation goes through the controller.
    #[error("ticket {ticket_id} not present in local snapshot")]
    TicketNotFound { ticket_id: TicketId },
}

impl From<SnapshotError> for BoardError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::UnknownColumn { column_id } => BoardError::InvalidColumn { column_id },
            SnapshotError::TicketNotFound { ticket_id } => BoardError::TicketNotFound { ticket_id },
        }
    }
}

impl BoardError {
    pub(crate) fn load(source: &anyhow::Error) -> Self {
        BoardError::Load {
            reason: format!("{source:#}"),
        }
    }

    pub(crate) fn rejected(source: &anyhow::Error) -> Self {
        BoardError::MoveRejected {
            reason: format!("{source:#}"),
        }
    }
}
