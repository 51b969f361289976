//! Translates one drag gesture into a consistent remote+local change.
//!
//! The reconciliation contract, in order: precondition no-ops, optimistic
//! local mutation, exactly one remote write, then either a full re-fetch
//! (commit) or a verbatim restore of the pre-drag snapshot (rollback).

use std::sync::Arc;

use shared::domain::{ColumnId, TicketId};
use tracing::{debug, info, warn};

use crate::{
    error::BoardError, fetch_board, BoardViewState, RemoteBoardStore,
};

/// Where a drag started or ended: a column and a position within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragLocation {
    pub column_id: ColumnId,
    pub index: usize,
}

/// Ephemeral description of one finished drag gesture. `destination` is
/// `None` when the ticket was dropped outside any column.
#[derive(Debug, Clone)]
pub struct DragResult {
    pub ticket_id: TicketId,
    pub source: DragLocation,
    pub destination: Option<DragLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Remote store accepted the move and the snapshot was replaced by a
    /// fresh fetch.
    Committed { ticket_id: TicketId },
    /// Nothing to do: cancelled drag, same-position drop, or a drag
    /// outside a ready board. No state changed, no remote call was made.
    Ignored,
}

pub struct MoveReconciler {
    store: Arc<dyn RemoteBoardStore>,
}

impl MoveReconciler {
    pub fn new(store: Arc<dyn RemoteBoardStore>) -> Self {
        Self { store }
    }

    /// Runs the full reconciliation under the caller's state lock, so
    /// overlapping drags are serialized and each one observes resolved
    /// state. Exactly one remote write per reconciled drag; exactly one
    /// re-fetch on success; nothing further on failure.
    pub(crate) async fn reconcile_move(
        &self,
        state: &mut BoardViewState,
        drag: DragResult,
    ) -> Result<MoveOutcome, BoardError> {
        let Some(destination) = drag.destination else {
            debug!(ticket_id = %drag.ticket_id, "drag dropped outside any column; ignoring");
            return Ok(MoveOutcome::Ignored);
        };
        if destination == drag.source {
            debug!(ticket_id = %drag.ticket_id, "drag ended at its source position; ignoring");
            return Ok(MoveOutcome::Ignored);
        }

        let Some(project_id) = state.project_id.clone() else {
            // Unreachable through the controller, which gates on Ready.
            return Err(BoardError::MoveRejected {
                reason: "no board loaded".to_string(),
            });
        };

        // Optimistic apply strictly before any I/O. The UI shows the new
        // column assignment while the remote write is in flight. A local
        // failure (unknown column, vanished ticket) leaves the snapshot
        // untouched and skips the remote call entirely.
        let previous = state
            .snapshot
            .move_ticket_locally(&drag.ticket_id, &destination.column_id)?;
        info!(
            ticket_id = %drag.ticket_id,
            from = %drag.source.column_id,
            to = %destination.column_id,
            index = destination.index,
            "optimistic move applied"
        );

        match self
            .store
            .move_ticket(&drag.ticket_id, &destination.column_id, destination.index)
            .await
        {
            Ok(()) => {
                // The optimistic mutation only captured the column change;
                // only a full re-fetch reflects the authoritative
                // per-column order the store computed.
                match fetch_board(self.store.as_ref(), &project_id).await {
                    Ok(data) => {
                        state.project = Some(data.project);
                        state.members = data.members;
                        state.snapshot.replace_all(data.columns, data.tickets);
                        info!(ticket_id = %drag.ticket_id, "move committed and snapshot resynchronized");
                        Ok(MoveOutcome::Committed {
                            ticket_id: drag.ticket_id,
                        })
                    }
                    Err(err) => {
                        // The move landed remotely; keep the optimistic
                        // snapshot rather than roll back past a committed
                        // write. A manual refresh recovers full fidelity.
                        warn!(
                            ticket_id = %drag.ticket_id,
                            error = %format!("{err:#}"),
                            "post-move re-fetch failed; keeping optimistic snapshot"
                        );
                        Err(BoardError::load(&err))
                    }
                }
            }
            Err(err) => {
                let (columns, tickets) = previous.into_parts();
                state.snapshot.replace_all(columns, tickets);
                warn!(
                    ticket_id = %drag.ticket_id,
                    error = %format!("{err:#}"),
                    "remote move rejected; snapshot rolled back"
                );
                Err(BoardError::rejected(&err))
            }
        }
    }
}
