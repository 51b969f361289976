//! Board synchronization engine for TaskFlow project boards.
//!
//! One `BoardController` owns the in-memory snapshot of a single project
//! view: it loads the board with four concurrent reads, routes drag-end
//! events through the move reconciler (optimistic apply, one remote
//! write, re-fetch commit or verbatim rollback), and re-loads wholesale
//! when the ticket editor saves. The remote store is only reachable
//! through the [`RemoteBoardStore`] trait; [`rest::RestBoardStore`] is
//! the HTTP implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{
    domain::{Column, ColumnId, Member, Project, ProjectId, Ticket, TicketId, UserId},
    protocol::TicketDraft,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod error;
pub mod reconciler;
pub mod rest;
pub mod snapshot;

pub use error::BoardError;
pub use reconciler::{DragLocation, DragResult, MoveOutcome};
pub use rest::{RestBoardStore, SessionContext};
pub use snapshot::{BoardSnapshot, SnapshotError};

use reconciler::MoveReconciler;

/// The remote store this engine synchronizes against. Opaque by design:
/// the engine never assumes anything about server-side ordering beyond
/// what a full re-fetch returns.
#[async_trait]
pub trait RemoteBoardStore: Send + Sync {
    async fn fetch_project(&self, project_id: &ProjectId) -> Result<Project>;
    async fn fetch_columns(&self, project_id: &ProjectId) -> Result<Vec<Column>>;
    async fn fetch_tickets(&self, project_id: &ProjectId) -> Result<Vec<Ticket>>;
    async fn fetch_members(&self, project_id: &ProjectId) -> Result<Vec<Member>>;
    /// `index` is the destination position hint; the store computes the
    /// authoritative per-column order.
    async fn move_ticket(
        &self,
        ticket_id: &TicketId,
        destination_column_id: &ColumnId,
        index: usize,
    ) -> Result<()>;
    async fn create_ticket(&self, draft: &TicketDraft) -> Result<Ticket>;
    async fn update_ticket(&self, ticket_id: &TicketId, draft: &TicketDraft) -> Result<Ticket>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardPhase {
    Uninitialized,
    Loading,
    Ready,
    Reconciling,
    Failed,
}

#[derive(Debug, Clone)]
pub enum BoardEvent {
    Loaded { project_id: ProjectId },
    MoveCommitted { ticket_id: TicketId },
    MoveRolledBack { reason: String },
    TicketSaved { ticket_id: TicketId },
    Error(String),
}

/// Prefilled draft handed to the (out-of-scope) ticket form.
#[derive(Debug, Clone)]
pub struct TicketEditor {
    pub existing: Option<TicketId>,
    pub draft: TicketDraft,
}

pub(crate) struct BoardViewState {
    pub(crate) project_id: Option<ProjectId>,
    pub(crate) project: Option<Project>,
    pub(crate) members: Vec<Member>,
    pub(crate) snapshot: BoardSnapshot,
    pub(crate) phase: BoardPhase,
}

impl BoardViewState {
    fn new() -> Self {
        Self {
            project_id: None,
            project: None,
            members: Vec::new(),
            snapshot: BoardSnapshot::default(),
            phase: BoardPhase::Uninitialized,
        }
    }
}

pub(crate) struct BoardData {
    pub(crate) project: Project,
    pub(crate) columns: Vec<Column>,
    pub(crate) tickets: Vec<Ticket>,
    pub(crate) members: Vec<Member>,
}

/// Four independent reads, issued concurrently; any failure discards the
/// other results so the board never populates partially.
pub(crate) async fn fetch_board(
    store: &dyn RemoteBoardStore,
    project_id: &ProjectId,
) -> Result<BoardData> {
    let (project, columns, tickets, members) = tokio::try_join!(
        store.fetch_project(project_id),
        store.fetch_columns(project_id),
        store.fetch_tickets(project_id),
        store.fetch_members(project_id),
    )
    .with_context(|| format!("fetching board data for project {project_id}"))?;
    Ok(BoardData {
        project,
        columns,
        tickets,
        members,
    })
}

/// Owns the snapshot store for one mounted project view. All snapshot
/// mutation is serialized through the inner mutex, which doubles as the
/// reconciliation queue on the multi-threaded runtime.
pub struct BoardController {
    store: Arc<dyn RemoteBoardStore>,
    reconciler: MoveReconciler,
    inner: Mutex<BoardViewState>,
    events: broadcast::Sender<BoardEvent>,
}

impl BoardController {
    pub fn new(store: Arc<dyn RemoteBoardStore>) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            reconciler: MoveReconciler::new(Arc::clone(&store)),
            store,
            inner: Mutex::new(BoardViewState::new()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Loads (or refreshes) the board. Idempotent; always replaces the
    /// snapshot wholesale. Any of the four reads failing leaves the view
    /// in `Failed`, recoverable only by calling this again.
    pub async fn load_board(&self, project_id: &ProjectId) -> Result<(), BoardError> {
        let mut state = self.inner.lock().await;
        state.phase = BoardPhase::Loading;

        match fetch_board(self.store.as_ref(), project_id).await {
            Ok(data) => {
                if !data.project.owner_is_member() {
                    warn!(
                        project_id = %project_id,
                        owner = %data.project.owner,
                        "project owner missing from member set"
                    );
                }
                state.project_id = Some(project_id.clone());
                state.project = Some(data.project);
                state.members = data.members;
                state.snapshot.replace_all(data.columns, data.tickets);
                state.phase = BoardPhase::Ready;
                info!(
                    project_id = %project_id,
                    columns = state.snapshot.columns().len(),
                    tickets = state.snapshot.tickets().len(),
                    "board loaded"
                );
                let _ = self.events.send(BoardEvent::Loaded {
                    project_id: project_id.clone(),
                });
                Ok(())
            }
            Err(err) => {
                state.phase = BoardPhase::Failed;
                let board_err = BoardError::load(&err);
                warn!(project_id = %project_id, error = %board_err, "board load failed");
                let _ = self.events.send(BoardEvent::Error(board_err.to_string()));
                Err(board_err)
            }
        }
    }

    /// Entry point for drag-end gestures. Reconciliations are serialized:
    /// the view-state lock is held for the whole apply/write/re-fetch
    /// cycle, so a second drag applies atop fully resolved state.
    pub async fn on_drag_end(&self, drag: DragResult) -> Result<MoveOutcome, BoardError> {
        let mut state = self.inner.lock().await;
        if state.phase != BoardPhase::Ready {
            warn!(phase = ?state.phase, ticket_id = %drag.ticket_id, "drag ignored outside ready board");
            return Ok(MoveOutcome::Ignored);
        }

        state.phase = BoardPhase::Reconciling;
        let result = self.reconciler.reconcile_move(&mut state, drag).await;
        // Reconciling never strands the view: success or rollback, the
        // board returns to Ready.
        state.phase = BoardPhase::Ready;

        match &result {
            Ok(MoveOutcome::Committed { ticket_id }) => {
                let _ = self.events.send(BoardEvent::MoveCommitted {
                    ticket_id: ticket_id.clone(),
                });
            }
            Ok(MoveOutcome::Ignored) => {}
            Err(err @ BoardError::Load { .. }) => {
                // The move landed but the re-fetch did not; the optimistic
                // snapshot is kept and the caller should offer a refresh.
                let _ = self.events.send(BoardEvent::Error(err.to_string()));
            }
            Err(err) => {
                let _ = self.events.send(BoardEvent::MoveRolledBack {
                    reason: err.to_string(),
                });
            }
        }
        result
    }

    /// Draft for the ticket form: prefilled from an existing ticket, or
    /// empty for the given column. `None` until a board is loaded.
    pub async fn open_ticket_editor(
        &self,
        ticket: Option<&Ticket>,
        column_id: &ColumnId,
    ) -> Option<TicketEditor> {
        let state = self.inner.lock().await;
        let project_id = state.project_id.clone()?;
        Some(match ticket {
            Some(ticket) => TicketEditor {
                existing: Some(ticket.id.clone()),
                draft: TicketDraft::from_ticket(ticket),
            },
            None => TicketEditor {
                existing: None,
                draft: TicketDraft::empty(project_id, column_id.clone()),
            },
        })
    }

    /// Creates or updates the ticket, then treats the save as an external
    /// event that invalidates the snapshot: no incremental merge, just a
    /// full reload.
    pub async fn save_ticket(&self, editor: &TicketEditor) -> Result<Ticket> {
        let draft = editor.draft.clone().normalized();
        draft.validate()?;

        let saved = match &editor.existing {
            Some(ticket_id) => self
                .store
                .update_ticket(ticket_id, &draft)
                .await
                .with_context(|| format!("updating ticket {ticket_id}"))?,
            None => self
                .store
                .create_ticket(&draft)
                .await
                .context("creating ticket")?,
        };
        let _ = self.events.send(BoardEvent::TicketSaved {
            ticket_id: saved.id.clone(),
        });

        self.on_ticket_saved().await?;
        Ok(saved)
    }

    /// Re-fetches the whole board after an external ticket change.
    pub async fn on_ticket_saved(&self) -> Result<()> {
        let project_id = {
            let state = self.inner.lock().await;
            state.project_id.clone()
        };
        let Some(project_id) = project_id else {
            warn!("ticket saved before any board was loaded; nothing to refresh");
            return Ok(());
        };
        self.load_board(&project_id).await?;
        Ok(())
    }

    pub async fn phase(&self) -> BoardPhase {
        self.inner.lock().await.phase
    }

    pub async fn project(&self) -> Option<Project> {
        self.inner.lock().await.project.clone()
    }

    pub async fn members(&self) -> Vec<Member> {
        self.inner.lock().await.members.clone()
    }

    pub async fn columns(&self) -> Vec<Column> {
        self.inner.lock().await.snapshot.columns().to_vec()
    }

    pub async fn tickets_in_column(&self, column_id: &ColumnId) -> Vec<Ticket> {
        self.inner
            .lock()
            .await
            .snapshot
            .tickets_in_column(column_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn ticket(&self, ticket_id: &TicketId) -> Option<Ticket> {
        self.inner.lock().await.snapshot.ticket(ticket_id).cloned()
    }

    /// Display name for an assignee, `"Unassigned"` when absent or when
    /// the user is not in the member list.
    pub async fn member_display_name(&self, user_id: Option<&UserId>) -> String {
        let state = self.inner.lock().await;
        user_id
            .and_then(|id| {
                state
                    .members
                    .iter()
                    .find(|member| &member.user_id == id)
                    .map(|member| member.username.clone())
            })
            .unwrap_or_else(|| "Unassigned".to_string())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
