//! In-memory board state for one project view.
//!
//! The snapshot is pure data: columns and tickets as the remote store last
//! served them, plus the invariant-preserving mutations the reconciler
//! needs. Local array order is not an authoritative rank; only a re-fetch
//! is trusted for final ordering.

use shared::domain::{Column, ColumnId, Ticket, TicketId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("ticket {ticket_id} not found in snapshot")]
    TicketNotFound { ticket_id: TicketId },
    #[error("column {column_id} not part of the current board")]
    UnknownColumn { column_id: ColumnId },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    columns: Vec<Column>,
    tickets: Vec<Ticket>,
}

impl BoardSnapshot {
    pub fn new(columns: Vec<Column>, tickets: Vec<Ticket>) -> Self {
        Self { columns, tickets }
    }

    /// Columns in the order the remote store served them; that order is
    /// the left-to-right rendering order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// Tickets of one column, preserving snapshot insertion order.
    pub fn tickets_in_column(&self, column_id: &ColumnId) -> Vec<&Ticket> {
        self.tickets
            .iter()
            .filter(|ticket| &ticket.column_id == column_id)
            .collect()
    }

    pub fn ticket(&self, ticket_id: &TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|ticket| &ticket.id == ticket_id)
    }

    pub fn contains_column(&self, column_id: &ColumnId) -> bool {
        self.columns.iter().any(|column| &column.id == column_id)
    }

    /// Decomposes the snapshot, used to feed a saved snapshot back
    /// through [`BoardSnapshot::replace_all`] on rollback.
    pub fn into_parts(self) -> (Vec<Column>, Vec<Ticket>) {
        (self.columns, self.tickets)
    }

    /// Atomic whole-snapshot replacement after a successful re-fetch.
    /// Consumers never observe a half-updated snapshot.
    pub fn replace_all(&mut self, columns: Vec<Column>, tickets: Vec<Ticket>) {
        self.columns = columns;
        self.tickets = tickets;
    }

    /// Rewrites the ticket's column in place and returns the prior
    /// snapshot for rollback. Fails without touching any state when the
    /// ticket is unknown or the destination column is not on this board.
    pub fn move_ticket_locally(
        &mut self,
        ticket_id: &TicketId,
        new_column_id: &ColumnId,
    ) -> Result<BoardSnapshot, SnapshotError> {
        if !self.contains_column(new_column_id) {
            return Err(SnapshotError::UnknownColumn {
                column_id: new_column_id.clone(),
            });
        }
        let previous = self.clone();
        let ticket = self
            .tickets
            .iter_mut()
            .find(|ticket| &ticket.id == ticket_id)
            .ok_or_else(|| SnapshotError::TicketNotFound {
                ticket_id: ticket_id.clone(),
            })?;
        ticket.column_id = new_column_id.clone();
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::ProjectId;

    fn column(id: &str) -> Column {
        Column {
            id: ColumnId::from(id),
            project_id: ProjectId::from("p1"),
            name: id.to_string(),
            order: 0,
        }
    }

    fn ticket(id: &str, column_id: &str) -> Ticket {
        Ticket {
            id: TicketId::from(id),
            project_id: ProjectId::from("p1"),
            column_id: ColumnId::from(column_id),
            title: format!("ticket {id}"),
            description: String::new(),
            priority: Default::default(),
            tags: Vec::new(),
            assignee: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn tickets_in_column_preserves_insertion_order() {
        let snapshot = BoardSnapshot::new(
            vec![column("c1"), column("c2")],
            vec![ticket("t1", "c1"), ticket("t2", "c2"), ticket("t3", "c1")],
        );
        let ids: Vec<_> = snapshot
            .tickets_in_column(&ColumnId::from("c1"))
            .into_iter()
            .map(|t| t.id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["t1", "t3"]);
        assert!(snapshot.tickets_in_column(&ColumnId::from("c3")).is_empty());
    }

    #[test]
    fn move_ticket_locally_returns_previous_snapshot() {
        let mut snapshot = BoardSnapshot::new(
            vec![column("c1"), column("c2")],
            vec![ticket("t1", "c1")],
        );
        let previous = snapshot
            .move_ticket_locally(&TicketId::from("t1"), &ColumnId::from("c2"))
            .expect("move");

        assert_eq!(
            snapshot.ticket(&TicketId::from("t1")).expect("t1").column_id,
            ColumnId::from("c2")
        );
        assert_eq!(
            previous.ticket(&TicketId::from("t1")).expect("t1").column_id,
            ColumnId::from("c1")
        );
    }

    #[test]
    fn move_to_unknown_column_fails_and_leaves_snapshot_untouched() {
        let mut snapshot =
            BoardSnapshot::new(vec![column("c1")], vec![ticket("t1", "c1")]);
        let before = snapshot.clone();

        let err = snapshot
            .move_ticket_locally(&TicketId::from("t1"), &ColumnId::from("ghost"))
            .expect_err("unknown column must fail");
        assert_eq!(
            err,
            SnapshotError::UnknownColumn {
                column_id: ColumnId::from("ghost")
            }
        );
        assert_eq!(snapshot, before);
    }

    #[test]
    fn move_of_missing_ticket_fails_and_leaves_snapshot_untouched() {
        let mut snapshot =
            BoardSnapshot::new(vec![column("c1"), column("c2")], vec![ticket("t1", "c1")]);
        let before = snapshot.clone();

        let err = snapshot
            .move_ticket_locally(&TicketId::from("ghost"), &ColumnId::from("c2"))
            .expect_err("missing ticket must fail");
        assert_eq!(
            err,
            SnapshotError::TicketNotFound {
                ticket_id: TicketId::from("ghost")
            }
        );
        assert_eq!(snapshot, before);
    }

    #[test]
    fn replace_all_swaps_state_wholesale() {
        let mut snapshot =
            BoardSnapshot::new(vec![column("c1")], vec![ticket("t1", "c1")]);
        snapshot.replace_all(vec![column("c2")], vec![ticket("t2", "c2")]);
        assert!(snapshot.ticket(&TicketId::from("t1")).is_none());
        assert!(snapshot.contains_column(&ColumnId::from("c2")));
        assert!(!snapshot.contains_column(&ColumnId::from("c1")));
    }
}
