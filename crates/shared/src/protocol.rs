use serde::{Deserialize, Serialize};

use crate::{
    domain::{Column, ColumnId, Member, Priority, Project, ProjectId, Ticket, UserId},
    error::{ApiException, ErrorCode},
};

/// Response envelopes, one per remote read. The store wraps every
/// collection in a named field rather than returning a bare array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEnvelope {
    pub project: Project,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsEnvelope {
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketsEnvelope {
    #[serde(default)]
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembersEnvelope {
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEnvelope {
    pub ticket: Ticket,
}

/// Body of `PUT /tickets/{id}/move`. `order` is the destination index
/// within the target column, passed through as a hint; the store
/// computes the authoritative per-column order itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveTicketRequest {
    #[serde(rename = "columnId")]
    pub column_id: ColumnId,
    pub order: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error body the store attaches to non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Member,
}

/// Create/update body for a ticket. Produced by the (out-of-scope)
/// editing form; this crate only carries and validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "project")]
    pub project_id: ProjectId,
    #[serde(rename = "column")]
    pub column_id: ColumnId,
    #[serde(rename = "assignedTo", default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserId>,
}

impl TicketDraft {
    pub fn empty(project_id: ProjectId, column_id: ColumnId) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Priority::default(),
            tags: Vec::new(),
            project_id,
            column_id,
            assignee: None,
        }
    }

    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            priority: ticket.priority,
            tags: ticket.tags.clone(),
            project_id: ticket.project_id.clone(),
            column_id: ticket.column_id.clone(),
            assignee: ticket.assignee.clone(),
        }
    }

    /// Title is the only required field; everything else has a default.
    pub fn validate(&self) -> Result<(), ApiException> {
        if self.title.trim().is_empty() {
            return Err(ApiException::new(
                ErrorCode::Validation,
                "ticket title is required",
            ));
        }
        Ok(())
    }

    /// Normalized draft: trimmed title and description.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self
    }
}

/// Splits a comma-separated tag field into trimmed, non-empty tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TicketId;

    #[test]
    fn parse_tags_trims_and_drops_empties() {
        assert_eq!(
            parse_tags(" bug, urgent , ,frontend,"),
            vec!["bug", "urgent", "frontend"]
        );
        assert!(parse_tags("   ").is_empty());
    }

    #[test]
    fn draft_requires_non_blank_title() {
        let mut draft = TicketDraft::empty(ProjectId::from("p1"), ColumnId::from("c1"));
        draft.title = "   ".to_string();
        let err = draft.validate().expect_err("blank title must fail");
        assert!(matches!(err.code, ErrorCode::Validation));

        draft.title = "Fix login".to_string();
        draft.validate().expect("valid draft");
    }

    #[test]
    fn move_request_serializes_store_field_names() {
        let body = MoveTicketRequest {
            column_id: ColumnId::from("c2"),
            order: 3,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["columnId"], "c2");
        assert_eq!(json["order"], 3);
    }

    #[test]
    fn ticket_decodes_store_document_shape() {
        let ticket: Ticket = serde_json::from_value(serde_json::json!({
            "_id": "t1",
            "project": "p1",
            "column": "c1",
            "title": "Fix login",
            "priority": "high",
            "tags": ["bug"],
            "assignedTo": "u9"
        }))
        .expect("decode");
        assert_eq!(ticket.id, TicketId::from("t1"));
        assert_eq!(ticket.column_id, ColumnId::from("c1"));
        assert_eq!(ticket.priority, Priority::High);
        assert_eq!(ticket.assignee, Some(UserId::from("u9")));
        assert!(ticket.created_at.is_none());
    }

    #[test]
    fn priority_parses_case_insensitively_and_defaults_to_medium() {
        assert_eq!("HIGH".parse::<Priority>().expect("parse"), Priority::High);
        assert_eq!(" low ".parse::<Priority>().expect("parse"), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::default(), Priority::Medium);
    }
}
