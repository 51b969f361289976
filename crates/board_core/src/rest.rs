//! HTTP implementation of [`RemoteBoardStore`] against the TaskFlow API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Column, ColumnId, Member, Project, ProjectId, Ticket, TicketId},
    error::{ApiException, ErrorCode},
    protocol::{
        Acknowledgement, ColumnsEnvelope, ErrorBody, LoginRequest, LoginResponse, MembersEnvelope,
        MoveTicketRequest, ProjectEnvelope, TicketDraft, TicketEnvelope, TicketsEnvelope,
    },
};
use tracing::debug;

use crate::RemoteBoardStore;

/// Authenticated session against one API host. Passed explicitly to
/// whoever needs it; there is no ambient global session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub base_url: String,
    pub token: String,
    pub user: Member,
}

#[derive(Debug)]
pub struct RestBoardStore {
    http: Client,
    session: SessionContext,
}

impl RestBoardStore {
    pub fn new(session: SessionContext) -> Self {
        Self {
            http: Client::new(),
            session,
        }
    }

    /// Exchanges credentials for a bearer token and returns a store bound
    /// to that session.
    pub async fn sign_in(base_url: &str, email: &str, password: &str) -> Result<Self> {
        let http = Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();
        let response = http
            .post(format!("{base_url}/auth/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .context("login request failed")?;
        let response = expect_success(response, "login").await?;
        let body: LoginResponse = response.json().await.context("invalid login response")?;
        debug!(user_id = %body.user.user_id, "signed in");
        Ok(Self {
            http,
            session: SessionContext {
                base_url,
                token: body.token,
                user: body.user,
            },
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.session.base_url.trim_end_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.session.token)
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;
        let response = expect_success(response, what).await?;
        response
            .json()
            .await
            .with_context(|| format!("invalid {what} response body"))
    }
}

/// Maps non-2xx responses to typed API errors, preferring the store's
/// `{"message": …}` envelope over a bare status line.
async fn expect_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: ErrorBody = response.json().await.unwrap_or_default();
    let message = body
        .message
        .unwrap_or_else(|| format!("{what} failed with status {status}"));
    Err(ApiException::new(ErrorCode::from_status(status.as_u16()), message).into())
}

#[async_trait]
impl RemoteBoardStore for RestBoardStore {
    async fn fetch_project(&self, project_id: &ProjectId) -> Result<Project> {
        let envelope: ProjectEnvelope = self
            .get_json(&format!("/projects/{project_id}"), "fetch project")
            .await?;
        Ok(envelope.project)
    }

    async fn fetch_columns(&self, project_id: &ProjectId) -> Result<Vec<Column>> {
        let envelope: ColumnsEnvelope = self
            .get_json(&format!("/columns/project/{project_id}"), "fetch columns")
            .await?;
        Ok(envelope.columns)
    }

    async fn fetch_tickets(&self, project_id: &ProjectId) -> Result<Vec<Ticket>> {
        let envelope: TicketsEnvelope = self
            .get_json(&format!("/tickets/project/{project_id}"), "fetch tickets")
            .await?;
        Ok(envelope.tickets)
    }

    async fn fetch_members(&self, project_id: &ProjectId) -> Result<Vec<Member>> {
        let envelope: MembersEnvelope = self
            .get_json(
                &format!("/invitations/project/{project_id}/members"),
                "fetch members",
            )
            .await?;
        Ok(envelope.members)
    }

    async fn move_ticket(
        &self,
        ticket_id: &TicketId,
        destination_column_id: &ColumnId,
        index: usize,
    ) -> Result<()> {
        let response = self
            .http
            .put(self.url(&format!("/tickets/{ticket_id}/move")))
            .bearer_auth(&self.session.token)
            .json(&MoveTicketRequest {
                column_id: destination_column_id.clone(),
                order: index,
            })
            .send()
            .await
            .context("move ticket request failed")?;
        let response = expect_success(response, "move ticket").await?;
        let ack: Acknowledgement = response
            .json()
            .await
            .context("invalid move ticket response body")?;
        if !ack.success {
            let message = ack
                .message
                .unwrap_or_else(|| "store did not acknowledge the move".to_string());
            return Err(ApiException::new(ErrorCode::Validation, message).into());
        }
        Ok(())
    }

    async fn create_ticket(&self, draft: &TicketDraft) -> Result<Ticket> {
        let response = self
            .http
            .post(self.url("/tickets"))
            .bearer_auth(&self.session.token)
            .json(draft)
            .send()
            .await
            .context("create ticket request failed")?;
        let response = expect_success(response, "create ticket").await?;
        let envelope: TicketEnvelope = response
            .json()
            .await
            .context("invalid create ticket response body")?;
        Ok(envelope.ticket)
    }

    async fn update_ticket(&self, ticket_id: &TicketId, draft: &TicketDraft) -> Result<Ticket> {
        let response = self
            .http
            .put(self.url(&format!("/tickets/{ticket_id}")))
            .bearer_auth(&self.session.token)
            .json(draft)
            .send()
            .await
            .context("update ticket request failed")?;
        let response = expect_success(response, "update ticket").await?;
        let envelope: TicketEnvelope = response
            .json()
            .await
            .context("invalid update ticket response body")?;
        Ok(envelope.ticket)
    }
}

#[cfg(test)]
#[path = "tests/rest_tests.rs"]
mod tests;
