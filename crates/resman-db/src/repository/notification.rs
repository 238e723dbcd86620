//! SurrealDB implementation of [`Notifier`].
//!
//! Notifications are written to the `notification` table, from which an
//! outbound mailer or in-app feed can pick them up.

use chrono::{DateTime, Utc};
use resman_core::error::ResmanResult;
use resman_core::models::notification::{
    CreateNotification, Notification, NotificationKind, Recipient,
};
use resman_core::repository::Notifier;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct NotificationRowWithId {
    record_id: String,
    recipient: String,
    recipient_user: Option<String>,
    kind: String,
    subject: String,
    body: String,
    allocation_request: String,
    created_at: DateTime<Utc>,
}

fn kind_to_string(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Alert => "Alert",
        NotificationKind::Success => "Success",
        NotificationKind::Error => "Error",
    }
}

fn parse_kind(s: &str) -> Result<NotificationKind, DbError> {
    match s {
        "Alert" => Ok(NotificationKind::Alert),
        "Success" => Ok(NotificationKind::Success),
        "Error" => Ok(NotificationKind::Error),
        other => Err(DbError::Migration(format!(
            "unknown notification kind: {other}"
        ))),
    }
}

impl NotificationRowWithId {
    fn try_into_notification(self) -> Result<Notification, DbError> {
        let recipient = match (self.recipient.as_str(), self.recipient_user) {
            ("Approvers", _) => Recipient::Approvers,
            ("User", Some(user)) => Recipient::User(user),
            (other, _) => {
                return Err(DbError::Migration(format!(
                    "unknown notification recipient: {other}"
                )));
            }
        };
        Ok(Notification {
            id: parse_uuid(&self.record_id, "notification")?,
            recipient,
            kind: parse_kind(&self.kind)?,
            subject: self.subject,
            body: self.body,
            allocation_request: parse_uuid(&self.allocation_request, "allocation request")?,
            created_at: self.created_at,
        })
    }
}

/// Notifier that records every notification in SurrealDB.
#[derive(Clone)]
pub struct SurrealNotifier<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNotifier<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Notifications sent about one allocation request, oldest first.
    pub async fn list_for_request(&self, allocation_request: Uuid) -> ResmanResult<Vec<Notification>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM notification \
                 WHERE allocation_request = $allocation_request \
                 ORDER BY created_at ASC",
            )
            .bind(("allocation_request", allocation_request.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRowWithId> = result.take(0).map_err(DbError::from)?;
        let notifications = rows
            .into_iter()
            .map(|r| r.try_into_notification())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(notifications)
    }
}

impl<C: Connection> Notifier for SurrealNotifier<C> {
    async fn notify(&self, input: CreateNotification) -> ResmanResult<Notification> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let (recipient, recipient_user) = match input.recipient {
            Recipient::Approvers => ("Approvers", None),
            Recipient::User(user) => ("User", Some(user)),
        };

        let result = self
            .db
            .query(
                "CREATE type::record('notification', $id) SET \
                 recipient = $recipient, \
                 recipient_user = $recipient_user, \
                 kind = $kind, \
                 subject = $subject, \
                 body = $body, \
                 allocation_request = $allocation_request; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('notification', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("recipient", recipient.to_string()))
            .bind(("recipient_user", recipient_user))
            .bind(("kind", kind_to_string(input.kind).to_string()))
            .bind(("subject", input.subject))
            .bind(("body", input.body))
            .bind(("allocation_request", input.allocation_request.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<NotificationRowWithId> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;
        let notification = row.try_into_notification()?;

        info!(
            notification_id = %notification.id,
            request_id = %notification.allocation_request,
            recipient = recipient,
            "Notification recorded"
        );
        Ok(notification)
    }
}
