//! SurrealDB implementation of [`ChangeNoteRepository`].

use chrono::{DateTime, Utc};
use resman_core::error::ResmanResult;
use resman_core::models::change_note::{ChangeKind, ChangeNote, CreateChangeNote};
use resman_core::repository::ChangeNoteRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ChangeNoteRowWithId {
    record_id: String,
    assignment_id: String,
    kind: String,
    author: String,
    content: String,
    reason: String,
    created_at: DateTime<Utc>,
}

fn parse_kind(s: &str) -> Result<ChangeKind, DbError> {
    match s {
        "EndDate" => Ok(ChangeKind::EndDate),
        "AllocationPercentage" => Ok(ChangeKind::AllocationPercentage),
        other => Err(DbError::Migration(format!("unknown change kind: {other}"))),
    }
}

pub(crate) fn kind_to_string(kind: &ChangeKind) -> &'static str {
    match kind {
        ChangeKind::EndDate => "EndDate",
        ChangeKind::AllocationPercentage => "AllocationPercentage",
    }
}

impl ChangeNoteRowWithId {
    fn try_into_note(self) -> Result<ChangeNote, DbError> {
        Ok(ChangeNote {
            id: parse_uuid(&self.record_id, "change note")?,
            assignment_id: parse_uuid(&self.assignment_id, "assignment")?,
            kind: parse_kind(&self.kind)?,
            author: self.author,
            content: self.content,
            reason: self.reason,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Change Note repository.
///
/// Notes are append-only; the table rejects updates and deletes.
#[derive(Clone)]
pub struct SurrealChangeNoteRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealChangeNoteRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ChangeNoteRepository for SurrealChangeNoteRepository<C> {
    async fn create(&self, input: CreateChangeNote) -> ResmanResult<ChangeNote> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('change_note', $id) SET \
                 assignment_id = $assignment_id, \
                 kind = $kind, \
                 author = $author, \
                 content = $content, \
                 reason = $reason; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('change_note', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("assignment_id", input.assignment_id.to_string()))
            .bind(("kind", kind_to_string(&input.kind).to_string()))
            .bind(("author", input.author))
            .bind(("content", input.content))
            .bind(("reason", input.reason))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<ChangeNoteRowWithId> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "change_note".into(),
            id: id_str,
        })?;

        Ok(row.try_into_note()?)
    }

    async fn list_for_assignments(&self, assignment_ids: &[Uuid]) -> ResmanResult<Vec<ChangeNote>> {
        if assignment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = assignment_ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM change_note \
                 WHERE assignment_id IN $assignment_ids \
                 ORDER BY created_at ASC",
            )
            .bind(("assignment_ids", ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ChangeNoteRowWithId> = result.take(0).map_err(DbError::from)?;
        let notes = rows
            .into_iter()
            .map(|r| r.try_into_note())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(notes)
    }
}
