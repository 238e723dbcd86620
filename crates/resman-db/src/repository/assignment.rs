//! SurrealDB implementation of [`AssignmentRepository`].

use chrono::{DateTime, Utc};
use resman_core::error::{ResmanError, ResmanResult};
use resman_core::models::assignment::{
    ActiveAllocation, AssignmentFilter, AssignmentStatus, CreateProjectAssignment, EndDateChange,
    PeriodSplit, ProjectAssignment,
};
use resman_core::repository::AssignmentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::change_note::kind_to_string;
use super::{parse_date, parse_optional_uuid, parse_percentage, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AssignmentRowWithId {
    record_id: String,
    project: String,
    employee: String,
    start_date: String,
    end_date: String,
    allocation_percentage: i64,
    status: String,
    allocation_reference: Option<String>,
    estimated_total_cost: f64,
    supersedes: Option<String>,
    superseded_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ActiveRow {
    record_id: String,
    allocation_percentage: i64,
}

fn parse_status(s: &str) -> Result<AssignmentStatus, DbError> {
    match s {
        "Planned" => Ok(AssignmentStatus::Planned),
        "Active" => Ok(AssignmentStatus::Active),
        "Completed" => Ok(AssignmentStatus::Completed),
        other => Err(DbError::Migration(format!(
            "unknown assignment status: {other}"
        ))),
    }
}

impl AssignmentRowWithId {
    fn try_into_assignment(self) -> Result<ProjectAssignment, DbError> {
        Ok(ProjectAssignment {
            id: parse_uuid(&self.record_id, "assignment")?,
            project: self.project,
            employee: self.employee,
            start_date: parse_date(&self.start_date)?,
            end_date: parse_date(&self.end_date)?,
            allocation_percentage: parse_percentage(self.allocation_percentage)?,
            status: parse_status(&self.status)?,
            allocation_reference: parse_optional_uuid(
                self.allocation_reference,
                "allocation reference",
            )?,
            estimated_total_cost: self.estimated_total_cost,
            supersedes: parse_optional_uuid(self.supersedes, "supersedes")?,
            superseded_by: parse_optional_uuid(self.superseded_by, "superseded_by")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_BY_ID: &str = "SELECT meta::id(id) AS record_id, * \
                            FROM type::record('project_assignment', $id)";

/// SurrealDB implementation of the Project Assignment repository.
///
/// Multi-record writes (end date change plus note, period split) run in a
/// single transaction.
#[derive(Clone)]
pub struct SurrealAssignmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAssignmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<ProjectAssignment, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(SELECT_BY_ID)
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<AssignmentRowWithId> = result.take(0)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "project_assignment".into(),
            id: id_str,
        })?;

        row.try_into_assignment()
    }
}

impl<C: Connection> AssignmentRepository for SurrealAssignmentRepository<C> {
    async fn create(&self, input: CreateProjectAssignment) -> ResmanResult<ProjectAssignment> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('project_assignment', $id) SET \
                 project = $project, \
                 employee = $employee, \
                 start_date = $start_date, \
                 end_date = $end_date, \
                 allocation_percentage = $allocation_percentage, \
                 status = $status, \
                 allocation_reference = $allocation_reference, \
                 estimated_total_cost = $estimated_total_cost, \
                 supersedes = $supersedes, \
                 superseded_by = NONE",
            )
            .bind(("id", id.to_string()))
            .bind(("project", input.project))
            .bind(("employee", input.employee))
            .bind(("start_date", input.start_date.to_string()))
            .bind(("end_date", input.end_date.to_string()))
            .bind((
                "allocation_percentage",
                i64::from(input.allocation_percentage),
            ))
            .bind(("status", input.status.as_str().to_string()))
            .bind((
                "allocation_reference",
                input.allocation_reference.map(|r| r.to_string()),
            ))
            .bind(("estimated_total_cost", input.estimated_total_cost))
            .bind(("supersedes", input.supersedes.map(|s| s.to_string())))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(self.fetch(id).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> ResmanResult<ProjectAssignment> {
        Ok(self.fetch(id).await?)
    }

    async fn get_by_allocation_reference(
        &self,
        allocation_id: Uuid,
    ) -> ResmanResult<Option<ProjectAssignment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM project_assignment \
                 WHERE allocation_reference = $allocation_reference \
                 ORDER BY start_date ASC LIMIT 1",
            )
            .bind(("allocation_reference", allocation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AssignmentRowWithId> = result.take(0).map_err(DbError::from)?;
        let assignment = rows
            .into_iter()
            .next()
            .map(|r| r.try_into_assignment())
            .transpose()?;

        Ok(assignment)
    }

    async fn change_end_date(
        &self,
        id: Uuid,
        change: EndDateChange,
    ) -> ResmanResult<ProjectAssignment> {
        // Fail before writing the note if the period is gone.
        self.fetch(id).await?;

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE type::record('project_assignment', $id) SET \
                 end_date = $end_date, \
                 status = $status, \
                 updated_at = time::now(); \
                 CREATE type::record('change_note', $note_id) SET \
                 assignment_id = $id, \
                 kind = $kind, \
                 author = $author, \
                 content = $content, \
                 reason = $reason; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("end_date", change.new_end_date.to_string()))
            .bind(("status", change.status.as_str().to_string()))
            .bind(("note_id", Uuid::new_v4().to_string()))
            .bind(("kind", kind_to_string(&change.note.kind).to_string()))
            .bind(("author", change.note.author))
            .bind(("content", change.note.content))
            .bind(("reason", change.note.reason))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        debug!(assignment_id = %id, end_date = %change.new_end_date, "End date updated");
        Ok(self.fetch(id).await?)
    }

    async fn supersede(
        &self,
        id: Uuid,
        split: PeriodSplit,
    ) -> ResmanResult<(ProjectAssignment, ProjectAssignment)> {
        let existing = self.fetch(id).await?;
        if existing.superseded_by.is_some() {
            return Err(ResmanError::validation(format!(
                "assignment {id} is already superseded"
            )));
        }

        let successor_id = Uuid::new_v4();
        let successor = split.successor;

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE type::record('project_assignment', $id) SET \
                 end_date = $closed_end_date, \
                 status = $closed_status, \
                 estimated_total_cost = $closed_cost, \
                 superseded_by = $successor_id, \
                 updated_at = time::now(); \
                 CREATE type::record('project_assignment', $successor_id) SET \
                 project = $project, \
                 employee = $employee, \
                 start_date = $start_date, \
                 end_date = $end_date, \
                 allocation_percentage = $allocation_percentage, \
                 status = $status, \
                 allocation_reference = $allocation_reference, \
                 estimated_total_cost = $estimated_total_cost, \
                 supersedes = $id, \
                 superseded_by = NONE; \
                 CREATE type::record('change_note', $note_id) SET \
                 assignment_id = $id, \
                 kind = $kind, \
                 author = $author, \
                 content = $content, \
                 reason = $reason; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("closed_end_date", split.closed_end_date.to_string()))
            .bind(("closed_status", split.closed_status.as_str().to_string()))
            .bind(("closed_cost", split.closed_estimated_cost))
            .bind(("successor_id", successor_id.to_string()))
            .bind(("project", successor.project))
            .bind(("employee", successor.employee))
            .bind(("start_date", successor.start_date.to_string()))
            .bind(("end_date", successor.end_date.to_string()))
            .bind((
                "allocation_percentage",
                i64::from(successor.allocation_percentage),
            ))
            .bind(("status", successor.status.as_str().to_string()))
            .bind((
                "allocation_reference",
                successor.allocation_reference.map(|r| r.to_string()),
            ))
            .bind(("estimated_total_cost", successor.estimated_total_cost))
            .bind(("note_id", Uuid::new_v4().to_string()))
            .bind(("kind", kind_to_string(&split.note.kind).to_string()))
            .bind(("author", split.note.author))
            .bind(("content", split.note.content))
            .bind(("reason", split.note.reason))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        debug!(
            assignment_id = %id,
            successor_id = %successor_id,
            "Assignment period superseded"
        );
        let original = self.fetch(id).await?;
        let successor = self.fetch(successor_id).await?;
        Ok((original, successor))
    }

    async fn update_status(&self, id: Uuid, status: AssignmentStatus) -> ResmanResult<()> {
        self.fetch(id).await?;

        self.db
            .query(
                "UPDATE type::record('project_assignment', $id) SET \
                 status = $status, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, filter: AssignmentFilter) -> ResmanResult<Vec<ProjectAssignment>> {
        let mut conditions = Vec::new();
        if filter.employee.is_some() {
            conditions.push("employee = $employee");
        }
        if filter.project.is_some() {
            conditions.push("project = $project");
        }
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.from_date.is_some() {
            conditions.push("start_date >= $from_date");
        }
        if filter.to_date.is_some() {
            conditions.push("end_date <= $to_date");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM project_assignment \
             {where_clause} ORDER BY start_date DESC"
        );

        let mut builder = self.db.query(&query);
        if let Some(employee) = filter.employee {
            builder = builder.bind(("employee", employee));
        }
        if let Some(project) = filter.project {
            builder = builder.bind(("project", project));
        }
        if let Some(status) = filter.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(from_date) = filter.from_date {
            builder = builder.bind(("from_date", from_date.to_string()));
        }
        if let Some(to_date) = filter.to_date {
            builder = builder.bind(("to_date", to_date.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<AssignmentRowWithId> = result.take(0).map_err(DbError::from)?;
        let assignments = rows
            .into_iter()
            .map(|r| r.try_into_assignment())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(assignments)
    }

    async fn fetch_active_assignments_for_employee(
        &self,
        employee: &str,
    ) -> ResmanResult<Vec<ActiveAllocation>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, allocation_percentage, start_date \
                 FROM project_assignment \
                 WHERE employee = $employee AND status = 'Active' \
                 ORDER BY start_date ASC",
            )
            .bind(("employee", employee.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ActiveRow> = result.take(0).map_err(DbError::from)?;
        let active = rows
            .into_iter()
            .map(|r| {
                Ok(ActiveAllocation {
                    record_id: parse_uuid(&r.record_id, "assignment")?,
                    allocation_percentage: parse_percentage(r.allocation_percentage)?,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(active)
    }
}
