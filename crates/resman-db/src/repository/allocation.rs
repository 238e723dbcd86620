//! SurrealDB implementation of [`AllocationRequestRepository`].

use chrono::{DateTime, Utc};
use resman_core::error::ResmanResult;
use resman_core::models::allocation::{
    AllocationRequest, AllocationStatus, NewAllocationRequest, StatusTransition,
    UpdateAllocationRequest,
};
use resman_core::models::candidate::EmployeeCandidate;
use resman_core::repository::{AllocationRequestRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{parse_date, parse_percentage, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AllocationRowWithId {
    record_id: String,
    status: String,
    project: Option<String>,
    requested_employee: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    allocation_percentage: Option<i64>,
    requested_by: String,
    request_date: Option<DateTime<Utc>>,
    notes: String,
    rejection_reason: Option<String>,
    candidates_json: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_status(s: &str) -> Result<AllocationStatus, DbError> {
    match s {
        "Draft" => Ok(AllocationStatus::Draft),
        "Requested" => Ok(AllocationStatus::Requested),
        "Approved" => Ok(AllocationStatus::Approved),
        "Rejected" => Ok(AllocationStatus::Rejected),
        other => Err(DbError::Migration(format!(
            "unknown allocation status: {other}"
        ))),
    }
}

fn encode_candidates(candidates: &[EmployeeCandidate]) -> Result<String, DbError> {
    Ok(serde_json::to_string(candidates)?)
}

impl AllocationRowWithId {
    fn try_into_request(self) -> Result<AllocationRequest, DbError> {
        Ok(AllocationRequest {
            id: parse_uuid(&self.record_id, "allocation request")?,
            status: parse_status(&self.status)?,
            project: self.project,
            requested_employee: self.requested_employee,
            start_date: self.start_date.as_deref().map(parse_date).transpose()?,
            end_date: self.end_date.as_deref().map(parse_date).transpose()?,
            allocation_percentage: self
                .allocation_percentage
                .map(parse_percentage)
                .transpose()?,
            requested_by: self.requested_by,
            request_date: self.request_date,
            notes: self.notes,
            rejection_reason: self.rejection_reason,
            candidate_employees: serde_json::from_str(&self.candidates_json)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Allocation Request repository.
///
/// The candidate table is stored as a JSON document on the request and is
/// always replaced whole.
#[derive(Clone)]
pub struct SurrealAllocationRequestRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAllocationRequestRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<AllocationRequest, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('allocation_request', $id)",
            )
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<AllocationRowWithId> = result.take(0)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "allocation_request".into(),
            id: id_str,
        })?;

        row.try_into_request()
    }
}

impl<C: Connection> AllocationRequestRepository for SurrealAllocationRequestRepository<C> {
    async fn create(&self, input: NewAllocationRequest) -> ResmanResult<AllocationRequest> {
        let id = Uuid::new_v4();
        let candidates_json = encode_candidates(&input.candidate_employees)?;

        self.db
            .query(
                "CREATE type::record('allocation_request', $id) SET \
                 status = 'Draft', \
                 project = $project, \
                 requested_employee = NONE, \
                 start_date = $start_date, \
                 end_date = $end_date, \
                 allocation_percentage = $allocation_percentage, \
                 requested_by = $requested_by, \
                 request_date = NONE, \
                 notes = $notes, \
                 rejection_reason = NONE, \
                 candidates_json = $candidates_json",
            )
            .bind(("id", id.to_string()))
            .bind(("project", input.project))
            .bind(("start_date", input.start_date.map(|d| d.to_string())))
            .bind(("end_date", input.end_date.map(|d| d.to_string())))
            .bind((
                "allocation_percentage",
                input.allocation_percentage.map(i64::from),
            ))
            .bind(("requested_by", input.requested_by))
            .bind(("notes", input.notes))
            .bind(("candidates_json", candidates_json))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(self.fetch(id).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> ResmanResult<AllocationRequest> {
        Ok(self.fetch(id).await?)
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateAllocationRequest,
    ) -> ResmanResult<AllocationRequest> {
        self.fetch(id).await?;

        let mut sets = Vec::new();
        if input.project.is_some() {
            sets.push("project = $project");
        }
        if input.start_date.is_some() {
            sets.push("start_date = $start_date");
        }
        if input.end_date.is_some() {
            sets.push("end_date = $end_date");
        }
        if input.allocation_percentage.is_some() {
            sets.push("allocation_percentage = $allocation_percentage");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        if input.candidate_employees.is_some() {
            sets.push("candidates_json = $candidates_json");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('allocation_request', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));

        if let Some(project) = input.project {
            builder = builder.bind(("project", project));
        }
        if let Some(start_date) = input.start_date {
            builder = builder.bind(("start_date", start_date.to_string()));
        }
        if let Some(end_date) = input.end_date {
            builder = builder.bind(("end_date", end_date.to_string()));
        }
        if let Some(pct) = input.allocation_percentage {
            builder = builder.bind(("allocation_percentage", i64::from(pct)));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }
        if let Some(ref candidates) = input.candidate_employees {
            builder = builder.bind(("candidates_json", encode_candidates(candidates)?));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(self.fetch(id).await?)
    }

    async fn persist_status_transition(
        &self,
        id: Uuid,
        transition: StatusTransition,
    ) -> ResmanResult<AllocationRequest> {
        self.fetch(id).await?;

        let mut sets = vec!["status = $status"];
        if transition.requested_employee.is_some() {
            sets.push("requested_employee = $requested_employee");
        }
        if transition.request_date.is_some() {
            sets.push("request_date = $request_date");
        }
        if transition.notes.is_some() {
            sets.push("notes = $notes");
        }
        if transition.rejection_reason.is_some() {
            sets.push("rejection_reason = $rejection_reason");
        }
        if transition.candidate_employees.is_some() {
            sets.push("candidates_json = $candidates_json");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('allocation_request', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("status", transition.status.as_str().to_string()));

        if let Some(employee) = transition.requested_employee {
            builder = builder.bind(("requested_employee", employee));
        }
        if let Some(request_date) = transition.request_date {
            builder = builder.bind(("request_date", request_date));
        }
        if let Some(notes) = transition.notes {
            builder = builder.bind(("notes", notes));
        }
        if let Some(reason) = transition.rejection_reason {
            builder = builder.bind(("rejection_reason", reason));
        }
        if let Some(ref candidates) = transition.candidate_employees {
            builder = builder.bind(("candidates_json", encode_candidates(candidates)?));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        debug!(request_id = %id, status = %transition.status, "Status transition persisted");
        Ok(self.fetch(id).await?)
    }

    async fn delete(&self, id: Uuid) -> ResmanResult<()> {
        self.fetch(id).await?;

        self.db
            .query("DELETE type::record('allocation_request', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn list(
        &self,
        requested_by: Option<&str>,
        pagination: Pagination,
    ) -> ResmanResult<PaginatedResult<AllocationRequest>> {
        let where_clause = if requested_by.is_some() {
            "WHERE requested_by = $requested_by"
        } else {
            ""
        };
        let owner = requested_by.map(str::to_string);

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM allocation_request {where_clause} GROUP ALL"
            ))
            .bind(("requested_by", owner.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM allocation_request \
                 {where_clause} ORDER BY created_at DESC \
                 LIMIT $limit START $offset"
            ))
            .bind(("requested_by", owner))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AllocationRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|r| r.try_into_request())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
