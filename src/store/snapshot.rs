use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use actix_web::web;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::leave::error::LeaveError;
use crate::model::leave_entry::LeaveDateEntry;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::utils::request_id::fiscal_year;

/// Document written once per submitted request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSnapshot {
    pub request_id: String,
    pub fiscal_year: i32,
    pub employee_id: u64,
    pub requester_name: String,
    pub leave_type_id: u64,
    pub leave_type_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub computed_days: f64,
    pub status: LeaveStatus,
    pub entries: Vec<LeaveDateEntry>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl RequestSnapshot {
    pub fn of(
        request: &LeaveRequest,
        requester_name: &str,
        leave_type_name: &str,
    ) -> Result<Self, LeaveError> {
        let (start_date, end_date) = request.date_range().ok_or(LeaveError::NoWorkingDays)?;
        Ok(Self {
            request_id: request.id.clone(),
            fiscal_year: fiscal_year(start_date),
            employee_id: request.employee_id,
            requester_name: requester_name.to_string(),
            leave_type_id: request.leave_type_id,
            leave_type_name: leave_type_name.to_string(),
            start_date,
            end_date,
            computed_days: request.computed_days,
            status: request.status,
            entries: request.entries.clone(),
            submitted_at: request.submitted_at,
        })
    }
}

/// Writes snapshots under `<root>/<fiscalYear>/<employeeId>/<requestId>.json`.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    root: PathBuf,
}

impl SnapshotWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, snapshot: &RequestSnapshot) -> PathBuf {
        self.root
            .join(snapshot.fiscal_year.to_string())
            .join(snapshot.employee_id.to_string())
            .join(format!("{}.json", snapshot.request_id))
    }

    /// Fails with `Conflict` rather than replace an existing snapshot.
    pub fn write(&self, snapshot: &RequestSnapshot) -> Result<PathBuf, LeaveError> {
        let path = self.path_for(snapshot);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let body = serde_json::to_vec_pretty(snapshot)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(LeaveError::Conflict(snapshot.request_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&body)?;
        file.sync_all()?;
        Ok(path)
    }

    /// [`SnapshotWriter::write`] on the blocking thread pool.
    pub async fn persist(&self, snapshot: RequestSnapshot) -> Result<PathBuf, LeaveError> {
        let writer = self.clone();
        web::block(move || writer.write(&snapshot))
            .await
            .map_err(|e| LeaveError::Storage(e.to_string()))?
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
