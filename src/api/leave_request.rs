use crate::auth::auth::AuthUser;
use crate::leave::balance::LeaveSummaryLine;
use crate::leave::service::{LeaveService, Requester};
use crate::model::leave_entry::{LeaveDateEntry, Portion};
use crate::model::leave_request::{Decision, LeaveRequest};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct DayCountReq {
    #[schema(example = 2)]
    pub leave_type_id: u64,
    #[schema(example = "2025-10-06", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2025-10-08", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[serde(default)]
    pub start_portion: Portion,
    #[serde(default)]
    pub end_portion: Portion,
}

#[derive(Serialize, ToSchema)]
pub struct DayCountResponse {
    #[schema(example = 2)]
    pub leave_type_id: u64,
    #[schema(example = 2.5)]
    pub days: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct SummaryReq {
    pub entries: Vec<LeaveDateEntry>,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub data: Vec<LeaveSummaryLine>,
    /// True when any line would overdraw an available balance
    #[schema(example = false)]
    pub blocked: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 2)]
    pub leave_type_id: u64,
    #[schema(example = json!([
        { "date": "2025-10-06", "leave_type_id": 2, "portion": "first_half" },
        { "date": "2025-10-07", "leave_type_id": 2, "portion": "full" }
    ]))]
    pub entries: Vec<LeaveDateEntry>,
}

fn employee_of(auth: &AuthUser) -> actix_web::Result<u64> {
    auth.employee_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))
}

/* =========================
Day count for a date range
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/day-count",
    request_body(content = DayCountReq, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave days in the range", body = DayCountResponse),
        (status = 400, description = "Reversed or oversized date range"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown leave type")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn day_count(
    _auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<DayCountReq>,
) -> actix_web::Result<impl Responder> {
    let days = service
        .day_count(
            payload.leave_type_id,
            payload.start_date,
            payload.end_date,
            payload.start_portion,
            payload.end_portion,
        )
        .await?;

    Ok(HttpResponse::Ok().json(DayCountResponse {
        leave_type_id: payload.leave_type_id,
        days,
    }))
}

/* =========================
Balance projection for a selection
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/summary",
    request_body(content = SummaryReq, content_type = "application/json"),
    responses(
        (status = 200, description = "Per leave type consumption and projected balance", body = SummaryResponse),
        (status = 400, description = "Invalid selection"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_summary(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<SummaryReq>,
) -> actix_web::Result<impl Responder> {
    let employee_id = employee_of(&auth)?;
    let data = service.summarize(employee_id, &payload.entries).await?;
    let blocked = data.iter().any(LeaveSummaryLine::blocks_submission);

    Ok(HttpResponse::Ok().json(SummaryResponse { data, blocked }))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Insufficient leave credit")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let requester = Requester {
        employee_id: employee_of(&auth)?,
        name: auth.username.clone(),
    };
    let CreateLeave {
        leave_type_id,
        entries,
    } = payload.into_inner();

    let request = service.submit(&requester, leave_type_id, entries).await?;
    Ok(HttpResponse::Created().json(request))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = String, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "leave request LV-2569-04217 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let request = service.get(&path.into_inner()).await?;

    let is_requester = auth.employee_id == Some(request.employee_id);
    let is_approver = auth.employee_id.is_some_and(|id| {
        request
            .resolved_chain
            .iter()
            .any(|step| step.is_satisfied_by(id, auth.position.as_deref()))
    });
    if !is_requester && !is_approver {
        auth.require_hr_or_admin()?;
    }

    Ok(HttpResponse::Ok().json(request))
}

async fn decide(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    leave_id: String,
    decision: Decision,
) -> actix_web::Result<HttpResponse> {
    let approver = auth.approver()?;
    let request = service.decide(&leave_id, &approver, decision).await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Approve the current step
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = String, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Step approved; request advanced or approved", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not hold the current approval step"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request not awaiting approval, or credit exhausted")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    decide(auth, service, path.into_inner(), Decision::Approve).await
}

/* =========================
Reject at the current step
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = String, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not hold the current approval step"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request not awaiting approval")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    decide(auth, service, path.into_inner(), Decision::Reject).await
}

/* =========================
Cancel (requester only)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(
        ("leave_id" = String, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the requester may cancel"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_id = employee_of(&auth)?;
    let request = service.cancel(&path.into_inner(), employee_id).await?;
    Ok(HttpResponse::Ok().json(request))
}
