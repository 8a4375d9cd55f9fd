use crate::api::leave_request::{
    CreateLeave, DayCountReq, DayCountResponse, SummaryReq, SummaryResponse,
};
use crate::leave::balance::LeaveSummaryLine;
use crate::model::leave_entry::{LeaveDateEntry, Portion};
use crate::model::leave_request::{ApprovalRecord, Decision, LeaveRequest};
use crate::model::leave_type::{ApprovalRule, ApproverStep, CountingPolicy};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave API",
        version = "1.0.0",
        description = r#"
## Leave accounting & approval

Turns a leave date selection into a day count, projects it against the
employee's leave credit, and walks the request through its approver chain.

### 🔹 Key Features
- **Day counting**
  - Calendar-day or working-day counting per leave type, with half days
- **Balance projection**
  - Per leave type consumption and remaining credit before submission
- **Approval chains**
  - Threshold based approver steps, approved in order
- **Lifecycle**
  - Submit, approve, reject and cancel; credit is charged once on final approval

### 🔐 Security
All endpoints require a **JWT Bearer** access token.
"#,
    ),
    paths(
        crate::api::leave_request::day_count,
        crate::api::leave_request::leave_summary,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave
    ),
    components(
        schemas(
            DayCountReq,
            DayCountResponse,
            SummaryReq,
            SummaryResponse,
            CreateLeave,
            LeaveSummaryLine,
            LeaveDateEntry,
            Portion,
            LeaveRequest,
            ApprovalRecord,
            Decision,
            ApproverStep,
            ApprovalRule,
            CountingPolicy
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave accounting and approval APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
