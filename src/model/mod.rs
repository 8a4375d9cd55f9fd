pub mod holiday;
pub mod leave_credit;
pub mod leave_entry;
pub mod leave_request;
pub mod leave_type;
pub mod role;
