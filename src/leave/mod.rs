//! Leave accounting: day counting, balance projection, approver chains and
//! the request lifecycle.

pub mod approval;
pub mod balance;
pub mod calendar;
pub mod day_counter;
pub mod error;
pub mod lifecycle;
pub mod service;
