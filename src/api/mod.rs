//! HTTP API module for the attendance engine.
//!
//! This module provides the REST endpoints for recording and reviewing
//! punches, reading attendance status and computing payroll.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    HistoryQuery, PayrollQuery, PunchRequest, ReviewQueueQuery, ReviewRequest, StatusQuery,
    TimesheetQuery, WhosWorkingQuery,
};
pub use response::{ApiError, ApiErrorResponse, PunchResponse, ReviewResponse};
pub use state::AppState;
