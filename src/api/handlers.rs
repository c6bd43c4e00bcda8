//! HTTP request handlers for the attendance API.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::TimeDelta;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::attendance::{ReviewAction, review_punch};
use crate::models::local_midnight;
use crate::reports::{
    PayrollContext, REVIEW_DEFAULT_DAYS, TimesheetFilter, TimesheetWindow, employee_payroll_report,
    employee_status, punch_history, review_queue, shop_payroll, timesheets, whos_working,
};
use crate::store::PunchQuery;

use super::request::{
    HistoryQuery, PayrollQuery, PunchRequest, ReviewQueueQuery, ReviewRequest, StatusQuery,
    TimesheetQuery, WhosWorkingQuery,
};
use super::response::{ApiError, ApiErrorResponse, PunchResponse, ReviewResponse};
use super::state::AppState;

type ApiResult = Result<Response, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/attendance/punch",
            get(punch_history_handler).post(punch_handler),
        )
        .route(
            "/attendance/review",
            get(review_queue_handler).post(review_handler),
        )
        .route("/attendance/status", get(status_handler))
        .route("/attendance/whos-working", get(whos_working_handler))
        .route("/attendance/timesheets", get(timesheets_handler))
        .route("/payroll", get(shop_payroll_handler))
        .route("/payroll/:employee_id", get(employee_payroll_handler))
        .with_state(state)
}

/// Maps a JSON body rejection onto a 400 error.
fn json_rejection(correlation_id: Uuid, rejection: JsonRejection) -> ApiErrorResponse {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            ApiError::with_message("VALIDATION_ERROR", "Invalid request body", body_text)
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => ApiError::new(
            "MISSING_CONTENT_TYPE",
            "Content-Type must be application/json",
        ),
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::bad_request(error)
}

/// Maps a query string rejection onto a 400 error.
fn query_rejection(correlation_id: Uuid, rejection: QueryRejection) -> ApiErrorResponse {
    let body_text = rejection.body_text();
    warn!(correlation_id = %correlation_id, error = %body_text, "Query string error");
    ApiErrorResponse::bad_request(ApiError::malformed_query(body_text))
}

/// Logs a failed request and passes the error through.
fn log_failure(correlation_id: Uuid, error: ApiErrorResponse) -> ApiErrorResponse {
    warn!(
        correlation_id = %correlation_id,
        status = error.status.as_u16(),
        code = %error.error.code,
        "Request failed"
    );
    error
}

/// Returns the submitting client address from proxy headers.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .unwrap_or("unknown")
        .to_string()
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiErrorResponse> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        ApiErrorResponse::bad_request(ApiError::validation_error(format!("{} is required", name)))
    })
}

/// Handler for POST /attendance/punch.
///
/// Returns 201 with the stored punch, or 200 when the idempotency key was
/// already recorded.
async fn punch_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PunchRequest>, JsonRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing punch request");

    let Json(request) = payload.map_err(|r| json_rejection(correlation_id, r))?;
    let submission = request
        .into_submission(client_ip(&headers))
        .map_err(|e| log_failure(correlation_id, e.into()))?;
    let employee_id = submission.employee_id.clone();
    let punch_type = submission.punch_type;

    let receipt = state
        .recorder()
        .record(submission)
        .await
        .map_err(|e| log_failure(correlation_id, e.into()))?;

    info!(
        correlation_id = %correlation_id,
        employee_id = %employee_id,
        punch_type = ?punch_type,
        punch_id = %receipt.punch.id,
        replayed = receipt.replayed,
        "Punch recorded"
    );

    let status = if receipt.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(PunchResponse {
            success: true,
            punch: receipt.punch,
            shift_duration: receipt.shift_duration_minutes,
            message: receipt.message,
            replayed: receipt.replayed,
        }),
    )
        .into_response())
}

/// Handler for GET /attendance/punch.
async fn punch_history_handler(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let Query(query) = query.map_err(|r| query_rejection(correlation_id, r))?;
    let employee_id = required(query.employee_id, "employeeId")?;

    let offset = state.config().utc_offset();
    let filter = PunchQuery {
        employee_id: Some(employee_id.clone()),
        shop_id: None,
        since: query.start_date.map(|d| local_midnight(d, offset)),
        until: query
            .end_date
            .and_then(|d| d.succ_opt())
            .map(|d| local_midnight(d, offset) - TimeDelta::milliseconds(1)),
    };

    let punches = punch_history(state.store(), &filter, query.limit)
        .await
        .map_err(|e| log_failure(correlation_id, e.into()))?;

    info!(
        correlation_id = %correlation_id,
        employee_id = %employee_id,
        count = punches.len(),
        "Punch history served"
    );
    Ok(Json(json!({ "punches": punches })).into_response())
}

/// Handler for GET /attendance/status.
async fn status_handler(
    State(state): State<AppState>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let Query(query) = query.map_err(|r| query_rejection(correlation_id, r))?;
    let employee_id = required(query.employee_id, "employeeId")?;

    let status = employee_status(
        state.store(),
        &employee_id,
        state.now(),
        state.config().utc_offset(),
    )
    .await
    .map_err(|e| log_failure(correlation_id, e.into()))?;

    Ok(Json(status).into_response())
}

/// Handler for GET /attendance/whos-working.
async fn whos_working_handler(
    State(state): State<AppState>,
    query: Result<Query<WhosWorkingQuery>, QueryRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let Query(query) = query.map_err(|r| query_rejection(correlation_id, r))?;

    let working = whos_working(state.store(), query.shop_id.as_deref(), state.now())
        .await
        .map_err(|e| log_failure(correlation_id, e.into()))?;

    Ok(Json(working).into_response())
}

/// Handler for GET /attendance/timesheets.
async fn timesheets_handler(
    State(state): State<AppState>,
    query: Result<Query<TimesheetQuery>, QueryRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let Query(query) = query.map_err(|r| query_rejection(correlation_id, r))?;
    let config = state.config();
    let offset = config.utc_offset();

    let window = match (query.start_date, query.end_date) {
        (Some(first), Some(last)) => TimesheetWindow::custom(first, last, offset)
            .map_err(|e| log_failure(correlation_id, e.into()))?,
        _ => TimesheetWindow::for_period(
            query.period.unwrap_or_default(),
            config.default_pay_period(),
            state.now(),
            offset,
        ),
    };
    let filter = TimesheetFilter {
        employee_id: query.employee_id,
        shop_id: query.shop_id,
    };

    let report = timesheets(state.store(), &filter, window, config.active_overtime_rule())
        .await
        .map_err(|e| log_failure(correlation_id, e.into()))?;

    info!(
        correlation_id = %correlation_id,
        period = %report.period.label,
        employees = report.totals.total_employees,
        shifts = report.totals.total_shifts,
        "Timesheets served"
    );
    Ok(Json(report).into_response())
}

/// Handler for GET /attendance/review.
async fn review_queue_handler(
    State(state): State<AppState>,
    query: Result<Query<ReviewQueueQuery>, QueryRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let Query(query) = query.map_err(|r| query_rejection(correlation_id, r))?;

    let queue = review_queue(
        state.store(),
        query.shop_id.as_deref(),
        query.days_back.unwrap_or(REVIEW_DEFAULT_DAYS),
        query.only_flagged.unwrap_or(false),
        state.now(),
        state.config().utc_offset(),
    )
    .await
    .map_err(|e| log_failure(correlation_id, e.into()))?;

    info!(
        correlation_id = %correlation_id,
        total = queue.summary.total,
        flagged = queue.summary.flagged,
        "Review queue served"
    );
    Ok(Json(queue).into_response())
}

/// Handler for POST /attendance/review.
async fn review_handler(
    State(state): State<AppState>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing review request");

    let Json(request) = payload.map_err(|r| json_rejection(correlation_id, r))?;
    let (Some(action), Some(punch_id)) = (request.action, request.punch_id) else {
        return Err(ApiErrorResponse::bad_request(ApiError::validation_error(
            "action and punchId are required",
        )));
    };

    let action = ReviewAction::parse(
        &action,
        request.reason,
        request.new_timestamp,
        request.notes,
    )
    .map_err(|e| log_failure(correlation_id, e.into()))?;
    let punch = review_punch(state.store(), punch_id, &action)
        .await
        .map_err(|e| log_failure(correlation_id, e.into()))?;

    Ok(Json(ReviewResponse {
        success: true,
        punch,
        message: action.message().to_string(),
    })
    .into_response())
}

/// Handler for GET /payroll.
async fn shop_payroll_handler(
    State(state): State<AppState>,
    query: Result<Query<PayrollQuery>, QueryRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let Query(query) = query.map_err(|r| query_rejection(correlation_id, r))?;
    let config = state.config();

    let ctx = PayrollContext {
        overtime_rule: config.active_overtime_rule(),
        offset: config.utc_offset(),
        now: state.now(),
        kind: query.period.unwrap_or(config.default_pay_period()),
    };
    let report = shop_payroll(state.store(), &ctx)
        .await
        .map_err(|e| log_failure(correlation_id, e.into()))?;

    info!(
        correlation_id = %correlation_id,
        employees = report.totals.employee_count,
        gross_pay = %report.totals.gross_pay,
        duration_us = report.duration_us,
        "Payroll completed successfully"
    );
    Ok(Json(report).into_response())
}

/// Handler for GET /payroll/{employeeId}.
async fn employee_payroll_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    query: Result<Query<PayrollQuery>, QueryRejection>,
) -> ApiResult {
    let correlation_id = Uuid::new_v4();
    let Query(query) = query.map_err(|r| query_rejection(correlation_id, r))?;
    let config = state.config();

    let ctx = PayrollContext {
        overtime_rule: config.active_overtime_rule(),
        offset: config.utc_offset(),
        now: state.now(),
        kind: query.period.unwrap_or(config.default_pay_period()),
    };
    let report = employee_payroll_report(state.store(), &employee_id, &ctx)
        .await
        .map_err(|e| log_failure(correlation_id, e.into()))?;

    info!(
        correlation_id = %correlation_id,
        employee_id = %employee_id,
        gross_pay = %report.payroll.pay.gross_pay,
        net_pay = %report.payroll.pay.net_pay,
        "Employee payroll completed successfully"
    );
    Ok(Json(report).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use axum::{
        body::Body,
        http::{HeaderValue, Request},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let config = ConfigLoader::load("./config/shop").expect("Failed to load config");
        AppState::new(config)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers), "10.0.0.2");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let router = create_router(create_test_state());
        let (status, body) = send(router, post("/attendance/punch", "{invalid json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_type_returns_400() {
        let router = create_router(create_test_state());
        let (status, body) =
            send(router, post("/attendance/punch", r#"{"employeeId":"emp_001"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "employeeId and type are required");
    }

    #[tokio::test]
    async fn test_unknown_punch_type_returns_400() {
        let router = create_router(create_test_state());
        let (status, body) = send(
            router,
            post(
                "/attendance/punch",
                r#"{"employeeId":"emp_001","type":"LUNCH"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_status_requires_employee_id() {
        let router = create_router(create_test_state());
        let request = Request::builder()
            .uri("/attendance/status")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "employeeId is required");
    }

    #[tokio::test]
    async fn test_review_requires_action_and_punch_id() {
        let router = create_router(create_test_state());
        let (status, body) =
            send(router, post("/attendance/review", r#"{"action":"approve"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "action and punchId are required");
    }

    #[tokio::test]
    async fn test_invalid_period_returns_400() {
        let router = create_router(create_test_state());
        let request = Request::builder()
            .uri("/payroll?period=fortnight")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_QUERY");
    }
}
