//! Performance benchmarks for the attendance engine.
//!
//! Covers the pure calculations on their own and the HTTP paths a kiosk
//! or payroll run exercises most:
//! - Geofence resolution against growing candidate sets
//! - Hour aggregation over a pay period of punches
//! - Gross-to-net pay calculation
//! - Punch submission, status and payroll through the router
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use attendance_engine::api::{AppState, create_router};
use attendance_engine::calculation::{PayInputs, aggregate_hours, calculate_pay, resolve_geofence};
use attendance_engine::config::ConfigLoader;
use attendance_engine::models::{
    Deduction, Employee, GeoPoint, Geofence, LoanAdvance, OvertimeRule, PayPeriodKind, PayType,
    PunchRecord, PunchType,
};

use axum::{Router, body::Body, http::Request};
use tower::ServiceExt;

fn create_test_router() -> Router {
    let config = ConfigLoader::load("./config/shop").expect("Failed to load config");
    create_router(AppState::new(config))
}

fn period_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 12, 13, 0, 0).unwrap()
}

/// Geofences spread north of the first, 1km apart.
fn create_geofences(count: usize) -> Vec<Geofence> {
    (0..count)
        .map(|i| Geofence {
            id: format!("gf_{:03}", i),
            name: format!("Bay {}", i),
            shop_id: Some("shop_main".to_string()),
            latitude: 40.7128 + i as f64 * 0.009,
            longitude: -74.0060,
            radius_meters: 100.0,
            is_required: true,
            is_active: true,
        })
        .collect()
}

/// One working day per entry: clock in, a 30 minute break, clock out.
fn create_punches(days: usize) -> Vec<PunchRecord> {
    let start = period_start();
    let mut punches = Vec::with_capacity(days * 4);
    for day in 0..days {
        let base = start + Duration::days(day as i64);
        for (offset, punch_type) in [
            (0, PunchType::ClockIn),
            (240, PunchType::BreakStart),
            (270, PunchType::BreakEnd),
            (540, PunchType::ClockOut),
        ] {
            let at = base + Duration::minutes(offset);
            punches.push(PunchRecord::new("emp_bench", punch_type, at, at));
        }
    }
    punches
}

fn create_employee() -> Employee {
    Employee {
        id: "emp_bench".to_string(),
        name: "Bench Mechanic".to_string(),
        role: "MECHANIC".to_string(),
        pay_type: PayType::Hourly,
        pay_rate: Decimal::new(2250, 2),
        overtime_rate: None,
        pin_hash: None,
        is_active: true,
    }
}

/// Benchmark: Geofence resolution by candidate count.
fn bench_resolve_geofence(c: &mut Criterion) {
    let location = GeoPoint::new(40.7500, -74.0060);
    let mut group = c.benchmark_group("resolve_geofence");

    for count in [1, 10, 100].iter() {
        let candidates = create_geofences(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("candidates", count), count, |b, _| {
            b.iter(|| black_box(resolve_geofence(Some(&location), &candidates)))
        });
    }

    group.finish();
}

/// Benchmark: Hour aggregation by days of punches.
fn bench_aggregate_hours(c: &mut Criterion) {
    let now = period_start() + Duration::days(31);
    let mut group = c.benchmark_group("aggregate_hours");

    for days in [5, 14, 31].iter() {
        let punches = create_punches(*days);
        group.throughput(Throughput::Elements(punches.len() as u64));
        group.bench_with_input(BenchmarkId::new("days", days), days, |b, _| {
            b.iter(|| black_box(aggregate_hours(&punches, now)))
        });
    }

    group.finish();
}

/// Benchmark: Gross-to-net with overtime, a percentage deduction and a loan.
fn bench_calculate_pay(c: &mut Criterion) {
    let employee = create_employee();
    let rule = OvertimeRule {
        id: "ot_weekly".to_string(),
        name: "Weekly overtime".to_string(),
        weekly_threshold_hours: Decimal::new(40, 0),
        daily_threshold_hours: Some(Decimal::new(8, 0)),
        overtime_multiplier: Decimal::new(15, 1),
        is_active: true,
    };
    let deductions = vec![Deduction {
        id: "ded_ret".to_string(),
        employee_id: "emp_bench".to_string(),
        deduction_type: "RETIREMENT".to_string(),
        description: "401k".to_string(),
        amount: Decimal::ZERO,
        percentage: Some(Decimal::new(45, 1)),
        is_active: true,
    }];
    let loans = vec![LoanAdvance {
        id: "loan_1".to_string(),
        employee_id: "emp_bench".to_string(),
        description: "Tool advance".to_string(),
        period_payment: Decimal::new(100, 0),
        remaining_balance: Decimal::new(450, 0),
        is_active: true,
    }];

    c.bench_function("calculate_pay", |b| {
        b.iter(|| {
            black_box(calculate_pay(&PayInputs {
                employee: &employee,
                total_hours: Decimal::new(18650, 2),
                overtime_rule: Some(&rule),
                deductions: &deductions,
                loans: &loans,
                period: PayPeriodKind::Month,
            }))
        })
    });
}

/// Benchmark: Alternating clock-in and clock-out through the router.
fn bench_punch_submission(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_test_router();
    let counter = Arc::new(AtomicUsize::new(0));

    c.bench_function("punch_submission", |b| {
        b.to_async(&rt).iter(|| {
            let router = router.clone();
            let counter = Arc::clone(&counter);
            async move {
                let punch_type = if counter.fetch_add(1, Ordering::Relaxed) % 2 == 0 {
                    "CLOCK_IN"
                } else {
                    "CLOCK_OUT"
                };
                let body = serde_json::json!({
                    "employeeId": "emp_001",
                    "type": punch_type,
                    "latitude": 40.7128,
                    "longitude": -74.0060,
                });
                let response = router
                    .oneshot(
                        Request::builder()
                            .method("POST")
                            .uri("/attendance/punch")
                            .header("Content-Type", "application/json")
                            .body(Body::from(body.to_string()))
                            .unwrap(),
                    )
                    .await
                    .unwrap();
                black_box(response)
            }
        })
    });
}

/// Benchmark: Read endpoints while one employee is mid-shift.
fn bench_read_endpoints(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_test_router();

    rt.block_on(async {
        for punch_type in ["CLOCK_IN", "BREAK_START", "BREAK_END"] {
            let body = serde_json::json!({"employeeId": "emp_001", "type": punch_type});
            router
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/attendance/punch")
                        .header("Content-Type", "application/json")
                        .body(Body::from(body.to_string()))
                        .unwrap(),
                )
                .await
                .unwrap();
        }
    });

    let mut group = c.benchmark_group("read_endpoints");

    for uri in [
        "/attendance/status?employeeId=emp_001",
        "/attendance/whos-working",
        "/payroll/emp_001",
        "/payroll",
    ] {
        group.bench_with_input(BenchmarkId::new("get", uri), uri, |b, uri| {
            b.to_async(&rt).iter(|| async {
                let response = router
                    .clone()
                    .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                    .await
                    .unwrap();
                black_box(response)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_geofence,
    bench_aggregate_hours,
    bench_calculate_pay,
    bench_punch_submission,
    bench_read_endpoints,
);
criterion_main!(benches);
