use crate::{
    api::reply::Reply,
    model::attendance::{EventKind, EventStatus},
    resolver::{ResolveError, Resolution, Resolver},
    utils::db_utils::{SqlFilter, SqlValue},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordRequest {
    /// Document number printed on the employee card.
    #[schema(example = "1061234567", value_type = String)]
    pub code: Option<Value>,
    #[schema(example = 2)]
    pub site_id: Option<u64>,
}

/// What the kiosk shows after a successful scan.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordDisplay {
    #[schema(example = "ANA PEREZ GOMEZ")]
    pub full_name: String,
    #[schema(example = "NURSE")]
    pub role: String,
    #[schema(example = "2026-01-05")]
    pub date: String,
    #[schema(example = "08:02:11")]
    pub time: String,
    pub kind: EventKind,
    pub status: EventStatus,
    pub offset_minutes: Option<i64>,
    /// A dangling Entry was closed before this scan.
    pub auto_closed_previous: bool,
}

impl From<&Resolution> for RecordDisplay {
    fn from(resolution: &Resolution) -> Self {
        let event = &resolution.event;
        Self {
            full_name: resolution.employee.display_name(),
            role: resolution.employee.role_title.to_uppercase(),
            date: event.recorded_at.format("%Y-%m-%d").to_string(),
            time: event.recorded_at.format("%H:%M:%S").to_string(),
            kind: event.kind,
            status: event.status.unwrap_or(EventStatus::Normal),
            offset_minutes: event.offset_minutes,
            auto_closed_previous: resolution.auto_closed.is_some(),
        }
    }
}

fn parse_code(code: Option<&Value>) -> Result<u64, ResolveError> {
    let raw = match code {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(other) => Some(other.to_string()),
    };

    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ResolveError::Validation("An employee code is required".to_string()))?;

    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ResolveError::Validation(format!(
            "The code received is not valid, it must be numeric (received: {raw})"
        )));
    }

    raw.parse::<u64>().map_err(|_| {
        ResolveError::Validation(format!("The code received is out of range ({raw})"))
    })
}

/// Kiosk scan
#[utoipa::path(
    post,
    path = "/api/attendance/record",
    request_body = RecordRequest,
    responses(
        (status = 200, description = "Attendance saved, or exit refused as too soon", body = Reply, example = json!({
            "status": "success",
            "message": "Attendance saved",
            "data": {
                "full_name": "ANA PEREZ GOMEZ",
                "role": "NURSE",
                "date": "2026-01-05",
                "time": "08:02:11",
                "kind": "Entrada",
                "status": "Normal",
                "offset_minutes": null,
                "auto_closed_previous": false
            }
        })),
        (status = 400, description = "Missing or malformed code or site", body = Reply),
        (status = 403, description = "Inactive employee", body = Reply),
        (status = 404, description = "Unknown code, employee or site", body = Reply),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Internal server error", body = Reply)
    ),
    tag = "Kiosk"
)]
pub async fn record_attendance(
    resolver: web::Data<Resolver>,
    payload: web::Json<RecordRequest>,
) -> Result<HttpResponse, ResolveError> {
    let site_id = payload.site_id.ok_or_else(|| {
        ResolveError::Validation("Select a site before registering attendance".to_string())
    })?;
    let code = parse_code(payload.code.as_ref())?;

    let log_fault = |e: &ResolveError| {
        if let ResolveError::Fault(cause) = e {
            error!(error = ?cause, code, site_id, "Attendance scan failed");
        }
    };

    let employee = resolver
        .employee_by_code(code)
        .await
        .inspect_err(log_fault)?;
    let now = Local::now().naive_local();

    let resolution = resolver
        .resolve(employee.id, site_id, now)
        .await
        .inspect_err(log_fault)?;

    Ok(HttpResponse::Ok().json(Reply::success(
        "Attendance saved",
        RecordDisplay::from(&resolution),
    )))
}

// -------------------- Listing --------------------

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub employee_id: Option<u64>,
    pub site_id: Option<u64>,
    #[param(value_type = Option<String>, example = "Entrada")]
    pub kind: Option<EventKind>,
    #[param(value_type = Option<String>, format = "date", example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date", example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
    /// Employee name or site location
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyQuery {
    #[param(value_type = Option<String>, format = "date", example = "2026-01-05")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct RecordRow {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "Ana Perez Gomez")]
    pub employee_name: String,
    pub site_id: u64,
    pub site_location: Option<String>,
    #[schema(value_type = String, example = "2026-01-05T08:02:11")]
    pub recorded_at: NaiveDateTime,
    #[schema(example = "Entrada")]
    pub kind: String,
    #[schema(example = "Con retraso")]
    pub status: Option<String>,
    pub offset_minutes: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct RecordListResponse {
    pub data: Vec<RecordRow>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
    /// Records in the table regardless of filters.
    #[schema(example = 1250)]
    pub total_unfiltered: i64,
}

const RECORD_SELECT: &str = r#"
    SELECT r.id, r.employee_id,
           CONCAT_WS(' ', e.first_name, e.middle_name, e.last_name, e.second_last_name) AS employee_name,
           r.site_id, s.location AS site_location,
           r.recorded_at, r.kind, r.status, r.offset_minutes
    FROM attendance_events r
    JOIN employees e ON e.id = r.employee_id
    JOIN sites s ON s.id = r.site_id
"#;

const RECORD_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM attendance_events r
    JOIN employees e ON e.id = r.employee_id
    JOIN sites s ON s.id = r.site_id
"#;

fn record_filter(query: &RecordQuery) -> SqlFilter {
    let mut filter = SqlFilter::default();

    if let Some(employee_id) = query.employee_id {
        filter.push("r.employee_id = ?", [SqlValue::U64(employee_id)]);
    }
    if let Some(site_id) = query.site_id {
        filter.push("r.site_id = ?", [SqlValue::U64(site_id)]);
    }
    if let Some(kind) = query.kind {
        filter.push("r.kind = ?", [SqlValue::String(kind.label().to_string())]);
    }
    if let Some(start) = query.start_date {
        filter.push("DATE(r.recorded_at) >= ?", [SqlValue::Date(start)]);
    }
    if let Some(end) = query.end_date {
        filter.push("DATE(r.recorded_at) <= ?", [SqlValue::Date(end)]);
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.push_search(
            "(e.first_name LIKE ? OR e.last_name LIKE ? OR s.location LIKE ?)",
            search,
        );
    }

    filter
}

/// 1-based page, clamped page size and the row offset they select.
fn page_window(page: Option<u32>, per_page: Option<u32>) -> (u32, u32, u64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let offset = u64::from(page - 1) * u64::from(per_page);
    (page, per_page, offset)
}

async fn fetch_records(
    pool: &MySqlPool,
    filter: &SqlFilter,
    limit: u64,
    offset: u64,
) -> Result<Vec<RecordRow>, sqlx::Error> {
    let sql = format!(
        "{RECORD_SELECT} {} ORDER BY r.recorded_at DESC, r.id DESC LIMIT ? OFFSET ?",
        filter.where_clause()
    );
    debug!(sql = %sql, "Listing attendance records");

    filter
        .bind_rows(sqlx::query_as::<_, RecordRow>(&sql))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

async fn count_records(pool: &MySqlPool, filter: &SqlFilter) -> Result<i64, sqlx::Error> {
    let sql = format!("{RECORD_COUNT} {}", filter.where_clause());
    filter
        .bind_scalar(sqlx::query_scalar::<_, i64>(&sql))
        .fetch_one(pool)
        .await
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(RecordQuery),
    responses(
        (status = 200, description = "Paginated attendance records, newest first", body = RecordListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_records(
    pool: web::Data<MySqlPool>,
    query: web::Query<RecordQuery>,
) -> actix_web::Result<impl Responder> {
    let (page, per_page, offset) = page_window(query.page, query.per_page);

    let filter = record_filter(&query);

    let data = fetch_records(pool.get_ref(), &filter, u64::from(per_page), offset)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list attendance records");
            ErrorInternalServerError("Database error")
        })?;

    let total = count_records(pool.get_ref(), &filter).await.map_err(|e| {
        error!(error = %e, "Failed to count attendance records");
        ErrorInternalServerError("Database error")
    })?;

    let total_unfiltered = if filter.is_empty() {
        total
    } else {
        count_records(pool.get_ref(), &SqlFilter::default())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to count attendance records");
                ErrorInternalServerError("Database error")
            })?
    };

    Ok(HttpResponse::Ok().json(RecordListResponse {
        data,
        page,
        per_page,
        total,
        total_unfiltered,
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "Records of one day, newest first", body = Vec<RecordRow>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn daily_records(
    pool: web::Data<MySqlPool>,
    query: web::Query<DailyQuery>,
) -> actix_web::Result<impl Responder> {
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());

    let mut filter = SqlFilter::default();
    filter.push("DATE(r.recorded_at) = ?", [SqlValue::Date(date)]);

    let rows = fetch_records(pool.get_ref(), &filter, u64::from(u32::MAX), 0)
        .await
        .map_err(|e| {
            error!(error = %e, %date, "Failed to load daily attendance");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    get,
    path = "/api/attendance/sites/{site_id}/count",
    params(("site_id" = u64, Path, description = "Site id")),
    responses(
        (status = 200, description = "Records registered at the site", body = Object, example = json!({
            "site_id": 2,
            "count": 318
        })),
        (status = 404, description = "Site not found", body = Object, example = json!({
            "message": "Site not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn site_record_count(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let site_id = path.into_inner();

    let sites: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sites WHERE id = ?")
        .bind(site_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, site_id, "Failed to look up site");
            ErrorInternalServerError("Database error")
        })?;

    if sites == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Site not found"
        })));
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance_events WHERE site_id = ?")
        .bind(site_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, site_id, "Failed to count site records");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "site_id": site_id,
        "count": count
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttendancePolicy;
    use crate::model::employee::Employee;
    use crate::store::fake::FakeStore;
    use actix_web::test::{TestRequest, call_service, init_service, read_body_json};
    use actix_web::{App, http::StatusCode};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    const SITE: u64 = 10;

    fn employee(active: bool) -> Employee {
        Employee {
            id: 1,
            document_number: 1061234567,
            first_name: "Ana".to_string(),
            middle_name: None,
            last_name: "Pérez".to_string(),
            second_last_name: None,
            role_title: "Nurse".to_string(),
            active,
        }
    }

    fn resolver(active: bool) -> web::Data<Resolver> {
        let store = FakeStore::default()
            .with_employee(employee(active))
            .with_site(SITE);
        web::Data::new(Resolver::new(Arc::new(store), AttendancePolicy::default()))
    }

    macro_rules! kiosk {
        ($resolver:expr) => {
            init_service(
                App::new()
                    .app_data($resolver)
                    .route("/attendance/record", web::post().to(record_attendance)),
            )
            .await
        };
    }

    macro_rules! scan {
        ($app:expr, $body:expr) => {{
            let req = TestRequest::post()
                .uri("/attendance/record")
                .set_json($body)
                .to_request();
            let resp = call_service(&$app, req).await;
            let status = resp.status();
            let body: Value = read_body_json(resp).await;
            (status, body)
        }};
    }

    #[test]
    fn codes_accept_numbers_and_digit_strings() {
        assert_eq!(parse_code(Some(&json!(1061234567))).unwrap(), 1061234567);
        assert_eq!(parse_code(Some(&json!(" 42 "))).unwrap(), 42);
        assert!(matches!(parse_code(None), Err(ResolveError::Validation(_))));
        assert!(matches!(parse_code(Some(&json!(""))), Err(ResolveError::Validation(_))));
        assert!(matches!(parse_code(Some(&json!("12a"))), Err(ResolveError::Validation(_))));
        assert!(matches!(parse_code(Some(&json!(-5))), Err(ResolveError::Validation(_))));
        assert!(matches!(parse_code(Some(&json!(1.5))), Err(ResolveError::Validation(_))));
    }

    #[actix_web::test]
    async fn first_scan_records_an_entry_and_rescan_is_too_soon() {
        let app = kiosk!(resolver(true));

        let (status, body) = scan!(app, json!({"code": "1061234567", "site_id": SITE}));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["kind"], "Entrada");
        assert_eq!(body["data"]["full_name"], "ANA PÉREZ");
        assert_eq!(body["data"]["role"], "NURSE");

        let (status, body) = scan!(app, json!({"code": 1061234567, "site_id": SITE}));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "info");
        assert!(body.get("data").is_none());
    }

    #[actix_web::test]
    async fn malformed_scans_are_rejected_before_lookup() {
        let app = kiosk!(resolver(true));

        let (status, body) = scan!(app, json!({"code": "abc", "site_id": SITE}));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "warning");
        assert!(body["message"].as_str().unwrap().contains("abc"));

        let (status, _) = scan!(app, json!({"code": "1061234567"}));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_code_site_and_inactive_employee() {
        let app = kiosk!(resolver(true));

        let (status, body) = scan!(app, json!({"code": "999", "site_id": SITE}));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");

        let (status, _) = scan!(app, json!({"code": "1061234567", "site_id": 77}));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let app = kiosk!(resolver(false));
        let (status, body) = scan!(app, json!({"code": "1061234567", "site_id": SITE}));
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["status"], "warning");
    }

    #[actix_web::test]
    async fn store_outage_is_a_server_error_envelope() {
        let store = FakeStore::default()
            .with_employee(employee(true))
            .with_site(SITE);
        store.unavailable.store(true, Ordering::SeqCst);
        let resolver = web::Data::new(Resolver::new(Arc::new(store), AttendancePolicy::default()));
        let app = kiosk!(resolver);

        let (status, body) = scan!(app, json!({"code": "1061234567", "site_id": SITE}));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert!(!body["message"].as_str().unwrap().contains("connection refused"));
    }

    #[test]
    fn page_window_clamps_and_never_overflows() {
        assert_eq!(page_window(None, None), (1, 20, 0));
        assert_eq!(page_window(Some(0), Some(500)), (1, 100, 0));
        assert_eq!(page_window(Some(3), Some(0)), (3, 1, 2));
        assert_eq!(
            page_window(Some(50_000_000), Some(100)),
            (50_000_000, 100, 4_999_999_900)
        );
        assert_eq!(
            page_window(Some(u32::MAX), Some(100)).2,
            u64::from(u32::MAX - 1) * 100
        );
    }

    #[test]
    fn listing_filter_follows_query() {
        let query = RecordQuery {
            page: None,
            per_page: None,
            employee_id: Some(3),
            site_id: None,
            kind: Some(EventKind::Exit),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            end_date: None,
            search: Some("  ".to_string()),
        };

        let filter = record_filter(&query);
        assert_eq!(
            filter.where_clause(),
            "WHERE r.employee_id = ? AND r.kind = ? AND DATE(r.recorded_at) >= ?"
        );
        assert_eq!(filter.values()[1], SqlValue::String("Salida".to_string()));
    }
}
