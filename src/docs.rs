use crate::api::attendance::{RecordDisplay, RecordListResponse, RecordRequest, RecordRow};
use crate::api::reply::{Reply, ReplyStatus};
use crate::model::attendance::{AttendanceEvent, EventKind, EventStatus};
use crate::model::employee::Employee;
use crate::model::schedule::Schedule;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Kiosk API",
        version = "1.0.0",
        description = r#"
## Kiosk Attendance Service

Employees scan their card at a site kiosk; each scan becomes an **Entrada** (entry)
or a **Salida** (exit).

### Rules
- Entry and exit alternate per employee
- An entry left open past the staleness threshold is closed automatically
- An exit too close to its entry is refused
- Late entries and early exits are flagged against the employee's schedules

### Response Format
Kiosk responses use a `{status, message, data}` envelope where `status` is one of
`success`, `info`, `warning` or `error`. Listing endpoints are paginated.
"#,
    ),
    paths(
        crate::api::attendance::record_attendance,
        crate::api::attendance::list_records,
        crate::api::attendance::daily_records,
        crate::api::attendance::site_record_count
    ),
    components(
        schemas(
            Reply,
            ReplyStatus,
            RecordRequest,
            RecordDisplay,
            RecordRow,
            RecordListResponse,
            AttendanceEvent,
            EventKind,
            EventStatus,
            Employee,
            Schedule
        )
    ),
    tags(
        (name = "Kiosk", description = "Card scans from site kiosks"),
        (name = "Attendance", description = "Attendance record queries"),
    )
)]
pub struct ApiDoc;
