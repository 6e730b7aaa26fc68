use anyhow::{Context, anyhow};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

/// Kind of a kiosk scan. Stored as "Entrada" / "Salida".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr, ToSchema,
)]
pub enum EventKind {
    #[strum(serialize = "Entrada")]
    #[serde(rename = "Entrada")]
    Entry,
    #[strum(serialize = "Salida")]
    #[serde(rename = "Salida")]
    Exit,
}

/// Punctuality outcome attached to an event. `None` on the event means on time
/// or not evaluated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr, ToSchema,
)]
pub enum EventStatus {
    #[strum(serialize = "Normal")]
    #[serde(rename = "Normal")]
    Normal,
    #[strum(serialize = "Con retraso")]
    #[serde(rename = "Con retraso")]
    Late,
    #[strum(serialize = "Con anticipación")]
    #[serde(rename = "Con anticipación")]
    Early,
    #[strum(serialize = "Automática")]
    #[serde(rename = "Automática")]
    AutoClosed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceEvent {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 2)]
    pub site_id: u64,
    #[schema(example = "2026-01-05T08:11:00", format = "date-time", value_type = String)]
    pub recorded_at: NaiveDateTime,
    pub kind: EventKind,
    #[schema(nullable = true)]
    pub status: Option<EventStatus>,
    #[schema(example = 11, nullable = true)]
    pub offset_minutes: Option<i64>,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        self.into()
    }
}

impl EventStatus {
    pub fn label(self) -> &'static str {
        self.into()
    }
}

/// Event about to be written. Punctuality fields are only set for synthetic
/// closures; regular scans are backfilled after insert.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub employee_id: u64,
    pub site_id: u64,
    pub recorded_at: NaiveDateTime,
    pub kind: EventKind,
    pub status: Option<EventStatus>,
}

// raw row, string columns decoded through strum
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceEventRow {
    pub id: u64,
    pub employee_id: u64,
    pub site_id: u64,
    pub recorded_at: NaiveDateTime,
    pub kind: String,
    pub status: Option<String>,
    pub offset_minutes: Option<i64>,
}

impl TryFrom<AttendanceEventRow> for AttendanceEvent {
    type Error = anyhow::Error;

    fn try_from(row: AttendanceEventRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse::<EventKind>()
            .map_err(|_| anyhow!("unknown event kind {:?} on event {}", row.kind, row.id))?;

        let status = row
            .status
            .as_deref()
            .map(str::parse::<EventStatus>)
            .transpose()
            .with_context(|| format!("unknown event status on event {}", row.id))?;

        Ok(AttendanceEvent {
            id: row.id,
            employee_id: row.employee_id,
            site_id: row.site_id,
            recorded_at: row.recorded_at,
            kind,
            status,
            offset_minutes: row.offset_minutes,
        })
    }
}
