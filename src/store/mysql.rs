use super::{Directory, RecordStore, ScheduleStore};
use crate::model::{
    attendance::{AttendanceEvent, AttendanceEventRow, EventKind, EventStatus, NewEvent},
    employee::Employee,
    schedule::Schedule,
    site::Site,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Timelike;
use sqlx::MySqlPool;

const EVENT_COLUMNS: &str =
    "id, employee_id, site_id, recorded_at, kind, status, offset_minutes";

const EMPLOYEE_COLUMNS: &str = "id, document_number, first_name, middle_name, last_name, \
     second_last_name, role_title, active";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn latest_event_where(
        &self,
        employee_id: u64,
        kind: Option<EventKind>,
    ) -> Result<Option<AttendanceEvent>> {
        let kind_clause = if kind.is_some() { "AND kind = ?" } else { "" };
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM attendance_events \
             WHERE employee_id = ? {kind_clause} \
             ORDER BY recorded_at DESC, id DESC LIMIT 1"
        );

        let mut query = sqlx::query_as::<_, AttendanceEventRow>(&sql).bind(employee_id);
        if let Some(kind) = kind {
            query = query.bind(kind.label());
        }

        query
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("loading latest event of employee {employee_id}"))?
            .map(AttendanceEvent::try_from)
            .transpose()
    }
}

#[async_trait]
impl RecordStore for MySqlStore {
    async fn find_latest_event(&self, employee_id: u64) -> Result<Option<AttendanceEvent>> {
        self.latest_event_where(employee_id, None).await
    }

    async fn find_latest_entry(&self, employee_id: u64) -> Result<Option<AttendanceEvent>> {
        self.latest_event_where(employee_id, Some(EventKind::Entry)).await
    }

    async fn create_event(&self, event: NewEvent) -> Result<AttendanceEvent> {
        // DATETIME column keeps whole seconds
        let recorded_at = event.recorded_at.with_nanosecond(0).unwrap_or(event.recorded_at);

        let result = sqlx::query(
            r#"
            INSERT INTO attendance_events (employee_id, site_id, recorded_at, kind, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.employee_id)
        .bind(event.site_id)
        .bind(recorded_at)
        .bind(event.kind.label())
        .bind(event.status.map(EventStatus::label))
        .execute(&self.pool)
        .await
        .with_context(|| format!("inserting {} for employee {}", event.kind, event.employee_id))?;

        Ok(AttendanceEvent {
            id: result.last_insert_id(),
            employee_id: event.employee_id,
            site_id: event.site_id,
            recorded_at,
            kind: event.kind,
            status: event.status,
            offset_minutes: None,
        })
    }

    async fn set_punctuality(
        &self,
        event_id: u64,
        status: EventStatus,
        offset_minutes: i64,
    ) -> Result<()> {
        sqlx::query("UPDATE attendance_events SET status = ?, offset_minutes = ? WHERE id = ?")
            .bind(status.label())
            .bind(offset_minutes)
            .bind(event_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("storing punctuality of event {event_id}"))?;
        Ok(())
    }
}

#[async_trait]
impl ScheduleStore for MySqlStore {
    async fn schedules_for(&self, employee_id: u64) -> Result<Vec<Schedule>> {
        sqlx::query_as::<_, Schedule>(
            r#"
            SELECT s.id, s.entry_time, s.exit_time
            FROM schedules s
            JOIN schedule_members m ON m.schedule_id = s.id
            WHERE m.employee_id = ?
            ORDER BY s.id
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("loading schedules of employee {employee_id}"))
    }
}

#[async_trait]
impl Directory for MySqlStore {
    async fn get_employee(&self, employee_id: u64) -> Result<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, Employee>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("loading employee {employee_id}"))
    }

    async fn find_employee_by_code(&self, document_number: u64) -> Result<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE document_number = ?");
        sqlx::query_as::<_, Employee>(&sql)
            .bind(document_number)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("looking up employee code {document_number}"))
    }

    async fn get_site(&self, site_id: u64) -> Result<Option<Site>> {
        sqlx::query_as::<_, Site>("SELECT id, location, city FROM sites WHERE id = ?")
            .bind(site_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("loading site {site_id}"))
    }
}
