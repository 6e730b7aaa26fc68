use crate::model::{
    attendance::{AttendanceEvent, EventStatus, NewEvent},
    employee::Employee,
    schedule::Schedule,
    site::Site,
};
use anyhow::Result;
use async_trait::async_trait;

#[cfg(test)]
pub mod fake;
pub mod mysql;

/// Attendance history of employees.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Most recent event by timestamp across the whole history.
    async fn find_latest_event(&self, employee_id: u64) -> Result<Option<AttendanceEvent>>;

    /// Most recent Entry event, used to anchor the scheduled exit of a shift.
    async fn find_latest_entry(&self, employee_id: u64) -> Result<Option<AttendanceEvent>>;

    async fn create_event(&self, event: NewEvent) -> Result<AttendanceEvent>;

    async fn set_punctuality(
        &self,
        event_id: u64,
        status: EventStatus,
        offset_minutes: i64,
    ) -> Result<()>;
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Schedules the employee belongs to, ordered by schedule id.
    async fn schedules_for(&self, employee_id: u64) -> Result<Vec<Schedule>>;
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn get_employee(&self, employee_id: u64) -> Result<Option<Employee>>;

    async fn find_employee_by_code(&self, document_number: u64) -> Result<Option<Employee>>;

    async fn get_site(&self, site_id: u64) -> Result<Option<Site>>;
}

/// Everything the resolver reads from or writes to.
pub trait AttendanceStore: RecordStore + ScheduleStore + Directory + 'static {}

impl<T> AttendanceStore for T where T: RecordStore + ScheduleStore + Directory + 'static {}
