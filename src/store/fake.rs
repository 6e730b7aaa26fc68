use super::{Directory, RecordStore, ScheduleStore};
use crate::model::{
    attendance::{AttendanceEvent, EventKind, EventStatus, NewEvent},
    employee::Employee,
    schedule::Schedule,
    site::Site,
};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory store for resolver and handler tests.
#[derive(Default)]
pub struct FakeStore {
    pub employees: Mutex<Vec<Employee>>,
    pub sites: Mutex<Vec<Site>>,
    pub schedules: Mutex<HashMap<u64, Vec<Schedule>>>,
    pub events: Mutex<Vec<AttendanceEvent>>,
    /// Makes every insert tagged AutoClosed fail.
    pub fail_auto_close: AtomicBool,
    /// Makes every punctuality update fail.
    pub fail_punctuality: AtomicBool,
    /// Makes every read fail, as if the database were down.
    pub unavailable: AtomicBool,
}

impl FakeStore {
    pub fn with_employee(self, employee: Employee) -> Self {
        self.employees.lock().unwrap().push(employee);
        self
    }

    pub fn with_site(self, site_id: u64) -> Self {
        self.sites.lock().unwrap().push(Site {
            id: site_id,
            location: Some(format!("Sede {site_id}")),
            city: None,
        });
        self
    }

    pub fn with_schedule(self, employee_id: u64, schedule: Schedule) -> Self {
        self.schedules
            .lock()
            .unwrap()
            .entry(employee_id)
            .or_default()
            .push(schedule);
        self
    }

    pub fn with_event(self, event: NewEvent) -> Self {
        let mut events = self.events.lock().unwrap();
        let id = events.len() as u64 + 1;
        events.push(AttendanceEvent {
            id,
            employee_id: event.employee_id,
            site_id: event.site_id,
            recorded_at: event.recorded_at,
            kind: event.kind,
            status: event.status,
            offset_minutes: None,
        });
        drop(events);
        self
    }

    /// Events of one employee in timestamp order.
    pub fn events_of(&self, employee_id: u64) -> Vec<AttendanceEvent> {
        let mut events: Vec<_> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.employee_id == employee_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.recorded_at, e.id));
        events
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        Ok(())
    }

    fn latest(&self, employee_id: u64, kind: Option<EventKind>) -> Option<AttendanceEvent> {
        self.events_of(employee_id)
            .into_iter()
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .next_back()
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn find_latest_event(&self, employee_id: u64) -> Result<Option<AttendanceEvent>> {
        self.check_available()?;
        let latest = self.latest(employee_id, None);
        // hand control back between the read and the caller's write
        actix_web::rt::task::yield_now().await;
        Ok(latest)
    }

    async fn find_latest_entry(&self, employee_id: u64) -> Result<Option<AttendanceEvent>> {
        self.check_available()?;
        Ok(self.latest(employee_id, Some(EventKind::Entry)))
    }

    async fn create_event(&self, event: NewEvent) -> Result<AttendanceEvent> {
        self.check_available()?;
        if event.status == Some(EventStatus::AutoClosed)
            && self.fail_auto_close.load(Ordering::SeqCst)
        {
            bail!("site {} vanished", event.site_id);
        }

        let mut events = self.events.lock().unwrap();
        let created = AttendanceEvent {
            id: events.len() as u64 + 1,
            employee_id: event.employee_id,
            site_id: event.site_id,
            recorded_at: event.recorded_at,
            kind: event.kind,
            status: event.status,
            offset_minutes: None,
        };
        events.push(created.clone());
        Ok(created)
    }

    async fn set_punctuality(
        &self,
        event_id: u64,
        status: EventStatus,
        offset_minutes: i64,
    ) -> Result<()> {
        if self.fail_punctuality.load(Ordering::SeqCst) {
            bail!("lock wait timeout updating event {event_id}");
        }
        let mut events = self.events.lock().unwrap();
        match events.iter_mut().find(|e| e.id == event_id) {
            Some(event) => {
                event.status = Some(status);
                event.offset_minutes = Some(offset_minutes);
                Ok(())
            }
            None => bail!("event {event_id} does not exist"),
        }
    }
}

#[async_trait]
impl ScheduleStore for FakeStore {
    async fn schedules_for(&self, employee_id: u64) -> Result<Vec<Schedule>> {
        self.check_available()?;
        let mut schedules = self
            .schedules
            .lock()
            .unwrap()
            .get(&employee_id)
            .cloned()
            .unwrap_or_default();
        schedules.sort_by_key(|s| s.id);
        Ok(schedules)
    }
}

#[async_trait]
impl Directory for FakeStore {
    async fn get_employee(&self, employee_id: u64) -> Result<Option<Employee>> {
        self.check_available()?;
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == employee_id)
            .cloned())
    }

    async fn find_employee_by_code(&self, document_number: u64) -> Result<Option<Employee>> {
        self.check_available()?;
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.document_number == document_number)
            .cloned())
    }

    async fn get_site(&self, site_id: u64) -> Result<Option<Site>> {
        self.check_available()?;
        Ok(self.sites.lock().unwrap().iter().find(|s| s.id == site_id).cloned())
    }
}
