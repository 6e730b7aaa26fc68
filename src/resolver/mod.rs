pub mod error;
pub mod policy;

use crate::config::AttendancePolicy;
use crate::model::{
    attendance::{AttendanceEvent, EventKind, EventStatus, NewEvent},
    employee::Employee,
};
use crate::store::AttendanceStore;
use crate::utils::employee_locks::EmployeeLocks;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub use error::{ErrorClass, ResolveError};
use policy::{Punctuality, next_kind};

/// Outcome of a successful scan.
#[derive(Debug)]
pub struct Resolution {
    pub employee: Employee,
    pub event: AttendanceEvent,
    /// Synthetic Exit written to close a stale Entry before this event.
    pub auto_closed: Option<AttendanceEvent>,
}

/// Turns kiosk scans into alternating Entry/Exit events.
pub struct Resolver {
    store: Arc<dyn AttendanceStore>,
    policy: AttendancePolicy,
    locks: EmployeeLocks,
}

impl Resolver {
    pub fn new(store: Arc<dyn AttendanceStore>, policy: AttendancePolicy) -> Self {
        Self {
            store,
            policy,
            locks: EmployeeLocks::default(),
        }
    }

    /// Employee printed on a kiosk code.
    pub async fn employee_by_code(&self, code: u64) -> Result<Employee, ResolveError> {
        self.store
            .find_employee_by_code(code)
            .await?
            .ok_or(ResolveError::UnknownCode(code))
    }

    /// Registers a scan of `employee_id` at `site_id` happening at `now`.
    ///
    /// Nothing is written when the employee is missing or inactive, the site
    /// is missing, or an Exit comes before the minimum interval. Scans of the
    /// same employee are serialized so the alternation holds under
    /// concurrent requests.
    #[instrument(name = "resolve_attendance", skip(self), fields(kind = tracing::field::Empty))]
    pub async fn resolve(
        &self,
        employee_id: u64,
        site_id: u64,
        now: NaiveDateTime,
    ) -> Result<Resolution, ResolveError> {
        let employee = self
            .store
            .get_employee(employee_id)
            .await?
            .ok_or(ResolveError::EmployeeNotFound(employee_id))?;

        if !employee.active {
            warn!(document = employee.document_number, "Scan from inactive employee");
            return Err(ResolveError::Inactive(employee_id));
        }

        let Some(site) = self.store.get_site(site_id).await? else {
            warn!("Scan for unknown site");
            return Err(ResolveError::InvalidSite(site_id));
        };

        let _guard = self.locks.acquire(employee_id).await;

        let last = self.store.find_latest_event(employee_id).await?;
        let mut kind = next_kind(last.as_ref());
        let mut auto_closed = None;

        if let Some(entry) = last.as_ref().filter(|e| e.kind == EventKind::Entry) {
            if self.policy.is_stale(entry, now) {
                auto_closed = self.close_stale_entry(entry, site_id, now).await;
                kind = EventKind::Entry;
            } else if self.policy.is_too_soon(entry, now) {
                let elapsed_minutes = (now - entry.recorded_at).num_minutes();
                info!(elapsed_minutes, "Exit rejected, minimum interval not met");
                return Err(ResolveError::TooSoon { elapsed_minutes });
            }
        }
        tracing::Span::current().record("kind", kind.label());

        let mut event = self
            .store
            .create_event(NewEvent {
                employee_id,
                site_id,
                recorded_at: now,
                kind,
                status: None,
            })
            .await?;

        // the event is already stored, a classification failure leaves it unclassified
        match self.classify(&event).await {
            Ok(Some(punctuality)) => {
                event.status = Some(punctuality.status);
                event.offset_minutes = Some(punctuality.offset_minutes);
            }
            Ok(None) => {}
            Err(e) => error!(error = ?e, event_id = event.id, "Punctuality could not be stored"),
        }

        info!(
            event_id = event.id,
            status = event.status.map(EventStatus::label),
            offset_minutes = event.offset_minutes,
            site = site.location.as_deref().unwrap_or("-"),
            "Attendance recorded"
        );

        Ok(Resolution {
            employee,
            event,
            auto_closed,
        })
    }

    /// Best effort: a failure is logged and the scan goes on as a new Entry.
    async fn close_stale_entry(
        &self,
        entry: &AttendanceEvent,
        site_id: u64,
        now: NaiveDateTime,
    ) -> Option<AttendanceEvent> {
        let closes_at = self.policy.auto_close_at(entry, now);
        let window = self.policy.auto_close.window_of(entry.recorded_at);

        let closing = NewEvent {
            employee_id: entry.employee_id,
            site_id,
            recorded_at: closes_at,
            kind: EventKind::Exit,
            status: Some(EventStatus::AutoClosed),
        };

        match self.store.create_event(closing).await {
            Ok(exit) => {
                warn!(
                    entry_id = entry.id,
                    entry_at = %entry.recorded_at,
                    closes_at = %closes_at,
                    ?window,
                    "Stale entry closed automatically"
                );
                Some(exit)
            }
            Err(e) => {
                error!(error = %e, entry_id = entry.id, "Automatic exit could not be written");
                None
            }
        }
    }

    /// Evaluates and stores the punctuality of a freshly written event.
    async fn classify(&self, event: &AttendanceEvent) -> anyhow::Result<Option<Punctuality>> {
        let schedules = self.store.schedules_for(event.employee_id).await?;
        if schedules.is_empty() {
            return Ok(None);
        }

        let matching_entry = match event.kind {
            EventKind::Entry => None,
            EventKind::Exit => self
                .store
                .find_latest_entry(event.employee_id)
                .await?
                .map(|entry| entry.recorded_at),
        };

        let evaluated = self
            .policy
            .evaluate(event.kind, event.recorded_at, &schedules, matching_entry);
        let Some(punctuality) = evaluated else {
            return Ok(None);
        };

        self.store
            .set_punctuality(event.id, punctuality.status, punctuality.offset_minutes)
            .await?;
        Ok(Some(punctuality))
    }
}
