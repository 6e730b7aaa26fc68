use crate::config::{AttendancePolicy, AutoClosePolicy};
use crate::model::{
    attendance::{AttendanceEvent, EventKind, EventStatus},
    schedule::Schedule,
};
use chrono::{Datelike, Duration, NaiveDateTime, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Punctuality {
    pub status: EventStatus,
    pub offset_minutes: i64,
}

/// Entry when there is no history or the last event closed a session.
pub fn next_kind(last: Option<&AttendanceEvent>) -> EventKind {
    match last {
        Some(event) if event.kind == EventKind::Entry => EventKind::Exit,
        _ => EventKind::Entry,
    }
}

pub fn is_weekend(at: NaiveDateTime) -> bool {
    matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Schedule whose boundary for `kind` is closest to `at`, measured on `at`'s
/// date. The first schedule wins a tie.
pub fn nearest_schedule(
    schedules: &[Schedule],
    kind: EventKind,
    at: NaiveDateTime,
) -> Option<&Schedule> {
    let mut best: Option<(&Schedule, Duration)> = None;

    for schedule in schedules {
        let boundary = match kind {
            EventKind::Entry => schedule.entry_time,
            EventKind::Exit => schedule.exit_time,
        };
        let distance = (at - at.date().and_time(boundary)).abs();

        if best.is_none_or(|(_, min)| distance < min) {
            best = Some((schedule, distance));
        }
    }

    best.map(|(schedule, _)| schedule)
}

/// Part of the day a stale Entry was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftWindow {
    Morning,
    Afternoon,
    Other,
}

impl AutoClosePolicy {
    pub fn window_of(&self, entry_at: NaiveDateTime) -> ShiftWindow {
        let time = entry_at.time();
        if time >= self.morning_start && time < self.afternoon_start {
            ShiftWindow::Morning
        } else if time >= self.afternoon_start && time < self.afternoon_end {
            ShiftWindow::Afternoon
        } else {
            ShiftWindow::Other
        }
    }

    /// Timestamp of the synthetic Exit closing an Entry recorded at `entry_at`.
    pub fn exit_for(&self, entry_at: NaiveDateTime) -> NaiveDateTime {
        match self.window_of(entry_at) {
            ShiftWindow::Afternoon => entry_at.date().and_time(self.afternoon_fixed_exit),
            ShiftWindow::Morning | ShiftWindow::Other => entry_at + self.shift_length,
        }
    }
}

impl AttendancePolicy {
    pub fn is_stale(&self, entry: &AttendanceEvent, now: NaiveDateTime) -> bool {
        now - entry.recorded_at > self.stale_entry
    }

    pub fn is_too_soon(&self, entry: &AttendanceEvent, now: NaiveDateTime) -> bool {
        now - entry.recorded_at < self.min_interval
    }

    /// Synthetic Exit timestamp, kept between the Entry and `now` so history
    /// stays ordered.
    pub fn auto_close_at(&self, entry: &AttendanceEvent, now: NaiveDateTime) -> NaiveDateTime {
        self.auto_close
            .exit_for(entry.recorded_at)
            .min(now)
            .max(entry.recorded_at)
    }

    /// Classifies an event recorded at `at` against the employee schedules.
    /// `matching_entry` is the Entry an Exit closes; an Exit without one is not
    /// evaluated.
    pub fn evaluate(
        &self,
        kind: EventKind,
        at: NaiveDateTime,
        schedules: &[Schedule],
        matching_entry: Option<NaiveDateTime>,
    ) -> Option<Punctuality> {
        if self.skip_weekends && is_weekend(at) {
            return None;
        }
        let schedule = nearest_schedule(schedules, kind, at)?;

        match kind {
            EventKind::Entry => {
                let late = at - at.date().and_time(schedule.entry_time);
                (late > self.tolerance).then(|| Punctuality {
                    status: EventStatus::Late,
                    offset_minutes: late.num_minutes(),
                })
            }
            EventKind::Exit => {
                let entry_at = matching_entry?;
                let mut scheduled_exit = entry_at.date().and_time(schedule.exit_time);
                if schedule.crosses_midnight() {
                    scheduled_exit += Duration::days(1);
                }

                let early = scheduled_exit - at;
                (early > self.tolerance).then(|| Punctuality {
                    status: EventStatus::Early,
                    offset_minutes: early.num_minutes(),
                })
            }
        }
    }
}
