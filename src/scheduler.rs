//! Weekday wall-clock scheduler
//!
//! [`Scheduler::start`] runs the job once straight away and then blocks
//! forever, firing at the configured local time on the configured
//! weekdays. Firings run to completion on the calling thread, so two
//! firings can never overlap.

use crate::config::ScheduleConfig;
use crate::Result;
use chrono::{DateTime, Datelike, Days, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use std::time::Duration;
use tracing::{debug, info};

/// Longest single sleep; keeps wake-ups honest across suspend or clock jumps
const MAX_SLEEP_SLICE: Duration = Duration::from_secs(60);

/// Time source and timer used by the scheduler
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    /// Block until `deadline` has passed
    fn sleep_until(&self, deadline: DateTime<Utc>);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn sleep_until(&self, deadline: DateTime<Utc>) {
        (**self).sleep_until(deadline);
    }
}

/// Wall clock backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep_until(&self, deadline: DateTime<Utc>) {
        loop {
            let remaining = match (deadline - self.now()).to_std() {
                Ok(remaining) if !remaining.is_zero() => remaining,
                _ => return,
            };
            std::thread::sleep(remaining.min(MAX_SLEEP_SLICE));
        }
    }
}

/// Local time of day on a set of weekdays in one time zone
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub at: NaiveTime,
    pub timezone: Tz,
    pub weekdays: Vec<Weekday>,
}

impl Schedule {
    pub fn new(at: NaiveTime, timezone: Tz, weekdays: Vec<Weekday>) -> Self {
        Self {
            at,
            timezone,
            weekdays,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Ok(Self::new(
            config.wake_time()?,
            config.timezone()?,
            config.weekdays()?,
        ))
    }

    /// First firing strictly after `now`.
    ///
    /// Local times skipped by a DST transition are not fired that day;
    /// repeated local times fire at the earlier instant.
    #[must_use]
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.weekdays.is_empty() {
            return None;
        }

        let today = now.with_timezone(&self.timezone).date_naive();

        // Two weeks always covers the next enabled weekday, even when a
        // DST gap swallows one occurrence.
        (0..=14u64)
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .filter(|date| self.weekdays.contains(&date.weekday()))
            .filter_map(|date| {
                self.timezone
                    .from_local_datetime(&date.and_time(self.at))
                    .earliest()
            })
            .map(|local| local.with_timezone(&Utc))
            .find(|candidate| *candidate > now)
    }
}

/// Drives a job from a [`Schedule`] using an injected [`Clock`]
pub struct Scheduler<C: Clock> {
    schedule: Schedule,
    clock: C,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(schedule: Schedule, clock: C) -> Self {
        Self { schedule, clock }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Wait for the next firing and run `job` once.
    ///
    /// Returns the instant the firing was scheduled for, or `None` when the
    /// schedule never fires.
    pub fn tick<F: FnMut()>(&self, job: &mut F) -> Option<DateTime<Utc>> {
        let next = self.schedule.next_after(self.clock.now())?;
        info!(
            "Next firing at {} ({})",
            next.with_timezone(&self.schedule.timezone),
            next
        );

        self.clock.sleep_until(next);
        debug!("Firing scheduled for {}", next);
        job();

        Some(next)
    }

    /// Run `job` immediately, then on every scheduled firing until the
    /// process is terminated
    pub fn start<F: FnMut()>(&self, mut job: F) -> ! {
        info!("Running startup firing");
        job();

        loop {
            if self.tick(&mut job).is_none() {
                // Unreachable with a validated config; idle rather than spin.
                self.clock
                    .sleep_until(self.clock.now() + chrono::Duration::days(1));
            }
        }
    }
}
