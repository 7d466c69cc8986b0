use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Fixed instant after which registration and bracket edits are rejected.
///
/// The deadline is kept in its civil time zone so logs and error messages can show the
/// local wall-clock time, while comparisons happen on the underlying instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionWindow {
    deadline: DateTime<Tz>,
}

impl SubmissionWindow {
    pub fn new(deadline: DateTime<Tz>) -> Self {
        Self { deadline }
    }

    /// Resolve a local wall-clock time in `zone`. Returns `None` when the time falls in a
    /// DST gap; an ambiguous time resolves to its earlier instant.
    pub fn from_local(local: NaiveDateTime, zone: Tz) -> Option<Self> {
        zone.from_local_datetime(&local).earliest().map(Self::new)
    }

    pub fn deadline(&self) -> DateTime<Tz> {
        self.deadline
    }

    pub fn deadline_utc(&self) -> DateTime<Utc> {
        self.deadline.with_timezone(&Utc)
    }

    /// Open strictly before the deadline; the deadline instant itself is closed.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        now < self.deadline_utc()
    }
}

/// Source of "now" for deadline checks and creation timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock used by the running service.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
