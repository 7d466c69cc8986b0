use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::ContestConfig;
use crate::contest::entries::domain::{BracketDocument, Entry, EntryId, NewEntry, Registration};
use crate::contest::entries::repository::{EntryRepository, RepositoryError};
use crate::contest::entries::{entry_router, EntryService};
use crate::contest::window::Clock;
use crate::storage::SqliteEntryRepository;

pub(super) fn contest_config() -> ContestConfig {
    ContestConfig::parse("2026-03-19T00:00", "America/New_York", "stevens.edu")
        .expect("contest config parses")
}

/// Two and a half weeks before entry closes.
pub(super) fn before_deadline() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub(super) fn deadline() -> DateTime<Utc> {
    contest_config().window.deadline_utc()
}

/// Advances one second per reading so creation timestamps are distinct and ordered.
pub(super) struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub(super) fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(super) fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock mutex poisoned") = now;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        let current = *guard;
        *guard = current + Duration::seconds(1);
        current
    }
}

pub(super) type TestService = EntryService<SqliteEntryRepository, TestClock>;

pub(super) fn build_service() -> (TestService, Arc<SqliteEntryRepository>, Arc<TestClock>) {
    let repository =
        Arc::new(SqliteEntryRepository::open_in_memory().expect("in-memory database opens"));
    let clock = Arc::new(TestClock::starting_at(before_deadline()));
    let service = EntryService::new(repository.clone(), clock.clone(), &contest_config());
    (service, repository, clock)
}

pub(super) fn registration(name: &str, email: &str) -> Registration {
    Registration {
        name: name.to_string(),
        email: email.to_string(),
        username: None,
    }
}

pub(super) fn document(value: Value) -> BracketDocument {
    value.as_object().cloned().expect("object literal")
}

pub(super) fn entry_router_with_service(service: TestService) -> axum::Router {
    entry_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct UnavailableRepository;

impl EntryRepository for UnavailableRepository {
    fn insert(&self, _entry: NewEntry) -> Result<Entry, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: EntryId) -> Result<Option<Entry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_by_creation(&self) -> Result<Vec<Entry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn ranked(&self) -> Result<Vec<Entry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn replace_bracket(
        &self,
        _id: EntryId,
        _bracket: &BracketDocument,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn set_score(&self, _id: EntryId, _score: i64) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn lock(&self, _id: EntryId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn lock_all(&self) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Holds `list_by_creation` until the test releases it, as a busy SQLite lock would.
pub(super) struct GatedRepository {
    inner: SqliteEntryRepository,
    gate: Mutex<Receiver<()>>,
}

impl GatedRepository {
    pub(super) fn new() -> (Self, Sender<()>) {
        let (release, gate) = mpsc::channel();
        let repository = Self {
            inner: SqliteEntryRepository::open_in_memory().expect("in-memory database opens"),
            gate: Mutex::new(gate),
        };
        (repository, release)
    }
}

impl EntryRepository for GatedRepository {
    fn insert(&self, entry: NewEntry) -> Result<Entry, RepositoryError> {
        self.inner.insert(entry)
    }

    fn fetch(&self, id: EntryId) -> Result<Option<Entry>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list_by_creation(&self) -> Result<Vec<Entry>, RepositoryError> {
        self.gate
            .lock()
            .expect("gate mutex poisoned")
            .recv_timeout(StdDuration::from_secs(2))
            .map_err(|_| RepositoryError::Unavailable("gate never opened".to_string()))?;
        self.inner.list_by_creation()
    }

    fn ranked(&self) -> Result<Vec<Entry>, RepositoryError> {
        self.inner.ranked()
    }

    fn replace_bracket(
        &self,
        id: EntryId,
        bracket: &BracketDocument,
    ) -> Result<(), RepositoryError> {
        self.inner.replace_bracket(id, bracket)
    }

    fn set_score(&self, id: EntryId, score: i64) -> Result<(), RepositoryError> {
        self.inner.set_score(id, score)
    }

    fn lock(&self, id: EntryId) -> Result<(), RepositoryError> {
        self.inner.lock(id)
    }

    fn lock_all(&self) -> Result<usize, RepositoryError> {
        self.inner.lock_all()
    }
}
