//! Integration specifications for the contest entry lifecycle.
//!
//! Scenarios run against a file-backed SQLite database through the public service facade
//! and HTTP router, covering registration, bracket edits, out-of-band locking and scoring,
//! and the deadline cut-off.

mod common {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use bracket_pool::config::ContestConfig;
    use bracket_pool::contest::entries::{EntryService, Registration};
    use bracket_pool::contest::Clock;
    use bracket_pool::storage::{self, SqliteEntryRepository};

    pub(super) struct SteppingClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl SteppingClock {
        pub(super) fn new() -> Self {
            Self {
                now: Mutex::new(Utc.with_ymd_and_hms(2026, 2, 20, 15, 30, 0).unwrap()),
            }
        }

        pub(super) fn jump_to(&self, now: DateTime<Utc>) {
            *self.now.lock().expect("clock mutex poisoned") = now;
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut guard = self.now.lock().expect("clock mutex poisoned");
            let current = *guard;
            *guard = current + Duration::milliseconds(250);
            current
        }
    }

    pub(super) fn contest() -> ContestConfig {
        ContestConfig::parse("2026-03-19T00:00", "America/New_York", "stevens.edu")
            .expect("contest config parses")
    }

    pub(super) fn service_at(
        path: &Path,
        clock: Arc<SteppingClock>,
    ) -> (
        EntryService<SqliteEntryRepository, SteppingClock>,
        Arc<SqliteEntryRepository>,
    ) {
        let conn = storage::open_file(path).expect("database opens");
        let repository = Arc::new(SqliteEntryRepository::new(conn));
        let service = EntryService::new(repository.clone(), clock, &contest());
        (service, repository)
    }

    pub(super) fn registration(name: &str, email: &str, username: Option<&str>) -> Registration {
        Registration {
            name: name.to_string(),
            email: email.to_string(),
            username: username.map(str::to_string),
        }
    }
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use bracket_pool::contest::entries::{entry_router, EntryRepository, EntryServiceError};
use common::*;
use serde_json::{json, Value};
use tower::ServiceExt;

#[test]
fn contest_season_end_to_end() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("bracket.db");
    let clock = Arc::new(SteppingClock::new());
    let (service, repository) = service_at(&path, clock.clone());

    let ada = service
        .register(registration("Ada", "Ada@Stevens.edu", Some("countess")))
        .expect("ada registers");
    let bob = service
        .register(registration("Bob", "bob@stevens.edu", None))
        .expect("bob registers");
    let cy = service
        .register(registration("Cy", "cy@stevens.edu", Some("  ")))
        .expect("cy registers");
    assert!(cy.username.is_none());

    let picks = json!({ "south": ["houston", "duke"], "champion": "houston" });
    let picks = picks.as_object().cloned().expect("object");
    service
        .submit_bracket(ada.id, picks.clone())
        .expect("ada submits");

    // The scoring process locks everyone at tip-off and posts scores later.
    assert_eq!(repository.lock_all().expect("lock all"), 3);
    repository.set_score(ada.id, 10).expect("score ada");
    repository.set_score(bob.id, 20).expect("score bob");
    repository.set_score(cy.id, 10).expect("score cy");

    match service.submit_bracket(bob.id, picks.clone()) {
        Err(EntryServiceError::Locked) => {}
        other => panic!("expected locked entry, got {other:?}"),
    }

    let standings: Vec<String> = service
        .leaderboard()
        .expect("leaderboard")
        .into_iter()
        .map(|row| row.name)
        .collect();
    assert_eq!(standings, vec!["Bob", "Ada", "Cy"]);

    clock.jump_to(contest().window.deadline_utc() + chrono::Duration::hours(1));
    match service.register(registration("Dee", "dee@stevens.edu", None)) {
        Err(EntryServiceError::RegistrationClosed) => {}
        other => panic!("expected closed registration, got {other:?}"),
    }

    drop(service);
    drop(repository);

    let (reopened, _) = service_at(&path, clock);
    let stored = reopened.get(ada.id).expect("ada persisted");
    assert_eq!(stored.email, "ada@stevens.edu");
    assert_eq!(stored.bracket, Some(picks));
    assert!(stored.locked);
    assert_eq!(stored.score, 10);
    assert_eq!(stored.created_at, ada.created_at);
}

#[tokio::test]
async fn router_serves_registration_and_listing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let clock = Arc::new(SteppingClock::new());
    let (service, _) = service_at(&dir.path().join("bracket.db"), clock);
    let router = entry_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(
            Request::post("/entries")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({ "name": "Ada", "email": "ada@stevens.edu" }))
                        .expect("serializable"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::get("/entries")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload: Value = serde_json::from_slice(&body).expect("json payload");
    assert_eq!(
        payload,
        json!([{ "id": 1, "name": "Ada", "username": null, "bracket": {}, "locked": false }])
    );
}
