use std::sync::Arc;

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request, State,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use super::domain::{BracketDocument, EntryId, Registration};
use super::policy::PolicyViolation;
use super::repository::{EntryRepository, RepositoryError};
use super::service::{EntryService, EntryServiceError};
use crate::contest::window::Clock;

type SharedService<R, C> = Arc<EntryService<R, C>>;

/// Router builder exposing the contest endpoints consumed by the bracket frontend.
pub fn entry_router<R, C>(service: SharedService<R, C>) -> Router
where
    R: EntryRepository + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/", get(home_handler))
        .route(
            "/entries",
            post(register_handler::<R, C>).get(list_handler::<R, C>),
        )
        .route("/entries/:entry_id", get(detail_handler::<R, C>))
        .route("/view-bracket/:entry_id", get(view_bracket_handler::<R, C>))
        .route(
            "/entries/:entry_id/bracket",
            post(submit_bracket_handler::<R, C>),
        )
        .route("/leaderboard", get(leaderboard_handler::<R, C>))
        .with_state(service)
}

/// JSON body whose rejections use the same `{"detail": ...}` shape as contest errors.
#[derive(Debug)]
pub(crate) struct JsonBody<T>(pub(crate) T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// Numeric `:entry_id` path segment.
#[derive(Debug)]
pub(crate) struct EntryPath(pub(crate) i64);

#[async_trait]
impl<S> FromRequestParts<S> for EntryPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(entry_id)) => Ok(Self(entry_id)),
            Err(rejection) => Err(path_rejection(rejection)),
        }
    }
}

pub(crate) async fn home_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "Bracket app is running" }))
}

pub(crate) async fn register_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    JsonBody(registration): JsonBody<Registration>,
) -> Response
where
    R: EntryRepository + 'static,
    C: Clock + 'static,
{
    let outcome = blocking(service, move |service| {
        service
            .register(registration)
            .map(|entry| entry.registration_view())
    })
    .await;
    respond(outcome)
}

pub(crate) async fn list_handler<R, C>(State(service): State<SharedService<R, C>>) -> Response
where
    R: EntryRepository + 'static,
    C: Clock + 'static,
{
    respond(blocking(service, |service| service.list()).await)
}

pub(crate) async fn detail_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    EntryPath(entry_id): EntryPath,
) -> Response
where
    R: EntryRepository + 'static,
    C: Clock + 'static,
{
    let outcome = blocking(service, move |service| {
        service.get(EntryId(entry_id)).map(|entry| entry.detail())
    })
    .await;
    respond(outcome)
}

pub(crate) async fn view_bracket_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    EntryPath(entry_id): EntryPath,
) -> Response
where
    R: EntryRepository + 'static,
    C: Clock + 'static,
{
    let outcome = blocking(service, move |service| {
        service.get(EntryId(entry_id)).map(|entry| entry.bracket_view())
    })
    .await;
    respond(outcome)
}

pub(crate) async fn submit_bracket_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    EntryPath(entry_id): EntryPath,
    JsonBody(bracket): JsonBody<BracketDocument>,
) -> Response
where
    R: EntryRepository + 'static,
    C: Clock + 'static,
{
    let outcome = blocking(service, move |service| {
        service.submit_bracket(EntryId(entry_id), bracket)
    })
    .await;
    respond(outcome)
}

pub(crate) async fn leaderboard_handler<R, C>(
    State(service): State<SharedService<R, C>>,
) -> Response
where
    R: EntryRepository + 'static,
    C: Clock + 'static,
{
    respond(blocking(service, |service| service.leaderboard()).await)
}

/// Runs a service call on the blocking pool; storage calls may wait on SQLite locks.
async fn blocking<R, C, T, F>(
    service: SharedService<R, C>,
    call: F,
) -> Result<T, EntryServiceError>
where
    R: EntryRepository + 'static,
    C: Clock + 'static,
    T: Send + 'static,
    F: FnOnce(&EntryService<R, C>) -> Result<T, EntryServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(service.as_ref()))
        .await
        .unwrap_or_else(|err| {
            Err(EntryServiceError::Repository(RepositoryError::Unavailable(
                format!("entry task failed: {err}"),
            )))
        })
}

fn respond<T: Serialize>(outcome: Result<T, EntryServiceError>) -> Response {
    match outcome {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn status_for(err: &EntryServiceError) -> StatusCode {
    match err {
        EntryServiceError::Policy(PolicyViolation::InvalidEmail(_))
        | EntryServiceError::Policy(PolicyViolation::ForbiddenDomain { .. }) => {
            StatusCode::BAD_REQUEST
        }
        EntryServiceError::RegistrationClosed
        | EntryServiceError::SubmissionsClosed
        | EntryServiceError::Locked => StatusCode::FORBIDDEN,
        EntryServiceError::DuplicateEmail => StatusCode::CONFLICT,
        EntryServiceError::NotFound => StatusCode::NOT_FOUND,
        EntryServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: EntryServiceError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, "entry request failed");
    }
    detail_response(status, err.to_string())
}

fn json_rejection(rejection: JsonRejection) -> Response {
    detail_response(rejection.status(), rejection.body_text())
}

fn path_rejection(rejection: PathRejection) -> Response {
    detail_response(rejection.status(), rejection.body_text())
}

fn detail_response(status: StatusCode, detail: String) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}
