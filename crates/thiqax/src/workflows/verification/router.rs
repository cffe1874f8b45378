use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::domain::{
    Actor, ApplicationId, ApplicationStatus, DocumentId, JobId, ProfileId, Role, UserId,
};
use super::errors::IntegrationError;
use super::repository::{NotificationDispatcher, WorkflowStore};
use super::service::{ReconcileTarget, VerificationService};
use super::transition::VerificationRequest;
use crate::error::AppError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Router builder exposing the integration endpoints.
pub fn integration_router<S, N>(service: Arc<VerificationService<S, N>>) -> Router
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route(
            "/integrations/applications/:application_id/documents",
            post(link_documents_handler::<S, N>),
        )
        .route(
            "/integrations/applications/:application_id/status",
            put(application_status_handler::<S, N>),
        )
        .route(
            "/integrations/documents/check-expirations",
            post(check_expirations_handler::<S, N>),
        )
        .route(
            "/integrations/documents/:document_id",
            delete(remove_document_handler::<S, N>),
        )
        .route(
            "/integrations/documents/:document_id/verification",
            put(verification_handler::<S, N>),
        )
        .route(
            "/integrations/users/:user_id/sync-verification",
            post(sync_verification_handler::<S, N>),
        )
        .route(
            "/integrations/users/:user_id/kyc-status",
            get(kyc_status_handler::<S, N>),
        )
        .route(
            "/integrations/profiles/:profile_id/jobs/:job_id/eligibility",
            get(eligibility_handler::<S, N>),
        )
        .route(
            "/integrations/profiles/:profile_id/sync-applications",
            post(sync_applications_handler::<S, N>),
        )
        .route(
            "/integrations/profiles/:profile_id/update-completeness",
            post(update_completeness_handler::<S, N>),
        )
        .route(
            "/integrations/reconcile/:kind/:id",
            post(reconcile_handler::<S, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LinkDocumentsBody {
    #[serde(default)]
    pub document_ids: Vec<DocumentId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerificationBody {
    #[serde(alias = "status")]
    pub verification_status: String,
    #[serde(default, alias = "notes")]
    pub verification_notes: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplicationStatusBody {
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExpiryQuery {
    pub days: Option<i64>,
}

#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct Failure {
    success: bool,
    message: String,
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = Failure {
        success: false,
        message: message.into(),
    };
    (status, Json(payload)).into_response()
}

fn respond<T: Serialize>(result: Result<T, IntegrationError>) -> Response {
    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(Envelope {
                success: true,
                data,
            }),
        )
            .into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

/// Resolve the caller from the headers set by the upstream auth layer.
pub(crate) fn actor_from(headers: &HeaderMap) -> Result<Actor, Response> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let (Some(id), Some(role)) = (header(ACTOR_ID_HEADER), header(ACTOR_ROLE_HEADER)) else {
        return Err(failure(StatusCode::UNAUTHORIZED, "authentication required"));
    };
    let role: Role = role
        .parse()
        .map_err(|_| failure(StatusCode::UNAUTHORIZED, format!("unknown actor role '{role}'")))?;

    Ok(Actor::new(id, role))
}

fn rejected_body(rejection: JsonRejection) -> Response {
    failure(
        StatusCode::BAD_REQUEST,
        format!("invalid request body: {}", rejection.body_text()),
    )
}

pub(crate) async fn link_documents_handler<S, N>(
    State(service): State<Arc<VerificationService<S, N>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<LinkDocumentsBody>, JsonRejection>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let actor = match actor_from(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected_body(rejection),
    };

    respond(service.link_documents_to_application(
        &ApplicationId(application_id),
        &body.document_ids,
        &actor,
    ))
}

pub(crate) async fn application_status_handler<S, N>(
    State(service): State<Arc<VerificationService<S, N>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<ApplicationStatusBody>, JsonRejection>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let actor = match actor_from(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected_body(rejection),
    };

    let result = body
        .status
        .parse::<ApplicationStatus>()
        .map_err(IntegrationError::from)
        .and_then(|status| {
            service.advance_application_status(
                &ApplicationId(application_id),
                status,
                body.notes,
                &actor,
            )
        });
    respond(result)
}

pub(crate) async fn verification_handler<S, N>(
    State(service): State<Arc<VerificationService<S, N>>>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<VerificationBody>, JsonRejection>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let actor = match actor_from(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected_body(rejection),
    };

    let result = VerificationRequest::parse(
        &body.verification_status,
        body.verification_notes,
        body.rejection_reason,
    )
    .map_err(IntegrationError::from)
    .and_then(|request| {
        service.update_verification_status(&DocumentId(document_id), request, &actor)
    });
    respond(result)
}

pub(crate) async fn remove_document_handler<S, N>(
    State(service): State<Arc<VerificationService<S, N>>>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match actor_from(&headers) {
        Ok(actor) => respond(service.remove_document(&DocumentId(document_id), &actor)),
        Err(response) => response,
    }
}

pub(crate) async fn check_expirations_handler<S, N>(
    State(service): State<Arc<VerificationService<S, N>>>,
    Query(query): Query<ExpiryQuery>,
    headers: HeaderMap,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match actor_from(&headers) {
        Ok(actor) => respond(service.check_document_expirations(query.days, &actor)),
        Err(response) => response,
    }
}

pub(crate) async fn sync_verification_handler<S, N>(
    State(service): State<Arc<VerificationService<S, N>>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match actor_from(&headers) {
        Ok(actor) => respond(service.sync_profile_verification_status(&UserId(user_id), &actor)),
        Err(response) => response,
    }
}

pub(crate) async fn kyc_status_handler<S, N>(
    State(service): State<Arc<VerificationService<S, N>>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match actor_from(&headers) {
        Ok(actor) => respond(service.kyc_status(&UserId(user_id), &actor)),
        Err(response) => response,
    }
}

pub(crate) async fn eligibility_handler<S, N>(
    State(service): State<Arc<VerificationService<S, N>>>,
    Path((profile_id, job_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match actor_from(&headers) {
        Ok(actor) => respond(service.check_application_eligibility(
            &ProfileId(profile_id),
            &JobId(job_id),
            &actor,
        )),
        Err(response) => response,
    }
}

pub(crate) async fn sync_applications_handler<S, N>(
    State(service): State<Arc<VerificationService<S, N>>>,
    Path(profile_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match actor_from(&headers) {
        Ok(actor) => respond(service.sync_profile_applications(&ProfileId(profile_id), &actor)),
        Err(response) => response,
    }
}

pub(crate) async fn update_completeness_handler<S, N>(
    State(service): State<Arc<VerificationService<S, N>>>,
    Path(profile_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match actor_from(&headers) {
        Ok(actor) => respond(service.update_profile_completeness(&ProfileId(profile_id), &actor)),
        Err(response) => response,
    }
}

pub(crate) async fn reconcile_handler<S, N>(
    State(service): State<Arc<VerificationService<S, N>>>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let actor = match actor_from(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let result = ReconcileTarget::parse(&kind, &id)
        .map_err(IntegrationError::from)
        .and_then(|target| service.reconcile(&target, &actor));
    respond(result)
}
