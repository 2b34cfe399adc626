use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use base64::Engine;
use model_actor::Actor;
use models_observations::{AuditEntry, ComplianceSummary, Observation};
use serde::{Deserialize, Serialize};
use sla_config::SlaConfig;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    models::{
        AttachmentIngest, CreatedObservation, NewAttachment, NewObservation, ObservationErr,
        ObservationFilters,
    },
    ports::ObservationService,
};

/// JSON error body returned by every failing route.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

pub struct ObservationRouterState<T> {
    service: Arc<T>,
}

impl<T> Clone for ObservationRouterState<T> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<T> ObservationRouterState<T> {
    pub fn new(service: T) -> Self {
        ObservationRouterState {
            service: Arc::new(service),
        }
    }
}

pub fn observation_router<T, S>(state: ObservationRouterState<T>) -> Router<S>
where
    T: ObservationService,
    S: Send + Sync + Clone + 'static,
{
    Router::new()
        .route("/observations", post(create_observation_handler))
        .route("/observations", get(list_observations_handler))
        .route("/observations/compliance", get(compliance_handler))
        .route("/observations/{id}", get(get_observation_handler))
        .route("/observations/{id}/status", post(change_status_handler))
        .route("/observations/{id}/attachments", post(attach_files_handler))
        .route("/observations/{id}/audit", get(audit_trail_handler))
        .route("/attachments/{id}", delete(remove_attachment_handler))
        .route("/config", get(get_config_handler))
        .route("/config", put(set_config_handler))
        .with_state(state)
}

/// One file in a submission, base64-encoded for the JSON body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FileUpload {
    /// Filename as picked by the client.
    pub name: String,
    /// File contents, standard base64.
    pub content: String,
}

impl FileUpload {
    fn decode(self) -> Result<NewAttachment, ObservationHandlerErr> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.content)
            .map_err(|_| ObservationHandlerErr::BadEncoding(self.name.clone()))?;
        Ok(NewAttachment {
            original_name: self.name,
            bytes,
        })
    }
}

fn decode_files(files: Vec<FileUpload>) -> Result<Vec<NewAttachment>, ObservationHandlerErr> {
    files.into_iter().map(FileUpload::decode).collect()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateObservationBody {
    #[serde(flatten)]
    pub observation: NewObservation,
    /// Files to attach on creation, optional.
    #[serde(default)]
    pub files: Vec<FileUpload>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusBody {
    /// Catalog id of the target status.
    pub status_id: Uuid,
    /// Optional note recorded in the audit trail.
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachFilesBody {
    pub files: Vec<FileUpload>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetConfigBody {
    /// Resolution window for normal observations, in days.
    pub normal_days: u32,
    /// Resolution window for urgent observations, in hours.
    pub urgent_hours: u32,
}

#[derive(Debug, Error)]
pub enum ObservationHandlerErr {
    #[error(transparent)]
    Service(#[from] ObservationErr),
    #[error("file {0} is not valid base64")]
    BadEncoding(String),
}

impl IntoResponse for ObservationHandlerErr {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ObservationHandlerErr::Service(err) => match err {
                ObservationErr::Validation(_) => StatusCode::BAD_REQUEST,
                ObservationErr::PermissionDenied => StatusCode::FORBIDDEN,
                ObservationErr::NotFound => StatusCode::NOT_FOUND,
                ObservationErr::Configuration(_) => StatusCode::CONFLICT,
                ObservationErr::Storage(err) => {
                    tracing::error!(error = %err, "storage failure");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ObservationHandlerErr::BadEncoding(_) => StatusCode::BAD_REQUEST,
        };
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "An internal server error has occurred".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Reports a new observation, optionally with attached files.
#[utoipa::path(
    post,
    operation_id = "create_observation",
    path = "/observations",
    request_body = CreateObservationBody,
    responses(
            (status = 201, body = CreatedObservation),
            (status = 400, body = ErrorResponse),
            (status = 403, body = ErrorResponse),
            (status = 409, body = ErrorResponse),
    )
)]
pub async fn create_observation_handler<T>(
    State(state): State<ObservationRouterState<T>>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<CreateObservationBody>,
) -> Result<(StatusCode, Json<CreatedObservation>), ObservationHandlerErr>
where
    T: ObservationService,
{
    let files = decode_files(body.files)?;
    let created = state
        .service
        .create_observation(actor, body.observation, files)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Lists the observations the caller may see, newest first.
#[utoipa::path(
    get,
    operation_id = "list_observations",
    path = "/observations",
    params(ObservationFilters),
    responses(
            (status = 200, body = Vec<Observation>),
    )
)]
pub async fn list_observations_handler<T>(
    State(state): State<ObservationRouterState<T>>,
    Extension(actor): Extension<Actor>,
    Query(filters): Query<ObservationFilters>,
) -> Result<Json<Vec<Observation>>, ObservationHandlerErr>
where
    T: ObservationService,
{
    Ok(Json(state.service.list_observations(actor, filters).await?))
}

/// One observation by id.
#[utoipa::path(
    get,
    operation_id = "get_observation",
    path = "/observations/{id}",
    responses(
            (status = 200, body = Observation),
            (status = 403, body = ErrorResponse),
            (status = 404, body = ErrorResponse),
    )
)]
pub async fn get_observation_handler<T>(
    State(state): State<ObservationRouterState<T>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Observation>, ObservationHandlerErr>
where
    T: ObservationService,
{
    Ok(Json(state.service.get_observation(actor, id).await?))
}

/// Moves an observation to another lifecycle status.
#[utoipa::path(
    post,
    operation_id = "change_observation_status",
    path = "/observations/{id}/status",
    request_body = ChangeStatusBody,
    responses(
            (status = 200, body = Observation),
            (status = 400, body = ErrorResponse),
            (status = 403, body = ErrorResponse),
            (status = 404, body = ErrorResponse),
    )
)]
pub async fn change_status_handler<T>(
    State(state): State<ObservationRouterState<T>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<ChangeStatusBody>,
) -> Result<Json<Observation>, ObservationHandlerErr>
where
    T: ObservationService,
{
    Ok(Json(
        state
            .service
            .change_status(actor, id, body.status_id, body.comment)
            .await?,
    ))
}

/// Attaches files to an existing observation.
#[utoipa::path(
    post,
    operation_id = "attach_observation_files",
    path = "/observations/{id}/attachments",
    request_body = AttachFilesBody,
    responses(
            (status = 200, body = AttachmentIngest),
            (status = 400, body = ErrorResponse),
            (status = 403, body = ErrorResponse),
            (status = 404, body = ErrorResponse),
    )
)]
pub async fn attach_files_handler<T>(
    State(state): State<ObservationRouterState<T>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<AttachFilesBody>,
) -> Result<Json<AttachmentIngest>, ObservationHandlerErr>
where
    T: ObservationService,
{
    let files = decode_files(body.files)?;
    Ok(Json(state.service.attach_files(actor, id, files).await?))
}

/// Removes an attachment. Only its uploader or an administrator may.
#[utoipa::path(
    delete,
    operation_id = "remove_attachment",
    path = "/attachments/{id}",
    responses(
            (status = 204),
            (status = 403, body = ErrorResponse),
            (status = 404, body = ErrorResponse),
    )
)]
pub async fn remove_attachment_handler<T>(
    State(state): State<ObservationRouterState<T>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ObservationHandlerErr>
where
    T: ObservationService,
{
    state.service.remove_attachment(actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The observation's audit trail, oldest entry first.
#[utoipa::path(
    get,
    operation_id = "get_observation_audit",
    path = "/observations/{id}/audit",
    responses(
            (status = 200, body = Vec<AuditEntry>),
            (status = 403, body = ErrorResponse),
            (status = 404, body = ErrorResponse),
    )
)]
pub async fn audit_trail_handler<T>(
    State(state): State<ObservationRouterState<T>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AuditEntry>>, ObservationHandlerErr>
where
    T: ObservationService,
{
    Ok(Json(state.service.audit_trail(actor, id).await?))
}

/// The on-time/late tally over the observations the caller may see.
#[utoipa::path(
    get,
    operation_id = "get_compliance_summary",
    path = "/observations/compliance",
    params(ObservationFilters),
    responses(
            (status = 200, body = ComplianceSummary),
    )
)]
pub async fn compliance_handler<T>(
    State(state): State<ObservationRouterState<T>>,
    Extension(actor): Extension<Actor>,
    Query(filters): Query<ObservationFilters>,
) -> Result<Json<ComplianceSummary>, ObservationHandlerErr>
where
    T: ObservationService,
{
    Ok(Json(state.service.compliance_summary(actor, filters).await?))
}

/// The current SLA configuration.
#[utoipa::path(
    get,
    operation_id = "get_sla_config",
    path = "/config",
    responses(
            (status = 200, body = SlaConfig),
    )
)]
pub async fn get_config_handler<T>(
    State(state): State<ObservationRouterState<T>>,
) -> Result<Json<SlaConfig>, ObservationHandlerErr>
where
    T: ObservationService,
{
    Ok(Json(state.service.get_config().await?))
}

/// Replaces the SLA configuration. Administrators only.
#[utoipa::path(
    put,
    operation_id = "set_sla_config",
    path = "/config",
    request_body = SetConfigBody,
    responses(
            (status = 200, body = SlaConfig),
            (status = 400, body = ErrorResponse),
            (status = 403, body = ErrorResponse),
    )
)]
pub async fn set_config_handler<T>(
    State(state): State<ObservationRouterState<T>>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<SetConfigBody>,
) -> Result<Json<SlaConfig>, ObservationHandlerErr>
where
    T: ObservationService,
{
    Ok(Json(
        state
            .service
            .set_config(actor, body.normal_days, body.urgent_hours)
            .await?,
    ))
}
