//! HTTP route handlers for the ward API.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde_json::Value;
use tracing::error;
use triage::core::answers::StepAnswers;
use triage::core::filter::PatientFilter;
use triage::core::snapshot::{ActionResponse, ActiveTriageRow, PatientListRow, TimerSnapshot};
use triage::core::types::AdvanceOutcome;
use triage::patient::NewPatient;
use triage::triage_state::TriageState;
use triage::ward::{PatientDetail, WardError};

use crate::state::AppState;

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients).post(register_patient))
        .route("/patients/{id}", get(get_patient).delete(delete_patient))
        .route(
            "/patients/{id}/triage/steps/{step}",
            post(advance_step).put(edit_step),
        )
        .route(
            "/patients/{id}/triage/actions/complete",
            post(complete_actions),
        )
        .route(
            "/patients/{id}/triage/actions/{key}",
            post(mark_action).delete(unmark_action),
        )
        .route("/patients/{id}/timer", get(get_timer))
        .route("/active_patients", get(active_patients))
}

/// Request failure rendered as `{success: false, error, message}`.
#[derive(Debug)]
pub enum ApiError {
    Ward(WardError),
    InvalidAnswers(String),
}

impl From<WardError> for ApiError {
    fn from(err: WardError) -> Self {
        ApiError::Ward(err)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    message: String,
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Ward(err) => err.kind(),
            ApiError::InvalidAnswers(_) => "invalid_answers",
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind() {
            "not_found" => StatusCode::NOT_FOUND,
            "invalid_step" | "already_completed" | "edit_locked" | "final_action_locked"
            | "incomplete_actions" => StatusCode::CONFLICT,
            "unknown_action" | "invalid_patient" | "invalid_answers" => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Ward(err) => format!("{err:#}"),
            ApiError::InvalidAnswers(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(kind = self.kind(), message = %self.message(), "request failed");
        }
        let body = ErrorBody {
            success: false,
            error: self.kind(),
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn health() -> &'static str {
    "ok"
}

/// GET /api/patients - filtered list, capped at `patient_list_limit`.
async fn list_patients(
    State(state): State<AppState>,
    Query(filter): Query<PatientFilter>,
) -> Json<Vec<PatientListRow>> {
    Json(state.ward.list(&filter, state.config.patient_list_limit))
}

/// POST /api/patients - register a patient and start triage.
async fn register_patient(
    State(state): State<AppState>,
    Json(form): Json<NewPatient>,
) -> Result<(StatusCode, Json<PatientDetail>), ApiError> {
    let detail = state.ward.register(form)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_patient(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<PatientDetail> {
    Ok(Json(state.ward.get(id)?))
}

async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.ward.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/patients/{id}/triage/steps/{step} - submit the active step and advance.
async fn advance_step(
    State(state): State<AppState>,
    Path((id, step)): Path<(u64, u8)>,
    Json(body): Json<Value>,
) -> ApiResult<AdvanceOutcome> {
    let answers = StepAnswers::from_json(step, body).map_err(ApiError::InvalidAnswers)?;
    Ok(Json(state.ward.advance_triage(id, answers)?))
}

/// PUT /api/patients/{id}/triage/steps/{step} - correct a reached step.
async fn edit_step(
    State(state): State<AppState>,
    Path((id, step)): Path<(u64, u8)>,
    Json(body): Json<Value>,
) -> ApiResult<TriageState> {
    let answers = StepAnswers::from_json(step, body).map_err(ApiError::InvalidAnswers)?;
    Ok(Json(state.ward.edit_triage_step(id, step, answers)?))
}

async fn mark_action(
    State(state): State<AppState>,
    Path((id, key)): Path<(u64, String)>,
) -> ApiResult<ActionResponse> {
    Ok(Json(state.ward.mark_action(id, &key)?))
}

async fn unmark_action(
    State(state): State<AppState>,
    Path((id, key)): Path<(u64, String)>,
) -> ApiResult<ActionResponse> {
    Ok(Json(state.ward.unmark_action(id, &key)?))
}

async fn complete_actions(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<ActionResponse> {
    Ok(Json(state.ward.complete_actions(id)?))
}

async fn get_timer(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<TimerSnapshot> {
    Ok(Json(state.ward.timer(id)?))
}

/// GET /api/active_patients - the same rows the live monitor receives.
async fn active_patients(State(state): State<AppState>) -> Json<Vec<ActiveTriageRow>> {
    Json(state.ward.snapshot_all())
}
