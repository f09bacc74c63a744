// course_site/site_server/src/workbench.rs

//! HTTP facade over a single shared workbench session.
//!
//! The session lives behind a `tokio::sync::Mutex`. Commands take the lock
//! with `try_lock_owned` and answer 409 when another command holds it, so an
//! operation is never queued behind itself. The guard moves into the
//! blocking task and is released when the task ends, whatever the outcome.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use workbench_core::{
    EncryptRequest, ErrorBody, KeyMaterial, RsaProvider, Session, SessionState, VerifyRequest,
    WorkbenchConfig, WorkbenchError,
};

pub type SharedSession = Arc<Mutex<Session<RsaProvider>>>;

#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
}

impl AppState {
    pub fn new(config: WorkbenchConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new(RsaProvider::new(), config))),
        }
    }
}

#[derive(Serialize)]
struct FailureBody {
    error: String,
    state: SessionState,
}

pub enum ApiError {
    Busy,
    Workbench {
        error: WorkbenchError,
        state: SessionState,
    },
    /// Body could not be read as the command's JSON payload.
    BadBody {
        error: String,
        state: SessionState,
    },
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Busy => (
                StatusCode::CONFLICT,
                Json(ErrorBody {
                    error: "Another operation is in progress".to_string(),
                }),
            )
                .into_response(),
            Self::Workbench { error, state } => {
                let status = if error.is_validation() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                let body = FailureBody {
                    error: error.to_string(),
                    state,
                };
                (status, Json(body)).into_response()
            }
            Self::BadBody { error, state } => {
                (StatusCode::BAD_REQUEST, Json(FailureBody { error, state })).into_response()
            }
            Self::Internal(cause) => {
                error!(%cause, "workbench task failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "Internal server error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// JSON body whose rejection keeps the `{error, state}` shape of every
/// other workbench failure.
pub struct Payload<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for Payload<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let error = rejection.body_text();
                debug!(%error, "rejecting workbench request body");
                let session = state.session.try_lock().map_err(|_| ApiError::Busy)?;
                Err(ApiError::BadBody {
                    error,
                    state: session.state().clone(),
                })
            }
        }
    }
}

/// Runs one session command off the async runtime and returns the state it
/// left behind.
async fn run<F>(state: &AppState, command: F) -> Result<Json<SessionState>, ApiError>
where
    F: FnOnce(&mut Session<RsaProvider>) -> Result<(), WorkbenchError> + Send + 'static,
{
    let mut guard = state.session.clone().try_lock_owned().map_err(|_| {
        warn!("workbench busy, rejecting command");
        ApiError::Busy
    })?;

    let (outcome, snapshot) = tokio::task::spawn_blocking(move || {
        let outcome = command(&mut *guard);
        (outcome, guard.state().clone())
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    match outcome {
        Ok(()) => Ok(Json(snapshot)),
        Err(error) => Err(ApiError::Workbench {
            error,
            state: snapshot,
        }),
    }
}

pub async fn get_state(State(state): State<AppState>) -> Json<SessionState> {
    let session = state.session.lock().await;
    Json(session.state().clone())
}

pub async fn generate_keys(State(state): State<AppState>) -> Result<Json<SessionState>, ApiError> {
    info!("POST generate keys");
    run(&state, |session| session.generate_key_pairs()).await
}

pub async fn import_keys(
    State(state): State<AppState>,
    Payload(material): Payload<KeyMaterial>,
) -> Result<Json<SessionState>, ApiError> {
    info!("POST import keys");
    run(&state, move |session| session.import_keys(material)).await
}

pub async fn encrypt(
    State(state): State<AppState>,
    Payload(req): Payload<EncryptRequest>,
) -> Result<Json<SessionState>, ApiError> {
    info!("POST encrypt");
    run(&state, move |session| session.encrypt_and_sign(&req.message)).await
}

pub async fn verify(
    State(state): State<AppState>,
    Payload(req): Payload<VerifyRequest>,
) -> Result<Json<SessionState>, ApiError> {
    info!("POST verify");
    run(&state, move |session| {
        session
            .verify_and_decrypt(req.encrypted_message.as_deref(), req.signature.as_deref())
            .map(drop)
    })
    .await
}

pub async fn clear_log(State(state): State<AppState>) -> Result<Json<SessionState>, ApiError> {
    run(&state, |session| {
        session.clear_log();
        Ok(())
    })
    .await
}

pub async fn reset(State(state): State<AppState>) -> Result<Json<SessionState>, ApiError> {
    info!("POST reset");
    run(&state, |session| {
        session.reset();
        Ok(())
    })
    .await
}
