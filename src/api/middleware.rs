//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope and service error mapping
//! - A JSON body extractor whose rejections are validation errors
//! - Bearer token authentication

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{FieldErrors, User};
use crate::services::{
    EntryService, EntryServiceError, ExerciseService, ExerciseServiceError, StatsService,
    UserService, UserServiceError, WorkoutService, WorkoutServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub exercise_service: Arc<ExerciseService>,
    pub workout_service: Arc<WorkoutService>,
    pub entry_service: Arc<EntryService>,
    pub stats_service: Arc<StatsService>,
}

impl AppState {
    /// Wire repositories and services over a migrated pool
    pub fn from_pool(pool: crate::db::DynDatabasePool, auth: &crate::config::AuthConfig) -> Self {
        use crate::db::repositories::{
            SqlxEntryRepository, SqlxExerciseRepository, SqlxStatsRepository,
            SqlxUserRepository, SqlxWorkoutRepository,
        };
        use crate::services::TokenService;

        let exercise_repo = SqlxExerciseRepository::boxed(pool.clone());
        let workout_repo = SqlxWorkoutRepository::boxed(pool.clone());
        let tokens = Arc::new(TokenService::from_config(auth));

        Self {
            user_service: Arc::new(UserService::new(
                SqlxUserRepository::boxed(pool.clone()),
                tokens,
            )),
            exercise_service: Arc::new(ExerciseService::new(exercise_repo.clone())),
            workout_service: Arc::new(WorkoutService::new(workout_repo.clone())),
            entry_service: Arc::new(EntryService::new(
                SqlxEntryRepository::boxed(pool.clone()),
                workout_repo,
                exercise_repo,
            )),
            stats_service: Arc::new(StatsService::new(SqlxStatsRepository::boxed(pool.clone()))),
            pool,
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized(NOT_AUTHENTICATED))
    }
}

/// Numeric `{id}` path segment. Anything unparseable is a 404, like a missing row.
#[derive(Debug, Clone, Copy)]
pub struct ResourceId(pub i64);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<i64>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| ResourceId(id))
            .map_err(|_| ApiError::not_found("Not found"))
    }
}

const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided or are invalid.";
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// 400 with per-field messages in `details`
    pub fn field_errors(errors: FieldErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or(serde_json::Value::Null);
        Self::with_details("VALIDATION_ERROR", "Invalid input", details)
    }

    /// Log the cause and return a response that does not reveal it.
    pub fn internal(err: &anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", err);
        Self::new("INTERNAL_ERROR", INTERNAL_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::Validation(errors) => ApiError::field_errors(errors),
            UserServiceError::Conflict(message) => ApiError::conflict(message),
            e @ UserServiceError::AuthenticationError => ApiError::unauthorized(e.to_string()),
            UserServiceError::NotFound => ApiError::not_found("User not found"),
            UserServiceError::InternalError(e) => ApiError::internal(&e),
        }
    }
}

impl From<ExerciseServiceError> for ApiError {
    fn from(err: ExerciseServiceError) -> Self {
        match err {
            ExerciseServiceError::Validation(errors) => ApiError::field_errors(errors),
            ExerciseServiceError::NotFound => ApiError::not_found("Exercise not found"),
            ExerciseServiceError::InternalError(e) => ApiError::internal(&e),
        }
    }
}

impl From<WorkoutServiceError> for ApiError {
    fn from(err: WorkoutServiceError) -> Self {
        match err {
            WorkoutServiceError::Validation(errors) => ApiError::field_errors(errors),
            WorkoutServiceError::NotFound => ApiError::not_found("Workout not found"),
            WorkoutServiceError::InternalError(e) => ApiError::internal(&e),
        }
    }
}

impl From<EntryServiceError> for ApiError {
    fn from(err: EntryServiceError) -> Self {
        match err {
            EntryServiceError::Validation(errors) => ApiError::field_errors(errors),
            EntryServiceError::NotFound => ApiError::not_found("Entry not found"),
            EntryServiceError::InternalError(e) => ApiError::internal(&e),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::internal(&err)
    }
}

/// `Json<T>` that reports malformed bodies as `VALIDATION_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with `Content-Type: application/json`".to_string()
        }
        _ => rejection.body_text(),
    };
    tracing::debug!("Rejected request body: {}", message);
    ApiError::with_details(
        "VALIDATION_ERROR",
        "Malformed request body",
        serde_json::json!({ "non_field_errors": [message] }),
    )
}

/// Extract a bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Resolves the bearer access token to a user and stores it as an
/// [`AuthenticatedUser`] extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized(NOT_AUTHENTICATED))?
        .to_string();

    let user = match state.user_service.authenticate(&token).await {
        Ok(user) => user,
        Err(UserServiceError::InternalError(e)) => return Err(ApiError::internal(&e)),
        Err(_) => return Err(ApiError::unauthorized(NOT_AUTHENTICATED)),
    };

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
