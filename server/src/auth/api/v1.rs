use crate::auth::{AuthError, AuthService, AuthState, CurrentUser, SeaOrmUserStore, User};
use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON request payload carrying login or registration credentials.
#[derive(serde::Deserialize, Debug, ToSchema)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// JSON response for successful API login
#[derive(serde::Serialize, Debug, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// JSON representation of a registered user. The password hash is an internal
/// detail and is never serialized.
#[derive(serde::Serialize, serde::Deserialize, Debug, ToSchema)]
pub struct UserJson {
    /// Unique identifier for the user
    pub id: i32,
    /// The unique username
    pub username: String,
}

impl From<User> for UserJson {
    fn from(user: User) -> Self {
        Self {
            id: user.id(),
            username: user.username().to_string(),
        }
    }
}

/// JSON response for API errors
#[derive(serde::Serialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Creates a JSON API router for authentication endpoints.
pub fn create_api_router(state: Arc<AuthState>) -> Router<()> {
    Router::new()
        .route("/register", axum::routing::post(register_handler))
        .route("/login", axum::routing::post(login_handler))
        .with_state(state)
}

fn auth_service(state: &AuthState) -> AuthService<SeaOrmUserStore<'_>> {
    AuthService::new(
        SeaOrmUserStore::new(&state.db),
        state.jwt_secret.clone(),
        state.token_ttl,
    )
}

/// API authentication middleware that extracts the current user from the
/// Authorization Bearer header. Sets the CurrentUser extension if the token
/// verifies and its subject still resolves to a user.
pub async fn auth_user_middleware(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(auth_header) = headers.get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                if let Ok(user) = auth_service(&state).verify_token(token).await {
                    request.extensions_mut().insert(CurrentUser::from(user));
                }
            }
        }
    }

    next.run(request).await
}

/// Middleware that ensures the current user is authenticated.
/// Returns UNAUTHORIZED if the CurrentUser extension is not found in the request.
/// This middleware should be applied after auth_user_middleware.
pub async fn require_auth_middleware(request: Request, next: Next) -> Response {
    // Check if user is authenticated by looking for CurrentUser extension
    let is_authenticated = request.extensions().get::<CurrentUser>().is_some();

    if !is_authenticated {
        let error_response = ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: "Authentication required to access this resource".to_string(),
        };
        return (StatusCode::UNAUTHORIZED, Json(error_response)).into_response();
    }

    next.run(request).await
}

/// Handles JSON registration requests.
/// Creates a new account and returns it, or a conflict error when the
/// username is already taken.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User registered", body = UserJson),
        (status = 400, description = "Empty username or password", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register_handler(
    State(state): State<Arc<AuthState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserJson>), (StatusCode, Json<ErrorResponse>)> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "INVALID_INPUT".to_string(),
                message: "Username and password must not be empty".to_string(),
            }),
        ));
    }

    match auth_service(&state)
        .register(&payload.username, &payload.password)
        .await
    {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserJson::from(user)))),
        Err(AuthError::UsernameTaken(_)) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "USERNAME_TAKEN".to_string(),
                message: "Username already exists".to_string(),
            }),
        )),
        Err(err) => {
            tracing::error!("Failed to register user \"{}\": {}", payload.username, err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "INTERNAL_ERROR".to_string(),
                    message: "An unexpected error occurred while processing your request"
                        .to_string(),
                }),
            ))
        }
    }
}

/// Handles JSON login requests and returns a JWT token.
/// Validates credentials and returns either a success response with token or an error.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AuthState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    match auth_service(&state)
        .login(&payload.username, &payload.password)
        .await
    {
        Ok(token) => Ok(Json(LoginResponse { token })),
        Err(AuthError::InvalidCredentials) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "INVALID_CREDENTIALS".to_string(),
                message: "Invalid username or password".to_string(),
            }),
        )),
        Err(err) => {
            tracing::error!("Failed to log in user \"{}\": {}", payload.username, err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "INTERNAL_ERROR".to_string(),
                    message: "An unexpected error occurred while processing your request"
                        .to_string(),
                }),
            ))
        }
    }
}
