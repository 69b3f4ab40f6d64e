use crate::handlers::common::{created_response, map_service_error, success_response};
use crate::{
    auth::CurrentUser,
    errors::ApiError,
    services::accounts::{RegisterInput, UpdateProfileInput, UserView},
    AppState,
};
use axum::{
    extract::{Json, State},
    http::{header, HeaderValue},
    response::Response,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

/// Creates the router for auth endpoints
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/current-user", get(current_user))
        .route("/update-profile", put(update_profile))
}

fn with_session_cookie(mut response: Response, cookie: &str) -> Result<Response, ApiError> {
    let value = HeaderValue::from_str(cookie).map_err(|_| ApiError::InternalServerError)?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

fn require(field: Option<String>, name: &str) -> Result<String, ApiError> {
    field
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::ValidationError(format!("{} is required", name)))
}

/// Register a new account and establish a session for it
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let username = require(payload.username, "username")?;
    let email = require(payload.email, "email")?;
    let password = require(payload.password, "password")?;

    let account = state
        .services
        .accounts
        .register(RegisterInput {
            username,
            email,
            password,
            full_name: payload.full_name,
            phone: payload.phone,
            address: payload.address,
        })
        .await
        .map_err(map_service_error)?;

    let token = state
        .sessions
        .issue(&account, false)
        .map_err(map_service_error)?;
    let cookie = state.sessions.cookie(&token, false);

    let response = created_response(json!({
        "message": "Registration successful",
        "user": UserView::from(account),
    }));
    with_session_cookie(response, &cookie)
}

/// Log in with username and password
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let (username, password) = match (payload.username, payload.password) {
        (Some(username), Some(password)) => (username, password),
        _ => {
            return Err(ApiError::ValidationError(
                "Username and password are required".to_string(),
            ))
        }
    };

    let account = state
        .services
        .accounts
        .verify_credentials(&username, &password)
        .await
        .map_err(map_service_error)?;

    let remember = payload.remember.unwrap_or(false);
    let token = state
        .sessions
        .issue(&account, remember)
        .map_err(map_service_error)?;
    let cookie = state.sessions.cookie(&token, remember);

    let response = success_response(json!({
        "message": "Login successful",
        "user": UserView::from(account),
    }));
    with_session_cookie(response, &cookie)
}

/// Log out, clearing the session cookie
async fn logout(State(state): State<AppState>, _user: CurrentUser) -> Result<Response, ApiError> {
    let response = success_response(json!({
        "message": "Logout successful",
    }));
    with_session_cookie(response, &state.sessions.clear_cookie())
}

/// Return the authenticated account
async fn current_user(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ApiError> {
    let account = state
        .services
        .accounts
        .get_user(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "user": UserView::from(account),
    })))
}

/// Apply a partial profile update
async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Response, ApiError> {
    let account = state
        .services
        .accounts
        .update_profile(
            user.user_id,
            UpdateProfileInput {
                full_name: payload.full_name,
                phone: payload.phone,
                address: payload.address,
                email: payload.email,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Profile updated successfully",
        "user": UserView::from(account),
    })))
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub remember: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
}
