use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use amicale_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::{GenericMessageResponse, OtpRequestRequest, OtpVerifyRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_identity";

pub async fn otp_request_handler(
    State(state): State<AppState>,
    Json(payload): Json<OtpRequestRequest>,
) -> ApiResult<Json<GenericMessageResponse>> {
    state.auth_provider.begin(payload.phone.as_str()).await?;

    Ok(Json(GenericMessageResponse {
        message: "a verification code has been sent".to_owned(),
    }))
}

pub async fn otp_verify_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<OtpVerifyRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = state
        .auth_provider
        .verify(payload.phone.as_str(), payload.code.as_str())
        .await?;

    // New session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, identity.clone())
        .await
        .map_err(|error| AppError::Internal(format!("failed to store session identity: {error}")))?;

    Ok(Json(UserIdentityResponse::from(identity)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(session: Session) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or(AppError::NotAuthenticated)?;

    Ok(Json(UserIdentityResponse::from(identity)))
}
