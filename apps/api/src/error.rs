use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use amicale_core::AppError;
use serde::Serialize;
use tracing::error;
use ts_rs::TS;

/// API error payload: stable code plus a human-readable message.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    error: String,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<ErrorDetails>,
}

/// Structured detail attached to permission failures.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-details.ts"
)]
pub struct ErrorDetails {
    permission: String,
    /// Role names of the requesting actor, never of another member.
    current_roles: Vec<String>,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_)
            | AppError::MissingAssociationId
            | AppError::InvalidAssociationId(_)
            | AppError::InvalidPermission(_) => StatusCode::BAD_REQUEST,
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotAssociationMember(_)
            | AppError::MembershipRequired(_)
            | AppError::AdminOnly(_)
            | AppError::InsufficientPermissions { .. }
            | AppError::PermissionRevoked(_) => StatusCode::FORBIDDEN,
            AppError::RoleNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RoleInUse(_) | AppError::DuplicateRoleName(_) | AppError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let code = self.0.code().to_owned();
        let details = match &self.0 {
            AppError::InsufficientPermissions {
                permission,
                current_roles,
            } => Some(ErrorDetails {
                permission: permission.clone(),
                current_roles: current_roles.clone(),
            }),
            _ => None,
        };

        // Internal detail stays in the server log.
        let message = if let AppError::Internal(detail) = &self.0 {
            error!(detail = detail.as_str(), "internal error");
            "internal error".to_owned()
        } else {
            self.0.to_string()
        };

        let payload = Json(ErrorResponse {
            error: message,
            code,
            details,
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use amicale_core::AppError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::ApiError;

    #[test]
    fn permission_failures_map_to_forbidden() {
        let response = ApiError(AppError::InsufficientPermissions {
            permission: "manage_members".to_owned(),
            current_roles: vec!["treasurer".to_owned()],
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn conflicts_map_to_conflict() {
        let response =
            ApiError(AppError::DuplicateRoleName("treasurer".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn missing_association_context_is_a_bad_request() {
        let response = ApiError(AppError::MissingAssociationId).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
