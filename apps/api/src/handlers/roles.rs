use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use amicale_application::{CreateRoleInput, UpdateRoleInput};
use amicale_core::{AssociationId, UserIdentity};
use amicale_domain::RoleId;
use serde::Deserialize;

use crate::dto::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};
use crate::error::ApiResult;
use crate::state::AppState;

use super::parse_permissions;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(association_id): Path<String>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let association_id = AssociationId::parse(association_id.as_str())?;

    let roles = state
        .role_admin_service
        .list_roles(&user, association_id)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(association_id): Path<String>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let association_id = AssociationId::parse(association_id.as_str())?;

    let role = state
        .role_admin_service
        .create_role(
            &user,
            association_id,
            CreateRoleInput {
                name: payload.name,
                description: payload.description.unwrap_or_default(),
                permissions: parse_permissions(&payload.permissions)?,
                color: payload.color,
                icon: payload.icon,
                is_unique: payload.is_unique.unwrap_or(false),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((association_id, role_id)): Path<(String, String)>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let association_id = AssociationId::parse(association_id.as_str())?;
    let role_id = RoleId::parse(role_id.as_str())?;

    let permissions = payload
        .permissions
        .as_deref()
        .map(parse_permissions)
        .transpose()?;

    let role = state
        .role_admin_service
        .update_role(
            &user,
            association_id,
            role_id,
            UpdateRoleInput {
                name: payload.name,
                description: payload.description,
                permissions,
                color: payload.color,
                icon: payload.icon,
                is_unique: payload.is_unique,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

#[derive(Debug, Deserialize)]
pub struct DeleteRoleQuery {
    force: Option<bool>,
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((association_id, role_id)): Path<(String, String)>,
    Query(query): Query<DeleteRoleQuery>,
) -> ApiResult<StatusCode> {
    let association_id = AssociationId::parse(association_id.as_str())?;
    let role_id = RoleId::parse(role_id.as_str())?;

    state
        .role_admin_service
        .delete_role(&user, association_id, role_id, query.force.unwrap_or(false))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
