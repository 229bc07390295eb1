use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use amicale_core::{AppError, AssociationId, UserIdentity};
use amicale_domain::{MembershipId, PermissionId, RoleId};

use crate::dto::{
    AssignRolesRequest, MemberRolesResponse, MembershipResponse, PermissionOverrideRequest,
    TransferAdminRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn assign_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((association_id, member_id)): Path<(String, String)>,
    Json(payload): Json<AssignRolesRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let association_id = AssociationId::parse(association_id.as_str())?;
    let member_id = MembershipId::parse(member_id.as_str())?;
    let roles = payload
        .role_ids
        .iter()
        .map(|value| RoleId::parse(value.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let membership = state
        .role_admin_service
        .assign_roles(&user, association_id, member_id, roles)
        .await?;

    Ok(Json(MembershipResponse::from(membership)))
}

pub async fn remove_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((association_id, member_id, role_id)): Path<(String, String, String)>,
) -> ApiResult<Json<MembershipResponse>> {
    let association_id = AssociationId::parse(association_id.as_str())?;
    let member_id = MembershipId::parse(member_id.as_str())?;
    let role_id = RoleId::parse(role_id.as_str())?;

    let membership = state
        .role_admin_service
        .remove_role(&user, association_id, member_id, role_id)
        .await?;

    Ok(Json(MembershipResponse::from(membership)))
}

pub async fn member_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((association_id, member_id)): Path<(String, String)>,
) -> ApiResult<Json<MemberRolesResponse>> {
    let association_id = AssociationId::parse(association_id.as_str())?;
    let member_id = MembershipId::parse(member_id.as_str())?;

    let view = state
        .role_admin_service
        .member_roles(&user, association_id, member_id)
        .await?;

    Ok(Json(MemberRolesResponse::from(view)))
}

pub async fn grant_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((association_id, member_id)): Path<(String, String)>,
    Json(payload): Json<PermissionOverrideRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let (association_id, member_id, permission) =
        parse_override_target(&association_id, &member_id, &payload)?;

    let membership = state
        .role_admin_service
        .grant_permission(&user, association_id, member_id, permission)
        .await?;

    Ok(Json(MembershipResponse::from(membership)))
}

pub async fn revoke_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((association_id, member_id)): Path<(String, String)>,
    Json(payload): Json<PermissionOverrideRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let (association_id, member_id, permission) =
        parse_override_target(&association_id, &member_id, &payload)?;

    let membership = state
        .role_admin_service
        .revoke_permission(&user, association_id, member_id, permission)
        .await?;

    Ok(Json(MembershipResponse::from(membership)))
}

pub async fn transfer_admin_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(association_id): Path<String>,
    Json(payload): Json<TransferAdminRequest>,
) -> ApiResult<StatusCode> {
    let association_id = AssociationId::parse(association_id.as_str())?;
    let member_id = MembershipId::parse(payload.member_id.as_str())?;

    state
        .role_admin_service
        .transfer_admin(&user, association_id, member_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn parse_override_target(
    association_id: &str,
    member_id: &str,
    payload: &PermissionOverrideRequest,
) -> Result<(AssociationId, MembershipId, PermissionId), AppError> {
    let association_id = AssociationId::parse(association_id)?;
    let member_id = MembershipId::parse(member_id)?;
    let permission = PermissionId::new(payload.permission.as_str())
        .map_err(|_| AppError::InvalidPermission(payload.permission.clone()))?;

    Ok((association_id, member_id, permission))
}
