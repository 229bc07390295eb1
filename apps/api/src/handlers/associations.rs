use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use amicale_core::{AssociationId, UserIdentity};
use amicale_domain::{MembershipId, PermissionModel};

use crate::dto::{
    AssociationResponse, CreateAssociationRequest, MembershipResponse, ReviewJoinRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_association_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateAssociationRequest>,
) -> ApiResult<(StatusCode, Json<AssociationResponse>)> {
    let permission_model = match payload.permission_model.as_deref() {
        Some(value) => PermissionModel::from_storage(value)?,
        None => PermissionModel::Catalog,
    };

    let association = state
        .membership_service
        .create_association(&user, payload.name, permission_model)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AssociationResponse::from(association)),
    ))
}

pub async fn join_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(association_id): Path<String>,
) -> ApiResult<(StatusCode, Json<MembershipResponse>)> {
    let association_id = AssociationId::parse(association_id.as_str())?;

    let membership = state
        .membership_service
        .request_join(&user, association_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MembershipResponse::from(membership)),
    ))
}

pub async fn review_join_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((association_id, member_id)): Path<(String, String)>,
    Json(payload): Json<ReviewJoinRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let association_id = AssociationId::parse(association_id.as_str())?;
    let member_id = MembershipId::parse(member_id.as_str())?;

    let membership = state
        .membership_service
        .review_join(&user, association_id, member_id, payload.approve)
        .await?;

    Ok(Json(MembershipResponse::from(membership)))
}

pub async fn list_members_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(association_id): Path<String>,
) -> ApiResult<Json<Vec<MembershipResponse>>> {
    let association_id = AssociationId::parse(association_id.as_str())?;

    let members = state
        .membership_service
        .list_members(&user, association_id)
        .await?
        .into_iter()
        .map(MembershipResponse::from)
        .collect();

    Ok(Json(members))
}

pub async fn exclude_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((association_id, member_id)): Path<(String, String)>,
) -> ApiResult<Json<MembershipResponse>> {
    let association_id = AssociationId::parse(association_id.as_str())?;
    let member_id = MembershipId::parse(member_id.as_str())?;

    let membership = state
        .membership_service
        .exclude_member(&user, association_id, member_id)
        .await?;

    Ok(Json(MembershipResponse::from(membership)))
}
