use axum::Json;
use axum::extract::{Extension, Path, State};
use amicale_core::{AssociationId, UserIdentity};

use crate::dto::CatalogCategoryResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_catalog_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(association_id): Path<String>,
) -> ApiResult<Json<Vec<CatalogCategoryResponse>>> {
    let association_id = AssociationId::parse(association_id.as_str())?;

    let catalog = state
        .role_admin_service
        .list_catalog(&user, association_id)
        .await?;

    Ok(Json(CatalogCategoryResponse::group(catalog)))
}
