use amicale_core::{AppError, AppResult, AssociationId};
use serde::{Deserialize, Serialize};

/// Permission resolution strategy an association runs on.
///
/// Associations migrated to the catalog model use the layered resolver;
/// the rest stay on the static legacy role hierarchy until migrated. The
/// two strategies are never mixed for one association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionModel {
    /// Catalog-based layered resolution.
    Catalog,
    /// Static legacy role-hierarchy resolution.
    Legacy,
}

impl PermissionModel {
    /// Returns a stable storage value for this model.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Legacy => "legacy",
        }
    }

    /// Parses a stored value into a model.
    pub fn from_storage(value: &str) -> AppResult<Self> {
        match value {
            "catalog" => Ok(Self::Catalog),
            "legacy" => Ok(Self::Legacy),
            _ => Err(AppError::Validation(format!(
                "unknown permission model '{value}'"
            ))),
        }
    }
}

/// A tenant organization owning its own catalog, roles and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    /// Stable association identifier.
    pub association_id: AssociationId,
    /// Association name.
    pub name: String,
    /// Migration flag selecting the resolution strategy.
    pub permission_model: PermissionModel,
}
