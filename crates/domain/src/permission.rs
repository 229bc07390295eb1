use std::fmt::{Display, Formatter};
use std::str::FromStr;

use amicale_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Validated permission identifier, unique within an association catalog.
///
/// Identifiers are lowercase snake_case so that stored values, transport
/// values and catalog seeds never diverge by casing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionId(String);

impl PermissionId {
    /// Creates a validated permission identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.is_empty() || value.len() > 64 {
            return Err(AppError::Validation(
                "permission id must be 1..=64 characters".to_owned(),
            ));
        }

        let well_formed = value
            .chars()
            .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_');
        if !well_formed {
            return Err(AppError::Validation(format!(
                "permission id '{value}' must be lowercase snake_case"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for PermissionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for PermissionId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for PermissionId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionId> for String {
    fn from(value: PermissionId) -> Self {
        value.0
    }
}

/// Functional area a permission belongs to, used for grouped catalog views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    /// Treasury, transactions and tontine finances.
    Finances,
    /// Membership lifecycle and member data.
    Members,
    /// Roles, permissions and association settings.
    Administration,
    /// Shared documents and signatures.
    Documents,
    /// Association events and calendar.
    Events,
    /// Regional sections of the association.
    Sections,
}

impl PermissionCategory {
    /// Returns a stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finances => "finances",
            Self::Members => "members",
            Self::Administration => "administration",
            Self::Documents => "documents",
            Self::Events => "events",
            Self::Sections => "sections",
        }
    }

    /// Parses a stored value into a category.
    pub fn from_storage(value: &str) -> AppResult<Self> {
        match value {
            "finances" => Ok(Self::Finances),
            "members" => Ok(Self::Members),
            "administration" => Ok(Self::Administration),
            "documents" => Ok(Self::Documents),
            "events" => Ok(Self::Events),
            "sections" => Ok(Self::Sections),
            _ => Err(AppError::Validation(format!(
                "unknown permission category '{value}'"
            ))),
        }
    }
}

/// One entry of an association's permission catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    /// Catalog-unique identifier.
    pub id: PermissionId,
    /// Human-readable name.
    pub display_name: String,
    /// Grouping category.
    pub category: PermissionCategory,
    /// Free-text description shown in admin views.
    pub description: String,
}

macro_rules! seed {
    ($id:literal, $name:literal, $category:ident, $description:literal) => {
        PermissionDefinition {
            id: PermissionId($id.to_owned()),
            display_name: $name.to_owned(),
            category: PermissionCategory::$category,
            description: $description.to_owned(),
        }
    };
}

/// Returns the catalog seeded for every newly created association.
///
/// Associations may extend their catalog afterwards; this list is only the
/// starting point and carries the identifiers the financial, membership and
/// document modules check against.
#[must_use]
pub fn default_catalog() -> Vec<PermissionDefinition> {
    vec![
        seed!("view_finances", "View finances", Finances, "Read transactions, balances and tontine state"),
        seed!("manage_finances", "Manage finances", Finances, "Record expenses, income and commissions"),
        seed!("manage_loans", "Manage loans", Finances, "Create loans and track repayments"),
        seed!("manage_tontines", "Manage tontines", Finances, "Configure rotating-savings groups and draws"),
        seed!("view_members", "View members", Members, "Read the member directory"),
        seed!("manage_members", "Manage members", Members, "Approve, reject and exclude members"),
        seed!("manage_roles", "Manage roles", Administration, "Create and modify association roles"),
        seed!("manage_settings", "Manage settings", Administration, "Change association configuration"),
        seed!("view_documents", "View documents", Documents, "Read shared association documents"),
        seed!("manage_documents", "Manage documents", Documents, "Upload and archive documents"),
        seed!("view_events", "View events", Events, "Read the event calendar"),
        seed!("manage_events", "Manage events", Events, "Create and edit events"),
        seed!("manage_sections", "Manage sections", Sections, "Administer regional sections"),
    ]
}
