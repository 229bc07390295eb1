use amicale_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Hierarchical role names kept for associations not yet migrated to the
/// catalog-based permission model.
///
/// The inheritance table is static: `president` implies every office,
/// the named offices each imply `member`. This path never consults the
/// permission catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyRole {
    /// Association president.
    President,
    /// Vice president.
    Vice,
    /// Treasurer.
    Treasurer,
    /// Secretary.
    Secretary,
    /// Ordinary member.
    Member,
}

impl LegacyRole {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::President => "president",
            Self::Vice => "vice",
            Self::Treasurer => "treasurer",
            Self::Secretary => "secretary",
            Self::Member => "member",
        }
    }

    /// Parses a stored value into a legacy role.
    pub fn from_storage(value: &str) -> AppResult<Self> {
        match value {
            "president" => Ok(Self::President),
            "vice" => Ok(Self::Vice),
            "treasurer" => Ok(Self::Treasurer),
            "secretary" => Ok(Self::Secretary),
            "member" => Ok(Self::Member),
            _ => Err(AppError::Validation(format!(
                "unknown legacy role '{value}'"
            ))),
        }
    }

    /// Returns the roles implied by holding this one, including itself.
    #[must_use]
    pub fn implied_roles(&self) -> &'static [Self] {
        match self {
            Self::President => &[
                Self::President,
                Self::Vice,
                Self::Treasurer,
                Self::Secretary,
                Self::Member,
            ],
            Self::Vice => &[Self::Vice, Self::Member],
            Self::Treasurer => &[Self::Treasurer, Self::Member],
            Self::Secretary => &[Self::Secretary, Self::Member],
            Self::Member => &[Self::Member],
        }
    }

    /// Returns whether holding `self` satisfies a check for `required`.
    #[must_use]
    pub fn satisfies(&self, required: Self) -> bool {
        self.implied_roles().contains(&required)
    }

    /// Catalog permission ids this role carries directly, before the
    /// inheritance table is applied.
    fn own_permissions(&self) -> &'static [&'static str] {
        match self {
            Self::President => &[
                "view_finances",
                "manage_roles",
                "manage_settings",
                "manage_sections",
            ],
            Self::Vice => &["view_finances", "manage_members"],
            Self::Treasurer => &[
                "view_finances",
                "manage_finances",
                "manage_loans",
                "manage_tontines",
            ],
            Self::Secretary => &["manage_documents", "manage_events"],
            Self::Member => &["view_members", "view_documents", "view_events"],
        }
    }

    /// Returns the full permission id set the role implies via the
    /// static hierarchy.
    #[must_use]
    pub fn implied_permissions(&self) -> std::collections::BTreeSet<&'static str> {
        self.implied_roles()
            .iter()
            .flat_map(|role| role.own_permissions().iter().copied())
            .collect()
    }
}
