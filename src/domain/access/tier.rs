//! Permission tiers and the role → tier classification

use serde::{Deserialize, Serialize};

use crate::domain::team::TeamRole;

/// One of the three mutually exclusive access levels on a shared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionTier {
    View,
    Edit,
    Admin,
}

impl PermissionTier {
    /// All tiers, least privileged first
    pub const ALL: [PermissionTier; 3] = [Self::View, Self::Edit, Self::Admin];

    /// Tier granted to a team role
    pub fn for_role(role: TeamRole) -> Self {
        match role {
            TeamRole::Owner | TeamRole::Admin => Self::Admin,
            TeamRole::Member => Self::Edit,
            TeamRole::Viewer => Self::View,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for PermissionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw role name. Unknown roles fall back to `View`.
pub fn tier_of(role: &str) -> PermissionTier {
    role.parse::<TeamRole>()
        .map(PermissionTier::for_role)
        .unwrap_or(PermissionTier::View)
}
