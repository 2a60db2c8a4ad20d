//! Stored permission sets and the order-independent diff between them

use serde::{Deserialize, Serialize};

use super::tier::PermissionTier;

/// The `{view, edit, admin}` id lists persisted on each shared resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSets {
    #[serde(default)]
    pub view: Vec<String>,
    #[serde(default)]
    pub edit: Vec<String>,
    #[serde(default)]
    pub admin: Vec<String>,
}

impl PermissionSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used mostly by fixtures
    pub fn with(mut self, tier: PermissionTier, ids: &[&str]) -> Self {
        self.tier_mut(tier).extend(ids.iter().map(|id| id.to_string()));
        self
    }

    pub fn tier(&self, tier: PermissionTier) -> &[String] {
        match tier {
            PermissionTier::View => &self.view,
            PermissionTier::Edit => &self.edit,
            PermissionTier::Admin => &self.admin,
        }
    }

    pub fn tier_mut(&mut self, tier: PermissionTier) -> &mut Vec<String> {
        match tier {
            PermissionTier::View => &mut self.view,
            PermissionTier::Edit => &mut self.edit,
            PermissionTier::Admin => &mut self.admin,
        }
    }

    /// Tiers in which `id` appears, least privileged first
    pub fn tiers_containing(&self, id: &str) -> Vec<PermissionTier> {
        PermissionTier::ALL
            .into_iter()
            .filter(|tier| self.tier(*tier).iter().any(|entry| entry == id))
            .collect()
    }

    /// Copy with every set sorted and deduplicated
    pub fn normalized(&self) -> Self {
        let normalize = |ids: &[String]| {
            let mut ids = ids.to_vec();
            ids.sort();
            ids.dedup();
            ids
        };

        Self {
            view: normalize(&self.view),
            edit: normalize(&self.edit),
            admin: normalize(&self.admin),
        }
    }

    /// True when any of the three sets differs from `other`, ignoring order and duplicates
    pub fn changed(&self, other: &PermissionSets) -> bool {
        self.normalized() != other.normalized()
    }
}

/// True when `old` and `new` grant different access
pub fn changed(old: &PermissionSets, new: &PermissionSets) -> bool {
    old.changed(new)
}
