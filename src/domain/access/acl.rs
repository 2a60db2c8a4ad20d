//! Access maps: one tier per member, computed from team membership

use std::collections::BTreeMap;

use serde::Serialize;

use super::permission_set::PermissionSets;
use super::tier::PermissionTier;
use crate::domain::team::{MemberId, TeamRole};

/// Inconsistency found while reading stored permission sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AclViolation {
    /// The id was listed under more than one tier
    MultipleTiers {
        member_id: String,
        tiers: Vec<PermissionTier>,
    },
    /// The stored entry is not a usable member id and was dropped
    InvalidMemberId { raw: String },
}

impl std::fmt::Display for AclViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleTiers { member_id, tiers } => {
                let names: Vec<&str> = tiers.iter().map(PermissionTier::as_str).collect();
                write!(f, "'{}' listed under {}", member_id, names.join(", "))
            }
            Self::InvalidMemberId { raw } => write!(f, "invalid member id '{}'", raw),
        }
    }
}

/// Resource ACL keyed by member. A member holds at most one tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessMap(BTreeMap<MemberId, PermissionTier>);

impl AccessMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full target ACL for a membership snapshot
    pub fn recompute(members: &BTreeMap<MemberId, TeamRole>) -> Self {
        members
            .iter()
            .fold(Self::new(), |acl, (id, role)| acl.upsert_member(id, *role))
    }

    /// Next ACL with `member_id` holding exactly the tier of `role`
    pub fn upsert_member(&self, member_id: &MemberId, role: TeamRole) -> Self {
        let mut next = self.clone();
        next.0.insert(member_id.clone(), PermissionTier::for_role(role));
        next
    }

    /// Next ACL without `member_id`; unchanged when absent
    pub fn remove_member(&self, member_id: &MemberId) -> Self {
        let mut next = self.clone();
        next.0.remove(member_id);
        next
    }

    pub fn tier_of(&self, member_id: &MemberId) -> Option<PermissionTier> {
        self.0.get(member_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MemberId, PermissionTier)> {
        self.0.iter().map(|(id, tier)| (id, *tier))
    }

    /// Read stored sets, reporting anything that breaks the one-tier rule.
    ///
    /// An id listed under several tiers keeps the least privileged one.
    pub fn from_permission_sets(sets: &PermissionSets) -> (Self, Vec<AclViolation>) {
        let mut map = BTreeMap::new();
        let mut violations = Vec::new();

        // Highest tier first so lower tiers overwrite it
        for tier in PermissionTier::ALL.into_iter().rev() {
            for raw in sets.tier(tier) {
                match MemberId::new(raw.as_str()) {
                    Ok(id) => {
                        map.insert(id, tier);
                    }
                    Err(_) => {
                        let violation = AclViolation::InvalidMemberId { raw: raw.clone() };
                        if !violations.contains(&violation) {
                            violations.push(violation);
                        }
                    }
                }
            }
        }

        for id in map.keys() {
            let tiers = sets.tiers_containing(id.as_str());

            if tiers.len() > 1 {
                violations.push(AclViolation::MultipleTiers {
                    member_id: id.to_string(),
                    tiers,
                });
            }
        }

        (Self(map), violations)
    }

    /// Render as sorted, deduplicated stored sets
    pub fn to_permission_sets(&self) -> PermissionSets {
        let mut sets = PermissionSets::new();

        // BTreeMap iteration keeps each list sorted
        for (id, tier) in &self.0 {
            sets.tier_mut(*tier).push(id.to_string());
        }

        sets
    }
}
