//! Team entity and related types

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::exit_request::{ExitRequest, ExitRequestStatus};
use super::validation::{
    validate_member_id, validate_team_id, validate_team_name, TeamValidationError,
};
use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Team identifier - alphanumeric + hyphens, max 50 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamId(String);

impl TeamId {
    /// Create a new TeamId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, TeamValidationError> {
        let id = id.into();
        validate_team_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TeamId {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamId> for String {
    fn from(id: TeamId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for TeamId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Member identifier as issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Result<Self, TeamValidationError> {
        let id = id.into();
        validate_member_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MemberId {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MemberId> for String {
    fn from(id: MemberId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a member within a team, totally ordered owner > admin > member > viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    /// Single per team; cannot be removed, demoted or exit
    Owner,
    /// Manages members and their access
    Admin,
    /// Regular contributor
    #[default]
    Member,
    /// Read-only participant
    Viewer,
}

impl TeamRole {
    /// Position in the authorization order; higher outranks lower
    pub fn rank(&self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Admin => 2,
            Self::Member => 1,
            Self::Viewer => 0,
        }
    }

    /// Check if this role is ranked at or above `required`
    pub fn at_least(&self, required: TeamRole) -> bool {
        self.rank() >= required.rank()
    }

    /// Check if this role can manage team members
    pub fn can_manage_members(&self) -> bool {
        self.at_least(Self::Admin)
    }

    /// Minimum role an actor needs to remove or otherwise act on a member holding `self`
    pub fn required_to_manage(&self) -> TeamRole {
        match self {
            Self::Owner | Self::Admin => Self::Owner,
            Self::Member | Self::Viewer => Self::Admin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }
}

impl PartialOrd for TeamRole {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TeamRole {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl FromStr for TeamRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "viewer" => Ok(Self::Viewer),
            other => Err(DomainError::validation(format!("Unknown role '{}'", other))),
        }
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may add new members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvitePolicy {
    /// Only admins and the owner
    #[default]
    AdminsOnly,
    /// Any member except viewers, never above their own role
    Members,
}

/// Team-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSettings {
    /// Role given to joiners when none is requested
    pub default_role: TeamRole,
    pub invite_policy: InvitePolicy,
}

impl Default for TeamSettings {
    fn default() -> Self {
        Self {
            default_role: TeamRole::Member,
            invite_policy: InvitePolicy::default(),
        }
    }
}

/// A team member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    id: MemberId,
    display_name: String,
    email: String,
    role: TeamRole,
    joined_at: DateTime<Utc>,
}

impl Member {
    pub fn new(
        id: MemberId,
        display_name: impl Into<String>,
        email: impl Into<String>,
        role: TeamRole,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: email.into(),
            role,
            joined_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &MemberId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> TeamRole {
        self.role
    }

    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }
}

/// Team entity. The single source of truth for roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    id: TeamId,
    name: String,
    owner_id: MemberId,
    members: BTreeMap<MemberId, Member>,
    #[serde(default)]
    exit_requests: BTreeMap<MemberId, ExitRequest>,
    #[serde(default)]
    settings: TeamSettings,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    revision: u64,
}

impl Team {
    /// Create a new team; `owner` joins with the owner role regardless of the role it carries
    pub fn new(
        id: TeamId,
        name: impl Into<String>,
        owner: Member,
    ) -> Result<Self, TeamValidationError> {
        let name = name.into();
        validate_team_name(&name)?;
        let now = Utc::now();

        let owner = Member {
            role: TeamRole::Owner,
            ..owner
        };
        let owner_id = owner.id.clone();
        let mut members = BTreeMap::new();
        members.insert(owner_id.clone(), owner);

        Ok(Self {
            id,
            name,
            owner_id,
            members,
            exit_requests: BTreeMap::new(),
            settings: TeamSettings::default(),
            created_at: now,
            updated_at: now,
            revision: 0,
        })
    }

    /// Set settings (builder pattern)
    pub fn with_settings(mut self, settings: TeamSettings) -> Self {
        self.settings = settings;
        self
    }

    // Getters

    pub fn id(&self) -> &TeamId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner_id(&self) -> &MemberId {
        &self.owner_id
    }

    pub fn settings(&self) -> &TeamSettings {
        &self.settings
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.get(id)
    }

    pub fn role_of(&self, id: &MemberId) -> Option<TeamRole> {
        self.members.get(id).map(Member::role)
    }

    pub fn is_owner(&self, id: &MemberId) -> bool {
        &self.owner_id == id
    }

    /// Snapshot of member → role used for full recomputation
    pub fn membership_roles(&self) -> BTreeMap<MemberId, TeamRole> {
        self.members
            .iter()
            .map(|(id, member)| (id.clone(), member.role))
            .collect()
    }

    pub fn exit_requests(&self) -> impl Iterator<Item = &ExitRequest> {
        self.exit_requests.values()
    }

    pub fn exit_request(&self, member_id: &MemberId) -> Option<&ExitRequest> {
        self.exit_requests.get(member_id)
    }

    pub fn pending_exit_request(&self, member_id: &MemberId) -> Option<&ExitRequest> {
        self.exit_requests
            .get(member_id)
            .filter(|request| request.is_pending())
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Number of committed writes; a write is accepted only on top of the revision it was loaded at
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn next_revision(&mut self) {
        self.revision += 1;
    }

    /// Verify the owner invariants on a loaded document
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        match self.members.get(&self.owner_id) {
            Some(owner) if owner.role == TeamRole::Owner => {}
            _ => {
                return Err(DomainError::internal(format!(
                    "Team '{}' owner '{}' is missing or not marked owner",
                    self.id, self.owner_id
                )));
            }
        }

        let owners = self
            .members
            .values()
            .filter(|m| m.role == TeamRole::Owner)
            .count();

        if owners != 1 {
            return Err(DomainError::internal(format!(
                "Team '{}' has {} owners",
                self.id, owners
            )));
        }

        if self.exit_requests.contains_key(&self.owner_id) {
            return Err(DomainError::internal(format!(
                "Team '{}' owner holds an exit request",
                self.id
            )));
        }

        Ok(())
    }

    // Mutators

    /// Add a new member
    pub fn insert_member(&mut self, member: Member) -> Result<(), DomainError> {
        if member.role == TeamRole::Owner {
            return Err(DomainError::forbidden("A team can only have one owner"));
        }

        if self.members.contains_key(&member.id) {
            return Err(DomainError::conflict(format!(
                "'{}' is already a member of team '{}'",
                member.id, self.id
            )));
        }

        self.members.insert(member.id.clone(), member);
        self.touch();
        Ok(())
    }

    /// Remove a member along with any exit request it holds
    pub fn remove_member(&mut self, id: &MemberId) -> Result<Member, DomainError> {
        if self.is_owner(id) {
            return Err(DomainError::forbidden("The team owner cannot be removed"));
        }

        let member = self
            .members
            .remove(id)
            .ok_or_else(|| self.member_not_found(id))?;

        self.exit_requests.remove(id);
        self.touch();
        Ok(member)
    }

    /// Change a member's role, returning the previous one
    pub fn set_role(&mut self, id: &MemberId, role: TeamRole) -> Result<TeamRole, DomainError> {
        if self.is_owner(id) {
            return Err(DomainError::forbidden("The team owner's role cannot be changed"));
        }

        if role == TeamRole::Owner {
            return Err(DomainError::forbidden("The owner role cannot be assigned"));
        }

        let not_found = self.member_not_found(id);
        let member = self.members.get_mut(id).ok_or(not_found)?;

        if member.role == role {
            return Err(DomainError::conflict(format!(
                "'{}' already has the {} role",
                id, role
            )));
        }

        let previous = std::mem::replace(&mut member.role, role);
        self.touch();
        Ok(previous)
    }

    /// Open an exit request for an existing, non-owner member
    pub fn open_exit_request(&mut self, request: ExitRequest) -> Result<(), DomainError> {
        let member_id = request.member_id().clone();

        if self.is_owner(&member_id) {
            return Err(DomainError::forbidden("The team owner cannot exit the team"));
        }

        if !self.members.contains_key(&member_id) {
            return Err(self.member_not_found(&member_id));
        }

        if self.pending_exit_request(&member_id).is_some() {
            return Err(DomainError::conflict(format!(
                "'{}' already has a pending exit request",
                member_id
            )));
        }

        // A rejected request is replaced by the new one
        self.exit_requests.insert(member_id, request);
        self.touch();
        Ok(())
    }

    /// Mark a pending request rejected; the member stays
    pub fn reject_exit_request(
        &mut self,
        member_id: &MemberId,
        by: &MemberId,
        reason: Option<String>,
    ) -> Result<&ExitRequest, DomainError> {
        self.require_pending(member_id)?;

        if let Some(request) = self.exit_requests.get_mut(member_id) {
            request.resolve(ExitRequestStatus::Rejected, by.clone(), reason);
        }

        self.touch();
        self.exit_requests
            .get(member_id)
            .ok_or_else(|| DomainError::internal("Exit request vanished during rejection"))
    }

    /// Approve a pending request: the member and the request are both removed
    pub fn approve_exit_request(
        &mut self,
        member_id: &MemberId,
        by: &MemberId,
    ) -> Result<ExitRequest, DomainError> {
        self.require_pending(member_id)?;

        let mut request = self
            .exit_requests
            .remove(member_id)
            .ok_or_else(|| self.exit_request_not_found(member_id))?;
        request.resolve(ExitRequestStatus::Approved, by.clone(), None);

        self.members.remove(member_id);
        self.touch();
        Ok(request)
    }

    /// Withdraw a pending request
    pub fn cancel_exit_request(&mut self, member_id: &MemberId) -> Result<ExitRequest, DomainError> {
        self.require_pending(member_id)?;

        let request = self
            .exit_requests
            .remove(member_id)
            .ok_or_else(|| self.exit_request_not_found(member_id))?;

        self.touch();
        Ok(request)
    }

    fn require_pending(&self, member_id: &MemberId) -> Result<(), DomainError> {
        match self.exit_requests.get(member_id) {
            Some(request) if request.is_pending() => Ok(()),
            Some(request) => Err(DomainError::conflict(format!(
                "Exit request for '{}' is already {}",
                member_id,
                request.status()
            ))),
            None => Err(self.exit_request_not_found(member_id)),
        }
    }

    fn member_not_found(&self, id: &MemberId) -> DomainError {
        DomainError::not_found(format!("'{}' is not a member of team '{}'", id, self.id))
    }

    fn exit_request_not_found(&self, id: &MemberId) -> DomainError {
        DomainError::not_found(format!(
            "No exit request from '{}' in team '{}'",
            id, self.id
        ))
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl StorageEntity for Team {
    type Key = TeamId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}
