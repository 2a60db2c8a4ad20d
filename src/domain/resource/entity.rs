//! Shared file and folder metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::access::PermissionSets;
use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

const MAX_RESOURCE_NAME_LENGTH: usize = 255;

/// Resource identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if id.trim().is_empty() {
            return Err(DomainError::invalid_id("Resource ID cannot be empty"));
        }

        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResourceId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for ResourceId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Collection a resource lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    File,
    Folder,
}

impl ResourceKind {
    /// Propagation order: files first, then folders
    pub const ALL: [ResourceKind; 2] = [Self::File, Self::Folder];

    /// Backing collection name
    pub fn collection(&self) -> &'static str {
        match self {
            Self::File => "shared_files",
            Self::Folder => "shared_folders",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Folder => write!(f, "folder"),
        }
    }
}

/// A shared file or folder; only its permission metadata is modelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedResource {
    id: ResourceId,
    kind: ResourceKind,
    name: String,
    team_id: TeamId,
    #[serde(default)]
    permissions: PermissionSets,
    last_modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl SharedResource {
    pub fn new(
        id: ResourceId,
        kind: ResourceKind,
        name: impl Into<String>,
        team_id: TeamId,
        permissions: PermissionSets,
    ) -> Result<Self, DomainError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("Resource name cannot be empty"));
        }

        if name.len() > MAX_RESOURCE_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Resource name cannot exceed {} characters",
                MAX_RESOURCE_NAME_LENGTH
            )));
        }

        let now = Utc::now();

        Ok(Self {
            id,
            kind,
            name,
            team_id,
            permissions,
            last_modified: now,
            last_modified_by: None,
            created_at: now,
        })
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn team_id(&self) -> &TeamId {
        &self.team_id
    }

    pub fn permissions(&self) -> &PermissionSets {
        &self.permissions
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn last_modified_by(&self) -> Option<&str> {
        self.last_modified_by.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Copy carrying new permissions and a fresh last-modified marker
    pub fn with_permissions(&self, permissions: PermissionSets, modified_by: &str) -> Self {
        Self {
            permissions,
            last_modified: Utc::now(),
            last_modified_by: Some(modified_by.to_string()),
            ..self.clone()
        }
    }
}

impl StorageEntity for SharedResource {
    type Key = ResourceId;

    fn key(&self) -> &Self::Key {
        &self.id
    }

    fn partition_key(&self) -> Option<&str> {
        Some(self.team_id.as_str())
    }
}
