//! Shared resource repository trait

use async_trait::async_trait;

use super::entity::{ResourceKind, SharedResource};
use crate::domain::storage::BatchItemOutcome;
use crate::domain::team::TeamId;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository for shared files and folders
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Registers a new resource
    async fn create(&self, resource: SharedResource) -> Result<SharedResource, DomainError>;

    /// Resources of one kind owned by a team, ordered by id
    async fn list_for_team(
        &self,
        kind: ResourceKind,
        team_id: &TeamId,
    ) -> Result<Vec<SharedResource>, DomainError>;

    /// Writes permission updates for at most `max_batch_size` resources.
    ///
    /// Outcomes are reported per resource in input order.
    async fn commit_permissions(
        &self,
        resources: Vec<SharedResource>,
    ) -> Result<Vec<BatchItemOutcome>, DomainError>;

    /// Hard ceiling on resources per `commit_permissions` call
    fn max_batch_size(&self) -> usize;
}
