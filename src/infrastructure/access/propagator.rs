//! Pushes membership changes onto every shared file and folder of a team

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::access::{changed, AccessMap};
use crate::domain::resource::{ResourceKind, ResourceRepository, SharedResource};
use crate::domain::storage::DEFAULT_MAX_BATCH_SIZE;
use crate::domain::team::{MemberId, TeamId, TeamRole};
use crate::domain::DomainError;

/// A membership change to apply to resource ACLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropagationOp {
    /// Give the member exactly the tier of `role`
    Grant { member_id: MemberId, role: TeamRole },
    /// Take the member out of every tier
    Revoke { member_id: MemberId },
    /// Rebuild each ACL from the full membership
    FullResync { members: BTreeMap<MemberId, TeamRole> },
}

impl PropagationOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Grant { .. } => "grant",
            Self::Revoke { .. } => "revoke",
            Self::FullResync { .. } => "full_resync",
        }
    }

    fn apply(&self, current: &AccessMap) -> AccessMap {
        match self {
            Self::Grant { member_id, role } => current.upsert_member(member_id, *role),
            Self::Revoke { member_id } => current.remove_member(member_id),
            Self::FullResync { members } => AccessMap::recompute(members),
        }
    }
}

/// What happened to one resource during a pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropagationResult {
    pub resource_id: String,
    pub name: String,
    pub kind: ResourceKind,
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stored ACL inconsistencies found (and overwritten) on this resource
    #[serde(skip_serializing_if = "is_zero")]
    pub violations: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl PropagationResult {
    fn new(resource: &SharedResource, violations: usize) -> Self {
        Self {
            resource_id: resource.id().to_string(),
            name: resource.name().to_string(),
            kind: resource.kind(),
            updated: false,
            error: None,
            violations,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Per-resource log of one propagation pass, files first then folders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropagationReport {
    pub results: Vec<PropagationResult>,
}

impl PropagationReport {
    pub fn updated_count(&self) -> usize {
        self.results.iter().filter(|r| r.updated).count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !r.updated && !r.is_failed())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }
}

/// Applies membership operations to a team's resources in bounded batches.
///
/// Writes are best effort: a failed resource or chunk is recorded in the
/// report and the pass moves on. Committed chunks are never rolled back.
#[derive(Clone)]
pub struct AccessPropagator {
    resources: Arc<dyn ResourceRepository>,
    batch_size: usize,
}

impl std::fmt::Debug for AccessPropagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessPropagator")
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl AccessPropagator {
    pub fn new(resources: Arc<dyn ResourceRepository>) -> Self {
        Self {
            resources,
            batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Writes staged per commit: the configured size, capped by the store
    pub fn chunk_size(&self) -> usize {
        self.batch_size.min(self.resources.max_batch_size()).max(1)
    }

    /// Runs `op` over every resource of the team.
    ///
    /// Only a failure to load the resource lists is returned as an error.
    pub async fn propagate(
        &self,
        team_id: &TeamId,
        op: &PropagationOp,
        actor: &str,
    ) -> Result<PropagationReport, DomainError> {
        let mut resources = Vec::new();
        for kind in ResourceKind::ALL {
            resources.extend(self.resources.list_for_team(kind, team_id).await?);
        }

        let chunk_size = self.chunk_size();
        let mut report = PropagationReport::default();
        let mut staged: Vec<(usize, SharedResource)> = Vec::with_capacity(chunk_size);
        let mut chunks = 0usize;

        for resource in resources {
            let (current, violations) = AccessMap::from_permission_sets(resource.permissions());

            for violation in &violations {
                warn!(
                    team_id = %team_id,
                    resource_id = %resource.id(),
                    kind = %resource.kind(),
                    violation = %violation,
                    "Stored ACL is inconsistent, rewriting"
                );
            }

            let next = op.apply(&current).to_permission_sets();
            let position = report.results.len();
            report
                .results
                .push(PropagationResult::new(&resource, violations.len()));

            if !changed(resource.permissions(), &next) {
                debug!(resource_id = %resource.id(), kind = %resource.kind(), updated = false, "ACL unchanged");
                continue;
            }

            debug!(resource_id = %resource.id(), kind = %resource.kind(), updated = true, "ACL staged");
            staged.push((position, resource.with_permissions(next, actor)));

            if staged.len() >= chunk_size {
                self.commit(team_id, &mut staged, &mut report).await;
                chunks += 1;
            }
        }

        if !staged.is_empty() {
            self.commit(team_id, &mut staged, &mut report).await;
            chunks += 1;
        }

        info!(
            team_id = %team_id,
            op = op.name(),
            chunks = chunks,
            updated = report.updated_count(),
            unchanged = report.unchanged_count(),
            failed = report.failed_count(),
            "Propagation finished"
        );

        Ok(report)
    }

    async fn commit(
        &self,
        team_id: &TeamId,
        staged: &mut Vec<(usize, SharedResource)>,
        report: &mut PropagationReport,
    ) {
        let (positions, batch): (Vec<usize>, Vec<SharedResource>) = staged.drain(..).unzip();
        let size = batch.len();

        match self.resources.commit_permissions(batch).await {
            Ok(outcomes) => {
                for (position, outcome) in positions.iter().zip(outcomes) {
                    let result = &mut report.results[*position];
                    match outcome.error {
                        None => result.updated = true,
                        Some(e) => {
                            warn!(team_id = %team_id, resource_id = %outcome.key, error = %e, "Resource write failed");
                            result.error = Some(e.to_string());
                        }
                    }
                }
            }
            Err(e) => {
                warn!(team_id = %team_id, size = size, error = %e, "Batch commit failed");
                for position in &positions {
                    report.results[*position].error = Some(e.to_string());
                }
            }
        }

        // Outcomes shorter than the batch leave entries unaccounted for
        for position in positions {
            let result = &mut report.results[position];
            if !result.updated && result.error.is_none() {
                result.error = Some("No outcome reported for write".to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::{PermissionSets, PermissionTier};
    use crate::domain::resource::{MockResourceRepository, ResourceId};
    use crate::domain::storage::BatchItemOutcome;
    use crate::infrastructure::resource::StorageResourceRepository;
    use crate::infrastructure::storage::InMemoryStorage;

    fn id(raw: &str) -> MemberId {
        MemberId::new(raw).unwrap()
    }

    fn team() -> TeamId {
        TeamId::new("team-a").unwrap()
    }

    fn resource(raw_id: &str, kind: ResourceKind, permissions: PermissionSets) -> SharedResource {
        SharedResource::new(
            ResourceId::new(raw_id).unwrap(),
            kind,
            raw_id.to_uppercase(),
            team(),
            permissions,
        )
        .unwrap()
    }

    async fn seeded_repo(
        resources: Vec<SharedResource>,
        max_batch_size: usize,
    ) -> Arc<StorageResourceRepository> {
        let repo = StorageResourceRepository::new(
            Arc::new(InMemoryStorage::new().with_max_batch_size(max_batch_size)),
            Arc::new(InMemoryStorage::new().with_max_batch_size(max_batch_size)),
        );
        for resource in resources {
            repo.create(resource).await.unwrap();
        }
        Arc::new(repo)
    }

    async fn stored(repo: &StorageResourceRepository) -> Vec<SharedResource> {
        let mut all = repo.list_for_team(ResourceKind::File, &team()).await.unwrap();
        all.extend(repo.list_for_team(ResourceKind::Folder, &team()).await.unwrap());
        all
    }

    fn assert_single_tier(resources: &[SharedResource]) {
        for resource in resources {
            let (_, violations) = AccessMap::from_permission_sets(resource.permissions());
            assert!(violations.is_empty(), "{} has {:?}", resource.id(), violations);
        }
    }

    #[tokio::test]
    async fn test_grant_then_revoke_then_converged() {
        let base = PermissionSets::new().with(PermissionTier::Admin, &["ana"]);
        let repo = seeded_repo(
            vec![
                resource("f1", ResourceKind::File, base.clone()),
                resource("f2", ResourceKind::File, base.clone()),
            ],
            500,
        )
        .await;
        let propagator = AccessPropagator::new(repo.clone());

        let grant = PropagationOp::Grant {
            member_id: id("bo"),
            role: TeamRole::Member,
        };
        let report = propagator.propagate(&team(), &grant, "ana").await.unwrap();
        assert_eq!(report.updated_count(), 2);
        assert_eq!(report.results[0].resource_id, "f1");
        assert_eq!(report.results[1].resource_id, "f2");

        for resource in stored(&repo).await {
            assert_eq!(resource.permissions().edit, vec!["bo".to_string()]);
            assert_eq!(resource.last_modified_by(), Some("ana"));
        }

        let revoke = PropagationOp::Revoke { member_id: id("bo") };
        let report = propagator.propagate(&team(), &revoke, "ana").await.unwrap();
        assert_eq!(report.updated_count(), 2);

        for resource in stored(&repo).await {
            assert!(resource.permissions().tiers_containing("bo").is_empty());
        }

        let members = BTreeMap::from([(id("ana"), TeamRole::Owner)]);
        let resync = PropagationOp::FullResync { members };
        let report = propagator.propagate(&team(), &resync, "system").await.unwrap();
        assert_eq!(report.updated_count(), 0);
        assert_eq!(report.unchanged_count(), 2);
    }

    #[tokio::test]
    async fn test_grant_moves_existing_viewer_to_edit() {
        let repo = seeded_repo(
            vec![
                resource("f1", ResourceKind::File, PermissionSets::new()),
                resource(
                    "f2",
                    ResourceKind::File,
                    PermissionSets::new().with(PermissionTier::View, &["bo"]),
                ),
            ],
            500,
        )
        .await;
        let propagator = AccessPropagator::new(repo.clone());

        let grant = PropagationOp::Grant {
            member_id: id("bo"),
            role: TeamRole::Member,
        };
        let report = propagator.propagate(&team(), &grant, "ana").await.unwrap();
        assert_eq!(report.updated_count(), 2);
        assert_eq!(report.failed_count(), 0);
        assert!(report.results.iter().all(|r| r.updated));

        let resources = stored(&repo).await;
        assert_eq!(resources.len(), 2);
        for resource in &resources {
            assert_eq!(resource.permissions().edit, vec!["bo".to_string()]);
            assert!(resource.permissions().view.is_empty());
        }
        assert_single_tier(&resources);

        let revoke = PropagationOp::Revoke { member_id: id("bo") };
        let report = propagator.propagate(&team(), &revoke, "ana").await.unwrap();
        assert_eq!(report.updated_count(), 2);
        assert!(report.results.iter().all(|r| r.updated));

        for resource in stored(&repo).await {
            assert!(resource.permissions().tiers_containing("bo").is_empty());
        }
    }

    #[tokio::test]
    async fn test_files_before_folders() {
        let repo = seeded_repo(
            vec![
                resource("a-folder", ResourceKind::Folder, PermissionSets::new()),
                resource("z-file", ResourceKind::File, PermissionSets::new()),
            ],
            500,
        )
        .await;
        let propagator = AccessPropagator::new(repo);

        let grant = PropagationOp::Grant {
            member_id: id("bo"),
            role: TeamRole::Viewer,
        };
        let report = propagator.propagate(&team(), &grant, "ana").await.unwrap();

        assert_eq!(report.results[0].kind, ResourceKind::File);
        assert_eq!(report.results[1].kind, ResourceKind::Folder);
    }

    #[tokio::test]
    async fn test_full_resync_is_idempotent() {
        let repo = seeded_repo(
            vec![
                resource("f1", ResourceKind::File, PermissionSets::new()),
                resource("d1", ResourceKind::Folder, PermissionSets::new()),
            ],
            500,
        )
        .await;
        let propagator = AccessPropagator::new(repo.clone());
        let members = BTreeMap::from([
            (id("ana"), TeamRole::Owner),
            (id("bo"), TeamRole::Member),
            (id("cy"), TeamRole::Viewer),
        ]);
        let op = PropagationOp::FullResync { members };

        let first = propagator.propagate(&team(), &op, "ana").await.unwrap();
        assert_eq!(first.updated_count(), 2);

        let second = propagator.propagate(&team(), &op, "ana").await.unwrap();
        assert_eq!(second.updated_count(), 0);
        assert_eq!(second.unchanged_count(), 2);

        let resources = stored(&repo).await;
        assert_single_tier(&resources);
        assert_eq!(resources[0].permissions().view, vec!["cy".to_string()]);
    }

    #[tokio::test]
    async fn test_role_change_moves_between_tiers() {
        let sets = PermissionSets::new()
            .with(PermissionTier::Admin, &["ana"])
            .with(PermissionTier::View, &["bo"]);
        let repo = seeded_repo(vec![resource("f1", ResourceKind::File, sets)], 500).await;
        let propagator = AccessPropagator::new(repo.clone());

        let op = PropagationOp::Grant {
            member_id: id("bo"),
            role: TeamRole::Admin,
        };
        propagator.propagate(&team(), &op, "ana").await.unwrap();

        let permissions = stored(&repo).await[0].permissions().clone();
        assert!(permissions.view.is_empty());
        assert!(permissions.edit.is_empty());
        assert_eq!(permissions.admin, vec!["ana".to_string(), "bo".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupted_acl_is_repaired() {
        let corrupted = PermissionSets::new()
            .with(PermissionTier::View, &["bo"])
            .with(PermissionTier::Admin, &["bo", "ana"]);
        let repo = seeded_repo(vec![resource("f1", ResourceKind::File, corrupted)], 500).await;
        let propagator = AccessPropagator::new(repo.clone());

        let op = PropagationOp::Grant {
            member_id: id("cy"),
            role: TeamRole::Member,
        };
        let report = propagator.propagate(&team(), &op, "ana").await.unwrap();
        assert_eq!(report.results[0].violations, 1);
        assert!(report.results[0].updated);

        let resources = stored(&repo).await;
        assert_single_tier(&resources);
        assert_eq!(resources[0].permissions().view, vec!["bo".to_string()]);
    }

    #[tokio::test]
    async fn test_chunks_respect_store_ceiling() {
        let resources = (0..7)
            .map(|n| resource(&format!("f{}", n), ResourceKind::File, PermissionSets::new()))
            .collect();
        let repo = seeded_repo(resources, 3).await;
        let propagator = AccessPropagator::new(repo.clone()).with_batch_size(500);
        assert_eq!(propagator.chunk_size(), 3);

        let op = PropagationOp::Grant {
            member_id: id("bo"),
            role: TeamRole::Member,
        };
        let report = propagator.propagate(&team(), &op, "ana").await.unwrap();

        assert_eq!(report.total(), 7);
        assert_eq!(report.updated_count(), 7);
        assert_eq!(report.failed_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_abort_others() {
        let files: Vec<SharedResource> = (0..5)
            .map(|n| resource(&format!("f{}", n), ResourceKind::File, PermissionSets::new()))
            .collect();

        let mut repo = MockResourceRepository::new();
        repo.expect_max_batch_size().return_const(500usize);
        repo.expect_list_for_team()
            .returning(move |kind, _| match kind {
                ResourceKind::File => Ok(files.clone()),
                ResourceKind::Folder => Ok(Vec::new()),
            });
        repo.expect_commit_permissions()
            .times(3)
            .returning(|batch| {
                if batch.iter().any(|r| r.id().as_str() == "f2") {
                    return Err(DomainError::storage("connection reset"));
                }
                Ok(batch
                    .iter()
                    .map(|r| BatchItemOutcome::applied(r.id().as_str()))
                    .collect())
            });

        let propagator = AccessPropagator::new(Arc::new(repo)).with_batch_size(2);
        let op = PropagationOp::Grant {
            member_id: id("bo"),
            role: TeamRole::Member,
        };
        let report = propagator.propagate(&team(), &op, "ana").await.unwrap();

        assert_eq!(report.total(), 5);
        assert_eq!(report.updated_count(), 3);
        assert_eq!(report.failed_count(), 2);
        assert!(report.results[2].is_failed());
        assert!(report.results[3].is_failed());
        assert!(report.results[4].updated);
    }

    #[tokio::test]
    async fn test_deleted_resource_recorded_per_item() {
        let mut repo = MockResourceRepository::new();
        repo.expect_max_batch_size().return_const(500usize);
        repo.expect_list_for_team().returning(|kind, _| match kind {
            ResourceKind::File => Ok(vec![
                resource("f1", ResourceKind::File, PermissionSets::new()),
                resource("f2", ResourceKind::File, PermissionSets::new()),
            ]),
            ResourceKind::Folder => Ok(Vec::new()),
        });
        repo.expect_commit_permissions().times(1).returning(|_| {
            Ok(vec![
                BatchItemOutcome::applied("f1"),
                BatchItemOutcome::failed("f2", DomainError::not_found("gone")),
            ])
        });

        let propagator = AccessPropagator::new(Arc::new(repo));
        let grant = PropagationOp::Grant {
            member_id: id("bo"),
            role: TeamRole::Viewer,
        };

        let report = propagator.propagate(&team(), &grant, "ana").await.unwrap();
        assert!(report.results[0].updated);
        assert!(!report.results[1].updated);
        assert!(report.results[1].error.is_some());
    }

    #[tokio::test]
    async fn test_load_failure_is_returned() {
        let mut repo = MockResourceRepository::new();
        repo.expect_max_batch_size().return_const(500usize);
        repo.expect_list_for_team()
            .returning(|_, _| Err(DomainError::storage("unavailable")));
        repo.expect_commit_permissions().never();

        let propagator = AccessPropagator::new(Arc::new(repo));
        let op = PropagationOp::Revoke { member_id: id("bo") };

        let result = propagator.propagate(&team(), &op, "ana").await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }
}
