//! Storage-backed shared resource repository

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::resource::{ResourceKind, ResourceRepository, SharedResource};
use crate::domain::storage::{check_batch_size, BatchItemOutcome, Storage};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Keeps files and folders in separate collections, partitioned by team
#[derive(Debug)]
pub struct StorageResourceRepository {
    files: Arc<dyn Storage<SharedResource>>,
    folders: Arc<dyn Storage<SharedResource>>,
}

impl StorageResourceRepository {
    pub fn new(
        files: Arc<dyn Storage<SharedResource>>,
        folders: Arc<dyn Storage<SharedResource>>,
    ) -> Self {
        Self { files, folders }
    }

    fn collection(&self, kind: ResourceKind) -> &Arc<dyn Storage<SharedResource>> {
        match kind {
            ResourceKind::File => &self.files,
            ResourceKind::Folder => &self.folders,
        }
    }
}

#[async_trait]
impl ResourceRepository for StorageResourceRepository {
    async fn create(&self, resource: SharedResource) -> Result<SharedResource, DomainError> {
        self.collection(resource.kind()).create(resource).await
    }

    async fn list_for_team(
        &self,
        kind: ResourceKind,
        team_id: &TeamId,
    ) -> Result<Vec<SharedResource>, DomainError> {
        self.collection(kind).list_partition(team_id.as_str()).await
    }

    /// Each kind goes to its own collection as one batch. A collection that
    /// rejects its whole batch fails only the entries of that kind; the other
    /// collection's outcomes are still reported.
    async fn commit_permissions(
        &self,
        resources: Vec<SharedResource>,
    ) -> Result<Vec<BatchItemOutcome>, DomainError> {
        check_batch_size(resources.len(), self.max_batch_size())?;

        let total = resources.len();
        let mut outcomes: Vec<Option<BatchItemOutcome>> = (0..total).map(|_| None).collect();

        for kind in ResourceKind::ALL {
            let (positions, batch): (Vec<usize>, Vec<SharedResource>) = resources
                .iter()
                .enumerate()
                .filter(|(_, resource)| resource.kind() == kind)
                .map(|(position, resource)| (position, resource.clone()))
                .unzip();

            if batch.is_empty() {
                continue;
            }

            match self.collection(kind).update_batch(batch).await {
                Ok(written) => {
                    for (position, outcome) in positions.into_iter().zip(written) {
                        outcomes[position] = Some(outcome);
                    }
                }
                Err(e) => {
                    warn!(
                        collection = kind.collection(),
                        count = positions.len(),
                        error = %e,
                        "Batch write failed"
                    );
                    for position in positions {
                        outcomes[position] = Some(BatchItemOutcome::failed(
                            resources[position].id().as_str(),
                            e.clone(),
                        ));
                    }
                }
            }
        }

        outcomes
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| DomainError::storage("Batch returned fewer outcomes than writes"))
    }

    fn max_batch_size(&self) -> usize {
        self.files
            .max_batch_size()
            .min(self.folders.max_batch_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::{PermissionSets, PermissionTier};
    use crate::domain::resource::ResourceId;
    use crate::infrastructure::storage::InMemoryStorage;
    use mockall::mock;

    mock! {
        pub FolderStore {}

        #[async_trait]
        impl Storage<SharedResource> for FolderStore {
            async fn get(&self, key: &ResourceId) -> Result<Option<SharedResource>, DomainError>;
            async fn list(&self) -> Result<Vec<SharedResource>, DomainError>;
            async fn create(&self, entity: SharedResource) -> Result<SharedResource, DomainError>;
            async fn update(&self, entity: SharedResource) -> Result<SharedResource, DomainError>;
            async fn update_batch(
                &self,
                entities: Vec<SharedResource>,
            ) -> Result<Vec<BatchItemOutcome>, DomainError>;
            async fn delete(&self, key: &ResourceId) -> Result<bool, DomainError>;
        }
    }

    impl std::fmt::Debug for MockFolderStore {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockFolderStore").finish()
        }
    }

    fn resource(id: &str, kind: ResourceKind, team: &str) -> SharedResource {
        SharedResource::new(
            ResourceId::new(id).unwrap(),
            kind,
            format!("{} name", id),
            TeamId::new(team).unwrap(),
            PermissionSets::new(),
        )
        .unwrap()
    }

    fn create_repo() -> StorageResourceRepository {
        StorageResourceRepository::new(
            Arc::new(InMemoryStorage::new()),
            Arc::new(InMemoryStorage::new()),
        )
    }

    #[tokio::test]
    async fn test_list_for_team_filters_kind_and_team() {
        let repo = create_repo();
        repo.create(resource("f2", ResourceKind::File, "team-a")).await.unwrap();
        repo.create(resource("f1", ResourceKind::File, "team-a")).await.unwrap();
        repo.create(resource("f3", ResourceKind::File, "team-b")).await.unwrap();
        repo.create(resource("d1", ResourceKind::Folder, "team-a")).await.unwrap();

        let team = TeamId::new("team-a").unwrap();
        let files = repo.list_for_team(ResourceKind::File, &team).await.unwrap();
        let ids: Vec<&str> = files.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["f1", "f2"]);

        let folders = repo.list_for_team(ResourceKind::Folder, &team).await.unwrap();
        assert_eq!(folders.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_mixed_kinds_keeps_input_order() {
        let repo = create_repo();
        let file = repo.create(resource("f1", ResourceKind::File, "team-a")).await.unwrap();
        let folder = repo
            .create(resource("d1", ResourceKind::Folder, "team-a"))
            .await
            .unwrap();
        let ghost = resource("gone", ResourceKind::File, "team-a");

        let sets = PermissionSets::new().with(PermissionTier::Edit, &["bo"]);
        let batch = vec![
            folder.with_permissions(sets.clone(), "ana"),
            ghost,
            file.with_permissions(sets.clone(), "ana"),
        ];

        let outcomes = repo.commit_permissions(batch).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].key, "d1");
        assert!(outcomes[0].is_applied());
        assert_eq!(outcomes[1].key, "gone");
        assert!(!outcomes[1].is_applied());
        assert_eq!(outcomes[2].key, "f1");
        assert!(outcomes[2].is_applied());

        let team = TeamId::new("team-a").unwrap();
        let files = repo.list_for_team(ResourceKind::File, &team).await.unwrap();
        assert_eq!(files[0].permissions(), &sets);
        assert_eq!(files[0].last_modified_by(), Some("ana"));
    }

    #[tokio::test]
    async fn test_commit_rejects_oversized_batch() {
        let repo = StorageResourceRepository::new(
            Arc::new(InMemoryStorage::new().with_max_batch_size(2)),
            Arc::new(InMemoryStorage::new()),
        );
        assert_eq!(repo.max_batch_size(), 2);

        let batch = vec![
            resource("f1", ResourceKind::File, "team-a"),
            resource("f2", ResourceKind::File, "team-a"),
            resource("f3", ResourceKind::File, "team-a"),
        ];

        let result = repo.commit_permissions(batch).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_failed_folder_batch_keeps_file_outcomes() {
        let files = Arc::new(InMemoryStorage::new());
        let file = files
            .create(resource("f1", ResourceKind::File, "team-a"))
            .await
            .unwrap();

        let mut folders = MockFolderStore::new();
        folders
            .expect_update_batch()
            .times(1)
            .returning(|_| Err(DomainError::storage("folder store unavailable")));

        let repo = StorageResourceRepository::new(files.clone(), Arc::new(folders));

        let sets = PermissionSets::new().with(PermissionTier::Edit, &["bo"]);
        let folder = resource("d1", ResourceKind::Folder, "team-a");
        let batch = vec![
            file.with_permissions(sets.clone(), "ana"),
            folder.with_permissions(sets.clone(), "ana"),
        ];

        let outcomes = repo.commit_permissions(batch).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].key, "f1");
        assert!(outcomes[0].is_applied());
        assert_eq!(outcomes[1].key, "d1");
        assert!(matches!(
            outcomes[1].error,
            Some(DomainError::Storage { .. })
        ));

        let stored = files
            .get(&ResourceId::new("f1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.permissions(), &sets);
    }
}
