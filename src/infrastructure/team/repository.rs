//! Team documents kept in a single storage collection

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::storage::Storage;
use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::DomainError;

/// Validates team invariants on every write before handing the document to storage.
/// Updates are compare-and-swap on the team revision.
#[derive(Debug)]
pub struct StorageTeamRepository {
    storage: Arc<dyn Storage<Team>>,
    writes: Mutex<()>,
}

impl StorageTeamRepository {
    pub fn new(storage: Arc<dyn Storage<Team>>) -> Self {
        Self {
            storage,
            writes: Mutex::new(()),
        }
    }
}

#[async_trait]
impl TeamRepository for StorageTeamRepository {
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError> {
        self.storage.get(id).await
    }

    async fn create(&self, team: Team) -> Result<Team, DomainError> {
        team.check_invariants()?;
        let id = team.id().clone();

        self.storage.create(team).await.map_err(|e| {
            if e.is_conflict() {
                DomainError::conflict(format!("Team '{}' already exists", id))
            } else {
                e
            }
        })
    }

    async fn update(&self, mut team: Team) -> Result<Team, DomainError> {
        team.check_invariants()?;
        let id = team.id().clone();

        // Held across read-compare-write so two writers cannot both pass the check
        let _writes = self.writes.lock().await;

        let stored = self
            .storage
            .get(&id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))?;

        if stored.revision() != team.revision() {
            warn!(
                team_id = %id,
                expected = team.revision(),
                stored = stored.revision(),
                "Stale team write rejected"
            );
            return Err(DomainError::conflict(format!(
                "Team '{}' was modified concurrently, reload and retry",
                id
            )));
        }

        team.next_revision();

        self.storage.update(team).await.map_err(|e| {
            if e.is_not_found() {
                DomainError::not_found(format!("Team '{}' not found", id))
            } else {
                e
            }
        })
    }

    async fn list(&self) -> Result<Vec<Team>, DomainError> {
        let mut teams = self.storage.list().await?;
        teams.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));
        Ok(teams)
    }

    async fn exists(&self, id: &TeamId) -> Result<bool, DomainError> {
        self.storage.exists(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::team::{Member, MemberId, TeamRole};
    use crate::infrastructure::storage::InMemoryStorage;

    fn repo() -> StorageTeamRepository {
        StorageTeamRepository::new(Arc::new(InMemoryStorage::<Team>::new()))
    }

    fn create_team(id: &str) -> Team {
        let owner = Member::new(
            MemberId::new("ana").unwrap(),
            "Ana",
            "ana@example.org",
            TeamRole::Owner,
        );
        Team::new(TeamId::new(id).unwrap(), "Team", owner).unwrap()
    }

    #[tokio::test]
    async fn test_created_team_round_trips_owner() {
        let repo = repo();
        let team = create_team("team-1");

        repo.create(team.clone()).await.unwrap();

        let retrieved = repo.get(team.id()).await.unwrap().unwrap();
        assert_eq!(retrieved.owner_id().as_str(), "ana");
    }

    #[tokio::test]
    async fn test_duplicate_team_id_conflicts() {
        let repo = repo();

        repo.create(create_team("team-1")).await.unwrap();

        let result = repo.create(create_team("team-1")).await;
        assert!(result.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_update_persists_membership() {
        let repo = repo();
        repo.create(create_team("team-1")).await.unwrap();

        let id = TeamId::new("team-1").unwrap();
        let mut team = repo.get(&id).await.unwrap().unwrap();
        team.insert_member(Member::new(
            MemberId::new("bo").unwrap(),
            "Bo",
            "bo@example.org",
            TeamRole::Viewer,
        ))
        .unwrap();
        repo.update(team).await.unwrap();

        let stored = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(
            stored.role_of(&MemberId::new("bo").unwrap()),
            Some(TeamRole::Viewer)
        );
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let repo = repo();
        repo.create(create_team("team-1")).await.unwrap();

        let id = TeamId::new("team-1").unwrap();
        let mut first = repo.get(&id).await.unwrap().unwrap();
        let mut second = repo.get(&id).await.unwrap().unwrap();

        first
            .insert_member(Member::new(
                MemberId::new("bo").unwrap(),
                "Bo",
                "bo@example.org",
                TeamRole::Member,
            ))
            .unwrap();
        second
            .insert_member(Member::new(
                MemberId::new("cy").unwrap(),
                "Cy",
                "cy@example.org",
                TeamRole::Member,
            ))
            .unwrap();

        let saved = repo.update(first).await.unwrap();
        assert_eq!(saved.revision(), 1);

        let err = repo.update(second).await.unwrap_err();
        assert!(err.is_conflict());

        let stored = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.revision(), 1);
        assert!(stored.member(&MemberId::new("bo").unwrap()).is_some());
        assert!(stored.member(&MemberId::new("cy").unwrap()).is_none());
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_writes() {
        let repo = Arc::new(repo());
        repo.create(create_team("team-1")).await.unwrap();
        let id = TeamId::new("team-1").unwrap();

        let mut handles = Vec::new();
        for name in ["bo", "cy", "di", "ed"] {
            let repo = repo.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    let mut team = repo.get(&id).await.unwrap().unwrap();
                    team.insert_member(Member::new(
                        MemberId::new(name).unwrap(),
                        name,
                        format!("{}@example.org", name),
                        TeamRole::Member,
                    ))
                    .unwrap();
                    match repo.update(team).await {
                        Ok(_) => break,
                        Err(e) if e.is_conflict() => continue,
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.member_count(), 5);
        assert_eq!(stored.revision(), 4);
    }

    #[tokio::test]
    async fn test_update_of_unknown_team_is_not_found() {
        let repo = repo();

        let err = repo.update(create_team("ghost")).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Team 'ghost' not found"));
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let repo = repo();

        repo.create(create_team("team-b")).await.unwrap();
        repo.create(create_team("team-a")).await.unwrap();

        let teams = repo.list().await.unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].id().as_str(), "team-a");
        assert!(repo.exists(teams[1].id()).await.unwrap());
    }
}
