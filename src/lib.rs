//! Teamshare
//!
//! Keeps the access lists of a team's shared files and folders in line with
//! the team's membership:
//! - Role-ranked membership with owner, admin, member and viewer roles
//! - Exit-request workflow for members leaving a team
//! - Batched, best-effort ACL propagation and full resynchronisation
//! - In-memory or PostgreSQL storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::resource::{ResourceKind, SharedResource};
use domain::team::Team;
use infrastructure::access::{AccessPropagator, Reconciler};
use infrastructure::auth::JwtService;
use infrastructure::membership::MembershipService;
use infrastructure::resource::{ResourceService, StorageResourceRepository};
use infrastructure::storage::StorageFactory;
use infrastructure::team::StorageTeamRepository;
use tracing::info;

/// Collection holding team documents
pub const TEAMS_COLLECTION: &str = "teams";

/// Repositories and the propagator wired against one storage backend
#[derive(Debug, Clone)]
pub struct Repositories {
    pub teams: Arc<StorageTeamRepository>,
    pub resources: Arc<StorageResourceRepository>,
    pub propagator: AccessPropagator,
}

impl Repositories {
    /// Opens every collection on the given factory
    pub async fn open(factory: &StorageFactory, batch_size: usize) -> anyhow::Result<Self> {
        let team_storage = factory.collection::<Team>(TEAMS_COLLECTION).await?;
        let file_storage = factory
            .collection::<SharedResource>(ResourceKind::File.collection())
            .await?;
        let folder_storage = factory
            .collection::<SharedResource>(ResourceKind::Folder.collection())
            .await?;

        let teams = Arc::new(StorageTeamRepository::new(team_storage));
        let resources = Arc::new(StorageResourceRepository::new(file_storage, folder_storage));
        let propagator = AccessPropagator::new(resources.clone()).with_batch_size(batch_size);

        Ok(Self {
            teams,
            resources,
            propagator,
        })
    }

    /// Connects to the configured backend and opens every collection
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let storage_config = config.storage.to_storage_config()?;
        let factory = StorageFactory::connect(&storage_config).await?;

        info!(
            backend = ?factory.storage_type(),
            batch_size = config.propagation.batch_size,
            "Storage ready"
        );

        Self::open(&factory, config.propagation.batch_size).await
    }

    pub fn reconciler(&self) -> Reconciler<StorageTeamRepository> {
        Reconciler::new(self.teams.clone(), self.propagator.clone())
    }
}

/// Create the application state with all services initialized
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let repositories = Repositories::connect(config).await?;
    Ok(build_app_state(repositories, JwtService::new(config.auth.jwt_config())))
}

/// Wires services over already opened repositories
pub fn build_app_state(repositories: Repositories, jwt_service: JwtService) -> AppState {
    let membership_service = Arc::new(MembershipService::new(
        repositories.teams.clone(),
        repositories.propagator.clone(),
    ));
    let resource_service = Arc::new(ResourceService::new(
        repositories.teams.clone(),
        repositories.resources.clone(),
    ));

    AppState::new(membership_service, resource_service, Arc::new(jwt_service))
}
