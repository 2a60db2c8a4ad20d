//! Full resynchronisation job for one team or every team

use std::sync::Arc;

use tracing::{info, warn};

use super::propagator::{AccessPropagator, PropagationOp, PropagationReport};
use crate::domain::team::{TeamId, TeamRepository};
use crate::domain::DomainError;

/// Recorded as `last_modified_by` on writes made without a caller
pub const RECONCILER_ACTOR: &str = "system:reconciler";

/// Result of reconciling one team
#[derive(Debug)]
pub struct TeamReconciliation {
    pub team_id: TeamId,
    pub outcome: Result<PropagationReport, DomainError>,
}

/// Rebuilds resource ACLs from stored membership
#[derive(Debug)]
pub struct Reconciler<R: TeamRepository> {
    teams: Arc<R>,
    propagator: AccessPropagator,
}

impl<R: TeamRepository> Reconciler<R> {
    pub fn new(teams: Arc<R>, propagator: AccessPropagator) -> Self {
        Self { teams, propagator }
    }

    pub async fn reconcile_team(&self, team_id: &TeamId) -> Result<PropagationReport, DomainError> {
        let team = self
            .teams
            .get(team_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", team_id)))?;

        team.check_invariants()?;

        let op = PropagationOp::FullResync {
            members: team.membership_roles(),
        };

        self.propagator
            .propagate(team.id(), &op, RECONCILER_ACTOR)
            .await
    }

    /// Reconciles every stored team; a failing team does not stop the others
    pub async fn reconcile_all(&self) -> Result<Vec<TeamReconciliation>, DomainError> {
        let teams = self.teams.list().await?;
        info!(teams = teams.len(), "Reconciling all teams");

        let mut results = Vec::with_capacity(teams.len());

        for team in teams {
            let team_id = team.id().clone();
            let outcome = self.reconcile_team(&team_id).await;

            if let Err(e) = &outcome {
                warn!(team_id = %team_id, error = %e, "Team reconciliation failed");
            }

            results.push(TeamReconciliation { team_id, outcome });
        }

        Ok(results)
    }
}
