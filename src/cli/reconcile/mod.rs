//! Reconcile command - rebuilds resource ACLs from stored membership

use clap::Args;
use tracing::{info, warn};

use crate::domain::team::{TeamId, TeamRepository};
use crate::infrastructure::access::Reconciler;
use crate::Repositories;

#[derive(Args, Debug, Clone)]
pub struct ReconcileArgs {
    /// Only reconcile this team (defaults to every team)
    #[arg(long)]
    pub team: Option<String>,
}

/// Totals over every reconciled team
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub teams: usize,
    pub failed_teams: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed_resources: usize,
}

pub async fn run(args: ReconcileArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let repositories = Repositories::connect(&config).await?;
    let reconciler = repositories.reconciler();

    let summary = reconcile(&reconciler, args.team.as_deref()).await?;

    info!(
        teams = summary.teams,
        failed_teams = summary.failed_teams,
        updated = summary.updated,
        unchanged = summary.unchanged,
        failed_resources = summary.failed_resources,
        "Reconciliation finished"
    );

    if summary.failed_teams > 0 || summary.failed_resources > 0 {
        anyhow::bail!(
            "Reconciliation incomplete: {} team(s) and {} resource(s) failed",
            summary.failed_teams,
            summary.failed_resources
        );
    }

    Ok(())
}

/// Reconciles one team when `team` is given, otherwise every team
pub async fn reconcile<R: TeamRepository>(
    reconciler: &Reconciler<R>,
    team: Option<&str>,
) -> anyhow::Result<ReconcileSummary> {
    let mut summary = ReconcileSummary::default();

    match team {
        Some(team) => {
            let team_id = TeamId::new(team)?;
            let report = reconciler.reconcile_team(&team_id).await?;

            summary.teams = 1;
            summary.updated = report.updated_count();
            summary.unchanged = report.unchanged_count();
            summary.failed_resources = report.failed_count();
        }
        None => {
            for result in reconciler.reconcile_all().await? {
                summary.teams += 1;

                match result.outcome {
                    Ok(report) => {
                        info!(
                            team_id = %result.team_id,
                            updated = report.updated_count(),
                            failed = report.failed_count(),
                            "Team reconciled"
                        );
                        summary.updated += report.updated_count();
                        summary.unchanged += report.unchanged_count();
                        summary.failed_resources += report.failed_count();
                    }
                    Err(e) => {
                        warn!(team_id = %result.team_id, error = %e, "Skipping team");
                        summary.failed_teams += 1;
                    }
                }
            }
        }
    }

    Ok(summary)
}
