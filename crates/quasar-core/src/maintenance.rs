//! Periodic housekeeping: expire stale invitations and purge old
//! notifications.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::traits::{NotificationStore, TeamStore};

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);
pub const DEFAULT_NOTIFICATION_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy)]
pub struct MaintenanceConfig {
    pub interval: Duration,
    pub notification_retention: TimeDelta,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            notification_retention: TimeDelta::days(DEFAULT_NOTIFICATION_RETENTION_DAYS),
        }
    }
}

/// What one sweep changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_invitations: u64,
    pub purged_notifications: u64,
}

/// Events emitted by the sweeper for monitoring.
#[derive(Debug, Clone)]
pub enum MaintenanceEvent<'a> {
    Started { interval: Duration },
    SweepCompleted { report: SweepReport },
    SweepFailed { error: &'a AppError },
    Stopped,
}

pub trait MaintenanceReporter: Send + Sync {
    fn report(&self, event: MaintenanceEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMaintenanceReporter;

impl MaintenanceReporter for TracingMaintenanceReporter {
    fn report(&self, event: MaintenanceEvent<'_>) {
        match event {
            MaintenanceEvent::Started { interval } => {
                tracing::info!(interval_secs = interval.as_secs(), "Maintenance started");
            }
            MaintenanceEvent::SweepCompleted { report } => {
                if report == SweepReport::default() {
                    tracing::debug!("Maintenance sweep found nothing to do");
                } else {
                    tracing::info!(
                        expired_invitations = report.expired_invitations,
                        purged_notifications = report.purged_notifications,
                        "Maintenance sweep completed"
                    );
                }
            }
            MaintenanceEvent::SweepFailed { error } => {
                tracing::error!(%error, "Maintenance sweep failed");
            }
            MaintenanceEvent::Stopped => {
                tracing::info!("Maintenance stopped");
            }
        }
    }
}

pub struct MaintenanceService<T, N>
where
    T: TeamStore,
    N: NotificationStore,
{
    team: T,
    notifications: N,
    config: MaintenanceConfig,
}

impl<T, N> MaintenanceService<T, N>
where
    T: TeamStore,
    N: NotificationStore,
{
    pub fn new(team: T, notifications: N, config: MaintenanceConfig) -> Self {
        Self {
            team,
            notifications,
            config,
        }
    }

    /// Run a single sweep.
    pub async fn sweep(&self) -> Result<SweepReport, AppError> {
        let now = Utc::now();
        let expired_invitations = self.team.expire_invitations(now).await?;
        let purged_notifications = self
            .notifications
            .delete_notifications_before(now - self.config.notification_retention)
            .await?;
        Ok(SweepReport {
            expired_invitations,
            purged_notifications,
        })
    }

    /// Sweep immediately, then every interval until cancelled. Failed sweeps
    /// are reported and retried on the next tick.
    pub async fn run<R: MaintenanceReporter>(&self, cancel_token: CancellationToken, reporter: &R) {
        reporter.report(MaintenanceEvent::Started {
            interval: self.config.interval,
        });

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            match self.sweep().await {
                Ok(report) => reporter.report(MaintenanceEvent::SweepCompleted { report }),
                Err(error) => reporter.report(MaintenanceEvent::SweepFailed { error: &error }),
            }

            tokio::select! {
                () = tokio::time::sleep(self.config.interval) => {}
                () = cancel_token.cancelled() => break,
            }
        }

        reporter.report(MaintenanceEvent::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::notification::NewNotification;
    use crate::project::ProjectRole;
    use crate::team::{InvitationStatus, NewInvitation};
    use crate::testutil::{InMemoryStore, sample_new_user};
    use crate::traits::ProjectStore;
    use crate::project::Project;

    #[derive(Default)]
    struct CollectingReporter {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl MaintenanceReporter for CollectingReporter {
        fn report(&self, event: MaintenanceEvent<'_>) {
            let label = match event {
                MaintenanceEvent::Started { .. } => "started".to_string(),
                MaintenanceEvent::SweepCompleted { report } => {
                    format!("sweep:{}:{}", report.expired_invitations, report.purged_notifications)
                }
                MaintenanceEvent::SweepFailed { .. } => "failed".to_string(),
                MaintenanceEvent::Stopped => "stopped".to_string(),
            };
            self.events.lock().unwrap().push(label);
        }
    }

    async fn seed(store: &InMemoryStore) {
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let invitee = store.insert_user(sample_new_user("invitee@college.edu"));
        let project: Project = store.seed_project(&lead);
        store
            .create_invitation(&NewInvitation {
                project_id: project.id,
                invited_user_id: invitee.id,
                invited_by_id: lead.id,
                role: ProjectRole::Member,
                message: None,
                expires_at: Utc::now() - TimeDelta::hours(1),
            })
            .await
            .unwrap();
        let old = store
            .create_notification(&NewNotification::system(invitee.id, "Old", "old"))
            .await
            .unwrap();
        store.backdate_notification(old.id, Utc::now() - TimeDelta::days(45));
        store
            .create_notification(&NewNotification::system(invitee.id, "New", "new"))
            .await
            .unwrap();
        assert!(store.find_project(project.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sweep_expires_and_purges() {
        let store = InMemoryStore::new();
        seed(&store).await;
        let svc = MaintenanceService::new(store.clone(), store.clone(), MaintenanceConfig::default());

        let report = svc.sweep().await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                expired_invitations: 1,
                purged_notifications: 1,
            }
        );
        assert_eq!(svc.sweep().await.unwrap(), SweepReport::default());
        let statuses = store.invitation_statuses();
        assert_eq!(statuses, vec![InvitationStatus::Expired]);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let store = InMemoryStore::new();
        seed(&store).await;
        let svc = MaintenanceService::new(
            store.clone(),
            store,
            MaintenanceConfig {
                interval: Duration::from_secs(3600),
                ..Default::default()
            },
        );
        let reporter = CollectingReporter::default();
        let token = CancellationToken::new();

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });
        tokio::time::timeout(Duration::from_secs(5), svc.run(token, &reporter))
            .await
            .expect("maintenance loop should stop after cancellation");

        let events = reporter.events.lock().unwrap().clone();
        assert_eq!(events, vec!["started", "sweep:1:1", "stopped"]);
    }
}
