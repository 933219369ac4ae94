//! Background Maintenance
//!
//! Periodically sweeps stale escalation profiles, expired bans, oversized
//! punishment histories and orphaned hardware registrations.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::punishment::BanManager;

/// What one maintenance run removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub expired_bans: usize,
    pub trimmed_records: usize,
    pub pruned_fingerprints: usize,
    pub removed_profiles: usize,
}

impl MaintenanceReport {
    pub fn is_empty(&self) -> bool {
        self.expired_bans == 0
            && self.trimmed_records == 0
            && self.pruned_fingerprints == 0
            && self.removed_profiles == 0
    }
}

/// Run [`BanManager::run_maintenance`] every `interval` until the returned
/// handle is aborted. The first run happens one full interval after start.
pub fn spawn_maintenance(manager: Arc<BanManager>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately
        ticker.tick().await;

        info!(interval_secs = interval.as_secs(), "Starting periodic maintenance");

        loop {
            ticker.tick().await;
            manager.run_maintenance();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEventType, AuditLog, AuditSeverity};
    use crate::clock::ManualClock;
    use crate::violation::{Violation, ViolationKind};

    #[test]
    fn test_report_is_empty() {
        assert!(MaintenanceReport::default().is_empty());
        let report = MaintenanceReport {
            expired_bans: 1,
            ..Default::default()
        };
        assert!(!report.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_task_expires_bans() {
        let clock = ManualClock::starting_now();
        let audit = Arc::new(AuditLog::new().with_min_severity(AuditSeverity::Debug));
        let manager =
            Arc::new(BanManager::with_clock(Arc::new(clock.clone())).with_audit_log(audit));
        manager
            .process_violations("p1", &[Violation::new(ViolationKind::Fly, 0.7)], None)
            .unwrap();
        clock.advance(chrono::Duration::hours(2));

        let handle = spawn_maintenance(manager.clone(), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;
        handle.abort();

        let runs = manager
            .audit_log()
            .recent(100)
            .into_iter()
            .filter(|e| matches!(e.event_type, AuditEventType::MaintenanceCompleted { .. }))
            .count();
        assert_eq!(runs, 1);
        // already swept by the background run
        assert_eq!(manager.cleanup().0, 0);
    }
}
