//! Process status shared between the scan loop and the command listener.

use chrono::{DateTime, Utc};
use dealwatch_core::ScanCycleStats;
use dealwatch_telegram::format_duration;

#[derive(Debug, Clone)]
pub(crate) struct RunStatus {
    pub started_at: DateTime<Utc>,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub cycles: u64,
    pub last_stats: Option<ScanCycleStats>,
}

impl RunStatus {
    pub(crate) fn started(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            last_scan_at: None,
            cycles: 0,
            last_stats: None,
        }
    }

    /// Records a finished cycle.
    pub(crate) fn record_cycle(&mut self, stats: ScanCycleStats, now: DateTime<Utc>) {
        self.last_scan_at = Some(now);
        self.cycles += 1;
        self.last_stats = Some(stats);
    }

    /// HTML reply for `/check` and `/status`.
    pub(crate) fn report(&self, tracked_items: i64, now: DateTime<Utc>) -> String {
        let uptime = format_duration(since(self.started_at, now));
        let last_scan = self.last_scan_at.map_or_else(
            || "Never".to_owned(),
            |at| format!("{} ago", format_duration(since(at, now))),
        );

        let mut text = format!(
            "🤖 <b>Dealwatch status</b>\n\n\
             ✅ <b>Running</b>\n\
             ⏳ Uptime: {uptime}\n\
             🔄 Cycles: {}\n\
             🕒 Last scan: {last_scan}\n\
             📦 Items tracked: {tracked_items}",
            self.cycles
        );
        if let Some(stats) = self.last_stats {
            text.push_str(&format!(
                "\n📊 Last cycle: found {} | new {} | sent {}",
                stats.found, stats.unseen, stats.sent
            ));
        }
        text
    }
}

fn since(earlier: DateTime<Utc>, now: DateTime<Utc>) -> std::time::Duration {
    (now - earlier).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn fresh_status_reports_never_scanned() {
        let start = Utc::now();
        let status = RunStatus::started(start);
        let report = status.report(0, start + Duration::seconds(42));

        assert!(report.contains("Uptime: 42s"), "{report}");
        assert!(report.contains("Cycles: 0"));
        assert!(report.contains("Last scan: Never"));
        assert!(report.contains("Items tracked: 0"));
        assert!(!report.contains("Last cycle"));
    }

    #[test]
    fn recorded_cycle_shows_in_report() {
        let start = Utc::now();
        let mut status = RunStatus::started(start);
        let stats = ScanCycleStats {
            found: 30,
            fresh: 9,
            unseen: 4,
            kept: 3,
            sent: 2,
        };
        status.record_cycle(stats, start + Duration::seconds(100));

        let report = status.report(57, start + Duration::seconds(3_725));

        assert!(report.contains("Uptime: 1h2m5s"), "{report}");
        assert!(report.contains("Cycles: 1"));
        assert!(report.contains("Last scan: 1h0m25s ago"));
        assert!(report.contains("Items tracked: 57"));
        assert!(report.contains("found 30 | new 4 | sent 2"));
    }

    #[test]
    fn clock_going_backwards_does_not_panic() {
        let start = Utc::now();
        let status = RunStatus::started(start);
        assert!(status
            .report(1, start - Duration::seconds(5))
            .contains("Uptime: 0s"));
    }
}
