//! Live refresh loop against a slow in-memory external project

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono_tz::UTC;
    use inout_core::{
        models::{AgentSettings, ChatMessage, DateRange, DisplayPreferences, Period, PeriodSelection},
        traits::{ChatHistorySource, ExternalProject, LeadSource, SortOrder},
        AppError, AppResult,
    };
    use inout_services::{
        DashboardService, DashboardViewer, LiveRefresher, RefreshOutcome, RefreshTrigger,
    };
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::sleep;

    /// Every read waits before answering with no rows
    struct SlowProject {
        latency: Duration,
        /// Per-call latencies used before falling back to `latency`
        scripted: Mutex<VecDeque<Duration>>,
        fetches: AtomicUsize,
    }

    impl SlowProject {
        fn new(latency_ms: u64) -> Self {
            Self {
                latency: Duration::from_millis(latency_ms),
                scripted: Mutex::new(VecDeque::new()),
                fetches: AtomicUsize::new(0),
            }
        }

        fn script(self, latencies_ms: &[u64]) -> Self {
            self.scripted
                .lock()
                .extend(latencies_ms.iter().map(|ms| Duration::from_millis(*ms)));
            self
        }
    }

    #[async_trait]
    impl LeadSource for SlowProject {
        async fn fetch_leads(
            &self,
            _table: &str,
            _range: &DateRange,
            _order: SortOrder,
            _max_rows: usize,
        ) -> AppResult<Vec<Value>> {
            let wait = self.scripted.lock().pop_front().unwrap_or(self.latency);
            sleep(wait).await;
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl ChatHistorySource for SlowProject {
        async fn recent_session_ids(
            &self,
            _table: &str,
            _range: Option<&DateRange>,
            _limit: usize,
        ) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn session_messages(
            &self,
            _table: &str,
            _session_id: &str,
            _range: Option<&DateRange>,
        ) -> AppResult<Vec<ChatMessage>> {
            Ok(Vec::new())
        }

        async fn disable_agent(&self, _table: &str, _client_id: &str) -> AppResult<usize> {
            Ok(0)
        }

        async fn agent_settings(&self, _table: &str) -> AppResult<Option<AgentSettings>> {
            Ok(None)
        }

        async fn update_agent_prompt(
            &self,
            _table: &str,
            _id: &Value,
            _prompt: &str,
        ) -> AppResult<Option<AgentSettings>> {
            Ok(None)
        }
    }

    #[async_trait]
    impl ExternalProject for SlowProject {
        async fn test_connection(&self) -> AppResult<()> {
            Ok(())
        }

        async fn list_tables(&self) -> AppResult<Vec<String>> {
            Ok(vec!["leads".to_string()])
        }
    }

    #[derive(Default)]
    struct Viewer {
        prefs: Mutex<DisplayPreferences>,
        blocked: AtomicBool,
    }

    #[async_trait]
    impl DashboardViewer for Viewer {
        async fn preferences(&self) -> AppResult<DisplayPreferences> {
            if self.blocked.load(Ordering::SeqCst) {
                return Err(AppError::PendingApproval);
            }
            Ok(*self.prefs.lock())
        }
    }

    fn refresher(
        project: Arc<SlowProject>,
        viewer: Arc<Viewer>,
        period: Period,
    ) -> (LiveRefresher, UnboundedReceiver<RefreshOutcome>) {
        LiveRefresher::new(
            Arc::new(DashboardService::new(UTC, 1_000)),
            project,
            "leads",
            viewer,
            PeriodSelection::new(period, None),
        )
    }

    fn drain(results: &mut UnboundedReceiver<RefreshOutcome>, into: &mut Vec<RefreshOutcome>) {
        while let Ok(outcome) = results.try_recv() {
            into.push(outcome);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_period_change_wins_over_slower_earlier_load() {
        // the first load is slow, the one for the new period is fast
        let project = Arc::new(SlowProject::new(10).script(&[300, 300]));
        let (live, mut results) = refresher(project.clone(), Arc::default(), Period::Last7Days);

        live.request(RefreshTrigger::Connect);
        sleep(Duration::from_millis(50)).await;
        live.subscribe(PeriodSelection::new(Period::Last30Days, None));

        let outcome = results.recv().await.unwrap();
        assert_eq!(outcome.seq, 2);
        assert_eq!(outcome.result.unwrap().period.period, Period::Last30Days);

        // the 7-day load would have finished by now; nothing else arrives
        sleep(Duration::from_millis(600)).await;
        assert!(results.try_recv().is_err());
        assert_eq!(live.latest(), 2);
        assert_eq!(live.selection().period, Period::Last30Days);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_burst_still_delivers_updates() {
        // changes every 20ms against a 50ms load
        let project = Arc::new(SlowProject::new(50));
        let (live, mut results) = refresher(project.clone(), Arc::default(), Period::Today);
        let mut delivered = Vec::new();

        live.request(RefreshTrigger::Connect);
        for i in 0..10 {
            sleep(Duration::from_millis(20)).await;
            live.request(RefreshTrigger::Change);
            drain(&mut results, &mut delivered);
            if i == 4 {
                assert!(!delivered.is_empty(), "no update while changes keep arriving");
            }
        }

        sleep(Duration::from_millis(500)).await;
        drain(&mut results, &mut delivered);

        assert!(delivered.len() >= 4, "only {} updates", delivered.len());
        // eleven requests were folded into a handful of loads
        assert!(delivered.len() <= 6, "{} updates", delivered.len());
        assert_eq!(project.fetches.load(Ordering::SeqCst), delivered.len() * 2);
        assert!(delivered.iter().all(|o| o.result.is_ok()));
        assert!(delivered.windows(2).all(|w| w[0].seq < w[1].seq));
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_load_rereads_the_viewer() {
        let project = Arc::new(SlowProject::new(5));
        let viewer = Arc::new(Viewer::default());
        let (live, mut results) = refresher(project, viewer.clone(), Period::Last7Days);

        live.request(RefreshTrigger::Connect);
        let view = results.recv().await.unwrap().result.unwrap();
        assert!(view.preferences.show_conversas);

        viewer.prefs.lock().show_conversas = false;
        live.request(RefreshTrigger::Client);
        let view = results.recv().await.unwrap().result.unwrap();
        assert!(!view.preferences.show_conversas);

        viewer.blocked.store(true, Ordering::SeqCst);
        live.request(RefreshTrigger::Change);
        let outcome = results.recv().await.unwrap();
        assert!(matches!(outcome.result, Err(AppError::PendingApproval)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_refresher_cancels_the_load() {
        let project = Arc::new(SlowProject::new(100));
        let (live, mut results) = refresher(project.clone(), Arc::default(), Period::Today);

        live.request(RefreshTrigger::Connect);
        sleep(Duration::from_millis(10)).await;
        drop(live);

        assert!(results.recv().await.is_none());
        assert_eq!(project.fetches.load(Ordering::SeqCst), 0);
    }
}
