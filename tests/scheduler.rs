use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use sqlsweep::engine::{InvocationResult, Invoker};
use sqlsweep::errors::SweepError;
use sqlsweep::models::{Level, Risk, Stage, TargetDescriptor, TerminalState};
use sqlsweep::pipeline::{ScanEvent, ScanScheduler, ScanSettings};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const IDENTIFIED: &str = "sqlmap identified the following injection point(s) with a total of 42 HTTP(s) requests";

/// Fake engine: every target is vulnerable with one database of two tables.
/// Probes sleep so workers overlap. Probes of `fail_host` fail, table
/// listings of `fail_tables_host` fail, every call for `slow_hosts` takes
/// ten seconds and dumps for `slow_dump_hosts` take ten seconds.
struct FakeEngine {
    probe_delay: Duration,
    fail_host: Option<&'static str>,
    fail_tables_host: Option<&'static str>,
    slow_hosts: HashSet<&'static str>,
    slow_dump_hosts: HashSet<&'static str>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeEngine {
    fn new(probe_delay: Duration) -> Self {
        Self {
            probe_delay,
            fail_host: None,
            fail_tables_host: None,
            slow_hosts: HashSet::new(),
            slow_dump_hosts: HashSet::new(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls_for(&self, host: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(h, _)| h == host).count()
    }
}

#[async_trait]
impl Invoker for FakeEngine {
    async fn invoke(&self, target: &TargetDescriptor, extra_args: &[String]) -> InvocationResult {
        let host = target.host();
        self.calls.lock().unwrap().push((host.clone(), extra_args.to_vec()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let dumping = extra_args.iter().any(|a| a == "--dump");
        let delay = if self.slow_hosts.contains(host.as_str())
            || (dumping && self.slow_dump_hosts.contains(host.as_str()))
        {
            Duration::from_secs(10)
        } else if extra_args.is_empty() {
            self.probe_delay
        } else {
            Duration::from_millis(1)
        };
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match extra_args.first().map(String::as_str) {
            None if Some(host.as_str()) == self.fail_host => InvocationResult::failure(
                "connection refused".into(),
                SweepError::Invocation("engine exited with exit status: 1".into()),
            ),
            None => InvocationResult::success(IDENTIFIED.into()),
            Some("--dbs") => InvocationResult::success("[*] information_schema\n[*] shop\n".into()),
            Some("--tables") if Some(host.as_str()) == self.fail_tables_host => InvocationResult::failure(
                "[CRITICAL] connection reset".into(),
                SweepError::Invocation("engine exited with exit status: 1".into()),
            ),
            Some("--tables") => InvocationResult::success("| users  |\n| orders |\n".into()),
            _ => InvocationResult::success("Table: users\n[2 entries]\n".into()),
        }
    }
}

fn targets(n: usize) -> Vec<TargetDescriptor> {
    (0..n)
        .map(|i| {
            TargetDescriptor::new(&format!("http://t{}.test/item.php?id=1", i), Risk::of(2), Level::of(3)).unwrap()
        })
        .collect()
}

#[tokio::test]
async fn concurrent_invocations_never_exceed_thread_limit() {
    let engine = Arc::new(FakeEngine::new(Duration::from_millis(40)));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = ScanScheduler::new(engine.clone(), ScanSettings { threads: 2, ..Default::default() })
        .with_event_channel(tx);

    let run = scheduler.run(targets(5)).await;
    drop(scheduler);

    assert_eq!(run.outcomes.len(), 5);
    assert!(engine.max_in_flight.load(Ordering::SeqCst) <= 2);

    // A target holds its slot from admission until its last dump
    let mut active = 0usize;
    let mut max_active = 0usize;
    while let Some(event) = rx.recv().await {
        match event {
            ScanEvent::TargetStarted { .. } => {
                active += 1;
                max_active = max_active.max(active);
            }
            ScanEvent::TargetFinished { .. } => active -= 1,
            _ => {}
        }
    }
    assert_eq!(active, 0);
    assert!(max_active <= 2, "{} targets active at once", max_active);
}

#[tokio::test]
async fn harvest_skips_system_schemas_and_dumps_every_table() {
    let engine = Arc::new(FakeEngine::new(Duration::from_millis(1)));
    let scheduler = ScanScheduler::new(engine.clone(), ScanSettings { threads: 4, dump_threads: 3, ..Default::default() });

    let run = scheduler.run(targets(1)).await;
    let outcome = &run.outcomes[0];
    assert_eq!(outcome.state, TerminalState::Done);
    assert!(outcome.vulnerable);
    assert_eq!(outcome.databases.len(), 1);
    assert_eq!(outcome.databases[0].name, "shop");
    assert_eq!(outcome.databases[0].tables, vec!["users", "orders"]);
    assert_eq!(outcome.dumps_completed, 2);

    let calls = engine.calls.lock().unwrap();
    let dumps: Vec<&Vec<String>> = calls.iter().map(|(_, a)| a).filter(|a| a.contains(&"--dump".to_string())).collect();
    assert_eq!(dumps.len(), 2);
    assert!(dumps.iter().all(|a| a.ends_with(&["--threads".to_string(), "3".to_string()])));
    assert_eq!(run.summary.dumps, 2);
    assert_eq!(run.summary.vulnerable, 1);
}

#[tokio::test]
async fn failed_target_does_not_affect_others() {
    let mut engine = FakeEngine::new(Duration::from_millis(5));
    engine.fail_host = Some("t1.test");
    let engine = Arc::new(engine);
    let scheduler = ScanScheduler::new(engine.clone(), ScanSettings { threads: 3, ..Default::default() });

    let run = scheduler.run(targets(3)).await;
    assert_eq!(run.outcomes.len(), 3);
    for outcome in &run.outcomes {
        if outcome.host == "t1.test" {
            assert_eq!(outcome.state, TerminalState::Failed(Stage::Probe));
            assert_eq!(outcome.errors.len(), 1);
        } else {
            assert_eq!(outcome.state, TerminalState::Done);
            assert_eq!(outcome.dumps_completed, 2);
        }
    }
    // The failed probe ends that target's branch
    assert_eq!(engine.calls_for("t1.test"), 1);
    assert_eq!(run.summary.errors, 1);
}

#[tokio::test]
async fn table_listing_failure_on_one_target_leaves_others_intact() {
    let mut engine = FakeEngine::new(Duration::from_millis(5));
    engine.fail_tables_host = Some("t0.test");
    let engine = Arc::new(engine);
    let scheduler = ScanScheduler::new(engine.clone(), ScanSettings { threads: 2, ..Default::default() });

    let run = scheduler.run(targets(3)).await;
    assert_eq!(run.outcomes.len(), 3);
    for outcome in &run.outcomes {
        assert_eq!(outcome.state, TerminalState::Done);
        assert!(outcome.vulnerable);
        assert_eq!(outcome.databases[0].name, "shop");
        if outcome.host == "t0.test" {
            assert!(outcome.databases[0].tables.is_empty());
            assert_eq!(outcome.dumps_completed, 0);
            assert_eq!(outcome.errors.len(), 1);
            assert_eq!(outcome.errors[0].stage, Stage::EnumerateTables);
        } else {
            assert_eq!(outcome.databases[0].tables, vec!["users", "orders"]);
            assert_eq!(outcome.dumps_completed, 2);
            assert!(outcome.errors.is_empty());
        }
    }
    // probe, dbs, failed tables
    assert_eq!(engine.calls_for("t0.test"), 3);
    assert_eq!(run.summary.errors, 1);
    assert_eq!(run.summary.dumps, 4);
}

#[tokio::test]
async fn cancellation_stops_pending_work_and_keeps_finished_outcomes() {
    let mut engine = FakeEngine::new(Duration::from_millis(1));
    engine.slow_hosts = ["t1.test", "t2.test", "t3.test"].into_iter().collect();
    let engine = Arc::new(engine);
    let token = CancellationToken::new();
    let scheduler = ScanScheduler::new(engine.clone(), ScanSettings { threads: 2, ..Default::default() })
        .with_cancel_token(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        token.cancel();
    });

    let run = tokio::time::timeout(Duration::from_secs(5), scheduler.run(targets(4)))
        .await
        .expect("cancelled run should return promptly");
    canceller.await.unwrap();

    assert!(run.summary.cancelled);
    assert_eq!(run.summary.targets, 4);
    assert_eq!(run.summary.completed, 1);
    assert_eq!(run.outcomes[0].host, "t0.test");
    assert_eq!(run.outcomes[0].state, TerminalState::Done);

    // t1 and t2 were stopped mid-probe; t3 was never admitted
    assert_eq!(run.summary.interrupted, 2);
    let interrupted: Vec<&str> = run.outcomes[1..].iter().map(|o| o.host.as_str()).collect();
    assert_eq!(interrupted, vec!["t1.test", "t2.test"]);
    assert!(run.outcomes[1..].iter().all(|o| o.state == TerminalState::Cancelled && !o.vulnerable));
    assert_eq!(engine.calls_for("t3.test"), 0);
}

#[tokio::test]
async fn interrupted_target_keeps_what_it_extracted() {
    let mut engine = FakeEngine::new(Duration::from_millis(1));
    engine.slow_dump_hosts = ["t0.test"].into_iter().collect();
    let engine = Arc::new(engine);
    let token = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = ScanScheduler::new(engine.clone(), ScanSettings::default())
        .with_cancel_token(token.clone())
        .with_event_channel(tx);

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        token.cancel();
    });
    let run = tokio::time::timeout(Duration::from_secs(5), scheduler.run(targets(1)))
        .await
        .expect("cancelled run should return promptly");
    canceller.await.unwrap();
    drop(scheduler);

    assert_eq!(run.outcomes.len(), 1);
    let outcome = &run.outcomes[0];
    assert_eq!(outcome.state, TerminalState::Cancelled);
    assert!(outcome.vulnerable);
    assert_eq!(outcome.databases.len(), 1);
    assert_eq!(outcome.databases[0].tables, vec!["users", "orders"]);
    assert_eq!(outcome.dumps_completed, 0);
    assert_eq!(run.summary.completed, 0);
    assert_eq!(run.summary.interrupted, 1);
    assert_eq!(run.summary.tables, 2);

    let mut cancelled_event = None;
    while let Some(event) = rx.recv().await {
        if let ScanEvent::RunCancelled { completed, interrupted, remaining } = event {
            cancelled_event = Some((completed, interrupted, remaining));
        }
    }
    assert_eq!(cancelled_event, Some((0, 1, 0)));
}
