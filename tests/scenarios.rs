#![cfg(unix)]

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use procvisor::{
    BackoffPolicy, ConfigFile, Event, EventKind, ProcessInfo, ProcessState, ProgramSpec,
    RestartPolicy, RestartTrigger, RunSummary, SPAWN_FAILURE_EXIT_CODE, Subscribe, Supervisor,
    SupervisorConfig,
};

#[derive(Default)]
struct Recorder(Mutex<Vec<(EventKind, String)>>);

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.0
            .lock()
            .unwrap()
            .push((ev.kind, ev.program_name().to_string()));
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

impl Recorder {
    fn count(&self, kind: EventKind, key: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, p)| *k == kind && p == key)
            .count()
    }

    fn position(&self, kind: EventKind, key: &str) -> Option<usize> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .position(|(k, p)| *k == kind && p == key)
    }
}

fn config() -> SupervisorConfig {
    SupervisorConfig {
        grace: Duration::from_secs(5),
        backoff: BackoffPolicy::none(),
        ..SupervisorConfig::default()
    }
}

async fn run(programs: Vec<ProgramSpec>, rec: &Arc<Recorder>) -> RunSummary {
    let sup = Supervisor::builder(config())
        .with_programs(programs)
        .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
        .build()
        .unwrap();
    tokio::time::timeout(Duration::from_secs(30), sup.run_until(std::future::pending()))
        .await
        .expect("supervisor did not finish")
        .unwrap()
}

fn exited(code: i32) -> ProcessInfo {
    ProcessInfo::new(ProcessState::Exited, Some(code))
}

#[tokio::test]
async fn chain_of_one_shots_runs_in_dependency_order() {
    let rec = Arc::new(Recorder::default());
    let summary = run(
        vec![
            ProgramSpec::new("web", "echo serving").after("migrate"),
            ProgramSpec::new("migrate", "exit 0").after("db"),
            ProgramSpec::new("db", "sleep 0.1").with_grace(Duration::from_secs(2)),
        ],
        &rec,
    )
    .await;

    for key in ["db", "migrate", "web"] {
        assert_eq!(summary.get(key).unwrap().info, exited(0), "{key}");
        assert_eq!(summary.get(key).unwrap().attempts, 1, "{key}");
        assert_eq!(rec.count(EventKind::Running, key), 0, "{key}");
    }

    let db_exit = rec.position(EventKind::Exited, "db").unwrap();
    let migrate_start = rec.position(EventKind::Starting, "migrate").unwrap();
    let migrate_exit = rec.position(EventKind::Exited, "migrate").unwrap();
    let web_start = rec.position(EventKind::Starting, "web").unwrap();
    assert!(db_exit < migrate_start);
    assert!(migrate_exit < web_start);
    assert_eq!(rec.count(EventKind::AllExited, "?"), 1);
}

#[tokio::test]
async fn flaky_program_is_attempted_retries_plus_one_times() {
    let rec = Arc::new(Recorder::default());
    let summary = run(
        vec![ProgramSpec::new("flaky", "exit 3").with_restart(RestartPolicy::limited(2))],
        &rec,
    )
    .await;

    let flaky = summary.get("flaky").unwrap();
    assert_eq!(flaky.attempts, 3);
    assert_eq!(flaky.retries_remaining, Some(0));
    assert_eq!(flaky.info, exited(3));
    assert_eq!(rec.count(EventKind::Starting, "flaky"), 3);
    assert_eq!(rec.count(EventKind::Restarted, "flaky"), 2);
    assert_eq!(rec.count(EventKind::GaveUp, "flaky"), 1);
}

#[tokio::test]
async fn dangling_dependency_fails_before_launch() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("launched");
    let touch = format!("touch {}", marker.display());

    let err = Supervisor::builder(config())
        .with_program(ProgramSpec::new("root", touch.clone()))
        .with_program(ProgramSpec::new("worker", touch).after("missing-key"))
        .build()
        .err()
        .expect("build must fail");
    assert_eq!(err.as_label(), "config_missing_dependency");
    assert!(err.to_string().contains("missing-key"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!marker.exists(), "a program ran despite the invalid graph");
}

#[tokio::test]
async fn one_shot_success_launches_successors_exactly_once() {
    let rec = Arc::new(Recorder::default());
    let summary = run(
        vec![
            ProgramSpec::new("base", "sleep 0.5").with_grace(Duration::from_millis(100)),
            ProgramSpec::new("a", "true").after("base"),
            ProgramSpec::new("b", "true").after("base"),
        ],
        &rec,
    )
    .await;

    assert_eq!(rec.count(EventKind::Running, "base"), 1);
    for key in ["a", "b"] {
        assert_eq!(rec.count(EventKind::Starting, key), 1, "{key}");
        assert_eq!(summary.get(key).unwrap().attempts, 1, "{key}");
    }
}

#[tokio::test]
async fn failed_one_shot_never_launches_successors() {
    let rec = Arc::new(Recorder::default());
    let summary = run(
        vec![
            ProgramSpec::new("setup", "exit 1"),
            ProgramSpec::new("app", "true").after("setup"),
            ProgramSpec::new("report", "true").after("app"),
        ],
        &rec,
    )
    .await;

    assert_eq!(summary.get("setup").unwrap().info, exited(1));
    assert_eq!(rec.count(EventKind::GaveUp, "setup"), 1);
    for key in ["app", "report"] {
        let p = summary.get(key).unwrap();
        assert_eq!(p.attempts, 0, "{key}");
        assert_eq!(p.info.lifecycle, ProcessState::NotRunning, "{key}");
        assert!(p.info.exit_code.is_empty(), "{key}");
    }
}

#[tokio::test]
async fn restart_on_failure_stops_after_first_success() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("attempts");
    // Fails twice, then succeeds.
    let command = format!(
        "echo x >> {0}; test $(wc -l < {0}) -ge 3",
        marker.display()
    );

    let rec = Arc::new(Recorder::default());
    let summary = run(
        vec![
            ProgramSpec::new("retry", command)
                .with_restart(RestartPolicy::limited(5).on(RestartTrigger::Failure)),
            ProgramSpec::new("next", "true").after("retry"),
        ],
        &rec,
    )
    .await;

    let retry = summary.get("retry").unwrap();
    assert_eq!(retry.attempts, 3);
    assert_eq!(retry.retries_remaining, Some(3));
    assert_eq!(retry.info, exited(0));
    assert_eq!(summary.get("next").unwrap().attempts, 1);
}

#[tokio::test]
async fn spawn_failure_goes_through_restart_policy() {
    let rec = Arc::new(Recorder::default());
    let mut cfg = config();
    cfg.shell = vec!["/definitely/not/a/shell".into()];

    let summary = Supervisor::builder(cfg)
        .with_program(ProgramSpec::new("ghost", "true").with_restart(RestartPolicy::limited(1)))
        .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
        .build()
        .unwrap()
        .run_until(std::future::pending())
        .await
        .unwrap();

    let ghost = summary.get("ghost").unwrap();
    assert_eq!(ghost.attempts, 2);
    assert_eq!(ghost.info, exited(SPAWN_FAILURE_EXIT_CODE));
    assert_eq!(rec.count(EventKind::Starting, "ghost"), 0);
}

#[tokio::test]
async fn shutdown_signal_stops_unlimited_restarts() {
    let rec = Arc::new(Recorder::default());
    let sup = Supervisor::builder(config())
        .with_program(ProgramSpec::new("daemon", "sleep 30").with_restart(RestartPolicy::unlimited()))
        .with_program(ProgramSpec::new("tick", "sleep 0.05").with_restart(RestartPolicy::unlimited()))
        .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
        .build()
        .unwrap();
    let state = sup.state();

    let summary = tokio::time::timeout(
        Duration::from_secs(10),
        sup.run_until(tokio::time::sleep(Duration::from_millis(500))),
    )
    .await
    .expect("shutdown did not complete")
    .unwrap();

    let daemon = summary.get("daemon").unwrap();
    assert_eq!(daemon.attempts, 1);
    assert_eq!(daemon.info, exited(128 + 9));
    assert!(summary.get("tick").unwrap().attempts > 1);
    assert!(state.alive().is_empty());
    assert_eq!(rec.count(EventKind::ShutdownRequested, "?"), 1);
}

#[tokio::test]
async fn config_file_drives_a_full_run() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
name = "it"

[programs.first]
command = "exit 0"

[programs.second]
command = "exit 7"
after = "first"
autorestart = true
startretries = 1
"#
    )
    .unwrap();

    let cfg = ConfigFile::load(file.path()).unwrap();
    let rec = Arc::new(Recorder::default());
    let summary = run(cfg.programs(), &rec).await;

    assert_eq!(summary.get("first").unwrap().info, exited(0));
    let second = summary.get("second").unwrap();
    assert_eq!(second.attempts, 2);
    assert_eq!(second.info, exited(7));
}
