//! End-to-end lifecycle tests for the Minibox runtime.
//!
//! Each test gets a private data directory and drives the engine the way
//! the CLI does: one operation at a time, with all state on disk.
//! 1. Creation and the on-disk layout
//! 2. Run / stop transitions and process-group supervision
//! 3. Healing of entries whose process group has vanished
//! 4. Disk accounting against the quota
//! 5. Volume links
//! 6. Concurrent invocations

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};

use minibox_common::config::MiniboxConfig;
use minibox_common::error::MiniboxError;
use minibox_common::types::{ContainerName, ContainerStatus};
use minibox_core::limiter::RlimitLimiter;
use minibox_runtime::engine::{
    ContainerInfo, CreateOutcome, DiskOutcome, DiskUsage, Engine, MountOutcome, RunOutcome,
    StopOutcome,
};
use minibox_runtime::state::{self, StateEntry};

/// A pid far above any kernel `pid_max`.
const DEAD_PGID: u32 = 99_999_999;

fn engine(dir: &Path) -> Engine {
    Engine::with_limiter(
        MiniboxConfig::from_data_dir(dir),
        Box::new(RlimitLimiter::memory_only()),
    )
}

fn name(s: &str) -> ContainerName {
    ContainerName::new(s).expect("valid name")
}

fn raw_state(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("state.json")).expect("state file")
}

fn force_running(dir: &Path, container: &ContainerName, pid: u32) {
    let path = dir.join("state.json");
    let mut state = state::load_state(&path).expect("load");
    state.set(container.clone(), StateEntry::running(pid));
    state::save_state(&path, &state).expect("save");
}

fn started_pid(outcome: RunOutcome) -> u32 {
    match outcome {
        RunOutcome::Started { pid } => pid,
        other => panic!("expected Started, got {other:?}"),
    }
}

// ── Creation ─────────────────────────────────────────────────────────

#[test]
fn create_web_produces_expected_layout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());

    let outcome = engine.create(&name("web"), None).expect("create");
    let web = dir.path().join("containers/web");
    assert_eq!(
        outcome,
        CreateOutcome::Created {
            rootfs: web.join("rootfs")
        }
    );

    assert!(web.join("rootfs").is_dir());
    let limits: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(web.join("limits.json")).unwrap()).unwrap();
    assert_eq!(limits, serde_json::json!({"cpu": 50, "memory": 256, "disk": 500}));

    let mode = std::fs::metadata(web.join("run.sh")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);

    let state: serde_json::Value = serde_json::from_str(&raw_state(dir.path())).unwrap();
    assert_eq!(
        state,
        serde_json::json!({"web": {"status": "stopped", "pid": null}})
    );
}

#[test]
fn create_then_list_shows_one_stopped_entry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let _ = engine.create(&name("api"), None).expect("create");

    assert_eq!(
        engine.list().expect("list"),
        vec![ContainerInfo {
            name: name("api"),
            status: ContainerStatus::Stopped,
            pid: None,
        }]
    );
}

#[test]
fn second_create_is_a_noop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("first create");

    let marker = dir.path().join("containers/web/rootfs/marker");
    std::fs::write(&marker, "keep me").unwrap();
    let before = raw_state(dir.path());

    assert_eq!(
        engine.create(&web, None).expect("second create"),
        CreateOutcome::AlreadyExists
    );
    assert_eq!(raw_state(dir.path()), before);
    assert_eq!(std::fs::read_to_string(&marker).unwrap(), "keep me");
}

#[test]
fn create_unpacks_archive_into_rootfs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = dir.path().join("base.tar");
    {
        let file = std::fs::File::create(&archive).expect("create tar");
        let mut builder = tar::Builder::new(file);
        let data = b"sandbox\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "etc/hostname", &data[..])
            .expect("append");
        builder.finish().expect("finish");
    }

    let engine = engine(dir.path());
    let _ = engine.create(&name("web"), Some(&archive)).expect("create");
    let hostname = dir.path().join("containers/web/rootfs/etc/hostname");
    assert_eq!(std::fs::read_to_string(hostname).unwrap(), "sandbox\n");
}

#[test]
fn create_with_corrupt_state_leaves_no_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    std::fs::write(dir.path().join("state.json"), "{ not json").unwrap();

    let err = engine.create(&web, None).unwrap_err();
    assert!(matches!(err, MiniboxError::Serialization { .. }));
    assert!(!dir.path().join("containers/web").exists());

    std::fs::remove_file(dir.path().join("state.json")).unwrap();
    assert!(matches!(
        engine.create(&web, None).expect("create after repair"),
        CreateOutcome::Created { .. }
    ));
    let pid = started_pid(engine.run(&web).expect("run"));
    assert_eq!(engine.stop(&web).expect("stop"), StopOutcome::Stopped { pid });
}

// ── Run / Stop ───────────────────────────────────────────────────────

#[test]
fn run_twice_keeps_the_first_pid() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");

    let pid = started_pid(engine.run(&web).expect("run"));
    assert_eq!(
        engine.run(&web).expect("run again"),
        RunOutcome::AlreadyRunning { pid }
    );

    let listed = engine.list().expect("list");
    assert_eq!(listed[0].status, ContainerStatus::Running);
    assert_eq!(listed[0].pid, Some(pid));

    assert_eq!(engine.stop(&web).expect("stop"), StopOutcome::Stopped { pid });
}

#[test]
fn stop_running_container_persists_stopped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");
    let _ = started_pid(engine.run(&web).expect("run"));

    let _ = engine.stop(&web).expect("stop");
    let state = state::load_state(&dir.path().join("state.json")).expect("load");
    assert_eq!(state.get(&web), Some(&StateEntry::stopped()));
}

#[test]
fn stop_dead_group_reports_already_dead() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");
    force_running(dir.path(), &web, DEAD_PGID);

    assert_eq!(
        engine.stop(&web).expect("stop"),
        StopOutcome::StoppedAlreadyDead { pid: DEAD_PGID }
    );
    let state = state::load_state(&dir.path().join("state.json")).expect("load");
    assert_eq!(state.get(&web), Some(&StateEntry::stopped()));
}

#[test]
fn stop_stopped_container_leaves_state_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");
    let before = raw_state(dir.path());

    assert_eq!(engine.stop(&web).expect("stop"), StopOutcome::NotRunning);
    assert_eq!(raw_state(dir.path()), before);
}

#[test]
fn entrypoint_output_reaches_container_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");
    let _ = started_pid(engine.run(&web).expect("run"));

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut logs = String::new();
    while Instant::now() < deadline {
        logs = engine.logs(&web).expect("logs").unwrap_or_default();
        if logs.contains("Hello from container web") {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    let _ = engine.stop(&web).expect("stop");

    assert!(logs.contains("Hello from container web"), "log was: {logs}");
    assert!(logs.contains("started process group"));
}

#[test]
fn spawn_failure_leaves_container_stopped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");
    let script = dir.path().join("containers/web/run.sh");
    std::fs::remove_file(&script).unwrap();
    let before = raw_state(dir.path());

    let err = engine.run(&web).unwrap_err();
    assert!(matches!(err, MiniboxError::SpawnFailed { .. }));
    assert_eq!(raw_state(dir.path()), before);
}

#[test]
fn malformed_limits_abort_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");
    std::fs::write(dir.path().join("containers/web/limits.json"), "{").unwrap();

    assert!(matches!(
        engine.run(&web),
        Err(MiniboxError::Serialization { .. })
    ));
    assert_eq!(engine.list().unwrap()[0].status, ContainerStatus::Stopped);
}

/// Reads the address-space ceiling of `pid` from procfs.
fn address_space_limit(pid: u32) -> String {
    let limits = std::fs::read_to_string(format!("/proc/{pid}/limits")).expect("proc limits");
    limits
        .lines()
        .find(|l| l.starts_with("Max address space"))
        .expect("address space row")
        .split_whitespace()
        .nth(3)
        .expect("soft limit")
        .to_string()
}

#[test]
fn run_applies_memory_ceiling_from_descriptor() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");
    let limits_file = dir.path().join("containers/web/limits.json");

    std::fs::write(&limits_file, r#"{"cpu":50,"memory":64,"disk":500}"#).unwrap();
    let pid = started_pid(engine.run(&web).expect("run"));
    assert_eq!(address_space_limit(pid), (64 * 1024 * 1024).to_string());
    let _ = engine.stop(&web).expect("stop");

    std::fs::write(&limits_file, r#"{"cpu":50,"memory":128,"disk":500}"#).unwrap();
    let pid = started_pid(engine.run(&web).expect("rerun"));
    assert_eq!(address_space_limit(pid), (128 * 1024 * 1024).to_string());
    let _ = engine.stop(&web).expect("stop again");
}

// ── Healing ──────────────────────────────────────────────────────────

#[test]
fn list_reports_vanished_group_as_stopped_without_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");
    force_running(dir.path(), &web, DEAD_PGID);
    let before = raw_state(dir.path());

    let listed = engine.list().expect("list");
    assert_eq!(listed[0].status, ContainerStatus::Stopped);
    assert_eq!(listed[0].pid, None);
    assert_eq!(raw_state(dir.path()), before);
}

#[test]
fn run_relaunches_vanished_group() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");
    force_running(dir.path(), &web, DEAD_PGID);

    let pid = started_pid(engine.run(&web).expect("run"));
    assert_ne!(pid, DEAD_PGID);
    assert_eq!(engine.stop(&web).expect("stop"), StopOutcome::Stopped { pid });
}

// ── Disk Accounting ──────────────────────────────────────────────────

#[test]
fn disk_usage_sums_written_bytes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");

    let rootfs = dir.path().join("containers/web/rootfs");
    std::fs::create_dir_all(rootfs.join("var/lib")).unwrap();
    std::fs::write(rootfs.join("a.bin"), vec![1u8; 4096]).unwrap();
    std::fs::write(rootfs.join("var/lib/b.bin"), vec![2u8; 1000]).unwrap();

    assert_eq!(
        engine.disk_usage(&web).expect("disk"),
        DiskOutcome::Usage(DiskUsage {
            used_bytes: 5096,
            limit_bytes: 500 * 1024 * 1024,
        })
    );
}

#[test]
fn disk_quota_follows_descriptor_edits() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");
    std::fs::write(
        dir.path().join("containers/web/limits.json"),
        r#"{"cpu": 50, "memory": 256, "disk": 1}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("containers/web/rootfs/big.bin"),
        vec![0u8; 2 * 1024 * 1024],
    )
    .unwrap();

    let DiskOutcome::Usage(usage) = engine.disk_usage(&web).expect("disk") else {
        panic!("container should exist");
    };
    assert_eq!(usage.limit_bytes, 1024 * 1024);
    assert!(usage.over_quota());
}

// ── Volumes ──────────────────────────────────────────────────────────

#[test]
fn remount_replaces_previous_link() {
    let dir = tempfile::tempdir().expect("tempdir");
    let host = tempfile::tempdir().expect("host dir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");

    let host_a = host.path().join("a.txt");
    let host_b = host.path().join("b.txt");
    std::fs::write(&host_a, "from a").unwrap();
    std::fs::write(&host_b, "from b").unwrap();

    let MountOutcome::Linked { target } = engine
        .mount_volume(&web, &host_a, Path::new("/data/x"))
        .expect("mount a")
    else {
        panic!("container should exist");
    };
    assert_eq!(target, dir.path().join("containers/web/rootfs/data/x"));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "from a");

    let _ = engine
        .mount_volume(&web, &host_b, Path::new("/data/x"))
        .expect("mount b");
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "from b");

    std::fs::write(&target, "written inside").unwrap();
    assert_eq!(std::fs::read_to_string(&host_b).unwrap(), "written inside");
}

#[test]
fn mount_nests_under_existing_volume() {
    let dir = tempfile::tempdir().expect("tempdir");
    let host = tempfile::tempdir().expect("host dir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");
    let file = host.path().join("f.txt");
    std::fs::write(&file, "nested").unwrap();

    let _ = engine
        .mount_volume(&web, host.path(), Path::new("/data"))
        .expect("outer mount");
    let MountOutcome::Linked { target } = engine
        .mount_volume(&web, &file, Path::new("/data/sub/x"))
        .expect("inner mount")
    else {
        panic!("container should exist");
    };
    assert_eq!(std::fs::read_to_string(target).unwrap(), "nested");
}

#[test]
fn mount_path_is_joined_unvalidated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine(dir.path());
    let web = name("web");
    let _ = engine.create(&web, None).expect("create");

    let _ = engine
        .mount_volume(&web, Path::new("/etc/hosts"), Path::new("../shared"))
        .expect("mount");
    let link = dir.path().join("containers/web/shared");
    assert_eq!(std::fs::read_link(link).unwrap(), Path::new("/etc/hosts"));
}

// ── Concurrency ──────────────────────────────────────────────────────

#[test]
fn concurrent_creates_all_land_in_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().to_path_buf();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let data_dir = data_dir.clone();
            std::thread::spawn(move || {
                let engine = engine(&data_dir);
                engine.create(&name(&format!("c{i}")), None).expect("create")
            })
        })
        .collect();
    for handle in handles {
        assert!(matches!(
            handle.join().expect("join"),
            CreateOutcome::Created { .. }
        ));
    }

    assert_eq!(engine(&data_dir).list().expect("list").len(), 8);
}
