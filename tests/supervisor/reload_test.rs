//! Target-list loading and service-mode reloads.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use ghost_monitor::status::{CollectingStatus, StatusEvent};
use ghost_monitor::supervisor::{Supervisor, TargetReloader};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::support::{append, context, count_status, monitoring_count, wait_until, WebhookServer};

fn write_targets(path: &Path, entries: &[(&Path, &str)], mtime_offset_secs: u64) {
    let records: Vec<_> = entries
        .iter()
        .map(|(logfile, webhook)| serde_json::json!({"logfile": logfile, "webhook": webhook}))
        .collect();
    std::fs::write(path, serde_json::to_string(&records).unwrap()).unwrap();
    std::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(mtime_offset_secs))
        .unwrap();
}

#[tokio::test]
async fn test_load_targets_reports_skipped_records() {
    let dir = TempDir::new().unwrap();
    let status = Arc::new(CollectingStatus::new());
    let supervisor = Supervisor::new(context(&dir.path().join("messages.toml"), &status));
    let list = dir.path().join("settings.json");
    std::fs::write(
        &list,
        r#"[
            {"logfile": "a.log", "webhook": "https://example.com/a"},
            {"logfile": "b.log", "webhook": ""}
        ]"#,
    )
    .unwrap();

    let targets = supervisor.load_targets(&list);

    assert_eq!(targets.len(), 1);
    assert_eq!(
        count_status(&status, |e| matches!(e, StatusEvent::TargetSkipped { index: 1, .. })),
        1
    );
    assert!(status
        .events()
        .contains(&StatusEvent::TargetsLoaded { count: 1 }));
}

#[tokio::test]
async fn test_load_targets_degrades_to_empty() {
    let dir = TempDir::new().unwrap();
    let status = Arc::new(CollectingStatus::new());
    let supervisor = Supervisor::new(context(&dir.path().join("messages.toml"), &status));

    assert!(supervisor
        .load_targets(&dir.path().join("missing.json"))
        .is_empty());

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    assert!(supervisor.load_targets(&broken).is_empty());

    assert_eq!(
        count_status(&status, |e| matches!(e, StatusEvent::TargetsInvalid { .. })),
        2
    );
}

#[tokio::test]
async fn test_reloader_restarts_watchers_on_change() {
    let dir = TempDir::new().unwrap();
    let server = WebhookServer::start(204).await;
    let status = Arc::new(CollectingStatus::new());
    let a = dir.path().join("a.log");
    let b = dir.path().join("b.log");
    append(&a, "");
    append(&b, "");
    let list = dir.path().join("settings.json");
    write_targets(&list, &[(&a, server.url.as_str())], 0);

    let mut supervisor = Supervisor::new(context(&dir.path().join("messages.toml"), &status));
    let targets = supervisor.load_targets(&list);
    supervisor.start_all(&targets);
    let mut reloader = TargetReloader::new(&list, Duration::from_secs(30));

    assert!(!reloader.check(&mut supervisor));
    assert_eq!(supervisor.active_count(), 1);

    write_targets(
        &list,
        &[(&a, server.url.as_str()), (&b, server.url.as_str())],
        10,
    );
    assert!(reloader.check(&mut supervisor));
    assert_eq!(supervisor.active_count(), 2);
    assert!(status
        .events()
        .contains(&StatusEvent::WatchersStopped { count: 1 }));

    wait_until(|| monitoring_count(&status) == 3, "new generation tailing").await;
    append(&b, "creating game [from b]\n");
    wait_until(|| server.contents().len() == 1, "delivery from new target").await;
    assert_eq!(server.contents(), vec!["Game created: from b"]);

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_reloader_run_exits_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let status = Arc::new(CollectingStatus::new());
    let mut supervisor = Supervisor::new(context(&dir.path().join("messages.toml"), &status));
    let reloader = TargetReloader::new(dir.path().join("settings.json"), Duration::from_millis(10));

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    tokio::time::timeout(Duration::from_secs(2), reloader.run(&mut supervisor, &shutdown))
        .await
        .expect("reloader did not stop");
    assert_eq!(supervisor.active_count(), 0);
}
