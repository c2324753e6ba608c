//! End-to-end: log lines in, webhook posts out.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use ghost_monitor::config::WatchTarget;
use ghost_monitor::status::{CollectingStatus, StatusEvent};
use ghost_monitor::supervisor::Supervisor;
use ghost_monitor::watcher::WatcherExit;
use tempfile::TempDir;

use crate::support::{append, context, count_status, monitoring_count, wait_until, WebhookServer};

#[tokio::test]
async fn test_matched_lines_are_posted_in_order() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("ghost.log");
    append(&log, "creating game [from before start]\n");
    let server = WebhookServer::start(204).await;
    let status = Arc::new(CollectingStatus::new());

    let mut supervisor = Supervisor::new(context(&dir.path().join("messages.toml"), &status));
    supervisor.start_all(&[WatchTarget::new(&log, server.url.as_str()).unwrap()]);
    wait_until(|| monitoring_count(&status) == 1, "watcher to start tailing").await;

    append(&log, "creating game [Dust2 FFA]\n");
    append(&log, "random unrelated text\n");
    append(&log, "player [Ghost|10.0.0.5] joined the game\n");
    append(&log, "[GAME: Dust2 FFA] (21:07) [All] [Ghost]: gl hf\n");
    append(&log, "deleting player [Ghost]: left\n");
    wait_until(|| server.contents().len() == 4, "four deliveries").await;

    assert_eq!(
        server.contents(),
        vec![
            "Game created: Dust2 FFA",
            "Ghost connected from 10.0.0.5",
            "[Dust2 FFA] Ghost: gl hf",
            "Ghost left the game",
        ]
    );
    assert_eq!(
        count_status(&status, |e| matches!(e, StatusEvent::Delivered { .. })),
        4
    );

    let finished = supervisor.shutdown().await;
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].report.exit, WatcherExit::Cancelled);
    assert_eq!(finished[0].report.stats.lines, 5);
    assert_eq!(finished[0].report.stats.delivered, 4);
}

#[tokio::test]
async fn test_custom_template_is_used() {
    let dir = TempDir::new().unwrap();
    let templates = dir.path().join("messages.toml");
    std::fs::write(
        &templates,
        "[MESSAGES]\nmessageplayer = \"{user} entered from {ip}\"\n",
    )
    .unwrap();
    let log = dir.path().join("ghost.log");
    append(&log, "");
    let server = WebhookServer::start(204).await;
    let status = Arc::new(CollectingStatus::new());

    let mut supervisor = Supervisor::new(context(&templates, &status));
    supervisor.start_all(&[WatchTarget::new(&log, server.url.as_str()).unwrap()]);
    wait_until(|| monitoring_count(&status) == 1, "watcher to start tailing").await;

    append(&log, "player [Ghost|10.0.0.5] joined the game\n");
    wait_until(|| server.contents().len() == 1, "one delivery").await;

    assert_eq!(server.contents(), vec!["Ghost entered from 10.0.0.5"]);
    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_template_edit_applies_to_later_lines() {
    let dir = TempDir::new().unwrap();
    let templates = dir.path().join("messages.toml");
    std::fs::write(&templates, "[MESSAGES]\nmessagecreate = \"v1 {game_name}\"\n").unwrap();
    let log = dir.path().join("ghost.log");
    append(&log, "");
    let server = WebhookServer::start(204).await;
    let status = Arc::new(CollectingStatus::new());

    let mut supervisor = Supervisor::new(context(&templates, &status));
    supervisor.start_all(&[WatchTarget::new(&log, server.url.as_str()).unwrap()]);
    wait_until(|| monitoring_count(&status) == 1, "watcher to start tailing").await;

    append(&log, "creating game [a]\n");
    wait_until(|| server.contents().len() == 1, "first delivery").await;

    std::fs::write(&templates, "[MESSAGES]\nmessagecreate = \"v2 {game_name}\"\n").unwrap();
    std::fs::OpenOptions::new()
        .write(true)
        .open(&templates)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();

    append(&log, "creating game [b]\n");
    wait_until(|| server.contents().len() == 2, "second delivery").await;

    assert_eq!(server.contents(), vec!["v1 a", "v2 b"]);
    assert_eq!(
        count_status(&status, |e| *e == StatusEvent::TemplatesReloaded),
        1
    );
    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_rejecting_endpoint_does_not_stop_watcher() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("ghost.log");
    append(&log, "");
    let server = WebhookServer::start(500).await;
    let status = Arc::new(CollectingStatus::new());

    let mut supervisor = Supervisor::new(context(&dir.path().join("messages.toml"), &status));
    supervisor.start_all(&[WatchTarget::new(&log, server.url.as_str()).unwrap()]);
    wait_until(|| monitoring_count(&status) == 1, "watcher to start tailing").await;

    append(&log, "deleting player [Ghost]:\n");
    wait_until(|| server.contents().len() == 1, "first attempt").await;

    server.respond_with(204);
    append(&log, "deleting player [Ace]:\n");
    wait_until(|| server.contents().len() == 2, "second attempt").await;
    wait_until(
        || count_status(&status, |e| matches!(e, StatusEvent::Delivered { .. })) == 1,
        "successful delivery status",
    )
    .await;

    assert!(status.events().contains(&StatusEvent::Rejected {
        status: 500,
        body: "server said no".to_string()
    }));
    let finished = supervisor.shutdown().await;
    assert_eq!(finished[0].report.stats.failed_deliveries, 1);
    assert_eq!(finished[0].report.stats.delivered, 1);
}

#[tokio::test]
async fn test_missing_file_reports_once_and_never_delivers() {
    let dir = TempDir::new().unwrap();
    let server = WebhookServer::start(204).await;
    let status = Arc::new(CollectingStatus::new());
    let missing = dir.path().join("not-there.log");
    let present = dir.path().join("ghost.log");
    append(&present, "");

    let mut supervisor = Supervisor::new(context(&dir.path().join("messages.toml"), &status));
    supervisor.start_all(&[
        WatchTarget::new(&missing, server.url.as_str()).unwrap(),
        WatchTarget::new(&present, server.url.as_str()).unwrap(),
    ]);
    wait_until(|| monitoring_count(&status) == 1, "sibling watcher to start").await;

    // Creating the file later does not revive the watcher.
    append(&missing, "creating game [late]\n");
    append(&present, "creating game [ok]\n");
    wait_until(|| server.contents().len() == 1, "sibling delivery").await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(server.contents(), vec!["Game created: ok"]);
    assert_eq!(
        count_status(&status, |e| matches!(e, StatusEvent::FileNotFound { .. })),
        1
    );

    let finished = supervisor.shutdown().await;
    let missing_report = finished
        .iter()
        .find(|f| f.target.logfile() == missing)
        .unwrap();
    assert_eq!(missing_report.report.exit, WatcherExit::FileMissing);
    assert_eq!(missing_report.report.stats.lines, 0);
}
