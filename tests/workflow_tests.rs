mod common;

use common::{client, task, task_json, MockTransport, Reply};
use rdalle::{
    download_all, download_generation, wait_for_task, DalleApi, DalleError, DownloadConfig,
    PollConfig, TaskStatus,
};
use std::sync::Arc;
use std::time::Duration;

fn fast_poll() -> PollConfig {
    PollConfig::new().with_interval(Duration::from_millis(1))
}

fn download_config(dir: &tempfile::TempDir) -> DownloadConfig {
    DownloadConfig::new().with_images_path(dir.path())
}

// --- Polling ---

#[tokio::test]
async fn test_generate_poll_download_end_to_end() {
    let transport = MockTransport::new();
    transport
        .on("POST", "/tasks", Reply::json(200, task_json("t1", "pending", &[])))
        .on("GET", "/tasks/t1", Reply::json(200, task_json("t1", "pending", &[])))
        .on("GET", "/tasks/t1", Reply::json(200, task_json("t1", "succeeded", &["g1"])))
        .on("GET", "/generations/g1/download", Reply::bytes(200, b"PNGDATA".to_vec()));
    let client = Arc::new(client(&transport));
    let dir = tempfile::tempdir().unwrap();

    let submitted = client.generate("neon sports car").await.unwrap();
    assert_eq!(submitted.status, TaskStatus::Pending);

    let done = wait_for_task(client.as_ref(), &submitted.id, &fast_poll())
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Succeeded);
    assert_eq!(transport.count("GET", "/tasks/t1"), 2);

    let report = download_all(Arc::clone(&client), &[done], &download_config(&dir))
        .await
        .unwrap();
    let expected = dir.path().join("g1.png");
    assert_eq!(report.files, vec![expected.clone()]);
    assert_eq!(std::fs::read(expected).unwrap(), b"PNGDATA");
}

#[tokio::test]
async fn test_rejected_task_stops_polling_without_download() {
    let transport = MockTransport::new();
    transport.on("GET", "/tasks/t1", Reply::json(200, task_json("t1", "rejected", &[])));
    let client = client(&transport);

    let err = wait_for_task(&client, "t1", &fast_poll()).await.unwrap_err();
    assert!(matches!(err, DalleError::TaskRejected { ref task_id } if task_id == "t1"));
    assert_eq!(transport.count("GET", "/tasks/t1"), 1);
    assert_eq!(transport.count_prefix("/generations/"), 0);
}

#[tokio::test]
async fn test_poll_stops_after_max_attempts() {
    let transport = MockTransport::new();
    transport.on("GET", "/tasks/t1", Reply::json(200, task_json("t1", "pending", &[])));
    let client = client(&transport);

    let err = wait_for_task(&client, "t1", &fast_poll().with_max_attempts(3))
        .await
        .unwrap_err();
    assert!(matches!(err, DalleError::PollExhausted { attempts: 3, .. }));
    assert_eq!(transport.count("GET", "/tasks/t1"), 3);
}

#[tokio::test]
async fn test_poll_propagates_fetch_error() {
    let transport = MockTransport::new();
    transport
        .on("GET", "/tasks/t1", Reply::json(200, task_json("t1", "pending", &[])))
        .on("GET", "/tasks/t1", Reply::text(502, "bad gateway"));
    let client = client(&transport);

    let err = wait_for_task(&client, "t1", &fast_poll()).await.unwrap_err();
    assert_eq!(err.as_api_error().map(|e| e.status_code), Some(502));
    assert_eq!(transport.count("GET", "/tasks/t1"), 2);
}

#[tokio::test]
async fn test_unknown_status_keeps_polling() {
    let transport = MockTransport::new();
    transport
        .on("GET", "/tasks/t1", Reply::json(200, task_json("t1", "queued", &[])))
        .on("GET", "/tasks/t1", Reply::json(200, task_json("t1", "succeeded", &["g1"])));
    let client = client(&transport);

    let task = wait_for_task(&client, "t1", &fast_poll()).await.unwrap();
    assert!(task.is_succeeded());
    assert_eq!(transport.count("GET", "/tasks/t1"), 2);
}

// --- Single download ---

#[tokio::test]
async fn test_download_generation_rejects_error_page() {
    let transport = MockTransport::new();
    transport.on(
        "GET",
        "/generations/g1/download",
        Reply::text(500, "<html>oops</html>"),
    );
    let dir = tempfile::tempdir().unwrap();

    let err = download_generation(&client(&transport), "g1", &download_config(&dir))
        .await
        .unwrap_err();
    let api = err.as_api_error().unwrap();
    assert_eq!(api.status_code, 500);
    assert_eq!(api.details, "<html>oops</html>");
    assert!(!dir.path().join("g1.png").exists());
}

#[tokio::test]
async fn test_partial_download_removes_file() {
    let transport = MockTransport::new();
    transport.on(
        "GET",
        "/generations/g1/download",
        Reply::broken_body(vec![7u8; 4096], "connection reset"),
    );
    let dir = tempfile::tempdir().unwrap();

    let err = download_generation(&client(&transport), "g1", &download_config(&dir))
        .await
        .unwrap_err();
    assert!(matches!(err, DalleError::Transport(_)));
    assert!(!dir.path().join("g1.png").exists());
}

#[tokio::test]
async fn test_missing_directory_is_io_error() {
    let transport = MockTransport::new();
    transport.on("GET", "/generations/g1/download", Reply::bytes(200, vec![1, 2]));
    let dir = tempfile::tempdir().unwrap();
    let config = DownloadConfig::new().with_images_path(dir.path().join("does-not-exist"));

    let err = download_generation(&client(&transport), "g1", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, DalleError::Io(_)));
}

// --- Fan-out ---

#[tokio::test]
async fn test_download_all_respects_concurrency_limit() {
    let transport = MockTransport::new();
    let mut tasks = Vec::new();
    for t in 0..3 {
        let ids: Vec<String> = (0..4).map(|g| format!("g{}-{}", t, g)).collect();
        for id in &ids {
            transport.on(
                "GET",
                &format!("/generations/{}/download", id),
                Reply::bytes(200, id.clone().into_bytes()).delayed(Duration::from_millis(20)),
            );
        }
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        tasks.push(task(&format!("t{}", t), "succeeded", &refs));
    }
    let dir = tempfile::tempdir().unwrap();
    let config = download_config(&dir).with_concurrency(2);

    let report = download_all(Arc::new(client(&transport)), &tasks, &config)
        .await
        .unwrap();

    assert_eq!(report.files.len(), 12);
    assert_eq!(transport.max_in_flight(), 2);
    assert_eq!(transport.in_flight(), 0);
    assert_eq!(
        std::fs::read(dir.path().join("g1-3.png")).unwrap(),
        b"g1-3".to_vec()
    );
}

#[tokio::test]
async fn test_download_all_skips_unfinished_tasks() {
    let transport = MockTransport::new();
    transport.on("GET", "/generations/g1/download", Reply::bytes(200, vec![1]));
    let tasks = vec![
        task("t1", "succeeded", &["g1"]),
        task("t2", "pending", &[]),
        task("t3", "rejected", &[]),
    ];
    let dir = tempfile::tempdir().unwrap();

    let report = download_all(Arc::new(client(&transport)), &tasks, &download_config(&dir))
        .await
        .unwrap();
    assert_eq!(report.files, vec![dir.path().join("g1.png")]);
    assert_eq!(report.skipped_tasks, vec!["t2".to_string(), "t3".to_string()]);
    assert_eq!(transport.count_prefix("/generations/"), 1);
}

#[tokio::test]
async fn test_download_all_fails_fast_and_joins_workers() {
    let transport = MockTransport::new();
    transport.on("GET", "/generations/bad/download", Reply::text(404, "gone"));
    for id in ["s1", "s2", "s3", "s4", "s5"] {
        transport.on(
            "GET",
            &format!("/generations/{}/download", id),
            Reply::bytes(200, vec![0u8; 16]).delayed(Duration::from_secs(5)),
        );
    }
    let tasks = vec![task("t1", "succeeded", &["bad", "s1", "s2", "s3", "s4", "s5"])];
    let dir = tempfile::tempdir().unwrap();
    let config = download_config(&dir).with_concurrency(3);

    let started = std::time::Instant::now();
    let err = download_all(Arc::new(client(&transport)), &tasks, &config)
        .await
        .unwrap_err();

    let api = err.as_api_error().expect("first error is the failed download");
    assert_eq!(api.status_code, 404);
    assert_eq!(api.details, "gone");
    // Siblings were cancelled instead of waiting out their slow responses.
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(transport.in_flight(), 0);
    assert!(!dir.path().join("bad.png").exists());
    assert!(transport.max_in_flight() <= 3);
}

#[tokio::test]
async fn test_download_all_rejects_zero_concurrency() {
    let transport = MockTransport::new();
    let dir = tempfile::tempdir().unwrap();
    let config = download_config(&dir).with_concurrency(0);

    let err = download_all(Arc::new(client(&transport)), &[], &config)
        .await
        .unwrap_err();
    assert!(matches!(err, DalleError::Config(_)));
}

#[tokio::test]
async fn test_download_all_with_no_tasks() {
    let transport = MockTransport::new();
    let dir = tempfile::tempdir().unwrap();

    let report = download_all(Arc::new(client(&transport)), &[], &download_config(&dir))
        .await
        .unwrap();
    assert!(report.files.is_empty());
    assert!(transport.requests().is_empty());
}
