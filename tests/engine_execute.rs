mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use ytdlp_runner::errors::RunnerError;
use ytdlp_runner::exec::{Engine, Request};
use ytdlp_runner_test_utils::builders::{wait_until, ScriptFixture, ECHO_ARGS};

use common::{init_tracing, recording_callback, with_timeout};

/// Marks itself started next to the script, then blocks.
const BLOCKING: &str = r#": > "$(dirname "$0")/started"
exec sleep 30"#;

async fn wait_started(fixture: &ScriptFixture) {
    let marker = fixture.marker("started");
    assert!(
        wait_until(Duration::from_secs(5), || marker.exists()).await,
        "script never started"
    );
}

#[tokio::test]
async fn success_returns_normalized_arguments_and_output() {
    init_tracing();
    let fixture = ScriptFixture::new(ECHO_ARGS);
    let engine = fixture.engine();

    let mut request = Request::new("https://example.com/watch?v=1");
    request.add_option_value("--format", "best");

    let result = with_timeout(engine.execute(&request, None, None))
        .await
        .expect("run succeeds");

    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.command()[0], "/bin/sh");

    let ffmpeg = fixture.paths().ffmpeg().to_string_lossy().into_owned();
    let args: Vec<&str> = result.out().lines().collect();
    assert_eq!(
        args,
        vec![
            "--format",
            "best",
            "--no-cache-dir",
            "--ffmpeg-location",
            ffmpeg.as_str(),
            "https://example.com/watch?v=1",
        ]
    );
    assert!(result.err().is_empty());
}

#[tokio::test]
async fn stderr_is_captured_separately() {
    init_tracing();
    let fixture = ScriptFixture::new("echo out\necho warn >&2");
    let result = with_timeout(fixture.engine().execute(&Request::new("u"), None, None))
        .await
        .unwrap();

    assert_eq!(result.out(), "out\n");
    assert_eq!(result.err(), "warn\n");
}

#[tokio::test]
async fn child_sees_engine_environment() {
    init_tracing();
    let fixture = ScriptFixture::new(r#"echo "$PYTHONHOME""#);
    let result = with_timeout(fixture.engine().execute(&Request::new("u"), None, None))
        .await
        .unwrap();

    let expected = fixture.paths().python_dir().join("usr");
    assert_eq!(result.out().trim_end(), expected.to_string_lossy());
}

#[tokio::test]
async fn progress_events_are_reported_in_order() {
    init_tracing();
    let fixture = ScriptFixture::new(
        r#"echo '[youtube] abc: Downloading webpage'
printf '[download]  10.0%% of 1.00MiB ETA 00:09\r[download]  60.0%% of 1.00MiB ETA 00:02\r'
echo '[download] 100% of 1.00MiB in 00:03'"#,
    );
    let (callback, events) = recording_callback();

    let result = with_timeout(fixture.engine().execute(&Request::new("u"), None, Some(callback)))
        .await
        .unwrap();

    let events = events.lock().unwrap();
    let percents: Vec<u32> = events
        .iter()
        .map(|e| e.percent().unwrap().round() as u32)
        .collect();
    assert_eq!(percents, vec![10, 60, 100]);
    assert_eq!(events[0].eta, Some(Duration::from_secs(9)));
    assert!(result.out().contains("[download]  60.0% of 1.00MiB ETA 00:02\n"));
}

#[tokio::test]
async fn progress_is_reported_while_child_is_running() {
    init_tracing();
    let fixture = ScriptFixture::new(
        r#"printf '[download]  10.0%% of 1.00MiB ETA 00:09\r'
exec sleep 30"#,
    );
    let engine = fixture.engine();
    let (callback, events) = recording_callback();

    let runner = engine.clone();
    let handle = tokio::spawn(async move {
        runner
            .execute(&Request::new("u"), Some("live"), Some(callback))
            .await
    });

    let seen = Arc::clone(&events);
    assert!(
        wait_until(Duration::from_secs(5), || seen.lock().unwrap().len() == 1).await,
        "no progress event while the child was still running"
    );
    assert!(engine.registry().contains("live"));
    assert_eq!(events.lock().unwrap()[0].eta, Some(Duration::from_secs(9)));

    assert!(engine.cancel("live"));
    assert!(with_timeout(handle).await.unwrap().unwrap_err().is_cancelled());
}

#[tokio::test]
async fn non_zero_exit_is_process_failed() {
    init_tracing();
    let fixture = ScriptFixture::new("echo 'ERROR: Unsupported URL' >&2\nexit 3");

    let err = with_timeout(fixture.engine().execute(&Request::new("u"), None, None))
        .await
        .unwrap_err();

    match err {
        RunnerError::ProcessFailed { code, stderr } => {
            assert_eq!(code, 3);
            assert_eq!(stderr, "ERROR: Unsupported URL\n");
        }
        other => panic!("expected ProcessFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn dump_json_with_ignore_errors_tolerates_failure() {
    init_tracing();
    let fixture = ScriptFixture::new("echo '{\"id\":\"a\"}'\necho 'ERROR: one entry failed' >&2\nexit 1");
    let engine = fixture.engine();

    let mut request = Request::new("https://example.com/playlist");
    request.add_option("--dump-json").add_option("--ignore-errors");
    let result = with_timeout(engine.execute(&request, None, None))
        .await
        .expect("failure tolerated");
    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.out(), "{\"id\":\"a\"}\n");

    // same run without --ignore-errors still fails
    let mut strict = Request::new("https://example.com/playlist");
    strict.add_option("--dump-json");
    let err = with_timeout(engine.execute(&strict, None, None)).await.unwrap_err();
    assert!(matches!(err, RunnerError::ProcessFailed { code: 1, .. }));
}

#[tokio::test]
async fn ignore_errors_with_empty_output_still_fails() {
    init_tracing();
    let fixture = ScriptFixture::new("exit 1");

    let mut request = Request::new("u");
    request.add_option("--dump-json").add_option("--ignore-errors");
    let err = with_timeout(fixture.engine().execute(&request, None, None))
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::ProcessFailed { code: 1, .. }));
}

#[tokio::test]
async fn cancel_kills_process_and_reports_cancelled() {
    init_tracing();
    let fixture = ScriptFixture::new(BLOCKING);
    let engine = fixture.engine();

    let runner = engine.clone();
    let handle = tokio::spawn(async move {
        runner.execute(&Request::new("u"), Some("job"), None).await
    });

    wait_started(&fixture).await;
    assert!(engine.registry().contains("job"));
    assert!(engine.cancel("job"));

    let err = with_timeout(handle).await.unwrap().unwrap_err();
    assert!(err.is_cancelled(), "expected Cancelled, got {err:?}");
    assert!(matches!(err, RunnerError::Cancelled(ref id) if id == "job"));

    assert!(!engine.registry().contains("job"));
    assert!(!engine.cancel("job"));
}

#[tokio::test]
async fn cancel_after_completion_is_false() {
    init_tracing();
    let fixture = ScriptFixture::new("echo done");
    let engine = fixture.engine();

    let result = with_timeout(engine.execute(&Request::new("u"), Some("job"), None))
        .await
        .unwrap();
    assert_eq!(result.out(), "done\n");
    assert!(engine.registry().is_empty());
    assert!(!engine.cancel("job"));
}

#[tokio::test]
async fn duplicate_id_is_rejected_while_running() {
    init_tracing();
    let fixture = ScriptFixture::new(BLOCKING);
    let engine = fixture.engine();

    let runner = engine.clone();
    let first = tokio::spawn(async move {
        runner.execute(&Request::new("u"), Some("job"), None).await
    });
    wait_started(&fixture).await;

    let err = with_timeout(engine.execute(&Request::new("u"), Some("job"), None))
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::DuplicateProcessId(ref id) if id == "job"));

    // the first invocation is unaffected and still cancellable
    assert!(engine.cancel("job"));
    assert!(with_timeout(first).await.unwrap().unwrap_err().is_cancelled());
}

#[tokio::test]
async fn id_is_reusable_after_completion() {
    init_tracing();
    let fixture = ScriptFixture::new("echo ok");
    let engine = fixture.engine();

    for _ in 0..3 {
        with_timeout(engine.execute(&Request::new("u"), Some("again"), None))
            .await
            .unwrap();
    }
    assert!(engine.registry().is_empty());
}

#[tokio::test]
async fn concurrent_invocations_are_independent() {
    init_tracing();
    let fixture = ScriptFixture::new(ECHO_ARGS);
    let engine = fixture.engine();

    let a = Request::new("https://example.com/a");
    let b = Request::new("https://example.com/b");
    let (ra, rb) = with_timeout(async {
        tokio::join!(
            engine.execute(&a, Some("a"), None),
            engine.execute(&b, Some("b"), None)
        )
    })
    .await;

    assert!(ra.unwrap().out().ends_with("https://example.com/a\n"));
    assert!(rb.unwrap().out().ends_with("https://example.com/b\n"));
}

#[tokio::test]
async fn interrupt_kills_child_and_unregisters() {
    init_tracing();
    let fixture = ScriptFixture::new(BLOCKING);
    let engine = fixture.engine();

    let err = with_timeout(engine.execute_until(
        &Request::new("u"),
        Some("job"),
        None,
        tokio::time::sleep(Duration::from_millis(200)),
    ))
    .await
    .unwrap_err();

    assert!(matches!(err, RunnerError::Interrupted));
    assert!(!engine.registry().contains("job"));
}

#[tokio::test]
async fn missing_script_is_init_error() {
    let fixture = ScriptFixture::new(ECHO_ARGS);
    let paths = fixture.paths().clone().with_script(fixture.dir().join("missing"));
    let engine = Engine::new(paths);

    let err = engine.execute(&Request::new("u"), None, None).await.unwrap_err();
    assert!(matches!(err, RunnerError::InitError(_)), "got {err:?}");
}

#[tokio::test]
async fn non_executable_interpreter_is_spawn_error() {
    let fixture = ScriptFixture::new(ECHO_ARGS);
    let interpreter = fixture.dir().join("not-a-program");
    fs::write(&interpreter, "plain text").unwrap();
    let engine = Engine::new(fixture.paths().clone().with_interpreter(&interpreter));

    let err = engine
        .execute(&Request::new("u"), Some("job"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::SpawnError(_)), "got {err:?}");
    assert!(engine.registry().is_empty());
}
