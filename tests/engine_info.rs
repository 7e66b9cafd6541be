mod common;

use ytdlp_runner::errors::RunnerError;
use ytdlp_runner_test_utils::builders::ScriptFixture;

use common::{init_tracing, with_timeout};

#[tokio::test]
async fn get_info_parses_dump_json_output() {
    init_tracing();
    let fixture = ScriptFixture::new(
        r#"case "$*" in
  *--dump-json*) ;;
  *) echo 'dump-json not requested' >&2; exit 2 ;;
esac
cat <<'JSON'
{"id": "abc123", "title": "A video", "duration": 12.5, "view_count": 42,
 "formats": [{"format_id": "18", "ext": "mp4", "height": 360}],
 "thumbnails": [{"url": "https://i.example.com/1.jpg"}],
 "http_headers": {"User-Agent": "x"},
 "availability": "public"}
JSON"#,
    );

    let info = with_timeout(fixture.engine().get_info("https://example.com/v"))
        .await
        .expect("info parsed");

    assert_eq!(info.id.as_deref(), Some("abc123"));
    assert_eq!(info.title.as_deref(), Some("A video"));
    assert_eq!(info.duration, Some(12.5));
    assert_eq!(info.view_count, Some(42));
    assert_eq!(info.formats.len(), 1);
    assert_eq!(info.formats[0].format_id.as_deref(), Some("18"));
    assert_eq!(info.formats[0].height, Some(360));
    assert_eq!(info.thumbnails[0].url.as_deref(), Some("https://i.example.com/1.jpg"));
    assert_eq!(info.http_headers.get("User-Agent").map(String::as_str), Some("x"));
    assert_eq!(info.extra.get("availability"), Some(&serde_json::json!("public")));
}

#[tokio::test]
async fn get_info_rejects_invalid_json() {
    init_tracing();
    let fixture = ScriptFixture::new("echo 'this is not json'");

    let err = with_timeout(fixture.engine().get_info("https://example.com/v"))
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::ParseError(_)), "got {err:?}");
}

#[tokio::test]
async fn get_info_propagates_process_failure() {
    init_tracing();
    let fixture = ScriptFixture::new("echo 'ERROR: video unavailable' >&2\nexit 1");

    let err = with_timeout(fixture.engine().get_info("https://example.com/v"))
        .await
        .unwrap_err();
    match err {
        RunnerError::ProcessFailed { code, stderr } => {
            assert_eq!(code, 1);
            assert!(stderr.contains("video unavailable"));
        }
        other => panic!("expected ProcessFailed, got {other:?}"),
    }
}
