use proptest::prelude::*;
use ytdlp_runner::exec::{build_command, Request};
use ytdlp_runner_test_utils::builders::ScriptFixture;

fn count(args: &[String], flag: &str) -> usize {
    args.iter().filter(|a| a.as_str() == flag).count()
}

#[test]
fn build_command_emits_options_in_order_then_urls() {
    let mut request = Request::new("https://example.com/a");
    request
        .add_url("https://example.com/b")
        .add_option("-x")
        .add_option_value("--format", "best")
        .add_option_value("--output", "%(title)s.%(ext)s");

    assert_eq!(
        build_command(&request),
        vec![
            "-x",
            "--format",
            "best",
            "--output",
            "%(title)s.%(ext)s",
            "https://example.com/a",
            "https://example.com/b",
        ]
    );
}

#[test]
fn set_option_replaces_every_earlier_entry() {
    let mut request = Request::new("u");
    request
        .add_option_value("--format", "worst")
        .add_option("-q")
        .add_option_value("--format", "720p");
    request.set_option("--format", Some("best".to_string()));

    assert_eq!(request.option_value("--format"), Some("best"));
    assert_eq!(count(&build_command(&request), "--format"), 1);
    assert_eq!(request.remove_option("--format"), 1);
    assert!(!request.has_option("--format"));
    assert!(request.has_option("-q"));
}

#[test]
fn normalize_adds_no_cache_dir_exactly_once() {
    let fixture = ScriptFixture::new("exit 0");
    let engine = fixture.engine();

    let mut request = Request::new("https://example.com/v");
    request.add_option("--no-cache-dir").add_option("--no-cache-dir");

    let args = build_command(&engine.normalize(&request));
    assert_eq!(count(&args, "--no-cache-dir"), 1);
    assert_eq!(count(&args, "--cache-dir"), 0);
}

#[test]
fn normalize_respects_caller_cache_dir() {
    let fixture = ScriptFixture::new("exit 0");
    let engine = fixture.engine();

    let mut request = Request::new("https://example.com/v");
    request.add_option_value("--cache-dir", "/tmp/cache");

    let normalized = engine.normalize(&request);
    assert_eq!(normalized.option_value("--cache-dir"), Some("/tmp/cache"));
    assert!(!normalized.has_option("--no-cache-dir"));
}

#[test]
fn normalize_overrides_ffmpeg_location() {
    let fixture = ScriptFixture::new("exit 0");
    let engine = fixture.engine();

    let mut request = Request::new("https://example.com/v");
    request.add_option_value("--ffmpeg-location", "/usr/bin/ffmpeg");

    let normalized = engine.normalize(&request);
    let expected = fixture.paths().ffmpeg().to_string_lossy().into_owned();
    assert_eq!(normalized.option_value("--ffmpeg-location"), Some(expected.as_str()));
    assert_eq!(count(&build_command(&normalized), "--ffmpeg-location"), 1);
    // the caller's request is untouched
    assert_eq!(request.option_value("--ffmpeg-location"), Some("/usr/bin/ffmpeg"));
}

#[test]
fn command_line_starts_with_interpreter_and_script() {
    let fixture = ScriptFixture::new("exit 0");
    let engine = fixture.engine();

    let normalized = engine.normalize(&Request::new("https://example.com/v"));
    let command = engine.command_line(&normalized);

    assert_eq!(command[0], "/bin/sh");
    assert_eq!(command[1], fixture.script().to_string_lossy());
    assert_eq!(command.last().map(String::as_str), Some("https://example.com/v"));
}

fn flag() -> impl Strategy<Value = String> {
    "--[a-z]{1,12}(-[a-z]{1,6})?"
}

proptest! {
    #[test]
    fn normalized_requests_carry_forced_options_once(
        urls in proptest::collection::vec("https://[a-z]{1,8}\\.com/[a-z0-9]{0,8}", 1..4),
        options in proptest::collection::vec((flag(), proptest::option::of("[a-z0-9]{1,8}")), 0..8),
    ) {
        let fixture = ScriptFixture::new("exit 0");
        let engine = fixture.engine();

        let mut request = Request::with_urls(urls.clone());
        for (flag, value) in &options {
            match value {
                Some(v) => request.add_option_value(flag.clone(), v.clone()),
                None => request.add_option(flag.clone()),
            };
        }

        let args = build_command(&engine.normalize(&request));
        prop_assert_eq!(count(&args, "--ffmpeg-location"), 1);
        let cache_dir_given = request.option_value("--cache-dir").is_some();
        prop_assert_eq!(count(&args, "--no-cache-dir"), usize::from(!cache_dir_given));
        prop_assert_eq!(&args[args.len() - urls.len()..], &urls[..]);
    }
}

proptest! {
    #[test]
    fn appended_options_are_queryable_by_flag(
        options in proptest::collection::vec((flag(), proptest::option::of("[a-z0-9]{1,8}")), 1..8),
    ) {
        let mut request = Request::new("https://example.com/v");
        for (flag, value) in &options {
            match value {
                Some(v) => request.add_option_value(flag.clone(), v.clone()),
                None => request.add_option(flag.clone()),
            };
        }

        let args = build_command(&request);
        for (flag, _) in &options {
            let first = options.iter().find(|(f, _)| f == flag).map(|(_, v)| v.as_deref());
            prop_assert!(request.has_option(flag));
            prop_assert_eq!(Some(request.option_value(flag)), first);
            prop_assert!(args.contains(flag));
        }
        prop_assert_eq!(args.last().map(String::as_str), Some("https://example.com/v"));
    }
}
