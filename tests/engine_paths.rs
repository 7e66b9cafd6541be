use std::ffi::OsString;
use std::path::Path;

use ytdlp_runner::config::EnginePaths;
use ytdlp_runner::fs::mock::MockFileSystem;
use ytdlp_runner::fs::FileSystem;
use ytdlp_runner::types::Dependency;

fn env_value<'a>(paths: &'a EnginePaths, key: &str) -> Option<&'a OsString> {
    paths
        .environment()
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

#[test]
fn layout_is_derived_from_base_and_native_dirs() {
    let paths = EnginePaths::resolve("/app", "/app/native").unwrap();

    assert_eq!(paths.packages_dir(), Path::new("/app/packages"));
    assert_eq!(paths.python_dir(), Path::new("/app/packages/python"));
    assert_eq!(paths.ytdlp_dir(), Path::new("/app/yt-dlp"));
    assert_eq!(paths.interpreter(), Path::new("/app/native/libpython.so"));
    assert_eq!(paths.script(), Path::new("/app/yt-dlp/yt-dlp"));
    assert_eq!(paths.ffmpeg(), Path::new("/app/native/libffmpeg.so"));
    assert_eq!(paths.aria2c(), Path::new("/app/native/libaria2c.so"));
    assert_eq!(paths.dependency_binary(Dependency::Python), paths.interpreter());
}

#[test]
fn child_environment_points_into_packages() {
    let paths = EnginePaths::resolve("/app", "/app/native").unwrap();

    let keys: Vec<&str> = paths.environment().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        keys,
        vec!["LD_LIBRARY_PATH", "SSL_CERT_FILE", "PATH", "PYTHONHOME", "HOME"]
    );

    let library_path = env_value(&paths, "LD_LIBRARY_PATH").unwrap();
    let entries: Vec<_> = std::env::split_paths(library_path).collect();
    assert_eq!(
        entries,
        vec![
            Path::new("/app/packages/python/usr/lib"),
            Path::new("/app/packages/ffmpeg/usr/lib"),
            Path::new("/app/packages/aria2c/usr/lib"),
        ]
    );

    assert_eq!(
        env_value(&paths, "SSL_CERT_FILE").unwrap(),
        "/app/packages/python/usr/etc/tls/cert.pem"
    );
    assert_eq!(env_value(&paths, "PYTHONHOME").unwrap(), "/app/packages/python/usr");

    let search: Vec<_> = std::env::split_paths(env_value(&paths, "PATH").unwrap()).collect();
    assert_eq!(search.last().map(|p| p.as_path()), Some(Path::new("/app/native")));
}

#[test]
fn prepare_dirs_creates_layout() {
    let paths = EnginePaths::resolve("/app", "/app/native").unwrap();
    let fs = MockFileSystem::new();

    paths.prepare_dirs(&fs).unwrap();

    for dir in [paths.packages_dir(), paths.ytdlp_dir(), paths.native_dir()] {
        assert!(fs.is_dir(dir), "{dir:?} not created");
    }
}
