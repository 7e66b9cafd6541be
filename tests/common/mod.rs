#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ytdlp_runner::exec::{ProgressCallback, ProgressEvent};

pub use ytdlp_runner_test_utils::{init_tracing, with_timeout};

/// Progress callback that stores every event it sees.
pub fn recording_callback() -> (ProgressCallback, Arc<Mutex<Vec<ProgressEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let callback: ProgressCallback = Arc::new(move |event: &ProgressEvent| {
        sink.lock().unwrap().push(event.clone());
    });
    (callback, events)
}
