// Unit tests for logger initialization

use crate::logger::{LOG_FILE_NAME, build_dispatch, initialize};

use std::path::PathBuf;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't fail.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are
/// removed, causing fern to fail when a global logger is set twice.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let temp_dir = tempfile::tempdir().unwrap();

    // WHEN: Calling initialize twice
    let first = initialize(temp_dir.path());
    let second = initialize(temp_dir.path());

    // THEN: Both return Ok
    assert!(first.is_ok(), "First initialization should succeed");
    assert!(second.is_ok(), "Second initialization should be a no-op");
}

#[test]
fn given_writable_dir_when_building_dispatch_then_log_file_created() {
    let temp_dir = tempfile::tempdir().unwrap();

    let dispatch = build_dispatch(temp_dir.path());

    assert!(dispatch.is_ok());
    assert!(temp_dir.path().join(LOG_FILE_NAME).exists());
}

#[test]
fn given_invalid_log_dir_when_building_dispatch_then_host_error() {
    // GIVEN: A path under a file, which cannot be a directory
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN: Building the dispatcher
    let result = build_dispatch(&invalid_dir);

    // THEN: An error naming the log file, not a panic
    let err = result.err().expect("expected an error");
    assert!(format!("{err:?}").contains("Host"));
    assert!(err.message().contains(LOG_FILE_NAME));
}
