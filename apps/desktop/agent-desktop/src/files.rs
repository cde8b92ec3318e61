//! File helpers behind the file RPC channels.
//!
//! Failures are reported in the return value and logged; none of these
//! functions return an error.

use desktop_ipc::contracts::FileReadResult;

use log::warn;
use tokio::fs;

use std::io::ErrorKind;
use std::path::Path;

pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 5] = [".md", ".txt", ".json", ".yaml", ".yml"];

pub async fn read_file(file_path: String) -> FileReadResult {
    match fs::read_to_string(&file_path).await {
        Ok(file) => FileReadResult {
            file,
            file_path,
            error: None,
            found: true,
        },
        Err(e) => {
            let error = if e.kind() == ErrorKind::NotFound {
                "File not found".to_string()
            } else {
                warn!("Failed to read {file_path}: {e}");
                e.to_string()
            };
            FileReadResult {
                file: String::new(),
                file_path,
                error: Some(error),
                found: false,
            }
        }
    }
}

/// Creates missing parent directories before writing.
pub async fn write_file(file_path: &str, content: &str) -> bool {
    if let Some(parent) = Path::new(file_path).parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            warn!("Failed to create parent of {file_path}: {e}");
            return false;
        }
    }

    match fs::write(file_path, content).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to write {file_path}: {e}");
            false
        }
    }
}

pub async fn ensure_directory(dir_path: &str) -> bool {
    match fs::create_dir_all(dir_path).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to create directory {dir_path}: {e}");
            false
        }
    }
}

/// Names of the regular files directly inside `dir_path`, sorted. With an
/// `extension`, only names ending in it are kept.
pub async fn list_files(dir_path: &str, extension: Option<&str>) -> Vec<String> {
    let mut entries = match fs::read_dir(dir_path).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to list {dir_path}: {e}");
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read entry in {dir_path}: {e}");
                break;
            }
        };

        let is_file = entry.file_type().await.is_ok_and(|kind| kind.is_file());
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_file && extension.is_none_or(|ext| name.ends_with(ext)) {
            names.push(name);
        }
    }

    names.sort();
    names
}

pub async fn is_directory(path: &str) -> bool {
    fs::metadata(path).await.is_ok_and(|metadata| metadata.is_dir())
}
