use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tracing::info;
use walkdir::{DirEntry, WalkDir};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::DeployError;

/// Zips every file under `src` into `out_zip` and returns the entry count.
///
/// Entries are written in sorted path order with `/` separators and a fixed
/// 1980-01-01 timestamp, so identical inputs yield identical archives. Unix
/// permission bits are kept so `bootstrap` stays executable.
pub fn package_directory(src: &Path, out_zip: &Path) -> Result<usize, DeployError> {
    if !src.is_dir() {
        return Err(DeployError::package(src, "source directory does not exist"));
    }
    if let Some(parent) = out_zip.parent() {
        fs::create_dir_all(parent).map_err(|error| DeployError::package(parent, error))?;
    }

    let file = File::create(out_zip).map_err(|error| DeployError::package(out_zip, error))?;
    let mut zip = ZipWriter::new(file);
    let mut entries = 0usize;

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|error| DeployError::package(src, error))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|error| DeployError::package(entry.path(), error))?;

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(file_mode(&entry)?);
        zip.start_file(slash_path(relative), options)
            .map_err(|error| DeployError::package(out_zip, error))?;

        let bytes = fs::read(entry.path()).map_err(|error| DeployError::package(entry.path(), error))?;
        zip.write_all(&bytes)
            .map_err(|error| DeployError::package(out_zip, error))?;
        entries += 1;
    }

    zip.finish()
        .map_err(|error| DeployError::package(out_zip, error))?;
    info!(source = %src.display(), archive = %out_zip.display(), entries, "directory packaged");
    Ok(entries)
}

#[cfg(unix)]
fn file_mode(entry: &DirEntry) -> Result<u32, DeployError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = entry
        .metadata()
        .map_err(|error| DeployError::package(entry.path(), error))?;
    Ok(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn file_mode(entry: &DirEntry) -> Result<u32, DeployError> {
    if entry.file_name() == "bootstrap" {
        Ok(0o755)
    } else {
        Ok(0o644)
    }
}

/// Object-key style path: components joined with `/` on every platform.
pub(crate) fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
