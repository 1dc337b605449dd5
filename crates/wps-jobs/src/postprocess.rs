//! Local post-processing of a downloaded result.
//!
//! Archives are unpacked into the output directory with style definitions
//! (`.sld`) discarded and every other member renamed after the layer.
//! Archives nested inside the download are unpacked the same way. Plain
//! files are renamed in place. Failures are attached to the job as a
//! diagnostic and never change its `DOWNLOAD-SUCCESSFUL` status.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::error::PostProcessError;
use crate::state::{JobExecutionState, JobStatus};

const ARCHIVE_EXTENSION: &str = "zip";
const STYLE_EXTENSION: &str = "sld";

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Whether the downloaded file should be treated as a zip archive.
pub fn is_archive(path: &Path, mime_type: Option<&str>) -> bool {
    extension_of(path).as_deref() == Some(ARCHIVE_EXTENSION)
        || mime_type.is_some_and(|mime| mime.to_ascii_lowercase().contains(ARCHIVE_EXTENSION))
}

/// `<dir>/<stub>.<ext>`, or `<dir>/<stub>` when there is no extension.
fn renamed(dir: &Path, stub: &str, extension: Option<&str>) -> PathBuf {
    match extension {
        Some(ext) if !ext.is_empty() => dir.join(format!("{}.{}", stub, ext)),
        _ => dir.join(stub),
    }
}

/// Post-process a job whose status is `DOWNLOAD-SUCCESSFUL`; any other
/// status is left untouched.
#[instrument(skip_all, fields(job_id = %state.job_id))]
pub fn post_process(state: &mut JobExecutionState, output_dir: &Path) {
    if state.status != JobStatus::DownloadSuccessful {
        return;
    }

    match try_post_process(state, output_dir) {
        Ok(files) => {
            info!(files = files.len(), "Local post-processing completed");
            state.output_files = files;
            state.status = JobStatus::LocalPostProcessingSuccessful;
            state.timestamps.extracted = Some(Utc::now());
        }
        Err(e) => {
            warn!(error = %e, "Local post-processing failed");
            state.append_diagnostic(format!("post-processing failed: {}", e));
        }
    }
    state.timestamps.ended = Some(Utc::now());
}

fn try_post_process(
    state: &JobExecutionState,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, PostProcessError> {
    let download = state
        .local_file_path
        .as_deref()
        .filter(|path| path.is_file())
        .ok_or(PostProcessError::MissingDownload)?;
    let stub = state.filename_stub();

    fs::create_dir_all(output_dir)?;

    let files = if is_archive(download, state.mime_type.as_deref()) {
        let files = extract_archive(download, output_dir, stub)?;
        fs::remove_file(download)?;
        files
    } else {
        let target = renamed(output_dir, stub, extension_of(download).as_deref());
        fs::rename(download, &target)?;
        vec![target]
    };

    if let Some(staging) = download.parent() {
        if staging != output_dir {
            if let Err(e) = fs::remove_dir(staging) {
                debug!(dir = %staging.display(), error = %e, "Staging directory not removed");
            }
        }
    }

    Ok(files)
}

fn extract_archive(
    archive_path: &Path,
    output_dir: &Path,
    stub: &str,
) -> Result<Vec<PathBuf>, PostProcessError> {
    let mut files = Vec::new();
    extract_into(archive_path, output_dir, stub, &mut files)?;
    Ok(files)
}

/// Unpack `archive_path` into `output_dir`, appending every file written
/// to `files`. Nested archives are unpacked in turn and then removed.
fn extract_into(
    archive_path: &Path,
    output_dir: &Path,
    stub: &str,
    files: &mut Vec<PathBuf>,
) -> Result<(), PostProcessError> {
    let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;

    for index in 0..archive.len() {
        let mut member = archive.by_index(index)?;
        if member.is_dir() {
            continue;
        }
        let Some(member_path) = member.enclosed_name() else {
            warn!(name = member.name(), "Skipping archive member with an unsafe path");
            continue;
        };

        let extension = extension_of(&member_path);
        match extension.as_deref() {
            Some(STYLE_EXTENSION) => {
                debug!(name = member.name(), "Discarding style definition");
                continue;
            }
            Some(ARCHIVE_EXTENSION) => {
                let nested = output_dir.join(format!(".{}-nested-{}.{}", stub, index, ARCHIVE_EXTENSION));
                io::copy(&mut member, &mut File::create(&nested)?)?;
                debug!(name = member.name(), "Unpacking nested archive");
                let result = extract_into(&nested, output_dir, stub, files);
                fs::remove_file(&nested)?;
                result?;
                continue;
            }
            _ => {}
        }

        let mut target = renamed(output_dir, stub, extension.as_deref());
        // Two members with the same extension keep their own names
        if files.contains(&target) {
            let Some(name) = member_path.file_name() else {
                continue;
            };
            target = output_dir.join(name);
        }

        let mut out = File::create(&target)?;
        io::copy(&mut member, &mut out)?;
        debug!(name = member.name(), target = %target.display(), "Extracted archive member");
        files.push(target);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_archive() {
        assert!(is_archive(Path::new("a/b.zip"), None));
        assert!(is_archive(Path::new("a/b.bin"), Some("application/zip")));
        assert!(!is_archive(Path::new("a/b.tiff"), Some("image/tiff")));
    }

    #[test]
    fn test_renamed() {
        let dir = Path::new("/out");
        assert_eq!(renamed(dir, "S2A_x", Some("tif")), PathBuf::from("/out/S2A_x.tif"));
        assert_eq!(renamed(dir, "S2A_x", None), PathBuf::from("/out/S2A_x"));
    }

    #[test]
    fn test_other_status_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = JobExecutionState::submitted("1", "geonode:S2A_x");
        state.finish(JobStatus::DownloadFailed, None);

        post_process(&mut state, dir.path());
        assert_eq!(state.status, JobStatus::DownloadFailed);
        assert!(state.output_files.is_empty());
    }

    #[test]
    fn test_missing_download_is_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = JobExecutionState::submitted("1", "geonode:S2A_x");
        state.local_file_path = Some(dir.path().join("gone.tif"));
        state.finish(JobStatus::DownloadSuccessful, None);

        let downloaded_at = state.timestamps.ended;

        post_process(&mut state, dir.path());
        assert_eq!(state.status, JobStatus::DownloadSuccessful);
        assert!(state.timestamps.ended >= downloaded_at);
        assert!(state.error_message.unwrap().contains("post-processing failed"));
    }
}
