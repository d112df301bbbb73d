//! Crash-safe file replacement.

use std::path::Path;
use uuid::Uuid;

/// Replace `path` with `data` so readers see either the old or the new
/// content, never a partial write.
///
/// The data goes to a uniquely named sibling first, gets `mode` on unix,
/// then is renamed over `path`. The temp file is removed on failure.
pub(crate) async fn atomic_write(path: &Path, data: &[u8], mode: u32) -> std::io::Result<()> {
    let temp_path = path.with_file_name(format!(
        "{}.tmp.{}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("rotor"),
        Uuid::new_v4()
    ));

    let result = write_then_rename(&temp_path, path, data, mode).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&temp_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %temp_path.display(), error = %e, "failed to clean up temp file");
            }
        }
    }
    result
}

async fn write_then_rename(temp_path: &Path, path: &Path, data: &[u8], mode: u32) -> std::io::Result<()> {
    tokio::fs::write(temp_path, data).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(temp_path, std::fs::Permissions::from_mode(mode)).await?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    tokio::fs::rename(temp_path, path).await
}
