use std::path::{Path, PathBuf};

use tracing::debug;

use super::blob::BlobUploader;
use crate::services::ollama::models::errors::ClientError;

/// Directives whose argument may name a local file.
const FILE_DIRECTIVES: [&str; 2] = ["FROM", "ADAPTER"];

/// Resolves a directive argument: `~` is the home directory, anything else
/// is taken relative to `base_dir`.
pub fn resolve_path(arg: &str, base_dir: &Path) -> PathBuf {
    match arg.strip_prefix('~') {
        Some(rest) => {
            let home = dirs::home_dir().unwrap_or_default();
            home.join(rest.trim_start_matches(['/', '\\']))
        }
        None => base_dir.join(arg),
    }
}

/// Replaces every `FROM`/`ADAPTER` argument that names an existing local file
/// with `@<digest>`, uploading the file as a blob first.
///
/// All other lines, including blank ones, come back untouched and in order.
pub async fn rewrite_modelfile(
    modelfile: &str,
    base_dir: &Path,
    blobs: &BlobUploader,
) -> Result<String, ClientError> {
    let mut lines = Vec::new();
    for line in modelfile.split('\n') {
        lines.push(rewrite_line(line, base_dir, blobs).await?);
    }
    Ok(lines.join("\n"))
}

async fn rewrite_line(
    line: &str,
    base_dir: &Path,
    blobs: &BlobUploader,
) -> Result<String, ClientError> {
    let Some((command, args)) = line.split_once(' ') else {
        return Ok(line.to_string());
    };
    if !FILE_DIRECTIVES.iter().any(|d| d.eq_ignore_ascii_case(command)) {
        return Ok(line.to_string());
    }

    let path = resolve_path(args.trim(), base_dir);
    let is_file = tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false);
    if !is_file {
        debug!(path = %path.display(), "{command} argument is not a local file");
        return Ok(line.to_string());
    }

    let digest = blobs.create_blob(&path).await?;
    Ok(format!("{command} @{digest}"))
}
