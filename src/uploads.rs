use chrono::Utc;
use log::{info, warn};
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::fs::{self, create_dir_all};

/// URL prefix the upload directory is served under
pub const UPLOADS_ROUTE: &str = "/uploads";

/// A file written to the upload directory
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub path: PathBuf,
    pub url: String,
}

/// Build a collision-resistant file name from the client's file name
///
/// The result is `<stem>-<unix millis>-<random>.<ext>`. Only the final path
/// component of `original` is used and unusual characters in the stem are
/// replaced with `_`.
///
/// # Examples
/// ```
/// use knowmyslots::uploads::unique_file_name;
///
/// let name = unique_file_name("../Report 2024.pdf");
/// assert!(name.starts_with("Report_2024-"));
/// assert!(name.ends_with(".pdf"));
/// ```
pub fn unique_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let path = Path::new(base);

    let stem: String = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() { "file".to_string() } else { stem };

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();

    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);

    format!("{stem}-{millis}-{suffix}{ext}")
}

/// Public URL of a stored upload
pub fn public_url(file_name: &str) -> String {
    format!("{UPLOADS_ROUTE}/{}", urlencoding::encode(file_name))
}

/// Write an uploaded file under `dir`
///
/// # Arguments
/// * `dir` - Upload directory, created when missing
/// * `original_name` - File name sent by the client
/// * `bytes` - File content
///
/// # Returns
/// * `std::io::Result<StoredFile>` - Where the file landed and its public URL
pub async fn save_upload(
    dir: &Path,
    original_name: &str,
    bytes: &[u8],
) -> std::io::Result<StoredFile> {
    create_dir_all(dir).await?;

    let file_name = unique_file_name(original_name);
    let path = dir.join(&file_name);
    fs::write(&path, bytes).await?;

    info!("Stored upload {} ({} bytes)", path.display(), bytes.len());

    Ok(StoredFile {
        url: public_url(&file_name),
        file_name,
        path,
    })
}

/// Remove an upload whose metadata could not be recorded
pub async fn discard_upload(file: &StoredFile) {
    if let Err(e) = fs::remove_file(&file.path).await {
        warn!("Failed to remove orphaned upload {}: {e}", file.path.display());
    }
}
