use anyhow::Result;
use std::path::{Path, PathBuf};

/// Replaces `:` with `_` and `|` with a space. Nothing else is escaped.
pub fn sanitize_title(title: &str) -> String {
    title.replace(':', "_").replace('|', " ")
}

/// `folder/<sanitized title><extension>`.
pub fn build_download_path(folder: &Path, title: &str, extension: &str) -> PathBuf {
    folder.join(sanitize_title(&format!("{title}{extension}")))
}

pub fn hash_file(path: &Path, chunk_size: usize) -> Result<[u8; 32]> {
    use sha2::{Digest, Sha256};
    use std::fs::File;
    use std::io::Read;

    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; chunk_size.max(1)];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize().into())
}
