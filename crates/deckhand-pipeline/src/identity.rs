//! Content identity.
//!
//! A blake3 digest of the source file's bytes identifies a presentation
//! across runs. The file is streamed in fixed-size reads so large decks do
//! not load wholesale; the digest is an identifier, not a security boundary.

use deckhand_core::SourceError;
use std::path::Path;
use tokio::io::AsyncReadExt;

const READ_CHUNK: usize = 64 * 1024;

/// Hex digest of the file's content.
pub async fn digest(path: &Path) -> Result<String, SourceError> {
    let read_err = |e: std::io::Error| SourceError::Read {
        path: path.to_path_buf(),
        source: e,
    };

    let file = tokio::fs::File::open(path).await.map_err(read_err)?;
    let mut reader = tokio::io::BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut buf).await.map_err(read_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}
