//! Capability signing key lifecycle.
//!
//! Without a key file the key lives only in memory: every restart
//! invalidates all capabilities issued before it. With a key file the key is
//! read at startup, or generated and written there on first start.

use authz_proto::ServerKey;
use authz_proto::capability::KEY_LEN;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Errors loading or persisting the signing key.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("key file {path} holds {len} bytes, expected {KEY_LEN}")]
    BadLength { path: String, len: usize },
}

/// Resolve the signing key for this process.
pub fn load_or_generate(key_file: Option<&str>) -> Result<ServerKey, KeyError> {
    let Some(path) = key_file else {
        warn!("No capability.key_file configured - capabilities will not survive a restart");
        return Ok(ServerKey::generate());
    };

    let file = Path::new(path);
    if file.exists() {
        let raw = Zeroizing::new(std::fs::read(file)?);
        let bytes: [u8; KEY_LEN] = raw.as_slice().try_into().map_err(|_| KeyError::BadLength {
            path: path.to_string(),
            len: raw.len(),
        })?;
        info!(path = %path, "Loaded capability signing key");
        return Ok(ServerKey::from_bytes(bytes));
    }

    let key = ServerKey::generate();
    write_key(file, &key)?;
    info!(path = %path, "Generated new capability signing key");
    Ok(key)
}

fn write_key(path: &Path, key: &ServerKey) -> Result<(), KeyError> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(key.expose_bytes())?;
    file.sync_all()?;
    Ok(())
}
