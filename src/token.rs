// File-backed token store. `login` writes the bearer token here and every
// authenticated command reads it back, so a session survives across
// invocations. One plaintext file, fixed name, working directory, no
// locking.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Fixed name of the token file, resolved against the working directory.
pub const TOKEN_FILE: &str = ".chirp_token";

pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store at the fixed [`TOKEN_FILE`] path in the working directory.
    pub fn new() -> Self {
        Self::at(TOKEN_FILE)
    }

    /// Store at an explicit path (tests).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    /// Overwrite the token file with the given token.
    pub fn set_token(&self, token: &str) -> Result<()> {
        fs::write(&self.path, token)
            .with_context(|| format!("Failed to write token file {}", self.path.display()))
    }

    /// Read back the stored token, trimmed. `None` when the file does not
    /// exist or holds only whitespace; any other I/O failure is an error.
    pub fn get_token(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read token file {}", self.path.display())),
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join(TOKEN_FILE));
        store.set_token("abc123").unwrap();
        assert_eq!(store.get_token().unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_FILE);
        fs::write(&path, "  abc123\n").unwrap();
        let store = TokenStore::at(path);
        assert_eq!(store.get_token().unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_file_reads_as_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join(TOKEN_FILE));
        assert_eq!(store.get_token().unwrap(), None);
    }

    #[test]
    fn blank_file_reads_as_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_FILE);
        fs::write(&path, "   \n").unwrap();
        let store = TokenStore::at(path);
        assert_eq!(store.get_token().unwrap(), None);
    }

    #[test]
    fn set_token_overwrites_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join(TOKEN_FILE));
        store.set_token("old").unwrap();
        store.set_token("new").unwrap();
        assert_eq!(store.get_token().unwrap().as_deref(), Some("new"));
    }
}
