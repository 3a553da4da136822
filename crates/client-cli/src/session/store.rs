use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk copy of the session cookie jar, the terminal counterpart of the
/// browser keeping cookies between visits. It holds cookies only, never a
/// cached status or claims.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    /// Backend the cookies were issued by
    base_url: String,
    #[serde(default)]
    cookies: Vec<String>,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cookies saved for `base_url`; empty when the file is missing,
    /// unreadable, or belongs to another backend.
    pub fn load(&self, base_url: &str) -> Vec<String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str::<StoredSession>(&content) {
            Ok(stored) if stored.base_url == base_url => stored.cookies,
            Ok(stored) => {
                tracing::debug!("Ignoring session saved for {}", stored.base_url);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    pub fn save(&self, base_url: &str, cookies: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredSession {
            base_url: base_url.to_string(),
            cookies: cookies.to_vec(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("nested").join("session.json"));
        assert!(file.load("http://localhost:8000/").is_empty());

        file.save("http://localhost:8000/", &["access_token=abc".to_string()]).unwrap();
        assert_eq!(file.load("http://localhost:8000/"), vec!["access_token=abc".to_string()]);

        file.clear().unwrap();
        assert!(file.load("http://localhost:8000/").is_empty());
        // clearing twice is fine
        file.clear().unwrap();
    }

    #[test]
    fn test_cookies_are_scoped_to_their_backend() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        file.save("http://staging:8000/", &["access_token=abc".to_string()]).unwrap();
        assert!(file.load("http://production:8000/").is_empty());
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(SessionFile::new(path).load("http://localhost:8000/").is_empty());
    }
}
