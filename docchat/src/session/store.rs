//! Persistence of the single active session token.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::SessionToken;

/// Holder of at most one session token.
///
/// An absent token means the client is logged out.
pub trait SessionStore: Send {
    /// Persist `token` as the active session, replacing any previous one.
    fn save(&mut self, token: &SessionToken) -> io::Result<()>;

    /// The persisted token, if any.
    fn load(&self) -> io::Result<Option<SessionToken>>;

    /// Forget the active session. Clearing an empty store succeeds.
    fn clear(&mut self) -> io::Result<()>;
}

/// Stores the token in a small file, surviving restarts.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&mut self, token: &SessionToken) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = open_private(&self.path)?;
        file.write_all(token.as_str().as_bytes())?;
        debug!(path = %self.path.display(), "session token saved");
        Ok(())
    }

    fn load(&self) -> io::Result<Option<SessionToken>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let token = content.trim();
        if token.is_empty() {
            return Ok(None);
        }

        Ok(Some(SessionToken::new(token)))
    }

    fn clear(&mut self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session token removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Open `path` for writing, created owner-only on unix.
fn open_private(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(path)?;

    // `mode` only applies on creation; tighten files left by older runs.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(file)
}

/// Keeps the token in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    token: Option<SessionToken>,
}

impl MemorySessionStore {
    pub const fn new() -> Self {
        Self { token: None }
    }

    /// A store that already holds `token`, as if persisted by an earlier run.
    #[cfg(test)]
    pub const fn with_token(token: SessionToken) -> Self {
        Self { token: Some(token) }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&mut self, token: &SessionToken) -> io::Result<()> {
        self.token = Some(token.clone());
        Ok(())
    }

    fn load(&self) -> io::Result<Option<SessionToken>> {
        Ok(self.token.clone())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.token = None;
        Ok(())
    }
}

impl<S: SessionStore + ?Sized> SessionStore for Box<S> {
    fn save(&mut self, token: &SessionToken) -> io::Result<()> {
        (**self).save(token)
    }

    fn load(&self) -> io::Result<Option<SessionToken>> {
        (**self).load()
    }

    fn clear(&mut self) -> io::Result<()> {
        (**self).clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSessionStore::new(dir.path().join("nested").join("session"));

        assert_eq!(store.load().unwrap(), None);

        store.save(&SessionToken::new("first")).unwrap();
        store.save(&SessionToken::new("second")).unwrap();
        assert_eq!(store.load().unwrap(), Some(SessionToken::new("second")));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path.exists());
    }

    #[test]
    fn test_file_store_clear_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileSessionStore::new(dir.path().join("session"));
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_blank_file_is_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        std::fs::write(&path, "  \n").unwrap();

        let store = FileSessionStore::new(&path);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_trims_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        std::fs::write(&path, "abc-123\n").unwrap();

        let store = FileSessionStore::new(&path);
        assert_eq!(store.load().unwrap(), Some(SessionToken::new("abc-123")));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        let mut store = FileSessionStore::new(&path);
        store.save(&SessionToken::new("tok")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        std::fs::write(&path, "old-token-that-is-longer").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let mut store = FileSessionStore::new(&path);
        store.save(&SessionToken::new("new")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap(), Some(SessionToken::new("new")));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemorySessionStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save(&SessionToken::new("tok")).unwrap();
        assert_eq!(store.load().unwrap(), Some(SessionToken::new("tok")));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
