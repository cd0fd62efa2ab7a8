use std::fs;
use std::io;
use std::path::PathBuf;

use parking_lot::RwLock;

/// Durable storage for the process-wide auth token.
///
/// The token is read before every request and replaced after a successful
/// refresh. There is no versioning; the last writer wins.
pub trait TokenStore: Send + Sync {
    /// Loads the current token, if one is stored.
    fn load(&self) -> Option<String>;
    /// Replaces the stored token.
    fn save(&self, token: &str) -> io::Result<()>;
}

/// File-backed store rooted in the platform config directory.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Stores the token at `<config_dir>/relay-http/token`.
    pub fn new() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("relay-http")
            .join("token");
        Self { path }
    }

    /// Stores the token at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for FileTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let token = fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_owned())
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)
    }
}

/// In-memory store for tests and short-lived processes.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with an initial token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn save(&self, token: &str) -> io::Result<()> {
        *self.token.write() = Some(token.to_owned());
        Ok(())
    }
}

/// Formats a token as an `Authorization` header value.
///
/// If the token is missing the `Bearer ` prefix, it is added automatically.
pub(crate) fn normalize_bearer(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}
