//! Core domain types for Shelftrack.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server-assigned identifier of a book in the user's library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub String);

impl BookId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// External catalog (metadata provider) identifier of a search result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(pub String);

impl CatalogId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    WantToRead,
    Reading,
    Read,
}

impl ReadingStatus {
    /// Columns in left-to-right board order.
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::WantToRead,
        ReadingStatus::Reading,
        ReadingStatus::Read,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "want_to_read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Read => "read",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "Want to Read",
            ReadingStatus::Reading => "Reading",
            ReadingStatus::Read => "Read",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ReadingStatus::WantToRead => 0,
            ReadingStatus::Reading => 1,
            ReadingStatus::Read => 2,
        }
    }

    pub fn next(self) -> Self {
        match self {
            ReadingStatus::WantToRead => ReadingStatus::Reading,
            ReadingStatus::Reading => ReadingStatus::Read,
            ReadingStatus::Read => ReadingStatus::WantToRead,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ReadingStatus::WantToRead => ReadingStatus::Read,
            ReadingStatus::Reading => ReadingStatus::WantToRead,
            ReadingStatus::Read => ReadingStatus::Reading,
        }
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReadingStatus {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "want_to_read" => Ok(ReadingStatus::WantToRead),
            "reading" => Ok(ReadingStatus::Reading),
            "read" => Ok(ReadingStatus::Read),
            _ => Err("unknown reading status"),
        }
    }
}

/// Star rating, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (1..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Star `n` (1-based) is active when `n <= rating`.
    pub fn stars(&self) -> [bool; Rating::MAX as usize] {
        std::array::from_fn(|idx| (idx as u8) < self.0)
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Rating::new(value)
            .ok_or_else(|| serde::de::Error::custom(format!("rating out of range: {value}")))
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Rating {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(Rating::new)
            .ok_or("rating must be between 1 and 5")
    }
}

/// A book as shown on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookCard {
    pub id: BookId,
    pub title: String,
    pub authors: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub status: ReadingStatus,
    pub rating: Option<Rating>,
}

impl BookCard {
    /// The rating widget is only shown for finished books.
    pub fn rating_visible(&self) -> bool {
        self.status == ReadingStatus::Read
    }
}

/// A server-side suggestion that can be added like a search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub catalog_id: CatalogId,
    pub title: String,
    pub authors: String,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchItem {
    pub catalog_id: CatalogId,
    pub title: String,
    pub authors: String,
    pub description: Option<String>,
    pub thumbnail: String,
}

/// Everything the server renders into the library view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySnapshot {
    pub cards: Vec<BookCard>,
    pub recommendations: Vec<Recommendation>,
}

/// Failure of a remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("request rejected{}", .0.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Application(Option<String>),
}

impl ApiError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// Server-provided reason, when the failure carried one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ApiError::Application(reason) => reason.as_deref(),
            _ => None,
        }
    }
}

/// What happens to an optimistically moved card when the server refuses the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MoveFailurePolicy {
    #[default]
    Keep,
    Rollback,
}

impl MoveFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveFailurePolicy::Keep => "keep",
            MoveFailurePolicy::Rollback => "rollback",
        }
    }
}

impl std::fmt::Display for MoveFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MoveFailurePolicy {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(MoveFailurePolicy::Keep),
            "rollback" => Ok(MoveFailurePolicy::Rollback),
            _ => Err("unknown move failure policy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub session_cookie: Option<String>,
    pub search_debounce_ms: u64,
    pub min_query_chars: usize,
    pub toast_secs: u64,
    pub request_timeout_secs: u64,
    pub move_failure_policy: MoveFailurePolicy,
    pub placeholder_cover: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            session_cookie: None,
            search_debounce_ms: 300,
            min_query_chars: 2,
            toast_secs: 3,
            request_timeout_secs: 10,
            move_failure_policy: MoveFailurePolicy::Keep,
            placeholder_cover: "/static/img/no-cover.png".to_string(),
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.server_url = self.server_url.trim().trim_end_matches('/').to_string();
        if self.server_url.is_empty() {
            self.server_url = Settings::default().server_url;
        }
        self.session_cookie = self
            .session_cookie
            .take()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self.search_debounce_ms = self.search_debounce_ms.clamp(50, 5_000);
        self.min_query_chars = self.min_query_chars.clamp(1, 32);
        self.toast_secs = self.toast_secs.clamp(1, 60);
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 120);
        if self.placeholder_cover.trim().is_empty() {
            self.placeholder_cover = Settings::default().placeholder_cover;
        }
    }
}
