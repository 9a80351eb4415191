//! Read-only book details dialog.

use std::sync::Arc;

use shelftrack_core::{BookCard, Rating};

const NO_DESCRIPTION: &str = "No description available";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetails {
    pub title: String,
    pub authors: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub rating: Option<Rating>,
}

impl From<&BookCard> for BookDetails {
    fn from(card: &BookCard) -> Self {
        Self {
            title: card.title.clone(),
            authors: card.authors.clone(),
            description: card.description.clone(),
            cover_url: card.cover_url.clone(),
            rating: card.rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverState {
    None,
    Loading,
    Loaded(Arc<Vec<u8>>),
    Failed,
}

/// What the dialog shows; the rating row is absent when there is no rating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsView {
    pub title: String,
    pub authors: String,
    pub description: String,
    pub cover_url: Option<String>,
    pub stars: Option<[bool; Rating::MAX as usize]>,
}

#[derive(Debug, Clone)]
pub struct DetailsModal {
    view: Option<DetailsView>,
    cover: CoverState,
}

impl Default for DetailsModal {
    fn default() -> Self {
        Self {
            view: None,
            cover: CoverState::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingDetails;

impl DetailsModal {
    /// Populates and opens the dialog. Title and authors are required.
    pub fn open(&mut self, details: BookDetails) -> Result<(), MissingDetails> {
        if details.title.trim().is_empty() || details.authors.trim().is_empty() {
            return Err(MissingDetails);
        }

        let cover_url = details.cover_url.filter(|url| !url.trim().is_empty());
        self.cover = if cover_url.is_some() {
            CoverState::Loading
        } else {
            CoverState::None
        };
        self.view = Some(DetailsView {
            title: details.title,
            authors: details.authors,
            description: details
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            cover_url,
            stars: details.rating.map(|r| r.stars()),
        });
        Ok(())
    }

    pub fn close(&mut self) {
        self.view = None;
        self.cover = CoverState::None;
    }

    pub fn is_open(&self) -> bool {
        self.view.is_some()
    }

    pub fn view(&self) -> Option<&DetailsView> {
        self.view.as_ref()
    }

    pub fn cover(&self) -> &CoverState {
        &self.cover
    }

    /// Stores a fetched cover if it still belongs to the open dialog.
    pub fn resolve_cover(&mut self, url: &str, bytes: Option<Vec<u8>>) -> bool {
        let matches = self
            .view
            .as_ref()
            .and_then(|v| v.cover_url.as_deref())
            .is_some_and(|current| current == url);
        if !matches {
            return false;
        }
        self.cover = match bytes {
            Some(bytes) => CoverState::Loaded(Arc::new(bytes)),
            None => CoverState::Failed,
        };
        true
    }
}
