//! JSON shapes exchanged with the book server.

use serde::Deserialize;
use shelftrack_core::{
    BookCard, BookId, CatalogId, LibrarySnapshot, Rating, ReadingStatus, Recommendation,
    SearchItem,
};

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// `{success, error?}` body of remove and rate.
#[derive(Debug, Deserialize)]
pub(crate) struct Outcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Volume {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "volumeInfo", default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VolumeInfo {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub description: Option<String>,
    #[serde(rename = "imageLinks")]
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ImageLinks {
    pub thumbnail: Option<String>,
}

impl SearchResponse {
    pub fn into_items(self, placeholder: &str) -> Vec<SearchItem> {
        self.items
            .unwrap_or_default()
            .into_iter()
            .map(|volume| volume.into_item(placeholder))
            .collect()
    }
}

impl Volume {
    fn into_item(self, placeholder: &str) -> SearchItem {
        let info = self.volume_info;
        let authors = info
            .authors
            .filter(|authors| !authors.is_empty())
            .map(|authors| authors.join(", "))
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        SearchItem {
            catalog_id: CatalogId(self.id),
            title: non_empty(info.title).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            authors,
            description: non_empty(info.description),
            thumbnail: info
                .image_links
                .and_then(|links| non_empty(links.thumbnail))
                .unwrap_or_else(|| placeholder.to_string()),
        }
    }
}

/// Server ids arrive as numbers from the database but are opaque here.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Number(u64),
    Text(String),
}

impl From<WireId> for BookId {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Number(n) => BookId(n.to_string()),
            WireId::Text(s) => BookId(s),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LibraryEntry {
    pub id: WireId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub rating: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecommendationEntry {
    pub google_books_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: String,
    pub cover_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LibraryResponse {
    #[serde(default)]
    pub want_to_read: Vec<LibraryEntry>,
    #[serde(default)]
    pub reading: Vec<LibraryEntry>,
    #[serde(default)]
    pub read: Vec<LibraryEntry>,
    #[serde(default)]
    pub recommendations: Vec<RecommendationEntry>,
}

impl LibraryResponse {
    pub fn into_snapshot(self) -> LibrarySnapshot {
        let columns = [
            (ReadingStatus::WantToRead, self.want_to_read),
            (ReadingStatus::Reading, self.reading),
            (ReadingStatus::Read, self.read),
        ];
        let cards = columns
            .into_iter()
            .flat_map(|(status, entries)| {
                entries.into_iter().map(move |entry| BookCard {
                    id: entry.id.into(),
                    title: entry.title,
                    authors: entry.authors,
                    description: non_empty(entry.description),
                    cover_url: non_empty(entry.cover_url),
                    status,
                    rating: entry.rating.and_then(Rating::new),
                })
            })
            .collect();
        let recommendations = self
            .recommendations
            .into_iter()
            .map(|rec| Recommendation {
                catalog_id: CatalogId(rec.google_books_id),
                title: rec.title,
                authors: rec.authors,
                cover_url: non_empty(rec.cover_url),
            })
            .collect();
        LibrarySnapshot {
            cards,
            recommendations,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_items_fall_back_to_placeholders() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"items":[{"id":"g1","volumeInfo":{"title":"Dune","authors":["Frank Herbert","Brian Herbert"]}},{"id":"g2","volumeInfo":{"imageLinks":{"thumbnail":"http://t/2.jpg"}}}]}"#,
        )
        .unwrap();
        let items = response.into_items("/static/img/no-cover.png");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].authors, "Frank Herbert, Brian Herbert");
        assert_eq!(items[0].thumbnail, "/static/img/no-cover.png");
        assert_eq!(items[1].title, UNKNOWN_TITLE);
        assert_eq!(items[1].authors, UNKNOWN_AUTHOR);
        assert_eq!(items[1].thumbnail, "http://t/2.jpg");
    }

    #[test]
    fn search_without_items_is_empty() {
        let response: SearchResponse = serde_json::from_str(r#"{"kind":"books#volumes"}"#).unwrap();
        assert!(response.into_items("x").is_empty());
    }

    #[test]
    fn library_assigns_status_per_list() {
        let response: LibraryResponse = serde_json::from_str(
            r#"{
                "want_to_read":[{"id":1,"title":"A","authors":"X"}],
                "read":[{"id":"7","title":"B","authors":"Y","rating":4,"cover_url":""}],
                "recommendations":[{"google_books_id":"g9","title":"C","authors":"Z"}]
            }"#,
        )
        .unwrap();
        let snapshot = response.into_snapshot();
        assert_eq!(snapshot.cards.len(), 2);
        assert_eq!(snapshot.cards[0].id, BookId::new("1"));
        assert_eq!(snapshot.cards[0].status, ReadingStatus::WantToRead);
        assert_eq!(snapshot.cards[1].status, ReadingStatus::Read);
        assert_eq!(snapshot.cards[1].rating, Rating::new(4));
        assert_eq!(snapshot.cards[1].cover_url, None);
        assert_eq!(snapshot.recommendations[0].catalog_id, CatalogId::new("g9"));
    }

    #[test]
    fn out_of_range_rating_is_dropped() {
        let response: LibraryResponse =
            serde_json::from_str(r#"{"read":[{"id":1,"title":"A","authors":"X","rating":9}]}"#)
                .unwrap();
        assert_eq!(response.into_snapshot().cards[0].rating, None);
    }
}
