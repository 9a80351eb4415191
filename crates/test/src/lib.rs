//! Test helpers and fixtures.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use shelftrack_application::{AppState, Command};
use shelftrack_client::{BookApi, execute};
use shelftrack_core::{
    ApiError, BookCard, BookId, CatalogId, LibrarySnapshot, MoveFailurePolicy, Rating,
    ReadingStatus, Recommendation, SearchItem, Settings,
};

pub fn make_settings(policy: MoveFailurePolicy) -> Settings {
    Settings {
        server_url: "http://books.test".to_string(),
        session_cookie: Some("session=test".to_string()),
        move_failure_policy: policy,
        ..Settings::default()
    }
}

pub fn make_card(id: &str, status: ReadingStatus) -> BookCard {
    BookCard {
        id: BookId::new(id),
        title: format!("Book {id}"),
        authors: "Test Author".to_string(),
        description: Some(format!("About book {id}")),
        cover_url: Some(format!("http://covers.test/{id}.jpg")),
        status,
        rating: None,
    }
}

/// Two want-to-read, three reading, five read.
pub fn sample_snapshot() -> LibrarySnapshot {
    let mut cards = Vec::new();
    for n in 1..=2 {
        cards.push(make_card(&format!("w{n}"), ReadingStatus::WantToRead));
    }
    for n in 1..=3 {
        cards.push(make_card(&format!("r{n}"), ReadingStatus::Reading));
    }
    for n in 1..=5 {
        cards.push(make_card(&format!("d{n}"), ReadingStatus::Read));
    }
    LibrarySnapshot {
        cards,
        recommendations: vec![Recommendation {
            catalog_id: CatalogId::new("rec-1"),
            title: "Recommended".to_string(),
            authors: "Somebody".to_string(),
            cover_url: None,
        }],
    }
}

pub fn search_item(id: &str, title: &str) -> SearchItem {
    SearchItem {
        catalog_id: CatalogId::new(id),
        title: title.to_string(),
        authors: "Catalog Author".to_string(),
        description: None,
        thumbnail: "/static/img/no-cover.png".to_string(),
    }
}

/// In-memory server: keeps a library that add and remove mutate, and fails
/// on request.
#[derive(Default)]
pub struct ScriptedApi {
    pub library: Mutex<LibrarySnapshot>,
    pub catalog: Vec<SearchItem>,
    pub fail_moves: bool,
    pub remove_error: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new(library: LibrarySnapshot) -> Self {
        Self {
            library: Mutex::new(library),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn with_library<T>(&self, f: impl FnOnce(&mut LibrarySnapshot) -> T) -> Result<T, ApiError> {
        let mut library = self
            .library
            .lock()
            .map_err(|_| ApiError::transport("library lock poisoned"))?;
        Ok(f(&mut library))
    }
}

#[async_trait]
impl BookApi for ScriptedApi {
    async fn library(&self) -> Result<LibrarySnapshot, ApiError> {
        self.record("library".to_string());
        self.with_library(|library| library.clone())
    }

    async fn add_book(&self, catalog_id: &CatalogId, status: ReadingStatus) -> Result<(), ApiError> {
        self.record(format!("add {catalog_id} {status}"));
        let item = self
            .catalog
            .iter()
            .find(|item| &item.catalog_id == catalog_id)
            .cloned()
            .ok_or(ApiError::Application(None))?;
        self.with_library(|library| {
            library.cards.push(BookCard {
                id: BookId::new(format!("new-{}", item.catalog_id)),
                title: item.title,
                authors: item.authors,
                description: item.description,
                cover_url: None,
                status,
                rating: None,
            });
        })
    }

    async fn move_book(&self, book_id: &BookId, status: ReadingStatus) -> Result<(), ApiError> {
        self.record(format!("move {book_id} {status}"));
        if self.fail_moves {
            return Err(ApiError::Transport("500 Internal Server Error".to_string()));
        }
        self.with_library(|library| {
            if let Some(card) = library.cards.iter_mut().find(|c| &c.id == book_id) {
                card.status = status;
            }
        })
    }

    async fn remove_book(&self, book_id: &BookId) -> Result<(), ApiError> {
        self.record(format!("remove {book_id}"));
        if let Some(reason) = &self.remove_error {
            return Err(ApiError::Application(Some(reason.clone())));
        }
        self.with_library(|library| library.cards.retain(|c| &c.id != book_id))
    }

    async fn rate_book(&self, book_id: &BookId, rating: Rating) -> Result<(), ApiError> {
        self.record(format!("rate {book_id} {rating}"));
        self.with_library(|library| {
            if let Some(card) = library.cards.iter_mut().find(|c| &c.id == book_id) {
                card.rating = Some(rating);
            }
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchItem>, ApiError> {
        self.record(format!("search {query}"));
        let needle = query.to_lowercase();
        Ok(self
            .catalog
            .iter()
            .filter(|item| item.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn fetch_cover(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.record(format!("cover {url}"));
        Err(ApiError::Transport("404 Not Found".to_string()))
    }
}

/// Executes `commands` and every follow-up they trigger, applying each
/// completion to `state` in order.
pub async fn settle(
    state: &mut AppState,
    api: &dyn BookApi,
    commands: impl IntoIterator<Item = Command>,
) {
    let mut queue: VecDeque<Command> = commands.into_iter().collect();
    while let Some(command) = queue.pop_front() {
        let completion = execute(api, command).await;
        queue.extend(state.apply(completion));
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use shelftrack_application::{ProgressVisualizer, SearchResults};
    use shelftrack_storage::SettingsStore;

    use super::*;

    fn latest_toast(state: &AppState) -> Option<String> {
        state.feedback.latest().map(|t| t.message.clone())
    }

    async fn loaded(api: &ScriptedApi, policy: MoveFailurePolicy) -> AppState {
        let mut state = AppState::new(make_settings(policy));
        let load = state.reload();
        settle(&mut state, api, [load]).await;
        state
    }

    #[tokio::test]
    async fn drop_on_read_updates_progress_bar() {
        let api = ScriptedApi::new(sample_snapshot());
        let mut state = loaded(&api, MoveFailurePolicy::Keep).await;
        let mut progress = ProgressVisualizer::default();
        for event in state.drain_events() {
            progress.observe(&event, &state.board);
        }
        let before = progress.bar().unwrap().segments[2].count;
        assert_eq!(before, 5);

        state.drag_start(&BookId::new("r1")).unwrap();
        state.drag_over(ReadingStatus::Read);
        let command = state.drop_on(Some(ReadingStatus::Read));
        assert!(state.feedback.is_loading());
        settle(&mut state, &api, command).await;

        for event in state.drain_events() {
            progress.observe(&event, &state.board);
        }
        let bar = progress.bar().unwrap();
        assert_eq!(bar.segments[1].count, 2);
        assert_eq!(bar.segments[2].count, 6);
        assert_eq!(bar.segments[2].label.as_deref(), Some("60%"));
        assert!(!state.feedback.is_loading());
        assert!(!state.drag.is_active());
        assert_eq!(latest_toast(&state).as_deref(), Some("Book moved successfully!"));
    }

    #[tokio::test]
    async fn failed_move_keeps_card_by_default() {
        let api = ScriptedApi {
            fail_moves: true,
            ..ScriptedApi::new(sample_snapshot())
        };
        let mut state = loaded(&api, MoveFailurePolicy::Keep).await;
        state.drain_events();

        state.drag_start(&BookId::new("w1")).unwrap();
        let command = state.drop_on(Some(ReadingStatus::Reading));
        settle(&mut state, &api, command).await;

        assert_eq!(
            state.board.card(&BookId::new("w1")).map(|c| c.status),
            Some(ReadingStatus::Reading)
        );
        assert_eq!(latest_toast(&state).as_deref(), Some("Failed to move book"));
        assert!(state.drain_events().is_empty());
    }

    #[tokio::test]
    async fn failed_move_rolls_back_when_configured() {
        let api = ScriptedApi {
            fail_moves: true,
            ..ScriptedApi::new(sample_snapshot())
        };
        let mut state = loaded(&api, MoveFailurePolicy::Rollback).await;

        state.drag_start(&BookId::new("w2")).unwrap();
        let command = state.drop_on(Some(ReadingStatus::Read));
        assert_eq!(state.board.column(ReadingStatus::Read).len(), 6);
        settle(&mut state, &api, command).await;

        assert_eq!(
            state.board.position(&BookId::new("w2")),
            Some((ReadingStatus::WantToRead, 1))
        );
        assert_eq!(state.board.column(ReadingStatus::Read).len(), 5);
    }

    #[tokio::test]
    async fn search_then_add_reloads_library() {
        let api = ScriptedApi {
            catalog: vec![search_item("g1", "Dune"), search_item("g2", "Dune Messiah")],
            ..ScriptedApi::new(sample_snapshot())
        };
        let mut state = loaded(&api, MoveFailurePolicy::Keep).await;

        let t0 = Instant::now();
        state.search.open();
        for ch in "dune".chars() {
            state.search.push_char(ch, t0);
        }
        assert!(state.tick(t0 + Duration::from_millis(100)).is_empty());
        let commands = state.tick(t0 + Duration::from_millis(300));
        assert_eq!(commands.len(), 1);
        settle(&mut state, &api, commands).await;
        assert_eq!(state.search.result_count(), 2);

        state.search.move_cursor(1, state.search_list_len());
        let command = state.add_selected_result();
        settle(&mut state, &api, command).await;

        let added: Vec<_> = state
            .board
            .cards_in(ReadingStatus::WantToRead)
            .map(|c| c.title.clone())
            .collect();
        assert!(added.contains(&"Dune Messiah".to_string()));
        assert_eq!(latest_toast(&state).as_deref(), Some("Book added successfully!"));
        assert!(api.calls().contains(&"add g2 want_to_read".to_string()));
    }

    #[tokio::test]
    async fn search_without_matches_says_so() {
        let api = ScriptedApi::new(sample_snapshot());
        let mut state = loaded(&api, MoveFailurePolicy::Keep).await;

        let t0 = Instant::now();
        state.search.set_query("zz top", t0);
        let commands = state.tick(t0 + Duration::from_secs(1));
        settle(&mut state, &api, commands).await;
        assert_eq!(state.search.results, SearchResults::NoBooksFound);
    }

    #[tokio::test]
    async fn remove_requires_confirmation_and_reports_reason() {
        let api = ScriptedApi {
            remove_error: Some("locked".to_string()),
            ..ScriptedApi::new(sample_snapshot())
        };
        let mut state = loaded(&api, MoveFailurePolicy::Keep).await;

        state.request_remove(BookId::new("d1"));
        state.cancel_remove();
        assert_eq!(state.confirm_remove(), None);

        state.request_remove(BookId::new("d1"));
        let command = state.confirm_remove();
        settle(&mut state, &api, command).await;

        assert_eq!(
            latest_toast(&state).as_deref(),
            Some("Failed to remove book: locked")
        );
        assert!(state.board.card(&BookId::new("d1")).is_some());
        assert_eq!(api.calls(), vec!["library", "remove d1"]);
    }

    #[tokio::test]
    async fn remove_success_drops_card_after_reload() {
        let api = ScriptedApi::new(sample_snapshot());
        let mut state = loaded(&api, MoveFailurePolicy::Keep).await;

        state.request_remove(BookId::new("w1"));
        let command = state.confirm_remove();
        settle(&mut state, &api, command).await;

        assert!(state.board.card(&BookId::new("w1")).is_none());
        assert_eq!(state.board.len(), 9);
        assert_eq!(
            latest_toast(&state).as_deref(),
            Some("Book removed successfully!")
        );
    }

    #[tokio::test]
    async fn rating_sticks_only_to_read_cards() {
        let api = ScriptedApi::new(sample_snapshot());
        let mut state = loaded(&api, MoveFailurePolicy::Keep).await;

        let command = state.rate_book(BookId::new("d3"), Rating::new(4).unwrap());
        settle(&mut state, &api, command).await;
        let card = state.board.card(&BookId::new("d3")).unwrap();
        assert_eq!(card.rating, Rating::new(4));
        assert!(card.rating_visible());

        state.drag_start(&BookId::new("d3")).unwrap();
        let command = state.drop_on(Some(ReadingStatus::Reading));
        settle(&mut state, &api, command).await;
        let card = state.board.card(&BookId::new("d3")).unwrap();
        assert!(!card.rating_visible());
        assert_eq!(card.rating, Rating::new(4));
    }

    #[test]
    fn settings_survive_a_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path().join("settings.json")).unwrap();
        let settings = make_settings(MoveFailurePolicy::Rollback);
        store.save_settings(&settings).unwrap();

        let state = AppState::new(store.load_settings().unwrap());
        assert_eq!(
            state.settings.move_failure_policy,
            MoveFailurePolicy::Rollback
        );
        assert_eq!(state.settings.server_url, "http://books.test");
    }
}
