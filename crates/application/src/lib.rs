//! Application state for Shelftrack.
//!
//! [`AppState`] is the single source of truth for the board, the overlays and
//! user feedback. Handlers mutate it synchronously and return [`Command`]s that
//! describe remote work; the outcome of that work comes back as a
//! [`Completion`] passed to [`AppState::apply`]. Nothing here performs I/O, so
//! every flow can be driven deterministically in tests.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use shelftrack_core::{
    ApiError, BookId, CatalogId, LibrarySnapshot, Rating, ReadingStatus, Recommendation,
    SearchItem, Settings,
};

pub mod board;
pub mod details;
pub mod drag;
pub mod feedback;
pub mod mutations;
pub mod progress;
pub mod search;

pub use board::{Board, BoardEvent};
pub use details::{BookDetails, CoverState, DetailsModal, DetailsView};
pub use drag::{DragRejected, DragState};
pub use feedback::{Feedback, Toast, ToastKind};
pub use progress::{ProgressBar, ProgressVisualizer, Segment, StatusCounts};
pub use search::{SearchPanel, SearchRequest, SearchResults};

/// Remote work requested by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LoadLibrary,
    AddBook {
        catalog_id: CatalogId,
        status: ReadingStatus,
    },
    MoveBook {
        book_id: BookId,
        status: ReadingStatus,
    },
    RemoveBook {
        book_id: BookId,
    },
    RateBook {
        book_id: BookId,
        rating: Rating,
    },
    Search {
        seq: u64,
        query: String,
    },
    FetchCover {
        url: String,
    },
}

/// Outcome of a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    LibraryLoaded(Result<LibrarySnapshot, ApiError>),
    BookAdded(Result<(), ApiError>),
    BookMoved {
        book_id: BookId,
        status: ReadingStatus,
        result: Result<(), ApiError>,
    },
    BookRemoved(Result<(), ApiError>),
    BookRated {
        book_id: BookId,
        rating: Rating,
        result: Result<(), ApiError>,
    },
    SearchFinished {
        seq: u64,
        result: Result<Vec<SearchItem>, ApiError>,
    },
    CoverFetched {
        url: String,
        result: Result<Vec<u8>, ApiError>,
    },
}

/// Board cursor: a column and a row within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub column: ReadingStatus,
    pub row: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            column: ReadingStatus::WantToRead,
            row: 0,
        }
    }
}

/// A drop whose move request has not been answered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingMove {
    pub(crate) target: ReadingStatus,
    pub(crate) origin: (ReadingStatus, usize),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Settings,
    pub board: Board,
    pub recommendations: Vec<Recommendation>,
    pub selection: Selection,
    pub drag: DragState,
    pub search: SearchPanel,
    pub details: DetailsModal,
    pub feedback: Feedback,
    pub pending_remove: Option<BookId>,
    events: VecDeque<BoardEvent>,
    pending_moves: HashMap<BookId, VecDeque<PendingMove>>,
}

impl AppState {
    pub fn new(mut settings: Settings) -> Self {
        settings.normalize();
        let search = SearchPanel::new(
            Duration::from_millis(settings.search_debounce_ms),
            settings.min_query_chars,
        );
        let feedback = Feedback::new(Duration::from_secs(settings.toast_secs));
        Self {
            settings,
            board: Board::default(),
            recommendations: Vec::new(),
            selection: Selection::default(),
            drag: DragState::default(),
            search,
            details: DetailsModal::default(),
            feedback,
            pending_remove: None,
            events: VecDeque::new(),
            pending_moves: HashMap::new(),
        }
    }

    pub fn with_library(mut self, snapshot: LibrarySnapshot) -> Self {
        self.load_snapshot(snapshot);
        self
    }

    fn load_snapshot(&mut self, snapshot: LibrarySnapshot) {
        self.board = Board::from_snapshot(&snapshot);
        self.recommendations = snapshot.recommendations;
        self.drag = DragState::default();
        self.pending_moves.clear();
        self.clamp_selection();
        self.events.push_back(BoardEvent::LibraryLoaded);
    }

    /// Events raised since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        self.events.drain(..).collect()
    }

    pub(crate) fn emit(&mut self, event: BoardEvent) {
        self.events.push_back(event);
    }

    /// Time-driven work: toast expiry and the search debounce timer.
    pub fn tick(&mut self, now: Instant) -> Vec<Command> {
        self.feedback.expire(now);
        let mut commands = Vec::new();
        if let Some(SearchRequest { seq, query }) = self.search.poll(now) {
            tracing::debug!(seq, query = %query, "search fired");
            self.feedback.set_loading(true);
            commands.push(Command::Search { seq, query });
        }
        commands
    }

    /// Boundary for failures nothing else handled.
    pub fn report_unexpected(&mut self, err: &dyn std::fmt::Display) {
        tracing::error!(error = %err, "unexpected error in handler");
        self.feedback.danger("An unexpected error occurred");
    }

    pub fn selected_card_id(&self) -> Option<BookId> {
        self.board
            .card_at(self.selection.column, self.selection.row)
            .map(|card| card.id.clone())
    }

    pub fn select(&mut self, column: ReadingStatus, row: usize) {
        self.selection = Selection { column, row };
        self.clamp_selection();
    }

    pub fn select_column(&mut self, column: ReadingStatus) {
        self.select(column, self.selection.row);
    }

    pub fn select_row_delta(&mut self, delta: isize) {
        let row = (self.selection.row as isize + delta).max(0) as usize;
        self.select(self.selection.column, row);
    }

    fn clamp_selection(&mut self) {
        let len = self.board.column(self.selection.column).len();
        self.selection.row = self.selection.row.min(len.saturating_sub(1));
    }

    /// Opens the details dialog for a board card.
    pub fn show_details(&mut self, book_id: &BookId) -> Option<Command> {
        let Some(card) = self.board.card(book_id) else {
            self.feedback.danger("Error: Invalid book details");
            return None;
        };
        let details = BookDetails::from(card);
        self.open_details(details)
    }

    pub fn open_details(&mut self, details: BookDetails) -> Option<Command> {
        if self.details.open(details).is_err() {
            self.feedback.danger("Error: Invalid book details");
            return None;
        }
        self.details
            .view()
            .and_then(|view| view.cover_url.clone())
            .map(|url| Command::FetchCover { url })
    }

    /// Catalog id under the search cursor: a search result, or a
    /// recommendation while nothing has been searched.
    pub fn selected_catalog_id(&self) -> Option<CatalogId> {
        match &self.search.results {
            SearchResults::Items(_) => self.search.selected_item().map(|i| i.catalog_id.clone()),
            SearchResults::Idle => self
                .recommendations
                .get(self.search.cursor)
                .map(|r| r.catalog_id.clone()),
            SearchResults::NoBooksFound => None,
        }
    }

    pub fn search_list_len(&self) -> usize {
        match &self.search.results {
            SearchResults::Items(items) => items.len(),
            SearchResults::Idle => self.recommendations.len(),
            SearchResults::NoBooksFound => 0,
        }
    }

    /// Adds the highlighted search entry to the want-to-read column.
    pub fn add_selected_result(&mut self) -> Option<Command> {
        let catalog_id = self.selected_catalog_id()?;
        self.add_book(catalog_id, ReadingStatus::WantToRead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelftrack_core::BookCard;

    fn card(id: &str, status: ReadingStatus) -> BookCard {
        BookCard {
            id: BookId::new(id),
            title: format!("Book {id}"),
            authors: "Someone".to_string(),
            description: None,
            cover_url: Some(format!("http://covers/{id}.jpg")),
            status,
            rating: None,
        }
    }

    fn state() -> AppState {
        AppState::new(Settings::default()).with_library(LibrarySnapshot {
            cards: vec![
                card("1", ReadingStatus::WantToRead),
                card("2", ReadingStatus::WantToRead),
                card("3", ReadingStatus::Read),
            ],
            recommendations: vec![Recommendation {
                catalog_id: CatalogId::new("rec-1"),
                title: "Suggested".to_string(),
                authors: "Someone Else".to_string(),
                cover_url: None,
            }],
        })
    }

    #[test]
    fn loading_library_raises_event() {
        let mut state = state();
        assert_eq!(state.drain_events(), vec![BoardEvent::LibraryLoaded]);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn selection_is_clamped_to_column() {
        let mut state = state();
        state.select(ReadingStatus::WantToRead, 9);
        assert_eq!(state.selection.row, 1);
        state.select_column(ReadingStatus::Reading);
        assert_eq!(state.selection.row, 0);
        assert_eq!(state.selected_card_id(), None);
        state.select(ReadingStatus::Read, 0);
        assert_eq!(state.selected_card_id(), Some(BookId::new("3")));
    }

    #[test]
    fn details_request_cover_fetch() {
        let mut state = state();
        let command = state.show_details(&BookId::new("1"));
        assert_eq!(
            command,
            Some(Command::FetchCover {
                url: "http://covers/1.jpg".to_string()
            })
        );
        assert!(state.details.is_open());
    }

    #[test]
    fn details_for_unknown_card_show_error() {
        let mut state = state();
        assert_eq!(state.show_details(&BookId::new("nope")), None);
        assert!(!state.details.is_open());
        assert_eq!(
            state.feedback.latest().map(|t| t.message.as_str()),
            Some("Error: Invalid book details")
        );
    }

    #[test]
    fn search_tick_turns_loading_on() {
        let mut state = state();
        let t0 = Instant::now();
        state.search.set_query("dune", t0);
        assert!(state.tick(t0).is_empty());
        let commands = state.tick(t0 + Duration::from_millis(300));
        assert_eq!(
            commands,
            vec![Command::Search {
                seq: 1,
                query: "dune".to_string()
            }]
        );
        assert!(state.feedback.is_loading());
    }

    #[test]
    fn idle_search_offers_recommendations() {
        let mut state = state();
        assert_eq!(state.search_list_len(), 1);
        assert_eq!(
            state.add_selected_result(),
            Some(Command::AddBook {
                catalog_id: CatalogId::new("rec-1"),
                status: ReadingStatus::WantToRead,
            })
        );
    }

    #[test]
    fn unexpected_errors_become_toasts() {
        let mut state = state();
        state.report_unexpected(&"boom");
        assert_eq!(
            state.feedback.latest().map(|t| t.message.as_str()),
            Some("An unexpected error occurred")
        );
    }
}
