//! State side of the four book mutations plus library reloads.
//!
//! Each mutation validates its input before any request is made, turns the
//! loading flag on, and returns the [`Command`] to execute. [`AppState::apply`]
//! turns the flag off again on every path and reports the outcome.

use shelftrack_core::{ApiError, BookId, CatalogId, MoveFailurePolicy, Rating, ReadingStatus};

use crate::{AppState, BoardEvent, Command, Completion, PendingMove};

impl AppState {
    pub fn reload(&mut self) -> Command {
        self.feedback.set_loading(true);
        Command::LoadLibrary
    }

    pub fn add_book(&mut self, catalog_id: CatalogId, status: ReadingStatus) -> Option<Command> {
        if catalog_id.is_empty() {
            self.feedback.danger("Error: Invalid book ID");
            return None;
        }
        self.feedback.set_loading(true);
        Some(Command::AddBook { catalog_id, status })
    }

    pub fn move_book(&mut self, book_id: BookId, status: ReadingStatus) -> Option<Command> {
        if book_id.is_empty() {
            self.feedback.danger("Error: Invalid book or status");
            return None;
        }
        self.feedback.set_loading(true);
        Some(Command::MoveBook { book_id, status })
    }

    /// Asks the user to confirm removal; nothing is sent yet.
    pub fn request_remove(&mut self, book_id: BookId) {
        if book_id.is_empty() {
            self.feedback.danger("Error: Invalid book ID");
            return;
        }
        self.pending_remove = Some(book_id);
    }

    pub fn confirm_remove(&mut self) -> Option<Command> {
        let book_id = self.pending_remove.take()?;
        self.remove_book(book_id)
    }

    pub fn cancel_remove(&mut self) {
        self.pending_remove = None;
    }

    pub fn remove_book(&mut self, book_id: BookId) -> Option<Command> {
        if book_id.is_empty() {
            self.feedback.danger("Error: Invalid book ID");
            return None;
        }
        self.feedback.set_loading(true);
        Some(Command::RemoveBook { book_id })
    }

    /// Rating failures are never shown to the user.
    pub fn rate_book(&mut self, book_id: BookId, rating: Rating) -> Option<Command> {
        if book_id.is_empty() {
            tracing::debug!("rating ignored: missing book id");
            return None;
        }
        self.feedback.set_loading(true);
        Some(Command::RateBook { book_id, rating })
    }

    /// Reconciles state with a finished command. Returns follow-up commands
    /// (a library reload after add/remove).
    pub fn apply(&mut self, completion: Completion) -> Vec<Command> {
        match completion {
            Completion::LibraryLoaded(result) => {
                self.feedback.set_loading(false);
                match result {
                    Ok(snapshot) => {
                        tracing::info!(books = snapshot.cards.len(), "library loaded");
                        self.load_snapshot(snapshot);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "library load failed");
                        self.feedback.danger("Failed to load library");
                    }
                }
                Vec::new()
            }
            Completion::BookAdded(result) => {
                self.feedback.set_loading(false);
                match result {
                    Ok(()) => {
                        tracing::info!("book added");
                        self.feedback.success("Book added successfully!");
                        vec![self.reload()]
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "add book failed");
                        self.feedback.danger("Failed to add book");
                        Vec::new()
                    }
                }
            }
            Completion::BookMoved {
                book_id,
                status,
                result,
            } => {
                self.feedback.set_loading(false);
                match result {
                    Ok(()) => {
                        tracing::info!(book_id = %book_id, status = %status, "book moved");
                        self.retire_move(&book_id, status, false);
                        self.feedback.success("Book moved successfully!");
                        self.emit(BoardEvent::BookMoved { book_id, status });
                    }
                    Err(err) => {
                        tracing::warn!(book_id = %book_id, error = %err, "move book failed");
                        self.feedback.danger("Failed to move book");
                        self.settle_failed_move(&book_id, status);
                    }
                }
                Vec::new()
            }
            Completion::BookRemoved(result) => {
                self.feedback.set_loading(false);
                match result {
                    Ok(()) => {
                        tracing::info!("book removed");
                        self.feedback.success("Book removed successfully!");
                        vec![self.reload()]
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "remove book failed");
                        self.feedback.danger(remove_failure_message(&err));
                        Vec::new()
                    }
                }
            }
            Completion::BookRated {
                book_id,
                rating,
                result,
            } => {
                self.feedback.set_loading(false);
                match result {
                    Ok(()) => {
                        if let Some(card) = self.board.card_mut(&book_id) {
                            card.rating = Some(rating);
                        }
                        tracing::info!(book_id = %book_id, rating = rating.value(), "book rated");
                    }
                    Err(err) => {
                        tracing::warn!(book_id = %book_id, error = %err, "rate book failed");
                    }
                }
                Vec::new()
            }
            Completion::SearchFinished { seq, result } => {
                self.feedback.set_loading(false);
                match result {
                    Ok(items) => {
                        if !self.search.accept(seq, items) {
                            tracing::debug!(seq, "stale search response dropped");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(seq, error = %err, "search failed");
                        if self.search.is_latest(seq) {
                            self.feedback.danger("Error searching books");
                        }
                    }
                }
                Vec::new()
            }
            Completion::CoverFetched { url, result } => {
                if let Err(err) = &result {
                    tracing::debug!(url = %url, error = %err, "cover fetch failed");
                }
                self.details.resolve_cover(&url, result.ok());
                Vec::new()
            }
        }
    }

    /// Retires the oldest pending drop of `book_id` onto `status`. Returns it
    /// and whether it was the newest drop of that card. When a superseded drop
    /// failed, the drop after it inherits its origin: the card never settled in
    /// the refused column.
    fn retire_move(
        &mut self,
        book_id: &BookId,
        status: ReadingStatus,
        failed: bool,
    ) -> Option<(PendingMove, bool)> {
        let queue = self.pending_moves.get_mut(book_id)?;
        let idx = queue.iter().position(|pending| pending.target == status)?;
        let retired = queue.remove(idx)?;
        let latest = idx == queue.len();
        if failed && let Some(next) = queue.get_mut(idx) {
            next.origin = retired.origin;
        }
        if queue.is_empty() {
            self.pending_moves.remove(book_id);
        }
        Some((retired, latest))
    }

    fn settle_failed_move(&mut self, book_id: &BookId, status: ReadingStatus) {
        let Some((failed, latest)) = self.retire_move(book_id, status, true) else {
            return;
        };
        if self.settings.move_failure_policy != MoveFailurePolicy::Rollback || !latest {
            return;
        }
        let current = self.board.card(book_id).map(|card| card.status);
        if current != Some(status) {
            return;
        }
        let (from, idx) = failed.origin;
        self.board.relocate(book_id, from, Some(idx));
        self.clamp_selection();
    }
}

fn remove_failure_message(err: &ApiError) -> String {
    match err.reason() {
        Some(reason) if !reason.trim().is_empty() => format!("Failed to remove book: {reason}"),
        _ => "Failed to remove book".to_string(),
    }
}
