//! Indexed board of book cards.

use std::collections::HashMap;

use shelftrack_core::{BookCard, BookId, LibrarySnapshot, ReadingStatus};

use crate::progress::StatusCounts;

/// Notifications raised by board changes that other components observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    LibraryLoaded,
    BookMoved {
        book_id: BookId,
        status: ReadingStatus,
    },
}

/// Cards keyed by id plus one ordered column per status.
///
/// Every id stored in a column has a card in `cards`, and appears in exactly
/// one column.
#[derive(Debug, Clone, Default)]
pub struct Board {
    cards: HashMap<BookId, BookCard>,
    columns: [Vec<BookId>; 3],
}

impl Board {
    pub fn from_cards(cards: impl IntoIterator<Item = BookCard>) -> Self {
        let mut board = Board::default();
        for card in cards {
            if card.id.is_empty() {
                continue;
            }
            if let Some((status, idx)) = board.position(&card.id) {
                board.columns[status.index()].remove(idx);
            }
            board.columns[card.status.index()].push(card.id.clone());
            board.cards.insert(card.id.clone(), card);
        }
        board
    }

    pub fn from_snapshot(snapshot: &LibrarySnapshot) -> Self {
        Self::from_cards(snapshot.cards.iter().cloned())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn column(&self, status: ReadingStatus) -> &[BookId] {
        &self.columns[status.index()]
    }

    pub fn cards_in(&self, status: ReadingStatus) -> impl Iterator<Item = &BookCard> {
        self.columns[status.index()]
            .iter()
            .filter_map(|id| self.cards.get(id))
    }

    pub fn card(&self, id: &BookId) -> Option<&BookCard> {
        self.cards.get(id)
    }

    pub fn card_mut(&mut self, id: &BookId) -> Option<&mut BookCard> {
        self.cards.get_mut(id)
    }

    pub fn card_at(&self, status: ReadingStatus, index: usize) -> Option<&BookCard> {
        self.columns[status.index()]
            .get(index)
            .and_then(|id| self.cards.get(id))
    }

    pub fn position(&self, id: &BookId) -> Option<(ReadingStatus, usize)> {
        ReadingStatus::ALL.into_iter().find_map(|status| {
            self.columns[status.index()]
                .iter()
                .position(|candidate| candidate == id)
                .map(|idx| (status, idx))
        })
    }

    /// Moves a card into `target` (appended when `index` is `None`) and updates
    /// its status. Returns where the card was before, or `None` if unknown.
    pub fn relocate(
        &mut self,
        id: &BookId,
        target: ReadingStatus,
        index: Option<usize>,
    ) -> Option<(ReadingStatus, usize)> {
        let (from, from_idx) = self.position(id)?;
        let card = self.cards.get_mut(id)?;
        self.columns[from.index()].remove(from_idx);
        let column = &mut self.columns[target.index()];
        let at = index.unwrap_or(column.len()).min(column.len());
        column.insert(at, id.clone());
        card.status = target;
        Some((from, from_idx))
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts {
            want_to_read: self.columns[ReadingStatus::WantToRead.index()].len(),
            reading: self.columns[ReadingStatus::Reading.index()].len(),
            read: self.columns[ReadingStatus::Read.index()].len(),
        }
    }
}
