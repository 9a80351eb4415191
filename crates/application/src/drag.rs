//! Drag-and-drop between status columns.
//!
//! A drop relocates the card immediately and only then asks the server to
//! persist the move. What happens if the server refuses is decided by
//! [`MoveFailurePolicy`](shelftrack_core::MoveFailurePolicy).

use shelftrack_core::{BookId, ReadingStatus};

use crate::{AppState, Command, PendingMove};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragState {
    /// Payload carried by the active drag.
    pub dragging: Option<BookId>,
    /// Column showing the drag-over affordance.
    pub hover: Option<ReadingStatus>,
}

impl DragState {
    pub fn is_active(&self) -> bool {
        self.dragging.is_some()
    }

    pub fn is_dragging(&self, id: &BookId) -> bool {
        self.dragging.as_ref() == Some(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragRejected;

impl AppState {
    /// Starts dragging a card. A card without an identifier cannot be dragged.
    pub fn drag_start(&mut self, card_id: &BookId) -> Result<(), DragRejected> {
        if card_id.is_empty() {
            return Err(DragRejected);
        }
        self.drag.dragging = Some(card_id.clone());
        Ok(())
    }

    pub fn drag_over(&mut self, status: ReadingStatus) {
        if self.drag.hover != Some(status) {
            self.drag.hover = Some(status);
        }
    }

    pub fn drag_leave(&mut self, status: ReadingStatus) {
        if self.drag.hover == Some(status) {
            self.drag.hover = None;
        }
    }

    /// Abandons the drag without a drop.
    pub fn drag_cancel(&mut self) {
        self.drag = DragState::default();
    }

    /// Drops the carried card onto `target`.
    pub fn drop_on(&mut self, target: Option<ReadingStatus>) -> Option<Command> {
        let payload = self.drag.dragging.take();
        self.drag.hover = None;

        let (Some(book_id), Some(status)) = (payload, target) else {
            self.feedback.danger("Error: Invalid drag and drop operation");
            return None;
        };
        if book_id.is_empty() {
            self.feedback.danger("Error: Invalid drag and drop operation");
            return None;
        }

        if let Some(origin) = self.board.relocate(&book_id, status, None) {
            self.pending_moves
                .entry(book_id.clone())
                .or_default()
                .push_back(PendingMove {
                    target: status,
                    origin,
                });
            if let Some((column, row)) = self.board.position(&book_id) {
                self.select(column, row);
            }
        }

        self.move_book(book_id, status)
    }
}
