//! Three-segment reading progress bar.

use shelftrack_core::ReadingStatus;

use crate::board::{Board, BoardEvent};

/// Segments at or below this share of the total get no label.
pub const LABEL_THRESHOLD_PERCENT: usize = 10;

const OPACITIES: [f32; 3] = [0.3, 0.6, 0.9];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub want_to_read: usize,
    pub reading: usize,
    pub read: usize,
}

impl StatusCounts {
    pub fn new(want_to_read: usize, reading: usize, read: usize) -> Self {
        Self {
            want_to_read,
            reading,
            read,
        }
    }

    pub fn get(&self, status: ReadingStatus) -> usize {
        match status {
            ReadingStatus::WantToRead => self.want_to_read,
            ReadingStatus::Reading => self.reading,
            ReadingStatus::Read => self.read,
        }
    }

    pub fn total(&self) -> usize {
        self.want_to_read + self.reading + self.read
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub status: ReadingStatus,
    pub count: usize,
    pub percent: f64,
    pub opacity: f32,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBar {
    pub segments: [Segment; 3],
    pub total: usize,
}

impl ProgressBar {
    /// `None` when there is nothing to draw.
    pub fn compute(counts: StatusCounts) -> Option<Self> {
        let total = counts.total();
        if total == 0 {
            return None;
        }

        let segments = ReadingStatus::ALL.map(|status| {
            let count = counts.get(status);
            let percent = count as f64 * 100.0 / total as f64;
            // Integer comparison keeps exactly-10% slices unlabeled.
            let label = (count * 100 > total * LABEL_THRESHOLD_PERCENT)
                .then(|| format!("{}%", percent.round() as u32));
            Segment {
                status,
                count,
                percent,
                opacity: OPACITIES[status.index()],
                label,
            }
        });

        Some(Self { segments, total })
    }

    /// Integer cell widths, left to right, summing exactly to `width`.
    pub fn layout(&self, width: u16) -> [u16; 3] {
        let width = width as usize;
        let exact = self
            .segments
            .each_ref()
            .map(|s| s.count * width);
        let mut cells = exact.map(|e| e / self.total);
        let assigned: usize = cells.iter().sum();

        let mut order = [0usize, 1, 2];
        order.sort_by_key(|&idx| std::cmp::Reverse(exact[idx] % self.total));
        for idx in order.into_iter().take(width - assigned) {
            cells[idx] += 1;
        }

        cells.map(|c| c as u16)
    }
}

/// Redraws the bar from live board counts when the board announces a change.
#[derive(Debug, Clone, Default)]
pub struct ProgressVisualizer {
    bar: Option<ProgressBar>,
}

impl ProgressVisualizer {
    pub fn observe(&mut self, event: &BoardEvent, board: &Board) {
        match event {
            BoardEvent::LibraryLoaded | BoardEvent::BookMoved { .. } => self.redraw(board),
        }
    }

    pub fn redraw(&mut self, board: &Board) {
        self.bar = ProgressBar::compute(board.counts());
    }

    pub fn bar(&self) -> Option<&ProgressBar> {
        self.bar.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_draws_nothing() {
        assert!(ProgressBar::compute(StatusCounts::default()).is_none());
    }

    #[test]
    fn proportions_follow_counts() {
        let bar = ProgressBar::compute(StatusCounts::new(2, 3, 5)).unwrap();
        let percents: Vec<f64> = bar.segments.iter().map(|s| s.percent).collect();
        assert_eq!(percents, vec![20.0, 30.0, 50.0]);
        let labels: Vec<Option<&str>> = bar.segments.iter().map(|s| s.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("20%"), Some("30%"), Some("50%")]);
    }

    #[test]
    fn exactly_ten_percent_is_not_labeled() {
        let bar = ProgressBar::compute(StatusCounts::new(1, 1, 8)).unwrap();
        let labels: Vec<Option<&str>> = bar.segments.iter().map(|s| s.label.as_deref()).collect();
        assert_eq!(labels, vec![None, None, Some("80%")]);
    }

    #[test]
    fn opacity_increases_left_to_right() {
        let bar = ProgressBar::compute(StatusCounts::new(1, 1, 1)).unwrap();
        let statuses: Vec<ReadingStatus> = bar.segments.iter().map(|s| s.status).collect();
        assert_eq!(statuses, ReadingStatus::ALL.to_vec());
        assert!(bar.segments[0].opacity < bar.segments[1].opacity);
        assert!(bar.segments[1].opacity < bar.segments[2].opacity);
    }

    #[test]
    fn layout_fills_width_exactly() {
        let bar = ProgressBar::compute(StatusCounts::new(1, 1, 1)).unwrap();
        let cells = bar.layout(100);
        assert_eq!(cells.iter().map(|&c| c as usize).sum::<usize>(), 100);
        assert_eq!(cells, [34, 33, 33]);

        let bar = ProgressBar::compute(StatusCounts::new(2, 3, 5)).unwrap();
        assert_eq!(bar.layout(50), [10, 15, 25]);
    }

    #[test]
    fn layout_gives_zero_cells_to_empty_segments() {
        let bar = ProgressBar::compute(StatusCounts::new(0, 0, 4)).unwrap();
        assert_eq!(bar.layout(7), [0, 0, 7]);
    }
}
