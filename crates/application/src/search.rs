//! Debounced catalog search.

use std::time::{Duration, Instant};

use shelftrack_core::SearchItem;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchResults {
    /// Nothing searched yet; recommendations are offered instead.
    #[default]
    Idle,
    Items(Vec<SearchItem>),
    NoBooksFound,
}

/// A search that is due to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub seq: u64,
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct SearchPanel {
    pub open: bool,
    pub query: String,
    pub results: SearchResults,
    pub cursor: usize,
    debounce: Duration,
    min_chars: usize,
    deadline: Option<Instant>,
    issued: u64,
}

impl SearchPanel {
    pub fn new(debounce: Duration, min_chars: usize) -> Self {
        Self {
            open: false,
            query: String::new(),
            results: SearchResults::Idle,
            cursor: 0,
            debounce,
            min_chars,
            deadline: None,
            issued: 0,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.deadline = None;
    }

    pub fn push_char(&mut self, ch: char, now: Instant) {
        self.query.push(ch);
        self.restart_timer(now);
    }

    pub fn backspace(&mut self, now: Instant) {
        if self.query.pop().is_some() {
            self.restart_timer(now);
        }
    }

    pub fn clear_query(&mut self, now: Instant) {
        self.query.clear();
        self.results = SearchResults::Idle;
        self.cursor = 0;
        self.restart_timer(now);
    }

    pub fn set_query(&mut self, query: impl Into<String>, now: Instant) {
        self.query = query.into();
        self.restart_timer(now);
    }

    /// Each edit replaces the pending timer; only the last one can fire.
    fn restart_timer(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fires the pending search once the input has been quiet for the debounce
    /// window. Short queries consume the timer without producing a request.
    pub fn poll(&mut self, now: Instant) -> Option<SearchRequest> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;

        let query = self.query.trim();
        if query.chars().count() < self.min_chars {
            return None;
        }

        self.issued += 1;
        Some(SearchRequest {
            seq: self.issued,
            query: query.to_string(),
        })
    }

    /// Applies a response. Responses to superseded searches are ignored so the
    /// panel always reflects the most recently fired query.
    pub fn accept(&mut self, seq: u64, items: Vec<SearchItem>) -> bool {
        if seq != self.issued {
            return false;
        }
        self.results = if items.is_empty() {
            SearchResults::NoBooksFound
        } else {
            SearchResults::Items(items)
        };
        self.cursor = 0;
        true
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.issued
    }

    pub fn result_count(&self) -> usize {
        match &self.results {
            SearchResults::Items(items) => items.len(),
            _ => 0,
        }
    }

    pub fn selected_item(&self) -> Option<&SearchItem> {
        match &self.results {
            SearchResults::Items(items) => items.get(self.cursor),
            _ => None,
        }
    }

    pub fn move_cursor(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelftrack_core::CatalogId;

    fn panel() -> SearchPanel {
        SearchPanel::new(Duration::from_millis(300), 2)
    }

    fn item(id: &str) -> SearchItem {
        SearchItem {
            catalog_id: CatalogId::new(id),
            title: id.to_string(),
            authors: "Unknown Author".to_string(),
            description: None,
            thumbnail: "/static/img/no-cover.png".to_string(),
        }
    }

    #[test]
    fn fires_only_after_quiet_period() {
        let mut search = panel();
        let t0 = Instant::now();
        search.push_char('d', t0);
        search.push_char('u', t0 + Duration::from_millis(200));
        assert_eq!(search.poll(t0 + Duration::from_millis(400)), None);

        let request = search.poll(t0 + Duration::from_millis(500)).unwrap();
        assert_eq!(request.query, "du");
        assert_eq!(request.seq, 1);
        assert_eq!(search.poll(t0 + Duration::from_millis(900)), None);
    }

    #[test]
    fn short_queries_never_fire() {
        let mut search = panel();
        let t0 = Instant::now();
        search.set_query("  a  ", t0);
        assert_eq!(search.poll(t0 + Duration::from_secs(1)), None);
        assert!(!search.is_pending());
    }

    #[test]
    fn query_is_trimmed() {
        let mut search = panel();
        let t0 = Instant::now();
        search.set_query("  dune ", t0);
        let request = search.poll(t0 + Duration::from_millis(300)).unwrap();
        assert_eq!(request.query, "dune");
    }

    #[test]
    fn empty_response_shows_no_books_found() {
        let mut search = panel();
        let t0 = Instant::now();
        search.set_query("zzzz", t0);
        let request = search.poll(t0 + Duration::from_millis(300)).unwrap();
        assert!(search.accept(request.seq, Vec::new()));
        assert_eq!(search.results, SearchResults::NoBooksFound);
        assert_eq!(search.result_count(), 0);
    }

    #[test]
    fn stale_responses_are_ignored() {
        let mut search = panel();
        let t0 = Instant::now();
        search.set_query("du", t0);
        let first = search.poll(t0 + Duration::from_millis(300)).unwrap();
        search.set_query("dune", t0 + Duration::from_millis(400));
        let second = search.poll(t0 + Duration::from_millis(700)).unwrap();

        assert!(search.accept(second.seq, vec![item("b")]));
        assert!(!search.accept(first.seq, vec![item("a")]));
        assert_eq!(search.selected_item().map(|i| i.title.as_str()), Some("b"));
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut search = panel();
        search.move_cursor(5, 3);
        assert_eq!(search.cursor, 2);
        search.move_cursor(-10, 3);
        assert_eq!(search.cursor, 0);
        search.move_cursor(1, 0);
        assert_eq!(search.cursor, 0);
    }
}
