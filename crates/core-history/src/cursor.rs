//! Navigation cursor for one interactive line edit.
//!
//! The cursor remembers the store length at creation. Position `-1` means
//! "before the newest entry"; `back` walks toward older entries, `forward`
//! toward newer ones. If the store grew since the snapshot, a non-negative
//! position is advanced by the growth before the next item is produced, so
//! the entry it points at stays the same and the appended entries remain
//! reachable from the newest end.

use crate::store::HistoryStore;

#[derive(Debug)]
pub struct HistoryCursor {
    known_len: usize,
    pos: isize,
}

impl HistoryCursor {
    pub fn new(store: &HistoryStore) -> Self {
        Self {
            known_len: store.len(),
            pos: -1,
        }
    }

    fn rebase(&mut self, store: &HistoryStore) {
        let grown = store.len().saturating_sub(self.known_len);
        if grown > 0 {
            if self.pos >= 0 {
                self.pos += grown as isize;
            }
            self.known_len = store.len();
        }
    }

    /// Next-older entry, or `None` at the oldest boundary.
    pub fn back(&mut self, store: &HistoryStore) -> Option<String> {
        self.rebase(store);
        let next = self.pos + 1;
        let entry = store.at(next as usize)?.to_string();
        self.pos = next;
        Some(entry)
    }

    /// Next-newer entry, or `None` at the newest boundary. Stepping forward
    /// off the newest entry returns the cursor to its home position so a
    /// subsequent `back` yields the newest entry again.
    pub fn forward(&mut self, store: &HistoryStore) -> Option<String> {
        self.rebase(store);
        if self.pos <= 0 {
            self.pos = -1;
            return None;
        }
        self.pos -= 1;
        Some(store.at(self.pos as usize)?.to_string())
    }

    pub fn position(&self) -> isize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(entries: &[&str]) -> HistoryStore {
        let mut s = HistoryStore::new();
        for e in entries {
            s.add(*e);
        }
        s
    }

    #[test]
    fn back_walks_newest_to_oldest() {
        let s = store(&["1", "2", "3"]);
        let mut c = HistoryCursor::new(&s);

        assert_eq!(c.back(&s), Some("3".to_string()));
        assert_eq!(c.back(&s), Some("2".to_string()));
        assert_eq!(c.back(&s), Some("1".to_string()));
        assert_eq!(c.back(&s), None, "oldest boundary");

        assert_eq!(c.forward(&s), Some("2".to_string()));
        assert_eq!(c.back(&s), Some("1".to_string()));
    }

    #[test]
    fn forward_at_home_is_boundary() {
        let s = store(&["1", "2"]);
        let mut c = HistoryCursor::new(&s);
        assert_eq!(c.forward(&s), None);
    }

    #[test]
    fn alternating_back_forward_returns_to_same_index() {
        let s = store(&["1", "2", "3"]);
        let mut c = HistoryCursor::new(&s);
        c.back(&s);
        let before = c.position();
        c.back(&s);
        c.forward(&s);
        assert_eq!(c.position(), before);
    }

    #[test]
    fn forward_off_newest_rearms_back() {
        let s = store(&["1", "2"]);
        let mut c = HistoryCursor::new(&s);
        assert_eq!(c.back(&s), Some("2".to_string()));
        assert_eq!(c.forward(&s), None, "newest boundary");
        assert_eq!(c.back(&s), Some("2".to_string()));
    }

    #[test]
    fn growth_rebases_position() {
        let mut s = store(&["1", "2", "3"]);
        let mut c = HistoryCursor::new(&s);

        // Pointing at "3" (index 0).
        assert_eq!(c.back(&s), Some("3".to_string()));

        s.add("4");
        s.add("5");

        // "3" moved to index 2; the next-older entry is still "2".
        assert_eq!(c.back(&s), Some("2".to_string()));
        // Walking forward revisits "3" and then reaches the new entries.
        assert_eq!(c.forward(&s), Some("3".to_string()));
        assert_eq!(c.forward(&s), Some("4".to_string()));
        assert_eq!(c.forward(&s), Some("5".to_string()));
        assert_eq!(c.forward(&s), None);
    }

    #[test]
    fn growth_before_first_move_is_transparent() {
        let mut s = store(&["1"]);
        let mut c = HistoryCursor::new(&s);
        s.add("2");
        assert_eq!(c.back(&s), Some("2".to_string()), "new entries come first");
    }

    #[test]
    fn empty_store_has_no_entries_in_either_direction() {
        let s = HistoryStore::new();
        let mut c = HistoryCursor::new(&s);
        assert_eq!(c.back(&s), None);
        assert_eq!(c.forward(&s), None);
    }
}
