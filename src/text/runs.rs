//! Property run list.
//!
//! Style runs form a doubly linked list stored in an arena. Nodes are
//! addressed by [`RunId`] handles and recycled through a free list, so
//! splicing and merging stay O(1) without any shared ownership.
//!
//! Invariants, checked by [`RunList::check_invariants`] in tests:
//!
//! - run lengths sum to the text length;
//! - no run is empty;
//! - adjacent runs never carry equal styles.

use crate::error::Error;
use crate::style::Style;

use super::mark::{BufferId, Mark};

/// Handle of a run inside a [`RunList`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunId(u32);

impl RunId {
    fn slot(self) -> usize {
        self.0 as usize
    }
}

/// One maximal span of identically styled characters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Run {
    pub style: Style,
    pub len: usize,
}

#[derive(Clone, Debug)]
struct RunNode {
    run: Run,
    prev: Option<RunId>,
    next: Option<RunId>,
}

/// Arena-backed doubly linked list of style runs.
#[derive(Clone, Debug)]
pub struct RunList {
    owner: BufferId,
    nodes: Vec<Option<RunNode>>,
    free_list: Vec<RunId>,
    head: Option<RunId>,
    tail: Option<RunId>,
    total: usize,
    live: usize,
}

impl RunList {
    /// Create an empty list whose marks belong to `owner`.
    #[must_use]
    pub(crate) fn new(owner: BufferId) -> Self {
        Self {
            owner,
            nodes: Vec::new(),
            free_list: Vec::new(),
            head: None,
            tail: None,
            total: 0,
            live: 0,
        }
    }

    /// Sum of all run lengths.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.total
    }

    /// Number of live runs.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.live
    }

    /// First run.
    #[must_use]
    pub fn head(&self) -> Option<RunId> {
        self.head
    }

    /// Last run.
    #[must_use]
    pub fn tail(&self) -> Option<RunId> {
        self.tail
    }

    /// Run data for a live handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was released.
    #[must_use]
    pub fn get(&self, id: RunId) -> &Run {
        &self.node(id).run
    }

    /// Run after `id`.
    #[must_use]
    pub fn next(&self, id: RunId) -> Option<RunId> {
        self.node(id).next
    }

    /// Run before `id`.
    #[must_use]
    pub fn prev(&self, id: RunId) -> Option<RunId> {
        self.node(id).prev
    }

    /// Iterate over the runs in text order.
    pub fn iter(&self) -> impl Iterator<Item = (RunId, &Run)> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let id = cursor?;
            let node = self.node(id);
            cursor = node.next;
            Some((id, &node.run))
        })
    }

    /// Mark at index 0.
    #[must_use]
    pub fn start_mark(&self) -> Mark {
        Mark {
            owner: self.owner,
            run: self.head,
            offset: 0,
            index: 0,
        }
    }

    /// Mark just past the last character.
    #[must_use]
    pub fn end_mark(&self) -> Mark {
        Mark {
            owner: self.owner,
            run: None,
            offset: 0,
            index: self.total,
        }
    }

    /// Panic unless `mark` was produced for this list's buffer.
    pub fn check_owner(&self, mark: &Mark) {
        if mark.owner != self.owner {
            panic!(
                "{}",
                Error::ForeignMark {
                    expected: self.owner.get(),
                    found: mark.owner.get(),
                }
            );
        }
    }

    /// Style of the character under `mark`.
    ///
    /// At the end of the buffer this is the style of the last run, so that
    /// text typed there continues it.
    #[must_use]
    pub fn style_at(&self, mark: &Mark) -> Option<Style> {
        mark.run.or(self.tail).map(|id| self.get(id).style)
    }

    /// Move `mark` forward by one character.
    pub fn advance(&self, mark: &mut Mark) {
        self.advance_n(mark, 1);
    }

    /// Move `mark` forward by `n` characters.
    ///
    /// # Panics
    ///
    /// Panics when walking past the end of the buffer.
    pub fn advance_n(&self, mark: &mut Mark, n: usize) {
        self.check_owner(mark);
        let mut n = n;
        while n > 0 {
            let Some(id) = mark.run else {
                panic!(
                    "{}",
                    Error::OutOfBounds {
                        index: mark.index + n,
                        len: self.total,
                    }
                );
            };
            let remaining = self.get(id).len - mark.offset;
            if n < remaining {
                mark.offset += n;
                mark.index += n;
                return;
            }
            n -= remaining;
            mark.index += remaining;
            mark.offset = 0;
            mark.run = self.next(id);
        }
    }

    /// Move `mark` back by one character.
    pub fn decrement(&self, mark: &mut Mark) {
        self.decrement_n(mark, 1);
    }

    /// Move `mark` back by `n` characters.
    ///
    /// # Panics
    ///
    /// Panics when walking before index 0.
    pub fn decrement_n(&self, mark: &mut Mark, n: usize) {
        self.check_owner(mark);
        let mut n = n;
        while n > 0 {
            if mark.offset >= n {
                mark.offset -= n;
                mark.index -= n;
                return;
            }
            n -= mark.offset;
            mark.index -= mark.offset;
            let prev = match mark.run {
                Some(id) => self.prev(id),
                None => self.tail,
            };
            let Some(prev) = prev else {
                panic!(
                    "{}",
                    Error::OutOfBounds {
                        index: 0,
                        len: self.total,
                    }
                );
            };
            mark.run = Some(prev);
            mark.offset = self.get(prev).len;
        }
    }

    /// Materialize `index` as a mark, walking from the closest of the
    /// buffer start, the buffer end, or `near`.
    ///
    /// # Panics
    ///
    /// Panics if `index > total_len()` or `near` is foreign.
    #[must_use]
    pub fn find_mark_near(&self, index: usize, near: Option<&Mark>) -> Mark {
        if index > self.total {
            panic!(
                "{}",
                Error::OutOfBounds {
                    index,
                    len: self.total,
                }
            );
        }
        let mut best = if index <= self.total - index {
            self.start_mark()
        } else {
            self.end_mark()
        };
        if let Some(near) = near {
            self.check_owner(near);
            if near.index.abs_diff(index) < best.index.abs_diff(index) {
                best = near.clone();
            }
        }
        if index >= best.index {
            let n = index - best.index;
            self.advance_n(&mut best, n);
        } else {
            let n = best.index - index;
            self.decrement_n(&mut best, n);
        }
        best
    }

    /// Walk from the head and check that `mark` is consistent.
    #[must_use]
    pub fn is_consistent(&self, mark: &Mark) -> bool {
        if mark.owner != self.owner {
            return false;
        }
        let Some(target) = mark.run else {
            return mark.offset == 0 && mark.index == self.total;
        };
        let mut start = 0;
        for (id, run) in self.iter() {
            if id == target {
                return mark.offset < run.len && start + mark.offset == mark.index;
            }
            start += run.len;
        }
        false
    }

    /// Record `len` new characters of `style` at `at`.
    ///
    /// Extends a neighbouring run when the style matches, otherwise splits
    /// the run under the mark and splices a new one in. `at` is left on the
    /// first inserted character.
    pub fn insert(&mut self, at: &mut Mark, style: Style, len: usize) {
        self.check_owner(at);
        if len == 0 {
            return;
        }
        self.total += len;

        match at.run {
            None => {
                if let Some(tail) = self.tail.filter(|&t| self.get(t).style == style) {
                    let run = &mut self.node_mut(tail).run;
                    at.offset = run.len;
                    run.len += len;
                    at.run = Some(tail);
                } else {
                    let id = self.alloc(Run { style, len });
                    self.link_after(self.tail, id);
                    at.run = Some(id);
                    at.offset = 0;
                }
            }
            Some(id) if at.offset == 0 => {
                if self.get(id).style == style {
                    self.node_mut(id).run.len += len;
                } else if let Some(prev) = self.prev(id).filter(|&p| self.get(p).style == style) {
                    let run = &mut self.node_mut(prev).run;
                    at.offset = run.len;
                    run.len += len;
                    at.run = Some(prev);
                } else {
                    let new = self.alloc(Run { style, len });
                    self.link_after(self.prev(id), new);
                    at.run = Some(new);
                }
            }
            Some(id) => {
                if self.get(id).style == style {
                    self.node_mut(id).run.len += len;
                } else {
                    let tail_len = self.get(id).len - at.offset;
                    let tail_style = self.get(id).style;
                    self.node_mut(id).run.len = at.offset;
                    let new = self.alloc(Run { style, len });
                    self.link_after(Some(id), new);
                    let rest = self.alloc(Run {
                        style: tail_style,
                        len: tail_len,
                    });
                    self.link_after(Some(new), rest);
                    at.run = Some(new);
                    at.offset = 0;
                }
            }
        }
    }

    /// Forget `count` characters starting at `at`.
    ///
    /// Emptied runs are unlinked. `at` is left on the first character
    /// after the deleted span; if the runs meeting there now share a style
    /// they are merged.
    ///
    /// # Panics
    ///
    /// Panics if the span runs past the end of the buffer.
    pub fn delete(&mut self, at: &mut Mark, count: usize) {
        self.check_owner(at);
        if at.index + count > self.total {
            panic!(
                "{}",
                Error::InvalidRange {
                    start: at.index,
                    end: at.index + count,
                    len: self.total,
                }
            );
        }
        self.total -= count;

        let mut remaining = count;
        while remaining > 0 {
            let Some(id) = at.run else {
                break;
            };
            let avail = self.get(id).len - at.offset;
            let take = avail.min(remaining);
            remaining -= take;
            let left = {
                let run = &mut self.node_mut(id).run;
                run.len -= take;
                run.len
            };
            if left == 0 {
                let next = self.next(id);
                self.unlink(id);
                at.run = next;
                at.offset = 0;
            } else if at.offset == left {
                at.run = self.next(id);
                at.offset = 0;
            }
        }

        if at.offset == 0 {
            if let Some(id) = at.run {
                if let Some(prev) = self.prev(id) {
                    if self.get(prev).style == self.get(id).style {
                        let moved = self.get(id).len;
                        self.unlink(id);
                        let run = &mut self.node_mut(prev).run;
                        at.offset = run.len;
                        run.len += moved;
                        at.run = Some(prev);
                    }
                }
            }
        }
    }

    /// Give `count` characters starting at `at` a new style.
    pub fn restyle(&mut self, at: &mut Mark, count: usize, style: Style) {
        self.delete(at, count);
        self.insert(at, style, count);
    }

    /// Drop every run.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        self.total = 0;
        self.live = 0;
    }

    /// Check the structural invariants, returning a description of the
    /// first violation.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut sum = 0;
        let mut count = 0;
        let mut prev: Option<(RunId, Style)> = None;
        for (id, run) in self.iter() {
            if run.len == 0 {
                return Err(format!("run {id:?} is empty"));
            }
            if let Some((prev_id, prev_style)) = prev {
                if prev_style == run.style {
                    return Err(format!("runs {prev_id:?} and {id:?} share a style"));
                }
                if self.prev(id) != Some(prev_id) {
                    return Err(format!("back link of {id:?} is broken"));
                }
            }
            sum += run.len;
            count += 1;
            prev = Some((id, run.style));
        }
        if prev.map(|(id, _)| id) != self.tail {
            return Err("tail does not match last run".to_string());
        }
        if sum != self.total {
            return Err(format!("run lengths sum to {sum}, expected {}", self.total));
        }
        if count != self.live {
            return Err(format!("{count} runs linked, {} live", self.live));
        }
        Ok(())
    }

    fn node(&self, id: RunId) -> &RunNode {
        self.nodes[id.slot()]
            .as_ref()
            .unwrap_or_else(|| panic!("run {id:?} used after release"))
    }

    fn node_mut(&mut self, id: RunId) -> &mut RunNode {
        self.nodes[id.slot()]
            .as_mut()
            .unwrap_or_else(|| panic!("run {id:?} used after release"))
    }

    fn alloc(&mut self, run: Run) -> RunId {
        let node = RunNode {
            run,
            prev: None,
            next: None,
        };
        self.live += 1;
        if let Some(id) = self.free_list.pop() {
            self.nodes[id.slot()] = Some(node);
            return id;
        }
        self.nodes.push(Some(node));
        RunId((self.nodes.len() - 1) as u32)
    }

    /// Link a detached node after `prev`, or at the head when `prev` is None.
    fn link_after(&mut self, prev: Option<RunId>, id: RunId) {
        let next = match prev {
            Some(p) => self.node(p).next,
            None => self.head,
        };
        {
            let node = self.node_mut(id);
            node.prev = prev;
            node.next = next;
        }
        match prev {
            Some(p) => self.node_mut(p).next = Some(id),
            None => self.head = Some(id),
        }
        match next {
            Some(n) => self.node_mut(n).prev = Some(id),
            None => self.tail = Some(id),
        }
    }

    fn unlink(&mut self, id: RunId) {
        let (prev, next) = {
            let node = self.node(id);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        self.nodes[id.slot()] = None;
        self.free_list.push(id);
        self.live -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    fn list() -> RunList {
        RunList::new(BufferId::next())
    }

    fn lens(runs: &RunList) -> Vec<usize> {
        runs.iter().map(|(_, r)| r.len).collect()
    }

    const RED: Style = Style::fg(Rgba::RED);
    const BLUE: Style = Style::fg(Rgba::BLUE);

    #[test]
    fn test_insert_at_end_extends_tail() {
        let mut runs = list();
        let mut at = runs.end_mark();
        runs.insert(&mut at, RED, 3);
        let mut at = runs.end_mark();
        runs.insert(&mut at, RED, 2);
        assert_eq!(lens(&runs), vec![5]);
        assert_eq!(at.index(), 3);
        assert_eq!(at.offset(), 3);
        assert!(runs.is_consistent(&at));
        runs.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_splits_run() {
        let mut runs = list();
        let mut at = runs.end_mark();
        runs.insert(&mut at, RED, 6);
        let mut at = runs.find_mark_near(2, None);
        runs.insert(&mut at, BLUE, 3);
        assert_eq!(lens(&runs), vec![2, 3, 4]);
        assert_eq!(at.offset(), 0);
        assert_eq!(at.index(), 2);
        assert_eq!(runs.get(at.run().unwrap()).style, BLUE);
        runs.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_on_boundary_prefers_equal_neighbour() {
        let mut runs = list();
        let mut at = runs.end_mark();
        runs.insert(&mut at, RED, 2);
        let mut at = runs.end_mark();
        runs.insert(&mut at, BLUE, 2);

        // boundary between RED and BLUE, inserting RED grows the previous run
        let mut at = runs.find_mark_near(2, None);
        runs.insert(&mut at, RED, 1);
        assert_eq!(lens(&runs), vec![3, 2]);
        assert_eq!(at.index(), 2);
        assert!(runs.is_consistent(&at));

        // inserting a third style on the boundary splices a new run
        let mut at = runs.find_mark_near(3, None);
        runs.insert(&mut at, Style::NONE, 1);
        assert_eq!(lens(&runs), vec![3, 1, 2]);
        runs.check_invariants().unwrap();
    }

    #[test]
    fn test_delete_merges_at_point() {
        let mut runs = list();
        for style in [RED, BLUE, RED] {
            let mut at = runs.end_mark();
            runs.insert(&mut at, style, 2);
        }
        assert_eq!(runs.run_count(), 3);
        let mut at = runs.find_mark_near(2, None);
        runs.delete(&mut at, 2);
        assert_eq!(lens(&runs), vec![4]);
        assert_eq!(at.index(), 2);
        assert_eq!(at.offset(), 2);
        assert!(runs.is_consistent(&at));
        runs.check_invariants().unwrap();
    }

    #[test]
    fn test_delete_everything_leaves_no_runs() {
        let mut runs = list();
        for style in [RED, BLUE, Style::NONE] {
            let mut at = runs.end_mark();
            runs.insert(&mut at, style, 4);
        }
        let mut at = runs.start_mark();
        runs.delete(&mut at, 12);
        assert_eq!(runs.run_count(), 0);
        assert_eq!(runs.total_len(), 0);
        assert!(at.is_end());
        runs.check_invariants().unwrap();
    }

    #[test]
    fn test_free_list_reuses_slots() {
        let mut runs = list();
        for style in [RED, BLUE, RED] {
            let mut at = runs.end_mark();
            runs.insert(&mut at, style, 1);
        }
        let mut at = runs.start_mark();
        runs.delete(&mut at, 3);
        let mut at = runs.end_mark();
        runs.insert(&mut at, BLUE, 1);
        assert_eq!(runs.nodes.len(), 3);
    }

    #[test]
    fn test_walk_forward_and_back() {
        let mut runs = list();
        for style in [RED, BLUE, RED] {
            let mut at = runs.end_mark();
            runs.insert(&mut at, style, 3);
        }
        let mut mark = runs.start_mark();
        runs.advance_n(&mut mark, 4);
        assert_eq!((mark.index(), mark.offset()), (4, 1));
        runs.advance_n(&mut mark, 5);
        assert!(mark.is_end());
        assert_eq!(mark.index(), 9);
        runs.decrement(&mut mark);
        assert_eq!((mark.index(), mark.offset()), (8, 2));
        runs.decrement_n(&mut mark, 8);
        assert_eq!(mark, runs.start_mark());
    }

    #[test]
    fn test_find_mark_near_uses_hint() {
        let mut runs = list();
        for i in 0..50 {
            let mut at = runs.end_mark();
            runs.insert(&mut at, if i % 2 == 0 { RED } else { BLUE }, 2);
        }
        let hint = runs.find_mark_near(51, None);
        let mark = runs.find_mark_near(53, Some(&hint));
        assert_eq!(mark.index(), 53);
        assert!(runs.is_consistent(&mark));
        assert_eq!(runs.find_mark_near(100, Some(&hint)), runs.end_mark());
    }

    #[test]
    fn test_restyle_middle() {
        let mut runs = list();
        let mut at = runs.end_mark();
        runs.insert(&mut at, RED, 9);
        let mut at = runs.find_mark_near(3, None);
        runs.restyle(&mut at, 3, BLUE);
        assert_eq!(lens(&runs), vec![3, 3, 3]);
        let mut at = runs.find_mark_near(3, None);
        runs.restyle(&mut at, 3, RED);
        assert_eq!(lens(&runs), vec![9]);
        runs.check_invariants().unwrap();
    }

    #[test]
    #[should_panic(expected = "mark from buffer")]
    fn test_foreign_mark_panics() {
        let a = list();
        let b = list();
        let mark = b.start_mark();
        a.check_owner(&mark);
    }

    #[test]
    fn test_style_at_end_uses_tail() {
        let mut runs = list();
        assert_eq!(runs.style_at(&runs.end_mark()), None);
        let mut at = runs.end_mark();
        runs.insert(&mut at, BLUE, 1);
        assert_eq!(runs.style_at(&runs.end_mark()), Some(BLUE));
    }
}
