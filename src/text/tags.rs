//! Named style tags over character ranges.
//!
//! Tags sit on top of the property runs: they never change metrics, only
//! how a range is painted (quote colors, links, signature) or how reflow
//! treats it (`no_wrap`, `no_join`). Each tag keeps a sorted list of
//! disjoint, non-adjacent ranges.
//!
//! Edits move ranges the way a mark with right gravity at the start and
//! left gravity at the end would: text typed at either edge of a range
//! stays outside it, text typed strictly inside grows it.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::Error;

/// Style tags known to the compose engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Link,
    Quote1,
    Quote2,
    Quote3,
    Signature,
    NoWrap,
    NoJoin,
}

impl Tag {
    /// Every tag, in table order.
    pub const ALL: [Self; 7] = [
        Self::Link,
        Self::Quote1,
        Self::Quote2,
        Self::Quote3,
        Self::Signature,
        Self::NoWrap,
        Self::NoJoin,
    ];

    /// The three quote-color tags.
    pub const QUOTES: [Self; 3] = [Self::Quote1, Self::Quote2, Self::Quote3];

    /// Name used by the host to address the tag.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Quote1 => "quote1",
            Self::Quote2 => "quote2",
            Self::Quote3 => "quote3",
            Self::Signature => "signature",
            Self::NoWrap => "no_wrap",
            Self::NoJoin => "no_join",
        }
    }

    /// Quote-color tag for a slot in `1..=3`.
    #[must_use]
    pub const fn quote(slot: u8) -> Option<Self> {
        match slot {
            1 => Some(Self::Quote1),
            2 => Some(Self::Quote2),
            3 => Some(Self::Quote3),
            _ => None,
        }
    }

    /// Bit for this tag in a [`TagSet`].
    #[must_use]
    pub const fn flag(self) -> TagSet {
        match self {
            Self::Link => TagSet::LINK,
            Self::Quote1 => TagSet::QUOTE1,
            Self::Quote2 => TagSet::QUOTE2,
            Self::Quote3 => TagSet::QUOTE3,
            Self::Signature => TagSet::SIGNATURE,
            Self::NoWrap => TagSet::NO_WRAP,
            Self::NoJoin => TagSet::NO_JOIN,
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.name() == s)
            .ok_or_else(|| Error::UnknownTag(s.to_string()))
    }
}

bitflags! {
    /// Set of tags present at one position.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct TagSet: u8 {
        const LINK      = 0x01;
        const QUOTE1    = 0x02;
        const QUOTE2    = 0x04;
        const QUOTE3    = 0x08;
        const SIGNATURE = 0x10;
        const NO_WRAP   = 0x20;
        const NO_JOIN   = 0x40;
    }
}

/// Range lists for every [`Tag`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagTable {
    ranges: [Vec<Range<usize>>; 7],
}

impl TagTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranges currently carrying `tag`, sorted.
    #[must_use]
    pub fn ranges(&self, tag: Tag) -> &[Range<usize>] {
        &self.ranges[tag.slot()]
    }

    /// Add `tag` over `range`, merging with overlapping or touching ranges.
    pub fn apply(&mut self, tag: Tag, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let list = &mut self.ranges[tag.slot()];
        let first = list.partition_point(|r| r.end < range.start);
        let last = list.partition_point(|r| r.start <= range.end);
        let mut merged = range;
        if first < last {
            merged.start = merged.start.min(list[first].start);
            merged.end = merged.end.max(list[last - 1].end);
        }
        list.splice(first..last, std::iter::once(merged));
    }

    /// Remove `tag` from every character in `range`.
    pub fn remove(&mut self, tag: Tag, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let list = &mut self.ranges[tag.slot()];
        let first = list.partition_point(|r| r.end <= range.start);
        let last = list.partition_point(|r| r.start < range.end);
        if first >= last {
            return;
        }
        let mut kept = Vec::with_capacity(2);
        if list[first].start < range.start {
            kept.push(list[first].start..range.start);
        }
        if list[last - 1].end > range.end {
            kept.push(range.end..list[last - 1].end);
        }
        list.splice(first..last, kept);
    }

    /// Whether the character at `index` carries `tag`.
    #[must_use]
    pub fn contains(&self, tag: Tag, index: usize) -> bool {
        self.range_at(tag, index).is_some()
    }

    /// The `tag` range covering the character at `index`.
    #[must_use]
    pub fn range_at(&self, tag: Tag, index: usize) -> Option<Range<usize>> {
        let list = &self.ranges[tag.slot()];
        let i = list.partition_point(|r| r.end <= index);
        list.get(i).filter(|r| r.start <= index).cloned()
    }

    /// Whether any character in `range` carries `tag`.
    #[must_use]
    pub fn intersects(&self, tag: Tag, range: Range<usize>) -> bool {
        let list = &self.ranges[tag.slot()];
        let i = list.partition_point(|r| r.end <= range.start);
        list.get(i).is_some_and(|r| r.start < range.end)
    }

    /// Every tag on the character at `index`.
    #[must_use]
    pub fn tags_at(&self, index: usize) -> TagSet {
        Tag::ALL
            .into_iter()
            .filter(|&tag| self.contains(tag, index))
            .fold(TagSet::empty(), |set, tag| set | tag.flag())
    }

    /// Shift ranges for `len` characters inserted at `at`.
    pub fn on_insert(&mut self, at: usize, len: usize) {
        if len == 0 {
            return;
        }
        for list in &mut self.ranges {
            for r in list.iter_mut() {
                if at <= r.start {
                    r.start += len;
                    r.end += len;
                } else if at < r.end {
                    r.end += len;
                }
            }
        }
    }

    /// Shrink and shift ranges for `len` characters deleted at `at`.
    pub fn on_delete(&mut self, at: usize, len: usize) {
        if len == 0 {
            return;
        }
        let map = |i: usize| {
            if i >= at + len {
                i - len
            } else {
                i.min(at)
            }
        };
        for list in &mut self.ranges {
            let mut out: Vec<Range<usize>> = Vec::with_capacity(list.len());
            for r in list.drain(..) {
                let mapped = map(r.start)..map(r.end);
                if mapped.is_empty() {
                    continue;
                }
                match out.last_mut() {
                    Some(prev) if prev.end >= mapped.start => prev.end = prev.end.max(mapped.end),
                    _ => out.push(mapped),
                }
            }
            *list = out;
        }
    }

    /// Drop every range of every tag.
    pub fn clear(&mut self) {
        for list in &mut self.ranges {
            list.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for tag in Tag::ALL {
            assert_eq!(tag.name().parse::<Tag>(), Ok(tag));
            assert_eq!(tag.to_string(), tag.name());
        }
        assert_eq!(
            "quote4".parse::<Tag>(),
            Err(Error::UnknownTag("quote4".to_string()))
        );
        assert_eq!(Tag::quote(2), Some(Tag::Quote2));
        assert_eq!(Tag::quote(0), None);
    }

    #[test]
    fn test_apply_merges_touching_ranges() {
        let mut tags = TagTable::new();
        tags.apply(Tag::Quote1, 0..5);
        tags.apply(Tag::Quote1, 10..12);
        tags.apply(Tag::Quote1, 5..7);
        assert_eq!(tags.ranges(Tag::Quote1), &[0..7, 10..12]);
        tags.apply(Tag::Quote1, 6..11);
        assert_eq!(tags.ranges(Tag::Quote1), &[0..12]);
        tags.apply(Tag::Quote1, 3..3);
        assert_eq!(tags.ranges(Tag::Quote1), &[0..12]);
    }

    #[test]
    fn test_remove_splits_range() {
        let mut tags = TagTable::new();
        tags.apply(Tag::Link, 0..10);
        tags.remove(Tag::Link, 3..5);
        assert_eq!(tags.ranges(Tag::Link), &[0..3, 5..10]);
        tags.remove(Tag::Link, 0..20);
        assert!(tags.ranges(Tag::Link).is_empty());
    }

    #[test]
    fn test_queries() {
        let mut tags = TagTable::new();
        tags.apply(Tag::NoJoin, 4..5);
        tags.apply(Tag::Signature, 2..9);
        assert!(tags.contains(Tag::NoJoin, 4));
        assert!(!tags.contains(Tag::NoJoin, 5));
        assert_eq!(tags.range_at(Tag::Signature, 8), Some(2..9));
        assert!(tags.intersects(Tag::NoJoin, 0..5));
        assert!(!tags.intersects(Tag::NoJoin, 5..9));
        assert_eq!(tags.tags_at(4), TagSet::NO_JOIN | TagSet::SIGNATURE);
        assert_eq!(tags.tags_at(0), TagSet::empty());
    }

    #[test]
    fn test_insert_at_edges_does_not_grow() {
        let mut tags = TagTable::new();
        tags.apply(Tag::NoWrap, 5..10);
        tags.on_insert(10, 3);
        assert_eq!(tags.ranges(Tag::NoWrap), &[5..10]);
        tags.on_insert(5, 2);
        assert_eq!(tags.ranges(Tag::NoWrap), &[7..12]);
        tags.on_insert(8, 4);
        assert_eq!(tags.ranges(Tag::NoWrap), &[7..16]);
    }

    #[test]
    fn test_delete_shrinks_and_rejoins() {
        let mut tags = TagTable::new();
        tags.apply(Tag::Quote2, 0..4);
        tags.apply(Tag::Quote2, 6..8);
        tags.apply(Tag::Link, 4..6);
        tags.on_delete(4, 2);
        assert_eq!(tags.ranges(Tag::Quote2), &[0..6]);
        assert!(tags.ranges(Tag::Link).is_empty());
        tags.on_delete(0, 3);
        assert_eq!(tags.ranges(Tag::Quote2), &[0..3]);
    }
}
