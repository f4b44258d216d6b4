//! Row spans over the engine's ordered key space.
//!
//! A [`Span`] is a single contiguous range of row keys with owned bounds. The
//! canonical constructors ([`Span::exact`], [`Span::prefix`]) cover the special
//! row selections; arbitrary ranges are built from explicit [`Bound`]s.

use std::ops::Bound;

use bytes::Bytes;

/// A contiguous range of row keys with independently inclusive/exclusive bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    /// Start bound (inclusive/exclusive/unbounded).
    pub start: Bound<Bytes>,
    /// End bound (inclusive/exclusive/unbounded).
    pub end: Bound<Bytes>,
}

impl Span {
    /// Create an unbounded span (all rows).
    pub fn all() -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    /// Create a new span from explicit bounds.
    pub fn new(start: Bound<Bytes>, end: Bound<Bytes>) -> Self {
        Self { start, end }
    }

    /// Span covering exactly one row, inclusive on both ends.
    pub fn exact(row: impl Into<Bytes>) -> Self {
        let row = row.into();
        Self {
            start: Bound::Included(row.clone()),
            end: Bound::Included(row),
        }
    }

    /// Half-open span covering every row that starts with `prefix`.
    ///
    /// The end bound is the shortest key greater than every key sharing the
    /// prefix. A prefix made only of `0xff` bytes (or an empty prefix) has no
    /// such key and leaves the end unbounded.
    pub fn prefix(prefix: impl Into<Bytes>) -> Self {
        let prefix = prefix.into();
        let end = match following_prefix(&prefix) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let start = if prefix.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(prefix)
        };
        Self { start, end }
    }

    /// Whether both ends are unbounded.
    pub fn is_all(&self) -> bool {
        matches!(self.start, Bound::Unbounded) && matches!(self.end, Bound::Unbounded)
    }

    /// Whether this span contains `row`.
    pub fn contains(&self, row: &[u8]) -> bool {
        self.after_start(row) && self.before_end(row)
    }

    /// Whether `row` is at or past the start bound.
    pub fn after_start(&self, row: &[u8]) -> bool {
        match &self.start {
            Bound::Unbounded => true,
            Bound::Included(bound) => row >= bound.as_ref(),
            Bound::Excluded(bound) => row > bound.as_ref(),
        }
    }

    /// Whether `row` is at or before the end bound.
    pub fn before_end(&self, row: &[u8]) -> bool {
        match &self.end {
            Bound::Unbounded => true,
            Bound::Included(bound) => row <= bound.as_ref(),
            Bound::Excluded(bound) => row < bound.as_ref(),
        }
    }

    /// Whether no row can ever fall inside this span.
    pub fn is_empty(&self) -> bool {
        use Bound as B;
        match (&self.start, &self.end) {
            (B::Unbounded, _) | (_, B::Unbounded) => false,
            (B::Included(a), B::Included(b)) => a > b,
            (B::Included(a), B::Excluded(b)) => a >= b,
            (B::Excluded(a), B::Included(b)) => a >= b,
            (B::Excluded(a), B::Excluded(b)) => a >= b,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::all()
    }
}

/// Smallest key strictly greater than every key starting with `prefix`.
fn following_prefix(prefix: &[u8]) -> Option<Bytes> {
    let last = prefix.iter().rposition(|byte| *byte != u8::MAX)?;
    let mut end = prefix[..=last].to_vec();
    end[last] += 1;
    Some(Bytes::from(end))
}

/// Smallest key strictly greater than `row`.
pub(crate) fn following_row(row: &[u8]) -> Bytes {
    let mut next = Vec::with_capacity(row.len() + 1);
    next.extend_from_slice(row);
    next.push(0);
    Bytes::from(next)
}
