//! Logical clock readings and versioned keys.

use std::{cmp::Ordering, fmt};

/// A reading of the engine's logical clock.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Greatest possible timestamp (used for open-ended visibility).
    pub const MAX: Self = Self(u64::MAX);

    /// Construct a timestamp from a raw `u64`.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw `u64` value backing this timestamp.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Add `delta`, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, delta: u64) -> Option<Self> {
        match self.0.checked_add(delta) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Ticks elapsed from `earlier` to `self`, or `None` if the clock went backwards.
    #[inline]
    pub const fn ticks_since(self, earlier: Timestamp) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Timestamp").field(&self.0).finish()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A key tagged with the commit timestamp that wrote it.
///
/// Orders by key ascending, then timestamp descending, so the newest version
/// of a key is met first when seeking.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Timestamped<V> {
    pub(crate) value: V,
    pub(crate) ts: Timestamp,
}

impl<V> Timestamped<V> {
    pub(crate) fn new(value: V, ts: Timestamp) -> Self {
        Self { value, ts }
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn ts(&self) -> Timestamp {
        self.ts
    }
}

impl<V: Ord> PartialOrd for Timestamped<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V: Ord> Ord for Timestamped<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then_with(|| other.ts.cmp(&self.ts))
    }
}

#[cfg(test)]
mod tests {
    use super::{Timestamp, Timestamped};

    #[test]
    fn newest_version_sorts_first() {
        let older = Timestamped::new(1, Timestamp::new(1));
        let newer = Timestamped::new(1, Timestamp::new(2));
        assert!(newer < older);

        let other_key = Timestamped::new(2, Timestamp::new(9));
        assert!(older < other_key);
    }

    #[test]
    fn tick_arithmetic() {
        let t1 = Timestamp::new(5);
        assert_eq!(Timestamp::new(6).ticks_since(t1), Some(1));
        assert_eq!(Timestamp::new(4).ticks_since(t1), None);
        assert_eq!(t1.checked_add(1), Some(Timestamp::new(6)));
        assert_eq!(Timestamp::MAX.checked_add(1), None);
    }
}
