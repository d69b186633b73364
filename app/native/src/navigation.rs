//! Navigation cursor over the remote history and the favorites.
//!
//! The two collections form one timeline, newest to oldest:
//!
//! ```text
//! Remote[0] .. Remote[R-1] | Favorite[0] .. Favorite[F-1]
//! ```
//!
//! `next` walks toward older items and crosses from the last remote item to
//! the first favorite; `previous` walks back and crosses from the first
//! favorite to the last remote item. The cursor itself is pure: the engine
//! decides whether a computed move is committed.

use serde::Serialize;

use crate::model::Collection;

/// Current lengths of both collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sizes {
    pub remote: usize,
    pub favorite: usize,
}

impl Sizes {
    #[must_use]
    pub const fn new(remote: usize, favorite: usize) -> Self { Self { remote, favorite } }

    #[must_use]
    pub const fn len(self, collection: Collection) -> usize {
        match collection {
            Collection::Remote => self.remote,
            Collection::Favorite => self.favorite,
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool { self.remote == 0 && self.favorite == 0 }

    #[must_use]
    pub const fn total(self) -> usize { self.remote + self.favorite }
}

/// A `(collection, index)` position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Cursor {
    pub collection: Collection,
    pub index: usize,
}

impl Cursor {
    #[must_use]
    pub const fn new(collection: Collection, index: usize) -> Self { Self { collection, index } }

    /// The newest position of the timeline, or `None` when both are empty.
    #[must_use]
    pub const fn first(sizes: Sizes) -> Option<Self> {
        if sizes.remote > 0 {
            Some(Self::new(Collection::Remote, 0))
        } else if sizes.favorite > 0 {
            Some(Self::new(Collection::Favorite, 0))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn is_valid(self, sizes: Sizes) -> bool { self.index < sizes.len(self.collection) }

    /// Returns `self` if valid, else the nearest valid position.
    ///
    /// An index past the end of its collection is clamped to the last item;
    /// an empty collection falls back to the newest item of the timeline.
    #[must_use]
    pub fn normalize(self, sizes: Sizes) -> Option<Self> {
        if self.is_valid(sizes) {
            return Some(self);
        }

        match sizes.len(self.collection) {
            0 => Self::first(sizes),
            len => Some(Self::new(self.collection, len - 1)),
        }
    }

    /// One step toward older items.
    #[must_use]
    pub const fn next(self, sizes: Sizes) -> Option<Self> {
        match self.collection {
            Collection::Remote if self.index + 1 < sizes.remote => {
                Some(Self::new(Collection::Remote, self.index + 1))
            }
            Collection::Remote if sizes.favorite > 0 => Some(Self::new(Collection::Favorite, 0)),
            Collection::Favorite if self.index + 1 < sizes.favorite => {
                Some(Self::new(Collection::Favorite, self.index + 1))
            }
            _ => None,
        }
    }

    /// One step toward newer items.
    #[must_use]
    pub const fn previous(self, sizes: Sizes) -> Option<Self> {
        match self.collection {
            Collection::Favorite if self.index > 0 => {
                Some(Self::new(Collection::Favorite, self.index - 1))
            }
            Collection::Favorite if sizes.remote > 0 => {
                Some(Self::new(Collection::Remote, sizes.remote - 1))
            }
            Collection::Remote if self.index > 0 => {
                Some(Self::new(Collection::Remote, self.index - 1))
            }
            _ => None,
        }
    }

    /// Explicit jump; `None` when `index` is out of bounds.
    #[must_use]
    pub const fn goto(collection: Collection, index: usize, sizes: Sizes) -> Option<Self> {
        let target = Self::new(collection, index);
        if target.is_valid(sizes) { Some(target) } else { None }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.collection, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 4;

    fn all_sizes() -> impl Iterator<Item = Sizes> {
        (0..=MAX).flat_map(|r| (0..=MAX).map(move |f| Sizes::new(r, f)))
    }

    fn all_positions(sizes: Sizes) -> Vec<Cursor> {
        (0..sizes.remote)
            .map(|i| Cursor::new(Collection::Remote, i))
            .chain((0..sizes.favorite).map(|i| Cursor::new(Collection::Favorite, i)))
            .collect()
    }

    #[test]
    fn test_every_walk_stays_in_bounds() {
        for sizes in all_sizes() {
            let Some(start) = Cursor::first(sizes) else {
                assert!(sizes.is_empty());
                continue;
            };

            // Every sequence of 8 steps, encoded as bits (1 = next, 0 = previous).
            for pattern in 0u32..(1 << 8) {
                let mut cursor = start;
                for step in 0..8 {
                    let moved = if pattern & (1 << step) == 0 {
                        cursor.previous(sizes)
                    } else {
                        cursor.next(sizes)
                    };
                    if let Some(moved) = moved {
                        cursor = moved;
                    }
                    assert!(cursor.is_valid(sizes), "{cursor} out of bounds for {sizes:?}");
                }
            }
        }
    }

    #[test]
    fn test_next_then_previous_returns_to_origin() {
        for sizes in all_sizes() {
            for origin in all_positions(sizes) {
                if let Some(older) = origin.next(sizes) {
                    assert_eq!(older.previous(sizes), Some(origin), "{origin} via {older}");
                }
                if let Some(newer) = origin.previous(sizes) {
                    assert_eq!(newer.next(sizes), Some(origin), "{origin} via {newer}");
                }
            }
        }
    }

    #[test]
    fn test_next_visits_whole_timeline_in_order() {
        for sizes in all_sizes() {
            let mut visited = Vec::new();
            let mut cursor = Cursor::first(sizes);
            while let Some(current) = cursor {
                visited.push(current);
                cursor = current.next(sizes);
            }
            assert_eq!(visited, all_positions(sizes));
        }
    }

    #[test]
    fn test_crossing_from_oldest_remote_into_favorites() {
        let sizes = Sizes::new(3, 2);
        let cursor = Cursor::new(Collection::Remote, 2);

        let first_fav = cursor.next(sizes).unwrap();
        assert_eq!(first_fav, Cursor::new(Collection::Favorite, 0));

        let second_fav = first_fav.next(sizes).unwrap();
        assert_eq!(second_fav, Cursor::new(Collection::Favorite, 1));

        assert_eq!(second_fav.next(sizes), None);
    }

    #[test]
    fn test_previous_from_first_favorite_goes_to_oldest_remote() {
        let sizes = Sizes::new(3, 2);
        let cursor = Cursor::new(Collection::Favorite, 0);
        assert_eq!(cursor.previous(sizes), Some(Cursor::new(Collection::Remote, 2)));
        assert_eq!(Cursor::new(Collection::Remote, 0).previous(sizes), None);
    }

    #[test]
    fn test_previous_from_first_favorite_without_history_fails() {
        let sizes = Sizes::new(0, 2);
        assert_eq!(Cursor::new(Collection::Favorite, 0).previous(sizes), None);
    }

    #[test]
    fn test_goto_bounds() {
        let sizes = Sizes::new(3, 1);
        assert_eq!(
            Cursor::goto(Collection::Remote, 2, sizes),
            Some(Cursor::new(Collection::Remote, 2))
        );
        assert_eq!(Cursor::goto(Collection::Remote, 3, sizes), None);
        assert_eq!(Cursor::goto(Collection::Favorite, 1, sizes), None);
        assert_eq!(Cursor::goto(Collection::Favorite, 0, Sizes::default()), None);
    }

    #[test]
    fn test_normalize() {
        let sizes = Sizes::new(2, 1);
        let valid = Cursor::new(Collection::Remote, 1);
        assert_eq!(valid.normalize(sizes), Some(valid));
        assert_eq!(
            Cursor::new(Collection::Favorite, 5).normalize(sizes),
            Some(Cursor::new(Collection::Favorite, 0))
        );
        assert_eq!(
            Cursor::new(Collection::Favorite, 0).normalize(Sizes::new(2, 0)),
            Some(Cursor::new(Collection::Remote, 0))
        );
        assert_eq!(Cursor::new(Collection::Remote, 0).normalize(Sizes::default()), None);
    }
}
