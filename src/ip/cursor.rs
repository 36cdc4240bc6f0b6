//! Two-way ordered merge over sorted slices.

/// Walks two ascending slices as a single ascending stream.
///
/// Nothing is copied: the cursor only keeps one index per slice. When the
/// heads compare equal the element from `b` comes first.
#[derive(Debug)]
pub struct MergeCursor<'a, T, F> {
    a: &'a [T],
    b: &'a [T],
    ia: usize,
    ib: usize,
    less: F,
}

impl<'a, T, F> MergeCursor<'a, T, F>
where
    F: Fn(&T, &T) -> bool,
{
    pub fn new(a: &'a [T], b: &'a [T], less: F) -> Self {
        MergeCursor { a, b, ia: 0, ib: 0, less }
    }

    /// Current head, and whether it comes from `a`.
    fn head(&self) -> Option<(bool, &'a T)> {
        match (self.a.get(self.ia), self.b.get(self.ib)) {
            (Some(a), Some(b)) if (self.less)(a, b) => Some((true, a)),
            (_, Some(b)) => Some((false, b)),
            (Some(a), None) => Some((true, a)),
            (None, None) => None,
        }
    }

    /// Smallest remaining element of either slice.
    pub fn peek(&self) -> Option<&'a T> {
        self.head().map(|(_, item)| item)
    }

    /// Consume the element returned by [`peek`](Self::peek).
    pub fn advance(&mut self) {
        match self.head() {
            Some((true, _)) => self.ia += 1,
            Some((false, _)) => self.ib += 1,
            None => {}
        }
    }

    /// Number of elements of `a` consumed so far, i.e. the index in `a` where
    /// an element sorting before the current head belongs.
    pub fn position_a(&self) -> usize {
        self.ia
    }
}
