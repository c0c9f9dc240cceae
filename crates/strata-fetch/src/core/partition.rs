use crate::data::Interval;

/// Iterator over consecutive intervals of `size` bytes covering `start..=stop`.
///
/// Created by [`partition`]. Cloning restarts nothing: a clone continues from
/// the same position, and calling [`partition`] again with the same inputs
/// yields the same intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    next_index: u64,
    next_start: u64,
    stop:       u64,
    size:       u64,
}

/// Split the 1-based inclusive range `start..=stop` into intervals of `size`
/// bytes, indexed from 0. Only the last interval may be shorter.
///
/// `start > stop` (an empty resource) and `size == 0` yield nothing;
/// callers validate `size` beforehand.
///
/// # Examples
///
/// ```
/// use strata_fetch::{Interval, partition};
///
/// let chunks: Vec<_> = partition(1, 2500, 1000).collect();
/// assert_eq!(chunks, vec![
///     Interval::new(0, 1, 1000),
///     Interval::new(1, 1001, 2000),
///     Interval::new(2, 2001, 2500),
/// ]);
/// ```
pub fn partition(start: u64, stop: u64, size: u64) -> Partition {
    Partition {
        next_index: 0,
        next_start: start,
        stop,
        size,
    }
}

impl Partition {
    fn remaining(&self) -> u64 {
        if self.size == 0 || self.next_start > self.stop {
            0
        } else {
            (self.stop - self.next_start) / self.size + 1
        }
    }
}

impl Iterator for Partition {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        if self.remaining() == 0 {
            return None;
        }

        let start = self.next_start;
        let end = start.saturating_add(self.size - 1).min(self.stop);
        let interval = Interval::new(self.next_index, start, end);

        match end.checked_add(1) {
            Some(next) => self.next_start = next,
            None => self.size = 0,
        }
        self.next_index += 1;

        Some(interval)
    }

    fn nth(&mut self, n: usize) -> Option<Interval> {
        let skip = u64::try_from(n).unwrap_or(u64::MAX);
        if skip >= self.remaining() {
            self.size = 0;
            return None;
        }
        // skip < remaining, so this stays within `stop`
        self.next_start += skip * self.size;
        self.next_index += skip;
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Partition {}
