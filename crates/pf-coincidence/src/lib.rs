//! # pf-coincidence
//!
//! Time-interval primitives for sensor records:
//! - n-fold coincidence detection over sorted start times
//! - merging of coincidence starts into extended intervals
//! - tagging records that fall inside an interval, extending the interval so
//!   later fragments of the same record stay inside
//!
//! Times are integer nanoseconds.

#![warn(missing_docs)]

use pf_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// Inclusive start (ns).
    pub start: i64,
    /// Exclusive end (ns).
    pub end: i64,
}

impl Interval {
    /// Whether `time` lies in `[start, end)`.
    #[inline]
    pub fn contains(&self, time: i64) -> bool {
        self.start <= time && time < self.end
    }
}

/// A record fragment starting at `time` and spanning `length` ns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Start time (ns).
    pub time: i64,
    /// Duration (ns).
    pub length: i64,
}

fn check_sorted(times: &[i64]) -> Result<()> {
    if let Some(i) = times.windows(2).position(|w| w[1] < w[0]) {
        return Err(Error::Validation(format!(
            "times must be sorted: times[{}] = {} > times[{}] = {}",
            i,
            times[i],
            i + 1,
            times[i + 1]
        )));
    }
    Ok(())
}

fn check_resolving_time(resolving_time: i64) -> Result<()> {
    if resolving_time < 0 {
        return Err(Error::Validation(format!("resolving_time must be >= 0, got {}", resolving_time)));
    }
    Ok(())
}

/// Start times `t[i]` whose window of `nfold` consecutive times spans at most
/// `resolving_time`: `t[i + nfold - 1] - t[i] <= resolving_time`.
///
/// The window does not extend itself; the last `nfold - 1` times can only be
/// members of earlier windows.
pub fn coincidence_starts(times: &[i64], nfold: usize, resolving_time: i64) -> Result<Vec<i64>> {
    if nfold == 0 {
        return Err(Error::Validation("nfold must be >= 1".into()));
    }
    check_resolving_time(resolving_time)?;
    check_sorted(times)?;

    Ok(times
        .windows(nfold)
        .filter(|w| w[nfold - 1] - w[0] <= resolving_time)
        .map(|w| w[0])
        .collect())
}

/// Merge sorted start times into intervals.
///
/// A gap larger than `resolving_time` starts a new interval; each interval
/// runs from its first start to its last start plus `resolving_time`.
pub fn merge_intervals(starts: &[i64], resolving_time: i64) -> Result<Vec<Interval>> {
    check_resolving_time(resolving_time)?;
    check_sorted(starts)?;

    let mut intervals: Vec<Interval> = Vec::new();
    for &t in starts {
        let end = t.saturating_add(resolving_time);
        match intervals.last_mut() {
            Some(last) if t - (last.end - resolving_time) <= resolving_time => last.end = end,
            _ => intervals.push(Interval { start: t, end }),
        }
    }
    Ok(intervals)
}

/// n-fold coincidence intervals of sorted `times`.
pub fn coincidence(times: &[i64], nfold: usize, resolving_time: i64) -> Result<Vec<Interval>> {
    let starts = coincidence_starts(times, nfold, resolving_time)?;
    let intervals = merge_intervals(&starts, resolving_time)?;
    log::debug!(
        "coincidence: {} times -> {} starts -> {} intervals (nfold={}, resolving_time={})",
        times.len(),
        starts.len(),
        intervals.len(),
        nfold,
        resolving_time
    );
    Ok(intervals)
}

/// Tag each record whose start lies in some interval.
///
/// When a record matches, the last matching interval is extended to cover
/// the record's end, so `intervals` is updated in place.
pub fn tag_in_intervals(records: &[Record], intervals: &mut [Interval]) -> Vec<bool> {
    records
        .iter()
        .map(|r| match intervals.iter().rposition(|iv| iv.contains(r.time)) {
            Some(i) => {
                let iv = &mut intervals[i];
                iv.end = iv.end.max(r.time.saturating_add(r.length));
                true
            }
            None => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_coincidence_starts() {
        let t = [0, 100, 200, 250, 1000, 1100, 5000];
        assert_eq!(coincidence_starts(&t, 3, 300).unwrap(), vec![0, 100]);
        assert_eq!(coincidence_starts(&t, 2, 100).unwrap(), vec![0, 100, 200, 1000]);
        assert_eq!(coincidence_starts(&t, 1, 0).unwrap(), t.to_vec());
        assert!(coincidence_starts(&t, 8, 10_000).unwrap().is_empty());
    }

    #[test]
    fn test_merge_intervals() {
        let merged = merge_intervals(&[0, 100, 200, 1000, 1250], 300).unwrap();
        assert_eq!(merged, vec![Interval { start: 0, end: 500 }, Interval { start: 1000, end: 1550 }]);
        // A gap of exactly the resolving time still merges.
        let merged = merge_intervals(&[0, 300], 300).unwrap();
        assert_eq!(merged, vec![Interval { start: 0, end: 600 }]);
        let merged = merge_intervals(&[0, 301], 300).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_coincidence_end_to_end() {
        let t = [0, 50, 100, 120, 2000, 2010, 2020, 9000];
        let iv = coincidence(&t, 3, 150).unwrap();
        assert_eq!(iv, vec![Interval { start: 0, end: 200 }, Interval { start: 2000, end: 2150 }]);
    }

    #[test]
    fn test_empty_input() {
        assert!(coincidence(&[], 4, 300).unwrap().is_empty());
        assert!(merge_intervals(&[], 300).unwrap().is_empty());
        assert!(tag_in_intervals(&[], &mut []).is_empty());
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(coincidence_starts(&[1, 2], 0, 10), Err(Error::Validation(_))));
        assert!(matches!(coincidence(&[1, 2], 2, -1), Err(Error::Validation(_))));
        assert!(matches!(coincidence(&[5, 2], 2, 10), Err(Error::Validation(_))));
    }

    #[test]
    fn test_tagging_extends_interval() {
        let mut intervals = vec![Interval { start: 0, end: 100 }, Interval { start: 500, end: 600 }];
        let records = [
            Record { time: 50, length: 120 },
            // Inside only because the first record extended the interval.
            Record { time: 150, length: 10 },
            Record { time: 300, length: 10 },
            Record { time: 599, length: 1 },
        ];
        assert_eq!(tag_in_intervals(&records, &mut intervals), vec![true, true, false, true]);
        assert_eq!(intervals[0].end, 170);
        assert_eq!(intervals[1].end, 600);
    }

    #[test]
    fn test_tagging_extends_last_match() {
        let mut intervals = vec![Interval { start: 0, end: 100 }, Interval { start: 50, end: 120 }];
        tag_in_intervals(&[Record { time: 60, length: 200 }], &mut intervals);
        assert_eq!(intervals[0].end, 100);
        assert_eq!(intervals[1].end, 260);
    }

    proptest! {
        #[test]
        fn prop_intervals_are_disjoint_and_cover_starts(
            mut times in proptest::collection::vec(0i64..100_000, 0..200),
            nfold in 1usize..6,
            rt in 1i64..2_000,
        ) {
            times.sort_unstable();
            let starts = coincidence_starts(&times, nfold, rt).unwrap();
            let iv = coincidence(&times, nfold, rt).unwrap();
            for w in iv.windows(2) {
                prop_assert!(w[1].start - (w[0].end - rt) > rt);
            }
            for s in starts {
                prop_assert!(iv.iter().any(|i| i.contains(s)));
            }
        }
    }
}
