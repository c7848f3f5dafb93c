//! Segment type and range planning.

use crate::error::FetchError;

/// A single segment: inclusive byte range `[start, end]` owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Worker index (0-based, also the position in the plan).
    pub index: usize,
    /// First byte offset.
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl Segment {
    /// Length of this segment in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Range value for curl's `CURLOPT_RANGE` (no `bytes=` prefix).
    pub fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    /// True if `[offset, offset + len)` lies entirely inside this segment.
    pub fn contains_span(&self, offset: u64, len: u64) -> bool {
        offset >= self.start && offset.saturating_add(len) <= self.end + 1
    }
}

/// Splits `[0, total_size - 1]` into `workers` contiguous segments.
///
/// Every segment is `total_size / workers` bytes except the last, which
/// absorbs the division remainder. When `workers > total_size` the worker
/// count is clamped to `total_size` so no segment is empty.
pub fn plan_segments(total_size: u64, workers: usize) -> Result<Vec<Segment>, FetchError> {
    if total_size == 0 || workers == 0 {
        return Err(FetchError::InvalidPlan { total_size, workers });
    }

    let count = (workers as u64).min(total_size);
    let base = total_size / count;

    let mut out = Vec::with_capacity(count as usize);
    for i in 0..count {
        let start = i * base;
        let end = if i == count - 1 {
            total_size - 1
        } else {
            (i + 1) * base - 1
        };
        out.push(Segment {
            index: i as usize,
            start,
            end,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(segs: &[Segment]) -> Vec<(u64, u64)> {
        segs.iter().map(|s| (s.start, s.end)).collect()
    }

    fn assert_exact_cover(segs: &[Segment], total: u64) {
        assert_eq!(segs.first().map(|s| s.start), Some(0));
        assert_eq!(segs.last().map(|s| s.end), Some(total - 1));
        for pair in segs.windows(2) {
            assert_eq!(pair[1].start, pair[0].end + 1, "gap or overlap at {:?}", pair);
        }
        for (i, s) in segs.iter().enumerate() {
            assert_eq!(s.index, i);
            assert!(s.start <= s.end);
        }
        assert_eq!(segs.iter().map(Segment::len).sum::<u64>(), total);
    }

    #[test]
    fn plan_segments_even() {
        let segs = plan_segments(1000, 4).unwrap();
        assert_eq!(
            bounds(&segs),
            vec![(0, 249), (250, 499), (500, 749), (750, 999)]
        );
    }

    #[test]
    fn plan_segments_last_absorbs_remainder() {
        let segs = plan_segments(1001, 4).unwrap();
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[0].len(), 250);
        assert_eq!(segs[1].len(), 250);
        assert_eq!(segs[2].len(), 250);
        assert_eq!((segs[3].start, segs[3].end), (750, 1000));
        assert_eq!(segs[3].len(), 251);
    }

    #[test]
    fn plan_segments_one() {
        let segs = plan_segments(100, 1).unwrap();
        assert_eq!(bounds(&segs), vec![(0, 99)]);
    }

    #[test]
    fn plan_segments_rejects_empty_inputs() {
        assert!(matches!(
            plan_segments(0, 4),
            Err(FetchError::InvalidPlan { total_size: 0, workers: 4 })
        ));
        assert!(matches!(
            plan_segments(100, 0),
            Err(FetchError::InvalidPlan { total_size: 100, workers: 0 })
        ));
    }

    #[test]
    fn plan_segments_clamps_workers_to_size() {
        let segs = plan_segments(3, 8).unwrap();
        assert_eq!(bounds(&segs), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn plan_segments_cover_many_shapes() {
        for total in [1u64, 2, 7, 63, 64, 65, 1000, 1001, 4099, 1 << 20] {
            for workers in 1..=17usize {
                let segs = plan_segments(total, workers).unwrap();
                assert_eq!(segs.len() as u64, (workers as u64).min(total));
                assert_exact_cover(&segs, total);
            }
        }
    }

    #[test]
    fn segment_range_values() {
        let s = Segment { index: 0, start: 0, end: 98 };
        assert_eq!(s.curl_range(), "0-98");
        assert_eq!(s.len(), 99);
    }

    #[test]
    fn segment_single_byte() {
        let s = Segment { index: 3, start: 42, end: 42 };
        assert_eq!(s.curl_range(), "42-42");
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn contains_span_bounds() {
        let s = Segment { index: 1, start: 250, end: 499 };
        assert!(s.contains_span(250, 250));
        assert!(s.contains_span(400, 100));
        assert!(!s.contains_span(400, 101));
        assert!(!s.contains_span(249, 1));
    }
}
