//! Integer partitioning of a linear extent.
//!
//! Both helpers reconstruct the extent exactly, so columns and rows never
//! leave a gap or overlap by a pixel. They intentionally differ: rows are
//! spread evenly with a running remainder, while columns are carved left to
//! right from whatever width is left.

/// Splits `extent` into `count` sizes that differ by at most one and sum to
/// `extent`.
///
/// Item `i` ends at `floor((i + 1) * extent / count)`. The boundaries are
/// tracked with a running remainder, line-drawing style, so nothing is
/// multiplied out and no rounding error accumulates.
pub fn distribute(extent: i32, count: usize) -> Vec<i32> {
    if count == 0 {
        return Vec::new();
    }
    let extent = i64::from(extent.max(0));
    let n = count as i64;
    let (base, rem) = (extent / n, extent % n);

    let mut error = 0;
    (0..count)
        .map(|_| {
            error += rem;
            if error >= n {
                error -= n;
                (base + 1) as i32
            } else {
                base as i32
            }
        })
        .collect()
}

/// Carves `count` columns out of `width` starting at `origin`, giving each
/// `remaining_width / remaining_columns`. Returns `(x, width)` per column.
pub fn carve(origin: i32, width: i32, count: usize) -> Vec<(i32, i32)> {
    let mut x = origin;
    let mut remaining = width.max(0);
    (0..count)
        .map(|i| {
            let w = remaining / (count - i) as i32;
            let slot = (x, w);
            x += w;
            remaining -= w;
            slot
        })
        .collect()
}

/// Lays `sizes` out one after another from `origin`, returning `(start, size)`.
pub fn offsets(origin: i32, sizes: &[i32]) -> Vec<(i32, i32)> {
    let mut at = origin;
    sizes
        .iter()
        .map(|&size| {
            let slot = (at, size);
            at += size;
            slot
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_engine::MAX_COLUMNS;

    #[test]
    fn distribute_reconstructs_extent_exactly() {
        for extent in [0, 1, 7, 799, 800, 801, 1079, 1440] {
            for count in 1..=12 {
                let sizes = distribute(extent, count);
                assert_eq!(sizes.len(), count);
                assert_eq!(sizes.iter().sum::<i32>(), extent, "extent={extent} count={count}");
                let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
                assert!(max - min <= 1, "{sizes:?}");
                for size in &sizes {
                    assert!((size * count as i32 - extent).abs() < count as i32);
                }
            }
        }
    }

    #[test]
    fn distribute_matches_floor_boundaries() {
        let sizes = distribute(800, 3);
        assert_eq!(sizes, vec![266, 267, 267]);
        let ends: Vec<i32> = offsets(0, &sizes).iter().map(|(y, h)| y + h).collect();
        assert_eq!(ends, vec![800 / 3, 1600 / 3, 800]);
    }

    #[test]
    fn distribute_handles_degenerate_input() {
        assert!(distribute(800, 0).is_empty());
        assert_eq!(distribute(-5, 2), vec![0, 0]);
    }

    #[test]
    fn carve_partitions_width_for_every_column_count() {
        for width in [999, 1000, 1001, 1920, 2560] {
            for count in 1..=MAX_COLUMNS {
                let slots = carve(100, width, count);
                assert_eq!(slots.len(), count);
                assert_eq!(slots[0].0, 100);
                for pair in slots.windows(2) {
                    assert_eq!(pair[0].0 + pair[0].1, pair[1].0);
                }
                let (x, w) = slots[count - 1];
                assert_eq!(x + w, 100 + width);
            }
        }
    }

    #[test]
    fn carve_favours_later_columns() {
        assert_eq!(carve(0, 1000, 3), vec![(0, 333), (333, 333), (666, 334)]);
        assert_eq!(carve(0, 1000, 2), vec![(0, 500), (500, 500)]);
    }
}
