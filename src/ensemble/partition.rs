//! Domain-size partitioning for the ensemble.

use serde::{Deserialize, Serialize};

/// Inclusive range of domain sizes served by one forest
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub lower: usize,
    pub upper: usize,
}

impl Partition {
    pub fn contains(&self, size: usize) -> bool {
        self.lower <= size && size <= self.upper
    }
}

/// Split `sizes` into at most `num_partitions` ranges holding roughly the
/// same number of domains each.
///
/// Equal sizes never straddle two partitions, so heavily repeated sizes can
/// produce fewer partitions than requested. The ranges are contiguous and
/// together cover `[min(sizes), max(sizes)]`.
///
/// # Panics
///
/// Panics if `num_partitions` is zero.
pub fn equi_depth_partitions(sizes: &[usize], num_partitions: usize) -> Vec<Partition> {
    assert!(num_partitions > 0, "num_partitions must be > 0");
    if sizes.is_empty() {
        return Vec::new();
    }

    let mut sorted = sizes.to_vec();
    sorted.sort_unstable();
    let depth = sorted.len().div_ceil(num_partitions);

    let mut partitions: Vec<Partition> = Vec::with_capacity(num_partitions);
    let mut start = 0;
    while start < sorted.len() {
        let mut end = (start + depth).min(sorted.len());
        while end < sorted.len() && sorted[end] == sorted[end - 1] {
            end += 1;
        }
        let lower = partitions.last().map_or(sorted[start], |p| p.upper + 1);
        partitions.push(Partition {
            lower,
            upper: sorted[end - 1],
        });
        start = end;
    }
    partitions
}

/// Check that `partitions` is non-empty, ordered, non-overlapping and
/// starts above size 0.
pub(crate) fn validate_partitions(partitions: &[Partition]) -> Result<(), String> {
    if partitions.is_empty() {
        return Err("at least one partition is required".to_string());
    }
    for p in partitions {
        if p.lower == 0 {
            return Err("partition sizes must start at 1".to_string());
        }
        if p.lower > p.upper {
            return Err(format!(
                "partition lower bound {} exceeds upper bound {}",
                p.lower, p.upper
            ));
        }
    }
    for w in partitions.windows(2) {
        if w[1].lower <= w[0].upper {
            return Err(format!(
                "partitions [{}, {}] and [{}, {}] overlap or are out of order",
                w[0].lower, w[0].upper, w[1].lower, w[1].upper
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equi_depth_even_split() {
        let sizes: Vec<usize> = (1..=8).collect();
        let parts = equi_depth_partitions(&sizes, 4);
        assert_eq!(
            parts,
            vec![
                Partition { lower: 1, upper: 2 },
                Partition { lower: 3, upper: 4 },
                Partition { lower: 5, upper: 6 },
                Partition { lower: 7, upper: 8 },
            ]
        );
    }

    #[test]
    fn test_equi_depth_is_contiguous_with_gaps_in_sizes() {
        let parts = equi_depth_partitions(&[100, 1, 10, 1000], 2);
        assert_eq!(
            parts,
            vec![
                Partition { lower: 1, upper: 10 },
                Partition { lower: 11, upper: 1000 },
            ]
        );
    }

    #[test]
    fn test_equal_sizes_stay_together() {
        let parts = equi_depth_partitions(&[5, 5, 5, 5, 6], 4);
        assert_eq!(
            parts,
            vec![
                Partition { lower: 5, upper: 5 },
                Partition { lower: 6, upper: 6 },
            ]
        );
    }

    #[test]
    fn test_more_partitions_than_sizes() {
        let parts = equi_depth_partitions(&[3, 9], 10);
        assert_eq!(parts.len(), 2);
        assert!(validate_partitions(&parts).is_ok());
    }

    #[test]
    fn test_empty_sizes() {
        assert!(equi_depth_partitions(&[], 3).is_empty());
    }

    #[test]
    fn test_every_size_is_covered() {
        let sizes: Vec<usize> = (0..200).map(|i| (i * 37) % 91 + 1).collect();
        let parts = equi_depth_partitions(&sizes, 7);
        assert!(validate_partitions(&parts).is_ok());
        for s in sizes {
            assert_eq!(parts.iter().filter(|p| p.contains(s)).count(), 1);
        }
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let parts = [
            Partition { lower: 1, upper: 5 },
            Partition { lower: 5, upper: 9 },
        ];
        assert!(validate_partitions(&parts).is_err());
        assert!(validate_partitions(&[]).is_err());
        assert!(validate_partitions(&[Partition { lower: 4, upper: 2 }]).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_lower_bound() {
        let parts = [
            Partition { lower: 0, upper: 0 },
            Partition { lower: 1, upper: 10 },
        ];
        assert!(validate_partitions(&parts).is_err());
        assert!(validate_partitions(&parts[1..]).is_ok());
    }
}
