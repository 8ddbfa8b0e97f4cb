//! Purchasable-number derivation.
//!
//! The backend only reports which numbers are sold; everything in `1..=total`
//! that is not sold can still be bought.

use std::collections::HashSet;

/// Partition of a raffle's number pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    pub total: u32,
    /// Ascending, unique
    pub available: Vec<u32>,
    /// Ascending, unique
    pub unavailable: Vec<u32>,
}

/// Display label for a number: zero-padded to two digits
pub fn format_number(number: u32) -> String {
    format!("{:02}", number)
}

/// Parse a display label back into a number
pub fn parse_label(label: &str) -> Option<u32> {
    label.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

/// Split `1..=total` by membership in `sold`
///
/// Sold entries outside the range or repeated are ignored, so the two
/// sequences always cover the range exactly once.
pub fn derive(total: u32, sold: &[u32]) -> Availability {
    let sold: HashSet<u32> = sold.iter().copied().collect();

    let (unavailable, available): (Vec<u32>, Vec<u32>) =
        (1..=total).partition(|n| sold.contains(n));

    Availability {
        total,
        available,
        unavailable,
    }
}

impl Availability {
    pub fn available_labels(&self) -> Vec<String> {
        self.available.iter().copied().map(format_number).collect()
    }

    pub fn unavailable_labels(&self) -> Vec<String> {
        self.unavailable.iter().copied().map(format_number).collect()
    }

    /// Check if a number can still be purchased
    pub fn is_available(&self, number: u32) -> bool {
        self.available.binary_search(&number).is_ok()
    }

    /// Share of the pool already sold, in percent
    pub fn sold_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.unavailable.len() as f64 * 100.0 / self.total as f64
    }

    pub fn is_sold_out(&self) -> bool {
        self.available.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_numbers_two_sold() {
        let availability = derive(10, &[3, 7]);
        assert_eq!(
            availability.available_labels(),
            vec!["01", "02", "04", "05", "06", "08", "09", "10"]
        );
        assert_eq!(availability.unavailable_labels(), vec!["03", "07"]);
        assert_eq!(availability.sold_percentage(), 20.0);
    }

    #[test]
    fn test_empty_pool() {
        let availability = derive(0, &[]);
        assert!(availability.available.is_empty());
        assert!(availability.unavailable.is_empty());
        assert_eq!(availability.sold_percentage(), 0.0);
    }

    #[test]
    fn test_partition_covers_range_exactly_once() {
        // Unsorted, duplicated and out-of-range sold entries
        let sold = [50, 1, 99, 1, 150, 0, 73];
        for total in [0u32, 1, 7, 64, 100, 120] {
            let availability = derive(total, &sold);
            let mut all: Vec<u32> = availability
                .available
                .iter()
                .chain(availability.unavailable.iter())
                .copied()
                .collect();
            all.sort_unstable();
            assert_eq!(all, (1..=total).collect::<Vec<_>>());
            assert!(availability.available.windows(2).all(|w| w[0] < w[1]));
            assert!(availability.unavailable.windows(2).all(|w| w[0] < w[1]));
            assert!(availability
                .available
                .iter()
                .all(|n| !availability.unavailable.contains(n)));
        }
    }

    #[test]
    fn test_labels_above_ninety_nine_are_not_truncated() {
        assert_eq!(format_number(5), "05");
        assert_eq!(format_number(100), "100");
        assert_eq!(parse_label("07"), Some(7));
        assert_eq!(parse_label("00"), None);
        assert_eq!(parse_label("x"), None);
    }

    #[test]
    fn test_is_available() {
        let availability = derive(5, &[2]);
        assert!(availability.is_available(1));
        assert!(!availability.is_available(2));
        assert!(!availability.is_available(6));
        assert!(!availability.is_sold_out());
        assert!(derive(2, &[1, 2]).is_sold_out());
    }
}
