//! Word-count buckets for the rewrite-draft slider.

/// A labeled inclusive word-count range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordRange {
    pub min: u32,
    pub max: u32,
    pub name: &'static str,
}

/// The bucket table. Adjacent ranges share an endpoint; selection is by
/// table order, so the lower bucket wins at a shared boundary.
pub const WORD_RANGES: &[WordRange] = &[
    WordRange { min: 5, max: 25, name: "Brief" },
    WordRange { min: 25, max: 50, name: "Short" },
    WordRange { min: 50, max: 100, name: "Medium" },
    WordRange { min: 100, max: 200, name: "Long" },
    WordRange { min: 200, max: 500, name: "Article" },
    WordRange { min: 500, max: 1000, name: "Essay" },
];

/// Returns the first range containing `value`, or `None` when the value
/// falls outside the table.
pub fn select_range(value: u32) -> Option<&'static WordRange> {
    WORD_RANGES
        .iter()
        .find(|range| range.min <= value && value <= range.max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_values_resolve() {
        assert_eq!(select_range(10).unwrap().name, "Brief");
        assert_eq!(select_range(75).unwrap().name, "Medium");
        assert_eq!(select_range(750).unwrap().name, "Essay");
    }

    #[test]
    fn shared_endpoints_pick_the_lower_bucket() {
        assert_eq!(select_range(25).unwrap().name, "Brief");
        assert_eq!(select_range(50).unwrap().name, "Short");
        assert_eq!(select_range(100).unwrap().name, "Medium");
        assert_eq!(select_range(200).unwrap().name, "Long");
        assert_eq!(select_range(500).unwrap().name, "Article");
    }

    #[test]
    fn exact_bounds_resolve() {
        assert_eq!(select_range(5).unwrap().name, "Brief");
        assert_eq!(select_range(1000).unwrap().name, "Essay");
    }

    #[test]
    fn out_of_table_values_are_none() {
        assert!(select_range(4).is_none());
        assert!(select_range(1001).is_none());
        assert!(select_range(0).is_none());
    }
}
