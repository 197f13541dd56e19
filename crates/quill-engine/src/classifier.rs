use serde::Serialize;

/// Whether the source is sent to the writing agent as-is or summarized first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Direct,
    SummarizeFirst,
}

impl Classification {
    pub fn uses_summary(self) -> bool {
        matches!(self, Self::SummarizeFirst)
    }
}

/// Texts strictly longer than `threshold` are summarized first.
pub fn classify(text_length: usize, threshold: usize) -> Classification {
    if text_length > threshold {
        Classification::SummarizeFirst
    } else {
        Classification::Direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_direct() {
        assert_eq!(classify(100_000, 100_000), Classification::Direct);
        assert_eq!(classify(100_001, 100_000), Classification::SummarizeFirst);
        assert_eq!(classify(99_999, 100_000), Classification::Direct);
    }

    #[test]
    fn typical_lengths() {
        assert_eq!(classify(500, 100_000), Classification::Direct);
        assert_eq!(classify(150_000, 100_000), Classification::SummarizeFirst);
        assert_eq!(classify(0, 0), Classification::Direct);
        assert_eq!(classify(1, 0), Classification::SummarizeFirst);
    }

    #[test]
    fn agrees_with_comparison_across_range() {
        for threshold in [0usize, 1, 7, 100] {
            for len in 0..=threshold + 3 {
                assert_eq!(classify(len, threshold).uses_summary(), len > threshold);
            }
        }
    }

    #[test]
    fn serializes_as_upper_snake() {
        let json = serde_json::to_string(&Classification::SummarizeFirst).unwrap();
        assert_eq!(json, "\"SUMMARIZE_FIRST\"");
    }
}
