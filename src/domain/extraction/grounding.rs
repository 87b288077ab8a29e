//! Grounding checks for extracted spans.
//!
//! A span is grounded when its whitespace-normalised text occurs in the
//! whitespace-normalised contract. Normalisation collapses every run of
//! Unicode whitespace to a single ASCII space and trims both ends.

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Contract text prepared once for repeated grounding checks.
#[derive(Debug, Clone)]
pub struct GroundingIndex {
    normalized: String,
}

impl GroundingIndex {
    pub fn new(contract_text: &str) -> Self {
        Self {
            normalized: normalize_whitespace(contract_text),
        }
    }

    /// Check whether a span appears in the contract modulo whitespace.
    ///
    /// Blank spans are never grounded.
    pub fn is_grounded(&self, span: &str) -> bool {
        let span = normalize_whitespace(span);
        !span.is_empty() && self.normalized.contains(&span)
    }

    /// Partition spans into grounded and ungrounded, preserving order.
    pub fn check<'a, I>(&self, spans: I) -> GroundingReport
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut report = GroundingReport::default();
        for span in spans {
            if self.is_grounded(span) {
                report.grounded.push(span.clone());
            } else {
                report.ungrounded.push(span.clone());
            }
        }
        report
    }
}

/// Single-shot grounding check.
pub fn is_grounded(span: &str, contract_text: &str) -> bool {
    GroundingIndex::new(contract_text).is_grounded(span)
}

/// Outcome of checking a list of spans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundingReport {
    pub grounded: Vec<String>,
    pub ungrounded: Vec<String>,
}

impl GroundingReport {
    /// Number of spans checked.
    pub fn total(&self) -> usize {
        self.grounded.len() + self.ungrounded.len()
    }

    /// `grounded / total`; 1.0 when nothing was extracted.
    pub fn rate(&self) -> f64 {
        grounding_rate(self.grounded.len(), self.total())
    }
}

/// `validated / total`, defined as 1.0 when `total` is zero.
pub fn grounding_rate(validated: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        validated as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CONTRACT: &str = "This Agreement shall be governed by\n  the laws of the State of Texas.\n\nEither party may terminate upon 30 days notice.";

    #[test]
    fn normalize_collapses_and_trims() {
        assert_eq!(normalize_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn span_with_different_whitespace_is_grounded() {
        assert!(is_grounded(
            "governed by the laws of the State of Texas.",
            CONTRACT
        ));
    }

    #[test]
    fn paraphrased_span_is_not_grounded() {
        assert!(!is_grounded("Texas law governs.", CONTRACT));
    }

    #[test]
    fn blank_span_is_not_grounded() {
        assert!(!is_grounded("   ", CONTRACT));
    }

    #[test]
    fn report_partitions_in_order() {
        let index = GroundingIndex::new(CONTRACT);
        let spans = vec![
            "Either party may terminate".to_string(),
            "invented text".to_string(),
            "the State of Texas.".to_string(),
        ];

        let report = index.check(&spans);

        assert_eq!(report.grounded, vec!["Either party may terminate", "the State of Texas."]);
        assert_eq!(report.ungrounded, vec!["invented text"]);
        assert!((report.rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_extraction_has_rate_one() {
        assert_eq!(GroundingReport::default().rate(), 1.0);
        assert_eq!(grounding_rate(0, 0), 1.0);
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(text in "[ a-z\t\n]{0,60}") {
            let once = normalize_whitespace(&text);
            prop_assert_eq!(normalize_whitespace(&once), once.clone());
        }

        #[test]
        fn any_word_window_of_contract_is_grounded(start in 0usize..10, len in 1usize..6) {
            let words: Vec<&str> = CONTRACT.split_whitespace().collect();
            let end = (start + len).min(words.len());
            let span = words[start..end].join("\n ");
            prop_assert!(is_grounded(&span, CONTRACT));
        }
    }
}
