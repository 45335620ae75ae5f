use std::collections::BTreeMap;

use crate::survey::repo_types::SurveyResponse;

/// Count of responses per exact gender string, ordered by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenderDistribution {
    counts: BTreeMap<String, u32>,
}

impl GenderDistribution {
    pub fn from_responses(responses: &[SurveyResponse]) -> Self {
        Self::from_labels(responses.iter().map(|r| r.gender.as_str()))
    }

    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts = BTreeMap::new();
        for label in labels {
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn bars(&self) -> Vec<(String, u32)> {
        self.counts.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_distinct_label() {
        let d = GenderDistribution::from_labels(["м", "ж", "м"]);
        assert_eq!(d.bars(), vec![("ж".to_string(), 1), ("м".to_string(), 2)]);
    }

    #[test]
    fn labels_are_case_sensitive_and_sorted() {
        let d = GenderDistribution::from_labels(["b", "B", "a", ""]);
        let labels: Vec<String> = d.bars().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["", "B", "a", "b"]);
    }

    #[test]
    fn empty_input_has_no_bars() {
        let d = GenderDistribution::from_responses(&[]);
        assert!(d.bars().is_empty());
    }
}
