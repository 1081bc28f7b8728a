//! Label distributions over filtered row sets.

use serde::Serialize;
use std::collections::BTreeMap;

/// One bucket of a distribution: how many members carry `label` and which
/// share of the filtered set that is.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DistributionEntry {
    pub label: String,
    pub count: u64,
    pub ratio: f64,
}

/// Aggregate a stream of labels into distribution entries.
///
/// Each input label contributes one count, so multi-label groupings (an
/// artist with three genres yields three labels) are counted once per
/// membership and ratios are taken against the sum of memberships. Entries
/// come back sorted by count descending, ties broken by label ascending.
/// An empty input yields an empty vec, never a division by zero.
pub fn distribution<I>(labels: I) -> Vec<DistributionEntry>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut total: u64 = 0;
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
        total += 1;
    }

    if total == 0 {
        return Vec::new();
    }

    let mut entries: Vec<DistributionEntry> = counts
        .into_iter()
        .map(|(label, count)| DistributionEntry {
            label,
            count,
            ratio: count as f64 / total as f64,
        })
        .collect();

    // BTreeMap iteration is already label-ascending, so a stable sort by
    // descending count preserves the alphabetical tie-break.
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input_yields_empty_distribution() {
        assert!(distribution(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_counts_and_ratios() {
        let entries = distribution(labels(&["pop", "rock", "pop", "pop"]));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "pop");
        assert_eq!(entries[0].count, 3);
        assert!((entries[0].ratio - 0.75).abs() < 1e-9);
        assert_eq!(entries[1].label, "rock");
        assert_eq!(entries[1].count, 1);
        assert!((entries[1].ratio - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_equal_counts_tie_break_alphabetically() {
        // 5 Calm and 5 Cheerful: Calm sorts first.
        let mut input = Vec::new();
        input.extend(labels(&["Cheerful"; 5]));
        input.extend(labels(&["Calm"; 5]));

        let entries = distribution(input);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "Calm");
        assert_eq!(entries[0].count, 5);
        assert!((entries[0].ratio - 0.5).abs() < 1e-9);
        assert_eq!(entries[1].label, "Cheerful");
        assert_eq!(entries[1].count, 5);
        assert!((entries[1].ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ratios_sum_to_one() {
        let entries = distribution(labels(&[
            "a", "b", "c", "a", "b", "a", "d", "e", "f", "g", "a", "b",
        ]));
        let sum: f64 = entries.iter().map(|e| e.ratio).sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_label() {
        let entries = distribution(labels(&["jazz"]));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].count, 1);
        assert!((entries[0].ratio - 1.0).abs() < 1e-9);
    }
}
