//! Nearest-neighbor ranking in audio-feature space.
//!
//! Similarity is a deterministic distance metric, not a learned model:
//! Euclidean distance over (energy, valence, danceability, acousticness,
//! tempo), with tempo min-max normalized over the candidate pool so its
//! BPM scale does not dominate the [0, 1] features.

/// Default number of similar tracks returned when the caller does not ask
/// for a specific count.
pub const DEFAULT_SIMILAR_LIMIT: usize = 3;
/// Hard cap on requested neighbors, bounding response size and ranking cost.
pub const MAX_SIMILAR_LIMIT: usize = 50;

/// The complete feature vector required for similarity comparison.
///
/// Tracks missing any of these features cannot be meaningfully compared
/// and must be excluded from candidacy before building one of these.
#[derive(Clone, Debug)]
pub struct FeatureVector {
    pub track_id: String,
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub tempo: f64,
}

/// Clamp a requested neighbor count into `[0, MAX_SIMILAR_LIMIT]`,
/// defaulting when absent or negative.
pub fn clamp_limit(requested: Option<i64>) -> usize {
    match requested {
        None => DEFAULT_SIMILAR_LIMIT,
        Some(k) if k < 0 => DEFAULT_SIMILAR_LIMIT,
        Some(k) => (k as usize).min(MAX_SIMILAR_LIMIT),
    }
}

/// Rank `candidates` by ascending distance from `reference` and return the
/// ids of the `k` nearest.
///
/// The reference itself is never returned even if present among the
/// candidates. Ties are broken by track id ascending, which makes the
/// ordering total: the result for a smaller `k` is always a prefix of the
/// result for a larger one.
pub fn rank_similar(reference: &FeatureVector, candidates: &[FeatureVector], k: usize) -> Vec<String> {
    let (tempo_min, tempo_max) = tempo_range(reference, candidates);
    let norm_tempo = |tempo: f64| -> f64 {
        if tempo_max > tempo_min {
            (tempo - tempo_min) / (tempo_max - tempo_min)
        } else {
            0.0
        }
    };

    let reference_tempo = norm_tempo(reference.tempo);
    let mut ranked: Vec<(f64, &str)> = candidates
        .iter()
        .filter(|candidate| candidate.track_id != reference.track_id)
        .map(|candidate| {
            let distance = ((candidate.energy - reference.energy).powi(2)
                + (candidate.valence - reference.valence).powi(2)
                + (candidate.danceability - reference.danceability).powi(2)
                + (candidate.acousticness - reference.acousticness).powi(2)
                + (norm_tempo(candidate.tempo) - reference_tempo).powi(2))
            .sqrt();
            (distance, candidate.track_id.as_str())
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(b.1))
    });
    ranked.truncate(k);
    ranked.into_iter().map(|(_, id)| id.to_string()).collect()
}

fn tempo_range(reference: &FeatureVector, candidates: &[FeatureVector]) -> (f64, f64) {
    let mut min = reference.tempo;
    let mut max = reference.tempo;
    for candidate in candidates {
        min = min.min(candidate.tempo);
        max = max.max(candidate.tempo);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(id: &str, energy: f64, valence: f64, tempo: f64) -> FeatureVector {
        FeatureVector {
            track_id: id.to_string(),
            energy,
            valence,
            danceability: 0.5,
            acousticness: 0.5,
            tempo,
        }
    }

    #[test]
    fn test_nearest_first() {
        let reference = vector("ref", 0.5, 0.5, 120.0);
        let candidates = vec![
            vector("far", 0.1, 0.9, 60.0),
            vector("near", 0.5, 0.55, 120.0),
            vector("mid", 0.3, 0.5, 120.0),
        ];

        let ranked = rank_similar(&reference, &candidates, 3);
        assert_eq!(ranked, vec!["near", "mid", "far"]);
    }

    #[test]
    fn test_never_includes_reference() {
        let reference = vector("ref", 0.5, 0.5, 120.0);
        let candidates = vec![
            vector("ref", 0.5, 0.5, 120.0),
            vector("other", 0.4, 0.5, 120.0),
        ];

        let ranked = rank_similar(&reference, &candidates, 10);
        assert_eq!(ranked, vec!["other"]);
    }

    #[test]
    fn test_at_most_k_results() {
        let reference = vector("ref", 0.5, 0.5, 120.0);
        let candidates: Vec<FeatureVector> = (0..10)
            .map(|i| vector(&format!("t{:02}", i), 0.1 * i as f64 / 10.0, 0.5, 120.0))
            .collect();

        assert_eq!(rank_similar(&reference, &candidates, 4).len(), 4);
        assert_eq!(rank_similar(&reference, &candidates, 0).len(), 0);
    }

    #[test]
    fn test_smaller_k_is_prefix_of_larger_k() {
        let reference = vector("ref", 0.5, 0.5, 100.0);
        let candidates: Vec<FeatureVector> = (0..20)
            .map(|i| {
                vector(
                    &format!("t{:02}", i),
                    (i as f64) / 20.0,
                    1.0 - (i as f64) / 20.0,
                    80.0 + i as f64 * 5.0,
                )
            })
            .collect();

        let five = rank_similar(&reference, &candidates, 5);
        let ten = rank_similar(&reference, &candidates, 10);
        assert_eq!(five.as_slice(), &ten[..5]);
    }

    #[test]
    fn test_ties_break_by_id_ascending() {
        let reference = vector("ref", 0.5, 0.5, 120.0);
        // Two candidates at exactly the same distance.
        let candidates = vec![
            vector("bbb", 0.6, 0.5, 120.0),
            vector("aaa", 0.4, 0.5, 120.0),
        ];

        let ranked = rank_similar(&reference, &candidates, 2);
        assert_eq!(ranked, vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_tempo_is_normalized_before_combining() {
        let reference = vector("ref", 0.5, 0.5, 120.0);
        // "tempo_twin" differs hugely in raw BPM but matches on every
        // [0,1] feature; "feature_twin" matches tempo but is maximally far
        // on energy and valence. With min-max normalization the tempo gap
        // is at most 1.0, comparable to one feature axis, so the feature
        // twin cannot win on tempo scale alone.
        let candidates = vec![
            vector("tempo_twin", 0.5, 0.5, 240.0),
            vector("feature_twin", 1.0, 1.0, 120.0),
        ];

        let ranked = rank_similar(&reference, &candidates, 2);
        assert_eq!(ranked[0], "tempo_twin");
    }

    #[test]
    fn test_constant_tempo_pool() {
        // All candidates share one tempo: the normalized axis collapses to
        // zero instead of dividing by zero.
        let reference = vector("ref", 0.5, 0.5, 120.0);
        let candidates = vec![
            vector("a", 0.6, 0.5, 120.0),
            vector("b", 0.9, 0.5, 120.0),
        ];

        let ranked = rank_similar(&reference, &candidates, 2);
        assert_eq!(ranked, vec!["a", "b"]);
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_SIMILAR_LIMIT);
        assert_eq!(clamp_limit(Some(-3)), DEFAULT_SIMILAR_LIMIT);
        assert_eq!(clamp_limit(Some(7)), 7);
        assert_eq!(clamp_limit(Some(10_000)), MAX_SIMILAR_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 0);
    }
}
