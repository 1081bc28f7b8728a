//! Emotion classification over the (energy, valence) plane.
//!
//! This is the single place where the band boundaries live. The track
//! search pushes the emotion filter down to SQL, but it derives its range
//! predicates from [`Band::bounds`], so recalibrating the split never
//! touches the query code.

use serde::{Deserialize, Serialize};

/// End of the low band, start of the mid band.
pub const LOW_BAND_END: f64 = 1.0 / 3.0;
/// End of the mid band, start of the high band.
pub const MID_BAND_END: f64 = 2.0 / 3.0;

/// One third of a normalized [0, 1] feature axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    fn of(value: f64) -> Band {
        let value = value.clamp(0.0, 1.0);
        if value < LOW_BAND_END {
            Band::Low
        } else if value < MID_BAND_END {
            Band::Mid
        } else {
            Band::High
        }
    }

    /// Numeric range covered by this band as `(low, high, high_inclusive)`.
    ///
    /// Only the high band includes its upper bound; the tertile split is
    /// low `[0, 1/3)`, mid `[1/3, 2/3)`, high `[2/3, 1]`.
    pub fn bounds(&self) -> (f64, f64, bool) {
        match self {
            Band::Low => (0.0, LOW_BAND_END, false),
            Band::Mid => (LOW_BAND_END, MID_BAND_END, false),
            Band::High => (MID_BAND_END, 1.0, true),
        }
    }
}

/// Discrete emotion category derived from a track's energy and valence.
///
/// `Other` marks tracks where either feature is absent. Labels are never
/// stored, they are recomputed from the feature columns on every read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionLabel {
    Frantic,
    Tense,
    Euphotic,
    Upset,
    Calm,
    Cheerful,
    Bleak,
    Apathetic,
    Serene,
    Other,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 10] = [
        EmotionLabel::Frantic,
        EmotionLabel::Tense,
        EmotionLabel::Euphotic,
        EmotionLabel::Upset,
        EmotionLabel::Calm,
        EmotionLabel::Cheerful,
        EmotionLabel::Bleak,
        EmotionLabel::Apathetic,
        EmotionLabel::Serene,
        EmotionLabel::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Frantic => "Frantic",
            EmotionLabel::Tense => "Tense",
            EmotionLabel::Euphotic => "Euphotic",
            EmotionLabel::Upset => "Upset",
            EmotionLabel::Calm => "Calm",
            EmotionLabel::Cheerful => "Cheerful",
            EmotionLabel::Bleak => "Bleak",
            EmotionLabel::Apathetic => "Apathetic",
            EmotionLabel::Serene => "Serene",
            EmotionLabel::Other => "Other",
        }
    }

    /// Parse a label name, case-insensitively. Unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<EmotionLabel> {
        EmotionLabel::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(s))
    }

    /// The (energy, valence) bands this label occupies, or `None` for
    /// `Other`, which covers rows with missing features instead of a cell
    /// of the grid.
    pub fn bands(&self) -> Option<(Band, Band)> {
        let bands = match self {
            EmotionLabel::Frantic => (Band::High, Band::Low),
            EmotionLabel::Tense => (Band::High, Band::Mid),
            EmotionLabel::Euphotic => (Band::High, Band::High),
            EmotionLabel::Upset => (Band::Mid, Band::Low),
            EmotionLabel::Calm => (Band::Mid, Band::Mid),
            EmotionLabel::Cheerful => (Band::Mid, Band::High),
            EmotionLabel::Bleak => (Band::Low, Band::Low),
            EmotionLabel::Apathetic => (Band::Low, Band::Mid),
            EmotionLabel::Serene => (Band::Low, Band::High),
            EmotionLabel::Other => return None,
        };
        Some(bands)
    }
}

/// Classify a track into an emotion label from its energy and valence.
///
/// Total and deterministic: every input pair yields a label, `Other` iff
/// either feature is absent (or not a finite number). Out-of-range values
/// clamp to [0, 1].
pub fn classify(energy: Option<f64>, valence: Option<f64>) -> EmotionLabel {
    let (energy, valence) = match (energy, valence) {
        (Some(e), Some(v)) if e.is_finite() && v.is_finite() => (e, v),
        _ => return EmotionLabel::Other,
    };

    match (Band::of(energy), Band::of(valence)) {
        (Band::High, Band::Low) => EmotionLabel::Frantic,
        (Band::High, Band::Mid) => EmotionLabel::Tense,
        (Band::High, Band::High) => EmotionLabel::Euphotic,
        (Band::Mid, Band::Low) => EmotionLabel::Upset,
        (Band::Mid, Band::Mid) => EmotionLabel::Calm,
        (Band::Mid, Band::High) => EmotionLabel::Cheerful,
        (Band::Low, Band::Low) => EmotionLabel::Bleak,
        (Band::Low, Band::Mid) => EmotionLabel::Apathetic,
        (Band::Low, Band::High) => EmotionLabel::Serene,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_corners() {
        assert_eq!(classify(Some(0.9), Some(0.1)), EmotionLabel::Frantic);
        assert_eq!(classify(Some(0.9), Some(0.5)), EmotionLabel::Tense);
        assert_eq!(classify(Some(0.9), Some(0.9)), EmotionLabel::Euphotic);
        assert_eq!(classify(Some(0.5), Some(0.1)), EmotionLabel::Upset);
        assert_eq!(classify(Some(0.5), Some(0.5)), EmotionLabel::Calm);
        assert_eq!(classify(Some(0.5), Some(0.9)), EmotionLabel::Cheerful);
        assert_eq!(classify(Some(0.1), Some(0.1)), EmotionLabel::Bleak);
        assert_eq!(classify(Some(0.1), Some(0.5)), EmotionLabel::Apathetic);
        assert_eq!(classify(Some(0.1), Some(0.9)), EmotionLabel::Serene);
    }

    #[test]
    fn test_other_iff_missing_input() {
        assert_eq!(classify(None, Some(0.9)), EmotionLabel::Other);
        assert_eq!(classify(Some(0.9), None), EmotionLabel::Other);
        assert_eq!(classify(None, None), EmotionLabel::Other);
        assert_eq!(classify(Some(f64::NAN), Some(0.5)), EmotionLabel::Other);
    }

    #[test]
    fn test_band_boundaries() {
        // Lower bound of each band is inclusive, upper bound exclusive
        // except for the top of the high band.
        assert_eq!(classify(Some(1.0 / 3.0), Some(0.0)), EmotionLabel::Upset);
        assert_eq!(classify(Some(2.0 / 3.0), Some(0.0)), EmotionLabel::Frantic);
        assert_eq!(classify(Some(1.0), Some(1.0)), EmotionLabel::Euphotic);
        assert_eq!(classify(Some(0.0), Some(0.0)), EmotionLabel::Bleak);
    }

    #[test]
    fn test_out_of_range_inputs_clamp() {
        assert_eq!(classify(Some(1.5), Some(-0.2)), EmotionLabel::Frantic);
        assert_eq!(classify(Some(-1.0), Some(7.0)), EmotionLabel::Serene);
    }

    #[test]
    fn test_totality_over_grid_sweep() {
        // Every point in [0,1]^2 classifies into one of the nine grid
        // labels, never Other.
        for ei in 0..=20 {
            for vi in 0..=20 {
                let label = classify(Some(ei as f64 / 20.0), Some(vi as f64 / 20.0));
                assert_ne!(label, EmotionLabel::Other);
            }
        }
    }

    #[test]
    fn test_determinism() {
        let first = classify(Some(0.42), Some(0.77));
        for _ in 0..10 {
            assert_eq!(classify(Some(0.42), Some(0.77)), first);
        }
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(EmotionLabel::parse("Euphotic"), Some(EmotionLabel::Euphotic));
        assert_eq!(EmotionLabel::parse("calm"), Some(EmotionLabel::Calm));
        assert_eq!(EmotionLabel::parse("All"), None);
        assert_eq!(EmotionLabel::parse(""), None);
        assert_eq!(EmotionLabel::parse("joyful"), None);
    }

    #[test]
    fn test_bands_match_classification() {
        // The SQL pushdown relies on bands() agreeing with classify().
        for label in EmotionLabel::ALL {
            let Some((energy_band, valence_band)) = label.bands() else {
                continue;
            };
            let (elo, ehi, _) = energy_band.bounds();
            let (vlo, vhi, _) = valence_band.bounds();
            let energy = (elo + ehi) / 2.0;
            let valence = (vlo + vhi) / 2.0;
            assert_eq!(classify(Some(energy), Some(valence)), label);
        }
    }
}
