//! Air-quality severity classification.
//!
//! Each pollutant is placed on its own band scale, and the pair takes the
//! worse of the two categories. A single bad pollutant is enough to raise
//! the public-facing label.

use serde::{Deserialize, Serialize};

/// Severity categories, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeverityCategory {
    Good,
    Moderate,
    #[serde(rename = "usg")]
    Usg,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl SeverityCategory {
    /// All categories, least severe first.
    pub const ALL: [SeverityCategory; 6] = [
        SeverityCategory::Good,
        SeverityCategory::Moderate,
        SeverityCategory::Usg,
        SeverityCategory::Unhealthy,
        SeverityCategory::VeryUnhealthy,
        SeverityCategory::Hazardous,
    ];

    /// Position on the scale; higher is worse.
    pub fn index(self) -> usize {
        self as usize
    }

    fn level(self) -> &'static SeverityLevel {
        &SEVERITY_SCALE[self.index()]
    }

    /// Display name, e.g. "Poor / USG".
    pub fn name(self) -> &'static str {
        self.level().name
    }

    /// Stable identifier, independent of the display name.
    pub fn key(self) -> &'static str {
        self.level().key
    }

    /// Display colour as a hex string.
    pub fn hex_color(self) -> &'static str {
        self.level().hex_color
    }
}

impl std::fmt::Display for SeverityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Band table
// ---------------------------------------------------------------------------

/// Concentration band for one pollutant, in µg/m³.
///
/// `upper` is inclusive; `None` marks the open-ended top band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lower: f64,
    pub upper: Option<f64>,
}

/// One row of the severity scale.
#[derive(Debug)]
pub struct SeverityLevel {
    pub category: SeverityCategory,
    pub name: &'static str,
    pub key: &'static str,
    pub hex_color: &'static str,
    pub pm25: Band,
    pub pm10: Band,
}

const fn band(lower: f64, upper: f64) -> Band {
    Band {
        lower,
        upper: Some(upper),
    }
}

const fn open_band(lower: f64) -> Band {
    Band { lower, upper: None }
}

/// The severity scale, least severe first.
pub static SEVERITY_SCALE: &[SeverityLevel] = &[
    SeverityLevel {
        category: SeverityCategory::Good,
        name: "Good",
        key: "good",
        hex_color: "#22c55e",
        pm25: band(0.0, 15.0),
        pm10: band(0.0, 50.0),
    },
    SeverityLevel {
        category: SeverityCategory::Moderate,
        name: "Moderate",
        key: "moderate",
        hex_color: "#eab308",
        pm25: band(16.0, 35.0),
        pm10: band(51.0, 100.0),
    },
    SeverityLevel {
        category: SeverityCategory::Usg,
        name: "Poor / USG",
        key: "usg",
        hex_color: "#f97316",
        pm25: band(36.0, 75.0),
        pm10: band(101.0, 150.0),
    },
    SeverityLevel {
        category: SeverityCategory::Unhealthy,
        name: "Unhealthy",
        key: "unhealthy",
        hex_color: "#ef4444",
        pm25: band(76.0, 150.0),
        pm10: band(151.0, 250.0),
    },
    SeverityLevel {
        category: SeverityCategory::VeryUnhealthy,
        name: "Very Unhealthy",
        key: "very-unhealthy",
        hex_color: "#a855f7",
        pm25: band(151.0, 250.0),
        pm10: band(251.0, 350.0),
    },
    SeverityLevel {
        category: SeverityCategory::Hazardous,
        name: "Hazardous",
        key: "hazardous",
        hex_color: "#37055e",
        pm25: open_band(251.0),
        pm10: open_band(351.0),
    },
];

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Result of classifying a (PM2.5, PM10) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Worse of the two per-pollutant categories.
    pub category: SeverityCategory,
    pub pm25_category: SeverityCategory,
    pub pm10_category: SeverityCategory,
}

/// Places a value on one pollutant's scale.
///
/// The value belongs to the first band whose upper bound it does not exceed.
/// Values between two bands (15.5 for PM2.5) therefore land in the higher
/// one, and anything above every explicit bound, or NaN, is Hazardous.
fn place(value: f64, band_of: fn(&SeverityLevel) -> Band) -> SeverityCategory {
    SEVERITY_SCALE
        .iter()
        .find(|level| band_of(level).upper.map_or(true, |upper| value <= upper))
        .map(|level| level.category)
        .unwrap_or(SeverityCategory::Hazardous)
}

/// Category for a PM2.5 concentration alone.
pub fn pm25_category(pm25: f64) -> SeverityCategory {
    place(pm25, |level| level.pm25)
}

/// Category for a PM10 concentration alone.
pub fn pm10_category(pm10: f64) -> SeverityCategory {
    place(pm10, |level| level.pm10)
}

/// Classifies a pair; the worse pollutant decides.
pub fn classify_pair(pm25: f64, pm10: f64) -> Classification {
    let pm25_category = pm25_category(pm25);
    let pm10_category = pm10_category(pm10);
    Classification {
        category: pm25_category.max(pm10_category),
        pm25_category,
        pm10_category,
    }
}

/// Returns `(category_name, severity_key)` for a pair of concentrations.
pub fn classify(pm25: f64, pm10: f64) -> (&'static str, &'static str) {
    let category = classify_pair(pm25, pm10).category;
    (category.name(), category.key())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_values() {
        assert_eq!(classify(15.0, 50.0), ("Good", "good"));
        assert_eq!(classify(16.0, 50.0), ("Moderate", "moderate"));
        assert_eq!(classify(0.0, 351.0), ("Hazardous", "hazardous"));
        assert_eq!(classify(35.0, 100.0), ("Moderate", "moderate"));
        assert_eq!(classify(36.0, 0.0), ("Poor / USG", "usg"));
        assert_eq!(classify(250.0, 0.0), ("Very Unhealthy", "very-unhealthy"));
        assert_eq!(classify(0.0, 350.0), ("Very Unhealthy", "very-unhealthy"));
    }

    #[test]
    fn test_worse_pollutant_dominates() {
        // PM2.5 alone is Good; PM10 200 falls in the 151–250 band.
        let result = classify_pair(10.0, 200.0);
        assert_eq!(result.pm25_category, SeverityCategory::Good);
        assert_eq!(result.pm10_category, SeverityCategory::Unhealthy);
        assert_eq!(result.category, SeverityCategory::Unhealthy);

        let result = classify_pair(300.0, 10.0);
        assert_eq!(result.category, SeverityCategory::Hazardous);
    }

    #[test]
    fn test_values_above_every_bound_are_hazardous() {
        assert_eq!(pm25_category(251.0), SeverityCategory::Hazardous);
        assert_eq!(pm25_category(10_000.0), SeverityCategory::Hazardous);
        assert_eq!(pm10_category(1e12), SeverityCategory::Hazardous);
        assert_eq!(pm10_category(f64::INFINITY), SeverityCategory::Hazardous);
    }

    #[test]
    fn test_values_between_bands_take_the_higher_band() {
        assert_eq!(pm25_category(15.5), SeverityCategory::Moderate);
        assert_eq!(pm25_category(250.5), SeverityCategory::Hazardous);
        assert_eq!(pm10_category(50.2), SeverityCategory::Moderate);
        assert_eq!(pm10_category(350.5), SeverityCategory::Hazardous);
    }

    #[test]
    fn test_nan_is_hazardous() {
        assert_eq!(pm25_category(f64::NAN), SeverityCategory::Hazardous);
        assert_eq!(classify_pair(10.0, f64::NAN).category, SeverityCategory::Hazardous);
    }

    #[test]
    fn test_negative_values_are_good() {
        assert_eq!(classify(-1.0, -5.0), ("Good", "good"));
    }

    #[test]
    fn test_classifier_is_monotonic_in_each_pollutant() {
        let samples: Vec<f64> = (0..=4000).map(|i| i as f64 * 0.1).collect();
        for &fixed in &[0.0, 40.0, 120.0, 400.0] {
            let mut previous = 0;
            for &v in &samples {
                let index = classify_pair(v, fixed).category.index();
                assert!(index >= previous, "pm25 {} with pm10 {}", v, fixed);
                previous = index;
            }
            let mut previous = 0;
            for &v in &samples {
                let index = classify_pair(fixed, v).category.index();
                assert!(index >= previous, "pm10 {} with pm25 {}", v, fixed);
                previous = index;
            }
        }
    }

    #[test]
    fn test_scale_is_ordered_and_matches_categories() {
        assert_eq!(SEVERITY_SCALE.len(), SeverityCategory::ALL.len());
        for (i, level) in SEVERITY_SCALE.iter().enumerate() {
            assert_eq!(level.category.index(), i, "{}", level.name);
        }
        for pair in SEVERITY_SCALE.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            let pm25_upper = lo.pm25.upper.expect("only the last band is open");
            let pm10_upper = lo.pm10.upper.expect("only the last band is open");
            assert!(pm25_upper < hi.pm25.lower, "{} pm25", lo.name);
            assert!(pm10_upper < hi.pm10.lower, "{} pm10", lo.name);
        }
        assert!(SEVERITY_SCALE.last().unwrap().pm25.upper.is_none());
        assert!(SEVERITY_SCALE.last().unwrap().pm10.upper.is_none());
    }

    #[test]
    fn test_keys_are_distinct_and_serde_matches() {
        let mut seen = std::collections::HashSet::new();
        for category in SeverityCategory::ALL {
            assert!(seen.insert(category.key()), "duplicate key {}", category.key());
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.key()));
        }
    }

    #[test]
    fn test_index_order_and_colors() {
        assert_eq!(SeverityCategory::Usg.index(), 2);
        assert!(SeverityCategory::Hazardous > SeverityCategory::VeryUnhealthy);
        assert_eq!(SeverityCategory::Hazardous.hex_color(), "#37055e");
        assert_eq!(SeverityCategory::Good.to_string(), "Good");
    }
}
