use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// Maximum acceptable precursor mass deviation.
///
/// Convention: the tolerance is symmetric and expressed as a positive
/// value; a deviation of exactly the tolerance still passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PrecursorTolerance {
    #[serde(rename = "da")]
    Da(f64),
    #[serde(rename = "ppm")]
    Ppm(f64),
}

impl PrecursorTolerance {
    /// Tolerance half-width in Da at the given theoretical mass.
    pub fn max_deviation_da(&self, theoretic_mass: f64) -> f64 {
        match self {
            PrecursorTolerance::Da(tol) => *tol,
            PrecursorTolerance::Ppm(tol) => theoretic_mass * tol / 1e6,
        }
    }

    pub fn within(&self, theoretic_mass: f64, experimental_mass: f64) -> bool {
        let deviation = (experimental_mass - theoretic_mass).abs();
        // The bound is inclusive; pad by one epsilon at the mass scale so a
        // deviation of exactly the tolerance survives float rounding.
        deviation <= self.max_deviation_da(theoretic_mass) + f64::EPSILON * theoretic_mass
    }
}

impl Default for PrecursorTolerance {
    fn default() -> Self {
        PrecursorTolerance::Ppm(10.0)
    }
}

/// Per-candidate import filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub min_peptide_length: usize,
    pub max_peptide_length: usize,
    /// Tryptic missed-cleavage bound; `None` disables the check.
    #[serde(default)]
    pub max_missed_cleavages: Option<u16>,
    #[serde(default)]
    pub precursor_tolerance: PrecursorTolerance,
    /// Per-advocate maximum acceptable score (e-value convention, lower is
    /// better). Advocates without an entry are unrestricted.
    #[serde(default)]
    pub score_ceilings: BTreeMap<u32, f64>,
    /// When false, an assumption whose modification cannot be reconciled
    /// is rejected instead of being retained with the unknown sentinel.
    #[serde(default = "default_true")]
    pub allow_unknown_modifications: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_peptide_length: 6,
            max_peptide_length: 40,
            max_missed_cleavages: Some(2),
            precursor_tolerance: PrecursorTolerance::default(),
            score_ceilings: BTreeMap::new(),
            allow_unknown_modifications: true,
        }
    }
}

/// Run-wide import settings. Loaded once per run, read-only thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    /// Worker thread count; 0 means one per available processing unit.
    #[serde(default)]
    pub threads: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Fraction of total memory above which the governor starts evicting.
    #[serde(default = "default_high_water")]
    pub memory_high_water: f64,
}

fn default_batch_size() -> usize {
    1024
}

fn default_high_water() -> f64 {
    0.9
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            threads: 0,
            batch_size: default_batch_size(),
            memory_high_water: default_high_water(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_da() {
        let tol = PrecursorTolerance::Da(0.5);
        assert!(tol.within(800.0, 800.5));
        assert!(!tol.within(800.0, 800.51));
        assert!(tol.within(800.0, 799.5));
    }

    #[test]
    fn test_tolerance_ppm() {
        let tol = PrecursorTolerance::Ppm(10.0);
        // 10 ppm of 800 Da is 0.008 Da
        assert!((tol.max_deviation_da(800.0) - 0.008).abs() < 1e-12);
        assert!(tol.within(800.0, 800.008));
        assert!(!tol.within(800.0, 800.009));
    }

    #[test]
    fn test_tolerance_serde_tags() {
        let tol: PrecursorTolerance = serde_json::from_str(r#"{"ppm": 20.0}"#).unwrap();
        assert_eq!(tol, PrecursorTolerance::Ppm(20.0));
        let tol: PrecursorTolerance = serde_json::from_str(r#"{"da": 0.02}"#).unwrap();
        assert_eq!(tol, PrecursorTolerance::Da(0.02));
    }

    #[test]
    fn test_config_defaults() {
        let config: ImportConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.filter.min_peptide_length, 6);
        assert_eq!(config.filter.max_peptide_length, 40);
        assert_eq!(config.batch_size, 1024);
        assert!(config.filter.allow_unknown_modifications);
    }
}
