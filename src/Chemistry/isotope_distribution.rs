//! # Isotope Distribution Module
//!
//! ## Purpose
//! Isotope pattern of a [`ChemicalComposition`]: the masses its atoms can add up to,
//! each with its relative abundance, as seen by a mass spectrometer.
//!
//! ## Algorithm
//! Each element contributes the pattern of its naturally occurring isotopes (or, if it
//! has none, all of its isotopes with equal weight). The pattern of `n` atoms is built
//! by repeated squaring, so the work grows with `log n` convolutions rather than `n`.
//! After every convolution:
//! - peaks closer than the merge distance become one peak at their abundance-weighted
//!   mean mass, carrying the summed abundance;
//! - abundances are rescaled so the highest peak is 1;
//! - peaks far below the requested minimum abundance are pruned.
//!
//! Specified isotopes (`^13C`) shift every peak by their mass. Once the whole
//! composition is folded in, peaks below `minimum_abundance` percent of the highest
//! peak are dropped.
//!
//! Masses are neutral masses; [`IsotopeDistribution::at_charge`] divides them by the
//! magnitude of a charge.

use crate::Chemistry::composition::ChemicalComposition;
use crate::Chemistry::element::Element;
use log::debug;
use prettytable::{Cell, Row, Table};
use thiserror::Error;

/// merge distance used when a non-positive one is requested
pub const DEFAULT_MERGE_DISTANCE: f64 = 0.1;
/// default cut-off, in percent of the highest peak
pub const DEFAULT_MINIMUM_ABUNDANCE: f64 = 0.01;
/// intermediate peaks are kept down to this fraction of the final cut-off
const INTERMEDIATE_CUTOFF_FACTOR: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IsotopeDistributionError {
    #[error("Element \"{0}\" has no isotopes to build a distribution from")]
    NoIsotopes(String),
    #[error("Minimum abundance {0} is not a percentage between 0 and 100")]
    InvalidMinimumAbundance(f64),
    #[error("Merge distance {0} is not a finite number")]
    InvalidMergeDistance(f64),
}

/// One peak of a distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassAbundance {
    pub mass: f64,
    pub abundance: f64,
}

impl MassAbundance {
    pub fn new(mass: f64, abundance: f64) -> Self {
        Self { mass, abundance }
    }
}

/// Parameters of [`IsotopeDistribution::calculate`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionSettings {
    /// peaks closer than this are merged; zero or less means [`DEFAULT_MERGE_DISTANCE`]
    pub merge_distance: f64,
    /// percent of the highest peak below which peaks are dropped
    pub minimum_abundance: f64,
    /// keep only this many of the most abundant peaks after every step (0: no limit)
    pub max_peaks: usize,
}

impl Default for DistributionSettings {
    fn default() -> Self {
        Self {
            merge_distance: DEFAULT_MERGE_DISTANCE,
            minimum_abundance: DEFAULT_MINIMUM_ABUNDANCE,
            max_peaks: 0,
        }
    }
}

impl DistributionSettings {
    fn validated(&self) -> Result<Self, IsotopeDistributionError> {
        if !self.merge_distance.is_finite() {
            return Err(IsotopeDistributionError::InvalidMergeDistance(
                self.merge_distance,
            ));
        }
        if !(0.0..=100.0).contains(&self.minimum_abundance) {
            return Err(IsotopeDistributionError::InvalidMinimumAbundance(
                self.minimum_abundance,
            ));
        }
        let merge_distance = if self.merge_distance > 0.0 {
            self.merge_distance
        } else {
            DEFAULT_MERGE_DISTANCE
        };
        Ok(Self {
            merge_distance,
            ..*self
        })
    }
}

/// Peaks sorted by ascending mass, normalised so the highest has abundance 1
#[derive(Debug, Clone, PartialEq)]
pub struct IsotopeDistribution {
    peaks: Vec<MassAbundance>,
    merge_distance: f64,
    /// absolute abundance of the highest peak
    relative_abundance: f64,
}

/// Adjacent peaks closer than `distance` are folded into one. The folded peak keeps
/// moving right, so a single pass settles every chain.
fn merge_within(peaks: Vec<MassAbundance>, distance: f64) -> Vec<MassAbundance> {
    let mut merged: Vec<MassAbundance> = Vec::with_capacity(peaks.len());
    for peak in peaks {
        match merged.last_mut() {
            Some(last) if peak.mass - last.mass < distance => {
                let abundance = last.abundance + peak.abundance;
                if abundance > 0.0 {
                    last.mass =
                        (last.mass * last.abundance + peak.mass * peak.abundance) / abundance;
                }
                last.abundance = abundance;
            }
            _ => merged.push(peak),
        }
    }
    merged
}

fn sort_by_mass(peaks: &mut [MassAbundance]) {
    peaks.sort_by(|a, b| a.mass.total_cmp(&b.mass));
}

/// scales the peaks so the highest is 1 and returns the factor divided out
fn normalise(peaks: &mut [MassAbundance]) -> f64 {
    let largest = peaks
        .iter()
        .map(|peak| peak.abundance)
        .fold(0.0_f64, f64::max);
    if largest > 0.0 {
        for peak in peaks.iter_mut() {
            peak.abundance /= largest;
        }
    }
    largest
}

/// every pairwise sum of one peak from each side
fn convolve(first: &[MassAbundance], second: &[MassAbundance]) -> Vec<MassAbundance> {
    let mut combined = Vec::with_capacity(first.len() * second.len());
    for a in first {
        for b in second {
            combined.push(MassAbundance::new(a.mass + b.mass, a.abundance * b.abundance));
        }
    }
    sort_by_mass(&mut combined);
    combined
}

/// Pattern of a single atom: natural abundances as fractions, or a uniform spread
/// over all isotopes of an element that does not occur naturally
fn single_atom_pattern(
    element: &Element,
) -> Result<Vec<MassAbundance>, IsotopeDistributionError> {
    let natural: Vec<MassAbundance> = element
        .naturally_occurring_isotopes()
        .map(|isotope| MassAbundance::new(isotope.mass(), isotope.abundance()))
        .collect();
    let mut pattern: Vec<MassAbundance> = if natural.is_empty() {
        let isotopes = element.isotopes();
        if isotopes.is_empty() {
            return Err(IsotopeDistributionError::NoIsotopes(
                element.symbol().to_string(),
            ));
        }
        let weight = 1.0 / isotopes.len() as f64;
        isotopes
            .iter()
            .map(|isotope| MassAbundance::new(isotope.mass(), weight))
            .collect()
    } else {
        let total: f64 = natural.iter().map(|peak| peak.abundance).sum();
        natural
            .into_iter()
            .map(|peak| MassAbundance::new(peak.mass, peak.abundance / total))
            .collect()
    };
    sort_by_mass(&mut pattern);
    Ok(pattern)
}

/// Working state of one calculation: normalised peaks plus the scale divided out of them
struct Convolution<'s> {
    peaks: Vec<MassAbundance>,
    scale: f64,
    settings: &'s DistributionSettings,
}

impl<'s> Convolution<'s> {
    fn new(peaks: Vec<MassAbundance>, settings: &'s DistributionSettings) -> Self {
        let mut convolution = Self {
            peaks,
            scale: 1.0,
            settings,
        };
        convolution.tidy();
        convolution
    }

    fn combined(&self, other: &Convolution<'s>) -> Self {
        let mut result = Self {
            peaks: convolve(&self.peaks, &other.peaks),
            scale: self.scale * other.scale,
            settings: self.settings,
        };
        result.tidy();
        result
    }

    fn tidy(&mut self) {
        let peaks = std::mem::take(&mut self.peaks);
        self.peaks = merge_within(peaks, self.settings.merge_distance);
        self.scale *= normalise(&mut self.peaks);

        let cutoff = self.settings.minimum_abundance / 100.0 * INTERMEDIATE_CUTOFF_FACTOR;
        self.peaks
            .retain(|peak| peak.abundance > 0.0 && peak.abundance >= cutoff);

        let max_peaks = self.settings.max_peaks;
        if max_peaks > 0 && self.peaks.len() > max_peaks {
            self.peaks
                .sort_by(|a, b| b.abundance.total_cmp(&a.abundance));
            self.peaks.truncate(max_peaks);
            sort_by_mass(&mut self.peaks);
        }
    }

    /// the pattern of `count` copies of this one, by repeated squaring
    fn power(self, mut count: u32) -> Option<Self> {
        let mut result: Option<Self> = None;
        let mut base = self;
        while count > 0 {
            if count & 1 == 1 {
                result = Some(match result {
                    Some(result) => result.combined(&base),
                    None => Convolution {
                        peaks: base.peaks.clone(),
                        scale: base.scale,
                        settings: base.settings,
                    },
                });
            }
            count >>= 1;
            if count > 0 {
                base = base.combined(&base);
            }
        }
        result
    }
}

impl IsotopeDistribution {
    /// Distribution with the default settings
    pub fn for_composition(
        composition: &ChemicalComposition,
    ) -> Result<Self, IsotopeDistributionError> {
        Self::calculate(composition, &DistributionSettings::default())
    }

    /// Convolves the isotope patterns of every atom in `composition`.
    ///
    /// An empty composition gives an empty distribution.
    pub fn calculate(
        composition: &ChemicalComposition,
        settings: &DistributionSettings,
    ) -> Result<Self, IsotopeDistributionError> {
        let settings = settings.validated()?;
        if composition.is_empty() {
            return Ok(Self {
                peaks: Vec::new(),
                merge_distance: settings.merge_distance,
                relative_abundance: 0.0,
            });
        }

        let mut state = Convolution::new(vec![MassAbundance::new(0.0, 1.0)], &settings);
        for (element, &count) in composition.element_counts() {
            let atom = Convolution::new(single_atom_pattern(element)?, &settings);
            if let Some(pattern) = atom.power(count) {
                state = state.combined(&pattern);
            }
            debug!(
                "isotope pattern after {}{}: {} peaks",
                element.symbol(),
                count,
                state.peaks.len()
            );
        }

        // specified isotopes contribute no spread
        let shift: f64 = composition
            .isotope_counts()
            .iter()
            .map(|(isotope, &count)| isotope.mass() * f64::from(count))
            .sum();
        for peak in state.peaks.iter_mut() {
            peak.mass += shift;
        }

        let cutoff = settings.minimum_abundance / 100.0;
        state.peaks.retain(|peak| peak.abundance >= cutoff);
        let distribution = Self::from_scaled(state.peaks, settings.merge_distance, state.scale);
        debug!(
            "isotope distribution of {}: {} peaks",
            composition,
            distribution.len()
        );
        Ok(distribution)
    }

    /// Builds a distribution from arbitrary peaks, merging those closer than
    /// `merge_distance` (zero or less means [`DEFAULT_MERGE_DISTANCE`])
    pub fn from_peaks(peaks: Vec<MassAbundance>, merge_distance: f64) -> Self {
        let merge_distance = if merge_distance > 0.0 {
            merge_distance
        } else {
            DEFAULT_MERGE_DISTANCE
        };
        let mut peaks: Vec<MassAbundance> = peaks
            .into_iter()
            .filter(|peak| peak.abundance > 0.0 && peak.mass.is_finite())
            .collect();
        sort_by_mass(&mut peaks);
        Self::from_scaled(merge_within(peaks, merge_distance), merge_distance, 1.0)
    }

    fn from_scaled(mut peaks: Vec<MassAbundance>, merge_distance: f64, scale: f64) -> Self {
        let largest = normalise(&mut peaks);
        Self {
            peaks,
            merge_distance,
            relative_abundance: if largest > 0.0 { scale * largest } else { 0.0 },
        }
    }

    pub fn peaks(&self) -> &[MassAbundance] {
        &self.peaks
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn merge_distance(&self) -> f64 {
        self.merge_distance
    }

    /// Absolute abundance of the highest peak: the probability of the most likely
    /// isotope combination for a calculated distribution
    pub fn relative_abundance(&self) -> f64 {
        self.relative_abundance
    }

    /// the highest peak; the lightest wins a tie
    pub fn largest_abundance(&self) -> Option<MassAbundance> {
        self.peaks
            .iter()
            .copied()
            .reduce(|best, peak| if peak.abundance > best.abundance { peak } else { best })
    }

    /// abundance-weighted mean mass, 0 when empty
    pub fn mass(&self) -> f64 {
        let total = self.total_abundance();
        if total <= 0.0 {
            return 0.0;
        }
        self.peaks
            .iter()
            .map(|peak| peak.mass * peak.abundance)
            .sum::<f64>()
            / total
    }

    /// lightest and heaviest peak mass
    pub fn mass_range(&self) -> Option<(f64, f64)> {
        Some((self.peaks.first()?.mass, self.peaks.last()?.mass))
    }

    pub fn total_abundance(&self) -> f64 {
        self.peaks.iter().map(|peak| peak.abundance).sum()
    }

    /// Re-merges with a coarser distance. A distance at or below the current one
    /// leaves the peaks as they are.
    pub fn merged_within(&self, distance: f64) -> Self {
        if distance <= self.merge_distance {
            return self.clone();
        }
        let peaks = merge_within(self.peaks.clone(), distance);
        Self::from_scaled(peaks, distance, self.relative_abundance)
    }

    /// Keeps only the highest peak in each window of half the given resolution
    pub fn filtered_to_resolution(&self, resolution: f64) -> Self {
        let window = resolution / 2.0;
        if window.is_nan() || window <= 0.0 {
            return self.clone();
        }
        let mut kept: Vec<MassAbundance> = Vec::new();
        let mut last_block = None;
        for &peak in &self.peaks {
            let block = (peak.mass / window).floor() as i64;
            match kept.last_mut() {
                Some(last) if last_block == Some(block) => {
                    if peak.abundance >= last.abundance {
                        *last = peak;
                    }
                }
                _ => {
                    kept.push(peak);
                    last_block = Some(block);
                }
            }
        }
        Self {
            peaks: kept,
            merge_distance: self.merge_distance,
            relative_abundance: self.relative_abundance,
        }
    }

    /// Peaks with `from <= mass <= to`, renormalised to the highest remaining one
    pub fn clipped_to_range(&self, from: f64, to: f64) -> Self {
        let start = self.peaks.partition_point(|peak| peak.mass < from);
        let end = self.peaks.partition_point(|peak| peak.mass <= to);
        let peaks = if start < end {
            self.peaks[start..end].to_vec()
        } else {
            Vec::new()
        };
        Self::from_scaled(peaks, self.merge_distance, self.relative_abundance)
    }

    /// Sums two distributions on a common absolute scale, e.g. the patterns of two
    /// species that reach the detector together
    pub fn merged_with(&self, other: &IsotopeDistribution) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let ratio = other.relative_abundance / self.relative_abundance;
        let mut peaks: Vec<MassAbundance> = self.peaks.clone();
        peaks.extend(
            other
                .peaks
                .iter()
                .map(|peak| MassAbundance::new(peak.mass, peak.abundance * ratio)),
        );
        sort_by_mass(&mut peaks);
        let merge_distance = self.merge_distance.max(other.merge_distance);
        Self::from_scaled(
            merge_within(peaks, merge_distance),
            merge_distance,
            self.relative_abundance,
        )
    }

    /// Masses divided by `|charge|`; a charge of 0 leaves them unchanged
    pub fn at_charge(&self, charge: i32) -> Self {
        let mut distribution = self.clone();
        if charge != 0 {
            let divisor = f64::from(charge.unsigned_abs());
            for peak in distribution.peaks.iter_mut() {
                peak.mass /= divisor;
            }
        }
        distribution
    }

    /// Mass and relative abundance (percent) of every peak
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Mass"),
            Cell::new("Abundance %"),
        ]));
        for peak in &self.peaks {
            table.add_row(Row::new(vec![
                Cell::new(&format!("{:.5}", peak.mass)),
                Cell::new(&format!("{:.4}", peak.abundance * 100.0)),
            ]));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chemistry::element::Category;
    use crate::Chemistry::formula_parser::ChemicalFormulaParser;
    use crate::Chemistry::periodic_table::PeriodicTable;
    use approx::assert_relative_eq;

    fn parser() -> ChemicalFormulaParser {
        ChemicalFormulaParser::new(&PeriodicTable::bundled().unwrap())
    }

    fn distribution(formula: &str) -> IsotopeDistribution {
        let composition = parser().parse(formula).unwrap();
        IsotopeDistribution::for_composition(&composition).unwrap()
    }

    #[test]
    fn test_single_carbon() {
        let carbon = distribution("C");
        assert_eq!(carbon.len(), 2);
        let peaks = carbon.peaks();
        assert_relative_eq!(peaks[0].mass, 12.0, epsilon = 1e-9);
        assert_relative_eq!(peaks[0].abundance, 1.0, epsilon = 1e-12);
        assert_relative_eq!(peaks[1].mass, 13.0033548378, epsilon = 1e-9);
        assert_relative_eq!(peaks[1].abundance, 1.07 / 98.93, epsilon = 1e-9);
        assert_relative_eq!(carbon.relative_abundance(), 0.9893, epsilon = 1e-9);
        assert_eq!(carbon.mass_range(), Some((peaks[0].mass, peaks[1].mass)));
    }

    #[test]
    fn test_chlorine_pattern() {
        let chlorine = distribution("Cl2");
        assert_eq!(chlorine.len(), 3);
        let peaks = chlorine.peaks();
        let (light, heavy) = (0.7576, 0.2424);
        assert_relative_eq!(peaks[0].mass, 2.0 * 34.96885268, epsilon = 1e-6);
        assert_relative_eq!(peaks[1].mass, 34.96885268 + 36.96590259, epsilon = 1e-6);
        assert_relative_eq!(peaks[2].mass, 2.0 * 36.96590259, epsilon = 1e-6);
        assert_relative_eq!(peaks[0].abundance, 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            peaks[1].abundance,
            2.0 * light * heavy / (light * light),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            peaks[2].abundance,
            heavy * heavy / (light * light),
            epsilon = 1e-9
        );
        assert_relative_eq!(chlorine.relative_abundance(), light * light, epsilon = 1e-9);
        let largest = chlorine.largest_abundance().unwrap();
        assert_relative_eq!(largest.mass, peaks[0].mass);
    }

    #[test]
    fn test_mean_mass_matches_average_mass() {
        let parser = parser();
        let settings = DistributionSettings {
            minimum_abundance: 0.0,
            ..DistributionSettings::default()
        };
        for formula in ["H2O", "C6H12O6", "CH3Cl", "Br2"] {
            let composition = parser.parse(formula).unwrap();
            let distribution = IsotopeDistribution::calculate(&composition, &settings).unwrap();
            assert_relative_eq!(
                distribution.mass(),
                composition.average_mass_at_charge(0),
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn test_large_counts_stay_bounded() {
        let parser = parser();
        // a direct expansion would have 2^1000 combinations
        let composition = parser.parse("C1000").unwrap();
        let distribution = IsotopeDistribution::for_composition(&composition).unwrap();
        assert!(distribution.len() < 40);
        // merge distance keeps nominal masses apart
        let (low, high) = distribution.mass_range().unwrap();
        assert!(low >= 12000.0 - 1e-6);
        assert!(high < 12000.0 + 40.0 * 1.0034);
        assert_relative_eq!(
            distribution.largest_abundance().unwrap().abundance,
            1.0,
            epsilon = 1e-12
        );
        let settings = DistributionSettings {
            minimum_abundance: 0.0,
            ..DistributionSettings::default()
        };
        let unpruned = IsotopeDistribution::calculate(&composition, &settings).unwrap();
        assert_relative_eq!(
            unpruned.mass(),
            composition.average_mass_at_charge(0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_minimum_abundance_prunes() {
        let parser = parser();
        let water = parser.parse("H2O").unwrap();
        let everything = IsotopeDistribution::calculate(
            &water,
            &DistributionSettings {
                minimum_abundance: 0.0,
                ..DistributionSettings::default()
            },
        )
        .unwrap();
        let main_only = IsotopeDistribution::calculate(
            &water,
            &DistributionSettings {
                minimum_abundance: 1.0,
                ..DistributionSettings::default()
            },
        )
        .unwrap();
        assert!(everything.len() > main_only.len());
        assert_eq!(main_only.len(), 1);
        assert_relative_eq!(
            main_only.peaks()[0].mass,
            water.monoisotopic_mass_at_charge(0),
            epsilon = 1e-9
        );
        assert!(main_only.peaks().iter().all(|peak| peak.abundance >= 0.01));
    }

    #[test]
    fn test_max_peaks() {
        let composition = parser().parse("Br4").unwrap();
        let settings = DistributionSettings {
            max_peaks: 2,
            ..DistributionSettings::default()
        };
        let limited = IsotopeDistribution::calculate(&composition, &settings).unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(distribution("Br4").len(), 5);
    }

    #[test]
    fn test_isotopes_shift_the_pattern() {
        let plain = distribution("CH4");
        let labelled = distribution("^13CH4");
        let shift = 13.0033548378 - 12.0;
        // the labelled carbon adds no spread of its own
        assert!(labelled.len() <= plain.len());
        assert_relative_eq!(
            labelled.peaks()[0].mass,
            plain.peaks()[0].mass + shift,
            epsilon = 1e-9
        );
        let fixed = distribution("^13C^2H");
        assert_eq!(fixed.len(), 1);
        assert_relative_eq!(fixed.peaks()[0].mass, 13.0033548378 + 2.0141017778, epsilon = 1e-9);
    }

    #[test]
    fn test_element_without_natural_isotopes() {
        let technetium = distribution("Tc");
        assert_eq!(technetium.len(), 3);
        assert!(technetium
            .peaks()
            .iter()
            .all(|peak| (peak.abundance - 1.0).abs() < 1e-12));
        assert_relative_eq!(technetium.relative_abundance(), 1.0 / 3.0, epsilon = 1e-12);

        let unknown = distribution("?42.5");
        assert_eq!(unknown.peaks(), &[MassAbundance::new(42.5, 1.0)]);
    }

    #[test]
    fn test_element_without_isotopes_is_an_error() {
        let bare = Element::new(1, "Bare", "Bx", Category::None, &[]);
        let composition = ChemicalComposition::new().with_element(&bare);
        assert_eq!(
            IsotopeDistribution::for_composition(&composition),
            Err(IsotopeDistributionError::NoIsotopes("Bx".to_string()))
        );
    }

    #[test]
    fn test_empty_composition_and_bad_settings() {
        let empty = IsotopeDistribution::for_composition(&ChemicalComposition::new()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.mass(), 0.0);
        assert_eq!(empty.mass_range(), None);
        assert_eq!(empty.largest_abundance(), None);

        let water = parser().parse("H2O").unwrap();
        let negative = DistributionSettings {
            minimum_abundance: -1.0,
            ..DistributionSettings::default()
        };
        assert!(matches!(
            IsotopeDistribution::calculate(&water, &negative),
            Err(IsotopeDistributionError::InvalidMinimumAbundance(_))
        ));
        let not_a_number = DistributionSettings {
            merge_distance: f64::NAN,
            ..DistributionSettings::default()
        };
        assert!(matches!(
            IsotopeDistribution::calculate(&water, &not_a_number),
            Err(IsotopeDistributionError::InvalidMergeDistance(_))
        ));
        let zero_distance = DistributionSettings {
            merge_distance: 0.0,
            ..DistributionSettings::default()
        };
        let defaulted = IsotopeDistribution::calculate(&water, &zero_distance).unwrap();
        assert_eq!(defaulted.merge_distance(), DEFAULT_MERGE_DISTANCE);
    }

    #[test]
    fn test_merging_peaks() {
        let peaks = vec![
            MassAbundance::new(100.0, 1.0),
            MassAbundance::new(100.05, 1.0),
            MassAbundance::new(101.0, 0.5),
            MassAbundance::new(101.3, 0.5),
        ];
        let distribution = IsotopeDistribution::from_peaks(peaks, 0.1);
        assert_eq!(distribution.len(), 3);
        assert_relative_eq!(distribution.peaks()[0].mass, 100.025, epsilon = 1e-9);
        assert_relative_eq!(distribution.peaks()[0].abundance, 1.0);
        assert_relative_eq!(distribution.peaks()[1].abundance, 0.25);
        assert_relative_eq!(distribution.total_abundance(), 1.5);

        // the weighted mean survives a coarser merge
        let coarse = distribution.merged_within(0.5);
        assert_eq!(coarse.len(), 2);
        assert_relative_eq!(coarse.peaks()[1].mass, 101.15, epsilon = 1e-9);
        assert_relative_eq!(coarse.peaks()[1].abundance, 0.5);
        assert_relative_eq!(coarse.mass(), distribution.mass(), epsilon = 1e-9);
        let everything = distribution.merged_within(5.0);
        assert_eq!(everything.len(), 1);
        // a finer distance changes nothing
        assert_eq!(distribution.merged_within(0.01), distribution);
    }

    #[test]
    fn test_filter_and_clip() {
        let peaks = vec![
            MassAbundance::new(10.1, 0.2),
            MassAbundance::new(10.6, 1.0),
            MassAbundance::new(11.2, 0.4),
            MassAbundance::new(12.7, 0.8),
        ];
        let distribution = IsotopeDistribution::from_peaks(peaks, 0.1);
        // windows of width 1: [10, 11), [11, 12), [12, 13)
        let filtered = distribution.filtered_to_resolution(2.0);
        let masses: Vec<f64> = filtered.peaks().iter().map(|peak| peak.mass).collect();
        assert_eq!(masses, vec![10.6, 11.2, 12.7]);

        let clipped = distribution.clipped_to_range(11.0, 13.0);
        assert_eq!(clipped.len(), 2);
        assert_relative_eq!(clipped.peaks()[1].abundance, 1.0);
        assert_relative_eq!(clipped.peaks()[0].abundance, 0.5);
        assert_relative_eq!(clipped.relative_abundance(), 0.8);
        assert!(distribution.clipped_to_range(20.0, 30.0).is_empty());
    }

    #[test]
    fn test_merged_with_and_charge() {
        let carbon = distribution("C");
        let chlorine = distribution("Cl");
        let mixture = carbon.merged_with(&chlorine);
        assert_eq!(mixture.len(), 4);
        assert_relative_eq!(mixture.relative_abundance(), 0.9893, epsilon = 1e-9);
        // chlorine-35 at 0.7576 on the carbon-12 scale
        assert_relative_eq!(mixture.peaks()[2].abundance, 0.7576 / 0.9893, epsilon = 1e-9);
        assert_eq!(carbon.merged_with(&IsotopeDistribution::from_peaks(vec![], 0.1)), carbon);

        let doubly = carbon.at_charge(-2);
        assert_relative_eq!(doubly.peaks()[0].mass, 6.0, epsilon = 1e-9);
        assert_eq!(carbon.at_charge(0), carbon);
    }

    #[test]
    fn test_table() {
        let table = distribution("Cl2").to_table();
        assert_eq!(table.len(), 4);
        assert!(table.to_string().contains("69.93771"));
    }
}
