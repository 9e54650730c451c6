#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Composite food-need scoring for zip regions.
//!
//! A region's need score weighs food insecurity, poverty, and
//! unemployment, then scales by a dampened population factor so that
//! dense regions rank above sparse ones with the same rates:
//!
//! ```text
//! score = (0.5·fi + 0.3·pov + 0.2·unemp) × (0.5 + clamp(log10(max(pop, 1)) / 5, 0.2, 1.0))
//! ```
//!
//! Scores are normalized against the collection maximum and mapped onto a
//! light-to-dark blue ramp for the choropleth.

pub mod ramp;

use std::collections::BTreeMap;

use food_map_records_models::ZipRegion;
use serde::{Deserialize, Serialize};

pub use ramp::FillEncoding;

/// Weight of the food insecurity rate.
pub const FOOD_INSECURITY_WEIGHT: f64 = 0.5;
/// Weight of the poverty rate.
pub const POVERTY_WEIGHT: f64 = 0.3;
/// Weight of the unemployment rate.
pub const UNEMPLOYMENT_WEIGHT: f64 = 0.2;

const POPULATION_BASE: f64 = 0.5;
const POPULATION_LOG_DIVISOR: f64 = 5.0;
const POPULATION_FACTOR_MIN: f64 = 0.2;
const POPULATION_FACTOR_MAX: f64 = 1.0;

/// Clamps a rate into `[0, 1]`. Missing or non-finite rates count as zero.
fn rate(value: Option<f64>) -> f64 {
    value
        .filter(|v| v.is_finite())
        .map_or(0.0, |v| v.clamp(0.0, 1.0))
}

/// Population multiplier in `[0.7, 1.5]`.
fn population_factor(population: Option<f64>) -> f64 {
    let pop = population.filter(|p| p.is_finite()).unwrap_or(0.0).max(1.0);
    POPULATION_BASE
        + (pop.log10() / POPULATION_LOG_DIVISOR).clamp(POPULATION_FACTOR_MIN, POPULATION_FACTOR_MAX)
}

/// Need score of one region. Always finite and non-negative.
#[must_use]
pub fn need_score(region: &ZipRegion) -> f64 {
    let weighted = FOOD_INSECURITY_WEIGHT.mul_add(
        rate(region.food_insecurity_rate),
        POVERTY_WEIGHT.mul_add(
            rate(region.poverty_rate),
            UNEMPLOYMENT_WEIGHT * rate(region.unemployment_rate),
        ),
    );
    weighted * population_factor(region.population)
}

/// A region's score with its normalized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRegion {
    pub geography: String,
    pub county: Option<String>,
    pub score: f64,
    pub normalized: f64,
}

/// Need scores for a collection of regions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeedScores {
    scores: BTreeMap<String, f64>,
    counties: BTreeMap<String, String>,
    max: f64,
}

impl NeedScores {
    /// Scores every region. Values outside their domain are reported with
    /// `log::warn!` and clamped.
    ///
    /// Regions sharing a geography keep the last occurrence.
    #[must_use]
    pub fn from_regions(regions: &[ZipRegion]) -> Self {
        let mut scores = BTreeMap::new();
        let mut counties = BTreeMap::new();

        for region in regions {
            for issue in region.validate() {
                log::warn!("Zip {}: {issue}, clamping", region.geography);
            }
            scores.insert(region.geography.clone(), need_score(region));
            if let Some(county) = &region.county {
                counties.insert(region.geography.clone(), county.clone());
            }
        }

        let max = scores.values().copied().fold(0.0, f64::max);
        log::debug!("Scored {} zip regions, max score {max:.4}", scores.len());

        Self {
            scores,
            counties,
            max,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Divisor used for normalization; `1.0` when every score is zero.
    #[must_use]
    pub fn max(&self) -> f64 {
        if self.max > 0.0 { self.max } else { 1.0 }
    }

    /// Raw score of a region.
    #[must_use]
    pub fn score(&self, geography: &str) -> Option<f64> {
        self.scores.get(geography).copied()
    }

    /// Score of a region divided by the collection maximum, in `[0, 1]`.
    #[must_use]
    pub fn normalized(&self, geography: &str) -> Option<f64> {
        self.score(geography).map(|s| (s / self.max()).clamp(0.0, 1.0))
    }

    /// Fill encoding of a region; the neutral fallback when unscored.
    #[must_use]
    pub fn encoding(&self, geography: &str) -> FillEncoding {
        self.normalized(geography)
            .map_or_else(FillEncoding::fallback, FillEncoding::for_normalized)
    }

    /// Fill encoding of every scored region, keyed by geography.
    pub fn encodings(&self) -> impl Iterator<Item = (&str, FillEncoding)> {
        self.scores
            .keys()
            .map(|g| (g.as_str(), self.encoding(g)))
    }

    /// Regions ordered from highest to lowest need.
    #[must_use]
    pub fn ranked(&self) -> Vec<RankedRegion> {
        let mut ranked: Vec<RankedRegion> = self
            .scores
            .iter()
            .map(|(geography, &score)| RankedRegion {
                geography: geography.clone(),
                county: self.counties.get(geography).cloned(),
                score,
                normalized: (score / self.max()).clamp(0.0, 1.0),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.geography.cmp(&b.geography))
        });
        ranked
    }
}
