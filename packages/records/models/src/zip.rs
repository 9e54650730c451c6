use serde::{Deserialize, Serialize};

use crate::{Entity, RecordError, raw};

/// Demographic and distribution figures for one zip code tabulation area.
///
/// Rate fields are fractions in `[0, 1]`; everything else is an absolute
/// count or dollar amount. Missing upstream values stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipRegion {
    /// Five-digit zip code.
    pub geography: String,
    /// County name.
    pub county: Option<String>,
    /// Total population (`tot_pop`).
    pub population: Option<f64>,
    /// Share of residents who are food insecure (`pct_food_insecure`).
    pub food_insecurity_rate: Option<f64>,
    /// Number of food insecure residents (`number_food_insecure`).
    pub food_insecure_count: Option<f64>,
    /// Share below the poverty line (`pct_poverty`).
    pub poverty_rate: Option<f64>,
    /// Unemployment rate (`unemployment_rate`).
    pub unemployment_rate: Option<f64>,
    /// Median household income in dollars.
    pub median_income: Option<f64>,
    /// Share of Black residents.
    pub black_rate: Option<f64>,
    /// Share of Hispanic residents.
    pub hispanic_rate: Option<f64>,
    /// Share of owner-occupied households.
    pub homeowner_rate: Option<f64>,
    /// Share of residents with a disability.
    pub disability_rate: Option<f64>,
    /// Produce distributed, in pounds (`Produce`).
    pub produce_lbs: Option<f64>,
    /// All food distributed, in pounds (`all`).
    pub all_food_lbs: Option<f64>,
}

/// A field whose value falls outside its documented domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Canonical field name.
    pub field: &'static str,
    /// The offending value.
    pub value: f64,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {} is out of range", self.field, self.value)
    }
}

impl ZipRegion {
    /// Creates a region with only its geography set.
    #[must_use]
    pub fn new(geography: impl Into<String>) -> Self {
        Self {
            geography: geography.into(),
            county: None,
            population: None,
            food_insecurity_rate: None,
            food_insecure_count: None,
            poverty_rate: None,
            unemployment_rate: None,
            median_income: None,
            black_rate: None,
            hispanic_rate: None,
            homeowner_rate: None,
            disability_rate: None,
            produce_lbs: None,
            all_food_lbs: None,
        }
    }

    fn rates(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("food_insecurity_rate", self.food_insecurity_rate),
            ("poverty_rate", self.poverty_rate),
            ("unemployment_rate", self.unemployment_rate),
            ("black_rate", self.black_rate),
            ("hispanic_rate", self.hispanic_rate),
            ("homeowner_rate", self.homeowner_rate),
            ("disability_rate", self.disability_rate),
        ]
    }

    fn absolutes(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("population", self.population),
            ("food_insecure_count", self.food_insecure_count),
            ("median_income", self.median_income),
            ("produce_lbs", self.produce_lbs),
            ("all_food_lbs", self.all_food_lbs),
        ]
    }

    /// Reports rate fields outside `[0, 1]` and negative absolute fields.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let bad_rates = self
            .rates()
            .into_iter()
            .filter_map(|(field, v)| v.map(|value| (field, value)))
            .filter(|(_, v)| !(0.0..=1.0).contains(v));

        let bad_absolutes = self
            .absolutes()
            .into_iter()
            .filter_map(|(field, v)| v.map(|value| (field, value)))
            .filter(|(_, v)| *v < 0.0);

        bad_rates
            .chain(bad_absolutes)
            .map(|(field, value)| ValidationIssue { field, value })
            .collect()
    }
}

impl Entity for ZipRegion {
    const COLLECTION: &'static str = "zips";
    const LABEL: &'static str = "zip region";

    fn from_raw(value: &serde_json::Value) -> Result<Self, RecordError> {
        let obj = value.as_object().ok_or(RecordError::NotAnObject {
            entity: Self::LABEL,
        })?;
        let obj = raw::trim_keys(obj);

        let geography = raw::string_field(&obj, &["geography", "Geography", "zip", "ZCTA5CE10"])
            .ok_or(RecordError::MissingField {
                entity: Self::LABEL,
                field: "geography",
            })?;

        let num = |names: &[&str]| raw::lenient_number_field(&obj, names);

        Ok(Self {
            county: raw::string_field(&obj, &["county", "County"]),
            population: num(&["tot_pop", "population"]),
            food_insecurity_rate: num(&["pct_food_insecure"]),
            food_insecure_count: num(&["number_food_insecure"]),
            poverty_rate: num(&["pct_poverty"]),
            unemployment_rate: num(&["unemployment_rate"]),
            median_income: num(&["median_income"]),
            black_rate: num(&["pct_black"]),
            hispanic_rate: num(&["pct_hispanic"]),
            homeowner_rate: num(&["pct_homeowners"]),
            disability_rate: num(&["pct_disability"]),
            produce_lbs: num(&["Produce", "produce"]),
            all_food_lbs: num(&["all", "All"]),
            geography,
        })
    }

    fn id(&self) -> &str {
        &self.geography
    }
}
