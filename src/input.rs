//! Common routines for handling input data.
use crate::interpolation::{
    DEFAULT_STEEPNESS, InterpolationFunction, InterpolationRule, OverwritePolicy, fill_series,
};
use crate::model::{Model, ModelParameters};
use crate::period::{Horizon, PeriodVector};
use crate::technology_database::GlobalTechnologyDatabase;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub mod sector;
use sector::read_sector;
pub mod subsector;
pub mod technology;
use technology::read_technology_templates;

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Indicates whether an iterator is sorted and unique
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().tuple_windows().all(|(a, b)| a < b)
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value is not between 0 and 1"))?;
    }

    Ok(value)
}

/// A value for one model year
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct YearValue {
    /// The model year
    pub year: u32,
    /// The value
    pub value: f64,
}

/// Check that values are given for distinct model years, in order
fn check_years(what: &str, values: &[YearValue], horizon: &Horizon) -> Result<()> {
    ensure!(
        is_sorted_and_unique(values.iter().map(|value| value.year)),
        "Years for {what} must be unique and in order"
    );
    for value in values {
        horizon
            .period_of(value.year)
            .with_context(|| format!("Invalid year for {what}"))?;
    }

    Ok(())
}

/// A value for every period, filled in between the given years.
///
/// Values between given years are linearly interpolated and values before the first or after the
/// last given year are held constant.
pub fn dense_series(
    what: &str,
    values: &[YearValue],
    horizon: &Horizon,
) -> Result<PeriodVector<f64>> {
    ensure!(!values.is_empty(), "No values given for {what}");
    check_years(what, values, horizon)?;

    let anchors: Vec<_> = values.iter().map(|value| (value.year, value.value)).collect();
    Ok(fill_series(&anchors, horizon.years()).into())
}

/// Like [`dense_series`], but every period takes `default` if no values are given
pub fn dense_series_or(
    what: &str,
    values: &[YearValue],
    horizon: &Horizon,
    default: f64,
) -> Result<PeriodVector<f64>> {
    if values.is_empty() {
        return Ok(PeriodVector::filled(horizon.len(), default));
    }

    dense_series(what, values, horizon)
}

/// A value for each period for which one is given, without filling in
pub fn sparse_series(
    what: &str,
    values: &[YearValue],
    horizon: &Horizon,
) -> Result<PeriodVector<Option<f64>>> {
    check_years(what, values, horizon)?;

    let mut series = PeriodVector::filled(horizon.len(), None);
    for value in values {
        series[horizon.period_of(value.year)?] = Some(value.value);
    }

    Ok(series)
}

/// Write a dense series back out with a value for every model year
pub fn dense_to_input<I>(values: I, horizon: &Horizon) -> Vec<YearValue>
where
    I: IntoIterator<Item = f64>,
{
    horizon
        .years()
        .iter()
        .zip(values)
        .map(|(&year, value)| YearValue { year, value })
        .collect()
}

/// Write a sparse series back out, skipping periods without a value
pub fn sparse_to_input<I>(values: I, horizon: &Horizon) -> Vec<YearValue>
where
    I: IntoIterator<Item = Option<f64>>,
{
    horizon
        .years()
        .iter()
        .zip(values)
        .filter_map(|(&year, value)| Some(YearValue { year, value: value? }))
        .collect()
}

fn default_steepness() -> f64 {
    DEFAULT_STEEPNESS
}

/// An interpolation rule as given in input files, in terms of model years
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InterpolationRuleInput {
    /// First model year covered by the rule
    pub from_year: u32,
    /// Last model year covered by the rule
    pub to_year: u32,
    /// Starting value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_value: Option<f64>,
    /// End value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_value: Option<f64>,
    /// The transition function
    pub function: InterpolationFunction,
    /// Steepness of an S-curve
    #[serde(default = "default_steepness")]
    pub steepness: f64,
    /// Whether explicitly given values may be replaced
    #[serde(default)]
    pub overwrite: OverwritePolicy,
}

impl InterpolationRuleInput {
    /// Convert into an [`InterpolationRule`] over model periods
    pub fn into_rule(self, horizon: &Horizon) -> Result<InterpolationRule> {
        ensure!(
            self.from_year <= self.to_year,
            "Interpolation rule range is malformed: start year {} is after end year {}",
            self.from_year,
            self.to_year
        );
        let rule = InterpolationRule {
            from_period: horizon.period_of(self.from_year)?,
            to_period: horizon.period_of(self.to_year)?,
            from_value: self.from_value,
            to_value: self.to_value,
            function: self.function,
            steepness: self.steepness,
            overwrite: self.overwrite,
        };
        rule.validate()?;

        Ok(rule)
    }

    /// Write a rule back out in terms of model years
    pub fn from_rule(rule: &InterpolationRule, horizon: &Horizon) -> Self {
        let years = horizon.years();
        Self {
            from_year: years[rule.from_period],
            to_year: years[rule.to_period],
            from_value: rule.from_value,
            to_value: rule.to_value,
            function: rule.function,
            steepness: rule.steepness,
            overwrite: rule.overwrite,
        }
    }
}

/// Convert a list of rules read from input
pub fn interpolation_rules(
    what: &str,
    rules: Vec<InterpolationRuleInput>,
    horizon: &Horizon,
) -> Result<Vec<InterpolationRule>> {
    rules
        .into_iter()
        .map(|rule| rule.into_rule(horizon))
        .collect::<Result<_>>()
        .with_context(|| format!("Invalid interpolation rule for {what}"))
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The model and the technology templates it uses, or an error if the model is invalid.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<(Model, GlobalTechnologyDatabase)> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;
    let horizon = Horizon::new(parameters.years.clone())?;
    let database = read_technology_templates(model_dir)?;
    let sector = read_sector(model_dir, &parameters.region, &horizon)?;

    let mut model = Model::new(model_dir, parameters, horizon, sector)?;
    model.complete_init(&database)?;

    Ok((model, database))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, horizon};
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        a: u32,
        b: String,
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "a = 1\nb = \"hello\"").unwrap();
        }

        assert_eq!(
            read_toml::<Record>(&file_path).unwrap(),
            Record {
                a: 1,
                b: "hello".to_string()
            }
        );

        // File doesn't exist
        assert!(read_toml::<Record>(&dir.path().join("missing.toml")).is_err());
    }

    #[derive(Debug, Deserialize)]
    struct Proportion {
        #[serde(deserialize_with = "deserialise_proportion")]
        value: f64,
    }

    #[rstest]
    #[case("value = 0.0", true)]
    #[case("value = 0.5", true)]
    #[case("value = 1.0", true)]
    #[case("value = -1.0", false)]
    #[case("value = 1.5", false)]
    fn test_deserialise_proportion(#[case] toml_str: &str, #[case] valid: bool) {
        let result = toml::from_str::<Proportion>(toml_str);
        assert_eq!(result.is_ok(), valid);
        if let Ok(proportion) = result {
            assert!((0.0..=1.0).contains(&proportion.value));
        }
    }

    #[test]
    fn test_is_sorted_and_unique() {
        assert!(is_sorted_and_unique([1, 2, 3]));
        assert!(is_sorted_and_unique(Vec::<u32>::new()));
        assert!(!is_sorted_and_unique([1, 1]));
        assert!(!is_sorted_and_unique([2, 1]));
    }

    fn year_values(values: &[(u32, f64)]) -> Vec<YearValue> {
        values
            .iter()
            .map(|&(year, value)| YearValue { year, value })
            .collect()
    }

    #[rstest]
    fn test_dense_series(horizon: Horizon) {
        let series = dense_series("demand", &year_values(&[(2010, 1.0), (2020, 3.0)]), &horizon);
        assert_eq!(series.unwrap().as_slice(), [1.0, 1.0, 2.0, 3.0]);

        assert_error!(
            dense_series("demand", &[], &horizon),
            "No values given for demand"
        );
        assert_error!(
            dense_series("demand", &year_values(&[(2011, 1.0)]), &horizon),
            "Invalid year for demand"
        );
        assert_error!(
            dense_series("demand", &year_values(&[(2010, 1.0), (2005, 1.0)]), &horizon),
            "Years for demand must be unique and in order"
        );
    }

    #[rstest]
    fn test_sparse_series(horizon: Horizon) {
        let series = sparse_series("weights", &year_values(&[(2010, 0.5)]), &horizon).unwrap();
        assert_eq!(series.as_slice(), [None, Some(0.5), None, None]);
        assert_eq!(
            sparse_to_input(series.iter().copied(), &horizon),
            year_values(&[(2010, 0.5)])
        );
    }

    #[rstest]
    fn test_interpolation_rule_input(horizon: Horizon) {
        let input = InterpolationRuleInput {
            from_year: 2010,
            to_year: 2020,
            from_value: None,
            to_value: Some(2.0),
            function: InterpolationFunction::Linear,
            steepness: DEFAULT_STEEPNESS,
            overwrite: OverwritePolicy::Never,
        };
        let rule = input.clone().into_rule(&horizon).unwrap();
        assert_eq!(rule.from_period, 1);
        assert_eq!(rule.to_period, 3);
        assert_eq!(InterpolationRuleInput::from_rule(&rule, &horizon), input);

        let backwards = InterpolationRuleInput {
            from_year: 2020,
            to_year: 2010,
            ..input
        };
        assert_error!(
            backwards.into_rule(&horizon),
            "Interpolation rule range is malformed: start year 2020 is after end year 2010"
        );
    }
}
