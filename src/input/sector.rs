//! Code for reading the sector file.
use super::subsector::SubsectorInput;
use super::{YearValue, dense_series, input_err_msg, read_toml};
use crate::competition::LogitConvention;
use crate::id::{RegionID, SectorID};
use crate::period::Horizon;
use crate::sector::{Sector, SectorConfig};
use crate::subsector::Subsector;
use crate::units::{Energy, MoneyPerEnergy};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const SECTOR_FILE_NAME: &str = "sector.toml";

/// The contents of the sector file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectorInput {
    /// The sector's name
    pub name: SectorID,
    /// Logit exponent for competition between subsectors
    pub logit_exponent: Vec<YearValue>,
    /// How the logit exponent is written
    #[serde(default)]
    pub logit_convention: LogitConvention,
    /// Demand for the sector's output
    pub demand: Vec<YearValue>,
    /// Market price of the sector's output
    pub price: Vec<YearValue>,
    /// The competing subsectors
    #[serde(default)]
    pub subsectors: Vec<SubsectorInput>,
}

impl SectorInput {
    /// Convert into a [`Sector`] and its subsectors, checking everything against the horizon
    pub fn into_sector(self, region: &RegionID, horizon: &Horizon) -> Result<Sector> {
        let id = self.name;
        let what = format!("sector {id}");
        let config = SectorConfig {
            region: region.clone(),
            logit_exponent: dense_series(
                &format!("logit exponent of {what}"),
                &self.logit_exponent,
                horizon,
            )?,
            logit_convention: self.logit_convention,
            demand: dense_series(&format!("demand for {what}"), &self.demand, horizon)?
                .iter()
                .map(|&demand| Energy(demand))
                .collect::<Vec<_>>()
                .into(),
            price: dense_series(&format!("price for {what}"), &self.price, horizon)?
                .iter()
                .map(|&price| MoneyPerEnergy(price))
                .collect::<Vec<_>>()
                .into(),
            id,
        };

        let subsectors = self
            .subsectors
            .into_iter()
            .map(|input| {
                let subsector_id = input.name.clone();
                let subsector_config = input.into_config(region, &config.id, horizon)?;
                Subsector::new(subsector_config, horizon.clone())
                    .with_context(|| format!("Invalid subsector {subsector_id}"))
            })
            .collect::<Result<_>>()?;

        Sector::new(config, horizon.clone(), subsectors)
    }
}

/// Read the sector and its subsectors from the model directory
pub fn read_sector(model_dir: &Path, region: &RegionID, horizon: &Horizon) -> Result<Sector> {
    let file_path = model_dir.join(SECTOR_FILE_NAME);
    let input: SectorInput = read_toml(&file_path)?;

    input
        .into_sector(region, horizon)
        .with_context(|| input_err_msg(&file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::horizon;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const SECTOR_TOML: &str = r#"
name = "electricity"
logit_exponent = [{ year = 2005, value = -3.0 }]
demand = [{ year = 2005, value = 100.0 }, { year = 2020, value = 160.0 }]
price = [{ year = 2005, value = 30.0 }]

[[subsectors]]
name = "fossil"
logit_exponent = [{ year = 2005, value = -6.0 }]

[[subsectors.technologies]]
name = "coal"
lifetime = 30
cost = [{ year = 2005, value = 10.0 }]
"#;

    #[rstest]
    fn test_read_sector(horizon: Horizon) {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SECTOR_FILE_NAME)).unwrap();
            write!(file, "{SECTOR_TOML}").unwrap();
        }

        let sector = read_sector(dir.path(), &"GBR".into(), &horizon).unwrap();
        assert_eq!(sector.id(), &"electricity".into());
        assert_approx_eq!(Energy, sector.demand(2), Energy(140.0));
        assert_eq!(sector.subsectors().len(), 1);
        assert_eq!(sector.subsectors()[0].sector(), &"electricity".into());
    }

    #[rstest]
    fn test_read_sector_duplicate_subsector(horizon: Horizon) {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SECTOR_FILE_NAME)).unwrap();
            let subsector = SECTOR_TOML.split_once("[[subsectors]]").unwrap().1;
            write!(file, "{SECTOR_TOML}\n[[subsectors]]{subsector}").unwrap();
        }

        assert!(read_sector(dir.path(), &"GBR".into(), &horizon).is_err());
    }
}
