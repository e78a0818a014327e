//! Fixtures for tests

use crate::calibration::CalibrationCheck;
use crate::competition::LogitConvention;
use crate::dependency::DependencyFinder;
use crate::economy::{Demographic, Gdp};
use crate::period::{Horizon, PeriodVector};
use crate::sector::{Sector, SectorConfig};
use crate::subsector::{Subsector, SubsectorConfig};
use crate::technology::{Technology, TechnologyConfig, TechnologyParameters, TechnologyTemplate};
use crate::technology_database::GlobalTechnologyDatabase;
use crate::units::{Energy, Money, MoneyPerEnergy};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn horizon() -> Horizon {
    Horizon::new(vec![2005, 2010, 2015, 2020]).unwrap()
}

#[fixture]
pub fn gdp() -> Gdp {
    let demographic = Demographic::new(vec![10.0, 10.5, 11.0, 11.5].into()).unwrap();
    Gdp::new(
        vec![Money(100.0), Money(110.0), Money(125.0), Money(140.0)].into(),
        &demographic,
    )
    .unwrap()
}

#[fixture]
pub fn calibration_check() -> CalibrationCheck {
    CalibrationCheck {
        accuracy: 1e-3,
        required: false,
        print_warnings: true,
    }
}

/// A coal technology with constant costs, available in every period
#[fixture]
pub fn technology_config() -> TechnologyConfig {
    TechnologyConfig {
        id: "coal".into(),
        template: None,
        parameters: TechnologyParameters {
            fuel: Some("coal".into()),
            efficiency: Some(0.5),
            emissions_coefficient: Some(2.0),
            capital_output_ratio: Some(2.0),
            lifetime: Some(20),
        },
        cost: PeriodVector::filled(4, MoneyPerEnergy(10.0)),
        fuel_price: PeriodVector::filled(4, MoneyPerEnergy(2.0)),
        share_weights: vec![Some(1.0), None, None, None].into(),
        interpolation_rules: Vec::new(),
        fixed_output: PeriodVector::filled(4, None),
        calibration_output: PeriodVector::filled(4, None),
        available: 0..=3,
    }
}

#[fixture]
pub fn technology(technology_config: TechnologyConfig) -> Technology {
    let parameters = technology_config
        .parameters
        .resolve(&technology_config.id)
        .unwrap();
    Technology::new_vintage(&technology_config, parameters, 0, 2005, 1.0)
}

#[fixture]
pub fn technology_database() -> GlobalTechnologyDatabase {
    GlobalTechnologyDatabase::new([TechnologyTemplate {
        id: "coal".into(),
        parameters: TechnologyParameters {
            fuel: Some("coal".into()),
            efficiency: Some(0.4),
            lifetime: Some(30),
            ..Default::default()
        },
    }])
    .unwrap()
}

/// A subsector in which coal competes with a more expensive gas technology
#[fixture]
pub fn subsector_config(technology_config: TechnologyConfig) -> SubsectorConfig {
    let gas = TechnologyConfig {
        id: "gas".into(),
        parameters: TechnologyParameters {
            fuel: Some("gas".into()),
            emissions_coefficient: Some(1.0),
            ..technology_config.parameters.clone()
        },
        cost: PeriodVector::filled(4, MoneyPerEnergy(20.0)),
        fuel_price: PeriodVector::filled(4, MoneyPerEnergy(4.0)),
        ..technology_config.clone()
    };

    SubsectorConfig {
        id: "fossil".into(),
        region: "GBR".into(),
        sector: "electricity".into(),
        share_weights: vec![Some(1.0), None, None, None].into(),
        interpolation_rules: Vec::new(),
        logit_exponent: PeriodVector::filled(4, -6.0),
        logit_convention: LogitConvention::Negative,
        fuel_preference_elasticity: PeriodVector::filled(4, 0.0),
        fixed_investment: PeriodVector::filled(4, None),
        allow_empty: false,
        technologies: vec![technology_config, gas],
    }
}

#[fixture]
pub fn subsector(subsector_config: SubsectorConfig, horizon: Horizon) -> Subsector {
    Subsector::new(subsector_config, horizon).unwrap()
}

#[fixture]
pub fn sector_config() -> SectorConfig {
    SectorConfig {
        id: "electricity".into(),
        region: "GBR".into(),
        logit_exponent: PeriodVector::filled(4, -3.0),
        logit_convention: LogitConvention::Negative,
        demand: vec![Energy(100.0), Energy(120.0), Energy(150.0), Energy(140.0)].into(),
        price: PeriodVector::filled(4, MoneyPerEnergy(30.0)),
    }
}

/// A sector with a single subsector, ready to run
#[fixture]
pub fn sector(
    sector_config: SectorConfig,
    subsector: Subsector,
    horizon: Horizon,
    technology_database: GlobalTechnologyDatabase,
) -> Sector {
    let mut sector = Sector::new(sector_config, horizon, vec![subsector]).unwrap();
    sector
        .complete_init(&technology_database, &mut DependencyFinder::new())
        .unwrap();
    sector
}
