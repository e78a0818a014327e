//! Integration tests which load the demo model and run it without the command line interface.
use float_cmp::assert_approx_eq;
use std::path::Path;
use subsector::input::load_model;
use subsector::settings::Settings;
use subsector::simulation;
use subsector::units::{Energy, Money};

#[test]
fn test_run_demo_model() {
    let (mut model, database) = load_model(Path::new("demos/simple")).unwrap();
    assert_eq!(database.len(), 2);
    assert_eq!(model.years(), [2005, 2010, 2015, 2020, 2025]);
    assert_eq!(model.sector.subsectors().len(), 2);

    let outcomes = simulation::run(&mut model, &Settings::default()).unwrap();
    assert_eq!(outcomes.len(), 5);

    for period in model.horizon.iter_periods() {
        // Demand grows in every period, so it is always met in full
        assert_approx_eq!(
            Energy,
            model.sector.output(period),
            model.sector.demand(period),
            epsilon = 1e-6
        );
        assert!(outcomes[period].placed >= Money(0.0));
    }
}

#[test]
fn test_demo_model_calibrates() {
    let (mut model, _) = load_model(Path::new("demos/simple")).unwrap();
    let settings = Settings {
        require_calibration: true,
        ..Settings::default()
    };
    simulation::run(&mut model, &settings).unwrap();

    let fossil = model.sector.subsector("fossil").unwrap();
    let renewable = model.sector.subsector("renewable").unwrap();
    assert_approx_eq!(Energy, fossil.output(0), Energy(80.0), epsilon = 1e-6);
    assert_approx_eq!(Energy, renewable.output(0), Energy(20.0), epsilon = 1e-6);
}
