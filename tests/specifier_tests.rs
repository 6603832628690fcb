//! Tests for production specifiers.

use ecocalc::data::load_economy_str;
use ecocalc::economy::EconomyDefinition;
use ecocalc::error::ResolveError;
use ecocalc::models::RateUnit;
use ecocalc::numeric::{int, ratio};
use ecocalc::resolver::ComputationMode;
use ecocalc::specifier::{ProductionSpecifier, SpecifierTarget};

fn belt_economy() -> EconomyDefinition {
    load_economy_str(
        r#"{
            "resources": { "c": { "name": "C" } },
            "rate_scalars": {
                "yellow_belt": { "unit": "ups", "value": 15 },
                "red_belt": { "unit": "upm", "value": 1800 }
            }
        }"#,
    )
    .expect("belt economy is valid")
}

#[test]
fn test_rate_scalar_quantity() {
    let economy = belt_economy();
    let spec = ProductionSpecifier::parse("2:yellow_belt c", &economy).unwrap();

    let quantity = spec
        .target_quantity(ComputationMode::Rate, RateUnit::UnitsPerMinute)
        .unwrap();

    assert_eq!(quantity, int(30));
}

#[test]
fn test_upm_rate_scalar_is_converted() {
    let economy = belt_economy();
    let spec = ProductionSpecifier::parse(":red_belt c", &economy).unwrap();

    let quantity = spec
        .target_quantity(ComputationMode::Rate, RateUnit::UnitsPerSecond)
        .unwrap();

    assert_eq!(quantity, int(30));
}

#[test]
fn test_bare_value_is_read_in_rate_unit() {
    let economy = belt_economy();
    let spec = ProductionSpecifier::parse("90 c", &economy).unwrap();

    assert_eq!(
        spec.target_quantity(ComputationMode::Rate, RateUnit::UnitsPerMinute).unwrap(),
        ratio(3, 2)
    );
    assert_eq!(
        spec.target_quantity(ComputationMode::Rate, RateUnit::UnitsPerSecond).unwrap(),
        int(90)
    );
    assert_eq!(
        spec.target_quantity(ComputationMode::Count, RateUnit::UnitsPerMinute).unwrap(),
        int(90)
    );
}

#[test]
fn test_missing_value_defaults_to_one() {
    let spec = ProductionSpecifier::for_resource("c", None);

    assert_eq!(
        spec.target_quantity(ComputationMode::Count, RateUnit::UnitsPerMinute).unwrap(),
        int(1)
    );
}

#[test]
fn test_rate_scalar_rejected_in_count_mode() {
    let economy = belt_economy();
    let spec = ProductionSpecifier::parse(":yellow_belt c", &economy).unwrap();

    let err = spec
        .target_quantity(ComputationMode::Count, RateUnit::UnitsPerMinute)
        .unwrap_err();

    assert!(matches!(err, ResolveError::RateScalarInCountMode(ref name) if name == "yellow_belt"));
}

#[test]
fn test_unknown_rate_scalar() {
    let economy = belt_economy();

    let err = ProductionSpecifier::parse(":blue_belt c", &economy).unwrap_err();

    assert!(matches!(err, ResolveError::UnknownRateScalar(ref name) if name == "blue_belt"));
}

#[test]
fn test_parse_error_is_wrapped() {
    let economy = belt_economy();

    let err = ProductionSpecifier::parse("c @", &economy).unwrap_err();

    assert!(matches!(err, ResolveError::Parse(_)));
}

#[test]
fn test_recipe_number_target() {
    let economy = belt_economy();
    let spec = ProductionSpecifier::parse("#3", &economy).unwrap();

    assert_eq!(spec.target, SpecifierTarget::RecipeNumber(3));
    assert!(!spec.references_resource());
}

#[test]
fn test_specifier_display() {
    let economy = belt_economy();
    let spec = ProductionSpecifier::parse("3/2:red_belt c @x 50%", &economy).unwrap();

    assert_eq!(spec.to_string(), "3/2:red_belt c @x 1/2");
    assert_eq!(ProductionSpecifier::for_resource("c", None).to_string(), "c");
}

#[test]
fn test_scaled_specifier() {
    let economy = belt_economy();
    let spec = ProductionSpecifier::parse(":yellow_belt c", &economy).unwrap();

    let scaled = spec.scaled(&ratio(2, 3));

    assert_eq!(scaled.value, Some(ratio(2, 3)));
    assert_eq!(scaled.rate_scalar, spec.rate_scalar);
    assert_eq!(
        scaled.target_quantity(ComputationMode::Rate, RateUnit::UnitsPerSecond).unwrap(),
        int(10)
    );
}
