//! Tests for recipe resolution.

use ecocalc::data::load_economy_str;
use ecocalc::economy::EconomyDefinition;
use ecocalc::error::ResolveError;
use ecocalc::models::RateUnit;
use ecocalc::numeric::{int, ratio, Rational};
use ecocalc::resolver::{ComputationMode, RecipeResolver, ResolverOptions};
use ecocalc::specifier::ProductionSpecifier;
use proptest::prelude::*;

fn scenario_economy() -> EconomyDefinition {
    load_economy_str(
        r#"{
            "resources": {
                "a": { "name": "A" }, "b": { "name": "B" }, "c": { "name": "C" },
                "d": { "name": "D" }, "e": { "name": "E" }
            },
            "production_entities": {
                "x": { "name": "X", "speed_factor": 0.75 },
                "y": { "name": "Y", "speed_factor": 1.25 },
                "z": { "name": "Z", "speed_factor": 10 }
            },
            "rate_scalars": {
                "yellow_belt": { "unit": "ups", "value": 15 },
                "red_belt": { "unit": "upm", "value": 1800 }
            },
            "recipes": [
                { "recipe": "12 a + 7 b -> 13 c", "at": "x", "time": 9 }
            ]
        }"#,
    )
    .expect("scenario economy is valid")
}

fn chain_economy() -> EconomyDefinition {
    load_economy_str(
        r#"{
            "resources": {
                "ore": { "name": "Ore" }, "plate": { "name": "Plate" },
                "gear": { "name": "Gear" }, "coal": { "name": "Coal" }
            },
            "production_entities": {
                "furnace": { "name": "Furnace", "speed_factor": 1 },
                "assembler": { "name": "Assembler", "min_speed_factor": 0.5, "max_speed_factor": 2 }
            },
            "recipes": [
                { "recipe": "plate + coal -> plate + 2 coal", "at": "furnace", "time": 1 },
                { "recipe": "ore -> plate", "at": "furnace", "time": 2 },
                { "recipe": "2 plate -> gear", "at": "assembler", "time": 1 },
                { "recipe": "3 ore -> 2 gear", "at": "assembler" }
            ]
        }"#,
    )
    .expect("chain economy is valid")
}

fn rate_options() -> ResolverOptions {
    ResolverOptions::new(ComputationMode::Rate).with_rate_unit(RateUnit::UnitsPerSecond)
}

fn count(resource: &str, value: i64) -> ProductionSpecifier {
    ProductionSpecifier::for_resource(resource, Some(int(value)))
}

// ============================================================================
// Concrete scenario
// ============================================================================

#[test]
fn test_yellow_belt_of_c() {
    let economy = scenario_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();
    let request = ProductionSpecifier::parse(":yellow_belt c", &economy).unwrap();

    let sum = resolver.resolve(&[request]).unwrap();
    assert_eq!(sum.len(), 1);

    let production = &sum.productions()[0];
    assert_eq!(production.cardinality(), &ratio(180, 13));
    assert_eq!(production.production_speed(), &ratio(3, 4));
    assert_eq!(production.production_entity().identifier, "x");
    assert_eq!(
        production.lhs().collect::<Vec<_>>(),
        vec![("a", ratio(180, 13)), ("b", ratio(105, 13))]
    );
    assert_eq!(production.rhs().collect::<Vec<_>>(), vec![("c", int(15))]);
}

#[test]
fn test_irreducible_ingredients_become_base_inputs() {
    let economy = scenario_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();
    let request = ProductionSpecifier::parse(":yellow_belt c", &economy).unwrap();

    let sum = resolver.resolve(&[request]).unwrap();

    assert_eq!(
        sum.base_inputs(),
        &[
            ("a".to_string(), ratio(180, 13)),
            ("b".to_string(), ratio(105, 13))
        ]
    );
}

#[test]
fn test_rate_round_trip() {
    let economy = scenario_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();

    for target in [int(1), ratio(7, 3), int(15), int(1000)] {
        let production = resolver.produce_resource("c", &target).unwrap().unwrap();
        let produced: Vec<_> = production.rhs().collect();
        assert_eq!(produced, vec![("c", target)]);
    }
}

#[test]
fn test_bare_value_uses_rate_unit() {
    let economy = scenario_economy();
    let per_minute = ResolverOptions::new(ComputationMode::Rate);
    let resolver = RecipeResolver::new(&economy, per_minute).unwrap();

    let sum = resolver.resolve(&[count("c", 900)]).unwrap();

    assert_eq!(sum.productions()[0].cardinality(), &ratio(180, 13));
}

#[test]
fn test_upm_rate_scalar() {
    let economy = scenario_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();
    let request = ProductionSpecifier::parse(":red_belt c", &economy).unwrap();

    let sum = resolver.resolve(&[request]).unwrap();

    assert_eq!(sum.productions()[0].cardinality(), &ratio(360, 13));
}

#[test]
fn test_leaf_resource_has_no_production() {
    let economy = scenario_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();

    assert!(resolver.get_recipe_which_produces("a").is_none());
    assert!(resolver.produce_resource("a", &int(1)).unwrap().is_none());
}

#[test]
fn test_top_level_irreducible_request() {
    let economy = scenario_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();

    let sum = resolver.resolve(&[count("d", 4)]).unwrap();

    assert!(sum.is_empty());
    assert_eq!(sum.base_inputs(), &[("d".to_string(), int(4))]);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unknown_resource() {
    let economy = scenario_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();

    let err = resolver.resolve(&[count("unobtainium", 1)]).unwrap_err();

    assert!(matches!(err, ResolveError::UnknownResource(ref id) if id == "unobtainium"));
}

#[test]
fn test_recipe_number_not_supported() {
    let economy = scenario_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();
    let request = ProductionSpecifier::parse("2 #1", &economy).unwrap();

    let err = resolver.resolve(&[request]).unwrap_err();

    assert!(matches!(err, ResolveError::RecipeNumberNotSupported(1)));
}

#[test]
fn test_unknown_rate_scalar() {
    let economy = scenario_economy();

    let err = ProductionSpecifier::parse(":blue_belt c", &economy).unwrap_err();

    assert!(matches!(err, ResolveError::UnknownRateScalar(ref id) if id == "blue_belt"));
}

#[test]
fn test_rate_scalar_in_count_mode() {
    let economy = scenario_economy();
    let resolver = RecipeResolver::new(&economy, ResolverOptions::new(ComputationMode::Count)).unwrap();
    let request = ProductionSpecifier::parse(":yellow_belt c", &economy).unwrap();

    let err = resolver.resolve(&[request]).unwrap_err();

    assert!(matches!(err, ResolveError::RateScalarInCountMode(_)));
}

#[test]
fn test_unknown_tier() {
    let economy = scenario_economy();

    let err = RecipeResolver::new(&economy, rate_options().with_tier("late")).unwrap_err();

    assert!(matches!(err, ResolveError::UnknownTier(ref id) if id == "late"));
}

#[test]
fn test_unknown_production_entity() {
    let economy = load_economy_str(
        r#"{
            "resources": { "a": { "name": "A" }, "b": { "name": "B" } },
            "recipes": [ { "recipe": "a -> b", "at": "nowhere", "time": 1 } ]
        }"#,
    )
    .unwrap();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();

    let err = resolver.resolve(&[count("b", 1)]).unwrap_err();

    assert!(matches!(err, ResolveError::UnknownProductionEntity(ref id) if id == "nowhere"));
}

#[test]
fn test_speed_override_out_of_range() {
    let economy = chain_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();
    let request = ProductionSpecifier::parse("1 gear 300%", &economy).unwrap();

    let err = resolver.resolve(&[request]).unwrap_err();

    assert!(matches!(err, ResolveError::SpeedOutOfRange { ref entity, .. } if entity == "assembler"));
}

#[test]
fn test_multi_recipe_cycle_is_reported() {
    let economy = load_economy_str(
        r#"{
            "resources": { "a": { "name": "A" }, "b": { "name": "B" } },
            "production_entities": { "x": { "name": "X" } },
            "recipes": [
                { "recipe": "a -> b", "at": "x", "time": 1 },
                { "recipe": "b -> a", "at": "x", "time": 1 }
            ]
        }"#,
    )
    .unwrap();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();

    let err = resolver.resolve(&[count("b", 1)]).unwrap_err();

    match err {
        ResolveError::CyclicDependency(path) => assert_eq!(path, vec!["b", "a", "b"]),
        other => panic!("unexpected error: {}", other),
    }
}

// ============================================================================
// Recipe filtering and facility selection
// ============================================================================

#[test]
fn test_cyclic_recipes_are_excluded() {
    let economy = chain_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();

    assert!(resolver.recipes().iter().all(|recipe| !recipe.is_cyclic()));
    // The self-referencing recipe is declared first but never chosen
    let recipe = resolver.get_recipe_which_produces("plate").unwrap();
    assert_eq!(recipe.to_string(), "ore -> plate");
    // Coal is only produced by the excluded recipe
    assert!(resolver.get_recipe_which_produces("coal").is_none());
}

#[test]
fn test_rate_mode_excludes_recipes_without_time() {
    let economy = chain_economy();
    let rate = RecipeResolver::new(&economy, rate_options()).unwrap();
    let count = RecipeResolver::new(&economy, ResolverOptions::new(ComputationMode::Count)).unwrap();

    assert_eq!(rate.recipes().len(), 2);
    assert_eq!(count.recipes().len(), 3);
}

#[test]
fn test_first_declared_recipe_wins() {
    let economy = chain_economy();
    let resolver = RecipeResolver::new(&economy, ResolverOptions::new(ComputationMode::Count)).unwrap();

    let recipe = resolver.get_recipe_which_produces("gear").unwrap();

    assert_eq!(recipe.to_string(), "2 plate -> gear");
}

fn tiered_economy() -> EconomyDefinition {
    load_economy_str(
        r#"{
            "resources": { "a": { "name": "A" }, "b": { "name": "B" } },
            "production_entities": {
                "t1_member": { "name": "T1", "speed_factor": 1, "tag": "t1" },
                "t2_member": { "name": "T2", "speed_factor": 2, "tag": "t2" }
            },
            "production_entity_groups": { "g": [ "t1_member", "t2_member" ] },
            "tiers": { "only_t2": "t2", "both": "t1 + t2", "none": "t3" },
            "recipes": [ { "recipe": "a -> b", "at": "g", "time": 1 } ]
        }"#,
    )
    .expect("tiered economy is valid")
}

#[test]
fn test_tier_selects_first_enabled_member() {
    let economy = tiered_economy();

    let only_t2 = RecipeResolver::new(&economy, rate_options().with_tier("only_t2")).unwrap();
    let both = RecipeResolver::new(&economy, rate_options().with_tier("both")).unwrap();
    let untiered = RecipeResolver::new(&economy, rate_options()).unwrap();

    assert_eq!(only_t2.find_production_entity("g").unwrap().identifier, "t2_member");
    assert_eq!(both.find_production_entity("g").unwrap().identifier, "t1_member");
    assert_eq!(untiered.find_production_entity("g").unwrap().identifier, "t1_member");
}

#[test]
fn test_tier_affects_cardinality() {
    let economy = tiered_economy();
    let resolver = RecipeResolver::new(&economy, rate_options().with_tier("only_t2")).unwrap();

    let sum = resolver.resolve(&[count("b", 4)]).unwrap();

    assert_eq!(sum.productions()[0].cardinality(), &int(2));
}

#[test]
fn test_no_eligible_entity() {
    let economy = tiered_economy();
    let resolver = RecipeResolver::new(&economy, rate_options().with_tier("none")).unwrap();

    let err = resolver.find_production_entity("g").unwrap_err();

    assert!(matches!(
        err,
        ResolveError::NoEligibleEntity { ref group, ref tier } if group == "g" && tier == "none"
    ));
}

#[test]
fn test_direct_entity_ignores_tier() {
    let economy = tiered_economy();
    let resolver = RecipeResolver::new(&economy, rate_options().with_tier("none")).unwrap();

    assert_eq!(resolver.find_production_entity("t1_member").unwrap().identifier, "t1_member");
}

// ============================================================================
// Recursive expansion
// ============================================================================

#[test]
fn test_count_mode_chain() {
    let economy = chain_economy();
    let resolver = RecipeResolver::new(&economy, ResolverOptions::new(ComputationMode::Count)).unwrap();

    let sum = resolver.resolve(&[count("gear", 10)]).unwrap();
    let productions = sum.productions();

    assert_eq!(productions.len(), 2);
    assert_eq!(productions[0].recipe().to_string(), "2 plate -> gear");
    assert_eq!(productions[0].cardinality(), &int(10));
    assert_eq!(productions[1].recipe().to_string(), "ore -> plate");
    assert_eq!(productions[1].cardinality(), &int(20));
    assert_eq!(sum.base_inputs(), &[("ore".to_string(), int(20))]);
}

#[test]
fn test_rate_mode_chain_uses_max_speed() {
    let economy = chain_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();

    let sum = resolver.resolve(&[count("gear", 4)]).unwrap();
    let productions = sum.productions();

    // 4 gear/s at 2 gear/s per assembler (max speed 2)
    assert_eq!(productions[0].cardinality(), &int(2));
    assert_eq!(productions[0].production_speed(), &int(2));
    // 8 plate/s at 1/2 plate/s per furnace
    assert_eq!(productions[1].cardinality(), &int(16));
    assert_eq!(sum.base_inputs(), &[("ore".to_string(), int(8))]);
}

#[test]
fn test_speed_override_applies_to_top_level_only() {
    let economy = chain_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();
    let request = ProductionSpecifier::parse("4 gear @assembler 50%", &economy).unwrap();

    let sum = resolver.resolve(&[request]).unwrap();
    let productions = sum.productions();

    assert_eq!(productions[0].production_speed(), &ratio(1, 2));
    assert_eq!(productions[0].cardinality(), &int(8));
    assert_eq!(productions[1].production_speed(), &int(1));
    assert_eq!(productions[1].cardinality(), &int(16));
}

#[test]
fn test_facility_override() {
    let economy = chain_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();
    let request = ProductionSpecifier::parse("1 plate @assembler", &economy).unwrap();

    let sum = resolver.resolve(&[request]).unwrap();
    let top = &sum.productions()[0];

    assert_eq!(top.production_entity().identifier, "assembler");
    assert_eq!(top.cardinality(), &int(1));
}

#[test]
fn test_stop_resources_are_not_expanded() {
    let economy = chain_economy();
    let options = ResolverOptions::new(ComputationMode::Count).with_stop_resources(["plate"]);
    let resolver = RecipeResolver::new(&economy, options).unwrap();

    let sum = resolver.resolve(&[count("gear", 10)]).unwrap();

    assert_eq!(sum.len(), 1);
    assert_eq!(sum.base_inputs(), &[("plate".to_string(), int(20))]);
}

#[test]
fn test_repeated_requests_are_merged() {
    let economy = chain_economy();
    let resolver = RecipeResolver::new(&economy, ResolverOptions::new(ComputationMode::Count)).unwrap();

    let sum = resolver
        .resolve(&[count("gear", 10), count("plate", 5), count("gear", 5)])
        .unwrap();
    let productions = sum.productions();

    assert_eq!(productions.len(), 2);
    assert_eq!(productions[0].recipe().to_string(), "2 plate -> gear");
    assert_eq!(productions[0].cardinality(), &int(15));
    assert_eq!(productions[1].cardinality(), &int(35));
    assert_eq!(sum.base_inputs(), &[("ore".to_string(), int(35))]);
}

#[test]
fn test_resolve_is_repeatable() {
    let economy = chain_economy();
    let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();
    let requests = [count("gear", 3)];

    assert_eq!(resolver.resolve(&requests).unwrap(), resolver.resolve(&requests).unwrap());
}

// ============================================================================
// Demo economy
// ============================================================================

fn demo_economy() -> EconomyDefinition {
    load_economy_str(include_str!("../data/demo_economy.json")).expect("demo economy is valid")
}

fn demo_circuits(options: ResolverOptions) -> Vec<(String, String, Rational)> {
    let economy = demo_economy();
    let resolver = RecipeResolver::new(&economy, options).unwrap();
    let request = ProductionSpecifier::parse(":yellow_belt electronic_circuit", &economy).unwrap();
    let sum = resolver.resolve(&[request]).unwrap();
    sum.productions()
        .iter()
        .map(|production| {
            (
                production.recipe().rhs.resources().next().unwrap_or_default().to_string(),
                production.production_entity().identifier.clone(),
                production.cardinality().clone(),
            )
        })
        .collect()
}

#[test]
fn test_demo_circuits_early_tier() {
    let productions = demo_circuits(rate_options().with_tier("early"));

    assert_eq!(
        productions,
        vec![
            ("electronic_circuit".to_string(), "assembler_1".to_string(), int(15)),
            ("iron_plate".to_string(), "stone_furnace".to_string(), int(48)),
            ("copper_cable".to_string(), "assembler_1".to_string(), ratio(45, 2)),
            ("copper_plate".to_string(), "stone_furnace".to_string(), int(72)),
        ]
    );
}

#[test]
fn test_demo_circuits_without_tier() {
    let productions = demo_circuits(rate_options());
    let cardinalities: Vec<Rational> = productions.into_iter().map(|(_, _, c)| c).collect();

    assert_eq!(cardinalities, vec![int(10), int(24), int(15), int(36)]);
}

#[test]
fn test_demo_circuits_base_inputs() {
    let economy = demo_economy();
    let resolver = RecipeResolver::new(&economy, rate_options().with_tier("early")).unwrap();
    let request = ProductionSpecifier::parse(":yellow_belt electronic_circuit", &economy).unwrap();

    let sum = resolver.resolve(&[request]).unwrap();

    assert_eq!(
        sum.base_inputs(),
        &[
            ("iron_ore".to_string(), int(15)),
            ("copper_ore".to_string(), ratio(45, 2)),
        ]
    );
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn test_scaling_law(value in 1i64..500, numer in 1i64..200, denom in 1i64..200) {
        let economy = chain_economy();
        let resolver = RecipeResolver::new(&economy, rate_options()).unwrap();
        let factor: Rational = ratio(numer, denom);
        let request = count("gear", value);

        let mut scaled = resolver.resolve(&[request.clone()]).unwrap();
        scaled *= &factor;
        let direct = resolver.resolve(&[request.scaled(&factor)]).unwrap();

        prop_assert_eq!(scaled, direct);
    }

    #[test]
    fn test_merge_is_idempotent(values in proptest::collection::vec(1i64..100, 1..6)) {
        let economy = chain_economy();
        let resolver = RecipeResolver::new(&economy, ResolverOptions::new(ComputationMode::Count)).unwrap();
        let requests: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(index, value)| count(if index % 2 == 0 { "gear" } else { "plate" }, *value))
            .collect();

        let once = resolver.resolve(&requests).unwrap();
        let mut twice = once.clone();
        twice.merge_recipes();

        prop_assert_eq!(once, twice);
    }
}
