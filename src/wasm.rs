//! WebAssembly bindings for ecocalc.
//!
//! This module provides JavaScript-accessible functions for the recipe
//! resolver. Every function takes and returns JSON strings.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::data::load_economy_value;
use crate::display::{format_recipe, CardinalityFormat, DisplayPreferences, Report};
use crate::models::RateUnit;
use crate::numeric::parse_rational;
use crate::resolver::{ComputationMode, RecipeResolver, ResolverOptions};
use crate::specifier::ProductionSpecifier;

/// JavaScript-friendly input for resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct JsResolveInput {
    /// Economy definition document
    pub economy: serde_json::Value,
    /// Production specifier strings
    pub specifiers: Vec<String>,
    #[serde(default)]
    pub mode: ComputationMode,
    #[serde(default)]
    pub rate_unit: RateUnit,
    #[serde(default)]
    pub cardinality_format: CardinalityFormat,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub stop: Vec<String>,
    /// Rational literal the result is multiplied by
    #[serde(default)]
    pub multiply: Option<String>,
    /// Scale the result to whole facility counts
    #[serde(default)]
    pub round_up: bool,
}

/// JavaScript-friendly resolution result.
#[derive(Debug, Clone, Serialize)]
pub struct JsResolveResult {
    pub success: bool,
    pub error: Option<String>,
    pub report: Option<Report>,
}

impl JsResolveResult {
    fn failure(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            report: None,
        }
    }
}

/// JavaScript-friendly recipe listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct JsRecipeInfo {
    pub number: usize,
    pub recipe: String,
    pub name: Option<String>,
    pub at: String,
    pub time: Option<String>,
}

fn run_resolution(input: JsResolveInput) -> Result<Report, String> {
    let economy = load_economy_value(input.economy).map_err(|e| e.to_string())?;

    let specifiers = input
        .specifiers
        .iter()
        .map(|text| ProductionSpecifier::parse(text, &economy))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;

    let mut options = ResolverOptions::new(input.mode)
        .with_rate_unit(input.rate_unit)
        .with_stop_resources(input.stop);
    options.tier = input.tier;

    let resolver = RecipeResolver::new(&economy, options).map_err(|e| e.to_string())?;
    let mut sum = resolver.resolve(&specifiers).map_err(|e| e.to_string())?;

    let mut factor = None;
    if let Some(multiply) = &input.multiply {
        let value = parse_rational(multiply)
            .ok_or_else(|| format!("Invalid multiplier: {}", multiply))?;
        sum.multiply(&value).map_err(|e| e.to_string())?;
        factor = Some(value);
    }
    if input.round_up {
        let rounding = sum.round_up_to_integral();
        factor = Some(factor.map_or(rounding.clone(), |value| value * rounding));
    }

    let prefs = DisplayPreferences::new(input.mode, input.rate_unit, input.cardinality_format);
    let report = Report::new(&sum, &economy, &prefs);
    Ok(match factor {
        Some(factor) => report.with_scale_factor(&factor),
        None => report,
    })
}

/// Resolve production specifiers against an economy definition.
///
/// Takes a JSON string input and returns a JSON string result.
#[wasm_bindgen]
pub fn resolve(input_json: &str) -> String {
    let input: JsResolveInput = match serde_json::from_str(input_json) {
        Ok(i) => i,
        Err(e) => {
            return serde_json::to_string(&JsResolveResult::failure(format!("Invalid input: {}", e)))
                .unwrap_or_default();
        }
    };

    let result = match run_resolution(input) {
        Ok(report) => JsResolveResult {
            success: true,
            error: None,
            report: Some(report),
        },
        Err(error) => JsResolveResult::failure(error),
    };
    serde_json::to_string(&result).unwrap_or_default()
}

/// Get the version of the resolver.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// List the recipes of an economy definition with their `#N` numbers.
/// Returns a JSON array, or an empty array if the definition is invalid.
#[wasm_bindgen]
pub fn get_recipes(economy_json: &str) -> String {
    let economy = match serde_json::from_str(economy_json)
        .map_err(|e| e.to_string())
        .and_then(|value| load_economy_value(value).map_err(|e| e.to_string()))
    {
        Ok(economy) => economy,
        Err(_) => return "[]".to_string(),
    };

    let recipes: Vec<JsRecipeInfo> = economy
        .recipes()
        .iter()
        .enumerate()
        .map(|(index, recipe)| JsRecipeInfo {
            number: index + 1,
            recipe: format_recipe(recipe, &economy),
            name: recipe.name.clone(),
            at: recipe.at.clone(),
            time: recipe.execution_time.as_ref().map(ToString::to_string),
        })
        .collect();

    serde_json::to_string(&recipes).unwrap_or_default()
}
