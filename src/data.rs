//! Economy definition loading for ecocalc.
//!
//! Loading happens in two phases. The JSON document is first deserialized
//! into the loosely typed row structures below, mirroring the document
//! layout. The rows are then converted into the typed records of
//! [`crate::models`] and handed to [`EconomyDefinition::new`], which checks
//! referential integrity.
//!
//! # Document Format
//!
//! ```json
//! {
//!     "resources": { "iron_ore": { "name": "Iron ore" } },
//!     "production_entities": { "furnace": { "name": "Furnace", "speed_factor": 1, "tag": "t1" } },
//!     "production_entity_groups": { "smelter": [ "furnace" ] },
//!     "rate_scalars": { "yellow_belt": { "unit": "ups", "value": 15 } },
//!     "recipes": [ { "recipe": "iron_ore -> iron_plate", "at": "smelter", "time": 3.2 } ],
//!     "tiers": { "early": "t1" }
//! }
//! ```
//!
//! Every top-level key is optional. Numbers may also be given as strings
//! holding a rational literal such as `"3/4"`; strings are read exactly,
//! while JSON numbers keep only the precision of an `f64`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use num_traits::{One, Signed};
use serde::Deserialize;
use tracing::{info, warn};

use crate::economy::EconomyDefinition;
use crate::error::EconomyError;
use crate::models::{
    ProductionEntity, ProductionEntityGroup, RateScalar, RateUnit, Recipe, RecipeSide, Resource,
    Tier,
};
use crate::numeric::{parse_rational, Rational};
use crate::parser::parse_recipe;

// ============================================================================
// Document Row Structures
// ============================================================================

/// A numeric field: either a JSON number or a string with a rational literal.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberLiteral {
    /// Plain JSON number
    Number(serde_json::Number),
    /// Literal such as `"3/4"` or `"1.25"`
    Text(String),
}

impl NumberLiteral {
    /// Converts the literal into an exact rational.
    ///
    /// JSON numbers are parsed by serde_json into an `f64` and converted
    /// from its shortest round-trip decimal text, so `0.1` becomes `1/10`.
    /// Literals with more significant digits than an `f64` holds should be
    /// written as strings, which are converted exactly.
    pub fn to_rational(&self, field: &str) -> Result<Rational, EconomyError> {
        let text = match self {
            NumberLiteral::Number(number) => number.to_string(),
            NumberLiteral::Text(text) => text.clone(),
        };
        parse_rational(&text).ok_or_else(|| EconomyError::InvalidNumber {
            field: field.to_string(),
            value: text,
        })
    }
}

/// Top-level economy definition document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EconomyDocument {
    /// Resource identifier to resource row
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceRow>,
    /// Production entity identifier to entity row
    #[serde(default)]
    pub production_entities: BTreeMap<String, ProductionEntityRow>,
    /// Group identifier to ordered member identifiers
    #[serde(default)]
    pub production_entity_groups: BTreeMap<String, Vec<String>>,
    /// Rate scalar identifier to rate scalar row
    #[serde(default)]
    pub rate_scalars: BTreeMap<String, RateScalarRow>,
    /// Recipes in declaration order
    #[serde(default)]
    pub recipes: Vec<RecipeRow>,
    /// Tier identifier to `"tag1 + tag2"` definition
    #[serde(default)]
    pub tiers: BTreeMap<String, String>,
}

/// Document row for a resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceRow {
    /// Display name, defaults to the identifier
    pub name: Option<String>,
}

/// Document row for a production entity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductionEntityRow {
    /// Display name, defaults to the identifier
    pub name: Option<String>,
    /// Fixed speed factor (sets both minimum and maximum)
    pub speed_factor: Option<NumberLiteral>,
    /// Lowest speed factor of a variable-speed entity
    pub min_speed_factor: Option<NumberLiteral>,
    /// Highest speed factor of a variable-speed entity
    pub max_speed_factor: Option<NumberLiteral>,
    /// Tag used for tier gating
    pub tag: Option<String>,
}

/// Document row for a rate scalar.
#[derive(Debug, Clone, Deserialize)]
pub struct RateScalarRow {
    /// `"upm"` or `"ups"`
    pub unit: String,
    /// Throughput in `unit`
    pub value: NumberLiteral,
}

/// Document row for a recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeRow {
    /// Recipe equation, e.g. `"12 a + 7 b -> 13 c"`
    pub recipe: String,
    /// Production entity or group identifier
    pub at: String,
    /// Execution time in seconds
    pub time: Option<NumberLiteral>,
    /// Display name
    pub name: Option<String>,
}

// ============================================================================
// Row Conversion
// ============================================================================

fn convert_resource(identifier: String, row: ResourceRow) -> Resource {
    if row.name.is_none() {
        warn!(resource = %identifier, "resource has no display name, using its identifier");
    }
    Resource::new(identifier, row.name)
}

fn convert_production_entity(
    identifier: String,
    row: ProductionEntityRow,
) -> Result<ProductionEntity, EconomyError> {
    let field = |name: &str| format!("{}.{}", identifier, name);

    let (min_speed_factor, max_speed_factor) = match (
        &row.speed_factor,
        &row.min_speed_factor,
        &row.max_speed_factor,
    ) {
        (Some(speed), _, _) => {
            let speed = speed.to_rational(&field("speed_factor"))?;
            (speed.clone(), speed)
        }
        (None, Some(min), Some(max)) => (
            min.to_rational(&field("min_speed_factor"))?,
            max.to_rational(&field("max_speed_factor"))?,
        ),
        (None, None, None) => (Rational::one(), Rational::one()),
        (None, _, _) => return Err(EconomyError::IncompleteSpeedRange(identifier)),
    };

    let name = row.name.unwrap_or_else(|| identifier.clone());
    Ok(ProductionEntity::new(
        identifier,
        name,
        min_speed_factor,
        max_speed_factor,
        row.tag,
    ))
}

fn convert_rate_scalar(identifier: String, row: RateScalarRow) -> Result<RateScalar, EconomyError> {
    let unit = RateUnit::from_name(&row.unit).ok_or_else(|| EconomyError::UnknownRateUnit {
        scalar: identifier.clone(),
        unit: row.unit.clone(),
    })?;
    let value = row.value.to_rational(&format!("{}.value", identifier))?;
    if !value.is_positive() {
        return Err(EconomyError::NonPositiveRateScalar(identifier));
    }
    Ok(RateScalar::new(identifier, value, unit))
}

fn convert_recipe(row: RecipeRow) -> Result<Recipe, EconomyError> {
    let parsed = parse_recipe(&row.recipe)?;

    let execution_time = match &row.time {
        Some(time) => {
            let time = time.to_rational(&format!("time of recipe \"{}\"", row.recipe))?;
            if !time.is_positive() {
                return Err(EconomyError::NonPositiveExecutionTime(row.recipe));
            }
            Some(time)
        }
        None => None,
    };

    Ok(Recipe::new(
        RecipeSide::from_terms(parsed.lhs),
        RecipeSide::from_terms(parsed.rhs),
        row.at,
        execution_time,
        row.name,
    ))
}

impl EconomyDocument {
    /// Converts the document rows into a validated [`EconomyDefinition`].
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found: malformed numbers or
    /// recipe strings, unknown rate units, incomplete speed ranges, and any
    /// integrity violation reported by [`EconomyDefinition::new`].
    pub fn into_economy(self) -> Result<EconomyDefinition, EconomyError> {
        let resources = self
            .resources
            .into_iter()
            .map(|(identifier, row)| convert_resource(identifier, row))
            .collect();

        let production_entities = self
            .production_entities
            .into_iter()
            .map(|(identifier, row)| convert_production_entity(identifier, row))
            .collect::<Result<Vec<_>, _>>()?;

        let groups = self
            .production_entity_groups
            .into_iter()
            .map(|(identifier, members)| ProductionEntityGroup::new(identifier, members))
            .collect();

        let rate_scalars = self
            .rate_scalars
            .into_iter()
            .map(|(identifier, row)| convert_rate_scalar(identifier, row))
            .collect::<Result<Vec<_>, _>>()?;

        let tiers = self
            .tiers
            .iter()
            .map(|(identifier, definition)| Tier::parse(identifier.as_str(), definition))
            .collect();

        let recipes = self
            .recipes
            .into_iter()
            .map(convert_recipe)
            .collect::<Result<Vec<_>, _>>()?;

        EconomyDefinition::new(
            resources,
            production_entities,
            groups,
            rate_scalars,
            tiers,
            recipes,
        )
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Loads an economy definition from an already parsed JSON value.
pub fn load_economy_value(value: serde_json::Value) -> Result<EconomyDefinition, EconomyError> {
    let document: EconomyDocument = serde_json::from_value(value)?;
    document.into_economy()
}

/// Loads an economy definition from JSON text.
///
/// # Example
///
/// ```
/// use ecocalc::data::load_economy_str;
///
/// let economy = load_economy_str(r#"{
///     "resources": { "ore": { "name": "Ore" }, "plate": { "name": "Plate" } },
///     "production_entities": { "furnace": { "name": "Furnace", "speed_factor": 1 } },
///     "recipes": [ { "recipe": "ore -> plate", "at": "furnace", "time": 2 } ]
/// }"#).unwrap();
///
/// assert_eq!(economy.recipes().len(), 1);
/// assert_eq!(economy.resource_name("plate"), "Plate");
/// ```
pub fn load_economy_str(text: &str) -> Result<EconomyDefinition, EconomyError> {
    let document: EconomyDocument = serde_json::from_str(text)?;
    document.into_economy()
}

/// Loads an economy definition from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the economy definition file
///
/// # Returns
///
/// The validated [`EconomyDefinition`], or the first configuration error
/// encountered while reading, parsing or validating the file.
pub fn load_economy_file(path: &Path) -> Result<EconomyDefinition, EconomyError> {
    let text = fs::read_to_string(path)?;
    let economy = load_economy_str(&text)?;
    info!(
        path = %path.display(),
        resources = economy.resource_count(),
        recipes = economy.recipes().len(),
        "loaded economy definition"
    );
    Ok(economy)
}
