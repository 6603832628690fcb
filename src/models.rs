//! Data models and structures for ecocalc.
//!
//! This module contains the static vocabulary of an economy: resources,
//! production entities and their groups, rate scalars, tiers and recipes.
//! All of these are created once when an economy definition is loaded and
//! are immutable afterwards.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use clap::ValueEnum;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::numeric::{format_number, int, Rational};

/// A named quantity of "stuff" flowing through recipes (e.g. iron ore).
///
/// Identity is the identifier; the display name is cosmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Unique key used in recipes and specifiers
    pub identifier: String,
    /// Human-readable name
    pub name: String,
}

impl Resource {
    /// Creates a resource. Without a display name the identifier is used.
    pub fn new(identifier: impl Into<String>, name: Option<String>) -> Self {
        let identifier = identifier.into();
        let name = name.unwrap_or_else(|| identifier.clone());
        Self { identifier, name }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A facility type that executes recipes at some speed.
///
/// The speed factor multiplies recipe throughput (over- or underclocking).
/// `min_speed_factor <= max_speed_factor` always holds for entities coming
/// out of an [`EconomyDefinition`](crate::economy::EconomyDefinition).
///
/// # Example
///
/// ```
/// use ecocalc::models::ProductionEntity;
/// use ecocalc::numeric::ratio;
///
/// let assembler = ProductionEntity::new("assembler_1", "Assembler", ratio(3, 4), ratio(3, 4), None);
/// assert!(assembler.single_speed());
/// assert_eq!(assembler.to_string(), "Assembler (75%)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionEntity {
    /// Unique key used by recipes and groups
    pub identifier: String,
    /// Human-readable name
    pub name: String,
    /// Lowest supported speed factor
    pub min_speed_factor: Rational,
    /// Highest supported speed factor; used by default during resolution
    pub max_speed_factor: Rational,
    /// Tag used for tier gating
    pub tag: Option<String>,
}

impl ProductionEntity {
    /// Creates a production entity with the given speed range.
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        min_speed_factor: Rational,
        max_speed_factor: Rational,
        tag: Option<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            min_speed_factor,
            max_speed_factor,
            tag,
        }
    }

    /// Creates an entity that always runs at 100% speed.
    pub fn with_unit_speed(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(identifier, name, Rational::one(), Rational::one(), None)
    }

    /// Whether the entity has exactly one speed setting.
    pub fn single_speed(&self) -> bool {
        self.min_speed_factor == self.max_speed_factor
    }

    /// Whether `speed` lies within the supported range.
    pub fn supports_speed(&self, speed: &Rational) -> bool {
        &self.min_speed_factor <= speed && speed <= &self.max_speed_factor
    }
}

impl fmt::Display for ProductionEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hundred = int(100);
        if self.single_speed() {
            write!(
                f,
                "{} ({}%)",
                self.name,
                format_number(&(&self.min_speed_factor * &hundred))
            )
        } else {
            write!(
                f,
                "{} ({}-{}%)",
                self.name,
                format_number(&(&self.min_speed_factor * &hundred)),
                format_number(&(&self.max_speed_factor * &hundred))
            )
        }
    }
}

/// Interchangeable facility variants with a preferred order
/// (e.g. an "assembler" group containing mk1, mk2 and mk3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionEntityGroup {
    /// Unique key, shares the namespace of production entities in recipes
    pub identifier: String,
    /// Member production entity identifiers in preference order
    pub members: Vec<String>,
}

impl ProductionEntityGroup {
    /// Creates a group from its ordered members.
    pub fn new(identifier: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            identifier: identifier.into(),
            members,
        }
    }
}

impl fmt::Display for ProductionEntityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} aliases)", self.identifier, self.members.len())
    }
}

/// A facility reference resolved against an economy: either one concrete
/// entity or a group whose members are tried in order.
#[derive(Debug, Clone, Copy)]
pub enum Facility<'a> {
    /// A single production entity
    Entity(&'a ProductionEntity),
    /// A group of production entity variants
    Group(&'a ProductionEntityGroup),
}

/// Unit for rates given on the command line or in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum RateUnit {
    /// Units per minute
    #[default]
    #[value(name = "upm")]
    #[serde(rename = "upm")]
    UnitsPerMinute,
    /// Units per second
    #[value(name = "ups")]
    #[serde(rename = "ups")]
    UnitsPerSecond,
}

impl RateUnit {
    /// Parses `upm` or `ups`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "upm" => Some(RateUnit::UnitsPerMinute),
            "ups" => Some(RateUnit::UnitsPerSecond),
            _ => None,
        }
    }

    /// How many seconds one unit of time in this rate unit spans.
    ///
    /// A value in this unit divided by this factor gives units per second.
    pub fn seconds(self) -> Rational {
        match self {
            RateUnit::UnitsPerMinute => int(60),
            RateUnit::UnitsPerSecond => Rational::one(),
        }
    }

    /// Suffix appended to rates rendered in this unit.
    pub fn suffix(self) -> &'static str {
        match self {
            RateUnit::UnitsPerMinute => "/min",
            RateUnit::UnitsPerSecond => "/sec",
        }
    }
}

/// A named throughput unit, e.g. "yellow belt" = 15 units per second.
///
/// # Example
///
/// ```
/// use ecocalc::models::{RateScalar, RateUnit};
/// use ecocalc::numeric::int;
///
/// let belt = RateScalar::new("red_belt", int(1800), RateUnit::UnitsPerMinute);
/// assert_eq!(belt.units_per_second, int(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateScalar {
    /// Unique key used in specifiers (`:red_belt`)
    pub identifier: String,
    /// Exact throughput in units per second
    pub units_per_second: Rational,
}

impl RateScalar {
    /// Creates a rate scalar from a value expressed in `unit`.
    pub fn new(identifier: impl Into<String>, value: Rational, unit: RateUnit) -> Self {
        Self {
            identifier: identifier.into(),
            units_per_second: value / unit.seconds(),
        }
    }

    /// Throughput in units per minute.
    pub fn units_per_minute(&self) -> Rational {
        &self.units_per_second * int(60)
    }
}

impl fmt::Display for RateScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/min", format_number(&self.units_per_minute()))
    }
}

/// Progression gate: the set of production entity tags currently available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    /// Unique key
    pub identifier: String,
    /// Tags of entities enabled in this tier
    pub enabled_tags: BTreeSet<String>,
}

impl Tier {
    /// Parses a tier definition of the form `"tag1 + tag2"`.
    pub fn parse(identifier: impl Into<String>, definition: &str) -> Self {
        let enabled_tags = definition
            .split('+')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            identifier: identifier.into(),
            enabled_tags,
        }
    }

    /// Whether an entity with the given tag is available in this tier.
    /// Untagged entities are never enabled by a tier.
    pub fn enables(&self, entity: &ProductionEntity) -> bool {
        entity
            .tag
            .as_ref()
            .is_some_and(|tag| self.enabled_tags.contains(tag))
    }
}

/// One side of a recipe: resources with their exact cardinalities.
///
/// Terms naming the same resource are summed; the order in which resources
/// first appear is kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipeSide {
    terms: Vec<(String, Rational)>,
}

impl RecipeSide {
    /// Builds a side from `(cardinality, resource)` pairs.
    pub fn from_terms(terms: impl IntoIterator<Item = (Rational, String)>) -> Self {
        let mut side = RecipeSide::default();
        for (cardinality, resource) in terms {
            match side.terms.iter_mut().find(|(known, _)| *known == resource) {
                Some((_, total)) => *total += cardinality,
                None => side.terms.push((resource, cardinality)),
            }
        }
        side
    }

    /// Cardinality of `resource` on this side, if present.
    pub fn cardinality_of(&self, resource: &str) -> Option<&Rational> {
        self.terms
            .iter()
            .find(|(known, _)| known == resource)
            .map(|(_, cardinality)| cardinality)
    }

    /// Whether `resource` appears on this side.
    pub fn contains(&self, resource: &str) -> bool {
        self.cardinality_of(resource).is_some()
    }

    /// Iterates over `(resource, cardinality)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rational)> {
        self.terms
            .iter()
            .map(|(resource, cardinality)| (resource.as_str(), cardinality))
    }

    /// Iterates over the resource identifiers.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|(resource, _)| resource.as_str())
    }

    /// Number of distinct resources.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the side lists no resources.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for RecipeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (resource, cardinality)) in self.terms.iter().enumerate() {
            if index > 0 {
                write!(f, " + ")?;
            }
            if cardinality.is_one() {
                write!(f, "{}", resource)?;
            } else {
                write!(f, "{} {}", cardinality, resource)?;
            }
        }
        Ok(())
    }
}

static NEXT_RECIPE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a recipe. Generated on construction, never derived from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecipeId(u64);

impl RecipeId {
    fn generate() -> Self {
        RecipeId(NEXT_RECIPE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A transformation of ingredients into products at some facility.
///
/// Equality and hashing use the generated [`RecipeId`]: two recipes with
/// identical sides are still distinct recipes.
///
/// # Example
///
/// ```
/// use ecocalc::models::{Recipe, RecipeSide};
/// use ecocalc::numeric::int;
///
/// let smelt = Recipe::new(
///     RecipeSide::from_terms([(int(1), "ore".to_string())]),
///     RecipeSide::from_terms([(int(1), "plate".to_string())]),
///     "furnace",
///     Some(int(3)),
///     None,
/// );
/// assert!(smelt.provides_rate());
/// assert!(!smelt.is_cyclic());
/// assert_eq!(smelt.to_string(), "ore -> plate");
/// ```
#[derive(Debug, Clone)]
pub struct Recipe {
    id: RecipeId,
    /// Ingredients
    pub lhs: RecipeSide,
    /// Products
    pub rhs: RecipeSide,
    /// Production entity or group identifier where the recipe runs
    pub at: String,
    /// Execution time in seconds; `None` for count-only recipes
    pub execution_time: Option<Rational>,
    /// Optional display name
    pub name: Option<String>,
}

impl Recipe {
    /// Creates a recipe with a fresh identity.
    pub fn new(
        lhs: RecipeSide,
        rhs: RecipeSide,
        at: impl Into<String>,
        execution_time: Option<Rational>,
        name: Option<String>,
    ) -> Self {
        Self {
            id: RecipeId::generate(),
            lhs,
            rhs,
            at: at.into(),
            execution_time,
            name,
        }
    }

    /// The recipe's identity.
    pub fn id(&self) -> RecipeId {
        self.id
    }

    /// True when some resource is both an ingredient and a product.
    pub fn is_cyclic(&self) -> bool {
        self.lhs.resources().any(|resource| self.rhs.contains(resource))
    }

    /// True when the recipe has an execution time and can be used for rates.
    pub fn provides_rate(&self) -> bool {
        self.execution_time.is_some()
    }

    /// Ingredient resource identifiers.
    pub fn ingredients(&self) -> impl Iterator<Item = &str> {
        self.lhs.resources()
    }

    /// Product resource identifiers.
    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.rhs.resources()
    }
}

impl PartialEq for Recipe {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Recipe {}

impl Hash for Recipe {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.lhs, self.rhs)
    }
}
