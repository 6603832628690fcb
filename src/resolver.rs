//! Recipe resolution for ecocalc.
//!
//! This module turns production requests into a [`RecipeSum`]: for every
//! requested resource it picks the producing recipe, sizes the facility
//! allocation, and then recursively does the same for each ingredient until
//! only irreducible (or explicitly stopped) resources remain.

use std::collections::BTreeSet;

use clap::ValueEnum;
use num_traits::Signed;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::economy::EconomyDefinition;
use crate::error::{ResolveError, ResolveResult};
use crate::models::{Facility, ProductionEntity, RateUnit, Recipe, Tier};
use crate::numeric::Rational;
use crate::production::{Production, RecipeSum};
use crate::specifier::{ProductionSpecifier, SpecifierTarget};

/// Whether quantities are throughput rates or plain item counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputationMode {
    /// Quantities are rates; recipes need an execution time
    #[default]
    Rate,
    /// Quantities are counts of recipe executions
    Count,
}

/// Settings a [`RecipeResolver`] is built with.
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    /// Rate or count mode
    pub mode: ComputationMode,
    /// Unit of bare specifier values in rate mode
    pub rate_unit: RateUnit,
    /// Tier restricting which group members may be chosen
    pub tier: Option<String>,
    /// Resources treated as irreducible even if a recipe produces them
    pub stop_resources: BTreeSet<String>,
}

impl ResolverOptions {
    /// Options for the given mode with all other settings at their defaults.
    pub fn new(mode: ComputationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Sets the unit bare values are read in.
    pub fn with_rate_unit(mut self, rate_unit: RateUnit) -> Self {
        self.rate_unit = rate_unit;
        self
    }

    /// Restricts group members to those enabled in `tier`.
    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = Some(tier.into());
        self
    }

    /// Adds resources that must not be expanded further.
    pub fn with_stop_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_resources
            .extend(resources.into_iter().map(Into::into));
        self
    }
}

/// Resolves production requests against one economy.
///
/// The working recipe set and the enabled entity set are computed once at
/// construction; `resolve` calls are independent of each other.
///
/// # Example
///
/// ```
/// use ecocalc::data::load_economy_str;
/// use ecocalc::numeric::int;
/// use ecocalc::resolver::{ComputationMode, RecipeResolver, ResolverOptions};
/// use ecocalc::specifier::ProductionSpecifier;
///
/// let economy = load_economy_str(r#"{
///     "resources": { "ore": { "name": "Ore" }, "plate": { "name": "Plate" } },
///     "production_entities": { "furnace": { "name": "Furnace", "speed_factor": 1 } },
///     "recipes": [ { "recipe": "ore -> plate", "at": "furnace", "time": 2 } ]
/// }"#).unwrap();
///
/// let resolver = RecipeResolver::new(&economy, ResolverOptions::new(ComputationMode::Count)).unwrap();
/// let sum = resolver.resolve(&[ProductionSpecifier::for_resource("plate", Some(int(10)))]).unwrap();
///
/// assert_eq!(sum.productions()[0].cardinality(), &int(10));
/// assert_eq!(sum.base_inputs(), &[("ore".to_string(), int(10))]);
/// ```
#[derive(Debug, Clone)]
pub struct RecipeResolver<'a> {
    economy: &'a EconomyDefinition,
    mode: ComputationMode,
    rate_unit: RateUnit,
    tier: Option<&'a Tier>,
    recipes: Vec<&'a Recipe>,
    enabled_entities: BTreeSet<&'a str>,
    stop_resources: BTreeSet<String>,
}

impl<'a> RecipeResolver<'a> {
    /// Creates a resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownTier`] if the options name a tier the
    /// economy does not declare.
    pub fn new(economy: &'a EconomyDefinition, options: ResolverOptions) -> ResolveResult<Self> {
        let tier = match &options.tier {
            Some(identifier) => Some(
                economy
                    .tier(identifier)
                    .ok_or_else(|| ResolveError::UnknownTier(identifier.clone()))?,
            ),
            None => None,
        };

        let recipes: Vec<&'a Recipe> = economy
            .recipes()
            .iter()
            .filter(|recipe| !recipe.is_cyclic())
            .filter(|recipe| options.mode == ComputationMode::Count || recipe.provides_rate())
            .collect();

        let enabled_entities: BTreeSet<&'a str> = economy
            .production_entities()
            .filter(|entity| tier.map_or(true, |tier| tier.enables(entity)))
            .map(|entity| entity.identifier.as_str())
            .collect();

        for resource in &options.stop_resources {
            if !economy.has_resource(resource) {
                warn!(resource = %resource, "stop resource is not declared in the economy");
            }
        }

        debug!(
            mode = ?options.mode,
            tier = options.tier.as_deref().unwrap_or("-"),
            recipes = recipes.len(),
            excluded = economy.recipes().len() - recipes.len(),
            enabled_entities = enabled_entities.len(),
            "recipe resolver ready"
        );

        Ok(Self {
            economy,
            mode: options.mode,
            rate_unit: options.rate_unit,
            tier,
            recipes,
            enabled_entities,
            stop_resources: options.stop_resources,
        })
    }

    /// The economy being resolved against.
    pub fn economy(&self) -> &'a EconomyDefinition {
        self.economy
    }

    /// Rate or count mode.
    pub fn mode(&self) -> ComputationMode {
        self.mode
    }

    /// Unit of bare specifier values.
    pub fn rate_unit(&self) -> RateUnit {
        self.rate_unit
    }

    /// Recipes eligible for resolution, in declaration order.
    pub fn recipes(&self) -> &[&'a Recipe] {
        &self.recipes
    }

    /// Whether a production entity may be chosen from a group.
    pub fn is_enabled(&self, entity: &str) -> bool {
        self.enabled_entities.contains(entity)
    }

    /// Resolves an entity or group reference to one concrete entity.
    ///
    /// A direct entity reference is returned as is. For a group, the first
    /// member enabled in the active tier wins.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::UnknownProductionEntity`] if the reference is neither
    ///   an entity nor a group
    /// - [`ResolveError::NoEligibleEntity`] if no group member is enabled
    pub fn find_production_entity(&self, reference: &str) -> ResolveResult<&'a ProductionEntity> {
        let economy: &'a EconomyDefinition = self.economy;
        match economy.find_facility(reference) {
            Some(Facility::Entity(entity)) => Ok(entity),
            Some(Facility::Group(group)) => group
                .members
                .iter()
                .find(|member| self.is_enabled(member))
                .and_then(|member| economy.production_entity(member))
                .ok_or_else(|| ResolveError::NoEligibleEntity {
                    group: group.identifier.clone(),
                    tier: self
                        .tier
                        .map_or_else(|| "(none)".to_string(), |tier| tier.identifier.clone()),
                }),
            None => Err(ResolveError::UnknownProductionEntity(reference.to_string())),
        }
    }

    /// First eligible recipe, in declaration order, producing a positive
    /// amount of `resource`. `None` marks the resource as irreducible.
    pub fn get_recipe_which_produces(&self, resource: &str) -> Option<&'a Recipe> {
        self.recipes.iter().copied().find(|recipe| {
            recipe
                .rhs
                .cardinality_of(resource)
                .is_some_and(Signed::is_positive)
        })
    }

    /// Sizes the production of `resource` at `target` units per second
    /// (rate mode) or units (count mode) using its default recipe and facility.
    ///
    /// Returns `Ok(None)` when no eligible recipe produces the resource.
    ///
    /// # Errors
    ///
    /// Propagates facility resolution errors from
    /// [`RecipeResolver::find_production_entity`].
    pub fn produce_resource(
        &self,
        resource: &str,
        target: &Rational,
    ) -> ResolveResult<Option<Production<'a>>> {
        let Some(recipe) = self.get_recipe_which_produces(resource) else {
            return Ok(None);
        };
        let entity = self.find_production_entity(&recipe.at)?;
        let speed = entity.max_speed_factor.clone();
        Ok(Some(self.size_production(recipe, entity, speed, resource, target)))
    }

    fn size_production(
        &self,
        recipe: &'a Recipe,
        entity: &'a ProductionEntity,
        speed: Rational,
        resource: &str,
        target: &Rational,
    ) -> Production<'a> {
        let produced = recipe
            .rhs
            .cardinality_of(resource)
            .cloned()
            .unwrap_or_default();
        let unity_value = match (self.mode, &recipe.execution_time) {
            (ComputationMode::Rate, Some(time)) => produced / time * &speed,
            _ => produced,
        };
        let cardinality = target / &unity_value;

        trace!(
            resource,
            recipe = %recipe,
            entity = %entity.identifier,
            %unity_value,
            %cardinality,
            "sized production"
        );

        Production::new(recipe, entity, speed, cardinality, self.mode)
    }

    /// Resolves all specifiers into one merged [`RecipeSum`].
    ///
    /// Ingredients are expanded recursively; resources that no eligible
    /// recipe produces, or that are in the stop set, are collected as base
    /// inputs instead.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::UnknownResource`] for a specifier naming an undeclared resource
    /// - [`ResolveError::RecipeNumberNotSupported`] for `#N` specifiers
    /// - [`ResolveError::RateScalarInCountMode`] for rate scalars in count mode
    /// - [`ResolveError::SpeedOutOfRange`] for a speed override the entity cannot run at
    /// - [`ResolveError::CyclicDependency`] if recipes form a loop
    /// - any facility resolution error
    pub fn resolve(&self, specifiers: &[ProductionSpecifier]) -> ResolveResult<RecipeSum<'a>> {
        let mut sum = RecipeSum::new();
        for specifier in specifiers {
            self.resolve_specifier(specifier, &mut sum)?;
        }
        sum.merge_recipes();
        debug!(
            specifiers = specifiers.len(),
            productions = sum.len(),
            base_inputs = sum.base_inputs().len(),
            "resolution complete"
        );
        Ok(sum)
    }

    fn resolve_specifier(
        &self,
        specifier: &ProductionSpecifier,
        sum: &mut RecipeSum<'a>,
    ) -> ResolveResult<()> {
        let resource = match &specifier.target {
            SpecifierTarget::Resource(resource) => resource.as_str(),
            SpecifierTarget::RecipeNumber(number) => {
                return Err(ResolveError::RecipeNumberNotSupported(*number))
            }
        };
        if !self.economy.has_resource(resource) {
            return Err(ResolveError::UnknownResource(resource.to_string()));
        }

        let target = specifier.target_quantity(self.mode, self.rate_unit)?;
        debug!(specifier = %specifier, %target, "resolving specifier");

        let Some(recipe) = self.get_recipe_which_produces(resource) else {
            warn!(resource, "no eligible recipe produces the requested resource");
            sum.add_base_input(resource, target);
            return Ok(());
        };

        let entity = match &specifier.at {
            Some(facility) => self.find_production_entity(facility)?,
            None => self.find_production_entity(&recipe.at)?,
        };
        let speed = match &specifier.speed {
            Some(speed) if !entity.supports_speed(speed) => {
                return Err(ResolveError::SpeedOutOfRange {
                    entity: entity.identifier.clone(),
                    speed: speed.to_string(),
                    min: entity.min_speed_factor.to_string(),
                    max: entity.max_speed_factor.to_string(),
                })
            }
            Some(speed) => speed.clone(),
            None => entity.max_speed_factor.clone(),
        };

        let production = self.size_production(recipe, entity, speed, resource, &target);
        let mut path = vec![resource.to_string()];
        self.add_and_expand(production, sum, &mut path)
    }

    /// Adds `production` to the sum, then walks its ingredients.
    fn add_and_expand(
        &self,
        production: Production<'a>,
        sum: &mut RecipeSum<'a>,
        path: &mut Vec<String>,
    ) -> ResolveResult<()> {
        let ingredients: Vec<(&'a str, Rational)> = production.lhs().collect();
        sum.push(production);
        for (ingredient, required) in ingredients {
            self.require(ingredient, required, sum, path)?;
        }
        Ok(())
    }

    fn require(
        &self,
        resource: &str,
        required: Rational,
        sum: &mut RecipeSum<'a>,
        path: &mut Vec<String>,
    ) -> ResolveResult<()> {
        if self.stop_resources.contains(resource) {
            trace!(resource, "stopped resource");
            sum.add_base_input(resource, required);
            return Ok(());
        }
        if path.iter().any(|known| known == resource) {
            let mut cycle = path.clone();
            cycle.push(resource.to_string());
            return Err(ResolveError::CyclicDependency(cycle));
        }

        match self.produce_resource(resource, &required)? {
            Some(production) => {
                debug!(
                    resource,
                    depth = path.len(),
                    recipe = %production.recipe(),
                    cardinality = %production.cardinality(),
                    "expanding ingredient"
                );
                path.push(resource.to_string());
                let expanded = self.add_and_expand(production, sum, path);
                path.pop();
                expanded?;
            }
            None => {
                trace!(resource, "irreducible resource");
                sum.add_base_input(resource, required);
            }
        }
        Ok(())
    }
}
