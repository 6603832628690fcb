//! Facility allocations and their aggregate.
//!
//! A [`Production`] says "run this recipe on N instances of this entity at
//! this speed". A [`RecipeSum`] collects all productions needed for one
//! resolution, together with the base inputs that could not (or should not)
//! be produced.

use std::collections::HashMap;
use std::fmt;
use std::ops::{AddAssign, MulAssign};

use num_traits::Signed;

use crate::error::{ResolveError, ResolveResult};
use crate::models::{ProductionEntity, Recipe, RecipeId};
use crate::numeric::{lcm_of_denominators, Rational};
use crate::resolver::ComputationMode;

/// One concrete facility allocation.
///
/// `cardinality` is the (fractional) number of facility instances in rate
/// mode, or the number of recipe executions in count mode. It is never
/// negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production<'a> {
    recipe: &'a Recipe,
    production_entity: &'a ProductionEntity,
    production_speed: Rational,
    cardinality: Rational,
    mode: ComputationMode,
}

impl<'a> Production<'a> {
    /// Creates a production record.
    pub fn new(
        recipe: &'a Recipe,
        production_entity: &'a ProductionEntity,
        production_speed: Rational,
        cardinality: Rational,
        mode: ComputationMode,
    ) -> Self {
        Self {
            recipe,
            production_entity,
            production_speed,
            cardinality,
            mode,
        }
    }

    /// The recipe being executed.
    pub fn recipe(&self) -> &'a Recipe {
        self.recipe
    }

    /// The entity executing the recipe.
    pub fn production_entity(&self) -> &'a ProductionEntity {
        self.production_entity
    }

    /// Speed factor the entity runs at.
    pub fn production_speed(&self) -> &Rational {
        &self.production_speed
    }

    /// Number of entities (rate mode) or executions (count mode).
    pub fn cardinality(&self) -> &Rational {
        &self.cardinality
    }

    /// Whether the record was computed in rate or count mode.
    pub fn mode(&self) -> ComputationMode {
        self.mode
    }

    /// Factor turning one recipe cardinality into a flow of this production.
    fn side_scale(&self) -> Rational {
        match (self.mode, &self.recipe.execution_time) {
            (ComputationMode::Rate, Some(time)) => {
                &self.cardinality * &self.production_speed / time
            }
            _ => self.cardinality.clone(),
        }
    }

    /// Consumed resources as `(resource, units per second or count)`.
    pub fn lhs(&self) -> impl Iterator<Item = (&'a str, Rational)> {
        let scale = self.side_scale();
        let recipe: &'a Recipe = self.recipe;
        recipe
            .lhs
            .iter()
            .map(move |(resource, cardinality)| (resource, cardinality * &scale))
    }

    /// Produced resources as `(resource, units per second or count)`.
    pub fn rhs(&self) -> impl Iterator<Item = (&'a str, Rational)> {
        let scale = self.side_scale();
        let recipe: &'a Recipe = self.recipe;
        recipe
            .rhs
            .iter()
            .map(move |(resource, cardinality)| (resource, cardinality * &scale))
    }

    /// Whether `other` runs the same recipe on the same entity at the same speed.
    pub fn is_compatible(&self, other: &Production<'_>) -> bool {
        self.recipe.id() == other.recipe.id()
            && self.production_entity.identifier == other.production_entity.identifier
            && self.production_speed == other.production_speed
            && self.mode == other.mode
    }

    /// Adds the cardinalities of two compatible productions.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::IncompatibleProductions`] if recipe, entity,
    /// speed or mode differ.
    pub fn try_add(&self, other: &Production<'_>) -> ResolveResult<Production<'a>> {
        if !self.is_compatible(other) {
            return Err(ResolveError::IncompatibleProductions {
                left: self.to_string(),
                right: other.to_string(),
            });
        }
        Ok(Production {
            cardinality: &self.cardinality + &other.cardinality,
            ..self.clone()
        })
    }

    /// Returns a copy with the cardinality multiplied by `factor`.
    pub fn scaled(&self, factor: &Rational) -> Production<'a> {
        Production {
            cardinality: &self.cardinality * factor,
            ..self.clone()
        }
    }

    fn merge_key(&self) -> (RecipeId, &'a str, Rational) {
        let entity: &'a ProductionEntity = self.production_entity;
        (
            self.recipe.id(),
            entity.identifier.as_str(),
            self.production_speed.clone(),
        )
    }
}

impl fmt::Display for Production<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} @ {} / {}",
            self.cardinality, self.recipe, self.production_entity, self.production_speed
        )
    }
}

/// Ordered collection of productions for one resolved request.
///
/// # Example
///
/// ```
/// use ecocalc::models::{ProductionEntity, Recipe, RecipeSide};
/// use ecocalc::numeric::{int, ratio};
/// use ecocalc::production::{Production, RecipeSum};
/// use ecocalc::resolver::ComputationMode;
///
/// let recipe = Recipe::new(
///     RecipeSide::from_terms([(int(1), "ore".to_string())]),
///     RecipeSide::from_terms([(int(1), "plate".to_string())]),
///     "furnace",
///     Some(int(1)),
///     None,
/// );
/// let furnace = ProductionEntity::with_unit_speed("furnace", "Furnace");
///
/// let mut sum = RecipeSum::new();
/// sum += Production::new(&recipe, &furnace, int(1), ratio(1, 2), ComputationMode::Rate);
/// sum += Production::new(&recipe, &furnace, int(1), ratio(1, 3), ComputationMode::Rate);
/// sum.merge_recipes();
///
/// assert_eq!(sum.len(), 1);
/// assert_eq!(sum.productions()[0].cardinality(), &ratio(5, 6));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeSum<'a> {
    productions: Vec<Production<'a>>,
    base_inputs: Vec<(String, Rational)>,
}

impl<'a> RecipeSum<'a> {
    /// Creates an empty sum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Productions in the order they were added (or first seen, after merging).
    pub fn productions(&self) -> &[Production<'a>] {
        &self.productions
    }

    /// Irreducible or stopped resources with the total amount required.
    pub fn base_inputs(&self) -> &[(String, Rational)] {
        &self.base_inputs
    }

    /// Number of production records.
    pub fn len(&self) -> usize {
        self.productions.len()
    }

    /// Whether the sum holds no productions.
    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    /// Appends a production record.
    pub fn push(&mut self, production: Production<'a>) {
        self.productions.push(production);
    }

    /// Records demand for a resource that is not produced in this sum.
    /// Repeated demand for the same resource is summed.
    pub fn add_base_input(&mut self, resource: &str, amount: Rational) {
        match self
            .base_inputs
            .iter_mut()
            .find(|(known, _)| known == resource)
        {
            Some((_, total)) => *total += amount,
            None => self.base_inputs.push((resource.to_string(), amount)),
        }
    }

    /// Merges productions of the same recipe on the same entity and speed,
    /// summing their cardinalities. First-seen order is kept.
    ///
    /// Grouping uses recipe identity, so two distinct recipes with identical
    /// sides stay separate. Merging is idempotent.
    pub fn merge_recipes(&mut self) {
        let mut merged: Vec<Production<'a>> = Vec::with_capacity(self.productions.len());
        let mut index: HashMap<(RecipeId, &'a str, Rational), usize> = HashMap::new();

        for production in self.productions.drain(..) {
            match index.get(&production.merge_key()) {
                Some(&position) => merged[position].cardinality += production.cardinality,
                None => {
                    index.insert(production.merge_key(), merged.len());
                    merged.push(production);
                }
            }
        }

        self.productions = merged;
    }

    /// Multiplies every cardinality and base input by `factor`.
    pub fn scale(&mut self, factor: &Rational) {
        for production in &mut self.productions {
            production.cardinality *= factor;
        }
        for (_, amount) in &mut self.base_inputs {
            *amount *= factor;
        }
    }

    /// Scales the sum by a user-supplied factor.
    ///
    /// Cardinalities never go negative, so zero and negative factors are
    /// rejected with [`ResolveError::NonPositiveMultiplier`].
    pub fn multiply(&mut self, factor: &Rational) -> ResolveResult<()> {
        if !factor.is_positive() {
            return Err(ResolveError::NonPositiveMultiplier(factor.to_string()));
        }
        self.scale(factor);
        Ok(())
    }

    /// Smallest positive integer that turns every cardinality into an integer.
    pub fn integral_multiplier(&self) -> Rational {
        lcm_of_denominators(self.productions.iter().map(Production::cardinality))
    }

    /// Scales the sum so all cardinalities become integers while keeping
    /// their exact ratios. Returns the factor that was applied.
    pub fn round_up_to_integral(&mut self) -> Rational {
        let factor = self.integral_multiplier();
        self.scale(&factor);
        factor
    }

    /// Net flow per resource over all productions (products minus ingredients),
    /// in first-seen order.
    pub fn total_rates(&self) -> Vec<(&'a str, Rational)> {
        let mut flows: Vec<(&'a str, Rational)> = Vec::new();
        let mut accumulate = |resource: &'a str, amount: Rational| {
            match flows.iter_mut().find(|(known, _)| *known == resource) {
                Some((_, total)) => *total += amount,
                None => flows.push((resource, amount)),
            }
        };
        for production in &self.productions {
            for (resource, amount) in production.rhs() {
                accumulate(resource, amount);
            }
            for (resource, amount) in production.lhs() {
                accumulate(resource, -amount);
            }
        }
        flows
    }
}

impl<'a> AddAssign<Production<'a>> for RecipeSum<'a> {
    fn add_assign(&mut self, production: Production<'a>) {
        self.push(production);
    }
}

impl MulAssign<&Rational> for RecipeSum<'_> {
    fn mul_assign(&mut self, factor: &Rational) {
        self.scale(factor);
    }
}
