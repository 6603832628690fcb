//! The validated, queryable collection of an economy's static records.

use std::collections::{BTreeMap, BTreeSet};

use num_traits::Signed;
use tracing::debug;

use crate::error::EconomyError;
use crate::models::{
    Facility, ProductionEntity, ProductionEntityGroup, RateScalar, Recipe, Resource, Tier,
};

/// Everything known about one game economy.
///
/// Built once (usually through [`crate::data::load_economy_file`]) and
/// read-only afterwards. Construction guarantees:
///
/// - no two resources share a display name,
/// - every resource mentioned by a recipe is declared,
/// - every group member is a declared production entity,
/// - every production entity has `0 < min_speed_factor <= max_speed_factor`.
///
/// Lookups come in pairs: `has_*` answers membership, the accessor of the
/// same name returns `Option` so a missing key is handled explicitly by the
/// caller.
#[derive(Debug, Clone)]
pub struct EconomyDefinition {
    resources: BTreeMap<String, Resource>,
    production_entities: BTreeMap<String, ProductionEntity>,
    production_entity_groups: BTreeMap<String, ProductionEntityGroup>,
    rate_scalars: BTreeMap<String, RateScalar>,
    tiers: BTreeMap<String, Tier>,
    recipes: Vec<Recipe>,
}

fn index_by<T>(items: Vec<T>, key: impl Fn(&T) -> &str) -> BTreeMap<String, T> {
    items
        .into_iter()
        .map(|item| (key(&item).to_string(), item))
        .collect()
}

impl EconomyDefinition {
    /// Builds and validates an economy.
    ///
    /// # Errors
    ///
    /// - [`EconomyError::InvalidSpeedRange`] if an entity's speed factors are
    ///   not positive or its minimum exceeds its maximum
    /// - [`EconomyError::UnknownGroupMember`] if a group lists an unknown entity
    /// - [`EconomyError::DuplicateResourceName`] if display names collide
    /// - [`EconomyError::UnknownResource`] if a recipe mentions an undeclared
    ///   ingredient or product
    pub fn new(
        resources: Vec<Resource>,
        production_entities: Vec<ProductionEntity>,
        production_entity_groups: Vec<ProductionEntityGroup>,
        rate_scalars: Vec<RateScalar>,
        tiers: Vec<Tier>,
        recipes: Vec<Recipe>,
    ) -> Result<Self, EconomyError> {
        let economy = Self {
            resources: index_by(resources, |resource| resource.identifier.as_str()),
            production_entities: index_by(production_entities, |entity| entity.identifier.as_str()),
            production_entity_groups: index_by(production_entity_groups, |group| group.identifier.as_str()),
            rate_scalars: index_by(rate_scalars, |scalar| scalar.identifier.as_str()),
            tiers: index_by(tiers, |tier| tier.identifier.as_str()),
            recipes,
        };
        economy.plausibility_check()?;
        debug!(
            resources = economy.resources.len(),
            production_entities = economy.production_entities.len(),
            groups = economy.production_entity_groups.len(),
            recipes = economy.recipes.len(),
            "economy definition validated"
        );
        Ok(economy)
    }

    fn plausibility_check(&self) -> Result<(), EconomyError> {
        if let Some(entity) = self
            .production_entities
            .values()
            .find(|entity| {
                !entity.min_speed_factor.is_positive()
                    || entity.min_speed_factor > entity.max_speed_factor
            })
        {
            return Err(EconomyError::InvalidSpeedRange(entity.identifier.clone()));
        }

        for group in self.production_entity_groups.values() {
            if let Some(member) = group
                .members
                .iter()
                .find(|member| !self.production_entities.contains_key(member.as_str()))
            {
                return Err(EconomyError::UnknownGroupMember {
                    group: group.identifier.clone(),
                    member: member.clone(),
                });
            }
        }

        let mut seen_names = BTreeSet::new();
        let mut duplicate_names = BTreeSet::new();
        for resource in self.resources.values() {
            if !seen_names.insert(resource.name.as_str()) {
                duplicate_names.insert(resource.name.clone());
            }
        }
        if !duplicate_names.is_empty() {
            return Err(EconomyError::DuplicateResourceName(
                duplicate_names.into_iter().collect(),
            ));
        }

        for recipe in &self.recipes {
            let unknown: BTreeSet<&str> = recipe
                .ingredients()
                .chain(recipe.products())
                .filter(|resource| !self.resources.contains_key(*resource))
                .collect();
            if !unknown.is_empty() {
                return Err(EconomyError::UnknownResource {
                    recipe: recipe.to_string(),
                    resources: unknown.into_iter().map(str::to_string).collect(),
                });
            }
        }

        Ok(())
    }

    /// All recipes in declaration order.
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// One-based position of `recipe` in declaration order (its `#N` number).
    pub fn recipe_number(&self, recipe: &Recipe) -> Option<usize> {
        self.recipes
            .iter()
            .position(|known| known == recipe)
            .map(|index| index + 1)
    }

    /// Display name of a resource, falling back to the raw identifier.
    pub fn resource_name<'a>(&'a self, identifier: &'a str) -> &'a str {
        self.resources
            .get(identifier)
            .map_or(identifier, |resource| resource.name.as_str())
    }

    /// Number of declared resources.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// All resources ordered by identifier.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Whether `identifier` names a resource.
    pub fn has_resource(&self, identifier: &str) -> bool {
        self.resources.contains_key(identifier)
    }

    /// Looks up a resource.
    pub fn resource(&self, identifier: &str) -> Option<&Resource> {
        self.resources.get(identifier)
    }

    /// Whether `identifier` names a production entity.
    pub fn has_production_entity(&self, identifier: &str) -> bool {
        self.production_entities.contains_key(identifier)
    }

    /// Looks up a production entity.
    pub fn production_entity(&self, identifier: &str) -> Option<&ProductionEntity> {
        self.production_entities.get(identifier)
    }

    /// All production entities ordered by identifier.
    pub fn production_entities(&self) -> impl Iterator<Item = &ProductionEntity> {
        self.production_entities.values()
    }

    /// Whether `identifier` names a production entity group.
    pub fn has_production_entity_group(&self, identifier: &str) -> bool {
        self.production_entity_groups.contains_key(identifier)
    }

    /// Looks up a production entity group.
    pub fn production_entity_group(&self, identifier: &str) -> Option<&ProductionEntityGroup> {
        self.production_entity_groups.get(identifier)
    }

    /// Whether `identifier` names a rate scalar.
    pub fn has_rate_scalar(&self, identifier: &str) -> bool {
        self.rate_scalars.contains_key(identifier)
    }

    /// Looks up a rate scalar.
    pub fn rate_scalar(&self, identifier: &str) -> Option<&RateScalar> {
        self.rate_scalars.get(identifier)
    }

    /// Whether `identifier` names a tier.
    pub fn has_tier(&self, identifier: &str) -> bool {
        self.tiers.contains_key(identifier)
    }

    /// Looks up a tier.
    pub fn tier(&self, identifier: &str) -> Option<&Tier> {
        self.tiers.get(identifier)
    }

    /// Resolves a facility reference to an entity or a group.
    ///
    /// Entities take precedence if an identifier is used for both.
    pub fn find_facility(&self, identifier: &str) -> Option<Facility<'_>> {
        self.production_entities
            .get(identifier)
            .map(Facility::Entity)
            .or_else(|| {
                self.production_entity_groups
                    .get(identifier)
                    .map(Facility::Group)
            })
    }
}
