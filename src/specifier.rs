//! Production specifiers: what the user asks to produce.

use std::fmt;

use num_traits::One;

use crate::economy::EconomyDefinition;
use crate::error::{ResolveError, ResolveResult};
use crate::models::{RateScalar, RateUnit};
use crate::numeric::Rational;
use crate::parser::{parse_production_specifier, ParsedSpecifier, ParsedTarget};
use crate::resolver::ComputationMode;

/// What a specifier refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecifierTarget {
    /// Produce this resource
    Resource(String),
    /// Run the recipe with this one-based number
    RecipeNumber(usize),
}

/// A parsed production request such as `"2:yellow_belt iron_plate @smelter"`.
///
/// The multiplier is split into an absolute value and an optional rate
/// scalar; [`ProductionSpecifier::target_quantity`] combines both according
/// to the computation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionSpecifier {
    /// Resource or recipe number
    pub target: SpecifierTarget,
    /// Absolute multiplier; one when omitted
    pub value: Option<Rational>,
    /// Named throughput the value is expressed in
    pub rate_scalar: Option<RateScalar>,
    /// Facility override for the top-level production
    pub at: Option<String>,
    /// Speed factor override for the top-level production
    pub speed: Option<Rational>,
}

impl ProductionSpecifier {
    /// Creates a specifier for `resource` with a plain value.
    pub fn for_resource(resource: impl Into<String>, value: Option<Rational>) -> Self {
        Self {
            target: SpecifierTarget::Resource(resource.into()),
            value,
            rate_scalar: None,
            at: None,
            speed: None,
        }
    }

    /// Parses a specifier string, looking up named rate scalars in `economy`.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::Parse`] if the string does not follow the grammar
    /// - [`ResolveError::UnknownRateScalar`] if a `:name` rate scalar is not declared
    ///
    /// # Example
    ///
    /// ```
    /// use ecocalc::data::load_economy_str;
    /// use ecocalc::specifier::{ProductionSpecifier, SpecifierTarget};
    ///
    /// let economy = load_economy_str(r#"{
    ///     "resources": { "plate": { "name": "Plate" } },
    ///     "rate_scalars": { "belt": { "unit": "ups", "value": 15 } }
    /// }"#).unwrap();
    ///
    /// let spec = ProductionSpecifier::parse("2:belt plate", &economy).unwrap();
    /// assert_eq!(spec.target, SpecifierTarget::Resource("plate".to_string()));
    /// assert_eq!(spec.rate_scalar.unwrap().identifier, "belt");
    /// ```
    pub fn parse(text: &str, economy: &EconomyDefinition) -> ResolveResult<Self> {
        let parsed = parse_production_specifier(text.trim())?;
        Self::from_parsed(parsed, economy)
    }

    /// Builds a specifier from a parse tree.
    pub fn from_parsed(parsed: ParsedSpecifier, economy: &EconomyDefinition) -> ResolveResult<Self> {
        let (value, rate_scalar) = match parsed.multiplier {
            Some(multiplier) => {
                let rate_scalar = match multiplier.rate_scalar {
                    Some(identifier) => Some(
                        economy
                            .rate_scalar(&identifier)
                            .cloned()
                            .ok_or(ResolveError::UnknownRateScalar(identifier))?,
                    ),
                    None => None,
                };
                (multiplier.value, rate_scalar)
            }
            None => (None, None),
        };

        let target = match parsed.target {
            ParsedTarget::Resource(resource) => SpecifierTarget::Resource(resource),
            ParsedTarget::RecipeNumber(number) => SpecifierTarget::RecipeNumber(number),
        };

        Ok(Self {
            target,
            value,
            rate_scalar,
            at: parsed.at,
            speed: parsed.speed,
        })
    }

    /// Whether the specifier names a resource (as opposed to a recipe number).
    pub fn references_resource(&self) -> bool {
        matches!(self.target, SpecifierTarget::Resource(_))
    }

    /// The requested quantity in the resolver's internal unit.
    ///
    /// In rate mode this is units per second: a rate scalar contributes its
    /// exact throughput, a bare value is read in `rate_unit`. In count mode
    /// it is a plain item count and rate scalars are rejected.
    pub fn target_quantity(
        &self,
        mode: ComputationMode,
        rate_unit: RateUnit,
    ) -> ResolveResult<Rational> {
        let value = self.value.clone().unwrap_or_else(Rational::one);
        match (mode, &self.rate_scalar) {
            (ComputationMode::Rate, Some(scalar)) => Ok(value * &scalar.units_per_second),
            (ComputationMode::Rate, None) => Ok(value / rate_unit.seconds()),
            (ComputationMode::Count, Some(scalar)) => {
                Err(ResolveError::RateScalarInCountMode(scalar.identifier.clone()))
            }
            (ComputationMode::Count, None) => Ok(value),
        }
    }

    /// Returns a copy whose multiplier is scaled by `factor`.
    pub fn scaled(&self, factor: &Rational) -> Self {
        let value = self.value.clone().unwrap_or_else(Rational::one) * factor;
        Self {
            value: Some(value),
            ..self.clone()
        }
    }
}

impl fmt::Display for ProductionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = &self.value {
            write!(f, "{}", value)?;
        }
        if let Some(scalar) = &self.rate_scalar {
            write!(f, ":{}", scalar.identifier)?;
        }
        if self.value.is_some() || self.rate_scalar.is_some() {
            write!(f, " ")?;
        }
        match &self.target {
            SpecifierTarget::Resource(resource) => write!(f, "{}", resource)?,
            SpecifierTarget::RecipeNumber(number) => write!(f, "#{}", number)?,
        }
        if let Some(at) = &self.at {
            write!(f, " @{}", at)?;
        }
        if let Some(speed) = &self.speed {
            write!(f, " {}", speed)?;
        }
        Ok(())
    }
}
