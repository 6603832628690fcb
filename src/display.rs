//! Display and formatting utilities for ecocalc.
//!
//! Resolution results are first turned into a [`Report`], a flat,
//! serializable view in which every quantity is already converted to the
//! user's display unit. The report can then be printed as text, or
//! serialized to JSON or CSV. Floating point only appears here.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::economy::EconomyDefinition;
use crate::error::ReportError;
use crate::models::{RateUnit, Recipe, RecipeSide};
use crate::numeric::{ceil, format_number, int, to_f64, Rational};
use crate::production::{Production, RecipeSum};
use crate::resolver::ComputationMode;

/// How facility counts are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum CardinalityFormat {
    /// Round up to the next whole facility
    #[default]
    #[value(name = "ceil")]
    #[serde(rename = "ceil")]
    Ceil,
    /// Short decimal approximation
    #[value(name = "float")]
    #[serde(rename = "float")]
    Float,
    /// Exact fraction
    #[value(name = "frac")]
    #[serde(rename = "frac")]
    Fraction,
}

impl CardinalityFormat {
    /// Formats a cardinality.
    ///
    /// # Example
    ///
    /// ```
    /// use ecocalc::display::CardinalityFormat;
    /// use ecocalc::numeric::ratio;
    ///
    /// let cardinality = ratio(180, 13);
    /// assert_eq!(CardinalityFormat::Ceil.format(&cardinality), "14");
    /// assert_eq!(CardinalityFormat::Float.format(&cardinality), "13.85");
    /// assert_eq!(CardinalityFormat::Fraction.format(&cardinality), "180/13");
    /// ```
    pub fn format(self, cardinality: &Rational) -> String {
        match self {
            CardinalityFormat::Ceil => ceil(cardinality).to_string(),
            CardinalityFormat::Float => format_number(cardinality),
            CardinalityFormat::Fraction => cardinality.to_string(),
        }
    }
}

/// User choices that affect rendering only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPreferences {
    /// Whether quantities are rates or counts
    pub mode: ComputationMode,
    /// Unit rates are shown in
    pub rate_unit: RateUnit,
    /// How facility counts are shown
    pub cardinality_format: CardinalityFormat,
}

impl DisplayPreferences {
    /// Creates display preferences.
    pub fn new(
        mode: ComputationMode,
        rate_unit: RateUnit,
        cardinality_format: CardinalityFormat,
    ) -> Self {
        Self {
            mode,
            rate_unit,
            cardinality_format,
        }
    }

    /// `"/min"` or `"/sec"` for rates, nothing for counts.
    pub fn suffix(&self) -> &'static str {
        match self.mode {
            ComputationMode::Rate => self.rate_unit.suffix(),
            ComputationMode::Count => "",
        }
    }

    /// Converts an internal quantity (units per second or count) into the
    /// display unit.
    pub fn scale_quantity(&self, quantity: &Rational) -> Rational {
        match self.mode {
            ComputationMode::Rate => quantity * self.rate_unit.seconds(),
            ComputationMode::Count => quantity.clone(),
        }
    }

    /// Renders an internal quantity with its unit suffix.
    ///
    /// # Example
    ///
    /// ```
    /// use ecocalc::display::{CardinalityFormat, DisplayPreferences};
    /// use ecocalc::models::RateUnit;
    /// use ecocalc::numeric::int;
    /// use ecocalc::resolver::ComputationMode;
    ///
    /// let prefs = DisplayPreferences::new(ComputationMode::Rate, RateUnit::UnitsPerMinute, CardinalityFormat::Ceil);
    /// assert_eq!(prefs.format_quantity(&int(15)), "900/min");
    /// ```
    pub fn format_quantity(&self, quantity: &Rational) -> String {
        format!(
            "{}{}",
            format_number(&self.scale_quantity(quantity)),
            self.suffix()
        )
    }
}

/// Formats a speed factor as a percentage, e.g. `"75%"`.
pub fn format_speed(speed: &Rational) -> String {
    format!("{}%", format_number(&(speed * int(100))))
}

fn format_side(side: &RecipeSide, economy: &EconomyDefinition) -> String {
    side.iter()
        .map(|(resource, cardinality)| {
            let name = economy.resource_name(resource);
            if *cardinality == int(1) {
                name.to_string()
            } else {
                format!("{} {}", format_number(cardinality), name)
            }
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Renders a recipe with resource display names, e.g. `"12 Iron + 7 Coal -> 13 Steel"`.
pub fn format_recipe(recipe: &Recipe, economy: &EconomyDefinition) -> String {
    format!(
        "{} -> {}",
        format_side(&recipe.lhs, economy),
        format_side(&recipe.rhs, economy)
    )
}

// ============================================================================
// Report
// ============================================================================

/// One resource flow in display units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRow {
    /// Resource identifier
    pub resource: String,
    /// Resource display name
    pub name: String,
    /// Exact quantity in display units
    pub exact: String,
    /// Approximate quantity in display units
    pub value: f64,
    /// Rendered quantity with unit suffix
    pub display: String,
}

impl FlowRow {
    fn new(resource: &str, quantity: &Rational, economy: &EconomyDefinition, prefs: &DisplayPreferences) -> Self {
        let scaled = prefs.scale_quantity(quantity);
        Self {
            resource: resource.to_string(),
            name: economy.resource_name(resource).to_string(),
            exact: scaled.to_string(),
            value: to_f64(&scaled),
            display: format!("{}{}", format_number(&scaled), prefs.suffix()),
        }
    }
}

/// One production record in display form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionRow {
    /// One-based recipe number in declaration order
    pub recipe_number: Option<usize>,
    /// Recipe with resource display names
    pub recipe: String,
    /// Optional recipe display name
    pub recipe_name: Option<String>,
    /// Production entity identifier
    pub entity: String,
    /// Production entity display name
    pub entity_name: String,
    /// Exact speed factor
    pub speed: String,
    /// Speed factor as a percentage
    pub speed_percent: String,
    /// Exact facility count (rate mode) or execution count (count mode)
    pub cardinality: String,
    /// Cardinality rendered per the chosen format
    pub cardinality_display: String,
    /// Consumed resources
    pub inputs: Vec<FlowRow>,
    /// Produced resources
    pub outputs: Vec<FlowRow>,
}

impl ProductionRow {
    fn new(production: &Production<'_>, economy: &EconomyDefinition, prefs: &DisplayPreferences) -> Self {
        let recipe = production.recipe();
        let entity = production.production_entity();
        Self {
            recipe_number: economy.recipe_number(recipe),
            recipe: format_recipe(recipe, economy),
            recipe_name: recipe.name.clone(),
            entity: entity.identifier.clone(),
            entity_name: entity.name.clone(),
            speed: production.production_speed().to_string(),
            speed_percent: format_speed(production.production_speed()),
            cardinality: production.cardinality().to_string(),
            cardinality_display: prefs.cardinality_format.format(production.cardinality()),
            inputs: production
                .lhs()
                .map(|(resource, quantity)| FlowRow::new(resource, &quantity, economy, prefs))
                .collect(),
            outputs: production
                .rhs()
                .map(|(resource, quantity)| FlowRow::new(resource, &quantity, economy, prefs))
                .collect(),
        }
    }
}

/// Display-ready view of a resolved [`RecipeSum`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Rate or count mode
    pub mode: ComputationMode,
    /// Rate unit, absent in count mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_unit: Option<RateUnit>,
    /// Factor the sum was scaled by after resolution, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_factor: Option<String>,
    /// Facility allocations
    pub productions: Vec<ProductionRow>,
    /// Irreducible or stopped resources that must be supplied
    pub base_inputs: Vec<FlowRow>,
    /// Non-zero net flows per resource (positive means surplus)
    pub net_flows: Vec<FlowRow>,
}

impl Report {
    /// Builds a report from a resolved sum.
    pub fn new(sum: &RecipeSum<'_>, economy: &EconomyDefinition, prefs: &DisplayPreferences) -> Self {
        let zero = Rational::default();
        Self {
            mode: prefs.mode,
            rate_unit: match prefs.mode {
                ComputationMode::Rate => Some(prefs.rate_unit),
                ComputationMode::Count => None,
            },
            scale_factor: None,
            productions: sum
                .productions()
                .iter()
                .map(|production| ProductionRow::new(production, economy, prefs))
                .collect(),
            base_inputs: sum
                .base_inputs()
                .iter()
                .map(|(resource, quantity)| FlowRow::new(resource, quantity, economy, prefs))
                .collect(),
            net_flows: sum
                .total_rates()
                .into_iter()
                .filter(|(_, quantity)| *quantity != zero)
                .map(|(resource, quantity)| FlowRow::new(resource, &quantity, economy, prefs))
                .collect(),
        }
    }

    /// Records that the underlying sum was scaled by `factor`.
    pub fn with_scale_factor(mut self, factor: &Rational) -> Self {
        self.scale_factor = Some(factor.to_string());
        self
    }
}

fn join_flows(flows: &[FlowRow]) -> String {
    flows
        .iter()
        .map(|flow| format!("{} {}", flow.display, flow.name))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[PRODUCTION]")?;
        writeln!(f, "----------------------------------------------------------------")?;
        if self.productions.is_empty() {
            writeln!(f, "  (nothing to produce)")?;
        }
        for row in &self.productions {
            let number = row
                .recipe_number
                .map_or_else(|| "-".to_string(), |number| format!("#{}", number));
            writeln!(
                f,
                "  {:<5} {} x {} ({})",
                number,
                row.cardinality_display,
                row.entity_name,
                row.speed_percent
            )?;
            match &row.recipe_name {
                Some(name) => writeln!(f, "        {}: {}", name, row.recipe)?,
                None => writeln!(f, "        {}", row.recipe)?,
            }
            if !row.inputs.is_empty() {
                writeln!(f, "        in:  {}", join_flows(&row.inputs))?;
            }
            writeln!(f, "        out: {}", join_flows(&row.outputs))?;
        }

        if !self.base_inputs.is_empty() {
            writeln!(f)?;
            writeln!(f, "[BASE INPUTS]")?;
            writeln!(f, "----------------------------------------------------------------")?;
            for flow in &self.base_inputs {
                writeln!(f, "  {:<30} {:>14}", flow.name, flow.display)?;
            }
        }

        if !self.net_flows.is_empty() {
            writeln!(f)?;
            writeln!(f, "[NET FLOWS]")?;
            writeln!(f, "----------------------------------------------------------------")?;
            for flow in &self.net_flows {
                writeln!(f, "  {:<30} {:>14}", flow.name, flow.display)?;
            }
        }

        if let Some(factor) = &self.scale_factor {
            writeln!(f)?;
            writeln!(f, "  Scaled by {}", factor)?;
        }
        Ok(())
    }
}

/// Prints a report to stdout.
pub fn display_report(report: &Report) {
    println!();
    println!("{}", report);
}

/// Serializes a report as pretty-printed JSON.
pub fn report_to_json(report: &Report) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[derive(Serialize)]
struct CsvRecord<'r> {
    section: &'static str,
    recipe_number: Option<usize>,
    recipe: Option<&'r str>,
    entity: Option<&'r str>,
    speed: Option<&'r str>,
    cardinality: Option<&'r str>,
    resource: Option<&'r str>,
    quantity: Option<&'r str>,
    value: Option<f64>,
}

/// Serializes a report as CSV with one row per production and base input.
pub fn report_to_csv(report: &Report) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for row in &report.productions {
        writer.serialize(CsvRecord {
            section: "production",
            recipe_number: row.recipe_number,
            recipe: Some(&row.recipe),
            entity: Some(&row.entity),
            speed: Some(&row.speed),
            cardinality: Some(&row.cardinality),
            resource: None,
            quantity: None,
            value: None,
        })?;
    }
    for flow in &report.base_inputs {
        writer.serialize(CsvRecord {
            section: "base_input",
            recipe_number: None,
            recipe: None,
            entity: None,
            speed: None,
            cardinality: None,
            resource: Some(&flow.resource),
            quantity: Some(&flow.exact),
            value: Some(flow.value),
        })?;
    }

    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
