//! # ecocalc
//!
//! A command-line tool and library for economy calculation in
//! factory-building games.
//!
//! Given an economy definition (resources, recipes, production entities and
//! their groups, rate scalars and tiers) this crate computes which facilities,
//! and how many of each, are needed to reach a requested production rate or
//! item count. Every requested resource is traced back through its recipes
//! until only base inputs remain.
//!
//! All quantities are exact rationals ([`numeric::Rational`]); floating point
//! only appears when a result is displayed.
//!
//! ## Modules
//!
//! - [`numeric`] - Exact rational helpers and number formatting
//! - [`error`] - Error types
//! - [`models`] - Resources, production entities, rate scalars, tiers and recipes
//! - [`parser`] - Recipe and production specifier grammars
//! - [`data`] - JSON economy definition loading
//! - [`economy`] - The validated economy definition
//! - [`specifier`] - Production requests
//! - [`production`] - Facility allocations and their sums
//! - [`resolver`] - Recipe resolution
//! - [`display`] - Output formatting and reports
//! - [`wasm`] - WebAssembly bindings
//!
//! ## Example Usage
//!
//! ```
//! use ecocalc::{
//!     data::load_economy_str,
//!     numeric::ratio,
//!     resolver::{ComputationMode, RecipeResolver, ResolverOptions},
//!     models::RateUnit,
//!     specifier::ProductionSpecifier,
//! };
//!
//! let economy = load_economy_str(r#"{
//!     "resources": {
//!         "a": { "name": "A" }, "b": { "name": "B" }, "c": { "name": "C" }
//!     },
//!     "production_entities": { "x": { "name": "X", "speed_factor": 0.75 } },
//!     "rate_scalars": { "yellow_belt": { "unit": "ups", "value": 15 } },
//!     "recipes": [ { "recipe": "12 a + 7 b -> 13 c", "at": "x", "time": 9 } ]
//! }"#).unwrap();
//!
//! let options = ResolverOptions::new(ComputationMode::Rate).with_rate_unit(RateUnit::UnitsPerSecond);
//! let resolver = RecipeResolver::new(&economy, options).unwrap();
//! let request = ProductionSpecifier::parse(":yellow_belt c", &economy).unwrap();
//! let sum = resolver.resolve(&[request]).unwrap();
//!
//! assert_eq!(sum.productions()[0].cardinality(), &ratio(180, 13));
//! ```

pub mod data;
pub mod display;
pub mod economy;
pub mod error;
pub mod models;
pub mod numeric;
pub mod parser;
pub mod production;
pub mod resolver;
pub mod specifier;
pub mod wasm;
