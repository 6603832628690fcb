//! Error types for ecocalc.
//!
//! Errors fall into four groups:
//!
//! - [`ParseError`]: a recipe string or production specifier does not match
//!   the grammar.
//! - [`EconomyError`]: the economy definition document is inconsistent. These
//!   are fatal at load time.
//! - [`ResolveError`]: a production request cannot be resolved against an
//!   otherwise valid economy.
//! - [`ReportError`]: a resolved report cannot be serialized.
//!
//! A resource that no recipe produces is *not* an error; it simply ends the
//! recursive expansion and shows up as a base input.

use std::fmt;

use thiserror::Error;

/// What went wrong while parsing a recipe or specifier string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A character that starts no valid token
    UnexpectedCharacter(char),
    /// A token that is valid on its own but not at this position
    UnexpectedToken {
        /// Description of what the grammar allows here
        expected: &'static str,
        /// Text of the offending token
        found: String,
    },
    /// The input ended while more tokens were required
    UnexpectedEnd {
        /// Description of what the grammar allows here
        expected: &'static str,
    },
    /// A numeric literal that cannot be represented (e.g. `1/0`)
    InvalidNumber(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            ParseErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "expected {}, found '{}'", expected, found)
            }
            ParseErrorKind::UnexpectedEnd { expected } => {
                write!(f, "expected {}, found end of input", expected)
            }
            ParseErrorKind::InvalidNumber(text) => write!(f, "invalid number '{}'", text),
        }
    }
}

/// A recipe or specifier string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse \"{input}\" at offset {position}: {kind}")]
pub struct ParseError {
    /// The kind of failure
    pub kind: ParseErrorKind,
    /// The complete input string
    pub input: String,
    /// Byte offset into `input` where the failure was detected
    pub position: usize,
}

/// Configuration errors found while loading an economy definition.
#[derive(Debug, Error)]
pub enum EconomyError {
    /// The document could not be read
    #[error("cannot read economy definition: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON or does not have the expected shape
    #[error("malformed economy definition: {0}")]
    Json(#[from] serde_json::Error),

    /// Two or more resources share a display name
    #[error("duplicate resource name found: {}", .0.join(", "))]
    DuplicateResourceName(Vec<String>),

    /// A recipe references resources that were never declared
    #[error("recipe \"{recipe}\" has {} unknown resource(s): {}", .resources.len(), .resources.join(", "))]
    UnknownResource {
        /// The recipe as written in the document
        recipe: String,
        /// Sorted list of the unknown identifiers
        resources: Vec<String>,
    },

    /// A production entity group lists a member that is not a production entity
    #[error("production entity group \"{group}\" references unknown production entity \"{member}\"")]
    UnknownGroupMember {
        /// Group identifier
        group: String,
        /// Offending member identifier
        member: String,
    },

    /// A production entity's speed range is empty or not positive
    #[error("production entity \"{0}\" needs positive speed factors with minimum <= maximum")]
    InvalidSpeedRange(String),

    /// Only one of the minimum and maximum speed factors was given
    #[error("production entity \"{0}\" must specify both min_speed_factor and max_speed_factor")]
    IncompleteSpeedRange(String),

    /// A rate scalar uses a unit other than `upm` or `ups`
    #[error("rate scalar \"{scalar}\" has unknown unit \"{unit}\" (expected upm or ups)")]
    UnknownRateUnit {
        /// Rate scalar identifier
        scalar: String,
        /// The unit as written
        unit: String,
    },

    /// A numeric field holds something that is not a rational literal
    #[error("invalid number \"{value}\" for {field}")]
    InvalidNumber {
        /// Where the value was found
        field: String,
        /// The value as written
        value: String,
    },

    /// A rate scalar's value is zero or negative
    #[error("rate scalar \"{0}\" must have a positive value")]
    NonPositiveRateScalar(String),

    /// A recipe's execution time is zero or negative
    #[error("recipe \"{0}\" must have a positive execution time")]
    NonPositiveExecutionTime(String),

    /// A recipe string does not follow the recipe grammar
    #[error(transparent)]
    RecipeParse(#[from] ParseError),
}

/// Errors raised while resolving production requests.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A specifier names a resource the economy does not know
    #[error("unknown resource \"{0}\"")]
    UnknownResource(String),

    /// A facility reference is neither a production entity nor a group
    #[error("unknown production entity \"{0}\"")]
    UnknownProductionEntity(String),

    /// A group exists but none of its members is enabled in the active tier
    #[error("no member of production entity group \"{group}\" is enabled in tier \"{tier}\"")]
    NoEligibleEntity {
        /// Group identifier
        group: String,
        /// Active tier identifier
        tier: String,
    },

    /// A specifier uses a rate scalar that was never declared
    #[error("unknown rate scalar \"{0}\"")]
    UnknownRateScalar(String),

    /// The requested tier was never declared
    #[error("unknown tier \"{0}\"")]
    UnknownTier(String),

    /// Resolving by recipe number is not available
    #[error("resolving by recipe number (#{0}) is not supported")]
    RecipeNumberNotSupported(usize),

    /// Rate scalars make no sense when counting items
    #[error("rate scalar \"{0}\" cannot be used in count mode")]
    RateScalarInCountMode(String),

    /// A speed override lies outside what the chosen entity supports
    #[error("speed factor {speed} is outside the range {min}..={max} of \"{entity}\"")]
    SpeedOutOfRange {
        /// Production entity identifier
        entity: String,
        /// Requested speed factor
        speed: String,
        /// Entity minimum
        min: String,
        /// Entity maximum
        max: String,
    },

    /// Several recipes form a loop that the self-reference filter cannot see
    #[error("cyclic recipe dependency: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    /// Two productions that differ in recipe, entity or speed were added
    #[error("cannot add productions of \"{left}\" and \"{right}\"")]
    IncompatibleProductions {
        /// Description of the left operand
        left: String,
        /// Description of the right operand
        right: String,
    },

    /// A resolved sum was asked to scale by zero or a negative factor
    #[error("multiplier {0} must be positive")]
    NonPositiveMultiplier(String),

    /// A specifier string does not follow the specifier grammar
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Convenience alias for resolution results.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors raised while rendering a report in a machine-readable format.
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON serialization failed
    #[error("cannot serialize report as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization failed
    #[error("cannot serialize report as CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV writer could not be flushed
    #[error("cannot flush CSV output: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV output was not valid UTF-8
    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
