//! Parser for recipe strings and production specifiers.
//!
//! Both grammars share one tokenizer:
//!
//! ```text
//! recipe     := side "->" side
//! side       := term ("+" term)*
//! term       := [value] identifier
//!
//! specifier  := [multiplier] ("#" integer | identifier) ["@" identifier] [annotated]
//! multiplier := annotated | value ":" identifier | ":" identifier
//! annotated  := value ["%"]
//! value      := integer | decimal | integer "/" integer
//! identifier := [a-zA-Z_][-a-zA-Z_0-9]*   (not ending in "-")
//! ```
//!
//! The parsers only produce parse trees. Looking up rate scalars or resources
//! is left to [`crate::specifier`] and [`crate::economy`].

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ParseError, ParseErrorKind};
use crate::numeric::{int, parse_rational, Rational};

/// Parse tree of a recipe string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecipe {
    /// Ingredient terms as `(cardinality, identifier)`
    pub lhs: Vec<(Rational, String)>,
    /// Product terms as `(cardinality, identifier)`
    pub rhs: Vec<(Rational, String)>,
}

/// What a specifier asks to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTarget {
    /// A resource identifier
    Resource(String),
    /// A one-based recipe number (`#12`)
    RecipeNumber(usize),
}

/// Multiplier in front of a specifier target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMultiplier {
    /// Absolute value, already divided by 100 for percentages
    pub value: Option<Rational>,
    /// Named rate scalar following a colon
    pub rate_scalar: Option<String>,
}

/// Parse tree of a production specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSpecifier {
    /// Optional multiplier
    pub multiplier: Option<ParsedMultiplier>,
    /// Resource or recipe number
    pub target: ParsedTarget,
    /// Facility override (`@identifier`)
    pub at: Option<String>,
    /// Speed factor override
    pub speed: Option<Rational>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Arrow,
    Number,
    Identifier,
    Plus,
    Percent,
    Colon,
    Hash,
    At,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    position: usize,
}

fn token_regex() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?:(?P<space>\s+)",
            r"|(?P<arrow>->)",
            r"|(?P<number>\d+/\d+|\d*\.\d+|\d+)",
            r"|(?P<identifier>[a-zA-Z_][-a-zA-Z_0-9]*)",
            r"|(?P<symbol>[+%:#@]))",
        ))
        .expect("token pattern is valid")
    })
}

fn tokenize(input: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let re = token_regex();
    let mut tokens = Vec::new();
    let mut position = 0;

    while position < input.len() {
        let rest = &input[position..];
        let captures = re.captures(rest).ok_or_else(|| ParseError {
            kind: ParseErrorKind::UnexpectedCharacter(rest.chars().next().unwrap_or('?')),
            input: input.to_string(),
            position,
        })?;

        let mut whole = captures.get(0).map_or(0, |m| m.end());
        // A trailing dash followed by '>' starts the arrow, as in "a->b"
        if captures.name("identifier").is_some()
            && rest[..whole].ends_with('-')
            && rest[whole..].starts_with('>')
        {
            whole -= 1;
        }
        let kind = if captures.name("space").is_some() {
            None
        } else if captures.name("arrow").is_some() {
            Some(TokenKind::Arrow)
        } else if captures.name("number").is_some() {
            Some(TokenKind::Number)
        } else if captures.name("identifier").is_some() {
            Some(TokenKind::Identifier)
        } else {
            match &rest[..whole] {
                "+" => Some(TokenKind::Plus),
                "%" => Some(TokenKind::Percent),
                ":" => Some(TokenKind::Colon),
                "#" => Some(TokenKind::Hash),
                _ => Some(TokenKind::At),
            }
        };

        if let Some(kind) = kind {
            tokens.push(Token {
                kind,
                text: &rest[..whole],
                position,
            });
        }
        position += whole;
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token<'a>>,
    cursor: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, ParseError> {
        Ok(Self {
            input,
            tokens: tokenize(input)?,
            cursor: 0,
        })
    }

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.cursor).map(|token| token.kind)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        let position = self
            .tokens
            .get(self.cursor)
            .map_or(self.input.len(), |token| token.position);
        ParseError {
            kind,
            input: self.input.to_string(),
            position,
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token<'a>, ParseError> {
        match self.tokens.get(self.cursor).copied() {
            Some(token) if token.kind == kind => {
                self.cursor += 1;
                Ok(token)
            }
            Some(token) => Err(self.error(ParseErrorKind::UnexpectedToken {
                expected,
                found: token.text.to_string(),
            })),
            None => Err(self.error(ParseErrorKind::UnexpectedEnd { expected })),
        }
    }

    fn accept(&mut self, kind: TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn finish(&self) -> Result<(), ParseError> {
        match self.tokens.get(self.cursor) {
            None => Ok(()),
            Some(token) => Err(self.error(ParseErrorKind::UnexpectedToken {
                expected: "end of input",
                found: token.text.to_string(),
            })),
        }
    }

    fn value(&mut self) -> Result<Rational, ParseError> {
        let token = self.expect(TokenKind::Number, "a number")?;
        parse_rational(token.text).ok_or_else(|| ParseError {
            kind: ParseErrorKind::InvalidNumber(token.text.to_string()),
            input: self.input.to_string(),
            position: token.position,
        })
    }

    fn annotated_value(&mut self) -> Result<Rational, ParseError> {
        let value = self.value()?;
        if self.accept(TokenKind::Percent) {
            Ok(value / int(100))
        } else {
            Ok(value)
        }
    }

    fn identifier(&mut self, expected: &'static str) -> Result<String, ParseError> {
        self.expect(TokenKind::Identifier, expected)
            .map(|token| token.text.to_string())
    }

    fn recipe_side(&mut self) -> Result<Vec<(Rational, String)>, ParseError> {
        let mut terms = vec![self.recipe_term()?];
        while self.accept(TokenKind::Plus) {
            terms.push(self.recipe_term()?);
        }
        Ok(terms)
    }

    fn recipe_term(&mut self) -> Result<(Rational, String), ParseError> {
        let cardinality = if self.peek() == Some(TokenKind::Number) {
            self.value()?
        } else {
            int(1)
        };
        let resource = self.identifier("a resource identifier")?;
        Ok((cardinality, resource))
    }

    fn multiplier(&mut self) -> Result<Option<ParsedMultiplier>, ParseError> {
        match self.peek() {
            Some(TokenKind::Number) => {
                let value = self.value()?;
                if self.accept(TokenKind::Percent) {
                    return Ok(Some(ParsedMultiplier {
                        value: Some(value / int(100)),
                        rate_scalar: None,
                    }));
                }
                let rate_scalar = if self.accept(TokenKind::Colon) {
                    Some(self.identifier("a rate scalar identifier")?)
                } else {
                    None
                };
                Ok(Some(ParsedMultiplier {
                    value: Some(value),
                    rate_scalar,
                }))
            }
            Some(TokenKind::Colon) => {
                self.cursor += 1;
                let rate_scalar = self.identifier("a rate scalar identifier")?;
                Ok(Some(ParsedMultiplier {
                    value: None,
                    rate_scalar: Some(rate_scalar),
                }))
            }
            _ => Ok(None),
        }
    }

    fn target(&mut self) -> Result<ParsedTarget, ParseError> {
        if self.accept(TokenKind::Hash) {
            let token = self.expect(TokenKind::Number, "a recipe number")?;
            let number = token.text.parse::<usize>().map_err(|_| ParseError {
                kind: ParseErrorKind::InvalidNumber(token.text.to_string()),
                input: self.input.to_string(),
                position: token.position,
            })?;
            Ok(ParsedTarget::RecipeNumber(number))
        } else {
            self.identifier("a resource identifier or '#'")
                .map(ParsedTarget::Resource)
        }
    }
}

/// Parses a recipe string such as `"12 a + 7 b -> 13 c"`.
///
/// Cardinalities default to one when omitted.
///
/// # Example
///
/// ```
/// use ecocalc::parser::parse_recipe;
/// use ecocalc::numeric::int;
///
/// let parsed = parse_recipe("iron + 2 coal -> steel").unwrap();
/// assert_eq!(parsed.lhs, vec![(int(1), "iron".to_string()), (int(2), "coal".to_string())]);
/// assert_eq!(parsed.rhs, vec![(int(1), "steel".to_string())]);
/// ```
pub fn parse_recipe(input: &str) -> Result<ParsedRecipe, ParseError> {
    let mut parser = Parser::new(input)?;
    let lhs = parser.recipe_side()?;
    parser.expect(TokenKind::Arrow, "'->'")?;
    let rhs = parser.recipe_side()?;
    parser.finish()?;
    Ok(ParsedRecipe { lhs, rhs })
}

/// Parses a production specifier such as `"2:yellow_belt iron_plate"` or
/// `"14 #123 @constructor 250%"`.
pub fn parse_production_specifier(input: &str) -> Result<ParsedSpecifier, ParseError> {
    let mut parser = Parser::new(input)?;
    let multiplier = parser.multiplier()?;
    let target = parser.target()?;
    let at = if parser.accept(TokenKind::At) {
        Some(parser.identifier("a production entity identifier")?)
    } else {
        None
    };
    let speed = if parser.peek() == Some(TokenKind::Number) {
        Some(parser.annotated_value()?)
    } else {
        None
    };
    parser.finish()?;
    Ok(ParsedSpecifier {
        multiplier,
        target,
        at,
        speed,
    })
}
