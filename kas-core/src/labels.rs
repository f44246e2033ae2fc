//! Label selectors: parsing the query string grammar, matching and display formatting.
use crate::Error;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

// local type aliases
type Map = BTreeMap<String, String>;
type Expressions = Vec<Expression>;

/// A selector expression with existing operations
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expression {
    /// Label value is one of the set
    In(String, BTreeSet<String>),
    /// Label is absent or its value is not in the set
    NotIn(String, BTreeSet<String>),
    /// Label has exactly this value
    Equal(String, String),
    /// Label is absent or has another value
    NotEqual(String, String),
    /// Label is present
    Exists(String),
    /// Label is absent
    DoesNotExist(String),
}

/// Perform selection on a list of expressions
///
/// All expressions must match. An empty selector matches everything.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct Selector(Expressions);

impl Selector {
    /// Create a selector from a vector of expressions
    fn from_expressions(exprs: Expressions) -> Self {
        Self(exprs)
    }

    /// Indicates whether this label selector matches everything
    pub fn selects_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the given label set satisfies every expression
    pub fn matches(&self, labels: &Map) -> bool {
        self.0.iter().all(|expr| expr.matches(labels))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, expr) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{expr}")?;
        }
        Ok(())
    }
}

// === Expression ===

impl Expression {
    fn key(&self) -> &str {
        match self {
            Expression::In(key, _)
            | Expression::NotIn(key, _)
            | Expression::Equal(key, _)
            | Expression::NotEqual(key, _)
            | Expression::Exists(key)
            | Expression::DoesNotExist(key) => key,
        }
    }

    fn matches(&self, labels: &Map) -> bool {
        match self {
            Expression::In(key, values) => match labels.get(key) {
                Some(v) => values.contains(v),
                None => false,
            },
            Expression::NotIn(key, values) => match labels.get(key) {
                Some(v) => !values.contains(v),
                None => true,
            },
            Expression::Exists(key) => labels.contains_key(key),
            Expression::DoesNotExist(key) => !labels.contains_key(key),
            Expression::Equal(key, value) => labels.get(key) == Some(value),
            Expression::NotEqual(key, value) => labels.get(key) != Some(value),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |values: &BTreeSet<String>| values.iter().cloned().collect::<Vec<_>>().join(",");
        match self {
            Expression::In(key, values) => write!(f, "{key} in ({})", join(values)),
            Expression::NotIn(key, values) => write!(f, "{key} notin ({})", join(values)),
            Expression::Equal(key, value) => write!(f, "{key}={value}"),
            Expression::NotEqual(key, value) => write!(f, "{key}!={value}"),
            Expression::Exists(key) => write!(f, "{key}"),
            Expression::DoesNotExist(key) => write!(f, "!{key}"),
        }
    }
}

// === Parsing ===

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Identifier(String),
    Comma,
    OpenParen,
    CloseParen,
    Not,
    Equals,
    DoubleEquals,
    NotEquals,
    In,
    NotIn,
}

fn is_special(c: char) -> bool {
    matches!(c, '!' | '=' | ',' | '(' | ')' | '<' | '>') || c.is_whitespace()
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = vec![];
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '(' => {
                chars.next();
                tokens.push(Token::OpenParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::CloseParen);
            }
            '!' => {
                chars.next();
                if chars.next_if_eq(&'=').is_some() {
                    tokens.push(Token::NotEquals);
                } else {
                    tokens.push(Token::Not);
                }
            }
            '=' => {
                chars.next();
                if chars.next_if_eq(&'=').is_some() {
                    tokens.push(Token::DoubleEquals);
                } else {
                    tokens.push(Token::Equals);
                }
            }
            '<' | '>' => return Err(format!("unsupported operator {c:?}")),
            _ => {
                let mut ident = String::new();
                while let Some(c) = chars.next_if(|c| !is_special(*c)) {
                    ident.push(c);
                }
                tokens.push(match ident.as_str() {
                    "in" => Token::In,
                    "notin" => Token::NotIn,
                    _ => Token::Identifier(ident),
                });
            }
        }
    }
    Ok(tokens)
}

fn validate_key(key: &str) -> Result<(), String> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };
    if let Some(prefix) = prefix {
        if prefix.is_empty() || prefix.len() > 253 {
            return Err(format!("invalid label key prefix {prefix:?}"));
        }
    }
    if name.is_empty() || name.len() > 63 {
        return Err(format!("invalid label key {key:?}: name part must be 1-63 characters"));
    }
    if !is_qualified_name(name) || prefix.is_some_and(|p| !is_qualified_name(p)) {
        return Err(format!("invalid label key {key:?}"));
    }
    Ok(())
}

/// Alphanumerics, `-`, `_` and `.`, starting and ending with an alphanumeric
fn is_qualified_name(s: &str) -> bool {
    let edges = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    edges(s.chars().next())
        && edges(s.chars().next_back())
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn validate_value(value: &str) -> Result<(), String> {
    if value.is_empty() || (value.len() <= 63 && is_qualified_name(value)) {
        Ok(())
    } else {
        Err(format!("invalid label value {value:?}"))
    }
}

struct Parser {
    tokens: std::iter::Peekable<std::vec::IntoIter<Token>>,
}

impl Parser {
    fn parse(mut self) -> Result<Expressions, String> {
        let mut exprs = vec![];
        if self.tokens.peek().is_none() {
            return Ok(exprs);
        }
        loop {
            exprs.push(self.requirement()?);
            match self.tokens.next() {
                None => return Ok(exprs),
                Some(Token::Comma) => continue,
                Some(other) => return Err(format!("expected ',' but found {other:?}")),
            }
        }
    }

    fn identifier(&mut self, what: &str) -> Result<String, String> {
        match self.tokens.next() {
            Some(Token::Identifier(ident)) => Ok(ident),
            Some(other) => Err(format!("expected {what} but found {other:?}")),
            None => Err(format!("expected {what} but found end of input")),
        }
    }

    // A missing value (`key=` followed by `,` or the end) is the empty string.
    fn value(&mut self) -> Result<String, String> {
        let value = match self.tokens.peek() {
            None | Some(Token::Comma) => String::new(),
            _ => self.identifier("value")?,
        };
        validate_value(&value)?;
        Ok(value)
    }

    fn values(&mut self) -> Result<BTreeSet<String>, String> {
        match self.tokens.next() {
            Some(Token::OpenParen) => {}
            _ => return Err("expected '(' after set operator".into()),
        }
        let mut values = BTreeSet::new();
        loop {
            match self.tokens.next() {
                Some(Token::Identifier(value)) => {
                    validate_value(&value)?;
                    values.insert(value);
                }
                Some(other) => return Err(format!("expected value but found {other:?}")),
                None => return Err("unterminated value set".into()),
            }
            match self.tokens.next() {
                Some(Token::Comma) => continue,
                Some(Token::CloseParen) => return Ok(values),
                Some(other) => return Err(format!("expected ',' or ')' but found {other:?}")),
                None => return Err("unterminated value set".into()),
            }
        }
    }

    fn requirement(&mut self) -> Result<Expression, String> {
        if self.tokens.next_if_eq(&Token::Not).is_some() {
            let key = self.identifier("key")?;
            validate_key(&key)?;
            return Ok(Expression::DoesNotExist(key));
        }
        let key = self.identifier("key")?;
        validate_key(&key)?;
        match self.tokens.peek() {
            None | Some(Token::Comma) => Ok(Expression::Exists(key)),
            Some(Token::Equals | Token::DoubleEquals) => {
                self.tokens.next();
                Ok(Expression::Equal(key, self.value()?))
            }
            Some(Token::NotEquals) => {
                self.tokens.next();
                Ok(Expression::NotEqual(key, self.value()?))
            }
            Some(Token::In) => {
                self.tokens.next();
                Ok(Expression::In(key, self.values()?))
            }
            Some(Token::NotIn) => {
                self.tokens.next();
                Ok(Expression::NotIn(key, self.values()?))
            }
            Some(other) => Err(format!("unexpected {other:?} after key {key:?}")),
        }
    }
}

impl FromStr for Selector {
    type Err = Error;

    /// Parse the `labelSelector` query string grammar
    fn from_str(selector: &str) -> Result<Self, Self::Err> {
        let err = |reason| Error::LabelSelector {
            selector: selector.to_string(),
            reason,
        };
        let tokens = tokenize(selector).map_err(err)?;
        let parser = Parser {
            tokens: tokens.into_iter().peekable(),
        };
        parser.parse().map(Selector::from_expressions).map_err(err)
    }
}

// === Structured selectors ===

impl TryFrom<&LabelSelector> for Selector {
    type Error = Error;

    /// Convert a structured selector, with expressions sorted by key
    fn try_from(value: &LabelSelector) -> Result<Self, Self::Error> {
        let mut exprs: Expressions = value
            .match_labels
            .iter()
            .flatten()
            .map(|(k, v)| Expression::Equal(k.clone(), v.clone()))
            .collect();
        for requirement in value.match_expressions.iter().flatten() {
            exprs.push(Expression::try_from(requirement)?);
        }
        exprs.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(Self(exprs))
    }
}

impl TryFrom<&LabelSelectorRequirement> for Expression {
    type Error = Error;

    fn try_from(requirement: &LabelSelectorRequirement) -> Result<Self, Self::Error> {
        let key = requirement.key.clone();
        let invalid = |reason: &str| Error::InvalidRequirement {
            key: requirement.key.clone(),
            reason: reason.to_string(),
        };
        let values: BTreeSet<String> = requirement.values.iter().flatten().cloned().collect();
        match requirement.operator.as_str() {
            "In" | "NotIn" if values.is_empty() => Err(invalid("values set can't be empty")),
            "In" => Ok(Expression::In(key, values)),
            "NotIn" => Ok(Expression::NotIn(key, values)),
            "Exists" | "DoesNotExist" if !values.is_empty() => Err(invalid("values set must be empty")),
            "Exists" => Ok(Expression::Exists(key)),
            "DoesNotExist" => Ok(Expression::DoesNotExist(key)),
            other => Err(invalid(&format!("{other:?} is not a valid label selector operator"))),
        }
    }
}

/// Format a structured selector for display
///
/// An unset or empty selector is `<none>`, an unconvertible one `<error>`.
pub fn format_label_selector(selector: Option<&LabelSelector>) -> String {
    let formatted = match selector {
        Some(selector) => match Selector::try_from(selector) {
            Ok(s) => s.to_string(),
            Err(_) => return "<error>".into(),
        },
        None => String::new(),
    };
    if formatted.is_empty() {
        "<none>".into()
    } else {
        formatted
    }
}

/// Format a label map as sorted `key=value` pairs, `<none>` when empty
pub fn format_labels(labels: &Map) -> String {
    if labels.is_empty() {
        return "<none>".into();
    }
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}
