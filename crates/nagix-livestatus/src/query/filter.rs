//! Filter predicates and their Livestatus stack rendering.
//!
//! Livestatus evaluates `Filter:` lines on a stack: `And: n` and `Or: n`
//! pop the last `n` filters and push their combination. A [`Filter`] tree is
//! rendered post-order, so nested groups come out in the order the stack
//! needs them.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::QuerySyntaxError;

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `~`, regular expression match.
    Match,
    /// `!~`
    NotMatch,
    /// `=~`, case-insensitive equality.
    EqualIgnoreCase,
    /// `!=~`
    NotEqualIgnoreCase,
    /// `~~`, case-insensitive regular expression match.
    MatchIgnoreCase,
    /// `!~~`
    NotMatchIgnoreCase,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// List membership; rendered as `>=` which Livestatus applies to list
    /// columns.
    Contains,
}

impl Operator {
    /// Symbolic operators ordered so longer symbols are tried first.
    pub(crate) const SYMBOLS: &'static [(&'static str, Self)] = &[
        ("!=~", Self::NotEqualIgnoreCase),
        ("!~~", Self::NotMatchIgnoreCase),
        ("!=", Self::NotEqual),
        ("!~", Self::NotMatch),
        ("=~", Self::EqualIgnoreCase),
        ("~~", Self::MatchIgnoreCase),
        ("<=", Self::LessOrEqual),
        (">=", Self::GreaterOrEqual),
        ("=", Self::Equal),
        ("~", Self::Match),
        ("<", Self::Less),
        (">", Self::Greater),
    ];

    /// Operator text as written on a `Filter:` line.
    #[must_use]
    pub const fn as_lql(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Match => "~",
            Self::NotMatch => "!~",
            Self::EqualIgnoreCase => "=~",
            Self::NotEqualIgnoreCase => "!=~",
            Self::MatchIgnoreCase => "~~",
            Self::NotMatchIgnoreCase => "!~~",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual | Self::Contains => ">=",
        }
    }
}

/// A single `column operator value` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    column: String,
    operator: Operator,
    value: String,
}

impl Predicate {
    /// Creates a predicate. Validation happens when the query is built.
    #[must_use]
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    /// Column being compared.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Comparison operator.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Literal compared against.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    fn validate(&self) -> Result<(), QuerySyntaxError> {
        validate_column(&self.column)?;
        if self
            .value
            .chars()
            .any(|ch| matches!(ch, '\n' | '\r' | '\0'))
        {
            return Err(QuerySyntaxError::InvalidValue {
                column: self.column.clone(),
            });
        }
        Ok(())
    }
}

/// Boolean combination of predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// A single comparison.
    Predicate(Predicate),
    /// Every member must match.
    All(Vec<Filter>),
    /// At least one member must match.
    Any(Vec<Filter>),
}

impl Filter {
    /// Builds a single-predicate filter.
    #[must_use]
    pub fn predicate(column: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self::Predicate(Predicate::new(column, operator, value))
    }

    /// Builds a `column = value` filter.
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::predicate(column, Operator::Equal, value)
    }

    /// Matches when any of `columns` equals `value`, e.g. looking a host up
    /// by name, alias or address.
    #[must_use]
    pub fn any_of<I, S>(columns: I, value: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut members: Vec<Self> = columns
            .into_iter()
            .map(|column| Self::eq(column, value))
            .collect();
        if members.len() == 1
            && let Some(single) = members.pop()
        {
            return single;
        }
        Self::Any(members)
    }

    /// Conjunction of `self` and `other`, flattening nested conjunctions.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::All(mut members) => {
                members.push(other);
                Self::All(members)
            }
            first => Self::All(vec![first, other]),
        }
    }

    /// Disjunction of `self` and `other`, flattening nested disjunctions.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Any(mut members) => {
                members.push(other);
                Self::Any(members)
            }
            first => Self::Any(vec![first, other]),
        }
    }

    /// Checks column names, values and group sizes.
    ///
    /// # Errors
    ///
    /// Returns [`QuerySyntaxError::InvalidColumn`] or
    /// [`QuerySyntaxError::InvalidValue`] for a bad predicate and
    /// [`QuerySyntaxError::EmptyGroup`] for a group without members.
    pub fn validate(&self) -> Result<(), QuerySyntaxError> {
        match self {
            Self::Predicate(predicate) => predicate.validate(),
            Self::All(members) | Self::Any(members) => {
                if members.is_empty() {
                    return Err(QuerySyntaxError::EmptyGroup);
                }
                members.iter().try_for_each(Self::validate)
            }
        }
    }

    pub(crate) fn write_lql(&self, out: &mut String) {
        match self {
            Self::Predicate(predicate) => {
                let _ = writeln!(
                    out,
                    "Filter: {} {} {}",
                    predicate.column,
                    predicate.operator.as_lql(),
                    predicate.value
                );
            }
            Self::All(members) => write_group(out, members, "And"),
            Self::Any(members) => write_group(out, members, "Or"),
        }
    }
}

fn write_group(out: &mut String, members: &[Filter], combinator: &str) {
    for member in members {
        member.write_lql(out);
    }
    if members.len() > 1 {
        let _ = writeln!(out, "{combinator}: {}", members.len());
    }
}

/// Checks that a column name is a bare Livestatus identifier.
pub(crate) fn validate_column(column: &str) -> Result<(), QuerySyntaxError> {
    let valid = !column.is_empty()
        && column
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(QuerySyntaxError::InvalidColumn(column.to_owned()))
    }
}
