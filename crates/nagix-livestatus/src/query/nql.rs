//! Parser for NQL, the SQL-like text form of status queries.
//!
//! ```text
//! SELECT * | column[, column]* FROM table [WHERE expr] [LIMIT n]
//! expr      := term (OR term)*
//! term      := factor (AND factor)*
//! factor    := '(' expr ')' | column operator literal
//! operator  := = != ~ !~ =~ !=~ ~~ !~~ < > <= >= CONTAINS
//! literal   := 'quoted' | "quoted" | bareword
//! ```
//!
//! Keywords are case-insensitive. Quoted literals accept backslash escapes
//! for the quote character and the backslash itself.

use std::iter::Peekable;
use std::str::CharIndices;

use super::filter::{Filter, Operator};
use super::{Query, Table};
use crate::error::QuerySyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Word(String),
    Quoted(String),
    Operator(Operator),
    Comma,
    Star,
    Open,
    Close,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            Self::Word(text) => text.clone(),
            Self::Quoted(text) => format!("'{text}'"),
            Self::Operator(operator) => operator.as_lql().to_owned(),
            Self::Comma => String::from(","),
            Self::Star => String::from("*"),
            Self::Open => String::from("("),
            Self::Close => String::from(")"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

/// Parses NQL text into a validated [`Query`].
///
/// # Errors
///
/// Returns [`QuerySyntaxError`] for malformed text, an unknown table, or a
/// query that fails [`QueryBuilder::build`](super::QueryBuilder::build)
/// validation.
///
/// # Example
///
/// ```
/// use nagix_livestatus::{Table, parse_nql};
///
/// let query = parse_nql("SELECT name FROM hosts WHERE name = 'web01' OR alias = 'web01'")
///     .expect("valid NQL");
/// assert_eq!(query.table(), Table::Hosts);
/// assert_eq!(query.columns(), ["name"]);
/// ```
pub fn parse_nql(text: &str) -> Result<Query, QuerySyntaxError> {
    let tokens = tokenize(text)?;
    Parser { tokens, cursor: 0 }.query()
}

fn tokenize(text: &str) -> Result<Vec<Token>, QuerySyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some(&(position, ch)) = chars.peek() {
        let kind = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            ',' => single(&mut chars, TokenKind::Comma),
            '*' => single(&mut chars, TokenKind::Star),
            '(' => single(&mut chars, TokenKind::Open),
            ')' => single(&mut chars, TokenKind::Close),
            '\'' | '"' => TokenKind::Quoted(quoted(&mut chars, position)?),
            '=' | '!' | '~' | '<' | '>' => {
                let operator = operator_at(text, position)?;
                for _ in 0..operator.0.len() {
                    chars.next();
                }
                TokenKind::Operator(operator.1)
            }
            c if is_word_char(c) => TokenKind::Word(word(&mut chars)),
            other => {
                return Err(QuerySyntaxError::UnexpectedToken {
                    position,
                    found: other.to_string(),
                    expected: String::from("a query token"),
                });
            }
        };
        tokens.push(Token { kind, position });
    }
    Ok(tokens)
}

fn single(chars: &mut Peekable<CharIndices<'_>>, kind: TokenKind) -> TokenKind {
    chars.next();
    kind
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-' | ':' | '/' | '@' | '+')
}

fn word(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut text = String::new();
    while let Some(&(_, ch)) = chars.peek() {
        if !is_word_char(ch) {
            break;
        }
        text.push(ch);
        chars.next();
    }
    text
}

fn quoted(
    chars: &mut Peekable<CharIndices<'_>>,
    position: usize,
) -> Result<String, QuerySyntaxError> {
    let Some((_, quote)) = chars.next() else {
        return Err(QuerySyntaxError::UnterminatedString { position });
    };
    let mut text = String::new();
    while let Some((_, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, escaped)) => text.push(escaped),
                None => break,
            },
            c if c == quote => return Ok(text),
            c => text.push(c),
        }
    }
    Err(QuerySyntaxError::UnterminatedString { position })
}

fn operator_at(
    text: &str,
    position: usize,
) -> Result<(&'static str, Operator), QuerySyntaxError> {
    let rest = text.get(position..).unwrap_or_default();
    Operator::SYMBOLS
        .iter()
        .find(|(symbol, _)| rest.starts_with(symbol))
        .copied()
        .ok_or_else(|| QuerySyntaxError::UnexpectedToken {
            position,
            found: rest.chars().take(1).collect(),
            expected: String::from("a comparison operator"),
        })
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    fn query(mut self) -> Result<Query, QuerySyntaxError> {
        self.expect_keyword("SELECT")?;
        let columns = self.columns()?;
        self.expect_keyword("FROM")?;
        let table = self.table()?;
        let mut builder = Query::builder(table).columns(columns);
        if self.eat_keyword("WHERE") {
            builder = builder.filter(self.disjunction()?);
        }
        if self.eat_keyword("LIMIT") {
            builder = builder.limit(self.limit()?);
        }
        if let Some(token) = self.peek() {
            return Err(unexpected(token, "end of query"));
        }
        builder.build()
    }

    fn columns(&mut self) -> Result<Vec<String>, QuerySyntaxError> {
        if self.eat(&TokenKind::Star) {
            return Ok(Vec::new());
        }
        let mut columns = vec![self.word("a column name")?];
        while self.eat(&TokenKind::Comma) {
            columns.push(self.word("a column name")?);
        }
        Ok(columns)
    }

    fn table(&mut self) -> Result<Table, QuerySyntaxError> {
        let name = self.word("a table name")?;
        name.parse::<Table>()
            .map_err(|_| QuerySyntaxError::UnknownTable(name))
    }

    fn disjunction(&mut self) -> Result<Filter, QuerySyntaxError> {
        let mut members = vec![self.conjunction()?];
        while self.eat_keyword("OR") {
            members.push(self.conjunction()?);
        }
        Ok(collapse(members, Filter::Any))
    }

    fn conjunction(&mut self) -> Result<Filter, QuerySyntaxError> {
        let mut members = vec![self.factor()?];
        while self.eat_keyword("AND") {
            members.push(self.factor()?);
        }
        Ok(collapse(members, Filter::All))
    }

    fn factor(&mut self) -> Result<Filter, QuerySyntaxError> {
        if self.eat(&TokenKind::Open) {
            let inner = self.disjunction()?;
            return if self.eat(&TokenKind::Close) {
                Ok(inner)
            } else {
                Err(self.unexpected_here("')'"))
            };
        }
        let column = self.word("a column name")?;
        let operator = self.operator()?;
        let value = self.literal()?;
        Ok(Filter::predicate(column, operator, value))
    }

    fn operator(&mut self) -> Result<Operator, QuerySyntaxError> {
        let expected = "a comparison operator";
        let token = self.next_token(expected)?;
        match token.kind {
            TokenKind::Operator(operator) => Ok(operator),
            TokenKind::Word(ref text) if text.eq_ignore_ascii_case("CONTAINS") => {
                Ok(Operator::Contains)
            }
            _ => Err(unexpected(&token, expected)),
        }
    }

    fn literal(&mut self) -> Result<String, QuerySyntaxError> {
        let expected = "a value";
        let token = self.next_token(expected)?;
        match token.kind {
            TokenKind::Word(text) | TokenKind::Quoted(text) => Ok(text),
            _ => Err(unexpected(&token, expected)),
        }
    }

    fn limit(&mut self) -> Result<usize, QuerySyntaxError> {
        let text = self.word("a row limit")?;
        text.parse::<usize>()
            .map_err(|_| QuerySyntaxError::InvalidLimit(text))
    }

    fn word(&mut self, expected: &str) -> Result<String, QuerySyntaxError> {
        let token = self.next_token(expected)?;
        match token.kind {
            TokenKind::Word(text) => Ok(text),
            _ => Err(unexpected(&token, expected)),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), QuerySyntaxError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected_here(keyword))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let matches = matches!(
            self.peek(),
            Some(Token { kind: TokenKind::Word(text), .. }) if text.eq_ignore_ascii_case(keyword)
        );
        if matches {
            self.cursor += 1;
        }
        matches
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        let matches = self.peek().is_some_and(|token| &token.kind == kind);
        if matches {
            self.cursor += 1;
        }
        matches
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn next_token(&mut self, expected: &str) -> Result<Token, QuerySyntaxError> {
        let token = self
            .tokens
            .get(self.cursor)
            .cloned()
            .ok_or_else(|| QuerySyntaxError::UnexpectedEnd {
                expected: expected.to_owned(),
            })?;
        self.cursor += 1;
        Ok(token)
    }

    fn unexpected_here(&self, expected: &str) -> QuerySyntaxError {
        match self.peek() {
            Some(token) => unexpected(token, expected),
            None => QuerySyntaxError::UnexpectedEnd {
                expected: expected.to_owned(),
            },
        }
    }
}

fn unexpected(token: &Token, expected: &str) -> QuerySyntaxError {
    QuerySyntaxError::UnexpectedToken {
        position: token.position,
        found: token.kind.describe(),
        expected: expected.to_owned(),
    }
}

fn collapse(mut members: Vec<Filter>, group: fn(Vec<Filter>) -> Filter) -> Filter {
    if members.len() == 1
        && let Some(single) = members.pop()
    {
        return single;
    }
    group(members)
}
