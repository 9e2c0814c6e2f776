// Abstract syntax for filter conditions

use super::token::Token;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator of a single term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Like,
}

impl CompareOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Equal => Some(CompareOp::Equal),
            Token::NotEqual => Some(CompareOp::NotEqual),
            Token::Less => Some(CompareOp::Less),
            Token::LessEqual => Some(CompareOp::LessEqual),
            Token::Greater => Some(CompareOp::Greater),
            Token::GreaterEqual => Some(CompareOp::GreaterEqual),
            Token::Like => Some(CompareOp::Like),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "!=",
            CompareOp::Less => "<",
            CompareOp::LessEqual => "<=",
            CompareOp::Greater => ">",
            CompareOp::GreaterEqual => ">=",
            CompareOp::Like => "like",
        }
    }

    /// Whether `cell.cmp(literal) == ordering` satisfies this operator
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Equal => ordering == Ordering::Equal,
            CompareOp::NotEqual => ordering != Ordering::Equal,
            CompareOp::Less => ordering == Ordering::Less,
            CompareOp::LessEqual => ordering != Ordering::Greater,
            CompareOp::Greater => ordering == Ordering::Greater,
            CompareOp::GreaterEqual => ordering != Ordering::Less,
            CompareOp::Like => false,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connector between two terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connector::And => write!(f, "and"),
            Connector::Or => write!(f, "or"),
        }
    }
}

/// `column operator literal`
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub column: String,
    pub op: CompareOp,
    pub literal: String,
}

impl Term {
    pub fn new(column: impl Into<String>, op: CompareOp, literal: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            literal: literal.into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.column, self.op, self.literal)
    }
}

/// A chain of terms evaluated strictly left to right.
///
/// There is no precedence: `a or b and c` means `(a or b) and c`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub first: Term,
    pub rest: Vec<(Connector, Term)>,
}

impl Condition {
    pub fn new(first: Term) -> Self {
        Self {
            first,
            rest: Vec::new(),
        }
    }

    pub fn and(mut self, term: Term) -> Self {
        self.rest.push((Connector::And, term));
        self
    }

    pub fn or(mut self, term: Term) -> Self {
        self.rest.push((Connector::Or, term));
        self
    }

    /// All terms in evaluation order
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        std::iter::once(&self.first).chain(self.rest.iter().map(|(_, term)| term))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for (connector, term) in &self.rest {
            write!(f, " {} {}", connector, term)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_display() {
        let condition = Condition::new(Term::new("age", CompareOp::GreaterEqual, "18"))
            .or(Term::new("name", CompareOp::Like, "%ann%"));
        assert_eq!(
            condition.to_string(),
            r#"age >= "18" or name like "%ann%""#
        );
        assert_eq!(condition.terms().count(), 2);
    }

    #[test]
    fn test_ordering_acceptance() {
        assert!(CompareOp::GreaterEqual.accepts(Ordering::Equal));
        assert!(!CompareOp::Greater.accepts(Ordering::Equal));
        assert!(CompareOp::LessEqual.accepts(Ordering::Less));
        assert!(!CompareOp::Less.accepts(Ordering::Greater));
    }
}
