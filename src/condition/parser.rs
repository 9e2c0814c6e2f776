// Condition parser - converts tokens to a left-to-right chain of terms
//
// Expression := Term ((AND | OR) Term)*
// Term       := operand operator operand

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::error::{QueryError, QueryResult};

static EOF: Token = Token::Eof;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(condition: &str) -> QueryResult<Self> {
        let mut lexer = Lexer::new(condition);
        let tokens = lexer.tokenize()?;
        Ok(Parser {
            tokens,
            position: 0,
        })
    }

    /// Parse the whole condition.
    ///
    /// Returns `None` for an empty condition, which selects every row.
    pub fn parse(&mut self) -> QueryResult<Option<Condition>> {
        if self.match_token(&Token::Eof) {
            return Ok(None);
        }

        let mut condition = Condition::new(self.parse_term()?);
        loop {
            let connector = match self.current_token() {
                Token::And => Connector::And,
                Token::Or => Connector::Or,
                Token::Eof => break,
                other => {
                    return Err(self.error(format!("expected AND or OR, found {:?}", other)));
                }
            };
            self.advance();
            let term = self.parse_term()?;
            condition.rest.push((connector, term));
        }

        Ok(Some(condition))
    }

    /// Parse `column operator literal`
    fn parse_term(&mut self) -> QueryResult<Term> {
        let column = self.expect_operand("column name")?;

        let op = CompareOp::from_token(self.current_token()).ok_or_else(|| {
            self.error(format!(
                "expected comparison operator after '{}', found {:?}",
                column,
                self.current_token()
            ))
        })?;
        self.advance();

        let literal = self.expect_operand("literal")?;
        Ok(Term::new(column, op, literal))
    }

    /// Expect a bare or quoted string and return its text
    fn expect_operand(&mut self, what: &str) -> QueryResult<String> {
        match self.current_token().clone() {
            Token::Identifier(s) | Token::QuotedString(s) => {
                self.advance();
                Ok(s)
            }
            other => Err(self.error(format!("expected {}, found {:?}", what, other))),
        }
    }

    fn current_token(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&EOF)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == token
    }

    fn error(&self, message: String) -> QueryError {
        QueryError::Parse(format!("{} (at token {})", message, self.position))
    }
}

/// Lex and parse a condition string
pub fn parse_condition(condition: &str) -> QueryResult<Option<Condition>> {
    Parser::new(condition)?.parse()
}
