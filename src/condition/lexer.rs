// Condition lexer - tokenizes filter conditions such as `age>=18 and name like "%ann%"`

use super::token::Token;
use crate::error::{QueryError, QueryResult};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    finished: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            finished: false,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        if self.finished {
            return Token::Eof;
        }

        self.skip_whitespace();
        let start = self.position;

        // Accumulate up to the next whitespace or operator character
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() || is_operator_char(ch) {
                break;
            }
            self.advance();
        }

        // Nothing accumulated: take a run of operator characters instead
        if self.position == start {
            while let Some(ch) = self.current_char() {
                if !is_operator_char(ch) {
                    break;
                }
                self.advance();
            }
        }

        if self.position == start {
            self.finished = true;
            return Token::Eof;
        }

        let span: String = self.input[start..self.position].iter().collect();
        if let Some(op) = Token::operator_from_str(&span) {
            return op;
        }
        if !span.starts_with('"') {
            return Token::Identifier(span);
        }
        self.read_quoted_string(start)
    }

    /// Finish a span that opened with a double quote.
    ///
    /// Scanning continues past whitespace and operator characters up to the
    /// closing quote. Running out of input yields `Token::Invalid` and ends
    /// the stream.
    fn read_quoted_string(&mut self, start: usize) -> Token {
        let closed = self.position - start > 1 && self.input[self.position - 1] == '"';
        if !closed {
            loop {
                match self.current_char() {
                    None => {
                        self.finished = true;
                        let text: String = self.input[start..].iter().collect();
                        return Token::Invalid(text);
                    }
                    Some('"') => {
                        self.advance();
                        break;
                    }
                    Some(_) => self.advance(),
                }
            }
        }

        let inner: String = self.input[start + 1..self.position - 1].iter().collect();
        Token::QuotedString(inner)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        if self.position < self.input.len() {
            self.position += 1;
        }
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Tokenize the entire input.
    ///
    /// An unterminated quoted literal fails with `QueryError::Lex`.
    pub fn tokenize(&mut self) -> QueryResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            match self.next_token() {
                Token::Invalid(text) => {
                    return Err(QueryError::Lex(format!(
                        "unterminated quoted literal: {}",
                        text
                    )));
                }
                Token::Eof => {
                    tokens.push(Token::Eof);
                    break;
                }
                token => tokens.push(token),
            }
        }

        Ok(tokens)
    }
}

fn is_operator_char(ch: char) -> bool {
    matches!(ch, '=' | '<' | '>' | '!')
}
