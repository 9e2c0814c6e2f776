// Condition tokens for lexical analysis

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Operands
    Identifier(String),
    QuotedString(String),

    // Connectors
    And,
    Or,

    // Comparison operators
    Like,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Special
    Invalid(String),
    Eof,
}

impl Token {
    /// Convert a scanned span to an operator token if it is one.
    ///
    /// Word operators are case-insensitive, symbols must match exactly.
    pub fn operator_from_str(s: &str) -> Option<Token> {
        match s {
            "=" => return Some(Token::Equal),
            "!=" | "<>" => return Some(Token::NotEqual),
            "<" => return Some(Token::Less),
            "<=" => return Some(Token::LessEqual),
            ">" => return Some(Token::Greater),
            ">=" => return Some(Token::GreaterEqual),
            _ => {}
        }

        match s.to_lowercase().as_str() {
            "and" => Some(Token::And),
            "or" => Some(Token::Or),
            "like" => Some(Token::Like),
            _ => None,
        }
    }
}
