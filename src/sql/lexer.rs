//! SQL Lexer (Tokenizer)
//!
//! This module converts command strings into a stream of tokens.

use super::token::Token;
use crate::error::{Error, Result};

/// SQL Lexer
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Current position in input
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.skip_comments();
        self.skip_whitespace();

        if self.is_at_end() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();

        match ch {
            '(' => return Ok(self.single(Token::LParen)),
            ')' => return Ok(self.single(Token::RParen)),
            ',' => return Ok(self.single(Token::Comma)),
            ';' => return Ok(self.single(Token::Semicolon)),
            '.' => return Ok(self.single(Token::Dot)),
            '*' => return Ok(self.single(Token::Asterisk)),
            '=' => return Ok(self.single(Token::Eq)),
            '-' => {
                let start = self.position;
                self.advance();
                if !self.is_at_end() && self.current_char().is_ascii_digit() {
                    return self.read_number(start, String::from("-"));
                }
                return Err(Error::UnexpectedCharacter('-', start));
            }
            '<' => {
                self.advance();
                if !self.is_at_end() {
                    match self.current_char() {
                        '=' => {
                            self.advance();
                            return Ok(Token::Lte);
                        }
                        '>' => {
                            self.advance();
                            return Ok(Token::Neq);
                        }
                        _ => {}
                    }
                }
                return Ok(Token::Lt);
            }
            '>' => {
                self.advance();
                if !self.is_at_end() && self.current_char() == '=' {
                    self.advance();
                    return Ok(Token::Gte);
                }
                return Ok(Token::Gt);
            }
            '!' => {
                let start = self.position;
                self.advance();
                if !self.is_at_end() && self.current_char() == '=' {
                    self.advance();
                    return Ok(Token::Neq);
                }
                return Err(Error::UnexpectedCharacter('!', start));
            }
            '\'' | '"' => return self.read_string(ch),
            _ => {}
        }

        // Numbers
        if ch.is_ascii_digit() {
            return self.read_number(self.position, String::new());
        }

        // Identifiers and keywords
        if ch.is_alphabetic() || ch == '_' {
            return Ok(self.read_identifier());
        }

        Err(Error::UnexpectedCharacter(ch, self.position))
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get the current character
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    /// Peek at the next character
    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Skip SQL comments (-- and /* */)
    fn skip_comments(&mut self) {
        if self.is_at_end() {
            return;
        }

        // Single line comment: --
        if self.current_char() == '-' && self.peek_char() == Some('-') {
            while !self.is_at_end() && self.current_char() != '\n' {
                self.advance();
            }
            self.skip_whitespace();
            self.skip_comments();
            return;
        }

        // Multi-line comment: /* */
        if self.current_char() == '/' && self.peek_char() == Some('*') {
            self.advance(); // skip /
            self.advance(); // skip *

            while !self.is_at_end() {
                if self.current_char() == '*' && self.peek_char() == Some('/') {
                    self.advance(); // skip *
                    self.advance(); // skip /
                    break;
                }
                self.advance();
            }
            self.skip_whitespace();
            self.skip_comments();
        }
    }

    /// Read a string literal delimited by `quote`; a doubled quote escapes itself
    fn read_string(&mut self, quote: char) -> Result<Token> {
        let start_pos = self.position;
        self.advance(); // skip opening quote

        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch == quote {
                if self.peek_char() == Some(quote) {
                    value.push(quote);
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // skip closing quote
                    return Ok(Token::StringLiteral(value));
                }
            } else {
                value.push(ch);
                self.advance();
            }
        }

        Err(Error::UnterminatedString(start_pos))
    }

    /// Read a number; a decimal point makes it a float
    /// Read digits onto `value`, which may already hold a leading sign
    fn read_number(&mut self, start_pos: usize, mut value: String) -> Result<Token> {
        let mut is_float = false;

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else if ch == '.' && !is_float {
                match self.peek_char() {
                    Some(next) if next.is_ascii_digit() => {
                        is_float = true;
                        value.push(ch);
                        self.advance();
                    }
                    _ => break,
                }
            } else if ch.is_alphabetic() || ch == '_' {
                // 12abc is neither a number nor an identifier
                return Err(Error::InvalidNumber(start_pos));
            } else {
                break;
            }
        }

        if is_float {
            value
                .parse::<f64>()
                .map(Token::FloatLiteral)
                .map_err(|_| Error::InvalidNumber(start_pos))
        } else {
            value
                .parse::<i64>()
                .map(Token::IntegerLiteral)
                .map_err(|_| Error::InvalidNumber(start_pos))
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::from_keyword(&value).unwrap_or(Token::Identifier(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        let mut lexer = Lexer::new("SELECT * FROM users");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Select,
                Token::Asterisk,
                Token::From,
                Token::Identifier("users".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_select_with_where() {
        let mut lexer = Lexer::new("SELECT id, name FROM users WHERE id = 1");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Select,
                Token::Identifier("id".to_string()),
                Token::Comma,
                Token::Identifier("name".to_string()),
                Token::From,
                Token::Identifier("users".to_string()),
                Token::Where,
                Token::Identifier("id".to_string()),
                Token::Eq,
                Token::IntegerLiteral(1),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_both_quote_styles() {
        let mut lexer = Lexer::new(r#"'single' "double" 'it''s'"#);
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(tokens[0], Token::StringLiteral("single".to_string()));
        assert_eq!(tokens[1], Token::StringLiteral("double".to_string()));
        assert_eq!(tokens[2], Token::StringLiteral("it's".to_string()));
    }

    #[test]
    fn test_comparison_operators() {
        let mut lexer = Lexer::new("a < b <= c > d >= e <> f != g");
        let tokens = lexer.tokenize().unwrap();

        assert!(tokens.contains(&Token::Lt));
        assert!(tokens.contains(&Token::Lte));
        assert!(tokens.contains(&Token::Gt));
        assert!(tokens.contains(&Token::Gte));
        assert_eq!(tokens.iter().filter(|t| **t == Token::Neq).count(), 2);
    }

    #[test]
    fn test_numeric_literals() {
        let mut lexer = Lexer::new("3.14 42 -7 -0.5");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(tokens[0], Token::FloatLiteral(3.14));
        assert_eq!(tokens[1], Token::IntegerLiteral(42));
        assert_eq!(tokens[2], Token::IntegerLiteral(-7));
        assert_eq!(tokens[3], Token::FloatLiteral(-0.5));

        let tokens = Lexer::new("-9223372036854775808").tokenize().unwrap();
        assert_eq!(tokens[0], Token::IntegerLiteral(i64::MIN));
        assert_eq!(
            Lexer::new("9223372036854775808").tokenize(),
            Err(Error::InvalidNumber(0))
        );
        assert_eq!(Lexer::new("x = -5a").tokenize(), Err(Error::InvalidNumber(4)));
    }

    #[test]
    fn test_comments() {
        let mut lexer = Lexer::new("SELECT -- this is a comment\n* /* inline */ FROM users");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Select,
                Token::Asterisk,
                Token::From,
                Token::Identifier("users".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_errors() {
        assert_eq!(
            Lexer::new("SELECT 'open").tokenize(),
            Err(Error::UnterminatedString(7))
        );
        assert_eq!(
            Lexer::new("a @ b").tokenize(),
            Err(Error::UnexpectedCharacter('@', 2))
        );
        assert_eq!(Lexer::new("12ab").tokenize(), Err(Error::InvalidNumber(0)));
    }
}
