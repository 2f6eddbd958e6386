//! SQL Token definitions
//!
//! This module defines all tokens that can appear in minirel statements.

use std::fmt;

/// SQL Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // ========== Keywords ==========
    // DDL Keywords
    Create,
    Drop,
    Table,
    Tables,
    Index,
    Show,
    Describe,

    // DML Keywords
    Select,
    Insert,
    Update,
    Delete,
    Into,
    Values,
    Set,
    From,
    Where,

    // Clauses
    On,
    Join,
    Inner,
    Like,

    // Constraints
    Primary,
    Foreign,
    Key,
    References,
    Unique,
    Null,

    // Data Types
    Int,
    Integer,
    Float,
    Double,
    Real,
    Varchar,
    Text,
    Bool,
    Boolean,

    // Boolean Literals
    True,
    False,

    // ========== Literals ==========
    /// Integer literal
    IntegerLiteral(i64),
    /// Float literal
    FloatLiteral(f64),
    /// String literal (single- or double-quoted)
    StringLiteral(String),
    /// Identifier (table name, column name, etc.)
    Identifier(String),

    // ========== Operators ==========
    /// =
    Eq,
    /// <> or !=
    Neq,
    /// <
    Lt,
    /// >
    Gt,
    /// <=
    Lte,
    /// >=
    Gte,
    /// *
    Asterisk,

    // ========== Delimiters ==========
    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,

    // ========== Special ==========
    /// End of input
    Eof,
}

impl Token {
    /// Keywords that never begin or separate a clause, and so may also
    /// name a table, column or index. Returns the lowercase name.
    pub fn as_soft_identifier(&self) -> Option<String> {
        match self {
            Token::Tables
            | Token::Index
            | Token::Key
            | Token::Int
            | Token::Integer
            | Token::Float
            | Token::Double
            | Token::Real
            | Token::Varchar
            | Token::Text
            | Token::Bool
            | Token::Boolean => Some(self.to_string().to_lowercase()),
            _ => None,
        }
    }

    /// Try to parse a keyword from a string
    pub fn from_keyword(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            // DDL
            "CREATE" => Some(Token::Create),
            "DROP" => Some(Token::Drop),
            "TABLE" => Some(Token::Table),
            "TABLES" => Some(Token::Tables),
            "INDEX" => Some(Token::Index),
            "SHOW" => Some(Token::Show),
            "DESCRIBE" | "DESC" => Some(Token::Describe),

            // DML
            "SELECT" => Some(Token::Select),
            "INSERT" => Some(Token::Insert),
            "UPDATE" => Some(Token::Update),
            "DELETE" => Some(Token::Delete),
            "INTO" => Some(Token::Into),
            "VALUES" => Some(Token::Values),
            "SET" => Some(Token::Set),
            "FROM" => Some(Token::From),
            "WHERE" => Some(Token::Where),

            // Clauses
            "ON" => Some(Token::On),
            "JOIN" => Some(Token::Join),
            "INNER" => Some(Token::Inner),
            "LIKE" => Some(Token::Like),

            // Constraints
            "PRIMARY" => Some(Token::Primary),
            "FOREIGN" => Some(Token::Foreign),
            "KEY" => Some(Token::Key),
            "REFERENCES" => Some(Token::References),
            "UNIQUE" => Some(Token::Unique),
            "NULL" => Some(Token::Null),

            // Data Types
            "INT" => Some(Token::Int),
            "INTEGER" => Some(Token::Integer),
            "FLOAT" => Some(Token::Float),
            "DOUBLE" => Some(Token::Double),
            "REAL" => Some(Token::Real),
            "VARCHAR" => Some(Token::Varchar),
            "TEXT" => Some(Token::Text),
            "BOOL" => Some(Token::Bool),
            "BOOLEAN" => Some(Token::Boolean),

            // Boolean Literals
            "TRUE" => Some(Token::True),
            "FALSE" => Some(Token::False),

            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Create => write!(f, "CREATE"),
            Token::Drop => write!(f, "DROP"),
            Token::Table => write!(f, "TABLE"),
            Token::Tables => write!(f, "TABLES"),
            Token::Index => write!(f, "INDEX"),
            Token::Show => write!(f, "SHOW"),
            Token::Describe => write!(f, "DESCRIBE"),
            Token::Select => write!(f, "SELECT"),
            Token::Insert => write!(f, "INSERT"),
            Token::Update => write!(f, "UPDATE"),
            Token::Delete => write!(f, "DELETE"),
            Token::Into => write!(f, "INTO"),
            Token::Values => write!(f, "VALUES"),
            Token::Set => write!(f, "SET"),
            Token::From => write!(f, "FROM"),
            Token::Where => write!(f, "WHERE"),
            Token::On => write!(f, "ON"),
            Token::Join => write!(f, "JOIN"),
            Token::Inner => write!(f, "INNER"),
            Token::Like => write!(f, "LIKE"),
            Token::Primary => write!(f, "PRIMARY"),
            Token::Foreign => write!(f, "FOREIGN"),
            Token::Key => write!(f, "KEY"),
            Token::References => write!(f, "REFERENCES"),
            Token::Unique => write!(f, "UNIQUE"),
            Token::Null => write!(f, "NULL"),
            Token::Int => write!(f, "INT"),
            Token::Integer => write!(f, "INTEGER"),
            Token::Float => write!(f, "FLOAT"),
            Token::Double => write!(f, "DOUBLE"),
            Token::Real => write!(f, "REAL"),
            Token::Varchar => write!(f, "VARCHAR"),
            Token::Text => write!(f, "TEXT"),
            Token::Bool => write!(f, "BOOL"),
            Token::Boolean => write!(f, "BOOLEAN"),
            Token::True => write!(f, "TRUE"),
            Token::False => write!(f, "FALSE"),
            Token::IntegerLiteral(n) => write!(f, "{}", n),
            Token::FloatLiteral(n) => write!(f, "{}", n),
            Token::StringLiteral(s) => write!(f, "'{}'", s),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Lte => write!(f, "<="),
            Token::Gte => write!(f, ">="),
            Token::Asterisk => write!(f, "*"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Dot => write!(f, "."),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
