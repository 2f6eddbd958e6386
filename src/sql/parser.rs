//! SQL Parser
//!
//! Predictive recursive-descent parser turning tokens into a [`Statement`].

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::catalog::{DataType, ForeignKeyRef};
use crate::error::{Error, Result};

/// SQL Parser
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a new parser from a SQL string
    pub fn new(sql: &str) -> Result<Self> {
        let mut lexer = Lexer::new(sql);
        let tokens = lexer.tokenize()?;

        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse exactly one statement, with an optional trailing semicolon
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = self.parse_statement()?;

        if self.check(&Token::Semicolon) {
            self.advance();
        }

        if !self.is_at_end() {
            return Err(Error::UnexpectedToken {
                expected: "end of statement".to_string(),
                found: format!("{}", self.current()),
            });
        }

        Ok(stmt)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.current() {
            Token::Select => self.parse_select().map(Statement::Select),
            Token::Insert => self.parse_insert().map(Statement::Insert),
            Token::Update => self.parse_update().map(Statement::Update),
            Token::Delete => self.parse_delete().map(Statement::Delete),
            Token::Create => self.parse_create(),
            Token::Drop => self.parse_drop(),
            Token::Show => self.parse_show(),
            Token::Describe => {
                self.advance();
                Ok(Statement::Describe(self.expect_identifier()?))
            }
            Token::Eof => Err(Error::UnexpectedEof("a command".to_string())),
            other => Err(Error::UnrecognizedCommand(format!("{}", other))),
        }
    }

    // ========== SELECT Statement ==========

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect(&Token::Select)?;

        let columns = self.parse_select_list()?;

        self.expect(&Token::From)?;
        let from = self.expect_identifier()?;

        let join = if self.check(&Token::Join) || self.check(&Token::Inner) {
            Some(self.parse_join()?)
        } else {
            None
        };

        let where_clause = self.parse_optional_where()?;

        Ok(SelectStatement {
            columns,
            from,
            join,
            where_clause,
        })
    }

    fn parse_select_list(&mut self) -> Result<Vec<SelectItem>> {
        if self.check(&Token::Asterisk) {
            self.advance();
            return Ok(vec![SelectItem::Wildcard]);
        }

        let mut items = Vec::new();
        loop {
            items.push(SelectItem::Column(self.parse_column_ref()?));

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance(); // consume comma
        }

        Ok(items)
    }

    fn parse_join(&mut self) -> Result<JoinClause> {
        if self.check(&Token::Inner) {
            self.advance();
        }
        self.expect(&Token::Join)?;

        let table = self.expect_identifier()?;
        self.expect(&Token::On)?;
        let left = self.parse_column_ref()?;
        self.expect(&Token::Eq)?;
        let right = self.parse_column_ref()?;

        Ok(JoinClause { table, left, right })
    }

    // ========== INSERT Statement ==========

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect(&Token::Insert)?;
        self.expect(&Token::Into)?;

        let table_name = self.expect_identifier()?;

        // Optional column list
        let columns = if self.check(&Token::LParen) {
            self.advance();
            let cols = self.parse_identifier_list()?;
            self.expect(&Token::RParen)?;
            Some(cols)
        } else {
            None
        };

        self.expect(&Token::Values)?;

        let mut rows = Vec::new();
        loop {
            self.expect(&Token::LParen)?;
            rows.push(self.parse_literal_list()?);
            self.expect(&Token::RParen)?;

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(InsertStatement {
            table_name,
            columns,
            rows,
        })
    }

    // ========== UPDATE Statement ==========

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.expect(&Token::Update)?;

        let table_name = self.expect_identifier()?;

        self.expect(&Token::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier()?;
            self.expect(&Token::Eq)?;
            let value = self.parse_literal()?;
            assignments.push(Assignment { column, value });

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        let where_clause = self.parse_optional_where()?;

        Ok(UpdateStatement {
            table_name,
            assignments,
            where_clause,
        })
    }

    // ========== DELETE Statement ==========

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;

        let table_name = self.expect_identifier()?;
        let where_clause = self.parse_optional_where()?;

        Ok(DeleteStatement {
            table_name,
            where_clause,
        })
    }

    // ========== CREATE Statement ==========

    fn parse_create(&mut self) -> Result<Statement> {
        self.expect(&Token::Create)?;

        match self.current() {
            Token::Table => self.parse_create_table().map(Statement::CreateTable),
            Token::Index => self.parse_create_index().map(Statement::CreateIndex),
            _ => Err(self.unexpected("TABLE or INDEX")),
        }
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect(&Token::Table)?;

        let table_name = self.expect_identifier()?;

        self.expect(&Token::LParen)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_def()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(&Token::RParen)?;

        Ok(CreateTableStatement {
            table_name,
            columns,
        })
    }

    fn parse_create_index(&mut self) -> Result<CreateIndexStatement> {
        self.expect(&Token::Index)?;

        let index_name = self.expect_identifier()?;
        self.expect(&Token::On)?;
        let table_name = self.expect_identifier()?;

        self.expect(&Token::LParen)?;
        let column = self.expect_identifier()?;
        self.expect(&Token::RParen)?;

        Ok(CreateIndexStatement {
            index_name,
            table_name,
            column,
        })
    }

    /// `name TYPE [PRIMARY KEY | UNIQUE | [FOREIGN KEY] REFERENCES t(c) | NULL]*`
    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;

        let mut primary_key = false;
        let mut unique = false;
        let mut references = None;

        loop {
            match self.current() {
                Token::Primary => {
                    self.advance();
                    self.expect(&Token::Key)?;
                    primary_key = true;
                }
                Token::Unique => {
                    self.advance();
                    unique = true;
                }
                Token::Foreign => {
                    self.advance();
                    self.expect(&Token::Key)?;
                    references = Some(self.parse_references()?);
                }
                Token::References => {
                    references = Some(self.parse_references()?);
                }
                Token::Null => {
                    // NULL is allowed (default)
                    self.advance();
                }
                _ => break,
            }
        }

        Ok(ColumnDef {
            name,
            data_type,
            primary_key,
            unique,
            references,
        })
    }

    fn parse_references(&mut self) -> Result<ForeignKeyRef> {
        self.expect(&Token::References)?;
        let table = self.expect_identifier()?;
        self.expect(&Token::LParen)?;
        let column = self.expect_identifier()?;
        self.expect(&Token::RParen)?;
        Ok(ForeignKeyRef { table, column })
    }

    fn parse_data_type(&mut self) -> Result<DataType> {
        let dt = match self.current() {
            Token::Int | Token::Integer => DataType::Int,
            Token::Float | Token::Double | Token::Real => DataType::Float,
            Token::Bool | Token::Boolean => DataType::Bool,
            Token::Text => DataType::Varchar(None),
            Token::Varchar => {
                self.advance();
                if self.check(&Token::LParen) {
                    self.advance();
                    let len = self.expect_integer()?;
                    self.expect(&Token::RParen)?;
                    let len = usize::try_from(len)
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| {
                            Error::ParseError(format!("invalid VARCHAR length {}", len))
                        })?;
                    return Ok(DataType::Varchar(Some(len)));
                }
                return Ok(DataType::Varchar(None));
            }
            _ => return Err(self.unexpected("data type")),
        };

        self.advance();
        Ok(dt)
    }

    // ========== DROP / SHOW ==========

    fn parse_drop(&mut self) -> Result<Statement> {
        self.expect(&Token::Drop)?;

        match self.current() {
            Token::Table => {
                self.advance();
                Ok(Statement::DropTable(self.expect_identifier()?))
            }
            Token::Index => {
                self.advance();
                Ok(Statement::DropIndex(self.expect_identifier()?))
            }
            _ => Err(self.unexpected("TABLE or INDEX")),
        }
    }

    fn parse_show(&mut self) -> Result<Statement> {
        self.expect(&Token::Show)?;
        self.expect(&Token::Tables)?;
        Ok(Statement::ShowTables)
    }

    // ========== WHERE clause ==========

    fn parse_optional_where(&mut self) -> Result<Option<Condition>> {
        if !self.check(&Token::Where) {
            return Ok(None);
        }
        self.advance();
        self.parse_condition().map(Some)
    }

    /// `<column> <op> <literal>`; a single predicate only
    fn parse_condition(&mut self) -> Result<Condition> {
        let column = self.parse_column_ref()?;

        let op = match self.current() {
            Token::Eq => CompareOp::Eq,
            Token::Neq => CompareOp::Neq,
            Token::Lt => CompareOp::Lt,
            Token::Gt => CompareOp::Gt,
            Token::Lte => CompareOp::Lte,
            Token::Gte => CompareOp::Gte,
            Token::Like => CompareOp::Like,
            _ => return Err(self.unexpected("comparison operator")),
        };
        self.advance();

        let value = self.parse_literal()?;

        Ok(Condition { column, op, value })
    }

    // ========== Helper functions ==========

    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.expect_identifier()?;
        if self.check(&Token::Dot) {
            self.advance();
            let column = self.expect_identifier()?;
            return Ok(ColumnRef::qualified(first, column));
        }
        Ok(ColumnRef::new(first))
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let lit = match self.current().clone() {
            Token::Null => Literal::Null,
            Token::True => Literal::Boolean(true),
            Token::False => Literal::Boolean(false),
            Token::IntegerLiteral(n) => Literal::Integer(n),
            Token::FloatLiteral(n) => Literal::Float(n),
            Token::StringLiteral(s) => Literal::String(s),
            _ => return Err(self.unexpected("literal value")),
        };
        self.advance();
        Ok(lit)
    }

    fn parse_literal_list(&mut self) -> Result<Vec<Literal>> {
        let mut literals = Vec::new();

        loop {
            literals.push(self.parse_literal()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(literals)
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        let mut identifiers = Vec::new();

        loop {
            identifiers.push(self.expect_identifier()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(identifiers)
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    fn unexpected(&self, expected: &str) -> Error {
        if self.is_at_end() {
            Error::UnexpectedEof(expected.to_string())
        } else {
            Error::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{}", self.current()),
            }
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    /// Identifiers are case-insensitive and folded to lowercase here
    fn expect_identifier(&mut self) -> Result<String> {
        let name = match self.current() {
            Token::Identifier(name) => name.to_lowercase(),
            other => match other.as_soft_identifier() {
                Some(name) => name,
                None => return Err(self.unexpected("identifier")),
            },
        };
        self.advance();
        Ok(name)
    }

    fn expect_integer(&mut self) -> Result<i64> {
        match self.current().clone() {
            Token::IntegerLiteral(n) => {
                self.advance();
                Ok(n)
            }
            _ => Err(self.unexpected("integer")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(sql: &str) -> Result<Statement> {
        Parser::new(sql)?.parse()
    }

    #[test]
    fn test_parse_simple_select() {
        match parse("SELECT * FROM Users;").unwrap() {
            Statement::Select(s) => {
                assert_eq!(s.columns, vec![SelectItem::Wildcard]);
                assert_eq!(s.from, "users");
                assert!(s.join.is_none());
                assert!(s.where_clause.is_none());
            }
            _ => panic!("Expected SELECT statement"),
        }
    }

    #[test]
    fn test_parse_select_with_where() {
        match parse("select id, Name from users where email LIKE '%@x.com'").unwrap() {
            Statement::Select(s) => {
                assert_eq!(s.columns.len(), 2);
                assert_eq!(s.columns[1], SelectItem::Column(ColumnRef::new("name")));
                let cond = s.where_clause.unwrap();
                assert_eq!(cond.column, ColumnRef::new("email"));
                assert_eq!(cond.op, CompareOp::Like);
                assert_eq!(cond.value, Literal::String("%@x.com".to_string()));
            }
            _ => panic!("Expected SELECT statement"),
        }
    }

    #[test]
    fn test_parse_join() {
        let stmt =
            parse("SELECT p.id, s.email FROM p INNER JOIN s ON p.supplier_id = s.id WHERE s.id >= 2")
                .unwrap();

        match stmt {
            Statement::Select(s) => {
                let join = s.join.unwrap();
                assert_eq!(join.table, "s");
                assert_eq!(join.left, ColumnRef::qualified("p", "supplier_id"));
                assert_eq!(join.right, ColumnRef::qualified("s", "id"));
                let cond = s.where_clause.unwrap();
                assert_eq!(cond.op, CompareOp::Gte);
                assert_eq!(cond.value, Literal::Integer(2));
            }
            _ => panic!("Expected SELECT statement"),
        }
    }

    #[test]
    fn test_parse_create_table_constraints_any_order() {
        let stmt = parse(
            "CREATE TABLE p (
                id INT PRIMARY KEY,
                code VARCHAR(12) UNIQUE,
                supplier_id INT FOREIGN KEY REFERENCES S(ID) UNIQUE,
                price FLOAT,
                active BOOLEAN
            )",
        )
        .unwrap();

        match stmt {
            Statement::CreateTable(ct) => {
                assert_eq!(ct.table_name, "p");
                assert_eq!(ct.columns.len(), 5);
                assert!(ct.columns[0].primary_key);
                assert_eq!(ct.columns[1].data_type, DataType::Varchar(Some(12)));
                assert!(ct.columns[1].unique);
                assert!(ct.columns[2].unique);
                assert_eq!(
                    ct.columns[2].references,
                    Some(ForeignKeyRef {
                        table: "s".to_string(),
                        column: "id".to_string()
                    })
                );
                assert_eq!(ct.columns[3].data_type, DataType::Float);
                assert_eq!(ct.columns[4].data_type, DataType::Bool);
            }
            _ => panic!("Expected CREATE TABLE statement"),
        }
    }

    #[test]
    fn test_parse_insert() {
        let stmt = parse(r#"INSERT INTO s (id, email) VALUES (1, "a@x.com"), (2, NULL)"#).unwrap();

        match stmt {
            Statement::Insert(i) => {
                assert_eq!(i.table_name, "s");
                assert_eq!(i.columns.as_ref().unwrap().len(), 2);
                assert_eq!(i.rows.len(), 2);
                assert_eq!(i.rows[0][1], Literal::String("a@x.com".to_string()));
                assert_eq!(i.rows[1][1], Literal::Null);
            }
            _ => panic!("Expected INSERT statement"),
        }
    }

    #[test]
    fn test_parse_update() {
        let stmt = parse("UPDATE users SET name = 'Charlie', age = 30 WHERE id != 1").unwrap();

        match stmt {
            Statement::Update(u) => {
                assert_eq!(u.table_name, "users");
                assert_eq!(u.assignments.len(), 2);
                assert_eq!(u.where_clause.unwrap().op, CompareOp::Neq);
            }
            _ => panic!("Expected UPDATE statement"),
        }
    }

    #[test]
    fn test_parse_utility_statements() {
        assert_eq!(parse("SHOW TABLES").unwrap(), Statement::ShowTables);
        assert_eq!(
            parse("desc Suppliers").unwrap(),
            Statement::Describe("suppliers".to_string())
        );
        assert_eq!(
            parse("DROP TABLE s;").unwrap(),
            Statement::DropTable("s".to_string())
        );
        assert_eq!(
            parse("CREATE INDEX idx ON s(Email)").unwrap(),
            Statement::CreateIndex(CreateIndexStatement {
                index_name: "idx".to_string(),
                table_name: "s".to_string(),
                column: "email".to_string(),
            })
        );
        assert!(matches!(
            parse("DELETE FROM s").unwrap(),
            Statement::Delete(DeleteStatement {
                where_clause: None,
                ..
            })
        ));
    }

    #[test]
    fn test_type_words_as_names() {
        let stmt = parse("CREATE TABLE Key (key INT PRIMARY KEY, text TEXT, index VARCHAR(4))").unwrap();
        let Statement::CreateTable(ct) = stmt else {
            panic!("expected CREATE TABLE");
        };
        assert_eq!(ct.table_name, "key");
        let names: Vec<&str> = ct.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["key", "text", "index"]);
        assert_eq!(ct.columns[1].data_type, DataType::Varchar(None));

        assert!(parse("SELECT text, key.index FROM key WHERE int = 1").is_ok());
        assert!(parse("CREATE INDEX index ON key(text)").is_ok());

        // Clause words stay reserved
        assert!(parse("CREATE TABLE t (select INT)").is_err());
        assert!(parse("SELECT from FROM t").is_err());
    }

    #[test]
    fn test_parse_errors() {
        let err = parse("FROB the table").unwrap_err();
        assert!(matches!(err, Error::UnrecognizedCommand(_)));
        assert_eq!(err.kind(), ErrorKind::Parse);

        // AND/OR are not part of the grammar
        let err = parse("SELECT * FROM s WHERE id = 1 AND id = 2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        assert!(matches!(
            parse("SELECT * FROM").unwrap_err(),
            Error::UnexpectedEof(_)
        ));
        assert!(matches!(
            parse("INSERT INTO s VALUES (1, id)").unwrap_err(),
            Error::UnexpectedToken { .. }
        ));
        assert!(parse("").is_err());
    }
}
