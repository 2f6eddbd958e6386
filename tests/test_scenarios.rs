use minirel::{Database, ErrorKind, Value};

fn suppliers() -> Database {
    let mut db = Database::new();
    db.execute("CREATE TABLE s (id INT PRIMARY KEY, email VARCHAR UNIQUE)")
        .unwrap();
    db.execute("INSERT INTO s VALUES (1,'a@x.com')").unwrap();
    db
}

fn with_products() -> Database {
    let mut db = suppliers();
    db.execute("CREATE TABLE p (id INT PRIMARY KEY, supplier_id INT FOREIGN KEY REFERENCES s(id))")
        .unwrap();
    db
}

fn kind(db: &mut Database, sql: &str) -> ErrorKind {
    db.execute(sql).unwrap_err().kind()
}

#[test]
fn test_duplicate_primary_key() {
    let mut db = suppliers();
    assert_eq!(
        kind(&mut db, "INSERT INTO s VALUES (1,'b@x.com')"),
        ErrorKind::DuplicateKey
    );
    assert_eq!(db.execute("SELECT * FROM s").unwrap().rows().len(), 1);
}

#[test]
fn test_duplicate_unique_value() {
    let mut db = suppliers();
    assert_eq!(
        kind(&mut db, "INSERT INTO s VALUES (2,'a@x.com')"),
        ErrorKind::UniqueViolation
    );

    // NULLs never collide
    db.execute("INSERT INTO s VALUES (2, NULL)").unwrap();
    db.execute("INSERT INTO s VALUES (3, NULL)").unwrap();
    assert_eq!(db.execute("SELECT * FROM s").unwrap().rows().len(), 3);
}

#[test]
fn test_missing_parent() {
    let mut db = with_products();
    assert_eq!(
        kind(&mut db, "INSERT INTO p VALUES (1, 99)"),
        ErrorKind::ForeignKeyViolation
    );
    assert!(db.execute("SELECT * FROM p").unwrap().rows().is_empty());

    // A NULL reference is not checked
    db.execute("INSERT INTO p VALUES (2, NULL)").unwrap();
}

#[test]
fn test_cascade_delete() {
    let mut db = with_products();
    db.execute("INSERT INTO p VALUES (1,1)").unwrap();

    let result = db.execute("DELETE FROM s WHERE id=1").unwrap();
    assert_eq!(result.affected_rows(), Some(1));
    assert_eq!(result.message(), Some("1 row(s) deleted, 1 cascaded"));

    assert!(db.execute("SELECT * FROM p").unwrap().rows().is_empty());
    assert!(db.execute("SELECT * FROM s").unwrap().rows().is_empty());
}

#[test]
fn test_index_matches_scan() {
    let mut db = suppliers();
    db.execute("INSERT INTO s VALUES (2,'b@x.com')").unwrap();
    let query = "SELECT * FROM s WHERE email='a@x.com'";

    let scanned = db.execute(query).unwrap();
    db.execute("CREATE INDEX idx ON s(email)").unwrap();
    let indexed = db.execute(query).unwrap();
    assert_eq!(scanned, indexed);
    assert_eq!(indexed.rows()[0]["id"], Value::Int(1));

    db.execute("DELETE FROM s").unwrap();
    assert!(db.execute(query).unwrap().rows().is_empty());
    assert!(db.table("s").unwrap().indexes_consistent());

    db.execute("INSERT INTO s VALUES (5,'a@x.com'), (6,'c@x.com')")
        .unwrap();
    let table = db.table("s").unwrap();
    assert!(table.indexes_consistent());
    assert_eq!(table.get_index("idx").unwrap().len(), 2);

    let rows = db.execute(query).unwrap();
    assert_eq!(rows.rows().len(), 1);
    assert_eq!(rows.rows()[0]["id"], Value::Int(5));
}

#[test]
fn test_join() {
    let mut db = with_products();
    db.execute("INSERT INTO s VALUES (2,'b@x.com')").unwrap();
    db.execute("INSERT INTO p VALUES (10, 1), (11, 2), (12, 1), (13, NULL)")
        .unwrap();

    let result = db
        .execute("SELECT p.id, s.email FROM p JOIN s ON p.supplier_id = s.id WHERE s.id = 1")
        .unwrap();
    assert_eq!(result.columns(), &["p.id".to_string(), "s.email".to_string()]);
    let ids: Vec<&Value> = result.rows().iter().map(|r| &r["p.id"]).collect();
    assert_eq!(ids, vec![&Value::Int(10), &Value::Int(12)]);

    let all = db
        .execute("SELECT * FROM s INNER JOIN p ON s.id = p.supplier_id")
        .unwrap();
    assert_eq!(all.rows().len(), 3);
    assert_eq!(all.columns().len(), 4);

    assert_eq!(
        kind(&mut db, "SELECT id FROM s JOIN p ON s.id = p.supplier_id"),
        ErrorKind::UnknownColumn
    );
}

#[test]
fn test_where_operators() {
    let mut db = suppliers();
    db.execute("INSERT INTO s VALUES (2,'B@Y.org'), (3,'c@x.com'), (4, NULL)")
        .unwrap();

    let count = |db: &mut Database, sql: &str| db.execute(sql).unwrap().rows().len();
    assert_eq!(count(&mut db, "SELECT * FROM s WHERE id > 1"), 3);
    assert_eq!(count(&mut db, "SELECT * FROM s WHERE id <= 2"), 2);
    assert_eq!(count(&mut db, "SELECT * FROM s WHERE id != 2"), 3);
    assert_eq!(count(&mut db, "SELECT * FROM s WHERE email LIKE '%x.com'"), 2);
    assert_eq!(count(&mut db, "SELECT * FROM s WHERE email LIKE 'b@y%'"), 1);
    assert_eq!(count(&mut db, "SELECT * FROM s WHERE email = NULL"), 0);
    assert_eq!(count(&mut db, "SELECT * FROM s WHERE email <> 'a@x.com'"), 2);

    assert_eq!(
        kind(&mut db, "SELECT * FROM s WHERE id = 'one'"),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind(&mut db, "SELECT * FROM s WHERE id LIKE 1"),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_update() {
    let mut db = with_products();
    db.execute("INSERT INTO s VALUES (2,'b@x.com')").unwrap();
    db.execute("INSERT INTO p VALUES (1, 1)").unwrap();

    let result = db
        .execute("UPDATE s SET email = 'z@x.com' WHERE id = 2")
        .unwrap();
    assert_eq!(result.affected_rows(), Some(1));

    assert_eq!(
        kind(&mut db, "UPDATE s SET email = 'a@x.com' WHERE id = 2"),
        ErrorKind::UniqueViolation
    );
    assert_eq!(
        kind(&mut db, "UPDATE s SET id = 7 WHERE id = 1"),
        ErrorKind::ForeignKeyViolation
    );
    assert_eq!(
        kind(&mut db, "UPDATE p SET supplier_id = 42"),
        ErrorKind::ForeignKeyViolation
    );

    db.execute("UPDATE p SET supplier_id = 2").unwrap();
    db.execute("UPDATE s SET id = 7 WHERE id = 1").unwrap();
    let rows = db.execute("SELECT id FROM s WHERE email = 'a@x.com'").unwrap();
    assert_eq!(rows.rows()[0]["id"], Value::Int(7));
}

#[test]
fn test_repeated_projection_keeps_every_column() {
    let mut db = suppliers();
    let result = db.execute("SELECT id, email, id FROM s").unwrap();

    assert_eq!(result.columns(), &["id", "email", "id_2"]);
    let row = &result.rows()[0];
    assert_eq!(row.len(), 3);
    assert_eq!(row["id"], Value::Int(1));
    assert_eq!(row["id_2"], Value::Int(1));
}

#[test]
fn test_type_words_as_column_names() {
    let mut db = Database::new();
    db.execute("CREATE TABLE notes (key INT PRIMARY KEY, text TEXT, index INT)")
        .unwrap();
    db.execute("INSERT INTO notes (key, text, index) VALUES (1, 'hello', 7)")
        .unwrap();
    db.execute("CREATE INDEX index ON notes(text)").unwrap();

    let result = db
        .execute("SELECT index FROM notes WHERE text = 'hello'")
        .unwrap();
    assert_eq!(result.columns(), &["index"]);
    assert_eq!(result.rows()[0]["index"], Value::Int(7));
}

#[test]
fn test_extreme_integers() {
    let mut db = Database::new();
    db.execute("CREATE TABLE n (v INT PRIMARY KEY)").unwrap();
    db.execute("INSERT INTO n VALUES (-9223372036854775808), (9223372036854775807)")
        .unwrap();

    let result = db.execute("SELECT v FROM n WHERE v < 0").unwrap();
    assert_eq!(result.rows()[0]["v"], Value::Int(i64::MIN));
    assert_eq!(
        db.execute("INSERT INTO n VALUES (9223372036854775808)")
            .unwrap_err()
            .kind(),
        ErrorKind::Parse
    );
}

#[test]
fn test_catalog_errors() {
    let mut db = with_products();
    assert_eq!(kind(&mut db, "SELECT * FROM nope"), ErrorKind::UnknownTable);
    assert_eq!(kind(&mut db, "SELECT nope FROM s"), ErrorKind::UnknownColumn);
    assert_eq!(
        kind(&mut db, "CREATE TABLE s (id INT)"),
        ErrorKind::DuplicateTable
    );
    assert_eq!(
        kind(&mut db, "INSERT INTO s VALUES (9)"),
        ErrorKind::ArityMismatch
    );
    assert_eq!(
        kind(&mut db, "INSERT INTO s VALUES ('x', 'y')"),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind(&mut db, "CREATE TABLE q (id INT REFERENCES nope(id))"),
        ErrorKind::ForeignKeyViolation
    );
    assert_eq!(kind(&mut db, "SELECT * FROM"), ErrorKind::Parse);
    assert_eq!(kind(&mut db, "SELECT 'open FROM s"), ErrorKind::Parse);
}
