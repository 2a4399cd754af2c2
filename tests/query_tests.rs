//! End-to-end statement execution over an in-memory database.

use chrono::{TimeZone, Utc};
use querybank::{
    escape_string, with_query, Dialect, KeyColumns, LimitRows, Param, Query, QueryBank,
    RecordMapper, RecordQueries, ResolveError, Resolver, Row, StatementError,
};
use rusqlite::Connection;
use std::io::Write as _;

const BANK: &str = "\
schema.create=CREATE TABLE PERSON ( ID INTEGER PRIMARY KEY AUTOINCREMENT, NAME VARCHAR(100) NOT NULL, AGE INT, HIRED TIMESTAMP, ACTIVE CHAR(1), PHOTO BLOB )
person.insert=INSERT INTO PERSON (NAME, AGE, HIRED, ACTIVE, PHOTO) VALUES (?, ?, ?, ?, ?)
person.by.name=SELECT ID, NAME, AGE, HIRED, ACTIVE FROM PERSON WHERE NAME = ?
person.count=SELECT COUNT(*) FROM PERSON
person.names=SELECT NAME FROM PERSON ORDER BY NAME
person.photo=SELECT PHOTO FROM PERSON WHERE NAME = ?
person.purge=DELETE FROM PERSON WHERE NAME = '%s'
pet.select=SELECT NAME, OWNER FROM PET WHERE NAME = ?
pet.insert=INSERT INTO PET (NAME, OWNER) VALUES (?, ?)
pet.delete=DELETE FROM PET WHERE NAME = ?
pet.update=UPDATE PET SET OWNER = ? WHERE NAME = ?
greeting=SELECT 'hello'
greeting.postgres=SELECT 'hello from postgres'
";

fn setup() -> (Connection, Resolver) {
    let conn = Connection::open_in_memory().unwrap();
    let bank = QueryBank::parse(BANK).unwrap();
    let resolver = Resolver::new(bank, Dialect::Sqlite);
    let query = Query::new(&conn, resolver.clone());
    query
        .prepared("schema.create")
        .unwrap()
        .call(&[])
        .unwrap();
    (conn, resolver)
}

fn insert_person(query: &Query<'_>, name: &str, age: Option<i32>, active: bool) {
    query
        .prepared("person.insert")
        .unwrap()
        .call(&[
            name.into(),
            Param::nullable_int(age),
            Utc.with_ymd_and_hms(2020, 3, 14, 9, 0, 0).unwrap().into(),
            active.into(),
            Param::nullable_file(None),
        ])
        .unwrap();
}

#[test]
fn row_extraction_follows_column_order() {
    let (conn, resolver) = setup();
    let query = Query::new(&conn, resolver);
    insert_person(&query, "ada", Some(36), true);

    let person = query
        .prepared_rows("person.by.name", |row: &mut Row<'_>| {
            let _id = row.next_long()?;
            let name = row.next_string()?;
            let age = row.nullable_int()?;
            let hired = row.next_timestamp()?;
            let active = row.next_bool()?;
            Ok((name, age, hired, active))
        })
        .unwrap()
        .call(&["ada".into()])
        .unwrap();

    assert_eq!(person.len(), 1);
    let (name, age, hired, active) = &person[0];
    assert_eq!(name, "ada");
    assert_eq!(*age, Some(36));
    assert_eq!(*hired, Utc.with_ymd_and_hms(2020, 3, 14, 9, 0, 0).unwrap());
    assert!(*active);
}

#[test]
fn typed_null_markers_read_back_as_none() {
    let (conn, resolver) = setup();
    let query = Query::new(&conn, resolver);
    insert_person(&query, "bob", None, false);

    let ages = query
        .prepared_rows("person.by.name", |row: &mut Row<'_>| {
            let _id = row.next_long()?;
            let _name = row.next_string()?;
            row.nullable_int()
        })
        .unwrap()
        .call(&["bob".into()])
        .unwrap();
    assert_eq!(ages, vec![None]);
}

#[test]
fn every_null_kind_round_trips_as_absent() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE NULLS ( I INT, L BIGINT, S VARCHAR(10), T TIMESTAMP, B CHAR(1), F BLOB )",
    )
    .unwrap();
    let bank = QueryBank::parse(
        "nulls.insert=INSERT INTO NULLS (I, L, S, T, B, F) VALUES (?, ?, ?, ?, ?, ?)\n\
         nulls.select=SELECT I, L, S, T, B, F FROM NULLS\n",
    )
    .unwrap();
    let query = Query::new(&conn, Resolver::new(bank, Dialect::Sqlite));

    query
        .prepared("nulls.insert")
        .unwrap()
        .call(&[
            Param::nullable_int(None),
            Param::nullable_long(None),
            Param::nullable_str(None),
            Param::nullable_timestamp(None),
            Param::nullable_bool(None),
            Param::nullable_file(None),
        ])
        .unwrap();

    let rows = query
        .prepared_rows("nulls.select", |row: &mut Row<'_>| {
            assert_eq!(row.nullable_int()?, None);
            assert_eq!(row.nullable_long()?, None);
            assert_eq!(row.nullable_string()?, None);
            assert_eq!(row.nullable_timestamp()?, None);
            assert_eq!(row.nullable_bool()?, None);
            Ok(())
        })
        .unwrap()
        .call(&[])
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn booleans_are_stored_as_y_and_n() {
    let (conn, resolver) = setup();
    let query = Query::new(&conn, resolver);
    insert_person(&query, "yes", None, true);
    insert_person(&query, "no", None, false);

    let code: String = conn
        .query_row("SELECT ACTIVE FROM PERSON WHERE NAME = 'yes'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(code, "Y");
    let code: String = conn
        .query_row("SELECT ACTIVE FROM PERSON WHERE NAME = 'no'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(code, "N");
}

#[test]
fn scalar_result_handler_consumes_the_cursor() {
    let (conn, resolver) = setup();
    let query = Query::new(&conn, resolver);
    insert_person(&query, "ada", Some(36), true);
    insert_person(&query, "bob", None, false);

    let count = query
        .prepared_result("person.count", |result: &mut querybank::ResultSet<'_>| {
            match result.next()? {
                Some(mut row) => row.next_long(),
                None => Ok(0),
            }
        })
        .unwrap()
        .call(&[])
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn limited_rows_keep_the_full_count() {
    let (conn, resolver) = setup();
    let query = Query::new(&conn, resolver);
    for name in ["ada", "bob", "cleo", "dot"] {
        insert_person(&query, name, None, true);
    }

    let limited = query
        .prepared_result(
            "person.names",
            LimitRows::new(|row: &mut Row<'_>| row.next_string(), 2),
        )
        .unwrap()
        .call(&[])
        .unwrap();
    assert_eq!(limited.rows, vec!["ada".to_string(), "bob".to_string()]);
    assert_eq!(limited.full_count, 4);
    assert!(limited.is_limited());

    // A result within the limit is complete.
    let all = query
        .prepared_result(
            "person.names",
            LimitRows::new(|row: &mut Row<'_>| row.next_string(), 10),
        )
        .unwrap()
        .call(&[])
        .unwrap();
    assert_eq!(all.full_count, 4);
    assert!(!all.is_limited());
}

#[test]
fn generated_keys_increase_monotonically() {
    let (conn, resolver) = setup();
    let query = Query::new(&conn, resolver);

    let mut keyed = query
        .prepared_keys(
            "person.insert",
            KeyColumns::new(&["ID"], |row: &mut Row<'_>| row.next_long()),
        )
        .unwrap();
    let first = keyed
        .call(&[
            "ada".into(),
            Param::nullable_int(None),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap().into(),
            true.into(),
            Param::nullable_file(None),
        ])
        .unwrap();
    let second = keyed
        .call(&[
            "bob".into(),
            Param::nullable_int(None),
            Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap().into(),
            false.into(),
            Param::nullable_file(None),
        ])
        .unwrap();
    assert!(second > first);
}

#[test]
fn file_parameter_binds_blob_contents() {
    let (conn, resolver) = setup();
    let query = Query::new(&conn, resolver);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"\x89PNG fake image bytes").unwrap();
    query
        .prepared("person.insert")
        .unwrap()
        .call(&[
            "pic".into(),
            Param::nullable_int(None),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap().into(),
            true.into(),
            file.path().into(),
        ])
        .unwrap();

    let blob: Vec<u8> = conn
        .query_row("SELECT PHOTO FROM PERSON WHERE NAME = 'pic'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(blob, b"\x89PNG fake image bytes");
}

#[test]
fn missing_file_parameter_is_a_statement_error() {
    let (conn, resolver) = setup();
    let query = Query::new(&conn, resolver);
    let err = query
        .prepared("person.insert")
        .unwrap()
        .call(&[
            "pic".into(),
            Param::nullable_int(None),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap().into(),
            true.into(),
            std::path::Path::new("/no/such/photo.png").into(),
        ])
        .unwrap_err();
    assert!(matches!(err, StatementError::FileParameter { .. }));
}

#[test]
fn statement_family_formats_arguments_into_sql() {
    let (conn, resolver) = setup();
    let query = Query::new(&conn, resolver);
    insert_person(&query, "o'hara", None, true);

    let purge = query.statement("person.purge").unwrap();
    let removed = purge.call(&[&escape_string("o'hara")]).unwrap();
    assert_eq!(removed, 1);
}

#[test]
fn dialect_selects_bank_entry() {
    let bank = QueryBank::parse(BANK).unwrap();
    let sqlite = Resolver::new(bank.clone(), Dialect::Sqlite);
    let postgres = Resolver::new(bank, Dialect::Postgres);
    assert_eq!(sqlite.resolve("greeting").unwrap(), "SELECT 'hello'");
    assert_eq!(
        postgres.resolve("greeting").unwrap(),
        "SELECT 'hello from postgres'"
    );
}

#[test]
fn missing_key_fails_before_touching_the_database() {
    let (conn, resolver) = setup();
    let query = Query::new(&conn, resolver);
    let err = query.prepared("person.no.such.key").unwrap_err();
    assert!(matches!(
        err,
        StatementError::Resolve(ResolveError::MissingKey { .. })
    ));
}

#[test]
fn record_mapper_round_trips() {
    #[derive(Debug, Clone, PartialEq)]
    struct Pet {
        name: String,
        owner: String,
    }

    let (conn, resolver) = setup();
    conn.execute_batch("CREATE TABLE PET ( NAME VARCHAR(40) PRIMARY KEY, OWNER VARCHAR(40) )")
        .unwrap();
    let query = Query::new(&conn, resolver);

    let mapper = RecordMapper::<Pet> {
        queries: RecordQueries {
            select: "pet.select".to_string(),
            insert: "pet.insert".to_string(),
            delete: "pet.delete".to_string(),
            update: Some("pet.update".to_string()),
            generated: false,
        },
        read: |row| {
            Ok(Pet {
                name: row.next_string()?,
                owner: row.next_string()?,
            })
        },
        insert_params: |p| vec![p.name.as_str().into(), p.owner.as_str().into()],
        key_params: |p| vec![p.name.as_str().into()],
        update_params: Some(|p| vec![p.owner.as_str().into(), p.name.as_str().into()]),
    };

    let mut pets = query.record(&mapper).unwrap();
    let rex = Pet {
        name: "rex".to_string(),
        owner: "ada".to_string(),
    };
    assert_eq!(pets.insert(&rex).unwrap(), None);
    assert_eq!(pets.find(&rex).unwrap(), Some(rex.clone()));

    let rehomed = Pet {
        owner: "bob".to_string(),
        ..rex.clone()
    };
    assert!(pets.update(&rehomed).unwrap());
    assert_eq!(pets.find(&rex).unwrap(), Some(rehomed.clone()));

    assert!(pets.delete(&rex).unwrap());
    assert_eq!(pets.find(&rex).unwrap(), None);
    assert!(!pets.delete(&rex).unwrap());
}

#[test]
fn generated_record_key_finds_the_inserted_row() {
    #[derive(Debug, Clone, PartialEq)]
    struct Task {
        id: i64,
        title: String,
    }

    let (conn, _) = setup();
    conn.execute_batch(
        "CREATE TABLE TASK ( ID INTEGER PRIMARY KEY AUTOINCREMENT, TITLE VARCHAR(100) )",
    )
    .unwrap();
    let bank = QueryBank::parse(
        "task.select=SELECT ID, TITLE FROM TASK WHERE ID = ?\n\
         task.insert=INSERT INTO TASK (TITLE) VALUES (?)\n\
         task.delete=DELETE FROM TASK WHERE ID = ?\n",
    )
    .unwrap();
    let query = Query::new(&conn, Resolver::new(bank, Dialect::Sqlite));

    let mapper = RecordMapper::<Task> {
        queries: RecordQueries {
            select: "task.select".to_string(),
            insert: "task.insert".to_string(),
            delete: "task.delete".to_string(),
            update: None,
            generated: true,
        },
        read: |row| {
            Ok(Task {
                id: row.next_long()?,
                title: row.next_string()?,
            })
        },
        insert_params: |t| vec![t.title.as_str().into()],
        key_params: |t| vec![t.id.into()],
        update_params: None,
    };

    let mut tasks = query.record(&mapper).unwrap();
    let draft = Task {
        id: 0,
        title: "water the plants".to_string(),
    };
    let key = tasks.insert(&draft).unwrap().expect("generated key");

    let saved = Task { id: key, ..draft };
    assert_eq!(tasks.find(&saved).unwrap(), Some(saved.clone()));

    let second = tasks
        .insert(&Task {
            id: 0,
            title: "feed the cat".to_string(),
        })
        .unwrap()
        .expect("generated key");
    assert!(second > key);
    assert!(tasks.delete(&saved).unwrap());
}

#[test]
fn record_without_update_rejects_update_calls() {
    #[derive(Debug)]
    struct Pet {
        name: String,
        owner: String,
    }

    let (conn, resolver) = setup();
    conn.execute_batch("CREATE TABLE PET ( NAME VARCHAR(40) PRIMARY KEY, OWNER VARCHAR(40) )")
        .unwrap();
    let query = Query::new(&conn, resolver);

    let mapper = RecordMapper::<Pet> {
        queries: RecordQueries {
            select: "pet.select".to_string(),
            insert: "pet.insert".to_string(),
            delete: "pet.delete".to_string(),
            update: None,
            generated: false,
        },
        read: |row| {
            Ok(Pet {
                name: row.next_string()?,
                owner: row.next_string()?,
            })
        },
        insert_params: |p| vec![p.name.as_str().into(), p.owner.as_str().into()],
        key_params: |p| vec![p.name.as_str().into()],
        update_params: None,
    };

    let mut pets = query.record(&mapper).unwrap();
    let rex = Pet {
        name: "rex".to_string(),
        owner: "ada".to_string(),
    };
    pets.insert(&rex).unwrap();
    let err = pets.update(&rex).unwrap_err();
    assert!(matches!(err, StatementError::InvalidRecord(_)));
}

#[test]
fn unit_of_work_rolls_back_on_failure() {
    let (conn, resolver) = setup();
    let failed = with_query(&conn, resolver.clone(), |q: &Query<'_>| {
        insert_person(q, "ghost", None, true);
        q.prepared("person.no.such.key")?;
        Ok(())
    });
    assert!(failed.is_err());

    let query = Query::new(&conn, resolver);
    let count = query
        .prepared_result("person.count", |result: &mut querybank::ResultSet<'_>| {
            match result.next()? {
                Some(mut row) => row.next_long(),
                None => Ok(0),
            }
        })
        .unwrap()
        .call(&[])
        .unwrap();
    assert_eq!(count, 0);
}
