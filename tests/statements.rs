//! Generated SQL for relation loads, whole-record statements and join reconciliation

mod common;

use common::*;
use relmeta::relation::BelongsTo;
use relmeta::sea_query::Value;
use relmeta::{
    Dialect, EntityDescriptor, Error, Record, Registry, RelationKind, StatementBuilder,
};

fn book() -> Book {
    Book {
        book_id: "b1".into(),
        author_id: "a1".into(),
        publisher_id: "p1".into(),
        title: "Dune".into(),
        category_id_list: strings(&["c1", "c2", "c1"]),
        ..Book::default()
    }
}

fn params(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

// ============================================================================
// Relation selects
// ============================================================================

#[test]
fn test_belongs_to_selects_target_by_its_key() {
    let registry = registry();
    let stmt = sqlite(&registry).select_relation(&book(), "author").unwrap();
    assert_eq!(
        stmt.sql,
        r#"SELECT "author_id", "nom_de_plume" FROM "author" WHERE "author_id" = ?"#
    );
    assert_eq!(stmt.params(), params(&["a1"]));

    let stmt = sqlite(&registry).select_relation(&book(), "publisher").unwrap();
    assert_eq!(
        stmt.sql,
        concat!(
            r#"SELECT "publisher_id", "company_name", "version" FROM "publisher" "#,
            r#"WHERE "publisher_id" = ?"#
        )
    );
    assert_eq!(stmt.params(), params(&["p1"]));
}

#[test]
fn test_has_many_and_has_one_select_by_owner_id() {
    let registry = registry();
    let author = Author {
        author_id: "a1".into(),
        ..Author::default()
    };
    let stmt = sqlite(&registry).select_relation(&author, "book_list").unwrap();
    assert_eq!(
        stmt.sql,
        concat!(
            r#"SELECT "book_id", "author_id", "publisher_id", "title" FROM "book" "#,
            r#"WHERE "author_id" = ?"#
        )
    );
    assert_eq!(stmt.params(), params(&["a1"]));

    let category = Category {
        category_id: "c1".into(),
        ..Category::default()
    };
    let stmt = sqlite(&registry).select_relation(&category, "category_info").unwrap();
    assert_eq!(
        stmt.sql,
        concat!(
            r#"SELECT "category_info_id", "category_id", "info_stuff" FROM "category_info" "#,
            r#"WHERE "category_id" = ?"#
        )
    );
    assert_eq!(stmt.params(), params(&["c1"]));
}

#[test]
fn test_belongs_to_many_joins_through_join_table() {
    let registry = registry();
    let stmt = sqlite(&registry).select_relation(&book(), "category_list").unwrap();
    assert_eq!(
        stmt.sql,
        concat!(
            r#"SELECT "category"."category_id", "category"."name" FROM "book_category" "#,
            r#"INNER JOIN "category" ON "book_category"."category_id" = "category"."category_id" "#,
            r#"WHERE "book_category"."book_id" = ?"#
        )
    );
    assert_eq!(stmt.params(), params(&["b1"]));

    let category = Category {
        category_id: "c1".into(),
        ..Category::default()
    };
    let stmt = sqlite(&registry).select_relation(&category, "book_list").unwrap();
    assert_eq!(
        stmt.sql,
        concat!(
            r#"SELECT "book"."book_id", "book"."author_id", "book"."publisher_id", "#,
            r#""book"."title" FROM "book_category" INNER JOIN "book" "#,
            r#"ON "book_category"."book_id" = "book"."book_id" "#,
            r#"WHERE "book_category"."category_id" = ?"#
        )
    );
}

#[test]
fn test_belongs_to_many_ids_reads_join_column_only() {
    let registry = registry();
    let stmt = sqlite(&registry).select_relation(&book(), "category_id_list").unwrap();
    assert_eq!(
        stmt.sql,
        r#"SELECT "category_id" FROM "book_category" WHERE "book_id" = ?"#
    );
    assert_eq!(stmt.params(), params(&["b1"]));
}

#[test]
fn test_postgres_numbers_placeholders() {
    let registry = registry();
    let builder = StatementBuilder::new(&registry, Dialect::Postgres);
    let stmt = builder.select_relation(&book(), "category_id_list").unwrap();
    assert_eq!(
        stmt.sql,
        r#"SELECT "category_id" FROM "book_category" WHERE "book_id" = $1"#
    );
}

#[test]
fn test_storage_names_follow_renames() {
    let registry = registry();
    registry.rename_storage_names(|name| format!("shop_{name}"));
    let stmt = sqlite(&registry).select_relation(&book(), "category_list").unwrap();
    assert_eq!(
        stmt.sql,
        concat!(
            r#"SELECT "shop_category"."category_id", "shop_category"."name" "#,
            r#"FROM "shop_book_category" INNER JOIN "shop_category" "#,
            r#"ON "shop_book_category"."category_id" = "shop_category"."category_id" "#,
            r#"WHERE "shop_book_category"."book_id" = ?"#
        )
    );
}

// ============================================================================
// Lookup failures
// ============================================================================

#[test]
fn test_unregistered_record_type() {
    let registry = Registry::new();
    let err = sqlite(&registry).select_relation(&book(), "author").unwrap_err();
    assert!(matches!(err, Error::NotRegistered(_)));
    assert_eq!(err.status_code(), 404);
}

#[test]
fn test_unknown_relation_name() {
    let registry = registry();
    let err = sqlite(&registry).select_relation(&book(), "reviews").unwrap_err();
    match err {
        Error::RelationNotFound { entity, relation } => {
            assert_eq!(entity, "book");
            assert_eq!(relation, "reviews");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unregistered_target_and_join_entities() {
    let registry = Registry::new();
    registry.must_parse::<Book>();
    let builder = sqlite(&registry);
    assert!(matches!(
        builder.select_relation(&book(), "author"),
        Err(Error::NotRegistered(_))
    ));
    let err = builder.select_relation(&book(), "category_id_list").unwrap_err();
    assert!(matches!(err, Error::NotRegistered(ref name) if name == "book_category"));
}

#[test]
fn test_mis_shaped_value_field() {
    let registry = Registry::new();
    let mut desc = EntityDescriptor::new::<Book>("book");
    desc.set_key_fields(["book_id"]).add_relation(BelongsTo {
        name: "writer".into(),
        value_field: "title".into(),
        sql_id_field: "author_id".into(),
    });
    registry.register(desc);
    registry.must_parse::<Author>();

    let err = sqlite(&registry).select_relation(&book(), "writer").unwrap_err();
    assert!(matches!(err, Error::TypeShape(_)), "{err:?}");

    let mut desc = EntityDescriptor::new::<Book>("book");
    desc.set_key_fields(["book_id"]).add_relation(BelongsTo {
        name: "writer".into(),
        value_field: "ghost".into(),
        sql_id_field: "author_id".into(),
    });
    registry.register(desc);
    let err = sqlite(&registry).select_relation(&book(), "writer").unwrap_err();
    assert!(err.to_string().contains("ghost"));
}

#[derive(Record, Default)]
struct Edition {
    #[relmeta(pk)]
    book_id: String,
    #[relmeta(pk)]
    edition_no: i64,
    #[relmeta(has_many)]
    printings: Vec<Printing>,
}

#[derive(Record, Default)]
struct Printing {
    #[relmeta(pk)]
    printing_id: String,
    edition_id: String,
}

#[test]
fn test_composite_key_owner_uses_first_key() {
    let registry = Registry::new();
    registry.must_parse::<Edition>();
    registry.must_parse::<Printing>();
    let edition = Edition {
        book_id: "b1".into(),
        edition_no: 2,
        ..Edition::default()
    };
    let stmt = sqlite(&registry).select_relation(&edition, "printings").unwrap();
    assert_eq!(
        stmt.sql,
        r#"SELECT "printing_id", "edition_id" FROM "printing" WHERE "edition_id" = ?"#
    );
    assert_eq!(stmt.params(), params(&["b1"]));
}

// ============================================================================
// Whole-record statements
// ============================================================================

#[test]
fn test_insert_lists_every_column() {
    let registry = registry();
    let mut book = book();
    let stmt = sqlite(&registry).insert(&mut book).unwrap();
    assert_eq!(
        stmt.sql,
        concat!(
            r#"INSERT INTO "book" ("book_id", "author_id", "publisher_id", "title") "#,
            "VALUES (?, ?, ?, ?)"
        )
    );
    assert_eq!(stmt.params(), params(&["b1", "a1", "p1", "Dune"]));
}

#[test]
fn test_insert_skips_generated_key() {
    let registry = registry();
    let mut info = CategoryInfo {
        category_id: "c1".into(),
        info_stuff: "hardcover".into(),
        ..CategoryInfo::default()
    };
    let stmt = sqlite(&registry).insert(&mut info).unwrap();
    assert_eq!(
        stmt.sql,
        r#"INSERT INTO "category_info" ("category_id", "info_stuff") VALUES (?, ?)"#
    );
}

#[test]
fn test_insert_many() {
    let registry = registry();
    let mut authors = vec![
        Author {
            author_id: "a1".into(),
            nom_de_plume: "Mark Twain".into(),
            ..Author::default()
        },
        Author {
            author_id: "a2".into(),
            nom_de_plume: "George Eliot".into(),
            ..Author::default()
        },
    ];
    let builder = StatementBuilder::new(&registry, Dialect::Postgres);
    let stmt = builder.insert_many(&mut authors).unwrap();
    assert_eq!(
        stmt.sql,
        r#"INSERT INTO "author" ("author_id", "nom_de_plume") VALUES ($1, $2), ($3, $4)"#
    );
    assert!(matches!(
        builder.insert_many::<Author>(&mut []),
        Err(Error::TypeShape(_))
    ));
}

#[test]
fn test_versioned_update_and_delete() {
    let registry = registry();
    let mut publisher = Publisher {
        publisher_id: "p1".into(),
        company_name: "Ace".into(),
        version: 3,
        ..Publisher::default()
    };
    let stmt = sqlite(&registry).update_by_id(&mut publisher).unwrap();
    assert_eq!(
        stmt.sql,
        concat!(
            r#"UPDATE "publisher" SET "company_name" = ?, "version" = ? "#,
            r#"WHERE "publisher_id" = ? AND "version" = ?"#
        )
    );
    assert_eq!(
        stmt.params(),
        [
            Value::from("Ace"),
            Value::BigInt(Some(4)),
            Value::from("p1"),
            Value::BigInt(Some(3)),
        ]
    );
    assert_eq!(publisher.version, 3);

    let stmt = sqlite(&registry).delete_by_id(&publisher).unwrap();
    assert_eq!(
        stmt.sql,
        r#"DELETE FROM "publisher" WHERE "publisher_id" = ? AND "version" = ?"#
    );
    assert_eq!(stmt.params(), [Value::from("p1"), Value::BigInt(Some(3))]);
}

#[test]
fn test_composite_key_statements() {
    let registry = registry();
    let keys = params(&["b1", "c1"]);
    let stmt = sqlite(&registry).select_by_key::<BookCategory>(&keys).unwrap();
    assert_eq!(
        stmt.sql,
        concat!(
            r#"SELECT "book_id", "category_id" FROM "book_category" "#,
            r#"WHERE "book_id" = ? AND "category_id" = ?"#
        )
    );
    let stmt = sqlite(&registry).delete_by_key::<BookCategory>(&keys).unwrap();
    assert_eq!(
        stmt.sql,
        r#"DELETE FROM "book_category" WHERE "book_id" = ? AND "category_id" = ?"#
    );
    assert!(matches!(
        sqlite(&registry).select_by_key::<BookCategory>(&keys[..1]),
        Err(Error::TypeShape(_))
    ));
}

// ============================================================================
// Join reconciliation
// ============================================================================

#[test]
fn test_reconcile_sqlite() {
    let registry = registry();
    let plan = sqlite(&registry).reconcile(&book(), "category_id_list").unwrap();
    assert_eq!(
        plan.delete.sql,
        r#"DELETE FROM "book_category" WHERE "book_id" = ? AND "category_id" NOT IN (?, ?)"#
    );
    assert_eq!(plan.delete.params(), params(&["b1", "c1", "c2"]));
    let insert = plan.insert.unwrap();
    assert_eq!(
        insert.sql,
        concat!(
            r#"INSERT OR IGNORE INTO "book_category" ("book_id", "category_id") "#,
            "VALUES (?, ?), (?, ?)"
        )
    );
    assert_eq!(insert.params(), params(&["b1", "c1", "b1", "c2"]));
}

#[test]
fn test_reconcile_per_dialect_insert() {
    let registry = registry();
    let mysql = StatementBuilder::new(&registry, Dialect::Mysql)
        .reconcile_insert(&book(), "category_id_list")
        .unwrap()
        .unwrap();
    assert_eq!(
        mysql.sql,
        "INSERT IGNORE INTO `book_category` (`book_id`, `category_id`) VALUES (?, ?), (?, ?)"
    );

    let postgres = StatementBuilder::new(&registry, Dialect::Postgres);
    let plan = postgres.reconcile(&book(), "category_id_list").unwrap();
    assert_eq!(
        plan.delete.sql,
        r#"DELETE FROM "book_category" WHERE "book_id" = $1 AND "category_id" NOT IN ($2, $3)"#
    );
    assert_eq!(
        plan.insert.unwrap().sql,
        concat!(
            r#"INSERT INTO "book_category" ("book_id", "category_id") VALUES ($1, $2), ($3, $4) "#,
            r#"ON CONFLICT ("book_id", "category_id") DO NOTHING"#
        )
    );
}

#[test]
fn test_reconcile_empty_set_deletes_all() {
    let registry = registry();
    let book = Book {
        category_id_list: Vec::new(),
        ..book()
    };
    let plan = sqlite(&registry).reconcile(&book, "category_id_list").unwrap();
    assert_eq!(plan.delete.sql, r#"DELETE FROM "book_category" WHERE "book_id" = ?"#);
    assert_eq!(plan.delete.params(), params(&["b1"]));
    assert!(plan.insert.is_none());
}

#[test]
fn test_reconcile_rejects_record_relations() {
    let registry = registry();
    let builder = sqlite(&registry);
    for (name, kind) in [
        ("category_list", RelationKind::BelongsToMany),
        ("author", RelationKind::BelongsTo),
    ] {
        match builder.reconcile_delete(&book(), name).unwrap_err() {
            Error::UnsupportedRelationKind { kind: actual, .. } => assert_eq!(actual, kind),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(builder.reconcile_insert(&book(), name).is_err());
    }
}
