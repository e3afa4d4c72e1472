use serde_json::json;
use vitrine::catalog::{Collection, Model, Product};
use vitrine::db::models::{NamedRecord, NewCollection, NewProduct};
use vitrine::db::Database;
use vitrine::filters::params::{
    parse_query_string, to_query_string, DecodePolicy, DecodedQuery, ParamKeys,
};
use vitrine::filters::{compile_query, decode, encode, Join, Schema};

struct Seed {
    id: i64,
    name: &'static str,
    price: Option<f64>,
    level: &'static str,
    brand: Option<i64>,
    styles: &'static [i64],
    created: &'static str,
}

impl Seed {
    fn product(&self) -> NewProduct {
        NewProduct {
            id: self.id,
            name: self.name.to_string(),
            description: String::new(),
            price: self.price,
            level: self.level.to_string(),
            brand: self.brand,
            styles: self.styles.to_vec(),
            created_at: Some(self.created.to_string()),
        }
    }
}

const PRODUCTS: &[Seed] = &[
    Seed {
        id: 1,
        name: "Trench Coat",
        price: Some(450.0),
        level: "RTW",
        brand: Some(1),
        styles: &[1],
        created: "2024-01-10T00:00:00Z",
    },
    Seed {
        id: 2,
        name: "Silk Dress",
        price: Some(150.0),
        level: "COUTURE",
        brand: Some(2),
        styles: &[2],
        created: "2024-03-01T00:00:00Z",
    },
    Seed {
        id: 3,
        name: "Wool Knit",
        price: Some(120.0),
        level: "RTW",
        brand: Some(1),
        styles: &[3],
        created: "2024-05-01T00:00:00Z",
    },
    Seed {
        id: 4,
        name: "Scarf",
        price: None,
        level: "HANDMADE",
        brand: None,
        styles: &[],
        created: "2024-06-01T00:00:00Z",
    },
];

fn seeded() -> Database {
    let db = Database::open_in_memory().unwrap();
    for (id, name) in [(1, "Isabel Marant"), (2, "Lemaire")] {
        let brand = NamedRecord { id, name: name.to_string() };
        db.upsert_brand(&brand).unwrap();
    }
    for (id, name) in [(1, "Coat"), (2, "Dress"), (3, "Knit")] {
        let style = NamedRecord { id, name: name.to_string() };
        db.upsert_style(&style).unwrap();
    }
    for seed in PRODUCTS {
        db.insert_product(&seed.product()).unwrap();
    }
    db.insert_collection(&NewCollection {
        id: 1,
        name: "Fall Winter 24".to_string(),
        year: 2024,
        season: "FALL".to_string(),
        sex: "WOMAN".to_string(),
        level: "RTW".to_string(),
        brand: Some(1),
        products: vec![1, 3],
    })
    .unwrap();
    db
}

fn parse<M: Model>(qs: &str) -> DecodedQuery<M> {
    parse_query_string::<M>(qs, &ParamKeys::default(), DecodePolicy::Strict).unwrap()
}

/// Ids of `M` records matched by a query string, honouring its page.
fn ids<M: Model>(db: &Database, qs: &str) -> Vec<i64>
where
    M::Row: serde::Serialize,
{
    let decoded = parse::<M>(qs);
    let take = decoded.page.take.unwrap_or(100);
    let result = db
        .find_many::<M>(
            &decoded.query.compile(),
            decoded.search.as_deref(),
            take,
            decoded.page.skip,
        )
        .unwrap();
    result
        .records
        .iter()
        .map(|r| serde_json::to_value(r).unwrap()["id"].as_i64().unwrap())
        .collect()
}

fn token(name: &str, condition: &str, value: serde_json::Value) -> String {
    let raw = format!(
        "{}:{}:{}",
        name,
        condition,
        urlencoding::encode(&value.to_string())
    );
    let filter = decode::<Product>(&raw).unwrap();
    urlencoding::encode(&encode(&filter)).into_owned()
}

fn one(name: &str, condition: &str, value: serde_json::Value) -> String {
    format!("f={}", token(name, condition, value))
}

#[test]
fn price_range_with_and() {
    let db = seeded();
    let qs = format!(
        "f={}&f={}",
        token("price", "gt", json!(100)),
        token("price", "lt", json!(200))
    );
    assert_eq!(ids::<Product>(&db, &qs), vec![2, 3]);
}

#[test]
fn or_and_not_joins() {
    let db = seeded();
    let qs = format!(
        "f={}&f={}",
        token("price", "gt", json!(400)),
        token("price", "lt", json!(130))
    );
    assert_eq!(ids::<Product>(&db, &format!("{qs}&j=OR")), vec![1, 3]);
    // NULL prices satisfy neither branch, so the scarf is excluded.
    assert_eq!(ids::<Product>(&db, &format!("{qs}&j=NOT")), vec![2]);
}

#[test]
fn empty_query_matches_everything_for_every_join() {
    let db = seeded();
    for join in Join::ALL {
        let result = db
            .find_many::<Product>(&compile_query::<Product>(join, &[]), None, 100, 0)
            .unwrap();
        assert_eq!(result.filtered, 4);
        assert_eq!(result.total, 4);
        assert_eq!(result.records.len(), 4);
    }
}

#[test]
fn to_many_quantifiers() {
    let db = seeded();
    let coat = json!({"id": 1, "name": "Coat"});
    assert_eq!(ids::<Product>(&db, &one("styles", "some", coat.clone())), vec![1]);
    assert_eq!(ids::<Product>(&db, &one("styles", "none", coat.clone())), vec![2, 3, 4]);
    // A product without styles trivially has every style in the set.
    assert_eq!(ids::<Product>(&db, &one("styles", "every", coat)), vec![1, 4]);

    let any = json!({"OR": [{"id": 2}, {"id": 3}]});
    assert_eq!(ids::<Product>(&db, &one("styles", "some", any)), vec![2, 3]);
}

#[test]
fn to_one_is_and_is_not() {
    let db = seeded();
    let marant = json!({"id": 1, "name": "Isabel Marant"});
    assert_eq!(ids::<Product>(&db, &one("brand", "is", marant.clone())), vec![1, 3]);
    assert_eq!(ids::<Product>(&db, &one("brand", "isNot", marant)), vec![2, 4]);
}

#[test]
fn text_enum_and_date_conditions() {
    let db = seeded();
    assert_eq!(ids::<Product>(&db, &one("name", "contains", json!("coat"))), vec![1]);
    assert_eq!(ids::<Product>(&db, &one("name", "startsWith", json!("S"))), vec![2, 4]);
    assert_eq!(ids::<Product>(&db, &one("level", "in", json!(["RTW"]))), vec![1, 3]);

    let since = json!("2024-03-01T00:00:00Z");
    assert_eq!(ids::<Product>(&db, &one("created_at", "gte", since)), vec![2, 3, 4]);
    let same_instant = json!("2024-01-10T01:00:00+01:00");
    assert_eq!(ids::<Product>(&db, &one("created_at", "is", same_instant)), vec![1]);
}

#[test]
fn search_ignores_whitespace() {
    let db = seeded();
    assert_eq!(ids::<Product>(&db, "search=trench+coat"), vec![1]);
    assert_eq!(ids::<Product>(&db, "search=silkdress"), vec![2]);
}

#[test]
fn collections_filter_through_the_same_dsl() {
    let db = seeded();
    let has_knit = "f=products%3Asome%3A%257B%2522id%2522%253A3%257D";
    assert_eq!(ids::<Collection>(&db, has_knit), vec![1]);
    assert_eq!(ids::<Collection>(&db, "f=season%3Ais%3A%2522SPRING%2522"), Vec::<i64>::new());

    let dated = "f=created_at%3Agt%3A%25222024%2522";
    let keys = ParamKeys::default();
    assert!(parse_query_string::<Collection>(dated, &keys, DecodePolicy::Strict).is_err());
}

#[test]
fn limit_keeps_filtered_count() {
    let db = seeded();
    let result = db
        .find_many::<Product>(&compile_query::<Product>(Join::And, &[]), None, 2, 0)
        .unwrap();
    assert_eq!(result.records.len(), 2);
    assert_eq!(result.filtered, 4);
}

#[test]
fn skip_and_take_page_through_matches() {
    let db = seeded();
    let rtw_or_cheap = format!(
        "f={}&f={}&j=OR",
        token("level", "is", json!("RTW")),
        token("price", "lt", json!(200))
    );
    assert_eq!(ids::<Product>(&db, &rtw_or_cheap), vec![1, 2, 3]);
    assert_eq!(ids::<Product>(&db, &format!("{rtw_or_cheap}&take=2")), vec![1, 2]);
    assert_eq!(ids::<Product>(&db, &format!("{rtw_or_cheap}&skip=2&take=2")), vec![3]);
    assert!(ids::<Product>(&db, &format!("{rtw_or_cheap}&skip=3")).is_empty());

    let decoded = parse::<Product>(&rtw_or_cheap);
    let predicate = decoded.query.compile();
    for skip in 0..4 {
        let page = db.find_many::<Product>(&predicate, None, 1, skip).unwrap();
        assert_eq!(page.filtered, 3);
        assert_eq!(page.total, 4);
        assert_eq!(page.records.len(), usize::from(skip < 3));
    }
}

#[test]
fn query_string_round_trip_through_the_engine() {
    let db = seeded();
    let qs = format!(
        "f={}&f={}&j=OR",
        token("price", "gt", json!(400)),
        token("level", "is", json!("COUTURE"))
    );
    let decoded = parse::<Product>(&qs);
    let again = to_query_string(&decoded.query, &ParamKeys::default());
    assert_eq!(ids::<Product>(&db, &again), vec![1, 2]);
    assert_eq!(decoded.query.to_string(), r#"price gt 400 OR level is "COUTURE""#);
    assert_eq!(Product::MODEL, "product");
}
