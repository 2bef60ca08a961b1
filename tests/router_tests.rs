//! Integration tests for route table compilation and lookup

use http::Method;
use ramlrouter::error::CompileError;
use ramlrouter::{load_str, MethodSet, RouteLookup, RouteTable};
use std::sync::Arc;
use std::thread;

const SHOP: &str = r#"#%RAML 1.0
title: Shop
baseUri: https://shop.example.com/{version}
version: v2
/products:
  get:
  post:
  /featured:
    get:
      (handler): featured_products
  /{productID}:
    get:
      (handler): get_product
    put:
      (handler): update_product
    /reviews/{reviewID}:
      get:
      delete:
/orders/{orderID}:
  get:
"#;

fn shop() -> RouteTable {
    RouteTable::compile(&load_str(SHOP).unwrap()).unwrap()
}

fn handler_for(table: &RouteTable, method: Method, path: &str) -> Option<String> {
    match table.lookup(&method, path) {
        RouteLookup::Matched(m) => Some(m.handler_name().to_string()),
        _ => None,
    }
}

#[test]
fn test_base_path_prefixes_every_pattern() {
    let table = shop();
    assert_eq!(table.base_path(), "/v2");
    assert!(table.entries().iter().all(|e| e.pattern.starts_with("/v2/")));
    assert_eq!(
        handler_for(&table, Method::GET, "/v2/products/7").as_deref(),
        Some("get_product")
    );
    assert!(matches!(
        table.lookup(&Method::GET, "/products/7"),
        RouteLookup::NotFound
    ));
}

#[test]
fn test_multi_segment_resource_key() {
    let table = shop();
    match table.lookup(&Method::DELETE, "/v2/products/7/reviews/99") {
        RouteLookup::Matched(m) => {
            assert_eq!(m.path_param("productID"), Some("7"));
            assert_eq!(m.path_param("reviewID"), Some("99"));
            assert_eq!(m.route.pattern, "/v2/products/{productID}/reviews/{reviewID}");
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_method_not_allowed_lists_verbs() {
    let table = shop();
    match table.lookup(&Method::DELETE, "/v2/products/42") {
        RouteLookup::MethodNotAllowed(allowed) => {
            assert_eq!(allowed.to_string(), "GET, PUT");
            let expected: MethodSet = [Method::GET, Method::PUT].iter().collect();
            assert_eq!(allowed, expected);
        }
        other => panic!("expected 405, got {other:?}"),
    }
}

#[test]
fn test_unknown_path_is_not_found() {
    let table = shop();
    assert!(matches!(
        table.lookup(&Method::GET, "/v2/unknown"),
        RouteLookup::NotFound
    ));
    assert!(matches!(
        table.lookup(&Method::GET, "/v2/products/42/reviews"),
        RouteLookup::NotFound
    ));
}

#[test]
fn test_compiling_twice_matches_identically() {
    let spec = load_str(SHOP).unwrap();
    let a = RouteTable::compile(&spec).unwrap();
    let b = RouteTable::compile(&spec).unwrap();
    let requests = [
        (Method::GET, "/v2/products"),
        (Method::POST, "/v2/products"),
        (Method::GET, "/v2/products/featured"),
        (Method::PUT, "/v2/products/featured"),
        (Method::GET, "/v2/products/1/reviews/2"),
        (Method::GET, "/v2/orders/abc"),
        (Method::GET, "/v2//orders/abc/"),
        (Method::PATCH, "/v2/orders/abc"),
        (Method::GET, "/nowhere"),
    ];
    for (method, path) in requests {
        assert_eq!(
            outcome(&a, &method, path),
            outcome(&b, &method, path),
            "{method} {path}"
        );
    }
}

fn outcome(table: &RouteTable, method: &Method, path: &str) -> String {
    match table.lookup(method, path) {
        RouteLookup::Matched(m) => {
            let mut params: Vec<_> = m.path_params.into_iter().collect();
            params.sort();
            format!("{} {params:?}", m.route.handler_name)
        }
        RouteLookup::MethodNotAllowed(allowed) => format!("405 {allowed}"),
        RouteLookup::NotFound => "404".to_string(),
    }
}

#[test]
fn test_literal_wins_regardless_of_declaration_order() {
    let raml = r#"#%RAML 1.0
title: Order
/products:
  /{productID}:
    get:
      (handler): get_product
  /featured:
    get:
      (handler): featured_products
"#;
    let table = RouteTable::compile(&load_str(raml).unwrap()).unwrap();
    assert_eq!(
        handler_for(&table, Method::GET, "/products/featured").as_deref(),
        Some("featured_products")
    );
    assert_eq!(
        handler_for(&table, Method::GET, "/products/featured2").as_deref(),
        Some("get_product")
    );
}

#[test]
fn test_sibling_templates_are_rejected() {
    let raml = r#"#%RAML 1.0
title: Ambiguous
/items/{id}:
  get:
/items/{slug}:
  put:
"#;
    let err = RouteTable::compile(&load_str(raml).unwrap()).unwrap_err();
    match err {
        CompileError::AmbiguousTemplate {
            existing,
            conflicting,
            ..
        } => {
            assert_eq!(existing, "id");
            assert_eq!(conflicting, "slug");
        }
        other => panic!("expected AmbiguousTemplate, got {other:?}"),
    }
}

#[test]
fn test_concurrent_lookups_share_one_table() {
    let table = Arc::new(shop());
    let workers: Vec<_> = (0..8)
        .map(|i| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for n in 0..200 {
                    let path = format!("/v2/products/{}", i * 1000 + n);
                    match table.lookup(&Method::GET, &path) {
                        RouteLookup::Matched(m) => {
                            assert_eq!(m.path_param("productID"), Some(&path[13..]));
                        }
                        other => panic!("expected match, got {other:?}"),
                    }
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
}
