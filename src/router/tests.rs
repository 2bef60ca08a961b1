use super::{normalize_path, MethodSet, RouteLookup, RouteTable};
use crate::error::CompileError;
use crate::spec::load_str;
use http::Method;

fn table(raml: &str) -> RouteTable {
    RouteTable::compile(&load_str(raml).unwrap()).unwrap()
}

fn compile_err(raml: &str) -> CompileError {
    RouteTable::compile(&load_str(raml).unwrap()).unwrap_err()
}

const PRODUCTS: &str = r#"#%RAML 1.0
title: Products
/products:
  get:
  /featured:
    get:
      (handler): featured_products
  /{productID}:
    get:
      (handler): get_product
    put:
      (handler): update_product
    /reviews:
      get:
"#;

#[test]
fn test_one_entry_per_method() {
    let t = table(PRODUCTS);
    assert_eq!(t.len(), 5);
    let patterns: Vec<String> = t
        .entries()
        .iter()
        .map(|e| format!("{} {}", e.method, e.pattern))
        .collect();
    assert_eq!(
        patterns,
        vec![
            "GET /products",
            "GET /products/featured",
            "GET /products/{productID}",
            "PUT /products/{productID}",
            "GET /products/{productID}/reviews",
        ]
    );
}

#[test]
fn test_path_parameter_capture() {
    let t = table(PRODUCTS);
    match t.lookup(&Method::GET, "/products/42") {
        RouteLookup::Matched(m) => {
            assert_eq!(m.handler_name(), "get_product");
            assert_eq!(m.path_param("productID"), Some("42"));
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_literal_beats_template() {
    let t = table(PRODUCTS);
    match t.lookup(&Method::GET, "/products/featured") {
        RouteLookup::Matched(m) => {
            assert_eq!(m.handler_name(), "featured_products");
            assert!(m.path_params.is_empty());
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_backtracks_into_template() {
    // no /products/featured/reviews exists, so the template branch must be tried
    let t = table(PRODUCTS);
    match t.lookup(&Method::GET, "/products/featured/reviews") {
        RouteLookup::Matched(m) => {
            assert_eq!(m.route.pattern, "/products/{productID}/reviews");
            assert_eq!(m.path_param("productID"), Some("featured"));
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_method_not_allowed_lists_verbs() {
    let t = table(PRODUCTS);
    match t.lookup(&Method::DELETE, "/products/42") {
        RouteLookup::MethodNotAllowed(allowed) => {
            assert_eq!(allowed.to_string(), "GET, PUT");
        }
        other => panic!("expected 405, got {other:?}"),
    }
}

#[test]
fn test_allowed_is_union_over_matching_nodes() {
    // PUT exists only on the template; POST only on the literal
    let t = table(
        r#"#%RAML 1.0
title: Union
/items:
  /special:
    post:
  /{id}:
    put:
"#,
    );
    match t.lookup(&Method::GET, "/items/special") {
        RouteLookup::MethodNotAllowed(allowed) => {
            let expected: MethodSet = [Method::POST, Method::PUT].iter().collect();
            assert_eq!(allowed, expected);
        }
        other => panic!("expected 405, got {other:?}"),
    }
}

#[test]
fn test_verb_on_template_wins_over_literal_without_it() {
    // /featured declares only POST, so GET backtracks into the template
    let t = table(
        r#"#%RAML 1.0
title: Featured
/products:
  /featured:
    post:
  /{productID}:
    get:
"#,
    );
    match t.lookup(&Method::GET, "/products/featured") {
        RouteLookup::Matched(m) => {
            assert_eq!(m.route.pattern, "/products/{productID}");
            assert_eq!(m.path_param("productID"), Some("featured"));
        }
        other => panic!("expected match, got {other:?}"),
    }
    match t.lookup(&Method::DELETE, "/products/featured") {
        RouteLookup::MethodNotAllowed(allowed) => assert_eq!(allowed.to_string(), "GET, POST"),
        other => panic!("expected 405, got {other:?}"),
    }
}

#[test]
fn test_not_found() {
    let t = table(PRODUCTS);
    assert!(matches!(
        t.lookup(&Method::GET, "/unknown"),
        RouteLookup::NotFound
    ));
    // intermediate node without methods
    let t = table("#%RAML 1.0\ntitle: T\n/a/b:\n  get:\n");
    assert!(matches!(t.lookup(&Method::GET, "/a"), RouteLookup::NotFound));
}

#[test]
fn test_path_normalization() {
    assert_eq!(normalize_path("//products///42/"), "/products/42");
    assert_eq!(normalize_path("/"), "/");
    assert_eq!(normalize_path(""), "/");

    let t = table(PRODUCTS);
    assert!(matches!(
        t.lookup(&Method::GET, "//products//featured/"),
        RouteLookup::Matched(_)
    ));
    assert!(matches!(
        t.lookup(&Method::GET, "/products?limit=5"),
        RouteLookup::Matched(_)
    ));
}

#[test]
fn test_percent_decoded_params() {
    let t = table(PRODUCTS);
    match t.lookup(&Method::GET, "/products/blue%20shirt") {
        RouteLookup::Matched(m) => assert_eq!(m.path_param("productID"), Some("blue shirt")),
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_base_path_prefix() {
    let t = table(
        "#%RAML 1.0\ntitle: T\nversion: v2\nbaseUri: http://localhost/api/{version}\n/ping:\n  get:\n",
    );
    assert_eq!(t.base_path(), "/api/v2");
    assert!(matches!(
        t.lookup(&Method::GET, "/api/v2/ping"),
        RouteLookup::Matched(_)
    ));
    assert!(matches!(t.lookup(&Method::GET, "/ping"), RouteLookup::NotFound));
}

#[test]
fn test_root_resource() {
    let t = table("#%RAML 1.0\ntitle: T\n/:\n  get:\n");
    match t.lookup(&Method::GET, "/") {
        RouteLookup::Matched(m) => assert_eq!(m.route.pattern, "/"),
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn test_derived_handler_names() {
    let t = table(PRODUCTS);
    let names: Vec<&str> = t.entries().iter().map(|e| e.handler_name.as_str()).collect();
    assert_eq!(names[0], "get_products");
    assert_eq!(names[4], "get_products_product_id_reviews");
}

#[test]
fn test_multi_segment_resource_merges_with_nested() {
    let err = compile_err(
        r#"#%RAML 1.0
title: Dup
/products:
  /featured:
    get:
/products/featured:
  get:
"#,
    );
    match err {
        CompileError::DuplicateRoute { method, pattern } => {
            assert_eq!(method, Method::GET);
            assert_eq!(pattern, "/products/featured");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_ambiguous_templates_rejected() {
    let err = compile_err(
        r#"#%RAML 1.0
title: Ambiguous
/users:
  /{id}:
    get:
  /{userId}:
    delete:
"#,
    );
    match err {
        CompileError::AmbiguousTemplate {
            location,
            existing,
            conflicting,
        } => {
            assert_eq!(location, "/users");
            assert_eq!(existing, "id");
            assert_eq!(conflicting, "userId");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_repeated_parameter_name_rejected() {
    let err = compile_err(
        r#"#%RAML 1.0
title: Repeat
/users/{id}:
  /posts/{id}:
    get:
"#,
    );
    match err {
        CompileError::DuplicateParameter { pattern, name } => {
            assert_eq!(pattern, "/users/{id}/posts/{id}");
            assert_eq!(name, "id");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_derived_handler_name_collision_rejected() {
    for second in ["/a_b", "/a-b"] {
        let raml = format!("#%RAML 1.0\ntitle: Slugs\n/a/b:\n  get:\n{second}:\n  get:\n");
        match compile_err(&raml) {
            CompileError::HandlerNameCollision {
                handler,
                pattern,
                existing,
            } => {
                assert_eq!(handler, "get_a_b");
                assert_eq!(pattern, second);
                assert_eq!(existing, "/a/b");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

#[test]
fn test_explicit_handler_may_serve_several_patterns() {
    let t = table(
        r#"#%RAML 1.0
title: Shared
/a/b:
  get:
    (handler): get_a_b
/a_b:
  get:
    displayName: Get A B
"#,
    );
    let names: Vec<&str> = t.entries().iter().map(|e| e.handler_name.as_str()).collect();
    assert_eq!(names, vec!["get_a_b", "get_a_b"]);

    // an explicit name may not take over one that was derived elsewhere
    let err = compile_err(
        "#%RAML 1.0\ntitle: T\n/a/b:\n  get:\n/c:\n  get:\n    (handler): get_a_b\n",
    );
    assert!(matches!(err, CompileError::HandlerNameCollision { .. }));
}

#[test]
fn test_partial_template_segment_rejected() {
    let err = compile_err("#%RAML 1.0\ntitle: T\n/files/report-{year}:\n  get:\n");
    assert!(matches!(err, CompileError::InvalidSegment { segment, .. } if segment == "report-{year}"));
}

#[test]
fn test_invalid_pattern_facet_rejected() {
    let err = compile_err(
        r#"#%RAML 1.0
title: T
/codes/{code}:
  uriParameters:
    code:
      pattern: "[a-z"
  get:
"#,
    );
    assert!(matches!(err, CompileError::InvalidPattern { parameter, .. } if parameter == "code"));
}

#[test]
fn test_inherited_uri_parameters() {
    let t = table(
        r#"#%RAML 1.0
title: T
/shops/{shopId}:
  uriParameters:
    shopId:
      type: integer
  /items/{itemId}:
    get:
"#,
    );
    let entry = &t.entries()[0];
    assert_eq!(entry.extraction_points, vec![(1, "shopId".to_string()), (3, "itemId".to_string())]);
    assert_eq!(entry.uri_params[0].param.param_type, crate::spec::ParamType::Integer);
    assert_eq!(entry.uri_params[1].param.param_type, crate::spec::ParamType::String);
    assert!(entry.uri_params[1].param.required);
}

#[test]
fn test_compile_is_idempotent() {
    let spec = load_str(PRODUCTS).unwrap();
    let a = RouteTable::compile(&spec).unwrap();
    let b = RouteTable::compile(&spec).unwrap();
    for (method, path) in [
        (Method::GET, "/products"),
        (Method::GET, "/products/featured"),
        (Method::PUT, "/products/7"),
        (Method::DELETE, "/products/7"),
        (Method::GET, "/nope"),
        (Method::GET, "/products/7/reviews"),
    ] {
        let describe = |l: RouteLookup| match l {
            RouteLookup::Matched(m) => format!("match {} {:?}", m.route.pattern, m.path_params),
            RouteLookup::MethodNotAllowed(s) => format!("405 {s}"),
            RouteLookup::NotFound => "404".to_string(),
        };
        assert_eq!(describe(a.lookup(&method, path)), describe(b.lookup(&method, path)));
    }
}
