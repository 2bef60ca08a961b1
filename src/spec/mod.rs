//! # Spec Module
//!
//! Loads a RAML 0.8 or 1.0 document and turns it into an immutable [`Specification`]
//! tree of resources, methods and parameters.
//!
//! The YAML layer is handled by `serde_yaml`; this module interprets the RAML structure on
//! top of it: the `#%RAML` header, root directives, nested resources, method facets,
//! parameter declarations and `!include` references.
//!
//! ## Handler binding
//!
//! Each method resolves its handler name in this order:
//!
//! 1. the `(handler)` annotation, used verbatim
//! 2. `displayName`, converted to snake case (`Get Product` → `get_product`)
//! 3. a name derived from the verb and full pattern (`get_products_product_id`), assigned
//!    when the route table is compiled
//!
//! ## Example
//!
//! ```raml
//! #%RAML 1.0
//! title: Products API
//! baseUri: http://api.example.com/{version}
//! version: v1
//! /products:
//!   get:
//!   /{productID}:
//!     uriParameters:
//!       productID: integer
//!     get:
//!       (handler): get_product
//! ```

mod load;
mod parse;
mod types;

pub use load::{load, load_file, load_str};
pub use parse::parse_raml;
pub use types::*;

/// Lower snake case identifier from arbitrary text: `Get Product` → `get_product`,
/// `productID` → `product_id`.
pub(crate) fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut prev_lower = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c.to_ascii_lowercase());
        } else {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_names() {
        assert_eq!(slugify("Get Product"), "get_product");
        assert_eq!(slugify("productID"), "product_id");
        assert_eq!(slugify("/products/{productID}"), "products_product_id");
        assert_eq!(slugify("  list--all  "), "list_all");
    }
}
