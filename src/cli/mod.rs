//! # CLI Module
//!
//! The `ramlrouter` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Load the specification, register an echo handler for every route and listen:
//!
//! ```bash
//! ramlrouter serve --raml conf/default.raml --port 8888
//! ramlrouter serve --config conf/router.yaml
//! ```
//!
//! Flags override `RAMLR_*` variables, which override the config file.
//!
//! ### `routes`
//!
//! Resolves `--config`, `RAMLR_RAML_FILE` and `--raml` the same way `serve` does:
//!
//! ```bash
//! ramlrouter routes --raml conf/default.raml
//! ```
//!
//! ### `check`
//!
//! Exits non-zero on any load, parse or compile error:
//!
//! ```bash
//! ramlrouter check --raml conf/default.raml
//! ramlrouter check --config conf/router.yaml
//! ```

mod commands;


pub use commands::{resolve_config, run_cli, Cli, Commands};
