mod auth;
mod case_insensitive_string_ext;
pub mod catalog;
mod error;
pub mod policy;
mod routes;
mod state;
mod store;
mod types;

pub mod config;

pub use auth::*;
pub use error::*;
pub use routes::*;
pub use state::*;
pub use store::*;
pub use types::*;

/// The catalog served when no catalog file is configured.
pub const SEED_CATALOG: &str = include_str!("../data/books.json");
