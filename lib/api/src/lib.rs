//! # amusic API
//!
//! actix-web REST surface over a loaded [`Catalog`](amusic_storage::Catalog):
//! recommendation queries per entity kind and per-session favorites and
//! playlist lists.

pub mod rest;
pub mod sessions;

pub use rest::{configure, AppState, RestApi};
pub use sessions::SessionStore;
