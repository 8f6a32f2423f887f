//! Lake level service for the lakes of the canton of Fribourg.
//!
//! Scrapes the Groupe E "niveau des lacs" page and keeps the latest reading
//! of each lake in a key-value store under `current/{lake name}`, for small
//! web sites and IoT displays to read.

pub mod config;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod server;
pub mod store;
pub mod sync;
pub mod verify;
