//! albook: spaced-repetition review tracking for solved exercises.
//!
//! Exercises climb a fixed review ladder ([`scheduler`]) and are browsed
//! through filtered, paginated views ([`query`]). [`service`] ties both to a
//! persistence [`store`]; [`db`] is the SQLite implementation and [`api`]
//! the HTTP surface.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod scheduler;
pub mod service;
pub mod store;

pub use error::{Error, Result};
