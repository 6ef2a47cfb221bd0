//! # duelcast-store
//!
//! SQLite persistence for rounds. [`RoundRepo`] is the production
//! implementation of [`duelcast_core::Repository`].

#![deny(unsafe_code)]

pub mod database;
pub mod error;
pub mod rounds;
pub mod schema;

pub use database::Database;
pub use error::StoreError;
pub use rounds::RoundRepo;
