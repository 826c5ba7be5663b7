//! Backend transport and wire types

pub mod api;
pub mod error;
pub mod types;
