//! # Handler Module
//!
//! One module per UI tab. Handlers deserialize typed requests, call one
//! repository operation, and serialize the result.

pub mod dashboard;
pub mod medicine;
pub mod patient;
pub mod service;
pub mod settings;
pub mod stock;
pub mod transaction;
pub mod visit;
