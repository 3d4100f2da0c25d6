//! # Repository Module
//!
//! Repository implementations for database operations.
//!
//! ## Repository Pattern
//! Each repository:
//! - Owns a clone of the connection pool (cheap, it's an Arc internally)
//! - Exposes domain types from agrivet-core, never raw rows
//! - Handles its own error mapping to DbError
//! - Wraps multi-row writes in a single unit-of-work transaction

pub mod inventory;
pub mod order;
pub mod product;
pub mod session;
pub mod transaction;
