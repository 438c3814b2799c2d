//! Product master (read-only collaborator).
//!
//! Products are registered elsewhere in the application; the commercial core
//! only reads them to obtain display names and default sale prices.

pub mod product;

pub use product::{ProductId, ProductRecord};
