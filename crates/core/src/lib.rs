//! `salesdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::{Entity, TenantScoped};
pub use error::{DomainError, DomainResult, require_non_blank};
pub use id::{EntityId, TenantId};
pub use value_object::{Percentage, Quantity, ValueObject};
