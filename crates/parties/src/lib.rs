//! Client master (read-only collaborator).
//!
//! Clients and payment conditions are maintained by the surrounding
//! registry screens; the commercial core only looks them up.

pub mod client;

pub use client::{ClientId, ClientRecord, PaymentConditionId};
