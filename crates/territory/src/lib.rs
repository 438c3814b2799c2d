//! Commercial territory domain module.
//!
//! Sales areas and the roster of representatives assigned to them. Roster
//! rules are enforced here, purely in memory; the store only persists a
//! roster that already passed [`CommercialArea::validate_before_save`].

pub mod area;
pub mod function;
pub mod salesperson;

pub use area::{
    AssignmentId, CommercialArea, CommercialAreaId, CommercialAreaInput, CommissionProfileId,
    RepresentativeAssignment, RepresentativeInput,
};
pub use function::CommercialFunction;
pub use salesperson::{SalespersonId, SalespersonRecord};
