//! Service counter domain model
//!
//! - **ShiftCalendar**: days split into Morning and Afternoon shifts, and the
//!   inverse-transform variates for arrivals and service
//! - **BalkingPolicy**: estimated-wait brackets deciding who leaves
//! - **ServerPool**: per-server lines with join-shortest-queue assignment

pub mod balking;
pub mod calendar;
pub mod server_pool;

pub use balking::*;
pub use calendar::*;
pub use server_pool::*;
