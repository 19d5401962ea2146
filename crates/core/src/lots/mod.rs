//! Lot tracking - cost basis, FIFO allocation, splits.

mod lots_errors;
mod lots_model;
mod lots_service;
mod lots_traits;


pub use lots_errors::LotError;
pub use lots_model::{AllocationPlan, PlannedSlice, SecurityAllocation, SecurityLot};
pub use lots_service::LotService;
pub use lots_traits::{LotRepositoryTrait, LotServiceTrait};
