pub mod algorithms;
pub mod core;
pub mod physical;
pub mod table;

pub use algorithms::*;
pub use core::nodes::*;
pub use core::PlanNodeEnum;
pub use physical::{BasePlannable, ParameterType, PhysicalOperator, PhysicalSelect, PhysicalUpdate, Plannable};
