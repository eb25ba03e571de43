//! 计划器模块
//! 包含计划节点、表组模型、访问路径抽象与物理计划边界

pub mod plan;

pub use plan::core::context::PlanContext;
pub use plan::core::nodes::*;
pub use plan::PlanNodeEnum;
