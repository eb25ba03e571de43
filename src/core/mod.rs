pub mod error;
pub mod types;

// 错误和结果类型
pub use error::{PlanError, PlanResult};

// 核心数据类型
pub use types::{DataType, ResolvedOverload, TInstance, Value};

// 表达式系统类型
pub use types::expression::ExpressionNode;
