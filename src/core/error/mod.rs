//! 计划层统一错误处理
//!
//! ## 错误分类
//!
//! 1. **内部不变量违反**：优化器自身的缺陷（例如反转 SEMI 连接、在拆分之后读取聚合字段），
//!    不可恢复，直接中止本次编译
//! 2. **不支持的构造**：例如全文/空间谓词到达了求值阶段，需要原样报告给客户端
//! 3. **外部组件错误**：类型库等协作者返回的错误，原样透传
//!
//! `PlanResult<T>` 提供统一的返回类型，简化错误传播

use thiserror::Error;

pub mod codes;

pub use codes::{ErrorCategory, ErrorCode, PublicError, ToPublicError};

pub use crate::core::types::TypeError;

/// 计划层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// 优化器内部不变量被破坏
    #[error("内部错误: {0}")]
    Internal(String),

    /// 不支持的构造
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 计划树遍历错误
    #[error("计划节点访问错误: {0}")]
    Visit(String),

    /// 类型库返回的错误
    #[error(transparent)]
    Type(#[from] TypeError),

    /// 其他协作者（目录、执行层）返回的错误
    #[error("外部组件错误: {0}")]
    Collaborator(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl PlanError {
    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        PlanError::Internal(message.into())
    }

    /// 创建不支持错误
    pub fn unsupported(message: impl Into<String>) -> Self {
        PlanError::Unsupported(message.into())
    }

    /// 是否为优化器缺陷
    pub fn is_internal(&self) -> bool {
        matches!(self, PlanError::Internal(_))
    }
}

/// 计划层结果类型
pub type PlanResult<T> = Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DataType;

    #[test]
    fn test_error_display() {
        let err = PlanError::internal("无法反转 SEMI 连接");
        assert_eq!(err.to_string(), "内部错误: 无法反转 SEMI 连接");
        assert!(err.is_internal());

        let err = PlanError::unsupported("全文检索表达式");
        assert_eq!(err.to_string(), "不支持的操作: 全文检索表达式");
        assert!(!err.is_internal());
    }

    #[test]
    fn test_type_error_is_transparent() {
        let inner = TypeError::InvalidLiteral {
            literal: "abc".to_string(),
            target: DataType::Int,
        };
        let message = inner.to_string();
        let err: PlanError = inner.into();
        assert_eq!(err.to_string(), message);
    }
}
