//! 对外错误码定义
//!
//! 错误码格式: XXYY
//! - XX: 错误类别 (00=成功, 02=执行, 03=验证, 09=系统)
//! - YY: 具体错误

use serde::{Deserialize, Serialize};

use super::PlanError;
use crate::core::types::TypeError;

/// 对外错误码 - 用于语句编译器向客户端报告
///
/// 错误码一旦定义不应随意修改，内部错误不暴露实现细节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Success = 0,

    /// 通用执行错误
    ExecutionError = 200,
    /// 功能不支持
    Unsupported = 205,

    /// 类型错误
    TypeError = 301,
    /// 无效输入
    InvalidInput = 302,

    /// 内部错误
    InternalError = 900,
    /// 未知错误
    Unknown = 999,
}

impl ErrorCode {
    /// 获取错误码的 i32 值
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// 根据 i32 值获取错误码
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(ErrorCode::Success),
            200 => Some(ErrorCode::ExecutionError),
            205 => Some(ErrorCode::Unsupported),
            301 => Some(ErrorCode::TypeError),
            302 => Some(ErrorCode::InvalidInput),
            900 => Some(ErrorCode::InternalError),
            999 => Some(ErrorCode::Unknown),
            _ => None,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self.as_i32() {
            0 => ErrorCategory::Success,
            200..=299 => ErrorCategory::Execution,
            300..=399 => ErrorCategory::Validation,
            900..=999 => ErrorCategory::System,
            _ => ErrorCategory::Unknown,
        }
    }

    /// 获取默认的错误消息
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "成功",
            ErrorCode::ExecutionError => "执行错误",
            ErrorCode::Unsupported => "功能不支持",
            ErrorCode::TypeError => "类型错误",
            ErrorCode::InvalidInput => "无效输入",
            ErrorCode::InternalError => "内部错误",
            ErrorCode::Unknown => "未知错误",
        }
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Success
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_i32(), self.default_message())
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Success,
    Execution,
    Validation,
    System,
    Unknown,
}

/// 对外错误信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicError {
    pub code: ErrorCode,
    pub message: String,
}

impl PublicError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn with_default_message(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
        }
    }
}

/// 转换为对外错误
pub trait ToPublicError {
    fn to_public_error(&self) -> PublicError;
}

impl ToPublicError for PlanError {
    fn to_public_error(&self) -> PublicError {
        match self {
            // 内部错误只给出默认消息，细节留在日志里
            PlanError::Internal(_) | PlanError::Visit(_) => {
                PublicError::with_default_message(ErrorCode::InternalError)
            }
            PlanError::Unsupported(msg) => PublicError::new(ErrorCode::Unsupported, msg.clone()),
            PlanError::Type(err) => err.to_public_error(),
            PlanError::Collaborator(msg) => PublicError::new(ErrorCode::ExecutionError, msg.clone()),
            PlanError::Config(msg) => PublicError::new(ErrorCode::InvalidInput, msg.clone()),
        }
    }
}

impl ToPublicError for TypeError {
    fn to_public_error(&self) -> PublicError {
        match self {
            TypeError::InvalidLiteral { .. } => PublicError::new(ErrorCode::InvalidInput, self.to_string()),
            TypeError::IncompatibleCast { .. } => PublicError::new(ErrorCode::TypeError, self.to_string()),
        }
    }
}
