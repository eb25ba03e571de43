// 核心类型系统模块
//
// 计划层只存储和转发类型实例与函数重载句柄，不解释它们的语义

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod expression;
pub mod value;

pub use value::Value;

/// SQL 数据类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Null,
    Boolean,
    Int,
    BigInt,
    Double,
    Decimal { precision: u8, scale: u8 },
    Varchar(u32),
    Date,
    Timestamp,
}

impl DataType {
    /// 是否为数值类型
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int | DataType::BigInt | DataType::Double | DataType::Decimal { .. }
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Null => write!(f, "NULL"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Int => write!(f, "INT"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::Double => write!(f, "DOUBLE"),
            DataType::Decimal { precision, scale } => write!(f, "DECIMAL({}, {})", precision, scale),
            DataType::Varchar(len) => write!(f, "VARCHAR({})", len),
            DataType::Date => write!(f, "DATE"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

/// 类型实例
///
/// 由类型库实现，计划层只把它当作不透明句柄保存
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TInstance {
    data_type: DataType,
    nullable: bool,
}

impl TInstance {
    pub fn new(data_type: DataType, nullable: bool) -> Self {
        Self { data_type, nullable }
    }

    pub fn nullable(data_type: DataType) -> Self {
        Self::new(data_type, true)
    }

    pub fn not_null(data_type: DataType) -> Self {
        Self::new(data_type, false)
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl fmt::Display for TInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{} NULL", self.data_type)
        } else {
            write!(f, "{} NOT NULL", self.data_type)
        }
    }
}

/// 已解析的函数重载句柄
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedOverload {
    name: String,
    result_type: TInstance,
}

impl ResolvedOverload {
    pub fn new(name: impl Into<String>, result_type: TInstance) -> Self {
        Self {
            name: name.into(),
            result_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn result_type(&self) -> &TInstance {
        &self.result_type
    }
}

/// 类型库错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("无效的字面量 '{literal}'，无法转换为 {target}")]
    InvalidLiteral { literal: String, target: DataType },

    #[error("不兼容的类型转换: {from} -> {target}")]
    IncompatibleCast { from: String, target: DataType },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_display() {
        assert_eq!(DataType::Varchar(32).to_string(), "VARCHAR(32)");
        assert_eq!(
            DataType::Decimal { precision: 10, scale: 2 }.to_string(),
            "DECIMAL(10, 2)"
        );
        assert!(DataType::BigInt.is_numeric());
        assert!(!DataType::Date.is_numeric());
    }

    #[test]
    fn test_tinstance() {
        let ty = TInstance::not_null(DataType::Int);
        assert!(!ty.is_nullable());
        assert_eq!(ty.data_type(), &DataType::Int);
        assert_eq!(ty.to_string(), "INT NOT NULL");
    }
}
