//! 常量值
//!
//! 表达式中字面量和参数在计划期实现后的值

use std::fmt;
use std::hash::{Hash, Hasher};

use super::{DataType, TypeError};

/// 计划期常量值
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// 按目标类型转换常量
    ///
    /// 转换失败时返回类型库错误，由调用方原样传播
    pub fn cast_to(&self, target: &DataType) -> Result<Value, TypeError> {
        let incompatible = || TypeError::IncompatibleCast {
            from: self.to_string(),
            target: target.clone(),
        };
        let invalid = |literal: &str| TypeError::InvalidLiteral {
            literal: literal.to_string(),
            target: target.clone(),
        };

        if self.is_null() {
            return Ok(Value::Null);
        }

        match target {
            DataType::Null => Ok(Value::Null),
            DataType::Boolean => match self {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::String(s) => match s.to_ascii_lowercase().as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(invalid(s)),
                },
                _ => Err(incompatible()),
            },
            DataType::Int | DataType::BigInt => match self {
                Value::Int(i) => Ok(Value::Int(*i)),
                Value::Double(d) => Ok(Value::Int(d.trunc() as i64)),
                Value::String(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| invalid(s)),
                _ => Err(incompatible()),
            },
            DataType::Double | DataType::Decimal { .. } => match self {
                Value::Int(i) => Ok(Value::Double(*i as f64)),
                Value::Double(d) => Ok(Value::Double(*d)),
                Value::String(s) => s.trim().parse::<f64>().map(Value::Double).map_err(|_| invalid(s)),
                _ => Err(incompatible()),
            },
            DataType::Varchar(_) => Ok(Value::String(self.to_string())),
            DataType::Date | DataType::Timestamp => match self {
                Value::String(s) => Ok(Value::String(s.clone())),
                _ => Err(incompatible()),
            },
        }
    }
}

// Double 按位比较，保证 Eq/Hash 一致
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Double(d) => d.to_bits().hash(state),
            Value::String(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "'{}'", s),
        }
    }
}
