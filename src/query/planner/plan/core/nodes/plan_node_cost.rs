//! 计划节点代价估算
//!
//! 代价算术由外部代价模型负责，这里只提供规则比较候选方案时需要的组合操作

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 代价估算：输出行数和总代价
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    row_count: u64,
    cost: f64,
}

impl CostEstimate {
    pub fn new(row_count: u64, cost: f64) -> Self {
        Self { row_count, cost }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// 嵌套：外侧每一行执行一次内侧
    pub fn nest(&self, inner: &CostEstimate) -> CostEstimate {
        CostEstimate {
            row_count: self.row_count.saturating_mul(inner.row_count),
            cost: self.cost + self.row_count as f64 * inner.cost,
        }
    }

    /// 并集：两侧都执行，行数相加
    pub fn union(&self, other: &CostEstimate) -> CostEstimate {
        CostEstimate {
            row_count: self.row_count.saturating_add(other.row_count),
            cost: self.cost + other.cost,
        }
    }

    /// 顺序执行：先执行本方案，输出取后者
    pub fn sequence(&self, next: &CostEstimate) -> CostEstimate {
        CostEstimate {
            row_count: next.row_count,
            cost: self.cost + next.cost,
        }
    }

    /// 是否比另一个方案更便宜
    pub fn is_cheaper_than(&self, other: &CostEstimate) -> bool {
        self.cost < other.cost
    }
}

impl PartialOrd for CostEstimate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.cost.partial_cmp(&other.cost)? {
            Ordering::Equal => self.row_count.partial_cmp(&other.row_count),
            ordering => Some(ordering),
        }
    }
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rows = {}, cost = {:.2}", self.row_count, self.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations() {
        let outer = CostEstimate::new(10, 5.0);
        let inner = CostEstimate::new(3, 2.0);

        assert_eq!(outer.nest(&inner), CostEstimate::new(30, 25.0));
        assert_eq!(outer.union(&inner), CostEstimate::new(13, 7.0));
        assert_eq!(outer.sequence(&inner), CostEstimate::new(3, 7.0));
    }

    #[test]
    fn test_ordering_by_cost() {
        let cheap = CostEstimate::new(1000, 1.0);
        let expensive = CostEstimate::new(1, 2.0);
        assert!(cheap < expensive);
        assert!(cheap.is_cheaper_than(&expensive));
        assert_eq!(cheap.to_string(), "rows = 1000, cost = 1.00");
    }
}
