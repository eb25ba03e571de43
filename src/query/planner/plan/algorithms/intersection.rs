//! 索引交集的条件计数
//!
//! 规则先让每个候选扫描把自己消耗的条件记到计数器上，再用叠加后的计数判断
//! 某个条件是只被一个扫描消耗、被多个扫描重复消耗，还是没有被消耗。

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use super::index_scan::{IndexScan, IndexScanKind};
use crate::catalog::CatalogTable;
use crate::core::types::expression::ExpressionNode;
use crate::query::planner::plan::core::context::{ConditionId, PlanContext, TableSourceId};

/// 条件被消耗的次数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HowMany {
    None,
    One,
    Many,
}

impl HowMany {
    fn from_count(count: usize) -> Self {
        match count {
            0 => HowMany::None,
            1 => HowMany::One,
            _ => HowMany::Many,
        }
    }

    /// 叠加两份独立计数
    pub fn overlay(self, other: HowMany) -> HowMany {
        match (self, other) {
            (HowMany::None, x) | (x, HowMany::None) => x,
            (HowMany::One, HowMany::One) => HowMany::Many,
            _ => HowMany::Many,
        }
    }
}

/// 计数器：扫描把自己消耗的条件记在这里
pub trait ConditionsCounter<C> {
    fn increment(&mut self, condition: &C);
}

/// 计数结果
pub trait ConditionsCount<C> {
    fn how_many(&self, condition: &C) -> HowMany;
}

/// 基于哈希表的计数器
#[derive(Debug, Clone)]
pub struct ConditionsCounts<C: Eq + Hash> {
    counts: HashMap<C, usize>,
}

impl<C: Eq + Hash> ConditionsCounts<C> {
    pub fn new() -> Self {
        Self { counts: HashMap::new() }
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// 被计数过的条件个数
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<C: Eq + Hash> Default for ConditionsCounts<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Eq + Hash + Clone> ConditionsCounter<C> for ConditionsCounts<C> {
    fn increment(&mut self, condition: &C) {
        *self.counts.entry(condition.clone()).or_insert(0) += 1;
    }
}

impl<C: Eq + Hash> ConditionsCount<C> for ConditionsCounts<C> {
    fn how_many(&self, condition: &C) -> HowMany {
        HowMany::from_count(self.counts.get(condition).copied().unwrap_or(0))
    }
}

/// 两份计数的叠加视图，按 `HowMany::overlay` 合并
pub struct OverlayedConditionsCount<'a, C> {
    first: &'a dyn ConditionsCount<C>,
    second: &'a dyn ConditionsCount<C>,
}

impl<'a, C> OverlayedConditionsCount<'a, C> {
    pub fn new(first: &'a dyn ConditionsCount<C>, second: &'a dyn ConditionsCount<C>) -> Self {
        Self { first, second }
    }
}

impl<C> ConditionsCount<C> for OverlayedConditionsCount<'_, C> {
    fn how_many(&self, condition: &C) -> HowMany {
        self.first.how_many(condition).overlay(self.second.how_many(condition))
    }
}

/// 可以参与索引交集的访问路径
///
/// `C` 是条件类型，`N` 是参与求交的另一方
pub trait IndexIntersectionNode<C, N> {
    /// 最深的目录表
    fn leaf_most_ais_table<'c>(&self, ctx: &'c PlanContext) -> &'c Arc<CatalogTable>;

    /// 全部索引列
    fn all_columns(&self) -> Vec<&ExpressionNode>;

    /// 把自己消耗的条件记到计数器上
    fn increment_conditions_counter(&self, counter: &mut dyn ConditionsCounter<C>);

    /// 至少独占消耗一个条件时才值得参与求交
    fn is_useful(&self, count: &dyn ConditionsCount<C>) -> bool;

    /// 两者在聚簇层次中最近的公共祖先表
    fn find_common_ancestor(&self, ctx: &PlanContext, other: &N) -> Option<TableSourceId>;

    /// 被等值条件固定的前缀列数
    fn pegged_count(&self) -> usize;
}

impl IndexIntersectionNode<ConditionId, IndexScan> for IndexScan {
    fn leaf_most_ais_table<'c>(&self, ctx: &'c PlanContext) -> &'c Arc<CatalogTable> {
        self.leaf_most_catalog_table(ctx)
    }

    fn all_columns(&self) -> Vec<&ExpressionNode> {
        self.ordering().iter().map(|o| o.expression()).collect()
    }

    fn increment_conditions_counter(&self, counter: &mut dyn ConditionsCounter<ConditionId>) {
        match self.kind() {
            IndexScanKind::Single(_) => {
                for condition in self.conditions() {
                    counter.increment(condition);
                }
            }
            IndexScanKind::Intersect(multi) => {
                multi.output_scan().increment_conditions_counter(counter);
                multi.selector_scan().increment_conditions_counter(counter);
            }
        }
    }

    fn is_useful(&self, count: &dyn ConditionsCount<ConditionId>) -> bool {
        match self.kind() {
            IndexScanKind::Single(_) => self
                .conditions()
                .iter()
                .any(|c| count.how_many(c) == HowMany::One),
            // 交集的每一支都必须有独占的条件，否则那一支是多余的
            IndexScanKind::Intersect(multi) => {
                multi.output_scan().is_useful(count) && multi.selector_scan().is_useful(count)
            }
        }
    }

    fn find_common_ancestor(&self, ctx: &PlanContext, other: &IndexScan) -> Option<TableSourceId> {
        let mine = ctx.catalog_table_of(self.leaf_most_table());
        let theirs = ctx.catalog_table_of(other.leaf_most_table());
        let common = mine.common_ancestor(theirs)?;
        self.tables()
            .iter()
            .chain(other.tables())
            .copied()
            .find(|&t| ctx.catalog_table_of(t).table_id() == common.table_id())
    }

    fn pegged_count(&self) -> usize {
        self.n_equality()
    }
}
