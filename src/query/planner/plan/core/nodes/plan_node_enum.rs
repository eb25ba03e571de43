//! PlanNode 枚举定义
//!
//! 计划树是拥有所有权的树：每个节点只被一个父节点的槽位持有。
//! 父节点关系不存储在节点上，需要时用 `ParentIndex` 从根重建。

use std::collections::HashMap;

use super::plan_node_traits::{PlanNode, PlanNodeIdentity};
use crate::core::types::expression::ExpressionNode;
use crate::query::planner::plan::core::context::PlanContext;
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};

pub use super::aggregate_node::AggregateSource;
pub use super::filter_node::Select;
pub use super::join_node::{JoinNode, MapJoin};
pub use super::loader_nodes::{BloomFilterFilter, HashTableLookup, UsingBloomFilter, UsingHashTable};
pub use super::lookup_nodes::{AncestorLookup, BranchLookup, Flatten, GroupLoopScan, GroupScan};
pub use super::project_node::Project;
pub use super::set_operations_node::{Distinct, Union};
pub use super::sort_node::{Limit, Sort};
pub use super::source_nodes::{ExpressionsSource, NullSource, SubquerySource};
pub use super::statement_nodes::{Ast, DmlStatement, ResultSet, SelectQuery, Subquery};
pub use super::table_nodes::{TableGroupJoinTree, TableJoins, TableSourceNode};
pub use crate::query::planner::plan::algorithms::IndexScan;

macro_rules! plan_node_enum {
    ($($(#[$meta:meta])* $variant:ident),* $(,)?) => {
        /// PlanNode 枚举，包含所有可能的节点类型
        ///
        /// 不实现 `Clone`：分叉计划只能通过 `DuplicateMap` 显式复制
        #[derive(Debug)]
        pub enum PlanNodeEnum {
            $($(#[$meta])* $variant($variant),)*
        }

        impl PlanNodeEnum {
            /// 获取节点ID
            pub fn id(&self) -> i64 {
                match self {
                    $(PlanNodeEnum::$variant(node) => PlanNodeIdentity::id(node),)*
                }
            }

            /// 获取节点名称
            pub fn name(&self) -> &'static str {
                match self {
                    $(PlanNodeEnum::$variant(node) => PlanNodeIdentity::name(node),)*
                }
            }

            /// 节点摘要中括号内的细节
            pub fn details(&self, ctx: &PlanContext) -> String {
                match self {
                    $(PlanNodeEnum::$variant(node) => PlanNode::details(node, ctx),)*
                }
            }

            pub fn is_leaf(&self) -> bool {
                match self {
                    $(PlanNodeEnum::$variant(node) => PlanNode::is_leaf(node),)*
                }
            }

            /// 按槽位顺序返回子节点
            pub fn children(&self) -> Vec<&PlanNodeEnum> {
                match self {
                    $(PlanNodeEnum::$variant(node) => PlanNode::children(node),)*
                }
            }

            pub fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
                match self {
                    $(PlanNodeEnum::$variant(node) => PlanNode::children_mut(node),)*
                }
            }

            /// 按槽位顺序返回节点直接持有的表达式
            pub fn expressions(&self) -> Vec<&ExpressionNode> {
                match self {
                    $(PlanNodeEnum::$variant(node) => PlanNode::expressions(node),)*
                }
            }

            pub fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
                match self {
                    $(PlanNodeEnum::$variant(node) => PlanNode::expressions_mut(node),)*
                }
            }
        }

        impl Duplicatable for PlanNodeEnum {
            const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

            fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
                match self {
                    $(PlanNodeEnum::$variant(node) => PlanNodeEnum::$variant(node.duplicate(map)),)*
                }
            }
        }

        $(
            impl From<$variant> for PlanNodeEnum {
                fn from(node: $variant) -> Self {
                    PlanNodeEnum::$variant(node)
                }
            }
        )*
    };
}

plan_node_enum! {
    /// 语句根节点，持有绑定后的语句
    Ast,
    SelectQuery,
    DmlStatement,
    ResultSet,
    /// 子查询根
    Subquery,
    /// 过滤
    Select,
    Project,
    Sort,
    Limit,
    Distinct,
    Union,
    AggregateSource,
    /// 二元连接
    JoinNode,
    MapJoin,
    /// 连接规划前的连接集合
    TableJoins,
    TableGroupJoinTree,
    /// 表来源叶子
    TableSourceNode,
    Flatten,
    AncestorLookup,
    BranchLookup,
    GroupScan,
    GroupLoopScan,
    IndexScan,
    UsingHashTable,
    UsingBloomFilter,
    BloomFilterFilter,
    HashTableLookup,
    SubquerySource,
    ExpressionsSource,
    NullSource,
}

impl PlanNodeEnum {
    /// 单行摘要：`Name(details)`
    pub fn summary_string(&self, ctx: &PlanContext) -> String {
        format!("{}({})", self.name(), self.details(ctx))
    }

    /// 按ID查找节点，包括表达式中子查询的计划
    pub fn find(&self, id: i64) -> Option<&PlanNodeEnum> {
        if self.id() == id {
            return Some(self);
        }
        for child in self.children() {
            if let Some(found) = child.find(id) {
                return Some(found);
            }
        }
        self.subqueries().into_iter().find_map(|s| s.find(id))
    }

    pub fn find_mut(&mut self, id: i64) -> Option<&mut PlanNodeEnum> {
        if self.id() == id {
            return Some(self);
        }
        if let Some(i) = self.children().iter().position(|c| c.find(id).is_some()) {
            return self.children_mut().into_iter().nth(i)?.find_mut(id);
        }
        let i = self.subqueries().iter().position(|s| s.find(id).is_some())?;
        self.subqueries_mut().into_iter().nth(i)?.find_mut(id)
    }

    /// 本节点表达式中直接出现的子查询计划
    pub fn subqueries(&self) -> Vec<&PlanNodeEnum> {
        let mut result = Vec::new();
        for expr in self.expressions() {
            collect_subqueries(expr, &mut result);
        }
        result
    }

    fn subqueries_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        let mut result = Vec::new();
        for expr in self.expressions_mut() {
            collect_subqueries_mut(expr, &mut result);
        }
        result
    }

    /// 把ID为 `old` 的直接子节点替换为 `new`
    ///
    /// 成功时返回被替换的子节点；`old` 不是子节点时不做任何修改，原样返回 `new`
    pub fn replace_input(&mut self, old: i64, new: PlanNodeEnum) -> Result<PlanNodeEnum, PlanNodeEnum> {
        match self.children_mut().into_iter().find(|c| c.id() == old) {
            Some(slot) => Ok(std::mem::replace(slot, new)),
            None => Err(new),
        }
    }

    /// 节点的输出（父节点）ID
    pub fn output_of(&self, id: i64) -> Option<i64> {
        ParentIndex::build(self).output_of(id)
    }

    /// 以 `root` 为根的计划中节点总数，不含子查询
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }

    pub fn as_aggregate_source(&self) -> Option<&AggregateSource> {
        match self {
            PlanNodeEnum::AggregateSource(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_aggregate_source_mut(&mut self) -> Option<&mut AggregateSource> {
        match self {
            PlanNodeEnum::AggregateSource(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_join(&self) -> Option<&JoinNode> {
        match self {
            PlanNodeEnum::JoinNode(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_join_mut(&mut self) -> Option<&mut JoinNode> {
        match self {
            PlanNodeEnum::JoinNode(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_index_scan(&self) -> Option<&IndexScan> {
        match self {
            PlanNodeEnum::IndexScan(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_table_group_join_tree(&self) -> Option<&TableGroupJoinTree> {
        match self {
            PlanNodeEnum::TableGroupJoinTree(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_select(&self) -> Option<&Select> {
        match self {
            PlanNodeEnum::Select(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_select_mut(&mut self) -> Option<&mut Select> {
        match self {
            PlanNodeEnum::Select(node) => Some(node),
            _ => None,
        }
    }

    pub fn is_join(&self) -> bool {
        matches!(self, PlanNodeEnum::JoinNode(_))
    }

    pub fn is_aggregate_source(&self) -> bool {
        matches!(self, PlanNodeEnum::AggregateSource(_))
    }

    pub fn is_index_scan(&self) -> bool {
        matches!(self, PlanNodeEnum::IndexScan(_))
    }
}

fn collect_subqueries<'a>(expr: &'a ExpressionNode, out: &mut Vec<&'a PlanNodeEnum>) {
    if let ExpressionNode::Subquery(s) = expr {
        out.push(s.subquery());
        return;
    }
    for child in expr.children() {
        collect_subqueries(child, out);
    }
}

fn collect_subqueries_mut<'a>(expr: &'a mut ExpressionNode, out: &mut Vec<&'a mut PlanNodeEnum>) {
    if let ExpressionNode::Subquery(s) = expr {
        out.push(s.subquery_mut());
        return;
    }
    for child in expr.children_mut() {
        collect_subqueries_mut(child, out);
    }
}

/// 父节点索引
///
/// 每次结构修改后从根重建即可得到与树一致的输出关系。
/// 子查询计划的根没有输出：它由表达式持有，而不是由计划节点持有。
#[derive(Debug, Default)]
pub struct ParentIndex {
    outputs: HashMap<i64, Option<i64>>,
}

impl ParentIndex {
    pub fn build(root: &PlanNodeEnum) -> Self {
        let mut index = Self::default();
        index.record(root, None);
        index
    }

    fn record(&mut self, node: &PlanNodeEnum, output: Option<i64>) {
        self.outputs.insert(node.id(), output);
        for child in node.children() {
            self.record(child, Some(node.id()));
        }
        for subquery in node.subqueries() {
            self.record(subquery, None);
        }
    }

    /// 节点的输出；根节点和不在树中的节点都返回 `None`
    pub fn output_of(&self, id: i64) -> Option<i64> {
        self.outputs.get(&id).copied().flatten()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.outputs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
