//! 表达式访问者接口
//!
//! - `ExpressionVisitor`: 只读遍历，可以剪枝
//! - `ExpressionRewriteVisitor`: 返回替换节点，原地改写
//!
//! 内部节点依次调用 `enter_expression`/`leave_expression`，叶子节点调用 `visit_expression`。
//! `enter_expression` 返回 false 时跳过子节点，但仍然调用 `leave_expression`。

use std::collections::BTreeSet;

use super::ExpressionNode;
use crate::query::planner::plan::core::context::TableSourceId;

/// 只读表达式访问者
pub trait ExpressionVisitor {
    fn enter_expression(&mut self, _expr: &ExpressionNode) -> bool {
        true
    }

    fn leave_expression(&mut self, _expr: &ExpressionNode) -> bool {
        true
    }

    fn visit_expression(&mut self, _expr: &ExpressionNode) -> bool {
        true
    }
}

/// 表达式改写访问者
pub trait ExpressionRewriteVisitor {
    /// 是否先改写子节点（后序）；返回 false 时先改写节点本身，再进入替换结果的子节点
    fn visit_children_first(&self, _expr: &ExpressionNode) -> bool {
        true
    }

    /// 返回替换节点，不需要替换时原样返回
    fn rewrite_expression(&mut self, expr: ExpressionNode) -> ExpressionNode;
}

/// 收集表达式引用的表来源
#[derive(Debug, Default)]
pub struct TableSourceCollector {
    tables: BTreeSet<TableSourceId>,
}

impl TableSourceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &BTreeSet<TableSourceId> {
        &self.tables
    }

    pub fn into_tables(self) -> BTreeSet<TableSourceId> {
        self.tables
    }
}

impl ExpressionVisitor for TableSourceCollector {
    fn visit_expression(&mut self, expr: &ExpressionNode) -> bool {
        if let Some(table) = expr.as_column().and_then(|c| c.table_source()) {
            self.tables.insert(table);
        }
        true
    }
}

impl ExpressionNode {
    /// 表达式引用的全部表来源
    pub fn referenced_tables(&self) -> BTreeSet<TableSourceId> {
        let mut collector = TableSourceCollector::new();
        self.accept(&mut collector);
        collector.into_tables()
    }
}
