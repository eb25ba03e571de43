//! 表达式树遍历
//!
//! 提供表达式树的子节点访问、只读遍历和原地改写。

use std::iter;

use super::visitor::{ExpressionRewriteVisitor, ExpressionVisitor};
use super::ExpressionNode;
use crate::query::planner::plan::core::nodes::plan_node_visitor::PlanVisitor;

impl ExpressionNode {
    /// 获取表达式的所有直接子表达式
    ///
    /// 子查询的计划不算子表达式
    pub fn children(&self) -> Vec<&ExpressionNode> {
        match self {
            ExpressionNode::Constant(_)
            | ExpressionNode::Parameter(_)
            | ExpressionNode::Column(_)
            | ExpressionNode::Subquery(_) => vec![],
            ExpressionNode::Cast(c) => vec![c.operand.as_ref()],
            ExpressionNode::Function(f) => f.operands.iter().collect(),
            ExpressionNode::Aggregate(a) => a.operand.iter().map(|o| o.as_ref()).collect(),
            ExpressionNode::Comparison(c) => vec![c.left.as_ref(), c.right.as_ref()],
            ExpressionNode::Logical(l) => l.operands.iter().collect(),
            ExpressionNode::InList(i) => iter::once(i.operand.as_ref()).chain(i.list.iter()).collect(),
            ExpressionNode::SpecialIndex(s) => s.operands.iter().collect(),
        }
    }

    /// 获取所有直接子表达式的可变引用
    pub fn children_mut(&mut self) -> Vec<&mut ExpressionNode> {
        match self {
            ExpressionNode::Constant(_)
            | ExpressionNode::Parameter(_)
            | ExpressionNode::Column(_)
            | ExpressionNode::Subquery(_) => vec![],
            ExpressionNode::Cast(c) => vec![c.operand.as_mut()],
            ExpressionNode::Function(f) => f.operands.iter_mut().collect(),
            ExpressionNode::Aggregate(a) => a.operand.iter_mut().map(|o| o.as_mut()).collect(),
            ExpressionNode::Comparison(c) => vec![c.left.as_mut(), c.right.as_mut()],
            ExpressionNode::Logical(l) => l.operands.iter_mut().collect(),
            ExpressionNode::InList(i) => iter::once(i.operand.as_mut()).chain(i.list.iter_mut()).collect(),
            ExpressionNode::SpecialIndex(s) => s.operands.iter_mut().collect(),
        }
    }

    /// 叶子表达式调用 `visit_expression`，其余调用 enter/leave
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            ExpressionNode::Constant(_) | ExpressionNode::Parameter(_) | ExpressionNode::Column(_)
        )
    }

    /// 只读遍历，不进入子查询的计划
    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, v: &mut V) -> bool {
        if self.is_leaf() {
            return v.visit_expression(self);
        }
        if v.enter_expression(self) {
            for child in self.children() {
                if !child.accept(v) {
                    break;
                }
            }
        }
        v.leave_expression(self)
    }

    /// 只读遍历，同时用计划访问者进入子查询的计划
    pub fn accept_with_plan<V: PlanVisitor + ExpressionVisitor + ?Sized>(&self, v: &mut V) -> bool {
        if self.is_leaf() {
            return v.visit_expression(self);
        }
        if v.enter_expression(self) {
            if let ExpressionNode::Subquery(s) = self {
                s.subquery.accept_with_expressions(v);
            } else {
                for child in self.children() {
                    if !child.accept_with_plan(v) {
                        break;
                    }
                }
            }
        }
        v.leave_expression(self)
    }

    /// 改写表达式，返回替换后的节点
    pub fn accept_rewrite<V: ExpressionRewriteVisitor + ?Sized>(self, v: &mut V) -> ExpressionNode {
        if v.visit_children_first(&self) {
            let mut expr = self;
            expr.rewrite_children(v);
            v.rewrite_expression(expr)
        } else {
            let mut expr = v.rewrite_expression(self);
            expr.rewrite_children(v);
            expr
        }
    }

    fn rewrite_children<V: ExpressionRewriteVisitor + ?Sized>(&mut self, v: &mut V) {
        if let ExpressionNode::Subquery(s) = self {
            s.subquery.accept_rewrite(v);
            return;
        }
        for child in self.children_mut() {
            rewrite_in_place(child, v);
        }
    }
}

/// 原地改写一个表达式槽位
pub fn rewrite_in_place<V: ExpressionRewriteVisitor + ?Sized>(slot: &mut ExpressionNode, v: &mut V) {
    let expr = std::mem::replace(slot, ExpressionNode::placeholder());
    *slot = expr.accept_rewrite(v);
}
