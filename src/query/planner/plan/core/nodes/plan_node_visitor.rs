//! PlanNode 访问者模式实现
//!
//! 三个遍历入口：
//! - `accept`：只遍历计划节点
//! - `accept_with_expressions`：计划节点和表达式，表达式中的子查询也会进入
//! - `accept_rewrite`：用改写访问者原地替换所有表达式
//!
//! 返回值表示调用方能否继续遍历后面的兄弟节点。

use super::plan_node_enum::PlanNodeEnum;
use crate::core::types::expression::traverse::rewrite_in_place;
use crate::core::types::expression::{ExpressionRewriteVisitor, ExpressionVisitor};

/// 计划访问者
///
/// 叶子节点调用 `visit`，其余节点调用 `visit_enter`/`visit_leave`。
/// `visit_enter` 返回 false 时跳过子节点，但仍然调用 `visit_leave`。
pub trait PlanVisitor {
    fn visit_enter(&mut self, _node: &PlanNodeEnum) -> bool {
        true
    }

    fn visit_leave(&mut self, _node: &PlanNodeEnum) -> bool {
        true
    }

    fn visit(&mut self, _node: &PlanNodeEnum) -> bool {
        true
    }
}

impl PlanNodeEnum {
    /// 只读遍历计划节点
    pub fn accept<V: PlanVisitor + ?Sized>(&self, v: &mut V) -> bool {
        if self.is_leaf() {
            return v.visit(self);
        }
        if v.visit_enter(self) {
            for child in self.children() {
                if !child.accept(v) {
                    break;
                }
            }
        }
        v.visit_leave(self)
    }

    /// 遍历计划节点和表达式
    ///
    /// 每个节点先遍历输入，再遍历自己的表达式
    pub fn accept_with_expressions<V: PlanVisitor + ExpressionVisitor + ?Sized>(&self, v: &mut V) -> bool {
        if self.is_leaf() {
            return v.visit(self);
        }
        if v.visit_enter(self) {
            let mut go_on = true;
            for child in self.children() {
                if !child.accept_with_expressions(v) {
                    go_on = false;
                    break;
                }
            }
            if go_on {
                for expr in self.expressions() {
                    if !expr.accept_with_plan(v) {
                        break;
                    }
                }
            }
        }
        v.visit_leave(self)
    }

    /// 原地改写整棵计划中的表达式，包括子查询计划
    pub fn accept_rewrite<V: ExpressionRewriteVisitor + ?Sized>(&mut self, v: &mut V) {
        for child in self.children_mut() {
            child.accept_rewrite(v);
        }
        let id = self.id();
        let exprs = self.expressions_mut();
        if !exprs.is_empty() {
            log::trace!("改写 {} 的 {} 个表达式", id, exprs.len());
        }
        for expr in exprs {
            rewrite_in_place(expr, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::expression::{
        ColumnSource, Comparison, ConstantExpression, ExpressionNode, SubqueryExpression, SubqueryKind,
    };
    use crate::query::planner::plan::core::nodes::plan_node_traits::PlanNodeIdentity;
    use crate::query::planner::plan::core::nodes::{Limit, NullSource, Select, Subquery, Union};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        skip: Option<&'static str>,
        stop_at: Option<&'static str>,
    }

    impl PlanVisitor for Recorder {
        fn visit_enter(&mut self, node: &PlanNodeEnum) -> bool {
            self.events.push(format!("enter {}", node.name()));
            self.skip != Some(node.name())
        }

        fn visit_leave(&mut self, node: &PlanNodeEnum) -> bool {
            self.events.push(format!("leave {}", node.name()));
            true
        }

        fn visit(&mut self, node: &PlanNodeEnum) -> bool {
            self.events.push(format!("visit {}", node.name()));
            self.stop_at != Some(node.name())
        }
    }

    impl ExpressionVisitor for Recorder {
        fn enter_expression(&mut self, expr: &ExpressionNode) -> bool {
            self.events.push(format!("enter {}", expr));
            true
        }

        fn visit_expression(&mut self, expr: &ExpressionNode) -> bool {
            self.events.push(format!("expr {}", expr));
            true
        }
    }

    fn filter_over_null() -> PlanNodeEnum {
        let cond = ExpressionNode::comparison(
            Comparison::Eq,
            ExpressionNode::column(ColumnSource::Node(1), 0, "a", None),
            ConstantExpression::long(3).into(),
        );
        Select::new(NullSource::new().into_enum(), vec![cond]).into_enum()
    }

    #[test]
    fn test_accept_order() {
        let root = Limit::new(filter_over_null(), Some(1), None).into_enum();
        let mut v = Recorder::default();
        assert!(root.accept(&mut v));
        assert_eq!(
            v.events,
            vec!["enter Limit", "enter Select", "visit NullSource", "leave Select", "leave Limit"]
        );
    }

    #[test]
    fn test_enter_false_skips_children_but_leaves() {
        let root = Limit::new(filter_over_null(), Some(1), None).into_enum();
        let mut v = Recorder {
            skip: Some("Select"),
            ..Recorder::default()
        };
        root.accept(&mut v);
        assert_eq!(v.events, vec!["enter Limit", "enter Select", "leave Select", "leave Limit"]);
    }

    #[test]
    fn test_false_child_stops_siblings() {
        let root = Union::new(NullSource::new().into_enum(), NullSource::new().into_enum(), true).into_enum();
        let mut v = Recorder {
            stop_at: Some("NullSource"),
            ..Recorder::default()
        };
        root.accept(&mut v);
        assert_eq!(v.events, vec!["enter Union", "visit NullSource", "leave Union"]);
    }

    #[test]
    fn test_accept_with_expressions_enters_subquery() {
        let sub = Subquery::new(NullSource::new().into_enum(), 0).into_enum();
        let sub_id = sub.id();
        let exists = ExpressionNode::Subquery(SubqueryExpression::new(SubqueryKind::Exists, sub, None));
        let root = Select::new(NullSource::new().into_enum(), vec![exists]).into_enum();

        let mut v = Recorder::default();
        root.accept_with_expressions(&mut v);
        assert_eq!(
            v.events,
            vec![
                "enter Select".to_string(),
                "visit NullSource".to_string(),
                format!("enter EXISTS(Subquery@{})", sub_id),
                "enter Subquery".to_string(),
                "visit NullSource".to_string(),
                "leave Subquery".to_string(),
                "leave Select".to_string(),
            ]
        );
    }

    struct ConstantFolder;

    impl ExpressionRewriteVisitor for ConstantFolder {
        fn rewrite_expression(&mut self, expr: ExpressionNode) -> ExpressionNode {
            match &expr {
                ExpressionNode::Comparison(c) if c.left().is_constant() && c.right().is_constant() => {
                    ExpressionNode::from(ConstantExpression::long(1))
                }
                _ => expr,
            }
        }
    }

    #[test]
    fn test_accept_rewrite_replaces_in_place() {
        let cond = ExpressionNode::comparison(
            Comparison::Eq,
            ConstantExpression::long(1).into(),
            ConstantExpression::long(1).into(),
        );
        let inner = Select::new(NullSource::new().into_enum(), vec![cond]).into_enum();
        let mut root = Limit::new(inner, None, Some(5)).into_enum();

        root.accept_rewrite(&mut ConstantFolder);
        let select = root.children()[0];
        assert_eq!(select.expressions()[0].to_string(), "1");
    }
}
