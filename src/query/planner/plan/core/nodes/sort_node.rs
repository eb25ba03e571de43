//! 排序和限制节点实现

use std::fmt;

use super::plan_node_enum::PlanNodeEnum;
use super::plan_node_traits::PlanNode;
use crate::core::types::expression::ExpressionNode;
use crate::define_single_input_node;
use crate::query::planner::plan::core::context::PlanContext;
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;

/// 排序项
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct OrderByExpression {
    expression: ExpressionNode,
    ascending: bool,
}

impl OrderByExpression {
    pub fn new(expression: ExpressionNode, ascending: bool) -> Self {
        Self { expression, ascending }
    }

    pub fn asc(expression: ExpressionNode) -> Self {
        Self::new(expression, true)
    }

    pub fn desc(expression: ExpressionNode) -> Self {
        Self::new(expression, false)
    }

    pub fn expression(&self) -> &ExpressionNode {
        &self.expression
    }

    pub fn expression_mut(&mut self) -> &mut ExpressionNode {
        &mut self.expression
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }
}

impl fmt::Display for OrderByExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.expression, if self.ascending { "ASC" } else { "DESC" })
    }
}

impl Duplicatable for OrderByExpression {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            expression: self.expression.duplicate(map),
            ascending: self.ascending,
        }
    }
}

define_single_input_node! {
    pub struct Sort {
        orderings: Vec<OrderByExpression>,
    }
}

impl Sort {
    /// 创建新的排序节点
    pub fn new(input: PlanNodeEnum, orderings: Vec<OrderByExpression>) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            orderings,
        }
    }

    pub fn orderings(&self) -> &[OrderByExpression] {
        &self.orderings
    }
}

impl PlanNode for Sort {
    fn details(&self, _ctx: &PlanContext) -> String {
        self.orderings.iter().map(|o| o.to_string()).collect::<Vec<_>>().join(", ")
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.orderings.iter().map(|o| o.expression()).collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.orderings.iter_mut().map(|o| o.expression_mut()).collect()
    }
}

impl Duplicatable for Sort {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            orderings: self.orderings.duplicate(map),
        }
    }
}

define_single_input_node! {
    pub struct Limit {
        limit: Option<u64>,
        offset: Option<u64>,
    }
}

impl Limit {
    pub fn new(input: PlanNodeEnum, limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            limit,
            offset,
        }
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

impl PlanNode for Limit {
    fn details(&self, _ctx: &PlanContext) -> String {
        let mut parts = Vec::new();
        if let Some(offset) = self.offset {
            parts.push(format!("OFFSET {}", offset));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {}", limit));
        }
        parts.join(" ")
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }
}

impl Duplicatable for Limit {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::expression::ColumnSource;
    use crate::query::planner::plan::core::nodes::NullSource;

    #[test]
    fn test_sort_and_limit_details() {
        let ctx = PlanContext::new();
        let sort = Sort::new(
            NullSource::new().into(),
            vec![
                OrderByExpression::asc(ExpressionNode::column(ColumnSource::Node(9), 0, "x", None)),
                OrderByExpression::desc(ExpressionNode::column(ColumnSource::Node(9), 1, "y", None)),
            ],
        );
        assert_eq!(sort.details(&ctx), "[9].x ASC, [9].y DESC");
        assert_eq!(sort.expressions().len(), 2);

        let limit = Limit::new(sort.into(), Some(10), Some(20));
        assert_eq!(limit.details(&ctx), "OFFSET 20 LIMIT 10");
        assert_eq!(limit.type_name(), "Limit");
    }
}
