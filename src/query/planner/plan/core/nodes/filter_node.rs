//! 过滤节点实现
//!
//! Select 按合取条件列表过滤输入行

use super::plan_node_enum::PlanNodeEnum;
use super::plan_node_traits::PlanNode;
use super::statement_nodes::join_expressions;
use crate::core::types::expression::ExpressionNode;
use crate::define_single_input_node;
use crate::query::planner::plan::core::context::{ConditionId, PlanContext};
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;

define_single_input_node! {
    pub struct Select {
        conditions: Vec<ExpressionNode>,
    }
}

impl Select {
    /// 创建新的过滤节点
    pub fn new(input: PlanNodeEnum, conditions: Vec<ExpressionNode>) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            conditions,
        }
    }

    /// 获取过滤条件
    pub fn conditions(&self) -> &[ExpressionNode] {
        &self.conditions
    }

    pub fn conditions_mut(&mut self) -> &mut Vec<ExpressionNode> {
        &mut self.conditions
    }

    pub fn add_condition(&mut self, condition: ExpressionNode) {
        self.conditions.push(condition);
    }

    /// 移除已被下层消耗的比较条件，返回移除的个数
    pub fn remove_conditions(&mut self, consumed: &[ConditionId]) -> usize {
        let before = self.conditions.len();
        self.conditions
            .retain(|c| !matches!(c.condition_id(), Some(id) if consumed.contains(&id)));
        before - self.conditions.len()
    }
}

impl PlanNode for Select {
    fn details(&self, _ctx: &PlanContext) -> String {
        join_expressions(&self.conditions)
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.conditions.iter().collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.conditions.iter_mut().collect()
    }
}

impl Duplicatable for Select {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            conditions: self.conditions.duplicate(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::expression::{ColumnSource, Comparison, ConstantExpression};
    use crate::query::planner::plan::core::nodes::plan_node_traits::PlanNodeIdentity;
    use crate::query::planner::plan::core::nodes::NullSource;

    #[test]
    fn test_select_summary_and_removal() {
        let ctx = PlanContext::new();
        let kept = ExpressionNode::comparison(
            Comparison::Lt,
            ExpressionNode::column(ColumnSource::Node(3), 1, "b", None),
            ConstantExpression::long(5).into(),
        );
        let consumed = ExpressionNode::comparison(
            Comparison::Eq,
            ExpressionNode::column(ColumnSource::Node(3), 0, "a", None),
            ConstantExpression::long(1).into(),
        );
        let consumed_id = consumed.condition_id().into_iter().collect::<Vec<_>>();
        let mut select = Select::new(NullSource::new().into_enum(), vec![kept, consumed]);

        assert_eq!(select.details(&ctx), "[3].b < 5, [3].a == 1");
        assert_eq!(select.remove_conditions(&consumed_id), 1);
        assert_eq!(select.details(&ctx), "[3].b < 5");
        assert_eq!(select.into_enum().summary_string(&ctx), "Select([3].b < 5)");
    }
}
