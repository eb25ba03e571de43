//! 投影节点实现
//!
//! 引用投影结果的列以 `ColumnSource::Node(project.id())` 为来源

use super::plan_node_enum::PlanNodeEnum;
use super::plan_node_traits::PlanNode;
use super::statement_nodes::join_expressions;
use crate::core::types::expression::ExpressionNode;
use crate::define_single_input_node;
use crate::query::planner::plan::core::context::PlanContext;
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;

define_single_input_node! {
    pub struct Project {
        fields: Vec<ExpressionNode>,
    }
}

impl Project {
    pub fn new(input: PlanNodeEnum, fields: Vec<ExpressionNode>) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            fields,
        }
    }

    pub fn fields(&self) -> &[ExpressionNode] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Vec<ExpressionNode> {
        &mut self.fields
    }

    pub fn n_fields(&self) -> usize {
        self.fields.len()
    }
}

impl PlanNode for Project {
    fn details(&self, _ctx: &PlanContext) -> String {
        join_expressions(&self.fields)
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.fields.iter().collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.fields.iter_mut().collect()
    }
}

impl Duplicatable for Project {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            fields: self.fields.duplicate(map),
        }
    }
}
