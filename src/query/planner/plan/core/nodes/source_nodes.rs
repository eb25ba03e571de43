//! 不读取表的行来源

use super::plan_node_enum::PlanNodeEnum;
use super::plan_node_traits::PlanNode;
use super::statement_nodes::join_expressions;
use crate::core::types::expression::ExpressionNode;
use crate::define_plan_node;
use crate::define_single_input_node;
use crate::query::planner::plan::core::context::PlanContext;
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;

define_single_input_node! {
    /// FROM 子句中的派生表，输入是一个 `Subquery`
    pub struct SubquerySource {
        name: String,
    }
}

impl SubquerySource {
    pub fn new(subquery: PlanNodeEnum, name: impl Into<String>) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(subquery),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subquery(&self) -> &PlanNodeEnum {
        &self.input
    }
}

impl PlanNode for SubquerySource {
    fn details(&self, _ctx: &PlanContext) -> String {
        self.name.clone()
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }
}

impl Duplicatable for SubquerySource {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            name: self.name.clone(),
        }
    }
}

define_plan_node! {
    /// VALUES 行列表
    pub struct ExpressionsSource {
        rows: Vec<Vec<ExpressionNode>>,
    }
}

impl ExpressionsSource {
    pub fn new(rows: Vec<Vec<ExpressionNode>>) -> Self {
        Self {
            id: next_node_id(),
            rows,
        }
    }

    pub fn rows(&self) -> &[Vec<ExpressionNode>] {
        &self.rows
    }

    pub fn n_fields(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }
}

impl PlanNode for ExpressionsSource {
    fn details(&self, _ctx: &PlanContext) -> String {
        self.rows
            .iter()
            .map(|row| format!("[{}]", join_expressions(row)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.rows.iter().flatten().collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.rows.iter_mut().flatten().collect()
    }
}

impl Duplicatable for ExpressionsSource {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            rows: self.rows.duplicate(map),
        }
    }
}

define_plan_node! {
    /// 不产生任何行
    pub struct NullSource {}
}

impl NullSource {
    pub fn new() -> Self {
        Self { id: next_node_id() }
    }
}

impl Default for NullSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanNode for NullSource {
    fn details(&self, _ctx: &PlanContext) -> String {
        String::new()
    }

    fn is_leaf(&self) -> bool {
        true
    }
}

impl Duplicatable for NullSource {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
        }
    }
}
