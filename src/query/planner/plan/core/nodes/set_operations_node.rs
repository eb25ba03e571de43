//! 集合操作节点实现

use super::plan_node_enum::PlanNodeEnum;
use super::plan_node_traits::{BinaryInputNode, PlanNode};
use crate::define_plan_node;
use crate::define_single_input_node;
use crate::query::planner::plan::core::context::PlanContext;
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;

define_plan_node! {
    /// 并集，`all` 为 false 时去重
    pub struct Union {
        left: Box<PlanNodeEnum>,
        right: Box<PlanNodeEnum>,
        all: bool,
    }
}

impl Union {
    pub fn new(left: PlanNodeEnum, right: PlanNodeEnum, all: bool) -> Self {
        Self {
            id: next_node_id(),
            left: Box::new(left),
            right: Box::new(right),
            all,
        }
    }

    pub fn is_all(&self) -> bool {
        self.all
    }
}

impl PlanNode for Union {
    fn details(&self, _ctx: &PlanContext) -> String {
        if self.all {
            "ALL".to_string()
        } else {
            String::new()
        }
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.left, &self.right]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.left, &mut self.right]
    }
}

impl BinaryInputNode for Union {
    fn left(&self) -> &PlanNodeEnum {
        &self.left
    }

    fn right(&self) -> &PlanNodeEnum {
        &self.right
    }

    fn set_left(&mut self, input: PlanNodeEnum) -> PlanNodeEnum {
        std::mem::replace(&mut *self.left, input)
    }

    fn set_right(&mut self, input: PlanNodeEnum) -> PlanNodeEnum {
        std::mem::replace(&mut *self.right, input)
    }
}

impl Duplicatable for Union {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            left: self.left.duplicate(map),
            right: self.right.duplicate(map),
            all: self.all,
        }
    }
}

/// 去重的实现方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistinctImplementation {
    /// 输入已按全部列排序
    Presorted,
    /// 需要显式排序
    ExplicitSort,
}

define_single_input_node! {
    pub struct Distinct {
        implementation: Option<DistinctImplementation>,
    }
}

impl Distinct {
    pub fn new(input: PlanNodeEnum) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            implementation: None,
        }
    }

    pub fn implementation(&self) -> Option<DistinctImplementation> {
        self.implementation
    }

    pub fn set_implementation(&mut self, implementation: DistinctImplementation) {
        self.implementation = Some(implementation);
    }
}

impl PlanNode for Distinct {
    fn details(&self, _ctx: &PlanContext) -> String {
        match self.implementation {
            Some(DistinctImplementation::Presorted) => "PRESORTED".to_string(),
            Some(DistinctImplementation::ExplicitSort) => "EXPLICIT_SORT".to_string(),
            None => String::new(),
        }
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }
}

impl Duplicatable for Distinct {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            implementation: self.implementation,
        }
    }
}
