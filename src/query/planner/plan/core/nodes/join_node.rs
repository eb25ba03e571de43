//! 连接节点实现
//!
//! JoinNode 是二元连接树的节点；MapJoin 是确定了嵌套循环实现后的形式，
//! 外侧每一行绑定后执行一次内侧。

use std::fmt;

use super::plan_node_enum::PlanNodeEnum;
use super::plan_node_traits::{BinaryInputNode, PlanNode};
use super::statement_nodes::join_expressions;
use crate::core::error::{PlanError, PlanResult};
use crate::core::types::expression::ExpressionNode;
use crate::define_plan_node;
use crate::query::planner::plan::core::context::{PlanContext, TableFKJoinId, TableGroupJoinId};
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;

/// 连接类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    FullOuter,
    Semi,
    Anti,
    /// 内侧已经去重的半连接
    SemiInnerAlreadyDistinct,
    /// 内侧去重后可以改为内连接的半连接
    SemiInnerIfDistinct,
    /// 需要对结果去重的内连接
    InnerNeedDistinct,
}

impl JoinType {
    pub fn is_inner(&self) -> bool {
        matches!(self, JoinType::Inner | JoinType::InnerNeedDistinct)
    }

    pub fn is_outer(&self) -> bool {
        matches!(self, JoinType::Left | JoinType::Right | JoinType::FullOuter)
    }

    pub fn is_semi(&self) -> bool {
        matches!(
            self,
            JoinType::Semi | JoinType::SemiInnerAlreadyDistinct | JoinType::SemiInnerIfDistinct
        )
    }

    /// 左侧可以作为外层驱动
    pub fn is_left_linear(&self) -> bool {
        self.is_inner() || self.is_semi() || matches!(self, JoinType::Left | JoinType::Anti)
    }

    /// 右侧可以作为外层驱动
    pub fn is_right_linear(&self) -> bool {
        self.is_inner() || matches!(self, JoinType::Right)
    }

    pub fn is_fully_linear(&self) -> bool {
        self.is_left_linear() && self.is_right_linear()
    }

    /// 交换左右输入后的连接类型，半连接和反连接不可交换
    pub fn reversed(&self) -> PlanResult<JoinType> {
        match self {
            JoinType::Inner => Ok(JoinType::Inner),
            JoinType::FullOuter => Ok(JoinType::FullOuter),
            JoinType::Left => Ok(JoinType::Right),
            JoinType::Right => Ok(JoinType::Left),
            other => Err(PlanError::internal(format!("无法反转 {} 连接", other))),
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::FullOuter => "FULL_OUTER",
            JoinType::Semi => "SEMI",
            JoinType::Anti => "ANTI",
            JoinType::SemiInnerAlreadyDistinct => "SEMI_INNER_ALREADY_DISTINCT",
            JoinType::SemiInnerIfDistinct => "SEMI_INNER_IF_DISTINCT",
            JoinType::InnerNeedDistinct => "INNER_NEED_DISTINCT",
        };
        write!(f, "{}", name)
    }
}

/// 连接的实现方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinImplementation {
    NestedLoops,
    HashTable,
    BloomFilter,
    Merge,
}

impl fmt::Display for JoinImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinImplementation::NestedLoops => "NESTED_LOOPS",
            JoinImplementation::HashTable => "HASH_TABLE",
            JoinImplementation::BloomFilter => "BLOOM_FILTER",
            JoinImplementation::Merge => "MERGE",
        };
        write!(f, "{}", name)
    }
}

define_plan_node! {
    pub struct JoinNode {
        left: Box<PlanNodeEnum>,
        right: Box<PlanNodeEnum>,
        join_type: JoinType,
        implementation: Option<JoinImplementation>,
        join_conditions: Vec<ExpressionNode>,
        group_join: Option<TableGroupJoinId>,
        fk_join: Option<TableFKJoinId>,
    }
}

impl JoinNode {
    pub fn new(left: PlanNodeEnum, right: PlanNodeEnum, join_type: JoinType) -> Self {
        Self {
            id: next_node_id(),
            left: Box::new(left),
            right: Box::new(right),
            join_type,
            implementation: None,
            join_conditions: Vec::new(),
            group_join: None,
            fk_join: None,
        }
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn set_join_type(&mut self, join_type: JoinType) {
        self.join_type = join_type;
    }

    pub fn implementation(&self) -> Option<JoinImplementation> {
        self.implementation
    }

    pub fn set_implementation(&mut self, implementation: JoinImplementation) {
        self.implementation = Some(implementation);
    }

    pub fn join_conditions(&self) -> &[ExpressionNode] {
        &self.join_conditions
    }

    pub fn join_conditions_mut(&mut self) -> &mut Vec<ExpressionNode> {
        &mut self.join_conditions
    }

    pub fn has_join_conditions(&self) -> bool {
        !self.join_conditions.is_empty()
    }

    pub fn group_join(&self) -> Option<TableGroupJoinId> {
        self.group_join
    }

    pub fn set_group_join(&mut self, group_join: Option<TableGroupJoinId>) {
        self.group_join = group_join;
    }

    pub fn fk_join(&self) -> Option<TableFKJoinId> {
        self.fk_join
    }

    pub fn set_fk_join(&mut self, fk_join: Option<TableFKJoinId>) {
        self.fk_join = fk_join;
    }

    pub fn is_inner(&self) -> bool {
        self.join_type.is_inner()
    }

    pub fn is_outer(&self) -> bool {
        self.join_type.is_outer()
    }

    pub fn is_semi(&self) -> bool {
        self.join_type.is_semi()
    }

    /// 交换左右输入
    ///
    /// 连接类型不可反转时返回错误，节点保持不变
    pub fn reverse(&mut self) -> PlanResult<()> {
        let reversed = self.join_type.reversed()?;
        std::mem::swap(&mut self.left, &mut self.right);
        self.join_type = reversed;
        log::debug!("反转连接 JoinNode@{}，类型为 {}", self.id, reversed);
        Ok(())
    }
}

impl PlanNode for JoinNode {
    fn details(&self, _ctx: &PlanContext) -> String {
        let mut details = self.join_type.to_string();
        if let Some(implementation) = self.implementation {
            details.push('/');
            details.push_str(&implementation.to_string());
        }
        if self.has_join_conditions() {
            details.push_str(&format!("[{}]", join_expressions(&self.join_conditions)));
        }
        details
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.left, &self.right]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.left, &mut self.right]
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.join_conditions.iter().collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.join_conditions.iter_mut().collect()
    }
}

impl BinaryInputNode for JoinNode {
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

impl Duplicatable for JoinNode {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            left: self.left.duplicate(map),
            right: self.right.duplicate(map),
            join_type: self.join_type,
            implementation: self.implementation,
            join_conditions: self.join_conditions.duplicate(map),
            group_join: self.group_join.duplicate(map),
            fk_join: self.fk_join.duplicate(map),
        }
    }
}

define_plan_node! {
    /// 嵌套循环连接：`outer` 的每一行绑定后执行一次 `inner`
    pub struct MapJoin {
        outer: Box<PlanNodeEnum>,
        inner: Box<PlanNodeEnum>,
        join_type: JoinType,
    }
}

impl MapJoin {
    pub fn new(outer: PlanNodeEnum, inner: PlanNodeEnum, join_type: JoinType) -> Self {
        Self {
            id: next_node_id(),
            outer: Box::new(outer),
            inner: Box::new(inner),
            join_type,
        }
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn outer(&self) -> &PlanNodeEnum {
        &self.outer
    }

    pub fn inner(&self) -> &PlanNodeEnum {
        &self.inner
    }
}

impl PlanNode for MapJoin {
    fn details(&self, _ctx: &PlanContext) -> String {
        self.join_type.to_string()
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.outer, &self.inner]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.outer, &mut self.inner]
    }
}

impl BinaryInputNode for MapJoin {
    fn left(&self) -> &PlanNodeEnum {
        &self.outer
    }

    fn right(&self) -> &PlanNodeEnum {
        &self.inner
    }

    fn set_left(&mut self, input: PlanNodeEnum) -> PlanNodeEnum {
        std::mem::replace(&mut *self.outer, input)
    }

    fn set_right(&mut self, input: PlanNodeEnum) -> PlanNodeEnum {
        std::mem::replace(&mut *self.inner, input)
    }
}

impl Duplicatable for MapJoin {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            outer: self.outer.duplicate(map),
            inner: self.inner.duplicate(map),
            join_type: self.join_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::planner::plan::core::nodes::plan_node_traits::PlanNodeIdentity;
    use crate::query::planner::plan::core::nodes::NullSource;

    const ALL: [JoinType; 9] = [
        JoinType::Inner,
        JoinType::Left,
        JoinType::Right,
        JoinType::FullOuter,
        JoinType::Semi,
        JoinType::Anti,
        JoinType::SemiInnerAlreadyDistinct,
        JoinType::SemiInnerIfDistinct,
        JoinType::InnerNeedDistinct,
    ];

    #[test]
    fn test_linearity() {
        assert!(JoinType::Inner.is_fully_linear());
        assert!(JoinType::InnerNeedDistinct.is_fully_linear());
        assert!(JoinType::Left.is_left_linear() && !JoinType::Left.is_right_linear());
        assert!(JoinType::Right.is_right_linear() && !JoinType::Right.is_left_linear());
        assert!(!JoinType::FullOuter.is_left_linear() && !JoinType::FullOuter.is_right_linear());
        assert!(JoinType::Anti.is_left_linear());
        for join_type in ALL {
            assert_eq!(
                join_type.is_fully_linear(),
                join_type.is_left_linear() && join_type.is_right_linear()
            );
        }
    }

    #[test]
    fn test_reverse_fails_fast() {
        for join_type in [JoinType::Semi, JoinType::Anti, JoinType::SemiInnerIfDistinct] {
            let mut join = JoinNode::new(NullSource::new().into(), NullSource::new().into(), join_type);
            let left = join.left().id();
            assert!(matches!(join.reverse(), Err(PlanError::Internal(_))));
            assert_eq!(join.left().id(), left);
            assert_eq!(join.join_type(), join_type);
        }
    }

    #[test]
    fn test_join_details() {
        let ctx = PlanContext::new();
        let mut join = JoinNode::new(NullSource::new().into(), NullSource::new().into(), JoinType::Left);
        join.set_implementation(JoinImplementation::HashTable);
        assert_eq!(join.details(&ctx), "LEFT/HASH_TABLE");
        assert_eq!(join.into_enum().name(), "JoinNode");
    }
}
