//! 分组存储上的查找节点
//!
//! 同一表组的行按层次交错存放：`GroupScan` 顺序扫描整个组，
//! `AncestorLookup`/`BranchLookup` 从一行出发取祖先行或整条分支，
//! `Flatten` 把层次行按连接类型展开成平铺的行。

use super::join_node::JoinType;
use super::plan_node_enum::PlanNodeEnum;
use super::plan_node_traits::PlanNode;
use super::statement_nodes::join_expressions;
use crate::core::types::expression::ExpressionNode;
use crate::define_plan_node;
use crate::define_single_input_node;
use crate::query::planner::plan::core::context::{PlanContext, TableGroupId, TableNodeId, TableSourceId};
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;

fn table_names(ctx: &PlanContext, tables: &[TableNodeId]) -> String {
    tables
        .iter()
        .map(|&t| ctx.table_node(t).name())
        .collect::<Vec<_>>()
        .join(", ")
}

define_single_input_node! {
    /// 层次行展开，`tables[i]` 为 `None` 表示该位置的表只用于定位
    pub struct Flatten {
        table_nodes: Vec<TableNodeId>,
        tables: Vec<Option<TableSourceId>>,
        join_types: Vec<JoinType>,
    }
}

impl Flatten {
    /// `join_types` 比 `table_nodes` 少一项，表示相邻两张表之间的连接
    pub fn new(
        input: PlanNodeEnum,
        table_nodes: Vec<TableNodeId>,
        tables: Vec<Option<TableSourceId>>,
        join_types: Vec<JoinType>,
    ) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            table_nodes,
            tables,
            join_types,
        }
    }

    pub fn table_nodes(&self) -> &[TableNodeId] {
        &self.table_nodes
    }

    pub fn tables(&self) -> &[Option<TableSourceId>] {
        &self.tables
    }

    pub fn join_types(&self) -> &[JoinType] {
        &self.join_types
    }
}

impl PlanNode for Flatten {
    fn details(&self, ctx: &PlanContext) -> String {
        let mut details = String::new();
        for (i, &node) in self.table_nodes.iter().enumerate() {
            if i > 0 {
                let join_type = self.join_types.get(i - 1).copied().unwrap_or(JoinType::Inner);
                details.push_str(&format!(" {} ", join_type));
            }
            match self.tables.get(i).copied().flatten() {
                Some(source) => details.push_str(ctx.table_source_name(source)),
                None => details.push_str(&format!("HKEY({})", ctx.table_node(node).name())),
            }
        }
        details
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }
}

impl Duplicatable for Flatten {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            table_nodes: self.table_nodes.duplicate(map),
            tables: self.tables.duplicate(map),
            join_types: self.join_types.clone(),
        }
    }
}

define_single_input_node! {
    /// 从后代行查找祖先行
    pub struct AncestorLookup {
        descendant: TableNodeId,
        ancestors: Vec<TableNodeId>,
        tables: Vec<TableSourceId>,
    }
}

impl AncestorLookup {
    pub fn new(
        input: PlanNodeEnum,
        descendant: TableNodeId,
        ancestors: Vec<TableNodeId>,
        tables: Vec<TableSourceId>,
    ) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            descendant,
            ancestors,
            tables,
        }
    }

    pub fn descendant(&self) -> TableNodeId {
        self.descendant
    }

    pub fn ancestors(&self) -> &[TableNodeId] {
        &self.ancestors
    }

    pub fn tables(&self) -> &[TableSourceId] {
        &self.tables
    }
}

impl PlanNode for AncestorLookup {
    fn details(&self, ctx: &PlanContext) -> String {
        format!(
            "{} -> [{}]",
            ctx.table_node(self.descendant).name(),
            table_names(ctx, &self.ancestors)
        )
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }
}

impl Duplicatable for AncestorLookup {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            descendant: map.table_node(self.descendant),
            ancestors: self.ancestors.duplicate(map),
            tables: self.tables.duplicate(map),
        }
    }
}

define_single_input_node! {
    /// 从 `source` 行出发，经由共同祖先 `ancestor` 取 `branch` 开始的整条分支
    pub struct BranchLookup {
        source: TableNodeId,
        ancestor: TableNodeId,
        branch: TableNodeId,
        tables: Vec<TableSourceId>,
    }
}

impl BranchLookup {
    pub fn new(
        input: PlanNodeEnum,
        source: TableNodeId,
        ancestor: TableNodeId,
        branch: TableNodeId,
        tables: Vec<TableSourceId>,
    ) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            source,
            ancestor,
            branch,
            tables,
        }
    }

    pub fn source(&self) -> TableNodeId {
        self.source
    }

    pub fn ancestor(&self) -> TableNodeId {
        self.ancestor
    }

    pub fn branch(&self) -> TableNodeId {
        self.branch
    }

    pub fn tables(&self) -> &[TableSourceId] {
        &self.tables
    }
}

impl PlanNode for BranchLookup {
    fn details(&self, ctx: &PlanContext) -> String {
        let source = ctx.table_node(self.source).name();
        let ancestor = ctx.table_node(self.ancestor).name();
        let branch = ctx.table_node(self.branch).name();
        if self.source == self.ancestor {
            format!("{} -> {}", source, branch)
        } else {
            format!("{} -> {} -> {}", source, ancestor, branch)
        }
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }
}

impl Duplicatable for BranchLookup {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            source: map.table_node(self.source),
            ancestor: map.table_node(self.ancestor),
            branch: map.table_node(self.branch),
            tables: self.tables.duplicate(map),
        }
    }
}

define_plan_node! {
    /// 扫描整个表组
    pub struct GroupScan {
        group: TableGroupId,
    }
}

impl GroupScan {
    pub fn new(group: TableGroupId) -> Self {
        Self {
            id: next_node_id(),
            group,
        }
    }

    pub fn group(&self) -> TableGroupId {
        self.group
    }
}

impl PlanNode for GroupScan {
    fn details(&self, ctx: &PlanContext) -> String {
        match ctx.table_group(self.group).tables().first() {
            Some(&root) => ctx.catalog_table_of(root).name().to_string(),
            None => self.group.to_string(),
        }
    }

    fn is_leaf(&self) -> bool {
        true
    }
}

impl Duplicatable for GroupScan {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            group: map.table_group(self.group),
        }
    }
}

define_plan_node! {
    /// 在外层绑定的行附近扫描组内另一张表
    ///
    /// `inside_parent` 为 true 时 `inside` 是 `outside` 的祖先
    pub struct GroupLoopScan {
        inside: TableSourceId,
        outside: TableSourceId,
        inside_parent: bool,
        join_conditions: Vec<ExpressionNode>,
    }
}

impl GroupLoopScan {
    pub fn new(
        inside: TableSourceId,
        outside: TableSourceId,
        inside_parent: bool,
        join_conditions: Vec<ExpressionNode>,
    ) -> Self {
        Self {
            id: next_node_id(),
            inside,
            outside,
            inside_parent,
            join_conditions,
        }
    }

    pub fn inside(&self) -> TableSourceId {
        self.inside
    }

    pub fn outside(&self) -> TableSourceId {
        self.outside
    }

    pub fn is_inside_parent(&self) -> bool {
        self.inside_parent
    }

    pub fn join_conditions(&self) -> &[ExpressionNode] {
        &self.join_conditions
    }
}

impl PlanNode for GroupLoopScan {
    fn details(&self, ctx: &PlanContext) -> String {
        let inside = ctx.table_source_name(self.inside);
        let outside = ctx.table_source_name(self.outside);
        let arrow = if self.inside_parent { "<-" } else { "->" };
        let mut details = format!("{} {} {}", inside, arrow, outside);
        if !self.join_conditions.is_empty() {
            details.push_str(&format!(", {}", join_expressions(&self.join_conditions)));
        }
        details
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.join_conditions.iter().collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.join_conditions.iter_mut().collect()
    }
}

impl Duplicatable for GroupLoopScan {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            inside: map.table_source(self.inside),
            outside: map.table_source(self.outside),
            inside_parent: self.inside_parent,
            join_conditions: self.join_conditions.duplicate(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogTable;

    #[test]
    fn test_lookup_details() {
        let customers = CatalogTable::root(1, "customers", 1, Vec::new());
        let orders = CatalogTable::child(2, "orders", 2, &customers, vec![], Vec::new());
        let addresses = CatalogTable::child(3, "addresses", 3, &customers, vec![], Vec::new());

        let mut ctx = PlanContext::new();
        let tree = ctx.new_table_tree(None);
        let c = ctx.table_node_for(tree, &customers);
        let o = ctx.table_node_for(tree, &orders);
        let a = ctx.table_node_for(tree, &addresses);
        let cs = ctx.new_table_source(c, "c", true);
        let os = ctx.new_table_source(o, "o", true);
        let group = ctx.new_table_group(cs);

        let scan = GroupScan::new(group);
        assert!(scan.is_leaf());
        assert_eq!(scan.details(&ctx), "customers");

        let ancestors = AncestorLookup::new(scan.into(), o, vec![c], vec![cs]);
        assert_eq!(ancestors.details(&ctx), "orders -> [customers]");

        let branch = BranchLookup::new(ancestors.into(), o, c, a, vec![]);
        assert_eq!(branch.details(&ctx), "orders -> customers -> addresses");

        let flatten = Flatten::new(branch.into(), vec![c, o], vec![Some(cs), Some(os)], vec![JoinType::Left]);
        assert_eq!(flatten.details(&ctx), "c LEFT o");

        let loop_scan = GroupLoopScan::new(os, cs, false, Vec::new());
        assert_eq!(loop_scan.details(&ctx), "o -> c");
    }
}
