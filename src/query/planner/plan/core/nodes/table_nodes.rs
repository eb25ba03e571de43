//! 表相关节点
//!
//! - `TableSourceNode`：计划树中的表来源叶子
//! - `TableJoins`：连接规划前一个表组内的连接集合，附带候选访问路径
//! - `TableGroupJoinTree`：一个表组的 n 叉连接树，每个备选方案一棵

use std::collections::BTreeSet;

use super::join_node::JoinType;
use super::plan_node_enum::PlanNodeEnum;
use super::plan_node_traits::PlanNode;
use crate::core::types::expression::ExpressionNode;
use crate::define_plan_node;
use crate::define_single_input_node;
use crate::query::planner::plan::core::context::{PlanContext, TableGroupId, TableSourceId};
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;

define_plan_node! {
    pub struct TableSourceNode {
        source: TableSourceId,
    }
    display: "TableSource"
}

impl TableSourceNode {
    pub fn new(source: TableSourceId) -> Self {
        Self {
            id: next_node_id(),
            source,
        }
    }

    pub fn source(&self) -> TableSourceId {
        self.source
    }
}

impl PlanNode for TableSourceNode {
    fn details(&self, ctx: &PlanContext) -> String {
        let name = ctx.table_source_name(self.source);
        let table = ctx.catalog_table_of(self.source).name();
        if name == table {
            name.to_string()
        } else {
            format!("{} AS {}", table, name)
        }
    }

    fn is_leaf(&self) -> bool {
        true
    }
}

impl Duplicatable for TableSourceNode {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            source: map.table_source(self.source),
        }
    }
}

define_single_input_node! {
    /// 表组内的连接，`scans` 是规则为这个表组枚举出的候选访问路径
    pub struct TableJoins {
        group: TableGroupId,
        scans: Vec<PlanNodeEnum>,
    }
}

impl TableJoins {
    pub fn new(joins: PlanNodeEnum, group: TableGroupId) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(joins),
            group,
            scans: Vec::new(),
        }
    }

    pub fn group(&self) -> TableGroupId {
        self.group
    }

    pub fn joins(&self) -> &PlanNodeEnum {
        &self.input
    }

    /// 候选访问路径不属于计划树，遍历时不会访问
    pub fn scans(&self) -> &[PlanNodeEnum] {
        &self.scans
    }

    pub fn add_scan(&mut self, scan: PlanNodeEnum) {
        self.scans.push(scan);
    }

    pub fn take_scans(&mut self) -> Vec<PlanNodeEnum> {
        std::mem::take(&mut self.scans)
    }
}

impl PlanNode for TableJoins {
    fn details(&self, _ctx: &PlanContext) -> String {
        self.group.to_string()
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }
}

impl Duplicatable for TableJoins {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            group: map.table_group(self.group),
            scans: self.scans.duplicate(map),
        }
    }
}

/// 连接树内的节点下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupJoinNodeIndex(usize);

impl GroupJoinNodeIndex {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// 组连接树的节点
#[derive(Debug)]
pub struct TableGroupJoinNode {
    table: TableSourceId,
    parent: Option<GroupJoinNodeIndex>,
    first_child: Option<GroupJoinNodeIndex>,
    next_sibling: Option<GroupJoinNodeIndex>,
    parent_join_type: JoinType,
    join_conditions: Vec<ExpressionNode>,
    state: i64,
}

impl TableGroupJoinNode {
    pub fn table(&self) -> TableSourceId {
        self.table
    }

    pub fn parent(&self) -> Option<GroupJoinNodeIndex> {
        self.parent
    }

    pub fn first_child(&self) -> Option<GroupJoinNodeIndex> {
        self.first_child
    }

    pub fn next_sibling(&self) -> Option<GroupJoinNodeIndex> {
        self.next_sibling
    }

    /// 与父节点的连接类型
    pub fn parent_join_type(&self) -> JoinType {
        self.parent_join_type
    }

    pub fn set_parent_join_type(&mut self, join_type: JoinType) {
        self.parent_join_type = join_type;
    }

    pub fn join_conditions(&self) -> &[ExpressionNode] {
        &self.join_conditions
    }

    pub fn join_conditions_mut(&mut self) -> &mut Vec<ExpressionNode> {
        &mut self.join_conditions
    }

    /// 规则使用的状态位
    pub fn state(&self) -> i64 {
        self.state
    }

    pub fn set_state(&mut self, state: i64) {
        self.state = state;
    }
}

define_plan_node! {
    pub struct TableGroupJoinTree {
        group: TableGroupId,
        nodes: Vec<TableGroupJoinNode>,
        scan: Option<Box<PlanNodeEnum>>,
    }
}

impl TableGroupJoinTree {
    /// 以组内最上层的表为根创建连接树
    pub fn new(group: TableGroupId, root: TableSourceId) -> Self {
        Self {
            id: next_node_id(),
            group,
            nodes: vec![TableGroupJoinNode {
                table: root,
                parent: None,
                first_child: None,
                next_sibling: None,
                parent_join_type: JoinType::Inner,
                join_conditions: Vec::new(),
                state: 0,
            }],
            scan: None,
        }
    }

    pub fn group(&self) -> TableGroupId {
        self.group
    }

    pub fn root(&self) -> GroupJoinNodeIndex {
        GroupJoinNodeIndex(0)
    }

    pub fn node(&self, index: GroupJoinNodeIndex) -> &TableGroupJoinNode {
        &self.nodes[index.0]
    }

    pub fn node_mut(&mut self, index: GroupJoinNodeIndex) -> &mut TableGroupJoinNode {
        &mut self.nodes[index.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 在 `parent` 的子节点末尾追加一张表
    pub fn add_child(
        &mut self,
        parent: GroupJoinNodeIndex,
        table: TableSourceId,
        parent_join_type: JoinType,
    ) -> GroupJoinNodeIndex {
        let index = GroupJoinNodeIndex(self.nodes.len());
        self.nodes.push(TableGroupJoinNode {
            table,
            parent: Some(parent),
            first_child: None,
            next_sibling: None,
            parent_join_type,
            join_conditions: Vec::new(),
            state: 0,
        });
        match self.children_of(parent).last() {
            Some(&last) => self.nodes[last.0].next_sibling = Some(index),
            None => self.nodes[parent.0].first_child = Some(index),
        }
        index
    }

    /// 直接子节点，按兄弟顺序
    pub fn children_of(&self, parent: GroupJoinNodeIndex) -> Vec<GroupJoinNodeIndex> {
        let mut result = Vec::new();
        let mut next = self.nodes[parent.0].first_child;
        while let Some(child) = next {
            result.push(child);
            next = self.nodes[child.0].next_sibling;
        }
        result
    }

    /// 前序遍历：父节点在前，子节点按兄弟顺序
    pub fn iter(&self) -> PreOrderIter<'_> {
        PreOrderIter {
            tree: self,
            stack: vec![self.root()],
        }
    }

    pub fn find(&self, table: TableSourceId) -> Option<GroupJoinNodeIndex> {
        self.iter().find(|&i| self.node(i).table == table)
    }

    /// 收集被接受子树的叶子
    ///
    /// `include_and_continue` 拒绝的节点连同子树一起跳过；被接受但没有被接受子节点的节点算作叶子
    pub fn find_leaves<T>(
        &self,
        include_and_continue: impl Fn(&TableGroupJoinNode) -> bool,
        map_to_value: impl Fn(&TableGroupJoinNode) -> T,
    ) -> Vec<T> {
        let mut leaves = Vec::new();
        if include_and_continue(self.node(self.root())) {
            self.collect_leaves(self.root(), &include_and_continue, &map_to_value, &mut leaves);
        }
        leaves
    }

    fn collect_leaves<T>(
        &self,
        index: GroupJoinNodeIndex,
        include: &impl Fn(&TableGroupJoinNode) -> bool,
        map_to_value: &impl Fn(&TableGroupJoinNode) -> T,
        leaves: &mut Vec<T>,
    ) {
        let mut any_accepted = false;
        for child in self.children_of(index) {
            if include(self.node(child)) {
                any_accepted = true;
                self.collect_leaves(child, include, map_to_value, leaves);
            }
        }
        if !any_accepted {
            leaves.push(map_to_value(self.node(index)));
        }
    }

    /// 连接树中的全部表来源
    pub fn tables(&self) -> Vec<TableSourceId> {
        self.iter().map(|i| self.node(i).table).collect()
    }

    /// 必须有行的表来源，外连接内侧的表不在其中
    pub fn required_tables(&self, ctx: &PlanContext) -> BTreeSet<TableSourceId> {
        self.iter()
            .map(|i| self.node(i).table)
            .filter(|&t| ctx.table_source(t).is_required())
            .collect()
    }

    /// 为这棵树选定的访问路径
    pub fn scan(&self) -> Option<&PlanNodeEnum> {
        self.scan.as_deref()
    }

    pub fn set_scan(&mut self, scan: PlanNodeEnum) -> Option<PlanNodeEnum> {
        self.scan.replace(Box::new(scan)).map(|old| *old)
    }
}

/// 前序遍历迭代器
pub struct PreOrderIter<'a> {
    tree: &'a TableGroupJoinTree,
    stack: Vec<GroupJoinNodeIndex>,
}

impl Iterator for PreOrderIter<'_> {
    type Item = GroupJoinNodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let children = self.tree.children_of(index);
        self.stack.extend(children.into_iter().rev());
        Some(index)
    }
}

impl PlanNode for TableGroupJoinTree {
    fn details(&self, ctx: &PlanContext) -> String {
        self.iter()
            .map(|i| {
                let node = self.node(i);
                let name = ctx.table_source_name(node.table);
                if node.parent.is_none() {
                    name.to_string()
                } else {
                    format!("{} {}", node.parent_join_type, name)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        self.scan.iter().map(|s| s.as_ref()).collect()
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        self.scan.iter_mut().map(|s| s.as_mut()).collect()
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.nodes.iter().flat_map(|n| n.join_conditions.iter()).collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.nodes.iter_mut().flat_map(|n| n.join_conditions.iter_mut()).collect()
    }
}

impl Duplicatable for TableGroupJoinTree {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        let nodes = self
            .nodes
            .iter()
            .map(|n| TableGroupJoinNode {
                table: map.table_source(n.table),
                parent: n.parent,
                first_child: n.first_child,
                next_sibling: n.next_sibling,
                parent_join_type: n.parent_join_type,
                join_conditions: n.join_conditions.duplicate(map),
                state: n.state,
            })
            .collect();
        Self {
            id: map.claim_plan_node_id(self.id),
            group: map.table_group(self.group),
            nodes,
            scan: self.scan.duplicate(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogColumn, CatalogTable};
    use crate::core::types::{DataType, TInstance};

    struct Fixture {
        ctx: PlanContext,
        group: TableGroupId,
        sources: Vec<TableSourceId>,
    }

    /// c -> (o -> i), a
    fn fixture() -> Fixture {
        let col = |name: &str| CatalogColumn::new(name, 0, TInstance::not_null(DataType::Int));
        let c = CatalogTable::root(1, "customers", 1, vec![col("cid")]);
        let o = CatalogTable::child(2, "orders", 2, &c, vec![], vec![col("oid")]);
        let i = CatalogTable::child(3, "items", 3, &o, vec![], vec![col("iid")]);
        let a = CatalogTable::child(4, "addresses", 4, &c, vec![], vec![col("aid")]);

        let mut ctx = PlanContext::new();
        let tree = ctx.new_table_tree(None);
        let mut sources = Vec::new();
        for (table, name) in [(&c, "c"), (&o, "o"), (&i, "i"), (&a, "a")] {
            let node = ctx.table_node_for(tree, table);
            sources.push(ctx.new_table_source(node, name, true));
        }
        let group = ctx.new_table_group(sources[0]);
        Fixture { ctx, group, sources }
    }

    fn build(f: &Fixture) -> TableGroupJoinTree {
        let s = &f.sources;
        let mut tree = TableGroupJoinTree::new(f.group, s[0]);
        let o = tree.add_child(tree.root(), s[1], JoinType::Inner);
        tree.add_child(o, s[2], JoinType::Left);
        tree.add_child(tree.root(), s[3], JoinType::Inner);
        tree
    }

    #[test]
    fn test_pre_order_keeps_sibling_order() {
        let f = fixture();
        let tree = build(&f);
        assert_eq!(tree.tables(), f.sources);
        assert_eq!(tree.details(&f.ctx), "c, INNER o, LEFT i, INNER a");
        assert_eq!(tree.find(f.sources[2]).map(|i| i.index()), Some(2));
    }

    #[test]
    fn test_find_leaves() {
        let f = fixture();
        let tree = build(&f);
        let all = tree.find_leaves(|_| true, |n| n.table());
        assert_eq!(all, vec![f.sources[2], f.sources[3]]);

        // 拒绝 items 后 orders 成为叶子
        let items = f.sources[2];
        let pruned = tree.find_leaves(|n| n.table() != items, |n| n.table());
        assert_eq!(pruned, vec![f.sources[1], f.sources[3]]);

        let none = tree.find_leaves(|_| false, |n| n.table());
        assert!(none.is_empty());
    }

    #[test]
    fn test_required_tables() {
        let mut f = fixture();
        f.ctx.table_source_mut(f.sources[2]).set_required(false);
        let tree = build(&f);
        let required = tree.required_tables(&f.ctx);
        assert_eq!(required.len(), 3);
        assert!(!required.contains(&f.sources[2]));
    }

    #[test]
    fn test_table_source_leaf() {
        let f = fixture();
        let leaf = TableSourceNode::new(f.sources[1]);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.details(&f.ctx), "orders AS o");
        assert_eq!(leaf.type_name(), "TableSource");
    }
}
