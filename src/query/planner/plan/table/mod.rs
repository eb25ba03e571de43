//! 表模型
//!
//! - `TableTree`/`TableNode`：表的模式身份，树形结构与存储层次一致
//! - `TableSource`：计划期对一张表的一次使用，同一 `TableNode` 可以有多个（例如自连接）
//!
//! 这些实体都放在 `PlanContext` 中，计划树通过类型化 ID 引用。

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{CatalogGroup, CatalogTable};
use crate::query::planner::plan::core::context::{
    PlanContext, TableGroupId, TableGroupJoinId, TableNodeId, TableSourceId, TableTreeId,
};

pub mod group;

pub use group::{TableFKJoin, TableGroup, TableGroupJoin};

/// 表树：一个目录表组在计划中的镜像
#[derive(Debug, Clone)]
pub struct TableTree {
    group: Option<Arc<CatalogGroup>>,
    root: Option<TableNodeId>,
    /// 按创建顺序排列，祖先总在后代之前
    nodes: Vec<TableNodeId>,
}

impl TableTree {
    pub(crate) fn new(group: Option<Arc<CatalogGroup>>) -> Self {
        Self {
            group,
            root: None,
            nodes: Vec::new(),
        }
    }

    pub fn group(&self) -> Option<&Arc<CatalogGroup>> {
        self.group.as_ref()
    }

    pub fn root(&self) -> Option<TableNodeId> {
        self.root
    }

    pub fn nodes(&self) -> &[TableNodeId] {
        &self.nodes
    }

    pub fn position_of(&self, node: TableNodeId) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    pub(crate) fn relinked(&self, mapping: &HashMap<TableNodeId, TableNodeId>) -> Self {
        Self {
            group: self.group.clone(),
            root: self.root.map(|r| mapping[&r]),
            nodes: self.nodes.iter().map(|n| mapping[n]).collect(),
        }
    }
}

/// 表节点：表树中的一张目录表
#[derive(Debug, Clone)]
pub struct TableNode {
    tree: TableTreeId,
    table: Arc<CatalogTable>,
    parent: Option<TableNodeId>,
    /// 按目录序号排列
    children: Vec<TableNodeId>,
    uses: Vec<TableSourceId>,
}

impl TableNode {
    pub fn tree(&self) -> TableTreeId {
        self.tree
    }

    pub fn table(&self) -> &Arc<CatalogTable> {
        &self.table
    }

    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn parent(&self) -> Option<TableNodeId> {
        self.parent
    }

    pub fn children(&self) -> &[TableNodeId] {
        &self.children
    }

    /// 引用这张表的全部表来源
    pub fn uses(&self) -> &[TableSourceId] {
        &self.uses
    }

    pub(crate) fn add_use(&mut self, source: TableSourceId) {
        if !self.uses.contains(&source) {
            self.uses.push(source);
        }
    }

    /// 单独复制到新树中，不带父子关系
    pub(crate) fn detached(&self, tree: TableTreeId) -> Self {
        Self {
            tree,
            table: self.table.clone(),
            parent: None,
            children: Vec::new(),
            uses: Vec::new(),
        }
    }

    /// 复制到新树中，使用记录清空，由复制出的表来源重新登记
    pub(crate) fn relinked(&self, tree: TableTreeId, mapping: &HashMap<TableNodeId, TableNodeId>) -> Self {
        Self {
            tree,
            table: self.table.clone(),
            parent: self.parent.map(|p| mapping[&p]),
            children: self.children.iter().map(|c| mapping[c]).collect(),
            uses: Vec::new(),
        }
    }
}

/// 表来源：计划期对表的一次使用
#[derive(Debug, Clone)]
pub struct TableSource {
    node: TableNodeId,
    name: String,
    required: bool,
    group: Option<TableGroupId>,
    parent_join: Option<TableGroupJoinId>,
}

impl TableSource {
    pub fn node(&self) -> TableNodeId {
        self.node
    }

    /// 相关名，没有别名时就是表名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 外连接的内侧表不是必需的
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    pub fn group(&self) -> Option<TableGroupId> {
        self.group
    }

    /// 把这张表连到组内父表的组连接
    pub fn parent_join(&self) -> Option<TableGroupJoinId> {
        self.parent_join
    }

    pub(crate) fn set_group(&mut self, group: Option<TableGroupId>) {
        self.group = group;
    }

    pub(crate) fn set_parent_join(&mut self, join: Option<TableGroupJoinId>) {
        self.parent_join = join;
    }

    pub(crate) fn relinked(
        &self,
        node: TableNodeId,
        group: Option<TableGroupId>,
        parent_join: Option<TableGroupJoinId>,
    ) -> Self {
        Self {
            node,
            name: self.name.clone(),
            required: self.required,
            group,
            parent_join,
        }
    }
}

impl PlanContext {
    /// 新建表树
    pub fn new_table_tree(&mut self, group: Option<Arc<CatalogGroup>>) -> TableTreeId {
        self.push_table_tree(TableTree::new(group))
    }

    /// 查找或创建目录表对应的表节点，祖先节点一并创建
    pub fn table_node_for(&mut self, tree: TableTreeId, table: &Arc<CatalogTable>) -> TableNodeId {
        let existing = self
            .table_tree(tree)
            .nodes()
            .iter()
            .copied()
            .find(|&n| self.table_node(n).table().table_id() == table.table_id());
        if let Some(node) = existing {
            return node;
        }

        let parent = table.parent().map(|p| self.table_node_for(tree, p));
        let node = self.push_table_node(TableNode {
            tree,
            table: table.clone(),
            parent,
            children: Vec::new(),
            uses: Vec::new(),
        });

        match parent {
            Some(parent) => {
                let ordinal = table.ordinal();
                let position = self
                    .table_node(parent)
                    .children()
                    .iter()
                    .position(|&c| self.table_node(c).table().ordinal() > ordinal);
                let siblings = &mut self.table_node_mut(parent).children;
                match position {
                    Some(i) => siblings.insert(i, node),
                    None => siblings.push(node),
                }
            }
            None => self.table_tree_mut(tree).root = Some(node),
        }
        self.table_tree_mut(tree).nodes.push(node);
        node
    }

    /// 新建表来源
    pub fn new_table_source(&mut self, node: TableNodeId, name: impl Into<String>, required: bool) -> TableSourceId {
        let source = self.push_table_source(TableSource {
            node,
            name: name.into(),
            required,
            group: None,
            parent_join: None,
        });
        self.table_node_mut(node).add_use(source);
        source
    }

    /// 表来源对应的目录表
    pub fn catalog_table_of(&self, source: TableSourceId) -> &Arc<CatalogTable> {
        self.table_node(self.table_source(source).node()).table()
    }

    /// 表来源的显示名
    pub fn table_source_name(&self, source: TableSourceId) -> &str {
        self.table_source(source).name()
    }

    /// `root` 的表是否为 `leaf` 的表的祖先（包含同一张表）
    pub fn is_ancestor(&self, leaf: TableSourceId, root: TableSourceId) -> bool {
        self.catalog_table_of(root).is_ancestor_of(self.catalog_table_of(leaf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogColumn;
    use crate::core::types::{DataType, TInstance};
    use crate::query::planner::plan::core::duplicate::DuplicateMap;

    fn column(name: &str) -> CatalogColumn {
        CatalogColumn::new(name, 0, TInstance::not_null(DataType::Int))
    }

    fn catalog() -> (Arc<CatalogGroup>, Arc<CatalogTable>, Arc<CatalogTable>, Arc<CatalogTable>) {
        let customers = CatalogTable::root(1, "customers", 1, vec![column("cid")]);
        let addresses = CatalogTable::child(4, "addresses", 4, &customers, vec![], vec![column("aid")]);
        let orders = CatalogTable::child(2, "orders", 2, &customers, vec![], vec![column("oid")]);
        let group = CatalogGroup::new("customers", vec![customers.clone(), orders.clone(), addresses.clone()]);
        (group, customers, orders, addresses)
    }

    #[test]
    fn test_table_node_for_creates_ancestors_in_ordinal_order() {
        let (group, customers, orders, addresses) = catalog();
        let mut ctx = PlanContext::new();
        let tree = ctx.new_table_tree(Some(group));

        // 先创建序号大的子表，父节点随之创建
        let a = ctx.table_node_for(tree, &addresses);
        let o = ctx.table_node_for(tree, &orders);
        let c = ctx.table_node_for(tree, &customers);

        assert_eq!(ctx.table_tree(tree).root(), Some(c));
        assert_eq!(ctx.table_node(a).parent(), Some(c));
        assert_eq!(ctx.table_node(c).children(), &[o, a]);
        assert_eq!(ctx.table_tree(tree).nodes().len(), 3);
        assert_eq!(ctx.table_node_for(tree, &orders), o);
    }

    #[test]
    fn test_table_sources_share_node() {
        let (group, _, orders, _) = catalog();
        let mut ctx = PlanContext::new();
        let tree = ctx.new_table_tree(Some(group));
        let node = ctx.table_node_for(tree, &orders);
        let o1 = ctx.new_table_source(node, "o1", true);
        let o2 = ctx.new_table_source(node, "o2", false);

        assert_eq!(ctx.table_node(node).uses(), &[o1, o2]);
        assert_eq!(ctx.catalog_table_of(o2).name(), "orders");
        assert!(!ctx.table_source(o2).is_required());
    }

    #[test]
    fn test_duplicate_shares_tree_clone() {
        let (group, customers, orders, _) = catalog();
        let mut ctx = PlanContext::new();
        let tree = ctx.new_table_tree(Some(group));
        let cnode = ctx.table_node_for(tree, &customers);
        let onode = ctx.table_node_for(tree, &orders);
        let c = ctx.new_table_source(cnode, "c", true);
        let o1 = ctx.new_table_source(onode, "o1", true);
        let o2 = ctx.new_table_source(onode, "o2", true);

        let mut map = DuplicateMap::new(&mut ctx);
        let new_c = map.table_source(c);
        let new_o1 = map.table_source(o1);
        let new_o2 = map.table_source(o2);
        assert_eq!(map.table_source(o1), new_o1);
        drop(map);

        assert_ne!(new_o1, new_o2);
        let n1 = ctx.table_source(new_o1).node();
        let n2 = ctx.table_source(new_o2).node();
        assert_eq!(n1, n2);
        assert_ne!(n1, onode);

        let new_tree = ctx.table_node(n1).tree();
        assert_ne!(new_tree, tree);
        assert_eq!(ctx.table_node(ctx.table_source(new_c).node()).tree(), new_tree);
        assert_eq!(ctx.table_node(n1).parent(), Some(ctx.table_source(new_c).node()));
        assert_eq!(ctx.table_node(n1).uses(), &[new_o1, new_o2]);
        // 原树不受影响
        assert_eq!(ctx.table_node(onode).uses(), &[o1, o2]);
    }
}
