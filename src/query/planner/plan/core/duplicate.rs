//! 复制会话
//!
//! 规则在尝试两种互斥的改写之前先复制子计划，然后分别修改两份副本再比较代价。
//!
//! 每类元素声明一种复制策略：
//! - `MaintainInMap`：带身份的实体（表来源、表组、组连接等），同一会话内只复制一次，
//!   先登记再递归复制自身字段，互相引用的实体因此能够终止
//! - `Plain`：计划节点和表达式，每次都复制出新的实例
//!
//! 表身份经过单独的表树映射：一棵目录表树在一次会话中只复制一次，
//! 引用同一 `TableNode` 的多个表来源复制后指向同一个新的 `TableNode`。

use std::collections::{HashMap, HashSet};

use super::context::{
    BloomFilterId, ConditionId, HashTableId, PlanContext, TableFKJoinId, TableGroupId,
    TableGroupJoinId, TableNodeId, TableSourceId, TableTreeId,
};
use super::node_id_generator::next_node_id;
use crate::query::planner::plan::table::TableTree;

/// 复制策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicationStrategy {
    /// 身份共享：在映射中记录，同一会话只复制一次
    MaintainInMap,
    /// 每次都复制出新实例
    Plain,
}

/// 可参与复制会话的计划元素
pub trait Duplicatable: Sized {
    const STRATEGY: DuplicationStrategy;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self;
}

/// 复制会话
///
/// 持有计划上下文的可变引用，新实体直接分配在同一个上下文中
pub struct DuplicateMap<'a> {
    ctx: &'a mut PlanContext,
    trees: HashMap<TableTreeId, TableTreeId>,
    loose_nodes: HashMap<TableNodeId, TableNodeId>,
    sources: HashMap<TableSourceId, TableSourceId>,
    groups: HashMap<TableGroupId, TableGroupId>,
    group_joins: HashMap<TableGroupJoinId, TableGroupJoinId>,
    fk_joins: HashMap<TableFKJoinId, TableFKJoinId>,
    hash_tables: HashMap<HashTableId, HashTableId>,
    bloom_filters: HashMap<BloomFilterId, BloomFilterId>,
    plan_nodes: HashMap<i64, i64>,
    claimed_nodes: HashSet<i64>,
    conditions: HashMap<ConditionId, ConditionId>,
}

impl<'a> DuplicateMap<'a> {
    pub fn new(ctx: &'a mut PlanContext) -> Self {
        log::trace!("开始复制会话");
        Self {
            ctx,
            trees: HashMap::new(),
            loose_nodes: HashMap::new(),
            sources: HashMap::new(),
            groups: HashMap::new(),
            group_joins: HashMap::new(),
            fk_joins: HashMap::new(),
            hash_tables: HashMap::new(),
            bloom_filters: HashMap::new(),
            plan_nodes: HashMap::new(),
            claimed_nodes: HashSet::new(),
            conditions: HashMap::new(),
        }
    }

    pub fn context(&self) -> &PlanContext {
        &*self.ctx
    }

    pub fn context_mut(&mut self) -> &mut PlanContext {
        &mut *self.ctx
    }

    /// 复制任意元素
    pub fn duplicate<T: Duplicatable>(&mut self, element: &T) -> T {
        element.duplicate(self)
    }

    /// 复制整棵表树，每棵树在会话中只复制一次
    pub fn table_tree(&mut self, old: TableTreeId) -> TableTreeId {
        if let Some(&new) = self.trees.get(&old) {
            return new;
        }

        let original = self.ctx.table_tree(old).clone();
        let new_tree = self.ctx.push_table_tree(TableTree::new(original.group().cloned()));
        self.trees.insert(old, new_tree);

        // 先分配全部节点，再按映射修正父子关系
        let mut mapping: HashMap<TableNodeId, TableNodeId> = HashMap::new();
        for &old_node in original.nodes() {
            let copy = self.ctx.table_node(old_node).clone();
            let new_node = self.ctx.push_table_node(copy);
            mapping.insert(old_node, new_node);
        }
        for &old_node in original.nodes() {
            let relinked = self.ctx.table_node(old_node).relinked(new_tree, &mapping);
            *self.ctx.table_node_mut(mapping[&old_node]) = relinked;
        }
        *self.ctx.table_tree_mut(new_tree) = original.relinked(&mapping);

        log::debug!("复制表树 {} -> {}，共 {} 个节点", old, new_tree, mapping.len());
        new_tree
    }

    /// 表节点经由所属表树复制
    pub fn table_node(&mut self, old: TableNodeId) -> TableNodeId {
        let old_tree = self.ctx.table_node(old).tree();
        let new_tree = self.table_tree(old_tree);
        let position = self.ctx.table_tree(old_tree).position_of(old);
        match position {
            Some(position) => self.ctx.table_tree(new_tree).nodes()[position],
            None => {
                if let Some(&new) = self.loose_nodes.get(&old) {
                    return new;
                }
                // 绕过 table_node_for 直接分配的节点，仍然复制一份，不与原节点共享
                log::warn!("表节点 {} 不在表树 {} 的节点列表中，单独复制", old, old_tree);
                let copy = self.ctx.table_node(old).detached(new_tree);
                let new = self.ctx.push_table_node(copy);
                self.loose_nodes.insert(old, new);
                new
            }
        }
    }

    pub fn table_source(&mut self, old: TableSourceId) -> TableSourceId {
        if let Some(&new) = self.sources.get(&old) {
            return new;
        }
        let original = self.ctx.table_source(old).clone();
        let new = self.ctx.push_table_source(original.clone());
        self.sources.insert(old, new);

        let node = self.table_node(original.node());
        let group = original.group().map(|g| self.table_group(g));
        let parent_join = original.parent_join().map(|j| self.group_join(j));
        *self.ctx.table_source_mut(new) = original.relinked(node, group, parent_join);
        self.ctx.table_node_mut(node).add_use(new);
        new
    }

    pub fn table_group(&mut self, old: TableGroupId) -> TableGroupId {
        if let Some(&new) = self.groups.get(&old) {
            return new;
        }
        let original = self.ctx.table_group(old).clone();
        let new = self.ctx.push_table_group(original.clone());
        self.groups.insert(old, new);

        let tables = original.tables().iter().map(|&t| self.table_source(t)).collect();
        let joins = original.joins().iter().map(|&j| self.group_join(j)).collect();
        let merged_into = original.merged_into().map(|g| self.table_group(g));
        *self.ctx.table_group_mut(new) = original.relinked(tables, joins, merged_into);
        new
    }

    pub fn group_join(&mut self, old: TableGroupJoinId) -> TableGroupJoinId {
        if let Some(&new) = self.group_joins.get(&old) {
            return new;
        }
        let original = self.ctx.group_join(old).clone();
        let new = self.ctx.push_group_join(original.clone());
        self.group_joins.insert(old, new);

        let group = self.table_group(original.group());
        let parent = self.table_source(original.parent());
        let child = self.table_source(original.child());
        let conditions: Vec<ConditionId> = original.conditions().iter().map(|&c| self.condition_id(c)).collect();
        for &condition in &conditions {
            self.ctx.register_condition_join(condition, new);
        }
        *self.ctx.group_join_mut(new) = original.relinked(group, parent, child, conditions);
        new
    }

    pub fn fk_join(&mut self, old: TableFKJoinId) -> TableFKJoinId {
        if let Some(&new) = self.fk_joins.get(&old) {
            return new;
        }
        let original = self.ctx.fk_join(old).clone();
        let new = self.ctx.push_fk_join(original.clone());
        self.fk_joins.insert(old, new);

        let parent = self.table_source(original.parent());
        let child = self.table_source(original.child());
        let conditions = original.conditions().iter().map(|&c| self.condition_id(c)).collect();
        *self.ctx.fk_join_mut(new) = original.relinked(parent, child, conditions);
        new
    }

    pub fn hash_table(&mut self, old: HashTableId) -> HashTableId {
        if let Some(&new) = self.hash_tables.get(&old) {
            return new;
        }
        let copy = self.ctx.hash_table(old).clone();
        let new = self.ctx.push_hash_table(copy);
        self.hash_tables.insert(old, new);
        new
    }

    pub fn bloom_filter(&mut self, old: BloomFilterId) -> BloomFilterId {
        if let Some(&new) = self.bloom_filters.get(&old) {
            return new;
        }
        let copy = self.ctx.bloom_filter(old).clone();
        let new = self.ctx.push_bloom_filter(copy);
        self.bloom_filters.insert(old, new);
        new
    }

    /// 计划节点ID的映射，列引用和节点本身按同一映射解析
    pub fn plan_node_id(&mut self, old: i64) -> i64 {
        *self.plan_nodes.entry(old).or_insert_with(next_node_id)
    }

    /// 为复制出的计划节点领取新ID
    ///
    /// 同一节点在会话中被复制多次时，只有第一份副本使用映射中的ID
    pub fn claim_plan_node_id(&mut self, old: i64) -> i64 {
        let mapped = self.plan_node_id(old);
        if self.claimed_nodes.insert(mapped) {
            mapped
        } else {
            next_node_id()
        }
    }

    pub fn condition_id(&mut self, old: ConditionId) -> ConditionId {
        *self.conditions.entry(old).or_insert_with(ConditionId::new)
    }
}

macro_rules! impl_maintained_id {
    ($($id:ty => $method:ident),* $(,)?) => {
        $(
            impl Duplicatable for $id {
                const STRATEGY: DuplicationStrategy = DuplicationStrategy::MaintainInMap;

                fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
                    map.$method(*self)
                }
            }
        )*
    };
}

impl_maintained_id! {
    TableTreeId => table_tree,
    TableNodeId => table_node,
    TableSourceId => table_source,
    TableGroupId => table_group,
    TableGroupJoinId => group_join,
    TableFKJoinId => fk_join,
    HashTableId => hash_table,
    BloomFilterId => bloom_filter,
}

impl<T: Duplicatable> Duplicatable for Vec<T> {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        self.iter().map(|e| e.duplicate(map)).collect()
    }
}

impl<T: Duplicatable> Duplicatable for Box<T> {
    const STRATEGY: DuplicationStrategy = T::STRATEGY;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Box::new(self.as_ref().duplicate(map))
    }
}

impl<T: Duplicatable> Duplicatable for Option<T> {
    const STRATEGY: DuplicationStrategy = T::STRATEGY;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        self.as_ref().map(|e| e.duplicate(map))
    }
}
