//! 计划上下文
//!
//! 一次语句编译拥有一个 `PlanContext`：带身份的实体（表树、表节点、表来源、表组、
//! 组连接、外键连接、哈希表、布隆过滤器）存放在这里的 arena 中，计划树和表达式
//! 只持有它们的类型化 ID。

use std::collections::HashMap;
use std::fmt;

use super::node_id_generator::next_condition_id;
use super::nodes::loader_nodes::{BloomFilter, HashTable};
use crate::config::{Config, PlannerConfig};
use crate::query::planner::plan::table::{
    TableFKJoin, TableGroup, TableGroupJoin, TableNode, TableSource, TableTree,
};

macro_rules! define_arena_id {
    ($(#[$meta:meta])* $name:ident, $label:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub fn index(&self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}@{}", $label, self.0)
            }
        }
    };
}

define_arena_id!(
    /// 表树ID
    TableTreeId,
    "TableTree"
);
define_arena_id!(
    /// 表节点ID
    TableNodeId,
    "TableNode"
);
define_arena_id!(
    /// 表来源ID
    TableSourceId,
    "TableSource"
);
define_arena_id!(
    /// 表组ID
    TableGroupId,
    "TableGroup"
);
define_arena_id!(
    /// 组连接ID
    TableGroupJoinId,
    "TableGroupJoin"
);
define_arena_id!(
    /// 外键连接ID
    TableFKJoinId,
    "TableFKJoin"
);
define_arena_id!(
    /// 哈希表ID
    HashTableId,
    "HashTable"
);
define_arena_id!(
    /// 布隆过滤器ID
    BloomFilterId,
    "BloomFilter"
);

/// 比较条件ID
///
/// 在条件创建时分配，用于把条件和组连接、索引扫描消耗的条件关联起来
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionId(i64);

impl ConditionId {
    pub fn new() -> Self {
        Self(next_condition_id())
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Default for ConditionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Condition@{}", self.0)
    }
}

/// 计划上下文
#[derive(Debug, Default)]
pub struct PlanContext {
    config: PlannerConfig,
    trees: Vec<TableTree>,
    table_nodes: Vec<TableNode>,
    sources: Vec<TableSource>,
    groups: Vec<TableGroup>,
    group_joins: Vec<TableGroupJoin>,
    fk_joins: Vec<TableFKJoin>,
    hash_tables: Vec<HashTable>,
    bloom_filters: Vec<BloomFilter>,
    condition_joins: HashMap<ConditionId, TableGroupJoinId>,
}

macro_rules! arena_accessors {
    ($($field:ident: $ty:ty, $id:ident, $get:ident, $get_mut:ident, $push:ident, $count:ident;)*) => {
        impl PlanContext {
            $(
                pub fn $get(&self, id: $id) -> &$ty {
                    &self.$field[id.0]
                }

                pub fn $get_mut(&mut self, id: $id) -> &mut $ty {
                    &mut self.$field[id.0]
                }

                pub(crate) fn $push(&mut self, value: $ty) -> $id {
                    let id = $id(self.$field.len());
                    self.$field.push(value);
                    id
                }

                pub fn $count(&self) -> usize {
                    self.$field.len()
                }
            )*
        }
    };
}

arena_accessors! {
    trees: TableTree, TableTreeId, table_tree, table_tree_mut, push_table_tree, table_tree_count;
    table_nodes: TableNode, TableNodeId, table_node, table_node_mut, push_table_node, table_node_count;
    sources: TableSource, TableSourceId, table_source, table_source_mut, push_table_source, table_source_count;
    groups: TableGroup, TableGroupId, table_group, table_group_mut, push_table_group, table_group_count;
    group_joins: TableGroupJoin, TableGroupJoinId, group_join, group_join_mut, push_group_join, group_join_count;
    fk_joins: TableFKJoin, TableFKJoinId, fk_join, fk_join_mut, push_fk_join, fk_join_count;
    hash_tables: HashTable, HashTableId, hash_table, hash_table_mut, push_hash_table, hash_table_count;
    bloom_filters: BloomFilter, BloomFilterId, bloom_filter, bloom_filter_mut, push_bloom_filter, bloom_filter_count;
}

impl PlanContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            config: config.planner.clone(),
            ..Self::default()
        }
    }

    pub fn planner_config(&self) -> &PlannerConfig {
        &self.config
    }

    /// 规则按名称读取的属性
    pub fn property(&self, name: &str) -> Option<&str> {
        self.config.properties.get(name).map(String::as_str)
    }

    pub fn property_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.property(name).unwrap_or(default)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.config.properties.insert(name.into(), value.into());
    }

    pub(crate) fn register_condition_join(&mut self, condition: ConditionId, join: TableGroupJoinId) {
        self.condition_joins.insert(condition, join);
    }

    /// 条件所属的组连接
    pub fn group_join_for_condition(&self, condition: ConditionId) -> Option<TableGroupJoinId> {
        self.condition_joins.get(&condition).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties() {
        let mut config = Config::default();
        config
            .planner
            .properties
            .insert("bloomFilterMaxSelectivity".to_string(), "0.05".to_string());
        let mut ctx = PlanContext::with_config(&config);

        assert_eq!(ctx.property("bloomFilterMaxSelectivity"), Some("0.05"));
        assert_eq!(ctx.property("missing"), None);
        assert_eq!(ctx.property_or("missing", "1"), "1");

        ctx.set_property("missing", "2");
        assert_eq!(ctx.property("missing"), Some("2"));
    }

    #[test]
    fn test_condition_ids_are_unique() {
        let a = ConditionId::new();
        let b = ConditionId::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("Condition@"));
    }
}
