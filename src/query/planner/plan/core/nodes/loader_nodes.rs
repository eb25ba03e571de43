//! 哈希表和布隆过滤器节点
//!
//! `UsingHashTable`/`UsingBloomFilter` 先执行装载侧把行放进共享结构，再执行输入侧；
//! 输入侧中的 `HashTableLookup`/`BloomFilterFilter` 通过同一个 ID 读取这份结构。
//! 哈希表和布隆过滤器本身放在 `PlanContext` 中，复制时按身份共享。

use super::plan_node_enum::PlanNodeEnum;
use super::plan_node_traits::PlanNode;
use super::statement_nodes::join_expressions;
use crate::core::types::expression::ExpressionNode;
use crate::core::types::TInstance;
use crate::define_plan_node;
use crate::define_single_input_node;
use crate::query::planner::plan::core::context::{BloomFilterId, HashTableId, PlanContext, TableSourceId};
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;

/// 连接用哈希表
#[derive(Debug, Clone, PartialEq)]
pub struct HashTable {
    key_types: Vec<Option<TInstance>>,
}

impl HashTable {
    pub fn new(key_types: Vec<Option<TInstance>>) -> Self {
        Self { key_types }
    }

    pub fn key_types(&self) -> &[Option<TInstance>] {
        &self.key_types
    }

    pub fn n_key_columns(&self) -> usize {
        self.key_types.len()
    }
}

/// 布隆过滤器
#[derive(Debug, Clone, PartialEq)]
pub struct BloomFilter {
    estimated_size: u64,
    selectivity: f64,
}

impl BloomFilter {
    pub fn new(estimated_size: u64, selectivity: f64) -> Self {
        Self {
            estimated_size,
            selectivity,
        }
    }

    pub fn estimated_size(&self) -> u64 {
        self.estimated_size
    }

    pub fn selectivity(&self) -> f64 {
        self.selectivity
    }
}

impl PlanContext {
    pub fn new_hash_table(&mut self, table: HashTable) -> HashTableId {
        self.push_hash_table(table)
    }

    pub fn new_bloom_filter(&mut self, filter: BloomFilter) -> BloomFilterId {
        self.push_bloom_filter(filter)
    }
}

define_plan_node! {
    /// 先执行 `loader` 填充哈希表，再执行 `input`
    pub struct UsingHashTable {
        hash_table: HashTableId,
        loader: Box<PlanNodeEnum>,
        input: Box<PlanNodeEnum>,
        key_expressions: Vec<ExpressionNode>,
    }
}

impl UsingHashTable {
    pub fn new(
        hash_table: HashTableId,
        loader: PlanNodeEnum,
        input: PlanNodeEnum,
        key_expressions: Vec<ExpressionNode>,
    ) -> Self {
        Self {
            id: next_node_id(),
            hash_table,
            loader: Box::new(loader),
            input: Box::new(input),
            key_expressions,
        }
    }

    pub fn hash_table(&self) -> HashTableId {
        self.hash_table
    }

    pub fn loader(&self) -> &PlanNodeEnum {
        &self.loader
    }

    pub fn input(&self) -> &PlanNodeEnum {
        &self.input
    }

    /// 装载侧计算哈希键的表达式
    pub fn key_expressions(&self) -> &[ExpressionNode] {
        &self.key_expressions
    }
}

impl PlanNode for UsingHashTable {
    fn details(&self, _ctx: &PlanContext) -> String {
        format!("{}, [{}]", self.hash_table, join_expressions(&self.key_expressions))
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.loader, &self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.loader, &mut self.input]
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.key_expressions.iter().collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.key_expressions.iter_mut().collect()
    }
}

impl Duplicatable for UsingHashTable {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            hash_table: map.hash_table(self.hash_table),
            loader: self.loader.duplicate(map),
            input: self.input.duplicate(map),
            key_expressions: self.key_expressions.duplicate(map),
        }
    }
}

define_plan_node! {
    /// 在输入侧按键读取哈希表
    pub struct HashTableLookup {
        hash_table: HashTableId,
        lookup_expressions: Vec<ExpressionNode>,
        tables: Vec<TableSourceId>,
    }
}

impl HashTableLookup {
    pub fn new(hash_table: HashTableId, lookup_expressions: Vec<ExpressionNode>, tables: Vec<TableSourceId>) -> Self {
        Self {
            id: next_node_id(),
            hash_table,
            lookup_expressions,
            tables,
        }
    }

    pub fn hash_table(&self) -> HashTableId {
        self.hash_table
    }

    pub fn lookup_expressions(&self) -> &[ExpressionNode] {
        &self.lookup_expressions
    }

    /// 哈希表行所属的表来源
    pub fn tables(&self) -> &[TableSourceId] {
        &self.tables
    }
}

impl PlanNode for HashTableLookup {
    fn details(&self, _ctx: &PlanContext) -> String {
        format!("{}, [{}]", self.hash_table, join_expressions(&self.lookup_expressions))
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.lookup_expressions.iter().collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.lookup_expressions.iter_mut().collect()
    }
}

impl Duplicatable for HashTableLookup {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            hash_table: map.hash_table(self.hash_table),
            lookup_expressions: self.lookup_expressions.duplicate(map),
            tables: self.tables.duplicate(map),
        }
    }
}

define_plan_node! {
    /// 先执行 `loader` 填充布隆过滤器，再执行 `input`
    pub struct UsingBloomFilter {
        bloom_filter: BloomFilterId,
        loader: Box<PlanNodeEnum>,
        input: Box<PlanNodeEnum>,
    }
}

impl UsingBloomFilter {
    pub fn new(bloom_filter: BloomFilterId, loader: PlanNodeEnum, input: PlanNodeEnum) -> Self {
        Self {
            id: next_node_id(),
            bloom_filter,
            loader: Box::new(loader),
            input: Box::new(input),
        }
    }

    pub fn bloom_filter(&self) -> BloomFilterId {
        self.bloom_filter
    }

    pub fn loader(&self) -> &PlanNodeEnum {
        &self.loader
    }

    pub fn input(&self) -> &PlanNodeEnum {
        &self.input
    }
}

impl PlanNode for UsingBloomFilter {
    fn details(&self, ctx: &PlanContext) -> String {
        let filter = ctx.bloom_filter(self.bloom_filter);
        format!("{}, size = {}", self.bloom_filter, filter.estimated_size())
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.loader, &self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.loader, &mut self.input]
    }
}

impl Duplicatable for UsingBloomFilter {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            bloom_filter: map.bloom_filter(self.bloom_filter),
            loader: self.loader.duplicate(map),
            input: self.input.duplicate(map),
        }
    }
}

define_single_input_node! {
    /// 用布隆过滤器筛掉不可能匹配的行，通过的行再执行 `check` 确认
    pub struct BloomFilterFilter {
        bloom_filter: BloomFilterId,
        lookup_expressions: Vec<ExpressionNode>,
        check: Box<PlanNodeEnum>,
    }
}

impl BloomFilterFilter {
    pub fn new(
        input: PlanNodeEnum,
        bloom_filter: BloomFilterId,
        lookup_expressions: Vec<ExpressionNode>,
        check: PlanNodeEnum,
    ) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            bloom_filter,
            lookup_expressions,
            check: Box::new(check),
        }
    }

    pub fn bloom_filter(&self) -> BloomFilterId {
        self.bloom_filter
    }

    pub fn lookup_expressions(&self) -> &[ExpressionNode] {
        &self.lookup_expressions
    }

    pub fn check(&self) -> &PlanNodeEnum {
        &self.check
    }
}

impl PlanNode for BloomFilterFilter {
    fn details(&self, _ctx: &PlanContext) -> String {
        format!("{}, [{}]", self.bloom_filter, join_expressions(&self.lookup_expressions))
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input, &self.check]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input, &mut self.check]
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.lookup_expressions.iter().collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.lookup_expressions.iter_mut().collect()
    }
}

impl Duplicatable for BloomFilterFilter {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            bloom_filter: map.bloom_filter(self.bloom_filter),
            lookup_expressions: self.lookup_expressions.duplicate(map),
            check: self.check.duplicate(map),
        }
    }
}
