//! 计划节点
//!
//! 所有节点都通过 `define_plan_node!`/`define_single_input_node!` 定义，
//! 统一收进 `PlanNodeEnum`。

#[macro_use]
pub mod macros;

pub mod aggregate_node;
pub mod filter_node;
pub mod join_node;
pub mod loader_nodes;
pub mod lookup_nodes;
pub mod plan_node_cost;
pub mod plan_node_enum;
pub mod plan_node_traits;
pub mod plan_node_visitor;
pub mod project_node;
pub mod set_operations_node;
pub mod sort_node;
pub mod source_nodes;
pub mod statement_nodes;
pub mod table_nodes;

pub use aggregate_node::{
    AggregateField, AggregateImplementation, AggregatePhase, AggregateSource, SplitAggregates,
};
pub use filter_node::Select;
pub use join_node::{JoinImplementation, JoinNode, JoinType, MapJoin};
pub use loader_nodes::{
    BloomFilter, BloomFilterFilter, HashTable, HashTableLookup, UsingBloomFilter, UsingHashTable,
};
pub use lookup_nodes::{AncestorLookup, BranchLookup, Flatten, GroupLoopScan, GroupScan};
pub use plan_node_cost::CostEstimate;
pub use plan_node_enum::{ParentIndex, PlanNodeEnum};
pub use plan_node_traits::{BinaryInputNode, PlanNode, PlanNodeIdentity, SingleInputNode};
pub use plan_node_visitor::PlanVisitor;
pub use project_node::Project;
pub use set_operations_node::{Distinct, DistinctImplementation, Union};
pub use sort_node::{Limit, OrderByExpression, Sort};
pub use source_nodes::{ExpressionsSource, NullSource, SubquerySource};
pub use statement_nodes::{Ast, BoundStatement, DmlKind, DmlStatement, ResultField, ResultSet, SelectQuery, Subquery};
pub use table_nodes::{
    GroupJoinNodeIndex, PreOrderIter, TableGroupJoinNode, TableGroupJoinTree, TableJoins, TableSourceNode,
};
