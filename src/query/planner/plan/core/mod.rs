//! 计划核心：上下文、复制会话、节点与输出

pub mod context;
pub mod duplicate;
pub mod explain;
pub mod node_id_generator;
pub mod nodes;

pub use context::{
    BloomFilterId, ConditionId, HashTableId, PlanContext, TableFKJoinId, TableGroupId, TableGroupJoinId,
    TableNodeId, TableSourceId, TableTreeId,
};
pub use duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
pub use explain::{DescribeVisitor, Pair, PlanDescription, PlanNodeDescription, PlanToString};
pub use node_id_generator::{next_node_id, NodeIdGenerator};
pub use nodes::plan_node_enum::{ParentIndex, PlanNodeEnum};
pub use nodes::plan_node_traits::PlanNode;
pub use nodes::plan_node_visitor::PlanVisitor;
