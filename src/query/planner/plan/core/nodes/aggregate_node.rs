//! 聚合节点实现
//!
//! AggregateSource 分三个阶段：
//! - `Bare`：只有分组表达式
//! - `Resolved`：聚合函数已登记，字段位置为 `n_group_by + 聚合序号`，只追加不重排
//! - `Split`：分组表达式和聚合操作数被拆到下层的 Project，本节点只保留函数名和重载
//!
//! 拆分是单向的，拆分之后读取分组表达式或聚合表达式属于内部错误。

use std::fmt;

use super::plan_node_enum::PlanNodeEnum;
use super::plan_node_traits::PlanNode;
use super::statement_nodes::join_expressions;
use crate::core::error::{PlanError, PlanResult};
use crate::core::types::expression::{AggregateFunctionExpression, ExpressionNode};
use crate::core::types::{DataType, ResolvedOverload, TInstance, Value};
use crate::define_single_input_node;
use crate::query::planner::plan::core::context::{PlanContext, TableSourceId};
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;

/// 聚合的实现方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateImplementation {
    Presorted,
    PreaggregateResort,
    Sort,
    Hash,
    Tree,
    /// 没有分组表达式
    Ungrouped,
    CountStar,
    /// 直接读取表的行数统计
    CountTableStatus,
    FirstFromIndex,
}

impl fmt::Display for AggregateImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateImplementation::Presorted => "PRESORTED",
            AggregateImplementation::PreaggregateResort => "PREAGGREGATE_RESORT",
            AggregateImplementation::Sort => "SORT",
            AggregateImplementation::Hash => "HASH",
            AggregateImplementation::Tree => "TREE",
            AggregateImplementation::Ungrouped => "UNGROUPED",
            AggregateImplementation::CountStar => "COUNT_STAR",
            AggregateImplementation::CountTableStatus => "COUNT_TABLE_STATUS",
            AggregateImplementation::FirstFromIndex => "FIRST_FROM_INDEX",
        };
        write!(f, "{}", name)
    }
}

/// 聚合阶段
#[derive(Debug)]
pub enum AggregatePhase {
    Bare {
        group_by: Vec<ExpressionNode>,
    },
    Resolved {
        group_by: Vec<ExpressionNode>,
        /// 每一项都是 `ExpressionNode::Aggregate`
        aggregates: Vec<ExpressionNode>,
    },
    Split(SplitAggregates),
}

/// 拆分后保留的聚合信息
#[derive(Debug, Clone, PartialEq)]
pub struct SplitAggregates {
    n_group_by: usize,
    aggregate_functions: Vec<String>,
    resolved_functions: Vec<Option<ResolvedOverload>>,
    options: Vec<Option<String>>,
}

impl SplitAggregates {
    pub fn n_group_by(&self) -> usize {
        self.n_group_by
    }

    pub fn aggregate_functions(&self) -> &[String] {
        &self.aggregate_functions
    }

    pub fn resolved_functions(&self) -> &[Option<ResolvedOverload>] {
        &self.resolved_functions
    }

    pub fn options(&self) -> &[Option<String>] {
        &self.options
    }
}

/// 按位置读取的字段
#[derive(Debug, Clone, Copy)]
pub enum AggregateField<'a> {
    GroupBy(&'a ExpressionNode),
    Aggregate(&'a AggregateFunctionExpression),
}

define_single_input_node! {
    pub struct AggregateSource {
        phase: AggregatePhase,
        implementation: Option<AggregateImplementation>,
        table: Option<TableSourceId>,
    }
}

impl AggregateSource {
    /// 创建新的聚合节点，没有分组表达式时实现方式为 UNGROUPED
    pub fn new(input: PlanNodeEnum, group_by: Vec<ExpressionNode>) -> Self {
        let implementation = if group_by.is_empty() {
            Some(AggregateImplementation::Ungrouped)
        } else {
            None
        };
        Self {
            id: next_node_id(),
            input: Box::new(input),
            phase: AggregatePhase::Bare { group_by },
            implementation,
            table: None,
        }
    }

    pub fn phase(&self) -> &AggregatePhase {
        &self.phase
    }

    pub fn is_split(&self) -> bool {
        matches!(self.phase, AggregatePhase::Split(_))
    }

    pub fn n_group_by(&self) -> usize {
        match &self.phase {
            AggregatePhase::Bare { group_by } | AggregatePhase::Resolved { group_by, .. } => group_by.len(),
            AggregatePhase::Split(split) => split.n_group_by,
        }
    }

    pub fn n_aggregates(&self) -> usize {
        match &self.phase {
            AggregatePhase::Bare { .. } => 0,
            AggregatePhase::Resolved { aggregates, .. } => aggregates.len(),
            AggregatePhase::Split(split) => split.aggregate_functions.len(),
        }
    }

    pub fn n_fields(&self) -> usize {
        self.n_group_by() + self.n_aggregates()
    }

    pub fn has_group_by(&self) -> bool {
        self.n_group_by() > 0
    }

    /// 分组表达式，拆分之后不可用
    pub fn group_by(&self) -> PlanResult<&[ExpressionNode]> {
        match &self.phase {
            AggregatePhase::Bare { group_by } | AggregatePhase::Resolved { group_by, .. } => Ok(group_by),
            AggregatePhase::Split(_) => Err(split_error(self.id, "分组表达式")),
        }
    }

    /// 聚合表达式，拆分之后不可用
    pub fn aggregates(&self) -> PlanResult<&[ExpressionNode]> {
        match &self.phase {
            AggregatePhase::Bare { .. } => Ok(&[]),
            AggregatePhase::Resolved { aggregates, .. } => Ok(aggregates),
            AggregatePhase::Split(_) => Err(split_error(self.id, "聚合表达式")),
        }
    }

    /// 追加分组表达式，只能在登记聚合函数之前调用
    pub fn add_group_by(&mut self, expr: ExpressionNode) -> PlanResult<usize> {
        match &mut self.phase {
            AggregatePhase::Bare { group_by } => {
                group_by.push(expr);
                if self.implementation == Some(AggregateImplementation::Ungrouped) {
                    self.implementation = None;
                }
                Ok(group_by.len() - 1)
            }
            AggregatePhase::Resolved { .. } => Err(PlanError::internal(format!(
                "AggregateSource@{} 已登记聚合函数，不能再追加分组表达式",
                self.id
            ))),
            AggregatePhase::Split(_) => Err(split_error(self.id, "分组表达式")),
        }
    }

    /// 登记聚合函数，返回它的字段位置
    pub fn add_aggregate(&mut self, expr: AggregateFunctionExpression) -> PlanResult<usize> {
        let phase = std::mem::replace(&mut self.phase, AggregatePhase::Bare { group_by: Vec::new() });
        let (group_by, mut aggregates) = match phase {
            AggregatePhase::Bare { group_by } => (group_by, Vec::new()),
            AggregatePhase::Resolved { group_by, aggregates } => (group_by, aggregates),
            split @ AggregatePhase::Split(_) => {
                self.phase = split;
                return Err(split_error(self.id, "聚合函数"));
            }
        };
        let position = group_by.len() + aggregates.len();
        aggregates.push(ExpressionNode::Aggregate(expr));
        self.phase = AggregatePhase::Resolved { group_by, aggregates };
        Ok(position)
    }

    /// 是否已登记结构相同的聚合函数
    pub fn has_aggregate(&self, expr: &AggregateFunctionExpression) -> bool {
        self.position_of(expr).is_some()
    }

    /// 已登记聚合函数的字段位置
    pub fn position_of(&self, expr: &AggregateFunctionExpression) -> Option<usize> {
        match &self.phase {
            AggregatePhase::Resolved { group_by, aggregates } => aggregates
                .iter()
                .position(|a| matches!(a, ExpressionNode::Aggregate(existing) if existing == expr))
                .map(|i| group_by.len() + i),
            _ => None,
        }
    }

    /// 按位置读取字段
    pub fn field(&self, position: usize) -> PlanResult<AggregateField<'_>> {
        let group_by = self.group_by()?;
        if let Some(expr) = group_by.get(position) {
            return Ok(AggregateField::GroupBy(expr));
        }
        match self.aggregates()?.get(position - group_by.len()) {
            Some(ExpressionNode::Aggregate(aggregate)) => Ok(AggregateField::Aggregate(aggregate)),
            _ => Err(PlanError::internal(format!(
                "AggregateSource@{} 没有第 {} 个字段",
                self.id, position
            ))),
        }
    }

    /// 聚合选项，与聚合函数一一对应
    pub fn options(&self) -> Vec<Option<&str>> {
        match &self.phase {
            AggregatePhase::Bare { .. } => Vec::new(),
            AggregatePhase::Resolved { aggregates, .. } => aggregates
                .iter()
                .map(|a| match a {
                    ExpressionNode::Aggregate(a) => a.option(),
                    _ => None,
                })
                .collect(),
            AggregatePhase::Split(split) => split.options.iter().map(|o| o.as_deref()).collect(),
        }
    }

    /// 拆分后的信息
    pub fn split(&self) -> PlanResult<&SplitAggregates> {
        match &self.phase {
            AggregatePhase::Split(split) => Ok(split),
            _ => Err(PlanError::internal(format!("AggregateSource@{} 尚未拆分", self.id))),
        }
    }

    pub fn aggregate_functions(&self) -> PlanResult<&[String]> {
        Ok(self.split()?.aggregate_functions())
    }

    pub fn resolved_functions(&self) -> PlanResult<&[Option<ResolvedOverload>]> {
        Ok(self.split()?.resolved_functions())
    }

    /// 拆出下层 Project 需要的表达式：分组表达式在前，聚合操作数在后
    ///
    /// 没有操作数的聚合使用类型为聚合结果类型的常量 1，COUNT 因此变为 `COUNT(*)`
    pub fn split_off_project(&mut self) -> PlanResult<Vec<ExpressionNode>> {
        let phase = std::mem::replace(&mut self.phase, AggregatePhase::Bare { group_by: Vec::new() });
        let (group_by, aggregates) = match phase {
            AggregatePhase::Bare { group_by } => (group_by, Vec::new()),
            AggregatePhase::Resolved { group_by, aggregates } => (group_by, aggregates),
            split @ AggregatePhase::Split(_) => {
                self.phase = split;
                return Err(PlanError::internal(format!("AggregateSource@{} 已经拆分", self.id)));
            }
        };

        let n_group_by = group_by.len();
        let mut fields = group_by;
        let mut aggregate_functions = Vec::with_capacity(aggregates.len());
        let mut resolved_functions = Vec::with_capacity(aggregates.len());
        let mut options = Vec::with_capacity(aggregates.len());
        for aggregate in aggregates {
            let ExpressionNode::Aggregate(aggregate) = aggregate else {
                return Err(PlanError::internal(format!(
                    "AggregateSource@{} 的聚合字段不是聚合函数",
                    self.id
                )));
            };
            let (mut function, operand, option, overload, ty) = aggregate.into_parts();
            let operand = match operand {
                Some(operand) => operand,
                None => {
                    if function == "COUNT" {
                        function = "COUNT(*)".to_string();
                    }
                    // 常量取聚合的结果类型，类型未解析时用 BIGINT
                    let ty = ty.unwrap_or_else(|| TInstance::not_null(DataType::BigInt));
                    ExpressionNode::constant(Value::Int(1), ty)
                }
            };
            fields.push(operand);
            aggregate_functions.push(function);
            resolved_functions.push(overload);
            options.push(option);
        }

        log::debug!(
            "拆分 AggregateSource@{}: {} 个分组表达式, 聚合函数 {:?}",
            self.id,
            n_group_by,
            aggregate_functions
        );
        self.phase = AggregatePhase::Split(SplitAggregates {
            n_group_by,
            aggregate_functions,
            resolved_functions,
            options,
        });
        Ok(fields)
    }

    pub fn implementation(&self) -> Option<AggregateImplementation> {
        self.implementation
    }

    pub fn set_implementation(&mut self, implementation: AggregateImplementation) {
        self.implementation = Some(implementation);
    }

    /// COUNT_TABLE_STATUS 读取行数统计的表
    pub fn table(&self) -> PlanResult<Option<TableSourceId>> {
        self.require_table_status()?;
        Ok(self.table)
    }

    pub fn set_table(&mut self, table: TableSourceId) -> PlanResult<()> {
        self.require_table_status()?;
        self.table = Some(table);
        Ok(())
    }

    fn require_table_status(&self) -> PlanResult<()> {
        if self.implementation == Some(AggregateImplementation::CountTableStatus) {
            Ok(())
        } else {
            Err(PlanError::internal(format!(
                "AggregateSource@{} 的实现方式不是 COUNT_TABLE_STATUS",
                self.id
            )))
        }
    }
}

fn split_error(id: i64, what: &str) -> PlanError {
    PlanError::internal(format!("AggregateSource@{} 已经拆分，不能访问{}", id, what))
}

impl PlanNode for AggregateSource {
    fn details(&self, ctx: &PlanContext) -> String {
        let mut parts = Vec::new();
        if let Some(implementation) = self.implementation {
            parts.push(implementation.to_string());
        }
        match &self.phase {
            AggregatePhase::Bare { group_by } | AggregatePhase::Resolved { group_by, .. } => {
                if !group_by.is_empty() {
                    parts.push(format!("GROUP BY[{}]", join_expressions(group_by)));
                }
            }
            AggregatePhase::Split(split) => {
                if split.n_group_by > 0 {
                    parts.push(format!("GROUP BY {}", split.n_group_by));
                }
            }
        }
        match &self.phase {
            AggregatePhase::Bare { .. } => {}
            AggregatePhase::Resolved { aggregates, .. } => parts.extend(aggregates.iter().map(|a| a.to_string())),
            AggregatePhase::Split(split) => parts.extend(split.aggregate_functions.iter().cloned()),
        }
        if let Some(table) = self.table {
            parts.push(ctx.table_source_name(table).to_string());
        }
        parts.join(", ")
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        match &self.phase {
            AggregatePhase::Bare { group_by } => group_by.iter().collect(),
            AggregatePhase::Resolved { group_by, aggregates } => group_by.iter().chain(aggregates.iter()).collect(),
            AggregatePhase::Split(_) => Vec::new(),
        }
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        match &mut self.phase {
            AggregatePhase::Bare { group_by } => group_by.iter_mut().collect(),
            AggregatePhase::Resolved { group_by, aggregates } => {
                group_by.iter_mut().chain(aggregates.iter_mut()).collect()
            }
            AggregatePhase::Split(_) => Vec::new(),
        }
    }
}

impl Duplicatable for AggregateSource {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        let phase = match &self.phase {
            AggregatePhase::Bare { group_by } => AggregatePhase::Bare {
                group_by: group_by.duplicate(map),
            },
            AggregatePhase::Resolved { group_by, aggregates } => AggregatePhase::Resolved {
                group_by: group_by.duplicate(map),
                aggregates: aggregates.duplicate(map),
            },
            AggregatePhase::Split(split) => AggregatePhase::Split(split.clone()),
        };
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            phase,
            implementation: self.implementation,
            table: self.table.duplicate(map),
        }
    }
}
