//! 表达式节点
//!
//! 挂在计划节点上的操作数树。每个表达式只被一个计划节点槽位或另一个表达式拥有。
//! 常量、函数和特殊索引表达式的相等性是结构化的，用于识别公共子表达式。

use std::hash::{Hash, Hasher};

use crate::core::error::{PlanError, PlanResult};
use crate::core::types::{DataType, ResolvedOverload, TInstance, Value};
use crate::query::planner::plan::core::context::{ConditionId, TableSourceId};
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::nodes::plan_node_enum::PlanNodeEnum;

pub mod display;
pub mod traverse;
pub mod visitor;

pub use visitor::{ExpressionRewriteVisitor, ExpressionVisitor, TableSourceCollector};

/// 列的来源：表来源或产生列的计划节点（投影、聚合、子查询来源等）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnSource {
    Table(TableSourceId),
    Node(i64),
}

/// 常量
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstantExpression {
    value: Value,
    ty: TInstance,
}

impl ConstantExpression {
    pub fn new(value: Value, ty: TInstance) -> Self {
        Self { value, ty }
    }

    /// BIGINT 常量
    pub fn long(value: i64) -> Self {
        Self::new(Value::Int(value), TInstance::not_null(DataType::BigInt))
    }

    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        let len = value.chars().count() as u32;
        Self::new(Value::String(value), TInstance::not_null(DataType::Varchar(len)))
    }

    pub fn null(ty: TInstance) -> Self {
        Self::new(Value::Null, ty)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn ty(&self) -> &TInstance {
        &self.ty
    }
}

/// 位置参数
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterExpression {
    position: usize,
    ty: Option<TInstance>,
}

impl ParameterExpression {
    pub fn new(position: usize, ty: Option<TInstance>) -> Self {
        Self { position, ty }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn ty(&self) -> Option<&TInstance> {
        self.ty.as_ref()
    }

    pub fn set_ty(&mut self, ty: TInstance) {
        self.ty = Some(ty);
    }
}

/// 列引用
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnExpression {
    source: ColumnSource,
    position: usize,
    name: String,
    ty: Option<TInstance>,
}

impl ColumnExpression {
    pub fn new(source: ColumnSource, position: usize, name: impl Into<String>, ty: Option<TInstance>) -> Self {
        Self {
            source,
            position,
            name: name.into(),
            ty,
        }
    }

    pub fn table(table: TableSourceId, position: usize, name: impl Into<String>, ty: Option<TInstance>) -> Self {
        Self::new(ColumnSource::Table(table), position, name, ty)
    }

    pub fn source(&self) -> ColumnSource {
        self.source
    }

    pub fn table_source(&self) -> Option<TableSourceId> {
        match self.source {
            ColumnSource::Table(id) => Some(id),
            ColumnSource::Node(_) => None,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> Option<&TInstance> {
        self.ty.as_ref()
    }
}

/// 类型转换
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct CastExpression {
    operand: Box<ExpressionNode>,
    ty: TInstance,
}

impl CastExpression {
    pub fn new(operand: ExpressionNode, ty: TInstance) -> Self {
        Self {
            operand: Box::new(operand),
            ty,
        }
    }

    pub fn operand(&self) -> &ExpressionNode {
        &self.operand
    }

    pub fn ty(&self) -> &TInstance {
        &self.ty
    }
}

/// 标量函数调用
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct FunctionExpression {
    name: String,
    operands: Vec<ExpressionNode>,
    overload: Option<ResolvedOverload>,
    ty: Option<TInstance>,
}

impl FunctionExpression {
    pub fn new(name: impl Into<String>, operands: Vec<ExpressionNode>, ty: Option<TInstance>) -> Self {
        Self {
            name: name.into(),
            operands,
            overload: None,
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operands(&self) -> &[ExpressionNode] {
        &self.operands
    }

    pub fn overload(&self) -> Option<&ResolvedOverload> {
        self.overload.as_ref()
    }

    pub fn set_overload(&mut self, overload: ResolvedOverload) {
        self.ty = Some(overload.result_type().clone());
        self.overload = Some(overload);
    }

    pub fn ty(&self) -> Option<&TInstance> {
        self.ty.as_ref()
    }
}

/// 聚合函数调用
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct AggregateFunctionExpression {
    function: String,
    operand: Option<Box<ExpressionNode>>,
    distinct: bool,
    option: Option<String>,
    overload: Option<ResolvedOverload>,
    ty: Option<TInstance>,
}

impl AggregateFunctionExpression {
    pub fn new(function: impl Into<String>, operand: Option<ExpressionNode>, distinct: bool, ty: Option<TInstance>) -> Self {
        Self {
            function: function.into().to_uppercase(),
            operand: operand.map(Box::new),
            distinct,
            option: None,
            overload: None,
            ty,
        }
    }

    /// 无操作数的 COUNT
    pub fn count_star() -> Self {
        Self::new("COUNT", None, false, Some(TInstance::not_null(DataType::BigInt)))
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.option = Some(option.into());
        self
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn operand(&self) -> Option<&ExpressionNode> {
        self.operand.as_deref()
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn option(&self) -> Option<&str> {
        self.option.as_deref()
    }

    pub fn overload(&self) -> Option<&ResolvedOverload> {
        self.overload.as_ref()
    }

    pub fn set_overload(&mut self, overload: ResolvedOverload) {
        self.overload = Some(overload);
    }

    pub fn ty(&self) -> Option<&TInstance> {
        self.ty.as_ref()
    }

    pub(crate) fn into_parts(self) -> (String, Option<ExpressionNode>, Option<String>, Option<ResolvedOverload>, Option<TInstance>) {
        (self.function, self.operand.map(|b| *b), self.option, self.overload, self.ty)
    }
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    /// 交换左右操作数后的运算符
    pub fn reversed(self) -> Self {
        match self {
            Comparison::Eq => Comparison::Eq,
            Comparison::Ne => Comparison::Ne,
            Comparison::Lt => Comparison::Gt,
            Comparison::Le => Comparison::Ge,
            Comparison::Gt => Comparison::Lt,
            Comparison::Ge => Comparison::Le,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

/// 比较条件的实现方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonImplementation {
    Normal,
    /// 实现组连接的等值条件
    GroupJoin,
    /// 组连接被拒绝后，仍可作为普通等值条件使用
    PotentialGroupJoin,
}

/// 比较条件
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ComparisonCondition {
    id: ConditionId,
    op: Comparison,
    left: Box<ExpressionNode>,
    right: Box<ExpressionNode>,
    implementation: ComparisonImplementation,
}

impl ComparisonCondition {
    pub fn new(op: Comparison, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self {
            id: ConditionId::new(),
            op,
            left: Box::new(left),
            right: Box::new(right),
            implementation: ComparisonImplementation::Normal,
        }
    }

    pub fn id(&self) -> ConditionId {
        self.id
    }

    pub fn op(&self) -> Comparison {
        self.op
    }

    pub fn left(&self) -> &ExpressionNode {
        &self.left
    }

    pub fn right(&self) -> &ExpressionNode {
        &self.right
    }

    /// 条件自身记录的实现方式，组连接标记由 `PlanContext::condition_implementation` 叠加
    pub fn implementation(&self) -> ComparisonImplementation {
        self.implementation
    }

    pub fn set_implementation(&mut self, implementation: ComparisonImplementation) {
        self.implementation = implementation;
    }

    /// 交换左右操作数
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.left, &mut self.right);
        self.op = self.op.reversed();
    }
}

/// 逻辑运算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    Not,
    /// 单操作数的 IS NULL
    IsNull,
}

/// 逻辑条件
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct LogicalFunctionCondition {
    op: LogicalOp,
    operands: Vec<ExpressionNode>,
}

impl LogicalFunctionCondition {
    pub fn new(op: LogicalOp, operands: Vec<ExpressionNode>) -> Self {
        Self { op, operands }
    }

    pub fn op(&self) -> LogicalOp {
        self.op
    }

    pub fn operands(&self) -> &[ExpressionNode] {
        &self.operands
    }
}

/// IN 列表条件
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct InListCondition {
    operand: Box<ExpressionNode>,
    list: Vec<ExpressionNode>,
}

impl InListCondition {
    pub fn new(operand: ExpressionNode, list: Vec<ExpressionNode>) -> Self {
        Self {
            operand: Box::new(operand),
            list,
        }
    }

    pub fn operand(&self) -> &ExpressionNode {
        &self.operand
    }

    pub fn list(&self) -> &[ExpressionNode] {
        &self.list
    }
}

/// 子查询表达式的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubqueryKind {
    /// 标量子查询
    Value,
    Exists,
    Any,
}

/// 子查询表达式
///
/// 相等性按子查询计划的节点ID判断
#[derive(Debug)]
pub struct SubqueryExpression {
    kind: SubqueryKind,
    subquery: Box<PlanNodeEnum>,
    ty: Option<TInstance>,
}

impl SubqueryExpression {
    pub fn new(kind: SubqueryKind, subquery: PlanNodeEnum, ty: Option<TInstance>) -> Self {
        Self {
            kind,
            subquery: Box::new(subquery),
            ty,
        }
    }

    pub fn kind(&self) -> SubqueryKind {
        self.kind
    }

    pub fn subquery(&self) -> &PlanNodeEnum {
        &self.subquery
    }

    pub fn subquery_mut(&mut self) -> &mut PlanNodeEnum {
        &mut self.subquery
    }

    pub fn ty(&self) -> Option<&TInstance> {
        self.ty.as_ref()
    }
}

impl PartialEq for SubqueryExpression {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.subquery.id() == other.subquery.id()
    }
}

impl Eq for SubqueryExpression {}

impl Hash for SubqueryExpression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.subquery.id().hash(state);
    }
}

/// 特殊索引函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialIndexFunction {
    FullTextMatch,
    GeoContains,
    GeoOverlaps,
}

impl SpecialIndexFunction {
    pub fn name(&self) -> &'static str {
        match self {
            SpecialIndexFunction::FullTextMatch => "FULL_TEXT_MATCH",
            SpecialIndexFunction::GeoContains => "GEO_CONTAINS",
            SpecialIndexFunction::GeoOverlaps => "GEO_OVERLAPS",
        }
    }
}

/// 全文/空间索引表达式
///
/// 只用于索引选择，由专门的索引服务消耗，不能在计划期求值
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SpecialIndexExpression {
    function: SpecialIndexFunction,
    operands: Vec<ExpressionNode>,
}

impl SpecialIndexExpression {
    pub fn new(function: SpecialIndexFunction, operands: Vec<ExpressionNode>) -> Self {
        Self { function, operands }
    }

    pub fn function(&self) -> SpecialIndexFunction {
        self.function
    }

    pub fn operands(&self) -> &[ExpressionNode] {
        &self.operands
    }
}

/// 表达式节点
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum ExpressionNode {
    Constant(ConstantExpression),
    Parameter(ParameterExpression),
    Column(ColumnExpression),
    Cast(CastExpression),
    Function(FunctionExpression),
    Aggregate(AggregateFunctionExpression),
    Comparison(ComparisonCondition),
    Logical(LogicalFunctionCondition),
    InList(InListCondition),
    Subquery(SubqueryExpression),
    SpecialIndex(SpecialIndexExpression),
}

impl ExpressionNode {
    pub fn constant(value: Value, ty: TInstance) -> Self {
        ExpressionNode::Constant(ConstantExpression::new(value, ty))
    }

    pub fn column(source: ColumnSource, position: usize, name: impl Into<String>, ty: Option<TInstance>) -> Self {
        ExpressionNode::Column(ColumnExpression::new(source, position, name, ty))
    }

    pub fn comparison(op: Comparison, left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::Comparison(ComparisonCondition::new(op, left, right))
    }

    pub fn and(operands: Vec<ExpressionNode>) -> Self {
        ExpressionNode::Logical(LogicalFunctionCondition::new(LogicalOp::And, operands))
    }

    /// 用于 `mem::replace` 的占位表达式
    pub(crate) fn placeholder() -> Self {
        ExpressionNode::Constant(ConstantExpression::null(TInstance::nullable(DataType::Null)))
    }

    /// 表达式的类型实例
    pub fn ty(&self) -> Option<&TInstance> {
        match self {
            ExpressionNode::Constant(c) => Some(c.ty()),
            ExpressionNode::Parameter(p) => p.ty(),
            ExpressionNode::Column(c) => c.ty(),
            ExpressionNode::Cast(c) => Some(c.ty()),
            ExpressionNode::Function(f) => f.ty(),
            ExpressionNode::Aggregate(a) => a.ty(),
            ExpressionNode::Subquery(s) => s.ty(),
            ExpressionNode::Comparison(_)
            | ExpressionNode::Logical(_)
            | ExpressionNode::InList(_)
            | ExpressionNode::SpecialIndex(_) => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, ExpressionNode::Constant(_))
    }

    pub fn is_column(&self) -> bool {
        matches!(self, ExpressionNode::Column(_))
    }

    /// 是否为布尔条件
    pub fn is_condition(&self) -> bool {
        matches!(
            self,
            ExpressionNode::Comparison(_)
                | ExpressionNode::Logical(_)
                | ExpressionNode::InList(_)
                | ExpressionNode::SpecialIndex(_)
        ) || matches!(self, ExpressionNode::Subquery(s) if s.kind() != SubqueryKind::Value)
    }

    pub fn as_column(&self) -> Option<&ColumnExpression> {
        match self {
            ExpressionNode::Column(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_comparison(&self) -> Option<&ComparisonCondition> {
        match self {
            ExpressionNode::Comparison(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_comparison_mut(&mut self) -> Option<&mut ComparisonCondition> {
        match self {
            ExpressionNode::Comparison(c) => Some(c),
            _ => None,
        }
    }

    pub fn condition_id(&self) -> Option<ConditionId> {
        self.as_comparison().map(|c| c.id())
    }

    /// 在计划期对常量表达式求值
    ///
    /// 非常量返回 `Ok(None)`；全文/空间索引表达式到达这里说明没有被索引选择消耗，报告为不支持
    pub fn evaluate_constant(&self) -> PlanResult<Option<Value>> {
        match self {
            ExpressionNode::Constant(c) => Ok(Some(c.value().clone())),
            ExpressionNode::Cast(cast) => match cast.operand().evaluate_constant()? {
                Some(value) => Ok(Some(value.cast_to(cast.ty().data_type())?)),
                None => Ok(None),
            },
            ExpressionNode::SpecialIndex(special) => Err(PlanError::unsupported(format!(
                "{} 只能用于索引选择，不能直接求值",
                special.function().name()
            ))),
            _ => {
                for operand in self.children() {
                    operand.evaluate_constant()?;
                }
                Ok(None)
            }
        }
    }
}

impl From<ConstantExpression> for ExpressionNode {
    fn from(expr: ConstantExpression) -> Self {
        ExpressionNode::Constant(expr)
    }
}

impl From<ColumnExpression> for ExpressionNode {
    fn from(expr: ColumnExpression) -> Self {
        ExpressionNode::Column(expr)
    }
}

impl From<AggregateFunctionExpression> for ExpressionNode {
    fn from(expr: AggregateFunctionExpression) -> Self {
        ExpressionNode::Aggregate(expr)
    }
}

impl From<ComparisonCondition> for ExpressionNode {
    fn from(expr: ComparisonCondition) -> Self {
        ExpressionNode::Comparison(expr)
    }
}

fn duplicate_all(exprs: &[ExpressionNode], map: &mut DuplicateMap<'_>) -> Vec<ExpressionNode> {
    exprs.iter().map(|e| e.duplicate(map)).collect()
}

impl Duplicatable for ExpressionNode {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        match self {
            ExpressionNode::Constant(c) => ExpressionNode::Constant(c.clone()),
            ExpressionNode::Parameter(p) => ExpressionNode::Parameter(p.clone()),
            ExpressionNode::Column(c) => {
                let source = match c.source {
                    ColumnSource::Table(id) => ColumnSource::Table(map.table_source(id)),
                    ColumnSource::Node(id) => ColumnSource::Node(map.plan_node_id(id)),
                };
                ExpressionNode::Column(ColumnExpression {
                    source,
                    position: c.position,
                    name: c.name.clone(),
                    ty: c.ty.clone(),
                })
            }
            ExpressionNode::Cast(c) => ExpressionNode::Cast(CastExpression {
                operand: c.operand.duplicate(map),
                ty: c.ty.clone(),
            }),
            ExpressionNode::Function(f) => ExpressionNode::Function(FunctionExpression {
                name: f.name.clone(),
                operands: duplicate_all(&f.operands, map),
                overload: f.overload.clone(),
                ty: f.ty.clone(),
            }),
            ExpressionNode::Aggregate(a) => ExpressionNode::Aggregate(a.duplicate(map)),
            ExpressionNode::Comparison(c) => ExpressionNode::Comparison(ComparisonCondition {
                id: map.condition_id(c.id),
                op: c.op,
                left: c.left.duplicate(map),
                right: c.right.duplicate(map),
                implementation: c.implementation,
            }),
            ExpressionNode::Logical(l) => ExpressionNode::Logical(LogicalFunctionCondition {
                op: l.op,
                operands: duplicate_all(&l.operands, map),
            }),
            ExpressionNode::InList(i) => ExpressionNode::InList(InListCondition {
                operand: i.operand.duplicate(map),
                list: duplicate_all(&i.list, map),
            }),
            ExpressionNode::Subquery(s) => ExpressionNode::Subquery(SubqueryExpression {
                kind: s.kind,
                subquery: s.subquery.duplicate(map),
                ty: s.ty.clone(),
            }),
            ExpressionNode::SpecialIndex(s) => ExpressionNode::SpecialIndex(SpecialIndexExpression {
                function: s.function,
                operands: duplicate_all(&s.operands, map),
            }),
        }
    }
}

impl Duplicatable for AggregateFunctionExpression {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            function: self.function.clone(),
            operand: self.operand.as_ref().map(|o| o.duplicate(map)),
            distinct: self.distinct,
            option: self.option.clone(),
            overload: self.overload.clone(),
            ty: self.ty.clone(),
        }
    }
}
