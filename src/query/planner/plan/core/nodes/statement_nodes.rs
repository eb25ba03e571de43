//! 语句级节点
//!
//! `Ast` 是编译的根，持有绑定后的语句和参数；其下是 `SelectQuery`/`DmlStatement`
//! 等语句节点，最后由 `ResultSet` 给出结果列的名称和类型。

use std::fmt;

use super::plan_node_enum::PlanNodeEnum;
use super::plan_node_traits::PlanNode;
use crate::core::types::expression::ExpressionNode;
use crate::core::types::TInstance;
use crate::define_single_input_node;
use crate::query::planner::plan::core::context::{PlanContext, TableSourceId};
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;

/// 解析器绑定后的语句
///
/// 计划层只需要它的文本用于诊断，其余内容由绑定器解释
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    sql: String,
}

impl BoundStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

define_single_input_node! {
    /// 语句根
    pub struct Ast {
        statement: Option<BoundStatement>,
        parameters: Vec<ExpressionNode>,
    }
}

impl Ast {
    pub fn new(input: PlanNodeEnum, statement: BoundStatement, parameters: Vec<ExpressionNode>) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            statement: Some(statement),
            parameters,
        }
    }

    /// 复制出的 `Ast` 不带语句
    pub fn statement(&self) -> Option<&BoundStatement> {
        self.statement.as_ref()
    }

    pub fn parameters(&self) -> &[ExpressionNode] {
        &self.parameters
    }
}

impl PlanNode for Ast {
    fn details(&self, _ctx: &PlanContext) -> String {
        match &self.statement {
            Some(statement) => statement.sql().to_string(),
            None => String::new(),
        }
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.parameters.iter().collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.parameters.iter_mut().collect()
    }
}

impl Duplicatable for Ast {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            statement: None,
            parameters: self.parameters.duplicate(map),
        }
    }
}

define_single_input_node! {
    /// 查询语句，`conditions` 是 WHERE 子句拆成的合取项
    pub struct SelectQuery {
        conditions: Vec<ExpressionNode>,
    }
}

impl SelectQuery {
    pub fn new(input: PlanNodeEnum, conditions: Vec<ExpressionNode>) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            conditions,
        }
    }

    pub fn conditions(&self) -> &[ExpressionNode] {
        &self.conditions
    }
}

impl PlanNode for SelectQuery {
    fn details(&self, _ctx: &PlanContext) -> String {
        join_expressions(&self.conditions)
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.conditions.iter().collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.conditions.iter_mut().collect()
    }
}

impl Duplicatable for SelectQuery {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            conditions: self.conditions.duplicate(map),
        }
    }
}

/// 数据修改语句的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DmlKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for DmlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DmlKind::Insert => "INSERT",
            DmlKind::Update => "UPDATE",
            DmlKind::Delete => "DELETE",
        };
        write!(f, "{}", name)
    }
}

define_single_input_node! {
    /// 插入、更新、删除，可带 RETURNING
    pub struct DmlStatement {
        kind: DmlKind,
        target: TableSourceId,
        returning: Vec<ExpressionNode>,
    }
}

impl DmlStatement {
    pub fn new(input: PlanNodeEnum, kind: DmlKind, target: TableSourceId) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            kind,
            target,
            returning: Vec::new(),
        }
    }

    pub fn with_returning(mut self, returning: Vec<ExpressionNode>) -> Self {
        self.returning = returning;
        self
    }

    pub fn kind(&self) -> DmlKind {
        self.kind
    }

    pub fn target(&self) -> TableSourceId {
        self.target
    }

    pub fn returning(&self) -> &[ExpressionNode] {
        &self.returning
    }

    pub fn has_returning(&self) -> bool {
        !self.returning.is_empty()
    }
}

impl PlanNode for DmlStatement {
    fn details(&self, ctx: &PlanContext) -> String {
        let mut details = format!("{} {}", self.kind, ctx.table_source_name(self.target));
        if self.has_returning() {
            details.push_str(&format!(" RETURNING {}", join_expressions(&self.returning)));
        }
        details
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        self.returning.iter().collect()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        self.returning.iter_mut().collect()
    }
}

impl Duplicatable for DmlStatement {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            kind: self.kind,
            target: map.table_source(self.target),
            returning: self.returning.duplicate(map),
        }
    }
}

/// 结果列
#[derive(Debug, Clone, PartialEq)]
pub struct ResultField {
    name: String,
    ty: Option<TInstance>,
}

impl ResultField {
    pub fn new(name: impl Into<String>, ty: Option<TInstance>) -> Self {
        Self { name: name.into(), ty }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> Option<&TInstance> {
        self.ty.as_ref()
    }
}

define_single_input_node! {
    /// 结果集形状
    pub struct ResultSet {
        fields: Vec<ResultField>,
    }
}

impl ResultSet {
    pub fn new(input: PlanNodeEnum, fields: Vec<ResultField>) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            fields,
        }
    }

    pub fn fields(&self) -> &[ResultField] {
        &self.fields
    }
}

impl PlanNode for ResultSet {
    fn details(&self, _ctx: &PlanContext) -> String {
        self.fields.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }
}

impl Duplicatable for ResultSet {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            fields: self.fields.clone(),
        }
    }
}

define_single_input_node! {
    /// 子查询根，`n_outer_references` 是引用外层查询的列数
    pub struct Subquery {
        n_outer_references: usize,
    }
}

impl Subquery {
    pub fn new(input: PlanNodeEnum, n_outer_references: usize) -> Self {
        Self {
            id: next_node_id(),
            input: Box::new(input),
            n_outer_references,
        }
    }

    pub fn n_outer_references(&self) -> usize {
        self.n_outer_references
    }

    pub fn is_correlated(&self) -> bool {
        self.n_outer_references > 0
    }
}

impl PlanNode for Subquery {
    fn details(&self, _ctx: &PlanContext) -> String {
        if self.is_correlated() {
            format!("correlated, {} outer", self.n_outer_references)
        } else {
            String::new()
        }
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        vec![&self.input]
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        vec![&mut self.input]
    }
}

impl Duplicatable for Subquery {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            id: map.claim_plan_node_id(self.id),
            input: self.input.duplicate(map),
            n_outer_references: self.n_outer_references,
        }
    }
}

/// 以逗号连接表达式，用于节点摘要
pub(crate) fn join_expressions<'a>(exprs: impl IntoIterator<Item = &'a ExpressionNode>) -> String {
    exprs
        .into_iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::expression::ParameterExpression;
    use crate::query::planner::plan::core::nodes::plan_node_traits::{PlanNodeIdentity, SingleInputNode};
    use crate::query::planner::plan::core::nodes::NullSource;

    #[test]
    fn test_ast_duplicate_drops_statement() {
        let mut ctx = PlanContext::new();
        let ast = Ast::new(
            NullSource::new().into_enum(),
            BoundStatement::new("SELECT 1"),
            vec![ExpressionNode::Parameter(ParameterExpression::new(0, None))],
        );
        assert_eq!(ast.details(&ctx), "SELECT 1");

        let mut map = DuplicateMap::new(&mut ctx);
        let copy = ast.duplicate(&mut map);
        assert!(copy.statement().is_none());
        assert_eq!(copy.parameters().len(), 1);
        assert_ne!(copy.id(), ast.id());
        assert_ne!(copy.input().id(), ast.input().id());
    }

    #[test]
    fn test_set_input_returns_previous() {
        let mut subquery = Subquery::new(NullSource::new().into_enum(), 2);
        let old_input = subquery.input().id();
        let replacement = NullSource::new().into_enum();
        let new_input = replacement.id();

        let previous = subquery.set_input(replacement);
        assert_eq!(previous.id(), old_input);
        assert_eq!(subquery.input().id(), new_input);
        assert!(subquery.is_correlated());
        assert_eq!(subquery.type_name(), "Subquery");
    }
}
