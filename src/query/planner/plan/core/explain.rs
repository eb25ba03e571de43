//! 计划输出
//!
//! - `PlanToString`：每行一个节点，`Name(details)`，缩进与深度成正比；
//!   表达式里的子查询计划推迟到外层遍历结束后再输出
//! - `DescribeVisitor`：生成可序列化的节点描述，用于 JSON 形式的 explain

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::context::PlanContext;
use super::nodes::plan_node_enum::PlanNodeEnum;
use super::nodes::plan_node_visitor::PlanVisitor;
use crate::core::error::{PlanError, PlanResult};
use crate::core::types::expression::{ExpressionNode, ExpressionVisitor};

/// 计划文本输出
pub struct PlanToString<'a> {
    ctx: &'a PlanContext,
    indent: usize,
    depth: usize,
    out: String,
    pending: VecDeque<i64>,
}

impl<'a> PlanToString<'a> {
    pub fn new(ctx: &'a PlanContext) -> Self {
        Self {
            ctx,
            indent: ctx.planner_config().plan_dump_indent,
            depth: 0,
            out: String::new(),
            pending: VecDeque::new(),
        }
    }

    /// 输出整棵计划，子查询计划依次跟在后面
    pub fn of(root: &PlanNodeEnum, ctx: &'a PlanContext) -> String {
        let mut printer = Self::new(ctx);
        printer.pending.push_back(root.id());
        while let Some(id) = printer.pending.pop_front() {
            // 推迟的子查询都在 root 之下，find 会进入表达式
            if let Some(node) = root.find(id) {
                printer.depth = 0;
                node.accept_with_expressions(&mut printer);
            }
        }
        printer.out
    }

    fn line(&mut self, node: &PlanNodeEnum) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out.push_str(&" ".repeat(self.depth * self.indent));
        self.out.push_str(&node.summary_string(self.ctx));
    }

    fn defer(&mut self, expr: &ExpressionNode) -> bool {
        if let ExpressionNode::Subquery(subquery) = expr {
            self.pending.push_back(subquery.subquery().id());
            return false;
        }
        true
    }
}

impl PlanVisitor for PlanToString<'_> {
    fn visit_enter(&mut self, node: &PlanNodeEnum) -> bool {
        self.line(node);
        self.depth += 1;
        true
    }

    fn visit_leave(&mut self, _node: &PlanNodeEnum) -> bool {
        self.depth = self.depth.saturating_sub(1);
        true
    }

    fn visit(&mut self, node: &PlanNodeEnum) -> bool {
        self.line(node);
        true
    }
}

impl ExpressionVisitor for PlanToString<'_> {
    fn enter_expression(&mut self, expr: &ExpressionNode) -> bool {
        self.defer(expr)
    }

    fn visit_expression(&mut self, expr: &ExpressionNode) -> bool {
        self.defer(expr)
    }
}

impl PlanNodeEnum {
    /// 多行计划文本
    pub fn plan_string(&self, ctx: &PlanContext) -> String {
        PlanToString::of(self, ctx)
    }
}

/// 节点描述键值对
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

impl Pair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// 计划节点描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanNodeDescription {
    pub name: String,
    pub id: i64,
    /// 父节点ID，根节点和子查询根为空
    pub output: Option<i64>,
    pub description: Option<Vec<Pair>>,
    pub dependencies: Option<Vec<i64>>,
}

impl PlanNodeDescription {
    pub fn new(name: impl Into<String>, id: i64) -> Self {
        Self {
            name: name.into(),
            id,
            output: None,
            description: None,
            dependencies: None,
        }
    }

    pub fn with_output(mut self, output: Option<i64>) -> Self {
        self.output = output;
        self
    }

    pub fn add_description(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.description.get_or_insert_with(Vec::new).push(Pair::new(key, value));
    }

    pub fn with_description(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_description(key, value);
        self
    }

    pub fn with_dependencies(mut self, deps: Vec<i64>) -> Self {
        self.dependencies = Some(deps);
        self
    }
}

/// 计划描述
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanDescription {
    pub plan_node_descs: Vec<PlanNodeDescription>,
    pub node_index_map: HashMap<i64, usize>,
}

impl PlanDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// 描述整棵计划（不含子查询）
    pub fn describe(root: &PlanNodeEnum, ctx: &PlanContext) -> Self {
        let mut visitor = DescribeVisitor::new(ctx);
        root.accept(&mut visitor);
        let mut description = Self::new();
        for desc in visitor.into_descriptions() {
            description.add_node_desc(desc);
        }
        description
    }

    pub fn add_node_desc(&mut self, desc: PlanNodeDescription) -> usize {
        let index = self.plan_node_descs.len();
        self.node_index_map.insert(desc.id, index);
        self.plan_node_descs.push(desc);
        index
    }

    pub fn get_node_desc(&self, node_id: i64) -> Option<&PlanNodeDescription> {
        self.node_index_map
            .get(&node_id)
            .and_then(|&index| self.plan_node_descs.get(index))
    }

    pub fn to_json(&self) -> PlanResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PlanError::internal(format!("计划描述序列化失败: {}", e)))
    }
}

/// DescribeVisitor - 计划节点描述访问者
pub struct DescribeVisitor<'a> {
    ctx: &'a PlanContext,
    descriptions: Vec<PlanNodeDescription>,
    stack: Vec<i64>,
}

impl<'a> DescribeVisitor<'a> {
    pub fn new(ctx: &'a PlanContext) -> Self {
        Self {
            ctx,
            descriptions: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn into_descriptions(self) -> Vec<PlanNodeDescription> {
        self.descriptions
    }

    fn create_description(&mut self, node: &PlanNodeEnum) {
        let mut desc = PlanNodeDescription::new(node.name(), node.id()).with_output(self.stack.last().copied());
        let details = node.details(self.ctx);
        if !details.is_empty() {
            desc.add_description("details", details);
        }
        let expressions = node.expressions().len();
        if expressions > 0 {
            desc.add_description("expressions", expressions.to_string());
        }
        let children: Vec<i64> = node.children().iter().map(|c| c.id()).collect();
        if !children.is_empty() {
            desc = desc.with_dependencies(children);
        }
        self.descriptions.push(desc);
    }
}

impl PlanVisitor for DescribeVisitor<'_> {
    fn visit_enter(&mut self, node: &PlanNodeEnum) -> bool {
        self.create_description(node);
        self.stack.push(node.id());
        true
    }

    fn visit_leave(&mut self, _node: &PlanNodeEnum) -> bool {
        self.stack.pop();
        true
    }

    fn visit(&mut self, node: &PlanNodeEnum) -> bool {
        self.create_description(node);
        true
    }
}
