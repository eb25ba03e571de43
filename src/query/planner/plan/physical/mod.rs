//! 物理计划边界
//!
//! 选定访问路径后，计划被交给执行层编译成物理算子。这里只保存执行层需要的元数据：
//! 参数类型、结果形状、代价估算和受影响的表。算子本身对计划层不透明，只提供 explain 输出。

use std::fmt;
use std::sync::Arc;

use crate::catalog::CatalogTable;
use crate::core::error::{PlanError, PlanResult};
use crate::core::types::{DataType, TInstance};
use crate::query::planner::plan::core::nodes::plan_node_cost::CostEstimate;
use crate::query::planner::plan::core::nodes::statement_nodes::ResultField;

/// 执行层提供的物理算子
pub trait PhysicalOperator: fmt::Debug {
    /// 算子名称
    fn name(&self) -> &str;

    /// 算子自己的 explain 输出，每个元素一行
    fn explain(&self) -> Result<Vec<String>, String>;
}

/// 位置参数的类型
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterType {
    sql_type: DataType,
    instance: Option<TInstance>,
}

impl ParameterType {
    pub fn new(sql_type: DataType, instance: Option<TInstance>) -> Self {
        Self { sql_type, instance }
    }

    pub fn sql_type(&self) -> &DataType {
        &self.sql_type
    }

    /// 类型库实例化后的类型，参数类型未能推断时为空
    pub fn instance(&self) -> Option<&TInstance> {
        self.instance.as_ref()
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(instance) => write!(f, "{}", instance),
            None => write!(f, "{}", self.sql_type),
        }
    }
}

/// 计划与物理算子的绑定
#[derive(Debug, Clone)]
pub struct BasePlannable {
    operator: Arc<dyn PhysicalOperator>,
    parameter_types: Vec<ParameterType>,
    result_fields: Vec<ResultField>,
    cost_estimate: Option<CostEstimate>,
    affected_tables: Vec<Arc<CatalogTable>>,
}

impl BasePlannable {
    pub fn new(operator: Arc<dyn PhysicalOperator>, parameter_types: Vec<ParameterType>) -> Self {
        Self {
            operator,
            parameter_types,
            result_fields: Vec::new(),
            cost_estimate: None,
            affected_tables: Vec::new(),
        }
    }

    pub fn with_result_fields(mut self, fields: Vec<ResultField>) -> Self {
        self.result_fields = fields;
        self
    }

    pub fn with_cost_estimate(mut self, cost: CostEstimate) -> Self {
        self.cost_estimate = Some(cost);
        self
    }

    pub fn operator(&self) -> &Arc<dyn PhysicalOperator> {
        &self.operator
    }

    pub fn parameter_types(&self) -> &[ParameterType] {
        &self.parameter_types
    }

    pub fn result_fields(&self) -> &[ResultField] {
        &self.result_fields
    }

    pub fn cost_estimate(&self) -> Option<&CostEstimate> {
        self.cost_estimate.as_ref()
    }

    /// 语句读写的表，执行层据此做缓存失效和加锁
    pub fn affected_tables(&self) -> &[Arc<CatalogTable>] {
        &self.affected_tables
    }

    pub fn add_affected_table(&mut self, table: Arc<CatalogTable>) {
        if !self.affected_tables.iter().any(|t| t.table_id() == table.table_id()) {
            self.affected_tables.push(table);
        }
    }

    fn details(&self) -> String {
        let mut parts = Vec::new();
        if !self.parameter_types.is_empty() {
            let params: Vec<String> = self.parameter_types.iter().map(ToString::to_string).collect();
            parts.push(format!("params = [{}]", params.join(", ")));
        }
        if !self.result_fields.is_empty() {
            let fields: Vec<&str> = self.result_fields.iter().map(ResultField::name).collect();
            parts.push(format!("fields = [{}]", fields.join(", ")));
        }
        if let Some(cost) = &self.cost_estimate {
            parts.push(cost.to_string());
        }
        parts.join(", ")
    }

    fn explain_lines(&self) -> PlanResult<Vec<String>> {
        self.operator.explain().map_err(|e| {
            PlanError::Collaborator(format!("物理算子 {} explain 失败: {}", self.operator.name(), e))
        })
    }
}

/// 绑定完成的语句
pub trait Plannable {
    fn base(&self) -> &BasePlannable;

    fn is_update(&self) -> bool;

    /// `Name(details)` 形式的单行摘要
    fn summary_string(&self) -> String;

    /// 自身摘要加上物理算子的 explain 输出，算子的行缩进两格
    fn explain_to_string(&self) -> PlanResult<String> {
        let mut out = self.summary_string();
        for line in self.base().explain_lines()? {
            out.push_str("\n  ");
            out.push_str(&line);
        }
        Ok(out)
    }
}

/// 查询语句
#[derive(Debug, Clone)]
pub struct PhysicalSelect {
    base: BasePlannable,
}

impl PhysicalSelect {
    pub fn new(base: BasePlannable) -> Self {
        Self { base }
    }

    pub fn base_mut(&mut self) -> &mut BasePlannable {
        &mut self.base
    }
}

impl Plannable for PhysicalSelect {
    fn base(&self) -> &BasePlannable {
        &self.base
    }

    fn is_update(&self) -> bool {
        false
    }

    fn summary_string(&self) -> String {
        format!("PhysicalSelect({})", self.base.details())
    }
}

/// 数据修改语句
#[derive(Debug, Clone)]
pub struct PhysicalUpdate {
    base: BasePlannable,
    returning: bool,
    put_in_cache: bool,
}

impl PhysicalUpdate {
    pub fn new(base: BasePlannable, returning: bool, put_in_cache: bool) -> Self {
        Self {
            base,
            returning,
            put_in_cache,
        }
    }

    pub fn base_mut(&mut self) -> &mut BasePlannable {
        &mut self.base
    }

    /// 是否带 RETURNING 输出
    pub fn is_returning(&self) -> bool {
        self.returning
    }

    /// 语句结果是否可以放进缓存
    pub fn put_in_cache(&self) -> bool {
        self.put_in_cache
    }
}

impl Plannable for PhysicalUpdate {
    fn base(&self) -> &BasePlannable {
        &self.base
    }

    fn is_update(&self) -> bool {
        true
    }

    fn summary_string(&self) -> String {
        let mut details = self.base.details();
        if self.returning {
            if !details.is_empty() {
                details.push_str(", ");
            }
            details.push_str("RETURNING");
        }
        format!("PhysicalUpdate({})", details)
    }
}
