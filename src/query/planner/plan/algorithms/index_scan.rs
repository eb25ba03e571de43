//! 索引扫描计划节点
//!
//! `IndexScan` 描述一条索引访问路径：单索引扫描，或者两个索引扫描按公共前缀求交。
//! 规则填写比较值和代价后由驱动程序比较候选方案。

use std::fmt;
use std::sync::Arc;

use crate::catalog::{CatalogIndex, CatalogTable};
use crate::core::error::{PlanError, PlanResult};
use crate::core::types::expression::ExpressionNode;
use crate::define_plan_node;
use crate::query::planner::plan::core::context::{ConditionId, PlanContext, TableSourceId};
use crate::query::planner::plan::core::duplicate::{Duplicatable, DuplicateMap, DuplicationStrategy};
use crate::query::planner::plan::core::node_id_generator::next_node_id;
use crate::query::planner::plan::core::nodes::plan_node_cost::CostEstimate;
use crate::query::planner::plan::core::nodes::plan_node_traits::PlanNode;
use crate::query::planner::plan::core::nodes::sort_node::OrderByExpression;
use crate::query::planner::plan::core::nodes::statement_nodes::join_expressions;

/// 扫描的自然顺序对所需顺序的满足程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum OrderEffectiveness {
    #[default]
    None,
    PartialGrouped,
    Grouped,
    Sorted,
    ForMinMax,
}

impl fmt::Display for OrderEffectiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderEffectiveness::None => "NONE",
            OrderEffectiveness::PartialGrouped => "PARTIAL_GROUPED",
            OrderEffectiveness::Grouped => "GROUPED",
            OrderEffectiveness::Sorted => "SORTED",
            OrderEffectiveness::ForMinMax => "FOR_MIN_MAX",
        };
        write!(f, "{}", name)
    }
}

/// 查询对行顺序的要求
#[derive(Debug, Clone, Copy)]
pub enum RequiredOrder<'a> {
    OrderBy(&'a [OrderByExpression]),
    GroupBy(&'a [ExpressionNode]),
    Distinct(&'a [ExpressionNode]),
    /// 无分组的 MIN/MAX 的操作数
    MinMax(&'a ExpressionNode),
}

/// 范围扫描的一端
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RangeBound {
    comparand: ExpressionNode,
    inclusive: bool,
}

impl RangeBound {
    pub fn new(comparand: ExpressionNode, inclusive: bool) -> Self {
        Self { comparand, inclusive }
    }

    pub fn comparand(&self) -> &ExpressionNode {
        &self.comparand
    }

    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }
}

impl Duplicatable for RangeBound {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        Self {
            comparand: self.comparand.duplicate(map),
            inclusive: self.inclusive,
        }
    }
}

/// 单个索引上的扫描
///
/// 索引列依次为：等值列、OR 展开列、至多一个范围列，其余列只提供顺序
#[derive(Debug)]
pub struct SingleIndexScan {
    index: Arc<CatalogIndex>,
    ordering: Vec<OrderByExpression>,
    equality_comparands: Vec<ExpressionNode>,
    union_comparands: Vec<Vec<ExpressionNode>>,
    low: Option<RangeBound>,
    high: Option<RangeBound>,
    include_union_as_equality: bool,
}

impl SingleIndexScan {
    pub fn index(&self) -> &Arc<CatalogIndex> {
        &self.index
    }

    pub fn equality_comparands(&self) -> &[ExpressionNode] {
        &self.equality_comparands
    }

    pub fn union_comparands(&self) -> &[Vec<ExpressionNode>] {
        &self.union_comparands
    }

    pub fn low(&self) -> Option<&RangeBound> {
        self.low.as_ref()
    }

    pub fn high(&self) -> Option<&RangeBound> {
        self.high.as_ref()
    }

    fn n_equality(&self) -> usize {
        if self.include_union_as_equality {
            self.equality_comparands.len() + self.union_comparands.len()
        } else {
            self.equality_comparands.len()
        }
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        let mut exprs: Vec<&ExpressionNode> = self.equality_comparands.iter().collect();
        exprs.extend(self.union_comparands.iter().flatten());
        exprs.extend(self.low.iter().map(|b| &b.comparand));
        exprs.extend(self.high.iter().map(|b| &b.comparand));
        exprs
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        let mut exprs: Vec<&mut ExpressionNode> = self.equality_comparands.iter_mut().collect();
        exprs.extend(self.union_comparands.iter_mut().flatten());
        exprs.extend(self.low.iter_mut().map(|b| &mut b.comparand));
        exprs.extend(self.high.iter_mut().map(|b| &mut b.comparand));
        exprs
    }

    fn details(&self) -> String {
        let mut parts = vec![format!("Index({})", self.index.name())];
        if !self.equality_comparands.is_empty() {
            parts.push(format!("={}", join_expressions(&self.equality_comparands)));
        }
        for union in &self.union_comparands {
            parts.push(format!("UNION[{}]", join_expressions(union)));
        }
        if let Some(low) = &self.low {
            let op = if low.inclusive { ">=" } else { ">" };
            parts.push(format!("{} {}", op, low.comparand));
        }
        if let Some(high) = &self.high {
            let op = if high.inclusive { "<=" } else { "<" };
            parts.push(format!("{} {}", op, high.comparand));
        }
        parts.join(", ")
    }
}

/// 两个索引扫描按前 `comparison_columns` 个非等值列求交，输出 `output_scan` 的行
#[derive(Debug)]
pub struct MultiIndexIntersectScan {
    output_scan: Box<IndexScan>,
    selector_scan: Box<IndexScan>,
    comparison_columns: usize,
}

impl MultiIndexIntersectScan {
    pub fn output_scan(&self) -> &IndexScan {
        &self.output_scan
    }

    pub fn selector_scan(&self) -> &IndexScan {
        &self.selector_scan
    }

    pub fn comparison_columns(&self) -> usize {
        self.comparison_columns
    }
}

#[derive(Debug)]
pub enum IndexScanKind {
    Single(SingleIndexScan),
    Intersect(MultiIndexIntersectScan),
}

define_plan_node! {
    /// 索引访问路径
    pub struct IndexScan {
        kind: IndexScanKind,
        root_most_table: TableSourceId,
        leaf_most_table: TableSourceId,
        tables: Vec<TableSourceId>,
        conditions: Vec<ConditionId>,
        order_effectiveness: OrderEffectiveness,
        reverse_scan: bool,
        covering: bool,
        cost_estimate: Option<CostEstimate>,
    }
}

impl IndexScan {
    /// 创建单索引扫描
    ///
    /// `ordering` 是索引列及其方向；是否把 OR 展开列计入等值前缀取自计划器配置
    pub fn single(
        ctx: &PlanContext,
        index: Arc<CatalogIndex>,
        root_most_table: TableSourceId,
        leaf_most_table: TableSourceId,
        ordering: Vec<OrderByExpression>,
    ) -> Self {
        let mut tables = vec![root_most_table];
        if leaf_most_table != root_most_table {
            tables.push(leaf_most_table);
        }
        Self {
            id: next_node_id(),
            kind: IndexScanKind::Single(SingleIndexScan {
                index,
                ordering,
                equality_comparands: Vec::new(),
                union_comparands: Vec::new(),
                low: None,
                high: None,
                include_union_as_equality: ctx.planner_config().include_union_as_equality,
            }),
            root_most_table,
            leaf_most_table,
            tables,
            conditions: Vec::new(),
            order_effectiveness: OrderEffectiveness::None,
            reverse_scan: false,
            covering: false,
            cost_estimate: None,
        }
    }

    /// 创建两个扫描的交集
    ///
    /// 比较列必须是两个扫描在等值前缀之后都具有的列
    pub fn intersect(output_scan: IndexScan, selector_scan: IndexScan, comparison_columns: usize) -> PlanResult<Self> {
        let available = |scan: &IndexScan| scan.ordering().len().saturating_sub(scan.n_equality());
        if comparison_columns == 0
            || comparison_columns > available(&output_scan)
            || comparison_columns > available(&selector_scan)
        {
            return Err(PlanError::internal(format!(
                "索引交集的比较列数 {} 无效 (输出扫描可用 {}，选择扫描可用 {})",
                comparison_columns,
                available(&output_scan),
                available(&selector_scan)
            )));
        }

        let mut tables = output_scan.tables.clone();
        for &table in &selector_scan.tables {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
        let mut conditions = output_scan.conditions.clone();
        for &condition in &selector_scan.conditions {
            if !conditions.contains(&condition) {
                conditions.push(condition);
            }
        }

        Ok(Self {
            id: next_node_id(),
            root_most_table: output_scan.root_most_table,
            leaf_most_table: output_scan.leaf_most_table,
            covering: output_scan.covering,
            tables,
            conditions,
            order_effectiveness: OrderEffectiveness::None,
            reverse_scan: false,
            cost_estimate: None,
            kind: IndexScanKind::Intersect(MultiIndexIntersectScan {
                output_scan: Box::new(output_scan),
                selector_scan: Box::new(selector_scan),
                comparison_columns,
            }),
        })
    }

    pub fn kind(&self) -> &IndexScanKind {
        &self.kind
    }

    pub fn is_intersection(&self) -> bool {
        matches!(self.kind, IndexScanKind::Intersect(_))
    }

    /// 实际读取行的索引
    pub fn index(&self) -> &Arc<CatalogIndex> {
        match &self.kind {
            IndexScanKind::Single(single) => &single.index,
            IndexScanKind::Intersect(multi) => multi.output_scan.index(),
        }
    }

    /// 索引列及其方向
    pub fn ordering(&self) -> &[OrderByExpression] {
        match &self.kind {
            IndexScanKind::Single(single) => &single.ordering,
            IndexScanKind::Intersect(multi) => multi.output_scan.ordering(),
        }
    }

    pub fn is_ascending_at(&self, index: usize) -> bool {
        self.ordering().get(index).map_or(true, OrderByExpression::is_ascending)
    }

    pub fn root_most_table(&self) -> TableSourceId {
        self.root_most_table
    }

    pub fn leaf_most_table(&self) -> TableSourceId {
        self.leaf_most_table
    }

    /// 扫描覆盖的表来源
    pub fn tables(&self) -> &[TableSourceId] {
        &self.tables
    }

    pub fn add_table(&mut self, table: TableSourceId) {
        if !self.tables.contains(&table) {
            self.tables.push(table);
        }
    }

    /// `table` 是否落在 `root_most_table..leaf_most_table` 的祖先链上
    pub fn spans_table(&self, ctx: &PlanContext, table: TableSourceId) -> bool {
        ctx.is_ancestor(self.leaf_most_table, table) && ctx.is_ancestor(table, self.root_most_table)
    }

    /// 等值列数
    pub fn n_equality(&self) -> usize {
        match &self.kind {
            IndexScanKind::Single(single) => single.n_equality(),
            IndexScanKind::Intersect(multi) => multi.output_scan.n_equality(),
        }
    }

    /// 等值前缀之后的 OR 展开列数
    pub fn n_unions(&self) -> usize {
        match &self.kind {
            IndexScanKind::Single(single) => single.union_comparands.len(),
            IndexScanKind::Intersect(multi) => multi.output_scan.n_unions(),
        }
    }

    pub fn set_include_union_as_equality(&mut self, include: bool) {
        match &mut self.kind {
            IndexScanKind::Single(single) => single.include_union_as_equality = include,
            IndexScanKind::Intersect(multi) => {
                multi.output_scan.set_include_union_as_equality(include);
                multi.selector_scan.set_include_union_as_equality(include);
            }
        }
    }

    fn single_mut(&mut self, operation: &str) -> PlanResult<&mut SingleIndexScan> {
        let id = self.id;
        match &mut self.kind {
            IndexScanKind::Single(single) => Ok(single),
            IndexScanKind::Intersect(_) => Err(PlanError::internal(format!(
                "索引交集 {} 不能直接{}",
                id, operation
            ))),
        }
    }

    pub fn set_equality_comparands(&mut self, comparands: Vec<ExpressionNode>) -> PlanResult<()> {
        self.single_mut("设置等值比较值")?.equality_comparands = comparands;
        Ok(())
    }

    pub fn add_equality_comparand(&mut self, comparand: ExpressionNode) -> PlanResult<()> {
        self.single_mut("设置等值比较值")?.equality_comparands.push(comparand);
        Ok(())
    }

    /// 追加一个 OR 展开列，`values` 是该列的候选值
    pub fn add_union_comparand(&mut self, values: Vec<ExpressionNode>) -> PlanResult<()> {
        self.single_mut("设置 OR 展开列")?.union_comparands.push(values);
        Ok(())
    }

    pub fn set_low_comparand(&mut self, comparand: ExpressionNode, inclusive: bool) -> PlanResult<()> {
        self.single_mut("设置范围下界")?.low = Some(RangeBound::new(comparand, inclusive));
        Ok(())
    }

    pub fn set_high_comparand(&mut self, comparand: ExpressionNode, inclusive: bool) -> PlanResult<()> {
        self.single_mut("设置范围上界")?.high = Some(RangeBound::new(comparand, inclusive));
        Ok(())
    }

    pub fn equality_comparands(&self) -> &[ExpressionNode] {
        match &self.kind {
            IndexScanKind::Single(single) => &single.equality_comparands,
            IndexScanKind::Intersect(multi) => multi.output_scan.equality_comparands(),
        }
    }

    pub fn low_comparand(&self) -> Option<&RangeBound> {
        match &self.kind {
            IndexScanKind::Single(single) => single.low.as_ref(),
            IndexScanKind::Intersect(multi) => multi.output_scan.low_comparand(),
        }
    }

    pub fn high_comparand(&self) -> Option<&RangeBound> {
        match &self.kind {
            IndexScanKind::Single(single) => single.high.as_ref(),
            IndexScanKind::Intersect(multi) => multi.output_scan.high_comparand(),
        }
    }

    /// 扫描消耗的条件
    pub fn conditions(&self) -> &[ConditionId] {
        &self.conditions
    }

    pub fn add_condition(&mut self, condition: ConditionId) {
        if !self.conditions.contains(&condition) {
            self.conditions.push(condition);
        }
    }

    pub fn order_effectiveness(&self) -> OrderEffectiveness {
        self.order_effectiveness
    }

    pub fn is_reverse_scan(&self) -> bool {
        self.reverse_scan
    }

    pub fn set_reverse_scan(&mut self, reverse: bool) {
        self.reverse_scan = reverse;
    }

    pub fn is_covering(&self) -> bool {
        self.covering
    }

    pub fn set_covering(&mut self, covering: bool) {
        self.covering = covering;
    }

    pub fn scan_cost_estimate(&self) -> Option<&CostEstimate> {
        self.cost_estimate.as_ref()
    }

    pub fn set_cost_estimate(&mut self, cost: CostEstimate) {
        self.cost_estimate = Some(cost);
    }

    /// 计算并记录顺序满足程度
    ///
    /// ORDER BY 在等值前缀之后逐列比较方向；全部同向或全部反向时为 SORTED，
    /// 全部反向时同时标记反向扫描。不能排序时按 GROUP BY 的规则降级。
    pub fn determine_order_effectiveness(&mut self, required: RequiredOrder<'_>) -> OrderEffectiveness {
        let (effectiveness, reverse) = match required {
            RequiredOrder::OrderBy(targets) => match self.sorted_direction(targets) {
                Some(reverse) => (OrderEffectiveness::Sorted, reverse),
                None => {
                    let exprs: Vec<&ExpressionNode> = targets.iter().map(OrderByExpression::expression).collect();
                    (self.grouped(&exprs), false)
                }
            },
            RequiredOrder::GroupBy(targets) | RequiredOrder::Distinct(targets) => {
                let exprs: Vec<&ExpressionNode> = targets.iter().collect();
                (self.grouped(&exprs), false)
            }
            RequiredOrder::MinMax(operand) => {
                let first_free = self.ordering().get(self.n_equality());
                if first_free.is_some_and(|column| column.expression() == operand) {
                    (OrderEffectiveness::ForMinMax, false)
                } else {
                    (OrderEffectiveness::None, false)
                }
            }
        };
        log::trace!(
            "索引扫描 {} ({}) 顺序满足程度 {}{}",
            self.id,
            self.index().name(),
            effectiveness,
            if reverse { "，反向扫描" } else { "" }
        );
        self.order_effectiveness = effectiveness;
        self.reverse_scan = reverse;
        effectiveness
    }

    /// 能满足 ORDER BY 时返回是否需要反向扫描
    fn sorted_direction(&self, targets: &[OrderByExpression]) -> Option<bool> {
        let ordering = self.ordering();
        let n_columns = ordering.len();
        let n_equality = self.n_equality().min(n_columns);
        let equality_columns = &ordering[..n_equality];
        let mut reverse = vec![false; n_columns];

        let mut idx = n_equality;
        for target in targets {
            if let Some(column) = ordering.get(idx) {
                if column.expression() == target.expression() {
                    if column.is_ascending() != target.is_ascending() {
                        reverse[idx] = true;
                    }
                    idx += 1;
                    continue;
                }
            }
            // 等值列只有一个值，不影响顺序
            if equality_columns.iter().any(|c| c.expression() == target.expression()) {
                continue;
            }
            return None;
        }

        // 最后一个匹配列反向时，其后的列跟随反向
        if idx > n_equality && idx < n_columns && reverse[idx - 1] {
            reverse[idx..].iter_mut().for_each(|r| *r = true);
        }
        if n_equality < n_columns {
            let direction = reverse[n_equality];
            reverse[..n_equality].iter_mut().for_each(|r| *r = direction);
        }

        if !reverse.iter().any(|&r| r) {
            Some(false)
        } else if reverse.iter().all(|&r| r) {
            Some(true)
        } else {
            None
        }
    }

    fn grouped(&self, targets: &[&ExpressionNode]) -> OrderEffectiveness {
        let ordering = self.ordering();
        let n_equality = self.n_equality().min(ordering.len());
        let (equality_columns, free_columns) = ordering.split_at(n_equality);

        let mut any_found = false;
        let mut all_found = true;
        for &target in targets {
            match free_columns.iter().position(|c| c.expression() == target) {
                Some(position) if position < targets.len() => any_found = true,
                Some(_) => all_found = false,
                None => {
                    if equality_columns.iter().any(|c| c.expression() == target) {
                        any_found = true;
                    } else {
                        all_found = false;
                    }
                }
            }
        }

        match (any_found, all_found) {
            (true, true) => OrderEffectiveness::Grouped,
            (true, false) => OrderEffectiveness::PartialGrouped,
            _ => OrderEffectiveness::None,
        }
    }

    /// 最深的目录表
    pub fn leaf_most_catalog_table<'c>(&self, ctx: &'c PlanContext) -> &'c Arc<CatalogTable> {
        ctx.catalog_table_of(self.leaf_most_table)
    }
}

impl PlanNode for IndexScan {
    fn details(&self, ctx: &PlanContext) -> String {
        let mut details = match &self.kind {
            IndexScanKind::Single(single) => single.details(),
            IndexScanKind::Intersect(multi) => format!(
                "INTERSECT(compare {}, {} AND {})",
                multi.comparison_columns,
                multi.output_scan.details(ctx),
                multi.selector_scan.details(ctx)
            ),
        };
        if self.reverse_scan {
            details.push_str(", REVERSED");
        }
        if self.order_effectiveness != OrderEffectiveness::None {
            details.push_str(&format!(", {}", self.order_effectiveness));
        }
        if self.covering {
            details.push_str(", covering");
        }
        if let Some(cost) = &self.cost_estimate {
            details.push_str(&format!(", {}", cost));
        }
        details
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        match &self.kind {
            IndexScanKind::Single(single) => single.expressions(),
            IndexScanKind::Intersect(multi) => {
                let mut exprs = multi.output_scan.expressions();
                exprs.extend(multi.selector_scan.expressions());
                exprs
            }
        }
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        match &mut self.kind {
            IndexScanKind::Single(single) => single.expressions_mut(),
            IndexScanKind::Intersect(multi) => {
                let mut exprs = multi.output_scan.expressions_mut();
                exprs.extend(multi.selector_scan.expressions_mut());
                exprs
            }
        }
    }
}

impl Duplicatable for IndexScan {
    const STRATEGY: DuplicationStrategy = DuplicationStrategy::Plain;

    fn duplicate(&self, map: &mut DuplicateMap<'_>) -> Self {
        let kind = match &self.kind {
            IndexScanKind::Single(single) => IndexScanKind::Single(SingleIndexScan {
                index: single.index.clone(),
                ordering: single.ordering.duplicate(map),
                equality_comparands: single.equality_comparands.duplicate(map),
                union_comparands: single.union_comparands.duplicate(map),
                low: single.low.duplicate(map),
                high: single.high.duplicate(map),
                include_union_as_equality: single.include_union_as_equality,
            }),
            IndexScanKind::Intersect(multi) => IndexScanKind::Intersect(MultiIndexIntersectScan {
                output_scan: multi.output_scan.duplicate(map),
                selector_scan: multi.selector_scan.duplicate(map),
                comparison_columns: multi.comparison_columns,
            }),
        };
        Self {
            id: map.claim_plan_node_id(self.id),
            kind,
            root_most_table: map.table_source(self.root_most_table),
            leaf_most_table: map.table_source(self.leaf_most_table),
            tables: self.tables.duplicate(map),
            conditions: self.conditions.iter().map(|&c| map.condition_id(c)).collect(),
            order_effectiveness: self.order_effectiveness,
            reverse_scan: self.reverse_scan,
            covering: self.covering,
            cost_estimate: self.cost_estimate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogGroup, CatalogIndex, CatalogTable, IndexColumn, IndexKind};
    use crate::config::Config;
    use crate::core::types::expression::{ColumnExpression, ConstantExpression};

    struct Fixture {
        ctx: PlanContext,
        orders: TableSourceId,
        index: Arc<CatalogIndex>,
    }

    fn fixture(include_union: bool) -> Fixture {
        let customers = CatalogTable::root(1, "customers", 1, Vec::new());
        let orders = CatalogTable::child(2, "orders", 2, &customers, vec![], Vec::new());
        let group = CatalogGroup::new("customers", vec![customers.clone(), orders.clone()]);

        let mut config = Config::default();
        config.planner.include_union_as_equality = include_union;
        let mut ctx = PlanContext::with_config(&config);
        let tree = ctx.new_table_tree(Some(group));
        let node = ctx.table_node_for(tree, &orders);
        let source = ctx.new_table_source(node, "o", true);

        let index = CatalogIndex::new(
            "cid_odate_oid",
            IndexKind::Table,
            orders.clone(),
            vec![
                IndexColumn::new(&orders, "cid", true),
                IndexColumn::new(&orders, "odate", true),
                IndexColumn::new(&orders, "oid", false),
            ],
            false,
        );
        Fixture {
            ctx,
            orders: source,
            index,
        }
    }

    fn col(source: TableSourceId, position: usize, name: &str) -> ExpressionNode {
        ColumnExpression::table(source, position, name, None).into()
    }

    fn scan(f: &Fixture) -> IndexScan {
        let ordering = vec![
            OrderByExpression::asc(col(f.orders, 0, "cid")),
            OrderByExpression::asc(col(f.orders, 1, "odate")),
            OrderByExpression::desc(col(f.orders, 2, "oid")),
        ];
        IndexScan::single(&f.ctx, f.index.clone(), f.orders, f.orders, ordering)
    }

    #[test]
    fn test_equality_counts_follow_config() {
        let f = fixture(false);
        let mut s = scan(&f);
        s.add_equality_comparand(ConstantExpression::long(1).into()).expect("单索引扫描");
        s.add_union_comparand(vec![ConstantExpression::long(2).into(), ConstantExpression::long(3).into()])
            .expect("单索引扫描");
        assert_eq!(s.n_equality(), 1);
        assert_eq!(s.n_unions(), 1);

        s.set_include_union_as_equality(true);
        assert_eq!(s.n_equality(), 2);

        let f = fixture(true);
        let mut s = scan(&f);
        s.add_union_comparand(vec![ConstantExpression::long(2).into()]).expect("单索引扫描");
        assert_eq!(s.n_equality(), 1);
    }

    #[test]
    fn test_sorted_with_equality_prefix() {
        let f = fixture(false);
        let mut s = scan(&f);
        s.add_equality_comparand(ConstantExpression::long(1).into()).expect("单索引扫描");

        let wanted = vec![OrderByExpression::asc(col(f.orders, 1, "odate"))];
        assert_eq!(
            s.determine_order_effectiveness(RequiredOrder::OrderBy(&wanted)),
            OrderEffectiveness::Sorted
        );
        assert!(!s.is_reverse_scan());

        // 等值列出现在 ORDER BY 中不影响结果
        let wanted = vec![
            OrderByExpression::asc(col(f.orders, 0, "cid")),
            OrderByExpression::asc(col(f.orders, 1, "odate")),
        ];
        assert_eq!(
            s.determine_order_effectiveness(RequiredOrder::OrderBy(&wanted)),
            OrderEffectiveness::Sorted
        );
    }

    #[test]
    fn test_all_reversed_is_sorted_reverse_scan() {
        let f = fixture(false);
        let mut s = scan(&f);
        s.add_equality_comparand(ConstantExpression::long(1).into()).expect("单索引扫描");

        let wanted = vec![
            OrderByExpression::desc(col(f.orders, 1, "odate")),
            OrderByExpression::asc(col(f.orders, 2, "oid")),
        ];
        assert_eq!(
            s.determine_order_effectiveness(RequiredOrder::OrderBy(&wanted)),
            OrderEffectiveness::Sorted
        );
        assert!(s.is_reverse_scan());
    }

    #[test]
    fn test_mixed_directions_degrade_to_grouped() {
        let f = fixture(false);
        let mut s = scan(&f);
        s.add_equality_comparand(ConstantExpression::long(1).into()).expect("单索引扫描");

        let wanted = vec![
            OrderByExpression::asc(col(f.orders, 1, "odate")),
            OrderByExpression::asc(col(f.orders, 2, "oid")),
        ];
        assert_eq!(
            s.determine_order_effectiveness(RequiredOrder::OrderBy(&wanted)),
            OrderEffectiveness::Grouped
        );
        assert!(!s.is_reverse_scan());
    }

    #[test]
    fn test_group_by_effectiveness() {
        let f = fixture(false);
        let mut s = scan(&f);

        let group_by = vec![col(f.orders, 1, "odate"), col(f.orders, 0, "cid")];
        assert_eq!(
            s.determine_order_effectiveness(RequiredOrder::GroupBy(&group_by)),
            OrderEffectiveness::Grouped
        );

        let group_by = vec![col(f.orders, 0, "cid"), col(f.orders, 5, "status")];
        assert_eq!(
            s.determine_order_effectiveness(RequiredOrder::GroupBy(&group_by)),
            OrderEffectiveness::PartialGrouped
        );

        let group_by = vec![col(f.orders, 5, "status")];
        assert_eq!(
            s.determine_order_effectiveness(RequiredOrder::Distinct(&group_by)),
            OrderEffectiveness::None
        );
    }

    #[test]
    fn test_min_max() {
        let f = fixture(false);
        let mut s = scan(&f);
        s.add_equality_comparand(ConstantExpression::long(1).into()).expect("单索引扫描");

        let operand = col(f.orders, 1, "odate");
        assert_eq!(
            s.determine_order_effectiveness(RequiredOrder::MinMax(&operand)),
            OrderEffectiveness::ForMinMax
        );
        let operand = col(f.orders, 2, "oid");
        assert_eq!(
            s.determine_order_effectiveness(RequiredOrder::MinMax(&operand)),
            OrderEffectiveness::None
        );
    }

    #[test]
    fn test_intersect_rejects_comparands() {
        let f = fixture(false);
        let mut output = scan(&f);
        output.add_equality_comparand(ConstantExpression::long(1).into()).expect("单索引扫描");
        let selector = scan(&f);

        assert!(IndexScan::intersect(scan(&f), scan(&f), 0).is_err());
        assert!(IndexScan::intersect(scan(&f), scan(&f), 4).is_err());

        let mut both = IndexScan::intersect(output, selector, 1).expect("比较列有效");
        assert!(both.is_intersection());
        assert_eq!(both.n_equality(), 1);
        assert_eq!(both.expressions().len(), 1);
        let err = both
            .add_equality_comparand(ConstantExpression::long(2).into())
            .expect_err("交集不能直接设置比较值");
        assert!(err.is_internal());
    }

    #[test]
    fn test_details() {
        let f = fixture(false);
        let mut s = scan(&f);
        s.add_equality_comparand(ConstantExpression::long(1).into()).expect("单索引扫描");
        s.set_low_comparand(ConstantExpression::string("2024-01-01").into(), true)
            .expect("单索引扫描");
        s.set_covering(true);
        assert_eq!(
            s.details(&f.ctx),
            "Index(cid_odate_oid), =1, >= '2024-01-01', covering"
        );
        // 比较值需要被表达式访问者看到，扫描不作为叶子
        assert!(!s.is_leaf());
    }
}
