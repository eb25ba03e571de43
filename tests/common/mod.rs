//! 集成测试共享工具模块
//!
//! 提供客户/订单/明细三层聚簇目录，以及在其上构造计划的辅助函数

#![allow(dead_code)]

use std::sync::Arc;

use sqlplan::catalog::{CatalogColumn, CatalogGroup, CatalogIndex, CatalogTable, IndexColumn, IndexKind};
use sqlplan::config::Config;
use sqlplan::core::types::expression::{ColumnExpression, Comparison, ConstantExpression, ExpressionNode};
use sqlplan::core::types::{DataType, TInstance};
use sqlplan::query::planner::plan::core::context::{PlanContext, TableSourceId};
use sqlplan::query::planner::plan::{
    IndexScan, JoinNode, JoinType, OrderByExpression, PlanNodeEnum, Project, Select, TableSourceNode,
};

fn column(name: &str, position: usize) -> CatalogColumn {
    CatalogColumn::new(name, position, TInstance::not_null(DataType::Int))
}

/// customers -> orders -> items 组成的目录
pub struct TestCatalog {
    pub group: Arc<CatalogGroup>,
    pub customers: Arc<CatalogTable>,
    pub orders: Arc<CatalogTable>,
    pub items: Arc<CatalogTable>,
}

impl TestCatalog {
    pub fn new() -> Self {
        let customers = CatalogTable::root(1, "customers", 1, vec![column("cid", 0), column("name", 1)]);
        let orders = CatalogTable::child(
            2,
            "orders",
            2,
            &customers,
            vec![("cid".to_string(), "cid".to_string())],
            vec![column("oid", 0), column("cid", 1), column("odate", 2)],
        );
        let items = CatalogTable::child(
            3,
            "items",
            3,
            &orders,
            vec![("oid".to_string(), "oid".to_string())],
            vec![column("iid", 0), column("oid", 1), column("sku", 2)],
        );
        let group = CatalogGroup::new("customers", vec![customers.clone(), orders.clone(), items.clone()]);
        Self {
            group,
            customers,
            orders,
            items,
        }
    }

    /// orders(cid, odate) 上的表索引
    pub fn orders_cid_odate(&self) -> Arc<CatalogIndex> {
        CatalogIndex::new(
            "orders_cid_odate",
            IndexKind::Table,
            self.orders.clone(),
            vec![
                IndexColumn::new(&self.orders, "cid", true),
                IndexColumn::new(&self.orders, "odate", true),
            ],
            false,
        )
    }

    /// orders(odate) 上的表索引
    pub fn orders_odate(&self) -> Arc<CatalogIndex> {
        CatalogIndex::new(
            "orders_odate",
            IndexKind::Table,
            self.orders.clone(),
            vec![IndexColumn::new(&self.orders, "odate", true)],
            false,
        )
    }
}

/// 测试上下文：目录、计划上下文和三个表来源
pub struct TestContext {
    pub catalog: TestCatalog,
    pub ctx: PlanContext,
    pub c: TableSourceId,
    pub o: TableSourceId,
    pub i: TableSourceId,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        let catalog = TestCatalog::new();
        let mut ctx = PlanContext::with_config(config);
        let tree = ctx.new_table_tree(Some(catalog.group.clone()));
        let cnode = ctx.table_node_for(tree, &catalog.customers);
        let onode = ctx.table_node_for(tree, &catalog.orders);
        let inode = ctx.table_node_for(tree, &catalog.items);
        let c = ctx.new_table_source(cnode, "c", true);
        let o = ctx.new_table_source(onode, "o", true);
        let i = ctx.new_table_source(inode, "i", false);
        Self { catalog, ctx, c, o, i }
    }

    pub fn col(&self, source: TableSourceId, name: &str) -> ExpressionNode {
        let table = self.ctx.catalog_table_of(source);
        let position = table.column(name).map(|c| c.position).unwrap_or(0);
        ColumnExpression::table(source, position, name, None).into()
    }

    /// `Project(c.name, o.oid)` <- `Select(o.odate > 20240101)` <- `JoinNode(INNER, c.cid == o.cid)`
    pub fn customer_orders_plan(&self) -> PlanNodeEnum {
        let mut join = JoinNode::new(
            TableSourceNode::new(self.c).into(),
            TableSourceNode::new(self.o).into(),
            JoinType::Inner,
        );
        join.join_conditions_mut().push(ExpressionNode::comparison(
            Comparison::Eq,
            self.col(self.c, "cid"),
            self.col(self.o, "cid"),
        ));
        let select = Select::new(
            join.into(),
            vec![ExpressionNode::comparison(
                Comparison::Gt,
                self.col(self.o, "odate"),
                ConstantExpression::long(20240101).into(),
            )],
        );
        Project::new(select.into(), vec![self.col(self.c, "name"), self.col(self.o, "oid")]).into()
    }

    /// 在 orders 上按给定索引新建扫描，排序按索引列升序
    pub fn orders_scan(&self, index: Arc<CatalogIndex>) -> IndexScan {
        let ordering = index
            .columns()
            .iter()
            .map(|c| OrderByExpression::asc(self.col(self.o, &c.column)))
            .collect();
        IndexScan::single(&self.ctx, index, self.o, self.o, ordering)
    }
}
