//! 计划输出集成测试
//!
//! 测试范围:
//! - 多行计划文本与缩进配置
//! - 扫描比较值中的子查询计划
//! - 可序列化的节点描述

mod common;

use common::TestContext;
use sqlplan::config::Config;
use sqlplan::core::types::expression::{ExpressionNode, SubqueryExpression, SubqueryKind};
use sqlplan::query::planner::plan::core::explain::PlanDescription;
use sqlplan::query::planner::plan::{NullSource, PlanNodeEnum, Select, Subquery};

#[test]
fn test_plan_string_for_join_plan() {
    let t = TestContext::new();
    let plan = t.customer_orders_plan();

    assert_eq!(
        plan.plan_string(&t.ctx),
        "Project(name, oid)\n\
         \x20 Select(odate > 20240101)\n\
         \x20   JoinNode(INNER[cid == cid])\n\
         \x20     TableSource(customers AS c)\n\
         \x20     TableSource(orders AS o)"
    );
}

#[test]
fn test_plan_string_honours_indent_config() {
    let mut config = Config::default();
    config.planner.plan_dump_indent = 3;
    let t = TestContext::with_config(&config);
    let plan = t.customer_orders_plan();

    let text = plan.plan_string(&t.ctx);
    let indents: Vec<usize> = text
        .lines()
        .map(|line| line.len() - line.trim_start().len())
        .collect();
    assert_eq!(indents, vec![0, 3, 6, 9, 9]);
}

#[test]
fn test_subquery_in_scan_comparand_is_printed() {
    let t = TestContext::new();
    let subquery: PlanNodeEnum = Subquery::new(NullSource::new().into(), 0).into();
    let mut scan = t.orders_scan(t.catalog.orders_odate());
    scan.add_equality_comparand(ExpressionNode::Subquery(SubqueryExpression::new(
        SubqueryKind::Value,
        subquery,
        None,
    )))
    .expect("单索引扫描");
    let plan: PlanNodeEnum = Select::new(scan.into(), Vec::new()).into();

    let text = plan.plan_string(&t.ctx);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4, "{}", text);
    assert_eq!(lines[0], "Select()");
    assert!(lines[1].starts_with("  IndexScan(") && lines[1].contains("VALUE(Subquery@"));
    assert_eq!(lines[2], "Subquery()");
    assert_eq!(lines[3], "  NullSource()");
}

#[test]
fn test_description_json() {
    let t = TestContext::new();
    let plan = t.customer_orders_plan();
    let description = PlanDescription::describe(&plan, &t.ctx);
    assert_eq!(description.plan_node_descs.len(), plan.node_count());

    let select = plan.children()[0].id();
    let desc = description.get_node_desc(select).expect("Select 已描述");
    assert_eq!(desc.output, Some(plan.id()));
    assert_eq!(desc.dependencies.as_ref().map(|d| d.len()), Some(1));

    let json = description.to_json().expect("可以序列化");
    let value: serde_json::Value = serde_json::from_str(&json).expect("合法 JSON");
    assert_eq!(value["plan_node_descs"][0]["name"], "Project");
    assert_eq!(value["plan_node_descs"][3]["name"], "TableSource");
}
