//! 计划树集成测试
//!
//! 测试范围:
//! - 结构修改后父节点索引与树一致
//! - 子计划深复制与表身份共享
//! - 复制会话的幂等性
//! - 连接反转与聚合拆分

mod common;

use std::collections::HashSet;

use common::TestContext;
use sqlplan::core::error::PlanError;
use sqlplan::core::types::expression::AggregateFunctionExpression;
use sqlplan::query::planner::plan::core::context::TableSourceId;
use sqlplan::query::planner::plan::core::duplicate::DuplicateMap;
use sqlplan::query::planner::plan::{
    AggregateSource, BinaryInputNode, JoinNode, JoinType, NullSource, ParentIndex, PlanNodeEnum, Project, SingleInputNode,
    TableGroupJoinTree,
};

fn node_ids(root: &PlanNodeEnum, out: &mut Vec<i64>) {
    out.push(root.id());
    for child in root.children() {
        node_ids(child, out);
    }
}

fn table_sources(root: &PlanNodeEnum, out: &mut Vec<TableSourceId>) {
    if let PlanNodeEnum::TableSourceNode(node) = root {
        out.push(node.source());
    }
    for child in root.children() {
        table_sources(child, out);
    }
}

fn find_join_id(root: &PlanNodeEnum) -> i64 {
    let mut ids = Vec::new();
    node_ids(root, &mut ids);
    ids.into_iter()
        .find(|&id| root.find(id).map(|n| n.is_join()).unwrap_or(false))
        .expect("计划中有连接节点")
}

/// 每次修改后重建的父节点索引都与树的实际结构一致
fn assert_outputs_consistent(root: &PlanNodeEnum) {
    let index = ParentIndex::build(root);
    let mut ids = Vec::new();
    node_ids(root, &mut ids);
    assert_eq!(index.len(), ids.len());
    assert_eq!(index.output_of(root.id()), None);
    for id in ids {
        let node = root.find(id).expect("节点在树中");
        for child in node.children() {
            assert_eq!(index.output_of(child.id()), Some(id));
        }
    }
}

#[test]
fn test_outputs_follow_structural_edits() {
    let t = TestContext::new();
    let mut plan = t.customer_orders_plan();
    assert_eq!(plan.node_count(), 5);
    assert_outputs_consistent(&plan);

    // 反转连接：左右输入交换后输出不变
    let join_id = find_join_id(&plan);
    let join = plan.find_mut(join_id).and_then(|n| n.as_join_mut()).expect("连接节点");
    let old_left = join.left().id();
    join.reverse().expect("INNER 连接可以反转");
    assert_eq!(join.right().id(), old_left);
    assert_outputs_consistent(&plan);

    // 用空来源替换整个连接子树
    let select_id = plan.children()[0].id();
    let replacement = NullSource::new().into();
    let removed = plan
        .find_mut(select_id)
        .map(|select| select.replace_input(join_id, replacement))
        .expect("Select 在树中");
    let removed = removed.ok().expect("连接是 Select 的直接输入");
    assert_eq!(removed.node_count(), 3);
    assert_eq!(plan.node_count(), 3);
    assert!(plan.find(join_id).is_none());
    assert_outputs_consistent(&plan);
}

#[test]
fn test_duplicate_subplan_is_deep() {
    let mut t = TestContext::new();
    let plan = t.customer_orders_plan();
    let sources_before = t.ctx.table_source_count();
    let trees_before = t.ctx.table_tree_count();

    let copy = {
        let mut map = DuplicateMap::new(&mut t.ctx);
        map.duplicate(&plan)
    };

    assert_eq!(copy.node_count(), plan.node_count());
    assert_eq!(copy.summary_string(&t.ctx), plan.summary_string(&t.ctx));

    let mut original_ids = Vec::new();
    node_ids(&plan, &mut original_ids);
    let mut copied_ids = Vec::new();
    node_ids(&copy, &mut copied_ids);
    let original_ids: HashSet<i64> = original_ids.into_iter().collect();
    assert!(copied_ids.iter().all(|id| !original_ids.contains(id)));

    // 两个表来源各复制一次，所在表树整体复制一次
    assert_eq!(t.ctx.table_source_count(), sources_before + 2);
    assert_eq!(t.ctx.table_tree_count(), trees_before + 1);

    let mut sources = Vec::new();
    table_sources(&copy, &mut sources);
    assert_eq!(sources.len(), 2);
    assert!(!sources.contains(&t.c) && !sources.contains(&t.o));
    let new_c = sources[0];
    let new_o = sources[1];
    assert_eq!(t.ctx.catalog_table_of(new_c).name(), "customers");
    assert_eq!(t.ctx.table_source_name(new_o), "o");

    // 复制出的表来源挂在同一棵新树上，祖先关系保持
    let new_c_node = t.ctx.table_source(new_c).node();
    let new_o_node = t.ctx.table_source(new_o).node();
    assert_eq!(t.ctx.table_node(new_c_node).tree(), t.ctx.table_node(new_o_node).tree());
    assert_ne!(t.ctx.table_source(new_o).node(), t.ctx.table_source(t.o).node());
    assert_eq!(t.ctx.table_node(new_o_node).parent(), Some(new_c_node));
    assert!(t.ctx.is_ancestor(new_o, new_c));

    // 连接条件里的列引用指向新的表来源，条件获得新的身份
    let join_id = find_join_id(&copy);
    let copied_join = copy.find(join_id).and_then(|n| n.as_join()).expect("连接节点");
    let original_join = plan
        .find(find_join_id(&plan))
        .and_then(|n| n.as_join())
        .expect("连接节点");
    let condition = copied_join.join_conditions()[0].as_comparison().expect("比较条件");
    let left = condition.left().as_column().and_then(|c| c.table_source());
    assert_eq!(left, Some(new_c));
    assert_ne!(
        copied_join.join_conditions()[0].condition_id(),
        original_join.join_conditions()[0].condition_id()
    );
}

#[test]
fn test_duplicate_map_is_idempotent() {
    let mut t = TestContext::new();
    let plan = t.customer_orders_plan();
    let condition = plan.children()[0].expressions()[0]
        .condition_id()
        .expect("Select 的条件有身份");

    let mut map = DuplicateMap::new(&mut t.ctx);
    let c1 = map.table_source(t.c);
    let c2 = map.table_source(t.c);
    assert_eq!(c1, c2);
    assert_eq!(map.condition_id(condition), map.condition_id(condition));

    // 同一会话中复制两次：带身份的实体共享，计划节点各自独立
    let first = map.duplicate(&plan);
    let second = map.duplicate(&plan);
    drop(map);

    let mut first_sources = Vec::new();
    table_sources(&first, &mut first_sources);
    let mut second_sources = Vec::new();
    table_sources(&second, &mut second_sources);
    assert_eq!(first_sources, second_sources);
    assert_eq!(first_sources[0], c1);
    assert_ne!(first.id(), second.id());
}

#[test]
fn test_duplicate_group_join_tree_shares_table_node() {
    let mut t = TestContext::new();
    // o 与 o2 是同一张 orders 表的两次使用
    let orders_node = t.ctx.table_source(t.o).node();
    let o2 = t.ctx.new_table_source(orders_node, "o2", true);
    let group = t.ctx.new_table_group(t.c);
    let mut tree = TableGroupJoinTree::new(group, t.c);
    let root = tree.root();
    tree.add_child(root, t.o, JoinType::Inner);
    tree.add_child(root, o2, JoinType::Left);

    let copy = {
        let mut map = DuplicateMap::new(&mut t.ctx);
        map.duplicate(&tree)
    };

    assert_eq!(copy.len(), 3);
    assert_ne!(copy.group(), group);
    let tables = copy.tables();
    let distinct: HashSet<TableSourceId> = tables.iter().copied().collect();
    assert_eq!(distinct.len(), 3);
    assert!(tables.iter().all(|s| ![t.c, t.o, o2].contains(s)));

    let children: Vec<TableSourceId> = copy
        .children_of(copy.root())
        .into_iter()
        .map(|i| copy.node(i).table())
        .collect();
    assert_eq!(children.len(), 2);
    assert_eq!(copy.node(copy.children_of(copy.root())[1]).parent_join_type(), JoinType::Left);

    // 两个子节点指向同一个新的 TableNode，新节点与原节点不同
    let new_node = t.ctx.table_source(children[0]).node();
    assert_eq!(t.ctx.table_source(children[1]).node(), new_node);
    assert_ne!(new_node, orders_node);
    assert_eq!(t.ctx.table_node(new_node).uses().len(), 2);

    // 根和子节点的表节点属于同一棵复制出的表树
    let new_root_node = t.ctx.table_source(copy.node(copy.root()).table()).node();
    assert_eq!(t.ctx.table_node(new_root_node).tree(), t.ctx.table_node(new_node).tree());
    assert_ne!(t.ctx.table_node(new_node).tree(), t.ctx.table_node(orders_node).tree());
    assert_eq!(t.ctx.table_node(orders_node).uses(), &[t.o, o2]);
}

#[test]
fn test_join_reversal_is_an_involution() {
    for join_type in [JoinType::Inner, JoinType::Left, JoinType::Right, JoinType::FullOuter] {
        let mut join = JoinNode::new(
            NullSource::new().into(),
            NullSource::new().into(),
            join_type,
        );
        let (left, right) = (join.left().id(), join.right().id());
        join.reverse().expect("可以反转");
        join.reverse().expect("可以再次反转");
        assert_eq!(join.join_type(), join_type);
        assert_eq!((join.left().id(), join.right().id()), (left, right));
    }

    let mut semi = JoinNode::new(
        NullSource::new().into(),
        NullSource::new().into(),
        JoinType::Semi,
    );
    assert!(matches!(semi.reverse(), Err(PlanError::Internal(_))));
}

#[test]
fn test_aggregate_split_feeds_project() {
    let t = TestContext::new();
    let mut agg = AggregateSource::new(NullSource::new().into(), vec![t.col(t.c, "cid")]);
    let count = agg
        .add_aggregate(AggregateFunctionExpression::count_star())
        .expect("未拆分时可以登记");
    let sum = agg
        .add_aggregate(AggregateFunctionExpression::new("SUM", Some(t.col(t.o, "oid")), false, None))
        .expect("未拆分时可以登记");
    assert_eq!((count, sum), (1, 2));

    let fields = agg.split_off_project().expect("首次拆分");
    assert_eq!(fields.len(), agg.n_fields());

    // 拆出的表达式成为新的下层 Project
    let input = agg.set_input(NullSource::new().into());
    agg.set_input(Project::new(input, fields).into());
    let plan: PlanNodeEnum = agg.into();
    assert_eq!(plan.children()[0].name(), "Project");
    assert_eq!(
        plan.children()[0].expressions().iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        vec!["cid", "1", "oid"]
    );

    let agg = plan.as_aggregate_source().expect("根是聚合");
    assert_eq!(
        agg.aggregate_functions().expect("已拆分"),
        &["COUNT(*)".to_string(), "SUM".to_string()]
    );
}
