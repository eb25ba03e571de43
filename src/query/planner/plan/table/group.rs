//! 表组模型
//!
//! `TableGroup` 是通过分组外键连接起来的最大表来源集合；`TableGroupJoin` 是其中的一条边，
//! 它的每个条件创建时标记为组连接，被拒绝后改为潜在组连接：不能再用于组扫描，
//! 但仍可作为普通等值条件。`TableFKJoin` 是非分组外键的同类边。

use std::sync::Arc;

use crate::catalog::{CatalogJoin, ForeignKey};
use crate::core::error::{PlanError, PlanResult};
use crate::core::types::expression::{ComparisonCondition, ComparisonImplementation};
use crate::query::planner::plan::core::context::{
    ConditionId, PlanContext, TableFKJoinId, TableGroupId, TableGroupJoinId, TableSourceId,
};

/// 表组
#[derive(Debug, Clone)]
pub struct TableGroup {
    tables: Vec<TableSourceId>,
    joins: Vec<TableGroupJoinId>,
    merged_into: Option<TableGroupId>,
}

impl TableGroup {
    pub fn tables(&self) -> &[TableSourceId] {
        &self.tables
    }

    pub fn joins(&self) -> &[TableGroupJoinId] {
        &self.joins
    }

    /// 合并后本组不再使用，指向吸收它的组
    pub fn merged_into(&self) -> Option<TableGroupId> {
        self.merged_into
    }

    pub fn contains(&self, table: TableSourceId) -> bool {
        self.tables.contains(&table)
    }

    pub(crate) fn relinked(
        &self,
        tables: Vec<TableSourceId>,
        joins: Vec<TableGroupJoinId>,
        merged_into: Option<TableGroupId>,
    ) -> Self {
        Self {
            tables,
            joins,
            merged_into,
        }
    }
}

/// 组连接
#[derive(Debug, Clone)]
pub struct TableGroupJoin {
    group: TableGroupId,
    parent: TableSourceId,
    child: TableSourceId,
    conditions: Vec<ConditionId>,
    join: CatalogJoin,
    rejected: bool,
}

impl TableGroupJoin {
    pub fn group(&self) -> TableGroupId {
        self.group
    }

    pub fn parent(&self) -> TableSourceId {
        self.parent
    }

    pub fn child(&self) -> TableSourceId {
        self.child
    }

    pub fn conditions(&self) -> &[ConditionId] {
        &self.conditions
    }

    pub fn join(&self) -> &CatalogJoin {
        &self.join
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    pub(crate) fn relinked(
        &self,
        group: TableGroupId,
        parent: TableSourceId,
        child: TableSourceId,
        conditions: Vec<ConditionId>,
    ) -> Self {
        Self {
            group,
            parent,
            child,
            conditions,
            join: self.join.clone(),
            rejected: self.rejected,
        }
    }
}

/// 外键连接
#[derive(Debug, Clone)]
pub struct TableFKJoin {
    parent: TableSourceId,
    child: TableSourceId,
    conditions: Vec<ConditionId>,
    foreign_key: Arc<ForeignKey>,
}

impl TableFKJoin {
    pub fn parent(&self) -> TableSourceId {
        self.parent
    }

    pub fn child(&self) -> TableSourceId {
        self.child
    }

    pub fn conditions(&self) -> &[ConditionId] {
        &self.conditions
    }

    pub fn foreign_key(&self) -> &Arc<ForeignKey> {
        &self.foreign_key
    }

    pub(crate) fn relinked(&self, parent: TableSourceId, child: TableSourceId, conditions: Vec<ConditionId>) -> Self {
        Self {
            parent,
            child,
            conditions,
            foreign_key: self.foreign_key.clone(),
        }
    }
}

impl PlanContext {
    /// 以一张表来源新建表组
    pub fn new_table_group(&mut self, first: TableSourceId) -> TableGroupId {
        let group = self.push_table_group(TableGroup {
            tables: vec![first],
            joins: Vec::new(),
            merged_into: None,
        });
        self.table_source_mut(first).set_group(Some(group));
        group
    }

    /// 在组内登记一条组连接
    ///
    /// 目录连接必须把子表挂在父表之下；条件从此标记为组连接
    pub fn add_group_join(
        &mut self,
        group: TableGroupId,
        parent: TableSourceId,
        child: TableSourceId,
        conditions: Vec<ConditionId>,
        join: CatalogJoin,
    ) -> PlanResult<TableGroupJoinId> {
        let parent_table = self.catalog_table_of(parent).clone();
        let child_table = self.catalog_table_of(child).clone();
        let links_tables = join.parent().table_id() == parent_table.table_id()
            && child_table.parent().map(|p| p.table_id()) == Some(parent_table.table_id());
        if !links_tables {
            return Err(PlanError::internal(format!(
                "组连接 {} 不连接 {} 与 {}",
                join.name(),
                parent_table.name(),
                child_table.name()
            )));
        }

        let id = self.push_group_join(TableGroupJoin {
            group,
            parent,
            child,
            conditions: conditions.clone(),
            join,
            rejected: false,
        });
        for condition in conditions {
            self.register_condition_join(condition, id);
        }

        for table in [parent, child] {
            if !self.table_group(group).contains(table) {
                self.table_group_mut(group).tables.push(table);
            }
            self.table_source_mut(table).set_group(Some(group));
        }
        self.table_group_mut(group).joins.push(id);
        self.table_source_mut(child).set_parent_join(Some(id));

        log::debug!(
            "登记组连接 {}: {} -> {}",
            id,
            self.table_source_name(parent),
            self.table_source_name(child)
        );
        Ok(id)
    }

    /// 拒绝组连接
    ///
    /// 子表不再通过这条边留在组扫描中，条件改为潜在组连接
    pub fn reject_group_join(&mut self, id: TableGroupJoinId) {
        if self.group_join(id).is_rejected() {
            return;
        }
        let (group, child) = {
            let join = self.group_join_mut(id);
            join.rejected = true;
            (join.group, join.child)
        };
        self.table_group_mut(group).joins.retain(|&j| j != id);
        if self.table_source(child).parent_join() == Some(id) {
            self.table_source_mut(child).set_parent_join(None);
        }
        log::debug!("拒绝组连接 {}", id);
    }

    /// 把 `other` 合并进 `into`
    pub fn merge_table_groups(&mut self, into: TableGroupId, other: TableGroupId) {
        if into == other {
            return;
        }
        let (tables, joins) = {
            let other_group = self.table_group_mut(other);
            other_group.merged_into = Some(into);
            (
                std::mem::take(&mut other_group.tables),
                std::mem::take(&mut other_group.joins),
            )
        };
        for &table in &tables {
            self.table_source_mut(table).set_group(Some(into));
        }
        for &join in &joins {
            self.group_join_mut(join).group = into;
        }
        let target = self.table_group_mut(into);
        for table in tables {
            if !target.tables.contains(&table) {
                target.tables.push(table);
            }
        }
        target.joins.extend(joins);
        log::debug!("合并表组 {} -> {}", other, into);
    }

    /// 登记外键连接
    pub fn add_fk_join(
        &mut self,
        parent: TableSourceId,
        child: TableSourceId,
        conditions: Vec<ConditionId>,
        foreign_key: Arc<ForeignKey>,
    ) -> TableFKJoinId {
        self.push_fk_join(TableFKJoin {
            parent,
            child,
            conditions,
            foreign_key,
        })
    }

    /// 组内的父表来源
    pub fn parent_table(&self, source: TableSourceId) -> Option<TableSourceId> {
        self.table_source(source)
            .parent_join()
            .map(|j| self.group_join(j).parent())
    }

    /// 条件的实际实现方式：组连接标记优先于条件自身记录的方式
    pub fn condition_implementation(&self, condition: &ComparisonCondition) -> ComparisonImplementation {
        match self.group_join_for_condition(condition.id()) {
            Some(join) if self.group_join(join).is_rejected() => ComparisonImplementation::PotentialGroupJoin,
            Some(_) => ComparisonImplementation::GroupJoin,
            None => condition.implementation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogColumn, CatalogTable};
    use crate::core::types::expression::{ColumnExpression, Comparison, ExpressionNode};
    use crate::core::types::{DataType, TInstance};

    struct Fixture {
        ctx: PlanContext,
        customers: Arc<CatalogTable>,
        orders: Arc<CatalogTable>,
        c: TableSourceId,
        o: TableSourceId,
    }

    fn fixture() -> Fixture {
        let int = || TInstance::not_null(DataType::Int);
        let customers = CatalogTable::root(1, "customers", 1, vec![CatalogColumn::new("cid", 0, int())]);
        let orders = CatalogTable::child(
            2,
            "orders",
            2,
            &customers,
            vec![("cid".into(), "cid".into())],
            vec![CatalogColumn::new("oid", 0, int()), CatalogColumn::new("cid", 1, int())],
        );
        let mut ctx = PlanContext::new();
        let tree = ctx.new_table_tree(None);
        let cnode = ctx.table_node_for(tree, &customers);
        let onode = ctx.table_node_for(tree, &orders);
        let c = ctx.new_table_source(cnode, "c", true);
        let o = ctx.new_table_source(onode, "o", true);
        Fixture {
            ctx,
            customers,
            orders,
            c,
            o,
        }
    }

    fn join_condition(f: &Fixture) -> ComparisonCondition {
        ComparisonCondition::new(
            Comparison::Eq,
            ExpressionNode::Column(ColumnExpression::table(f.c, 0, "c.cid", None)),
            ExpressionNode::Column(ColumnExpression::table(f.o, 1, "o.cid", None)),
        )
    }

    #[test]
    fn test_group_join_tags_conditions() {
        let mut f = fixture();
        let cond = join_condition(&f);
        assert_eq!(f.ctx.condition_implementation(&cond), ComparisonImplementation::Normal);

        let group = f.ctx.new_table_group(f.c);
        let join = f.orders.parent_join().cloned().expect("orders 有分组外键");
        let id = f
            .ctx
            .add_group_join(group, f.c, f.o, vec![cond.id()], join)
            .expect("合法的组连接");

        assert_eq!(f.ctx.condition_implementation(&cond), ComparisonImplementation::GroupJoin);
        assert_eq!(f.ctx.table_group(group).tables(), &[f.c, f.o]);
        assert_eq!(f.ctx.parent_table(f.o), Some(f.c));
        assert_eq!(f.ctx.table_source(f.o).group(), Some(group));

        f.ctx.reject_group_join(id);
        assert_eq!(
            f.ctx.condition_implementation(&cond),
            ComparisonImplementation::PotentialGroupJoin
        );
        assert_eq!(f.ctx.parent_table(f.o), None);
        assert!(f.ctx.table_group(group).joins().is_empty());
    }

    #[test]
    fn test_group_join_rejects_wrong_direction() {
        let mut f = fixture();
        let group = f.ctx.new_table_group(f.o);
        let join = f.orders.parent_join().cloned().expect("orders 有分组外键");
        let result = f.ctx.add_group_join(group, f.o, f.c, vec![], join);
        assert!(matches!(result, Err(PlanError::Internal(_))));
        assert_eq!(f.customers.depth(), 0);
    }

    #[test]
    fn test_merge_groups() {
        let mut f = fixture();
        let g1 = f.ctx.new_table_group(f.c);
        let g2 = f.ctx.new_table_group(f.o);
        f.ctx.merge_table_groups(g1, g2);

        assert_eq!(f.ctx.table_group(g1).tables(), &[f.c, f.o]);
        assert!(f.ctx.table_group(g2).tables().is_empty());
        assert_eq!(f.ctx.table_group(g2).merged_into(), Some(g1));
        assert_eq!(f.ctx.table_source(f.o).group(), Some(g1));

        // 与自身合并无效果
        f.ctx.merge_table_groups(g1, g1);
        assert_eq!(f.ctx.table_group(g1).tables().len(), 2);
    }
}
