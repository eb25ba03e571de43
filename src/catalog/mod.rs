//! 目录模型
//!
//! 表、表组、分组外键和索引的只读描述。目录由外部维护，计划层通过 `Arc` 引用，从不修改

use std::fmt;
use std::sync::Arc;

use crate::core::types::TInstance;

/// 表列
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogColumn {
    pub name: String,
    pub position: usize,
    pub ty: TInstance,
}

impl CatalogColumn {
    pub fn new(name: impl Into<String>, position: usize, ty: TInstance) -> Self {
        Self {
            name: name.into(),
            position,
            ty,
        }
    }
}

/// 分组外键：子表通过它聚簇在父表之下
#[derive(Debug, Clone)]
pub struct CatalogJoin {
    name: String,
    parent: Arc<CatalogTable>,
    /// (父表列, 子表列)
    join_columns: Vec<(String, String)>,
}

impl CatalogJoin {
    pub fn new(
        name: impl Into<String>,
        parent: Arc<CatalogTable>,
        join_columns: Vec<(String, String)>,
    ) -> Self {
        Self {
            name: name.into(),
            parent,
            join_columns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> &Arc<CatalogTable> {
        &self.parent
    }

    pub fn join_columns(&self) -> &[(String, String)] {
        &self.join_columns
    }
}

/// 目录表
///
/// `ordinal` 是表在组内的序号，同一组内按存储层次的先序排列
#[derive(Debug)]
pub struct CatalogTable {
    table_id: u32,
    name: String,
    ordinal: u32,
    depth: u32,
    parent_join: Option<CatalogJoin>,
    columns: Vec<CatalogColumn>,
}

impl CatalogTable {
    /// 创建组的根表
    pub fn root(table_id: u32, name: impl Into<String>, ordinal: u32, columns: Vec<CatalogColumn>) -> Arc<Self> {
        Arc::new(Self {
            table_id,
            name: name.into(),
            ordinal,
            depth: 0,
            parent_join: None,
            columns,
        })
    }

    /// 创建通过分组外键挂在 `parent` 下的子表
    pub fn child(
        table_id: u32,
        name: impl Into<String>,
        ordinal: u32,
        parent: &Arc<CatalogTable>,
        join_columns: Vec<(String, String)>,
        columns: Vec<CatalogColumn>,
    ) -> Arc<Self> {
        let name = name.into();
        let join = CatalogJoin::new(format!("{}_{}", parent.name, name), parent.clone(), join_columns);
        Arc::new(Self {
            table_id,
            name,
            ordinal,
            depth: parent.depth + 1,
            parent_join: Some(join),
            columns,
        })
    }

    pub fn table_id(&self) -> u32 {
        self.table_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn columns(&self) -> &[CatalogColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&CatalogColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn parent_join(&self) -> Option<&CatalogJoin> {
        self.parent_join.as_ref()
    }

    pub fn parent(&self) -> Option<&Arc<CatalogTable>> {
        self.parent_join.as_ref().map(|j| j.parent())
    }

    /// 从根到自身的祖先链（包含自身）
    pub fn ancestors_inclusive(self: &Arc<Self>) -> Vec<Arc<CatalogTable>> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent().cloned();
        while let Some(table) = current {
            current = table.parent().cloned();
            chain.push(table);
        }
        chain.reverse();
        chain
    }

    /// `self` 是否为 `other` 的祖先（或同一张表）
    pub fn is_ancestor_of(&self, other: &CatalogTable) -> bool {
        if self.table_id == other.table_id {
            return true;
        }
        let mut current = other.parent();
        while let Some(table) = current {
            if table.table_id == self.table_id {
                return true;
            }
            current = table.parent();
        }
        false
    }

    /// 两张表在聚簇层次中最近的公共祖先
    pub fn common_ancestor(self: &Arc<Self>, other: &Arc<CatalogTable>) -> Option<Arc<CatalogTable>> {
        let mine = self.ancestors_inclusive();
        let theirs = other.ancestors_inclusive();
        mine.iter()
            .zip(theirs.iter())
            .take_while(|(a, b)| a.table_id == b.table_id)
            .last()
            .map(|(a, _)| a.clone())
    }
}

impl PartialEq for CatalogTable {
    fn eq(&self, other: &Self) -> bool {
        self.table_id == other.table_id
    }
}

impl Eq for CatalogTable {}

impl fmt::Display for CatalogTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 表组：通过分组外键聚簇存储的一组表
#[derive(Debug)]
pub struct CatalogGroup {
    name: String,
    tables: Vec<Arc<CatalogTable>>,
}

impl CatalogGroup {
    /// 按序号排序组内的表，根表必须唯一
    pub fn new(name: impl Into<String>, mut tables: Vec<Arc<CatalogTable>>) -> Arc<Self> {
        tables.sort_by_key(|t| t.ordinal());
        Arc::new(Self {
            name: name.into(),
            tables,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tables(&self) -> &[Arc<CatalogTable>] {
        &self.tables
    }

    pub fn root(&self) -> Option<&Arc<CatalogTable>> {
        self.tables.iter().find(|t| t.parent().is_none())
    }

    pub fn contains(&self, table: &CatalogTable) -> bool {
        self.tables.iter().any(|t| t.table_id() == table.table_id())
    }
}

/// 非分组外键
#[derive(Debug)]
pub struct ForeignKey {
    name: String,
    referencing: Arc<CatalogTable>,
    referenced: Arc<CatalogTable>,
    /// (引用方列, 被引用方列)
    columns: Vec<(String, String)>,
}

impl ForeignKey {
    pub fn new(
        name: impl Into<String>,
        referencing: Arc<CatalogTable>,
        referenced: Arc<CatalogTable>,
        columns: Vec<(String, String)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            referencing,
            referenced,
            columns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn referencing(&self) -> &Arc<CatalogTable> {
        &self.referencing
    }

    pub fn referenced(&self) -> &Arc<CatalogTable> {
        &self.referenced
    }

    pub fn columns(&self) -> &[(String, String)] {
        &self.columns
    }
}

/// 索引类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Table,
    Group,
    FullText,
    Spatial,
}

/// 索引列
#[derive(Debug, Clone)]
pub struct IndexColumn {
    pub table: Arc<CatalogTable>,
    pub column: String,
    pub ascending: bool,
}

impl IndexColumn {
    pub fn new(table: &Arc<CatalogTable>, column: impl Into<String>, ascending: bool) -> Self {
        Self {
            table: table.clone(),
            column: column.into(),
            ascending,
        }
    }
}

impl PartialEq for IndexColumn {
    fn eq(&self, other: &Self) -> bool {
        self.table.table_id() == other.table.table_id()
            && self.column == other.column
            && self.ascending == other.ascending
    }
}

/// 索引
///
/// 表索引只覆盖一张表；组索引的列可以来自祖先表，`leaf_most_table` 是最深的那张
#[derive(Debug)]
pub struct CatalogIndex {
    name: String,
    kind: IndexKind,
    leaf_most_table: Arc<CatalogTable>,
    columns: Vec<IndexColumn>,
    unique: bool,
}

impl CatalogIndex {
    pub fn new(
        name: impl Into<String>,
        kind: IndexKind,
        leaf_most_table: Arc<CatalogTable>,
        columns: Vec<IndexColumn>,
        unique: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            kind,
            leaf_most_table,
            columns,
            unique,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    pub fn leaf_most_table(&self) -> &Arc<CatalogTable> {
        &self.leaf_most_table
    }

    /// 索引列中层次最浅的表
    pub fn root_most_table(&self) -> &Arc<CatalogTable> {
        self.columns
            .iter()
            .map(|c| &c.table)
            .min_by_key(|t| t.depth())
            .unwrap_or(&self.leaf_most_table)
    }

    pub fn is_ascending_at(&self, index: usize) -> bool {
        self.columns.get(index).map(|c| c.ascending).unwrap_or(true)
    }
}
