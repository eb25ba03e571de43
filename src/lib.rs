//! SQLPlan - 基于代价的 SQL 优化器的查询计划中间表示与重写框架
//!
//! 面向按层次聚簇存储的关系库：计划树由规则原地修改，
//! 通过 `DuplicateMap` 分叉候选方案，并以不透明的 `CostEstimate` 比较代价。

pub mod catalog;
pub mod config;
pub mod core;
pub mod query;
pub mod utils;
