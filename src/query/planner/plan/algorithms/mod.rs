//! 访问路径
//! 索引扫描及索引交集的条件计数

pub mod index_scan;
pub mod intersection;

pub use index_scan::{
    IndexScan, IndexScanKind, MultiIndexIntersectScan, OrderEffectiveness, RangeBound, RequiredOrder,
    SingleIndexScan,
};
pub use intersection::{
    ConditionsCount, ConditionsCounter, ConditionsCounts, HowMany, IndexIntersectionNode,
    OverlayedConditionsCount,
};
