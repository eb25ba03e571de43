//! 节点ID生成器
//!
//! 提供全局唯一的计划节点ID与比较条件ID分配机制

use std::sync::atomic::{AtomicI64, Ordering};

/// 节点ID生成器
///
/// 使用单例模式提供全局唯一的ID分配，多个编译线程共享同一计数器也不会冲突
pub struct NodeIdGenerator {
    counter: AtomicI64,
}

impl NodeIdGenerator {
    /// 获取全局单例实例
    pub fn instance() -> &'static Self {
        static INSTANCE: NodeIdGenerator = NodeIdGenerator {
            counter: AtomicI64::new(1), // 从1开始，0保留为无效ID
        };
        &INSTANCE
    }

    /// 获取下一个唯一ID
    pub fn next_id(&self) -> i64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }
}

/// 为计划节点分配新ID
pub fn next_node_id() -> i64 {
    NodeIdGenerator::instance().next_id()
}

/// 为比较条件分配新ID
///
/// 与计划节点共用计数器
pub fn next_condition_id() -> i64 {
    NodeIdGenerator::instance().next_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation() {
        let id1 = next_node_id();
        let id2 = next_node_id();
        let id3 = next_condition_id();

        assert!(id1 > 0);
        assert!(id2 > id1);
        assert!(id3 > id2);
    }

    #[test]
    fn test_singleton() {
        let id1 = NodeIdGenerator::instance().next_id();
        let id2 = NodeIdGenerator::instance().next_id();

        assert!(id2 > id1);
    }
}
