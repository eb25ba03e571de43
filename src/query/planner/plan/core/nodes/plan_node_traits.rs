//! PlanNode 统一特征定义
//!
//! 定义所有计划节点需要实现的基础特征

use super::plan_node_enum::PlanNodeEnum;
use crate::core::types::expression::ExpressionNode;
use crate::query::planner::plan::core::context::PlanContext;

/// 节点身份，由 `define_plan_node!` 生成
pub trait PlanNodeIdentity {
    /// 获取节点的唯一ID
    fn id(&self) -> i64;

    /// 计划文本中显示的节点名称
    fn name(&self) -> &'static str;

    /// 转换为 PlanNodeEnum
    fn into_enum(self) -> PlanNodeEnum;
}

/// PlanNode 基础特征
///
/// 子节点和表达式槽位按固定顺序返回，访问者和复制都依赖这个顺序
pub trait PlanNode: PlanNodeIdentity {
    /// 节点摘要中括号内的细节
    fn details(&self, ctx: &PlanContext) -> String;

    /// 叶子节点由访问者的 `visit` 处理，其余节点调用 enter/leave
    ///
    /// 持有表达式的节点不能是叶子，否则 `accept_with_expressions` 看不到这些表达式
    fn is_leaf(&self) -> bool {
        false
    }

    fn children(&self) -> Vec<&PlanNodeEnum> {
        Vec::new()
    }

    fn children_mut(&mut self) -> Vec<&mut PlanNodeEnum> {
        Vec::new()
    }

    fn expressions(&self) -> Vec<&ExpressionNode> {
        Vec::new()
    }

    fn expressions_mut(&mut self) -> Vec<&mut ExpressionNode> {
        Vec::new()
    }
}

/// 单输入节点特征
pub trait SingleInputNode: PlanNode {
    /// 获取输入节点
    fn input(&self) -> &PlanNodeEnum;

    fn input_mut(&mut self) -> &mut PlanNodeEnum;

    /// 替换输入节点，返回原来的输入
    fn set_input(&mut self, input: PlanNodeEnum) -> PlanNodeEnum;
}

/// 双输入节点特征
pub trait BinaryInputNode: PlanNode {
    /// 获取左输入节点
    fn left(&self) -> &PlanNodeEnum;

    /// 获取右输入节点
    fn right(&self) -> &PlanNodeEnum;

    /// 替换左输入节点，返回原来的左输入
    fn set_left(&mut self, input: PlanNodeEnum) -> PlanNodeEnum;

    /// 替换右输入节点，返回原来的右输入
    fn set_right(&mut self, input: PlanNodeEnum) -> PlanNodeEnum;
}
