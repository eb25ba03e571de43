//! 计划节点宏定义
//!
//! 提供宏来简化计划节点的定义，减少样板代码

/// 定义计划节点的宏
///
/// 生成带 `id` 字段的结构体和 `PlanNodeIdentity` 实现。
/// 结构体名与 `PlanNodeEnum` 的变体名一致；显示名默认取结构体名，可用 `display:` 覆盖。
///
/// # 示例
/// ```ignore
/// define_plan_node! {
///     pub struct NullSource {}
/// }
///
/// define_plan_node! {
///     pub struct TableSourceNode {
///         source: TableSourceId,
///     }
///     display: "TableSource"
/// }
/// ```
#[macro_export]
macro_rules! define_plan_node {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $($(#[$fmeta:meta])* $field:ident: $type:ty),* $(,)?
        }
    ) => {
        $crate::define_plan_node! {
            $(#[$meta])*
            pub struct $name {
                $($(#[$fmeta])* $field: $type),*
            }
            display: stringify!($name)
        }
    };
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $($(#[$fmeta:meta])* $field:ident: $type:ty),* $(,)?
        }
        display: $display:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            id: i64,
            $($(#[$fmeta])* $field: $type,)*
        }

        impl $name {
            pub fn id(&self) -> i64 {
                self.id
            }

            pub fn type_name(&self) -> &'static str {
                $display
            }
        }

        impl $crate::query::planner::plan::core::nodes::plan_node_traits::PlanNodeIdentity for $name {
            fn id(&self) -> i64 {
                self.id
            }

            fn name(&self) -> &'static str {
                $display
            }

            fn into_enum(self) -> $crate::query::planner::plan::core::nodes::plan_node_enum::PlanNodeEnum {
                $crate::query::planner::plan::core::nodes::plan_node_enum::PlanNodeEnum::$name(self)
            }
        }
    };
}

/// 定义单输入计划节点的宏
///
/// 在 `define_plan_node!` 的基础上增加 `input` 字段和 `SingleInputNode` 实现
#[macro_export]
macro_rules! define_single_input_node {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $($(#[$fmeta:meta])* $field:ident: $type:ty),* $(,)?
        }
    ) => {
        $crate::define_plan_node! {
            $(#[$meta])*
            pub struct $name {
                input: Box<$crate::query::planner::plan::core::nodes::plan_node_enum::PlanNodeEnum>,
                $($(#[$fmeta])* $field: $type),*
            }
        }

        impl $crate::query::planner::plan::core::nodes::plan_node_traits::SingleInputNode for $name {
            fn input(&self) -> &$crate::query::planner::plan::core::nodes::plan_node_enum::PlanNodeEnum {
                &self.input
            }

            fn input_mut(&mut self) -> &mut $crate::query::planner::plan::core::nodes::plan_node_enum::PlanNodeEnum {
                &mut self.input
            }

            fn set_input(
                &mut self,
                input: $crate::query::planner::plan::core::nodes::plan_node_enum::PlanNodeEnum,
            ) -> $crate::query::planner::plan::core::nodes::plan_node_enum::PlanNodeEnum {
                std::mem::replace(&mut *self.input, input)
            }
        }
    };
}
