//! 表达式显示
//!
//! 计划文本输出中表达式的格式

use std::fmt;

use super::{ColumnSource, ExpressionNode, LogicalOp, SubqueryKind};

fn write_list(f: &mut fmt::Formatter<'_>, items: &[ExpressionNode]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionNode::Constant(c) => write!(f, "{}", c.value()),
            ExpressionNode::Parameter(p) => write!(f, "${}", p.position() + 1),
            ExpressionNode::Column(c) => match c.source() {
                ColumnSource::Table(_) => write!(f, "{}", c.name()),
                ColumnSource::Node(id) => write!(f, "[{}].{}", id, c.name()),
            },
            ExpressionNode::Cast(c) => write!(f, "CAST({} AS {})", c.operand(), c.ty().data_type()),
            ExpressionNode::Function(func) => {
                write!(f, "{}(", func.name())?;
                write_list(f, func.operands())?;
                write!(f, ")")
            }
            ExpressionNode::Aggregate(a) => {
                write!(f, "{}(", a.function())?;
                if a.is_distinct() {
                    write!(f, "DISTINCT ")?;
                }
                match a.operand() {
                    Some(operand) => write!(f, "{}", operand)?,
                    None => write!(f, "*")?,
                }
                write!(f, ")")
            }
            ExpressionNode::Comparison(c) => write!(f, "{} {} {}", c.left(), c.op().symbol(), c.right()),
            ExpressionNode::Logical(l) => {
                let name = match l.op() {
                    LogicalOp::And => "and",
                    LogicalOp::Or => "or",
                    LogicalOp::Not => "not",
                    LogicalOp::IsNull => "isNull",
                };
                write!(f, "{}(", name)?;
                write_list(f, l.operands())?;
                write!(f, ")")
            }
            ExpressionNode::InList(i) => {
                write!(f, "{} IN (", i.operand())?;
                write_list(f, i.list())?;
                write!(f, ")")
            }
            ExpressionNode::Subquery(s) => {
                let kind = match s.kind() {
                    SubqueryKind::Value => "VALUE",
                    SubqueryKind::Exists => "EXISTS",
                    SubqueryKind::Any => "ANY",
                };
                write!(f, "{}(Subquery@{})", kind, s.subquery().id())
            }
            ExpressionNode::SpecialIndex(s) => {
                write!(f, "{}(", s.function().name())?;
                write_list(f, s.operands())?;
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_display() {
        let count = ExpressionNode::from(AggregateFunctionExpression::count_star());
        assert_eq!(count.to_string(), "COUNT(*)");

        let cond = ExpressionNode::comparison(
            Comparison::Ge,
            ExpressionNode::Parameter(ParameterExpression::new(0, None)),
            ConstantExpression::long(10).into(),
        );
        assert_eq!(cond.to_string(), "$1 >= 10");

        let list = ExpressionNode::InList(InListCondition::new(
            ConstantExpression::string("a").into(),
            vec![ConstantExpression::string("a").into(), ConstantExpression::string("b").into()],
        ));
        assert_eq!(list.to_string(), "'a' IN ('a', 'b')");
    }
}
