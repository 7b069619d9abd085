// ABOUTME: Abstract syntax tree node definitions produced by the parser

use crate::position::Span;
use crate::value::Number;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Plus,
    Minus,
    Not,
}

/// One `if`/`elif` arm: condition, body, and whether the body is the block
/// form (evaluates to unit) or the single-line expression form.
#[derive(Debug, Clone)]
pub struct IfCase {
    pub condition: Node,
    pub body: Node,
    pub returns_unit: bool,
}

/// A single tagged-union AST node family, per SPEC_FULL.md §9 "tagged variants
/// instead of inheritance": one enum instead of a class per node kind.
#[derive(Debug, Clone)]
pub enum Node {
    Number(Number, Span),
    Str(String, Span),
    List(Vec<Node>, Span),
    /// A sequence of statements executed in order (a program or a `then`/
    /// `end`-delimited block body), distinct from a `List` literal: a block
    /// yields its last statement's value (or propagates a control-flow
    /// signal), a list literal always yields a `Value::List`.
    Block(Vec<Node>, Span),
    VarAccess(String, Span),
    VarAssign(String, Box<Node>, Span),
    BinOp(BinOpKind, Box<Node>, Box<Node>, Span),
    UnaryOp(UnaryOpKind, Box<Node>, Span),
    If {
        cases: Vec<IfCase>,
        else_case: Option<(Box<Node>, bool)>,
        span: Span,
    },
    For {
        var_name: String,
        start: Box<Node>,
        end: Box<Node>,
        step: Option<Box<Node>>,
        body: Box<Node>,
        returns_unit: bool,
        span: Span,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
        returns_unit: bool,
        span: Span,
    },
    FuncDef {
        name: Option<String>,
        params: Vec<String>,
        body: Box<Node>,
        auto_return: bool,
        span: Span,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
        span: Span,
    },
    Return(Option<Box<Node>>, Span),
    Continue(Span),
    Break(Span),
}

impl Node {
    pub fn span(&self) -> &Span {
        match self {
            Node::Number(_, s)
            | Node::Str(_, s)
            | Node::List(_, s)
            | Node::Block(_, s)
            | Node::VarAccess(_, s)
            | Node::VarAssign(_, _, s)
            | Node::BinOp(_, _, _, s)
            | Node::UnaryOp(_, _, s)
            | Node::If { span: s, .. }
            | Node::For { span: s, .. }
            | Node::While { span: s, .. }
            | Node::FuncDef { span: s, .. }
            | Node::Call { span: s, .. }
            | Node::Return(_, s)
            | Node::Continue(s)
            | Node::Break(s) => s,
        }
    }

    /// The node's tag, used in trace events (`enter_node`/`exit_node` "kind").
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Number(..) => "Number",
            Node::Str(..) => "String",
            Node::List(..) => "List",
            Node::Block(..) => "Block",
            Node::VarAccess(..) => "VarAccess",
            Node::VarAssign(..) => "VarAssign",
            Node::BinOp(..) => "BinOp",
            Node::UnaryOp(..) => "UnaryOp",
            Node::If { .. } => "If",
            Node::For { .. } => "For",
            Node::While { .. } => "While",
            Node::FuncDef { .. } => "FuncDef",
            Node::Call { .. } => "Call",
            Node::Return(..) => "Return",
            Node::Continue(..) => "Continue",
            Node::Break(..) => "Break",
        }
    }

    /// A terse textual summary used for the trace's `root_repr` (§4.5). Not
    /// meant to be a faithful re-print of the source, just a stable,
    /// structural rendering useful for diffing two runs of the same text.
    pub fn repr(&self) -> String {
        match self {
            Node::Number(n, _) => format!("{}", n),
            Node::Str(s, _) => format!("{:?}", s),
            Node::List(items, _) => {
                format!("[{}]", items.iter().map(Node::repr).collect::<Vec<_>>().join(", "))
            }
            Node::Block(stmts, _) => {
                format!("{{{}}}", stmts.iter().map(Node::repr).collect::<Vec<_>>().join("; "))
            }
            Node::VarAccess(name, _) => name.clone(),
            Node::VarAssign(name, expr, _) => format!("(var {} = {})", name, expr.repr()),
            Node::BinOp(op, l, r, _) => format!("({} {:?} {})", l.repr(), op, r.repr()),
            Node::UnaryOp(op, operand, _) => format!("({:?} {})", op, operand.repr()),
            Node::If { cases, else_case, .. } => {
                let mut parts: Vec<String> = cases
                    .iter()
                    .map(|c| format!("if {} then {}", c.condition.repr(), c.body.repr()))
                    .collect();
                if let Some((body, _)) = else_case {
                    parts.push(format!("else {}", body.repr()));
                }
                format!("({})", parts.join(" "))
            }
            Node::For { var_name, start, end, step, body, .. } => format!(
                "(for {} = {} to {}{} then {})",
                var_name,
                start.repr(),
                end.repr(),
                step.as_ref().map(|s| format!(" step {}", s.repr())).unwrap_or_default(),
                body.repr()
            ),
            Node::While { condition, body, .. } => {
                format!("(while {} then {})", condition.repr(), body.repr())
            }
            Node::FuncDef { name, params, body, .. } => format!(
                "(fun {}({}) {})",
                name.as_deref().unwrap_or(""),
                params.join(", "),
                body.repr()
            ),
            Node::Call { callee, args, .. } => format!(
                "({}({}))",
                callee.repr(),
                args.iter().map(Node::repr).collect::<Vec<_>>().join(", ")
            ),
            Node::Return(expr, _) => format!("(return {})", expr.as_ref().map(|e| e.repr()).unwrap_or_default()),
            Node::Continue(_) => "(continue)".to_string(),
            Node::Break(_) => "(break)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use std::rc::Rc;

    fn span() -> Span {
        let p = Position::new(Rc::from("t"), Rc::from(""));
        Span::new(p.clone(), p)
    }

    #[test]
    fn test_kind_name() {
        let n = Node::Number(Number::Int(1), span());
        assert_eq!(n.kind_name(), "Number");
    }

    #[test]
    fn test_repr_var_assign() {
        let n = Node::VarAssign(
            "x".to_string(),
            Box::new(Node::Number(Number::Int(1), span())),
            span(),
        );
        assert_eq!(n.repr(), "(var x = 1)");
    }
}
