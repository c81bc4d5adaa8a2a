use crate::ast::Span;
use serde::Serialize;
use std::fmt;

/// Salience used when a rule does not declare one
pub const DEFAULT_SALIENCE: i64 = 0;

/// A compiled rule: `rule Name "description" salience N { When cond Then actions }`
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub description: Option<String>,
    pub salience: i64,
    pub condition: Expression,
    pub actions: Vec<Statement>,
    pub span: Span,
}

impl Rule {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// An expression that can be evaluated, with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Name of the fact this expression is rooted at, for member/index/call chains
    pub fn root_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Identifier(name) => Some(name),
            ExpressionKind::Member { object, .. } | ExpressionKind::Index { object, .. } => {
                object.root_identifier()
            }
            ExpressionKind::Call {
                receiver: Some(receiver),
                ..
            } => receiver.root_identifier(),
            _ => None,
        }
    }

    /// Visit this expression and every sub-expression, parents first
    pub fn walk<'e, F: FnMut(&'e Expression)>(&'e self, visit: &mut F) {
        visit(self);
        match &self.kind {
            ExpressionKind::Literal(_) | ExpressionKind::Identifier(_) => {}
            ExpressionKind::Unary(_, operand) => operand.walk(visit),
            ExpressionKind::Arithmetic(left, _, right)
            | ExpressionKind::Comparison(left, _, right)
            | ExpressionKind::LogicalAnd(left, right)
            | ExpressionKind::LogicalOr(left, right) => {
                left.walk(visit);
                right.walk(visit);
            }
            ExpressionKind::Member { object, .. } => object.walk(visit),
            ExpressionKind::Index { object, key } => {
                object.walk(visit);
                key.walk(visit);
            }
            ExpressionKind::Call { receiver, args, .. } => {
                if let Some(receiver) = receiver {
                    receiver.walk(visit);
                }
                for arg in args {
                    arg.walk(visit);
                }
            }
        }
    }
}

impl Statement {
    /// Expressions directly owned by this statement
    pub fn expressions(&self) -> Vec<&Expression> {
        match &self.kind {
            StatementKind::Assignment { target, value } => vec![target, value],
            StatementKind::Call(call) => vec![call],
        }
    }
}

/// The kind/type of expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Literal(Literal),
    Identifier(String),
    Unary(UnaryOperator, Box<Expression>),
    Arithmetic(Box<Expression>, ArithmeticOperation, Box<Expression>),
    Comparison(Box<Expression>, ComparisonOperator, Box<Expression>),
    LogicalAnd(Box<Expression>, Box<Expression>),
    LogicalOr(Box<Expression>, Box<Expression>),
    /// `object.name`
    Member {
        object: Box<Expression>,
        name: String,
    },
    /// `object[key]`
    Index {
        object: Box<Expression>,
        key: Box<Expression>,
    },
    /// `name(args)` or `receiver.name(args)`
    Call {
        receiver: Option<Box<Expression>>,
        name: String,
        args: Vec<Expression>,
    },
}

/// A literal value as written in rule source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Not,
}

/// Arithmetic operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOperation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl ArithmeticOperation {
    /// Returns a human-readable name for the operation
    pub fn name(&self) -> &'static str {
        match self {
            ArithmeticOperation::Add => "addition",
            ArithmeticOperation::Subtract => "subtraction",
            ArithmeticOperation::Multiply => "multiplication",
            ArithmeticOperation::Divide => "division",
            ArithmeticOperation::Modulo => "modulo",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOperation::Add => "+",
            ArithmeticOperation::Subtract => "-",
            ArithmeticOperation::Multiply => "*",
            ArithmeticOperation::Divide => "/",
            ArithmeticOperation::Modulo => "%",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl ComparisonOperator {
    /// Returns a human-readable name for the operator
    pub fn name(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => "greater than",
            ComparisonOperator::LessThan => "less than",
            ComparisonOperator::GreaterThanOrEqual => "greater than or equal",
            ComparisonOperator::LessThanOrEqual => "less than or equal",
            ComparisonOperator::Equal => "equal",
            ComparisonOperator::NotEqual => "not equal",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, ComparisonOperator::Equal | ComparisonOperator::NotEqual)
    }
}

/// An action statement inside a rule's `Then` block
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `target = value;` where target is a member or index chain
    Assignment { target: Expression, value: Expression },
    /// `Retract("Rule");`, `Item.Touch();`
    Call(Expression),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Literal::Text(s) => write!(f, "{:?}", s),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Nil => write!(f, "nil"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Literal(lit) => write!(f, "{}", lit),
            ExpressionKind::Identifier(name) => write!(f, "{}", name),
            ExpressionKind::Unary(UnaryOperator::Negate, operand) => write!(f, "-{}", operand),
            ExpressionKind::Unary(UnaryOperator::Not, operand) => write!(f, "!{}", operand),
            ExpressionKind::Arithmetic(left, op, right) => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            ExpressionKind::Comparison(left, op, right) => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            ExpressionKind::LogicalAnd(left, right) => write!(f, "({} && {})", left, right),
            ExpressionKind::LogicalOr(left, right) => write!(f, "({} || {})", left, right),
            ExpressionKind::Member { object, name } => write!(f, "{}.{}", object, name),
            ExpressionKind::Index { object, key } => write!(f, "{}[{}]", object, key),
            ExpressionKind::Call {
                receiver,
                name,
                args,
            } => {
                if let Some(receiver) = receiver {
                    write!(f, "{}.", receiver)?;
                }
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StatementKind::Assignment { target, value } => write!(f, "{} = {};", target, value),
            StatementKind::Call(call) => write!(f, "{};", call),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {}", self.name)?;
        if let Some(description) = &self.description {
            write!(f, " {:?}", description)?;
        }
        writeln!(f, " salience {} {{", self.salience)?;
        writeln!(f, "    When")?;
        writeln!(f, "        {}", self.condition)?;
        writeln!(f, "    Then")?;
        for action in &self.actions {
            writeln!(f, "        {}", action)?;
        }
        write!(f, "}}")
    }
}
