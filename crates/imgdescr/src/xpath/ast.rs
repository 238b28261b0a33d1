//! XPath expression tree

/// Compiled expression
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Path(LocationPath),
    Literal(String),
    Number(f64),
    Function(Function, Vec<Expr>),
    Compare(Box<Expr>, CmpOp, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    /// Predicates over a node-set, positions counted in document order
    Filter(Box<Expr>, Vec<Expr>),
    /// Relative steps taken from every node of a node-set
    PathFrom(Box<Expr>, Vec<Step>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    pub const fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    SelfAxis,
    Attribute,
}

impl Axis {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "parent" => Self::Parent,
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "self" => Self::SelfAxis,
            "attribute" => Self::Attribute,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`: any element, or any attribute on the attribute axis
    Wildcard,
    Name(String),
    /// `text()`
    Text,
    /// `node()`
    AnyNode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    Last,
    Position,
    Count,
    Not,
    True,
    False,
    Contains,
    StartsWith,
    Name,
    String,
    NormalizeSpace,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "last" => Self::Last,
            "position" => Self::Position,
            "count" => Self::Count,
            "not" => Self::Not,
            "true" => Self::True,
            "false" => Self::False,
            "contains" => Self::Contains,
            "starts-with" => Self::StartsWith,
            "name" | "local-name" => Self::Name,
            "string" => Self::String,
            "normalize-space" => Self::NormalizeSpace,
            _ => return None,
        })
    }

    /// Accepted argument counts, inclusive
    pub const fn arity(self) -> (usize, usize) {
        match self {
            Self::Last | Self::Position | Self::True | Self::False => (0, 0),
            Self::Count | Self::Not => (1, 1),
            Self::Contains | Self::StartsWith => (2, 2),
            Self::Name | Self::String | Self::NormalizeSpace => (0, 1),
        }
    }
}
