//! XPath evaluation against an owned element tree

use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::{Content, Element, NodePath};
use crate::xpath::ast::{Axis, CmpOp, Expr, Function, LocationPath, NodeTest, Step};

/// A node of the XPath data model, addressed relative to the root element
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// The document node above the root element
    Document,
    Element(NodePath),
    Attribute(NodePath, String),
    /// Text child at `index` of the element at the path
    Text(NodePath, usize),
}

impl Node {
    /// Sort key reproducing document order
    fn order_key(&self) -> (NodePath, u8, String) {
        match self {
            Self::Document => (Vec::new(), 0, String::new()),
            Self::Element(path) => (path.clone(), 1, String::new()),
            Self::Attribute(path, name) => (path.clone(), 2, name.clone()),
            Self::Text(path, index) => {
                let mut key = path.clone();
                key.push(*index);
                (key, 1, String::new())
            }
        }
    }
}

/// Result of evaluating an expression
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nodes(Vec<Node>),
    Str(String),
    Num(f64),
    Bool(bool),
}

#[derive(Clone, Copy, Debug)]
struct Context<'n> {
    node: &'n Node,
    position: usize,
    size: usize,
}

/// Evaluator bound to one tree
#[derive(Debug)]
pub struct Evaluator<'t> {
    root: &'t Element,
}

impl<'t> Evaluator<'t> {
    pub const fn new(root: &'t Element) -> Self {
        Self { root }
    }

    /// Evaluate with the root element as context node
    pub fn evaluate(&self, expr: &Expr) -> Result<Value> {
        let node = Node::Element(Vec::new());
        let ctx = Context {
            node: &node,
            position: 1,
            size: 1,
        };
        self.eval(expr, ctx)
    }

    fn eval(&self, expr: &Expr, ctx: Context<'_>) -> Result<Value> {
        Ok(match expr {
            Expr::Literal(s) => Value::Str(s.clone()),
            Expr::Number(n) => Value::Num(*n),
            Expr::Path(path) => Value::Nodes(self.eval_path(path, ctx)?),
            Expr::And(lhs, rhs) => Value::Bool(
                atom_to_bool(&self.eval(lhs, ctx)?) && atom_to_bool(&self.eval(rhs, ctx)?),
            ),
            Expr::Or(lhs, rhs) => Value::Bool(
                atom_to_bool(&self.eval(lhs, ctx)?) || atom_to_bool(&self.eval(rhs, ctx)?),
            ),
            Expr::Union(lhs, rhs) => {
                let (Value::Nodes(mut left), Value::Nodes(right)) =
                    (self.eval(lhs, ctx)?, self.eval(rhs, ctx)?)
                else {
                    return Err(type_error("union of non node-sets"));
                };
                left.extend(right);
                Value::Nodes(document_order(left))
            }
            Expr::Compare(lhs, op, rhs) => {
                let left = self.eval(lhs, ctx)?;
                let right = self.eval(rhs, ctx)?;
                Value::Bool(self.compare(&left, *op, &right))
            }
            Expr::Function(function, args) => self.call(*function, args, ctx)?,
            Expr::Filter(base, predicates) => {
                let nodes = self.eval_nodes(base, ctx, "predicate on a non node-set")?;
                Value::Nodes(self.filter(nodes, predicates)?)
            }
            Expr::PathFrom(base, steps) => {
                let nodes = self.eval_nodes(base, ctx, "path step from a non node-set")?;
                Value::Nodes(self.walk(nodes, steps)?)
            }
        })
    }

    fn eval_nodes(&self, expr: &Expr, ctx: Context<'_>, message: &str) -> Result<Vec<Node>> {
        match self.eval(expr, ctx)? {
            Value::Nodes(nodes) => Ok(document_order(nodes)),
            _ => Err(type_error(message)),
        }
    }

    fn eval_path(&self, path: &LocationPath, ctx: Context<'_>) -> Result<Vec<Node>> {
        let start = if path.absolute {
            vec![Node::Document]
        } else {
            vec![ctx.node.clone()]
        };
        self.walk(start, &path.steps)
    }

    fn walk(&self, mut current: Vec<Node>, steps: &[Step]) -> Result<Vec<Node>> {
        for step in steps {
            let mut next = Vec::new();
            for node in &current {
                next.extend(self.eval_step(step, node)?);
            }
            current = document_order(next);
        }
        Ok(current)
    }

    fn eval_step(&self, step: &Step, node: &Node) -> Result<Vec<Node>> {
        let candidates: Vec<Node> = self
            .axis(node, step.axis)
            .into_iter()
            .filter(|n| self.matches(n, &step.test, step.axis))
            .collect();
        self.filter(candidates, &step.predicates)
    }

    /// Keep the candidates every predicate accepts, numbering them in the
    /// order given
    fn filter(&self, mut candidates: Vec<Node>, predicates: &[Expr]) -> Result<Vec<Node>> {
        for predicate in predicates {
            let size = candidates.len();
            let mut kept = Vec::with_capacity(size);
            for (idx, candidate) in candidates.iter().enumerate() {
                let ctx = Context {
                    node: candidate,
                    position: idx + 1,
                    size,
                };
                let keep = match self.eval(predicate, ctx)? {
                    Value::Num(n) => position_matches(n, idx + 1),
                    other => atom_to_bool(&other),
                };
                if keep {
                    kept.push(candidate.clone());
                }
            }
            candidates = kept;
        }
        Ok(candidates)
    }

    /// Nodes along `axis`, in proximity order
    fn axis(&self, node: &Node, axis: Axis) -> Vec<Node> {
        match axis {
            Axis::Child => self.children(node),
            Axis::Descendant => {
                let mut out = Vec::new();
                self.descendants(node, &mut out);
                out
            }
            Axis::DescendantOrSelf => {
                let mut out = vec![node.clone()];
                self.descendants(node, &mut out);
                out
            }
            Axis::Parent => parent(node).into_iter().collect(),
            Axis::Ancestor => ancestors(node),
            Axis::AncestorOrSelf => {
                let mut out = vec![node.clone()];
                out.extend(ancestors(node));
                out
            }
            Axis::SelfAxis => vec![node.clone()],
            Axis::Attribute => match node {
                Node::Element(path) => self
                    .root
                    .get(path)
                    .map(|e| {
                        e.attributes
                            .keys()
                            .map(|k| Node::Attribute(path.clone(), k.clone()))
                            .collect()
                    })
                    .unwrap_or_default(),
                _ => Vec::new(),
            },
        }
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        match node {
            Node::Document => vec![Node::Element(Vec::new())],
            Node::Element(path) => {
                let Some(element) = self.root.get(path) else {
                    return Vec::new();
                };
                element
                    .children
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, child)| match child {
                        Content::Element(_) => {
                            let mut p = path.clone();
                            p.push(idx);
                            Some(Node::Element(p))
                        }
                        Content::Text(_) => Some(Node::Text(path.clone(), idx)),
                        Content::Comment(_) => None,
                    })
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn descendants(&self, node: &Node, out: &mut Vec<Node>) {
        for child in self.children(node) {
            out.push(child.clone());
            self.descendants(&child, out);
        }
    }

    fn matches(&self, node: &Node, test: &NodeTest, axis: Axis) -> bool {
        match (test, node) {
            (NodeTest::AnyNode, _) => true,
            (NodeTest::Text, Node::Text(..)) => true,
            (NodeTest::Wildcard, Node::Attribute(..)) => axis == Axis::Attribute,
            (NodeTest::Wildcard, Node::Element(_)) => axis != Axis::Attribute,
            (NodeTest::Name(name), Node::Attribute(_, attr)) => {
                axis == Axis::Attribute && attr == name
            }
            (NodeTest::Name(name), Node::Element(path)) => {
                axis != Axis::Attribute && self.root.get(path).is_some_and(|e| &e.name == name)
            }
            _ => false,
        }
    }

    fn call(&self, function: Function, args: &[Expr], ctx: Context<'_>) -> Result<Value> {
        let arg = |idx: usize| -> Result<Option<Value>> {
            args.get(idx).map(|a| self.eval(a, ctx)).transpose()
        };

        Ok(match function {
            Function::Last => Value::Num(count_to_f64(ctx.size)),
            Function::Position => Value::Num(count_to_f64(ctx.position)),
            Function::True => Value::Bool(true),
            Function::False => Value::Bool(false),
            Function::Not => {
                let value = arg(0)?.ok_or_else(|| type_error("not() needs an argument"))?;
                Value::Bool(!atom_to_bool(&value))
            }
            Function::Count => match arg(0)? {
                Some(Value::Nodes(nodes)) => Value::Num(count_to_f64(nodes.len())),
                _ => return Err(type_error("count() needs a node-set")),
            },
            Function::Contains | Function::StartsWith => {
                let haystack = arg(0)?.map(|v| self.value_to_string(&v)).unwrap_or_default();
                let needle = arg(1)?.map(|v| self.value_to_string(&v)).unwrap_or_default();
                Value::Bool(if function == Function::Contains {
                    haystack.contains(&needle)
                } else {
                    haystack.starts_with(&needle)
                })
            }
            Function::Name => {
                let node = match arg(0)? {
                    Some(Value::Nodes(nodes)) => nodes.into_iter().next(),
                    Some(_) => return Err(type_error("name() needs a node-set")),
                    None => Some(ctx.node.clone()),
                };
                Value::Str(node.map(|n| self.node_name(&n)).unwrap_or_default())
            }
            Function::String => {
                let value = arg(0)?.unwrap_or_else(|| Value::Nodes(vec![ctx.node.clone()]));
                Value::Str(self.value_to_string(&value))
            }
            Function::NormalizeSpace => {
                let value = arg(0)?.unwrap_or_else(|| Value::Nodes(vec![ctx.node.clone()]));
                let text = self.value_to_string(&value);
                Value::Str(text.split_whitespace().collect::<Vec<_>>().join(" "))
            }
        })
    }

    fn compare(&self, left: &Value, op: CmpOp, right: &Value) -> bool {
        match (left, right) {
            (Value::Nodes(l), Value::Nodes(r)) => l.iter().any(|a| {
                let a = self.string_value(a);
                r.iter()
                    .any(|b| compare_atoms(&Value::Str(a.clone()), op, &Value::Str(self.string_value(b))))
            }),
            (Value::Nodes(nodes), Value::Bool(_)) => {
                compare_atoms(&Value::Bool(!nodes.is_empty()), op, right)
            }
            (Value::Bool(_), Value::Nodes(nodes)) => {
                compare_atoms(left, op, &Value::Bool(!nodes.is_empty()))
            }
            (Value::Nodes(nodes), atom) => nodes
                .iter()
                .any(|n| compare_atoms(&Value::Str(self.string_value(n)), op, atom)),
            (atom, Value::Nodes(nodes)) => nodes
                .iter()
                .any(|n| compare_atoms(atom, op, &Value::Str(self.string_value(n)))),
            (a, b) => compare_atoms(a, op, b),
        }
    }

    fn value_to_string(&self, value: &Value) -> String {
        match value {
            Value::Nodes(nodes) => nodes
                .first()
                .map(|n| self.string_value(n))
                .unwrap_or_default(),
            other => atom_to_string(other),
        }
    }

    fn string_value(&self, node: &Node) -> String {
        match node {
            Node::Document => text_content(self.root),
            Node::Element(path) => self.root.get(path).map(text_content).unwrap_or_default(),
            Node::Attribute(path, name) => self
                .root
                .get(path)
                .and_then(|e| e.attr(name))
                .map(str::to_string)
                .unwrap_or_default(),
            Node::Text(path, idx) => match self.root.get(path).and_then(|e| e.children.get(*idx)) {
                Some(Content::Text(text)) => text.clone(),
                _ => String::new(),
            },
        }
    }

    fn node_name(&self, node: &Node) -> String {
        match node {
            Node::Element(path) => self
                .root
                .get(path)
                .map(|e| e.name.clone())
                .unwrap_or_default(),
            Node::Attribute(_, name) => name.clone(),
            _ => String::new(),
        }
    }
}

fn parent(node: &Node) -> Option<Node> {
    match node {
        Node::Document => None,
        Node::Element(path) => Some(match path.split_last() {
            Some((_, parent)) => Node::Element(parent.to_vec()),
            None => Node::Document,
        }),
        Node::Attribute(path, _) | Node::Text(path, _) => Some(Node::Element(path.clone())),
    }
}

fn ancestors(node: &Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut current = parent(node);
    while let Some(node) = current {
        current = parent(&node);
        out.push(node);
    }
    out
}

fn document_order(mut nodes: Vec<Node>) -> Vec<Node> {
    nodes.sort_by_key(Node::order_key);
    nodes.dedup();
    nodes
}

fn text_content(element: &Element) -> String {
    let mut out = String::new();
    for child in &element.children {
        match child {
            Content::Text(text) => out.push_str(text),
            Content::Element(child) => out.push_str(&text_content(child)),
            Content::Comment(_) => {}
        }
    }
    out
}

fn position_matches(n: f64, position: usize) -> bool {
    n.fract() == 0.0 && n >= 1.0 && n == count_to_f64(position)
}

fn count_to_f64(n: usize) -> f64 {
    u32::try_from(n).map(f64::from).unwrap_or(f64::MAX)
}

fn atom_to_number(value: &Value) -> f64 {
    match value {
        Value::Num(n) => *n,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Str(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Nodes(_) => f64::NAN,
    }
}

fn atom_to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Num(n) => *n != 0.0 && !n.is_nan(),
        Value::Str(s) => !s.is_empty(),
        Value::Nodes(nodes) => !nodes.is_empty(),
    }
}

fn atom_to_string(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Num(n) if n.is_nan() => "NaN".to_string(),
        Value::Num(n) if n.fract() == 0.0 => format!("{n:.0}"),
        Value::Num(n) => n.to_string(),
        Value::Nodes(_) => String::new(),
    }
}

fn compare_atoms(left: &Value, op: CmpOp, right: &Value) -> bool {
    match op {
        CmpOp::Eq | CmpOp::NotEq => {
            let equal = match (left, right) {
                (Value::Bool(_), _) | (_, Value::Bool(_)) => {
                    atom_to_bool(left) == atom_to_bool(right)
                }
                (Value::Num(_), _) | (_, Value::Num(_)) => {
                    atom_to_number(left) == atom_to_number(right)
                }
                _ => atom_to_string(left) == atom_to_string(right),
            };
            (op == CmpOp::Eq) == equal
        }
        CmpOp::Lt => atom_to_number(left) < atom_to_number(right),
        CmpOp::LtEq => atom_to_number(left) <= atom_to_number(right),
        CmpOp::Gt => atom_to_number(left) > atom_to_number(right),
        CmpOp::GtEq => atom_to_number(left) >= atom_to_number(right),
    }
}

fn type_error(message: &str) -> Error {
    Error::with_message(
        ErrorKind::InvalidXPath {
            expr: String::new(),
        },
        Span::empty(),
        message,
    )
}
