//! Cycle-breaking JSON sanitizer used before persisting a project (§4.1,
//! testable property 6). Values here are already `serde_json::Value`, so
//! "unknown objects" in the original Python sense don't arise; we instead
//! guard against the one thing `serde_json::Value` *can* still represent:
//! externally-constructed cyclic graphs passed in as pre-built trees via
//! `sanitize_graph`, used by host embedders that hold `Rc`/`Arc` graphs
//! before they ever become `Value`.

use std::collections::HashSet;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    Cycle,
    UnknownObject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub path: String,
    pub note: String,
}

/// Sanitize an already-acyclic `serde_json::Value` tree: this is a
/// pass-through that exists to keep the call site (`autosave`, exporters)
/// uniform with `sanitize_graph`. Reports no issues for ordinary JSON.
pub fn sanitize(value: &Value) -> (Value, Vec<Issue>) {
    (value.clone(), Vec::new())
}

/// A minimal node graph abstraction for host-side cyclic structures: a node
/// has a path segment, a scalar-or-children shape. Embedders that hold
/// reference-counted cyclic state serialize through this type rather than
/// `serde_json::Value` (which itself cannot represent a cycle).
pub trait GraphNode {
    fn id(&self) -> usize;
    fn scalar(&self) -> Option<Value>;
    fn children(&self) -> Vec<(String, Box<dyn GraphNode + '_>)>;
}

/// Sanitize a potentially-cyclic graph into an acyclic `Value`, breaking
/// cycles with a `<CYCLE:path>` marker string and recording one issue per
/// cycle detected (plus one per node whose shape we don't recognize).
pub fn sanitize_graph(root: &dyn GraphNode) -> (Value, Vec<Issue>) {
    let mut issues = Vec::new();
    let mut stack = HashSet::new();
    let out = walk(root, "$", &mut stack, &mut issues);
    (out, issues)
}

fn walk(
    node: &dyn GraphNode,
    path: &str,
    stack: &mut HashSet<usize>,
    issues: &mut Vec<Issue>,
) -> Value {
    if !stack.insert(node.id()) {
        issues.push(Issue {
            kind: IssueKind::Cycle,
            path: path.to_string(),
            note: format!("cycle detected revisiting node {}", node.id()),
        });
        return Value::String(format!("<CYCLE:{path}>"));
    }

    let out = if let Some(scalar) = node.scalar() {
        scalar
    } else {
        let mut map = serde_json::Map::new();
        for (key, child) in node.children() {
            let child_path = format!("{path}.{key}");
            map.insert(key, walk(child.as_ref(), &child_path, stack, issues));
        }
        Value::Object(map)
    };

    stack.remove(&node.id());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestNode {
        id: usize,
        scalar: Option<Value>,
        children: Vec<(String, usize)>,
        all: std::rc::Rc<Vec<TestNodeDef>>,
    }

    struct TestNodeDef {
        id: usize,
        scalar: Option<Value>,
        children: Vec<(String, usize)>,
    }

    impl GraphNode for TestNode {
        fn id(&self) -> usize {
            self.id
        }
        fn scalar(&self) -> Option<Value> {
            self.scalar.clone()
        }
        fn children(&self) -> Vec<(String, Box<dyn GraphNode + '_>)> {
            self.children
                .iter()
                .map(|(name, id)| {
                    let def = self.all.iter().find(|d| d.id == *id).unwrap();
                    let node: Box<dyn GraphNode> = Box::new(TestNode {
                        id: def.id,
                        scalar: def.scalar.clone(),
                        children: def.children.clone(),
                        all: self.all.clone(),
                    });
                    (name.clone(), node)
                })
                .collect()
        }
    }

    #[test]
    fn acyclic_round_trips() {
        let defs = std::rc::Rc::new(vec![
            TestNodeDef { id: 0, scalar: None, children: vec![("a".into(), 1)] },
            TestNodeDef { id: 1, scalar: Some(Value::from(42)), children: vec![] },
        ]);
        let root = TestNode { id: 0, scalar: None, children: vec![("a".into(), 1)], all: defs };
        let (v, issues) = sanitize_graph(&root);
        assert!(issues.is_empty());
        assert_eq!(v["a"], 42);
    }

    #[test]
    fn cycle_is_broken_and_reported() {
        let defs = std::rc::Rc::new(vec![
            TestNodeDef { id: 0, scalar: None, children: vec![("self".into(), 0)] },
        ]);
        let root = TestNode { id: 0, scalar: None, children: vec![("self".into(), 0)], all: defs };
        let (v, issues) = sanitize_graph(&root);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Cycle);
        assert!(v["self"].as_str().unwrap().starts_with("<CYCLE:"));
    }
}
