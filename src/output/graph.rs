//! Graph output for GraphViz and Mermaid
//!
//! Node ids come from the object kind, namespace and name, so a binding or
//! role reached by several grants is drawn once with all of its edges.

use regex::Regex;
use std::collections::HashSet;
use std::io::{self, Write};

use super::Printer;
use crate::permissions::PermissionResult;

/// Characters that may not appear in a DOT or Mermaid node id
const NON_ID_CHARS: &str = r"[^a-zA-Z0-9_]";

const SUBJECT_ID: &str = "subject";
const PERMISSION_ID: &str = "permission";

/// Builds node ids for RBAC objects
struct NodeIds {
    non_id: Regex,
}

impl NodeIds {
    fn new() -> io::Result<Self> {
        let non_id = Regex::new(NON_ID_CHARS).map_err(io::Error::other)?;
        Ok(Self { non_id })
    }

    fn sanitize(&self, s: &str) -> String {
        self.non_id.replace_all(s, "_").into_owned()
    }

    /// `rolebinding_dev_debuggers`, `clusterrole_exec`, ...
    fn object(&self, kind: &str, namespace: Option<&str>, name: &str) -> String {
        let qualified = match namespace {
            Some(ns) => format!("{}_{}_{}", kind, ns, name),
            None => format!("{}_{}", kind, name),
        };
        self.sanitize(&qualified.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeRole {
    Binding,
    Role,
}

#[derive(Debug)]
struct PathNode<'a> {
    id: String,
    role: NodeRole,
    kind: &'static str,
    name: &'a str,
    namespace: Option<&'a str>,
}

#[derive(Debug, PartialEq, Eq)]
struct PathEdge {
    from: String,
    to: String,
    label: &'static str,
}

/// Binding and role nodes with the edges between them, each listed once in
/// the order grants first reach them
#[derive(Debug)]
struct PathGraph<'a> {
    nodes: Vec<PathNode<'a>>,
    edges: Vec<PathEdge>,
}

impl<'a> PathGraph<'a> {
    fn build(result: &'a PermissionResult) -> io::Result<Self> {
        let ids = NodeIds::new()?;
        let mut graph = PathGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        let mut seen_nodes = HashSet::new();
        let mut seen_edges = HashSet::new();

        for grant in &result.grants {
            let binding = PathNode {
                id: ids.object(grant.binding.kind.as_str(), grant.binding.namespace.as_deref(), &grant.binding.name),
                role: NodeRole::Binding,
                kind: grant.binding.kind.as_str(),
                name: &grant.binding.name,
                namespace: grant.binding.namespace.as_deref(),
            };
            let role = PathNode {
                id: ids.object(grant.role.kind.as_str(), grant.role.namespace.as_deref(), &grant.role.name),
                role: NodeRole::Role,
                kind: grant.role.kind.as_str(),
                name: &grant.role.name,
                namespace: grant.role.namespace.as_deref(),
            };

            let edges = [
                (SUBJECT_ID.to_string(), binding.id.clone(), "binds"),
                (binding.id.clone(), role.id.clone(), "refs"),
                (role.id.clone(), PERMISSION_ID.to_string(), "grants"),
            ];
            for node in [binding, role] {
                if seen_nodes.insert(node.id.clone()) {
                    graph.nodes.push(node);
                }
            }
            for (from, to, label) in edges {
                if seen_edges.insert((from.clone(), to.clone())) {
                    graph.edges.push(PathEdge { from, to, label });
                }
            }
        }

        Ok(graph)
    }
}

fn escape_label(s: &str) -> String {
    s.replace('"', "\\\"").replace('\n', "\\n")
}

/// Mermaid reads brackets as node shapes
fn escape_mermaid(s: &str) -> String {
    s.replace('[', "(")
        .replace(']', ")")
        .replace('{', "(")
        .replace('}', ")")
        .replace('"', "'")
}

fn permission_label(result: &PermissionResult) -> String {
    format!("{} {}", result.request.verb, result.request.full_resource())
}

/// GraphViz DOT digraph: subject → binding → role → permission
#[derive(Debug, Clone, Copy, Default)]
pub struct DotPrinter;

impl Printer for DotPrinter {
    fn print(&self, out: &mut dyn Write, result: &PermissionResult) -> io::Result<()> {
        writeln!(out, "digraph rbac {{")?;
        writeln!(out, "  rankdir=LR;")?;
        writeln!(out, "  node [shape=box fontname=\"Helvetica\"];")?;
        writeln!(out, "  edge [fontname=\"Helvetica\" fontsize=10];")?;
        writeln!(out)?;

        if !result.allowed {
            writeln!(
                out,
                "  denied [label=\"DENIED\\n{} cannot {} {}\" shape=octagon style=filled fillcolor=red fontcolor=white];",
                escape_label(&result.subject.to_string()),
                escape_label(&result.request.verb),
                escape_label(&result.request.resource)
            )?;
            return writeln!(out, "}}");
        }

        let graph = PathGraph::build(result)?;
        writeln!(
            out,
            "  {} [label=\"{}\" shape=ellipse style=filled fillcolor=lightblue];",
            SUBJECT_ID,
            escape_label(&result.subject.to_string())
        )?;
        writeln!(
            out,
            "  {} [label=\"{}\" shape=diamond style=filled fillcolor=lightgreen];",
            PERMISSION_ID,
            escape_label(&permission_label(result))
        )?;

        for node in &graph.nodes {
            let mut label = format!("{}\\n{}", node.kind, escape_label(node.name));
            if let Some(ns) = node.namespace {
                label.push_str(&format!("\\n(ns: {})", escape_label(ns)));
            }
            let fill = match node.role {
                NodeRole::Binding => "lightyellow",
                NodeRole::Role => "wheat",
            };
            writeln!(out, "  {} [label=\"{}\" style=filled fillcolor={}];", node.id, label, fill)?;
        }
        for edge in &graph.edges {
            writeln!(out, "  {} -> {} [label=\"{}\"];", edge.from, edge.to, edge.label)?;
        }

        writeln!(out, "}}")
    }
}

/// Mermaid flowchart with the same shape as the DOT graph
#[derive(Debug, Clone, Copy, Default)]
pub struct MermaidPrinter;

impl Printer for MermaidPrinter {
    fn print(&self, out: &mut dyn Write, result: &PermissionResult) -> io::Result<()> {
        writeln!(out, "graph LR")?;

        if !result.allowed {
            writeln!(
                out,
                "  denied{{{{DENIED: {} cannot {} {}}}}}",
                escape_mermaid(&result.subject.to_string()),
                escape_mermaid(&result.request.verb),
                escape_mermaid(&result.request.resource)
            )?;
            return writeln!(out, "  style denied fill:#f66,stroke:#333,color:#fff");
        }

        let graph = PathGraph::build(result)?;
        writeln!(out, "  {}([{}])", SUBJECT_ID, escape_mermaid(&result.subject.to_string()))?;
        writeln!(out, "  {}{{{{{}}}}}", PERMISSION_ID, escape_mermaid(&permission_label(result)))?;

        for node in &graph.nodes {
            let mut label = format!("{}: {}", node.kind, node.name);
            if let Some(ns) = node.namespace {
                label.push_str(&format!(" ns:{}", ns));
            }
            writeln!(out, "  {}[{}]", node.id, escape_mermaid(&label))?;
        }
        for edge in &graph.edges {
            writeln!(out, "  {} -->|{}| {}", edge.from, edge.label, edge.to)?;
        }

        writeln!(out)?;
        writeln!(out, "  style {} fill:#add8e6,stroke:#333", SUBJECT_ID)?;
        writeln!(out, "  style {} fill:#90ee90,stroke:#333", PERMISSION_ID)?;
        for node in &graph.nodes {
            let fill = match node.role {
                NodeRole::Binding => "#fffacd",
                NodeRole::Role => "#f5deb3",
            };
            writeln!(out, "  style {} fill:{},stroke:#333", node.id, fill)?;
        }

        Ok(())
    }
}
