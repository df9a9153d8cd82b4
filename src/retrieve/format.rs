//! Text serialization of a ranked subgraph for downstream generation
//!
//! ```text
//! NODES:
//! Form: Magpie (rank=1.0000)
//! - A black and white bird
//! RELATIONSHIPS:
//! Magpie -[CONNOTES]-> Good News (rank=0.8000)
//! - Announces visitors
//! ```
//!
//! Every entry is exactly two lines; line breaks inside names and
//! descriptions become spaces. A missing description prints as a bare `-`.

use super::result::RankedSubgraph;
use std::fmt::Write;

/// Render nodes then relationships, keeping the subgraph's order.
pub fn format_context(subgraph: &RankedSubgraph) -> String {
    let mut out = String::from("NODES:\n");
    for node in &subgraph.nodes {
        let _ = writeln!(
            out,
            "{}: {} (rank={:.4})",
            node.node_type,
            single_line(&node.name),
            node.rank
        );
        push_description(&mut out, node.description.as_deref());
    }

    out.push_str("RELATIONSHIPS:\n");
    for edge in &subgraph.edges {
        let _ = writeln!(
            out,
            "{} -[{}]-> {} (rank={:.4})",
            single_line(&edge.source_name),
            edge.kind,
            single_line(&edge.target_name),
            edge.rank
        );
        push_description(&mut out, edge.description.as_deref());
    }
    out
}

fn push_description(out: &mut String, description: Option<&str>) {
    match description.map(single_line).filter(|d| !d.is_empty()) {
        Some(d) => {
            let _ = writeln!(out, "- {d}");
        }
        None => out.push_str("-\n"),
    }
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeId, EdgeKind, NodeId, NodeType};
    use crate::retrieve::{RankedEdge, RankedNode};

    fn sample() -> RankedSubgraph {
        RankedSubgraph {
            nodes: vec![
                RankedNode {
                    id: NodeId::from_string("n1"),
                    node_type: NodeType::Form,
                    name: "Magpie".into(),
                    description: Some("A black and white bird\nseen at dawn".into()),
                    aliases: vec![],
                    rank: 1.0,
                    is_seed: true,
                    degree: 1,
                },
                RankedNode {
                    id: NodeId::from_string("n2"),
                    node_type: NodeType::Concept,
                    name: "Good News".into(),
                    description: None,
                    aliases: vec![],
                    rank: 0.65,
                    is_seed: false,
                    degree: 1,
                },
            ],
            edges: vec![RankedEdge {
                id: EdgeId::from_string("e1"),
                kind: EdgeKind::Connotes,
                source: NodeId::from_string("n1"),
                target: NodeId::from_string("n2"),
                source_name: "Magpie".into(),
                target_name: "Good News".into(),
                description: Some("Announces visitors".into()),
                rank: 0.41666,
            }],
        }
    }

    #[test]
    fn renders_nodes_then_relationships() {
        let text = format_context(&sample());
        let expected = "\
NODES:
Form: Magpie (rank=1.0000)
- A black and white bird seen at dawn
Concept: Good News (rank=0.6500)
-
RELATIONSHIPS:
Magpie -[CONNOTES]-> Good News (rank=0.4167)
- Announces visitors
";
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_subgraph_has_only_headers() {
        assert_eq!(format_context(&RankedSubgraph::default()), "NODES:\nRELATIONSHIPS:\n");
    }

    #[test]
    fn json_output_uses_wire_names() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["nodes"][0]["type"], "Form");
        assert_eq!(json["nodes"][0]["isSeed"], true);
        assert!(json["nodes"][0].get("is_seed").is_none());
        assert_eq!(json["edges"][0]["kind"], "CONNOTES");
        assert_eq!(json["edges"][0]["source_name"], "Magpie");
    }
}
