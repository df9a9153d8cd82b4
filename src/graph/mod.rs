//! Core graph data structures

mod edge;
mod label;
mod node;


pub use edge::{Edge, EdgeId, EdgeKind};
pub use label::{
    canonical_name, joint_concept_name, normalized_name, sanitize_label, JOINT_SEPARATOR,
    LABEL_PREFIX,
};
pub use node::{Node, NodeId, NodeType};
