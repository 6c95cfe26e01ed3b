//! Strategy templates — a named strategy with a nested condition tree.
//!
//! The condition tree is a tagged-variant structure, so copying a template is a
//! plain structural `Clone` with no lossy serialize/deserialize round trip.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::candidate::Candidate;

/// One node of a strategy's condition tree.
///
/// Deserializes from arbitrary JSON: objects become `Group`, arrays `List`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ConditionNode>),
    Group(BTreeMap<String, ConditionNode>),
}

/// One step along a path into a condition tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Location of a node, from the root.
pub type FieldPath = Vec<PathSegment>;

impl ConditionNode {
    /// Build a `Group` from `(name, node)` pairs.
    pub fn group<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ConditionNode)>,
    {
        ConditionNode::Group(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConditionNode::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Direct child field of a `Group`.
    pub fn field(&self, name: &str) -> Option<&ConditionNode> {
        match self {
            ConditionNode::Group(fields) => fields.get(name),
            _ => None,
        }
    }

    pub fn get_path(&self, path: &[PathSegment]) -> Option<&ConditionNode> {
        path.iter().try_fold(self, |node, segment| match (node, segment) {
            (ConditionNode::Group(fields), PathSegment::Field(name)) => fields.get(name),
            (ConditionNode::List(items), PathSegment::Index(i)) => items.get(*i),
            _ => None,
        })
    }

    pub fn get_path_mut(&mut self, path: &[PathSegment]) -> Option<&mut ConditionNode> {
        path.iter().try_fold(self, |node, segment| match (node, segment) {
            (ConditionNode::Group(fields), PathSegment::Field(name)) => fields.get_mut(name),
            (ConditionNode::List(items), PathSegment::Index(i)) => items.get_mut(*i),
            _ => None,
        })
    }
}

/// A strategy definition as authored, before parameter binding.
///
/// Shared read-only by every binding; never mutated by the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyTemplate {
    pub name: String,
    pub symbol: String,
    pub timeframe: String,
    pub conditions: ConditionNode,
}

/// A fully-parameterized strategy instance, owned independently of its template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundStrategy {
    pub name: String,
    pub symbol: String,
    pub timeframe: String,
    pub conditions: ConditionNode,
    /// The candidate that produced this binding.
    pub parameters: Candidate,
}
