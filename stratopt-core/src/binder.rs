//! Parameter binder — applies a candidate onto a strategy template.
//!
//! Binding is by field *name*, not by path: a candidate value named `period`
//! overwrites every field called `period` anywhere in the condition tree, at
//! any depth. This is a compatibility policy, so shared names across
//! sub-conditions (e.g. an entry and an exit both using `period`) receive the
//! same value.
//!
//! The name → paths index is built once per template by a single tree walk, so
//! each `bind()` is a structural clone plus indexed writes.

use std::collections::HashMap;

use crate::candidate::Candidate;
use crate::strategy::{BoundStrategy, ConditionNode, FieldPath, PathSegment, StrategyTemplate};

/// Every field path in a condition tree, grouped by field name.
///
/// Paths for a name are kept in pre-order, so an outer field always precedes
/// any same-named field nested inside it.
#[derive(Debug, Clone, Default)]
pub struct BindingIndex {
    sites: HashMap<String, Vec<FieldPath>>,
}

impl BindingIndex {
    pub fn build(root: &ConditionNode) -> Self {
        let mut index = Self::default();
        let mut path = Vec::new();
        index.visit(root, &mut path);
        index
    }

    fn visit(&mut self, node: &ConditionNode, path: &mut FieldPath) {
        match node {
            ConditionNode::Group(fields) => {
                for (name, child) in fields {
                    path.push(PathSegment::Field(name.clone()));
                    self.sites.entry(name.clone()).or_default().push(path.clone());
                    self.visit(child, path);
                    path.pop();
                }
            }
            ConditionNode::List(items) => {
                for (i, child) in items.iter().enumerate() {
                    path.push(PathSegment::Index(i));
                    self.visit(child, path);
                    path.pop();
                }
            }
            _ => {}
        }
    }

    /// All paths of fields named `name` (empty if none).
    pub fn sites(&self, name: &str) -> &[FieldPath] {
        self.sites.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sites.contains_key(name)
    }
}

/// Binds candidates onto one shared, read-only template.
#[derive(Debug, Clone)]
pub struct Binder {
    template: StrategyTemplate,
    index: BindingIndex,
}

impl Binder {
    pub fn new(template: StrategyTemplate) -> Self {
        let index = BindingIndex::build(&template.conditions);
        Self { template, index }
    }

    pub fn template(&self) -> &StrategyTemplate {
        &self.template
    }

    pub fn index(&self) -> &BindingIndex {
        &self.index
    }

    /// Produce an independent, fully-parameterized copy of the template.
    ///
    /// Candidate names with no matching field are ignored.
    pub fn bind(&self, candidate: &Candidate) -> BoundStrategy {
        let mut conditions = self.template.conditions.clone();
        for (name, value) in candidate.iter() {
            for path in self.index.sites(name) {
                // An outer same-named field may already have replaced this subtree.
                if let Some(node) = conditions.get_path_mut(path) {
                    *node = ConditionNode::Number(value);
                }
            }
        }
        BoundStrategy {
            name: self.template.name.clone(),
            symbol: self.template.symbol.clone(),
            timeframe: self.template.timeframe.clone(),
            conditions,
            parameters: candidate.clone(),
        }
    }

    /// Names from `names` that match no field in the template.
    pub fn unbound<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter(|name| !self.index.contains(name))
            .map(str::to_string)
            .collect()
    }
}

/// One-shot bind without keeping an index around.
pub fn bind(template: &StrategyTemplate, candidate: &Candidate) -> BoundStrategy {
    Binder::new(template.clone()).bind(candidate)
}
