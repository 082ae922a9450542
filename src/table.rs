//! Semantic-table serialization.
//!
//! The interchange form is a JSON array of `(depth, kind, min, max, name?)`
//! tuples. An external tool may emit one (see [`generate`]); the checker
//! loads one with exact-path diagnostics on malformed input.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::node::{NodeId, NodeType, Tree};
use crate::semantic::Rule;
use crate::walk::walk;

/// Serialized form of one rule. `max: 0` means unbounded above.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub depth: u32,
    pub kind: NodeType,
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RuleSpec {
    pub fn into_rule(self) -> Rule {
        Rule {
            depth: self.depth,
            kind: self.kind,
            min: self.min,
            max: self.max,
            name: self.name,
            count: 0,
            check: None,
        }
    }
}

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

/// Load a rule table from its JSON text.
pub fn load_rules(src: &str) -> Result<Vec<Rule>, String> {
    let specs: Vec<RuleSpec> = from_str_with_path(src)?;
    Ok(specs.into_iter().map(RuleSpec::into_rule).collect())
}

/// Serialize a rule table for interchange.
pub fn to_specs(rules: &[Rule]) -> Vec<RuleSpec> {
    rules
        .iter()
        .map(|r| RuleSpec {
            depth: r.depth,
            kind: r.kind,
            min: r.min,
            max: r.max,
            name: r.name.clone(),
        })
        .collect()
}

/// Generate an exhaustive table from an exemplar tree: one spec per distinct
/// `(depth, kind, member-name)` triple, `min = max = observed count`, in
/// first-seen pre-order. The exemplar passes its own table under the deny
/// policy; authors relax bounds by hand afterwards.
pub fn generate(tree: &Tree, root: NodeId) -> Vec<RuleSpec> {
    let mut seen: IndexMap<(u32, NodeType, Option<String>), u32> = IndexMap::new();
    walk(tree, root, None, &mut |tree, id, depth| {
        let kind = tree.node(id).node_type();
        let name = match kind {
            NodeType::Member => tree
                .member_name(id)
                .and_then(|n| std::str::from_utf8(n).ok())
                .map(str::to_string),
            _ => None,
        };
        *seen.entry((depth, kind, name)).or_insert(0) += 1;
    });

    seen.into_iter()
        .map(|((depth, kind, name), count)| RuleSpec { depth, kind, min: count, max: count, name })
        .collect()
}
