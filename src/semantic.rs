//! Semantic-table validation and typed member accessors.
//!
//! A table is an ordered list of [`Rule`]s. One walk over the tree matches
//! every visited node against the first rule (in table order) whose depth,
//! variant, and (for named member rules) decoded name agree. Counts are
//! compared against each rule's `[min, max]` range after the walk; all
//! violations are accumulated, never short-circuited.

use std::borrow::Cow;

use chrono::{DateTime, Utc};

use crate::convert::StringFacts;
use crate::error::CheckError;
use crate::node::{NodeId, NodeKind, NodeType, Tree};
use crate::walk::walk;

/// Per-node check a rule may carry; its error is collected without aborting
/// the walk.
pub type NodeCheck = fn(&Tree, NodeId) -> Result<(), CheckError>;

/// One semantic descriptor. `max == 0` means unbounded above. `name` makes
/// the rule match only member nodes whose decoded name equals it exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub depth: u32,
    pub kind: NodeType,
    pub min: u32,
    pub max: u32,
    pub name: Option<String>,
    pub count: u32,
    pub check: Option<NodeCheck>,
}

impl Rule {
    pub fn new(depth: u32, kind: NodeType, min: u32, max: u32) -> Self {
        Self { depth, kind, min, max, name: None, count: 0, check: None }
    }

    pub fn named(depth: u32, name: &str, min: u32, max: u32) -> Self {
        Self {
            depth,
            kind: NodeType::Member,
            min,
            max,
            name: Some(name.to_string()),
            count: 0,
            check: None,
        }
    }

    pub fn with_check(mut self, check: NodeCheck) -> Self {
        self.check = Some(check);
        self
    }

    fn matches(&self, tree: &Tree, id: NodeId, depth: u32) -> bool {
        if depth != self.depth || tree.node(id).node_type() != self.kind {
            return false;
        }
        match &self.name {
            None => true,
            Some(name) => tree.member_name(id) == Some(name.as_bytes()),
        }
    }

    fn in_range(&self) -> bool {
        self.count >= self.min && (self.max == 0 || self.count <= self.max)
    }

    fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("member {name:?} at depth {}", self.depth),
            None => format!("{} at depth {}", self.kind, self.depth),
        }
    }
}

/// What to do with a node no rule matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnknownPolicy {
    /// Flag it; the right choice against an exhaustive table.
    Deny,
    /// Ignore it silently.
    Allow,
}

/// Run the table over the tree. Rule counts are reset, accumulated during
/// one full walk, then range-checked. The tree is never written; only the
/// caller-owned rule counts are.
pub fn check_tree(
    tree: &Tree,
    root: NodeId,
    rules: &mut [Rule],
    policy: UnknownPolicy,
) -> Vec<CheckError> {
    for rule in rules.iter_mut() {
        rule.count = 0;
    }

    let mut errors = Vec::new();
    walk(tree, root, None, &mut |tree, id, depth| {
        match rules.iter_mut().find(|r| r.matches(tree, id, depth)) {
            Some(rule) => {
                rule.count += 1;
                if let Some(check) = rule.check {
                    if let Err(err) = check(tree, id) {
                        errors.push(err);
                    }
                }
            }
            None => {
                if policy == UnknownPolicy::Deny {
                    errors.push(CheckError::UnknownNode {
                        kind: tree.node(id).node_type(),
                        depth,
                    });
                }
            }
        }
    });

    for rule in rules.iter() {
        if !rule.in_range() {
            let bound = if rule.max == 0 { "*".to_string() } else { rule.max.to_string() };
            errors.push(CheckError::SemanticViolation {
                detail: format!(
                    "{}: count {} outside [{}, {}]",
                    rule.describe(),
                    rule.count,
                    rule.min,
                    bound
                )
                .into(),
            });
        }
    }

    errors
}

// ----------------------------- accessors ---------------------------------- //

fn violation_static(detail: &'static str) -> CheckError {
    CheckError::SemanticViolation { detail: Cow::Borrowed(detail) }
}

fn violation(detail: String) -> CheckError {
    CheckError::SemanticViolation { detail: Cow::Owned(detail) }
}

/// Find a direct member of `object` by decoded name.
pub fn member_named(tree: &Tree, object: NodeId, name: &str) -> Result<NodeId, CheckError> {
    let NodeKind::Object(_) = tree.node(object).kind else {
        return Err(violation_static("not an object node"));
    };
    tree.members(object)
        .iter()
        .copied()
        .find(|&m| tree.member_name(m) == Some(name.as_bytes()))
        .ok_or_else(|| violation(format!("no member named {name:?}")))
}

/// Confirm `member` is a converted member and return its value node.
pub fn member_value(tree: &Tree, member: NodeId) -> Result<NodeId, CheckError> {
    let node = tree.node(member);
    let NodeKind::Member { value, .. } = &node.kind else {
        return Err(violation_static("not a member node"));
    };
    if !node.converted() {
        return Err(violation_static("member is not converted"));
    }
    value.ok_or_else(|| violation_static("member has no value"))
}

/// Decoded string facts of a member's string value.
pub fn member_string<'t>(tree: &'t Tree, member: NodeId) -> Result<&'t StringFacts, CheckError> {
    let value = member_value(tree, member)?;
    match &tree.node(value).kind {
        NodeKind::String(Some(facts)) => Ok(facts),
        NodeKind::String(None) => Err(violation_static("member value is an unconverted string")),
        other => Err(violation(format!(
            "member value is {}, expected string",
            type_of(other)
        ))),
    }
}

/// Boolean value of a member.
pub fn member_boolean(tree: &Tree, member: NodeId) -> Result<bool, CheckError> {
    let value = member_value(tree, member)?;
    match &tree.node(value).kind {
        NodeKind::Boolean(Some(b)) => Ok(*b),
        NodeKind::Boolean(None) => Err(violation_static("member value is an unconverted boolean")),
        other => Err(violation(format!(
            "member value is {}, expected boolean",
            type_of(other)
        ))),
    }
}

/// 64-bit integer value of a member; the literal must fit i64 exactly.
pub fn member_integer(tree: &Tree, member: NodeId) -> Result<i64, CheckError> {
    let value = member_value(tree, member)?;
    match &tree.node(value).kind {
        NodeKind::Number(Some(facts)) => facts
            .ints
            .i64
            .ok_or_else(|| violation_static("member value does not fit a 64-bit integer")),
        NodeKind::Number(None) => Err(violation_static("member value is an unconverted number")),
        other => Err(violation(format!(
            "member value is {}, expected number",
            type_of(other)
        ))),
    }
}

/// Time value of a member: an RFC 3339 string or integer epoch seconds.
pub fn member_time(tree: &Tree, member: NodeId) -> Result<DateTime<Utc>, CheckError> {
    let value = member_value(tree, member)?;
    match &tree.node(value).kind {
        NodeKind::String(Some(facts)) => {
            let text = std::str::from_utf8(&facts.decoded)
                .map_err(|_| violation_static("time value is not UTF-8"))?;
            DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|err| violation(format!("time value {text:?}: {err}")))
        }
        NodeKind::Number(Some(facts)) => {
            let secs = facts
                .ints
                .i64
                .ok_or_else(|| violation_static("epoch value does not fit a 64-bit integer"))?;
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| violation(format!("epoch value {secs} out of range")))
        }
        other => Err(violation(format!(
            "member value is {}, expected string or number",
            type_of(other)
        ))),
    }
}

fn type_of(kind: &NodeKind) -> NodeType {
    // Mirror of Node::node_type for a bare kind.
    match kind {
        NodeKind::Number(_) => NodeType::Number,
        NodeKind::String(_) => NodeType::String,
        NodeKind::Boolean(_) => NodeType::Boolean,
        NodeKind::Null(_) => NodeType::Null,
        NodeKind::Object(_) => NodeType::Object,
        NodeKind::Member { .. } => NodeType::Member,
        NodeKind::Array(_) => NodeType::Array,
        NodeKind::Elements(_) => NodeType::Elements,
        NodeKind::Unset => NodeType::Unset,
    }
}
