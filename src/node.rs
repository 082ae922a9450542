//! Parse-tree node model.
//!
//! Arena ownership: a [`Tree`] owns every node in a flat vector and hands out
//! [`NodeId`] index handles. Parent and sibling links are non-owning
//! back-references set when a container attaches its children; they exist for
//! read-time context only and are never consulted for destruction; dropping
//! the `Tree` is the single tree-rooted free.
//!
//! Convertedness is structural: each variant's typed payload is an `Option`,
//! and [`Node::converted`] derives the flag from payload presence, so a node
//! can never claim conversion without its typed fields being populated.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::convert::{self, NumberFacts, StringFacts};

/// Fieldless tag mirror of [`NodeKind`], used by the semantic-table format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Number,
    String,
    Boolean,
    Null,
    Object,
    Member,
    Array,
    Elements,
    Unset,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Number => "number",
            NodeType::String => "string",
            NodeType::Boolean => "boolean",
            NodeType::Null => "null",
            NodeType::Object => "object",
            NodeType::Member => "member",
            NodeType::Array => "array",
            NodeType::Elements => "elements",
            NodeType::Unset => "unset",
        };
        f.write_str(name)
    }
}

/// Index handle into a [`Tree`]'s arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Variant payloads. Leaf payloads are `Option`: `None` means the literal
/// did not convert.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Number(Option<NumberFacts>),
    String(Option<StringFacts>),
    Boolean(Option<bool>),
    Null(bool),
    Object(Vec<NodeId>),
    Member {
        /// Decoded member name; the name is data on the member, not a child.
        name: Option<StringFacts>,
        value: Option<NodeId>,
    },
    Array(Vec<NodeId>),
    Elements(Vec<NodeId>),
    Unset,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Original literal text (lossy for non-UTF-8 string literals; the exact
    /// decoded bytes live in the string facts). Containers keep it empty.
    pub raw: String,
    /// Normalized form with surrounding whitespace/quotes removed, where
    /// applicable.
    pub trimmed: Option<String>,
    pub parent: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self.kind {
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

    /// True once a successful, internally-consistent conversion populated
    /// the variant's typed fields. Containers are converted by construction;
    /// a member needs a decoded name and an attached value.
    pub fn converted(&self) -> bool {
        match &self.kind {
            NodeKind::Number(facts) => facts.is_some(),
            NodeKind::String(facts) => facts.is_some(),
            NodeKind::Boolean(value) => value.is_some(),
            NodeKind::Null(matched) => *matched,
            NodeKind::Object(_) | NodeKind::Array(_) | NodeKind::Elements(_) => true,
            NodeKind::Member { name, value } => name.is_some() && value.is_some(),
            NodeKind::Unset => false,
        }
    }
}

/// The arena. All construction goes through the methods below; the whole
/// tree is freed by dropping the `Tree`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

fn trim_ws(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_ascii_whitespace())
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a node. An out-of-range id is a programmer error and panics.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("node arena overflow"));
        self.nodes.push(node);
        id
    }

    fn push_detached(&mut self, raw: String, trimmed: Option<String>, kind: NodeKind) -> NodeId {
        self.push(Node { raw, trimmed, parent: None, prev: None, next: None, kind })
    }

    // ---------------------------- leaves ---------------------------------- //

    /// Number node from a literal; an unconvertible literal yields an
    /// unconverted node rather than an error.
    pub fn number(&mut self, literal: &str) -> NodeId {
        let facts = convert::number(literal).ok();
        self.number_inner(literal, facts)
    }

    /// Number node from a pre-classified literal.
    pub fn number_from(&mut self, literal: &str, facts: NumberFacts) -> NodeId {
        self.number_inner(literal, Some(facts))
    }

    fn number_inner(&mut self, literal: &str, facts: Option<NumberFacts>) -> NodeId {
        let trimmed = trim_ws(literal).to_string();
        self.push_detached(literal.to_string(), Some(trimmed), NodeKind::Number(facts))
    }

    /// String node from a raw literal; decoding failures yield an
    /// unconverted node.
    pub fn string(&mut self, raw: &[u8], quoted: bool) -> NodeId {
        let facts = convert::string(raw, quoted).ok();
        self.string_inner(raw, quoted, facts)
    }

    /// String node from pre-computed facts.
    pub fn string_from(&mut self, raw: &[u8], quoted: bool, facts: StringFacts) -> NodeId {
        self.string_inner(raw, quoted, Some(facts))
    }

    fn string_inner(&mut self, raw: &[u8], quoted: bool, facts: Option<StringFacts>) -> NodeId {
        let raw_text = String::from_utf8_lossy(raw).into_owned();
        let trimmed = convert::str::strip_quotes(raw, quoted)
            .ok()
            .map(|body| String::from_utf8_lossy(body).into_owned());
        self.push_detached(raw_text, trimmed, NodeKind::String(facts))
    }

    pub fn boolean(&mut self, literal: &str) -> NodeId {
        let value = convert::boolean(literal).ok();
        let trimmed = trim_ws(literal).to_string();
        self.push_detached(literal.to_string(), Some(trimmed), NodeKind::Boolean(value))
    }

    pub fn null(&mut self, literal: &str) -> NodeId {
        let matched = convert::null(literal).is_ok();
        let trimmed = trim_ws(literal).to_string();
        self.push_detached(literal.to_string(), Some(trimmed), NodeKind::Null(matched))
    }

    /// Placeholder node; never converted.
    pub fn unset(&mut self) -> NodeId {
        self.push_detached(String::new(), None, NodeKind::Unset)
    }

    // -------------------------- containers -------------------------------- //

    /// Member node: decoded name as data, one value child.
    pub fn member(&mut self, raw_name: &[u8], quoted: bool, value: NodeId) -> NodeId {
        let name = convert::string(raw_name, quoted).ok();
        self.member_inner(raw_name, quoted, name, value)
    }

    /// Member node from a pre-converted name.
    pub fn member_from(
        &mut self,
        raw_name: &[u8],
        quoted: bool,
        name: StringFacts,
        value: NodeId,
    ) -> NodeId {
        self.member_inner(raw_name, quoted, Some(name), value)
    }

    fn member_inner(
        &mut self,
        raw_name: &[u8],
        quoted: bool,
        name: Option<StringFacts>,
        value: NodeId,
    ) -> NodeId {
        let raw_text = String::from_utf8_lossy(raw_name).into_owned();
        let trimmed = convert::str::strip_quotes(raw_name, quoted)
            .ok()
            .map(|body| String::from_utf8_lossy(body).into_owned());
        let id = self.push_detached(raw_text, trimmed, NodeKind::Member { name, value: Some(value) });
        self.link(id, &[value]);
        id
    }

    /// Object node over already-created members. Attaching a non-member
    /// child is a programmer error.
    pub fn object(&mut self, members: Vec<NodeId>) -> NodeId {
        for &m in &members {
            assert!(
                matches!(self.node(m).kind, NodeKind::Member { .. }),
                "object child must be a member node"
            );
        }
        let id = self.push_detached(String::new(), None, NodeKind::Object(members.clone()));
        self.link(id, &members);
        id
    }

    pub fn array(&mut self, children: Vec<NodeId>) -> NodeId {
        let id = self.push_detached(String::new(), None, NodeKind::Array(children.clone()));
        self.link(id, &children);
        id
    }

    pub fn elements(&mut self, values: Vec<NodeId>) -> NodeId {
        let id = self.push_detached(String::new(), None, NodeKind::Elements(values.clone()));
        self.link(id, &values);
        id
    }

    /// Set parent and sibling back-links on freshly attached children.
    /// Re-attachment is a programmer error.
    fn link(&mut self, parent: NodeId, children: &[NodeId]) {
        for (i, &child) in children.iter().enumerate() {
            let prev = (i > 0).then(|| children[i - 1]);
            let next = children.get(i + 1).copied();
            let node = &mut self.nodes[child.index()];
            assert!(node.parent.is_none(), "node attached to two parents");
            node.parent = Some(parent);
            node.prev = prev;
            node.next = next;
        }
    }

    // ---------------------------- accessors ------------------------------- //

    /// Member ids of an object, in document order. Empty for other kinds.
    pub fn members(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Object(members) => members,
            _ => &[],
        }
    }

    /// The value child of a member, if attached.
    pub fn member_value(&self, id: NodeId) -> Option<NodeId> {
        match &self.node(id).kind {
            NodeKind::Member { value, .. } => *value,
            _ => None,
        }
    }

    /// Decoded name of a converted member.
    pub fn member_name(&self, id: NodeId) -> Option<&[u8]> {
        match &self.node(id).kind {
            NodeKind::Member { name: Some(facts), .. } => Some(&facts.decoded),
            _ => None,
        }
    }

    // ---------------------------- JSON view ------------------------------- //

    /// Read-only JSON rendering for printing and the query layer. Arrays
    /// flatten their Elements layer; unconverted leaves render as null.
    pub fn to_value(&self, id: NodeId) -> Value {
        match &self.node(id).kind {
            NodeKind::Null(_) | NodeKind::Unset => Value::Null,
            NodeKind::Boolean(value) => value.map(Value::Bool).unwrap_or(Value::Null),
            NodeKind::Number(facts) => facts.as_ref().map(number_value).unwrap_or(Value::Null),
            NodeKind::String(facts) => facts
                .as_ref()
                .map(|f| Value::String(String::from_utf8_lossy(&f.decoded).into_owned()))
                .unwrap_or(Value::Null),
            NodeKind::Member { value, .. } => {
                value.map(|v| self.to_value(v)).unwrap_or(Value::Null)
            }
            NodeKind::Object(members) => {
                let mut map = serde_json::Map::new();
                for &m in members {
                    let key = self
                        .member_name(m)
                        .map(|n| String::from_utf8_lossy(n).into_owned())
                        .unwrap_or_default();
                    map.insert(key, self.to_value(m));
                }
                Value::Object(map)
            }
            NodeKind::Array(children) => {
                let mut out = Vec::new();
                for &c in children {
                    match &self.node(c).kind {
                        NodeKind::Elements(values) => {
                            out.extend(values.iter().map(|&v| self.to_value(v)));
                        }
                        _ => out.push(self.to_value(c)),
                    }
                }
                Value::Array(out)
            }
            NodeKind::Elements(values) => {
                Value::Array(values.iter().map(|&v| self.to_value(v)).collect())
            }
        }
    }
}

fn number_value(facts: &NumberFacts) -> Value {
    if let Some(i) = facts.ints.i64 {
        return Value::from(i);
    }
    if let Some(u) = facts.ints.u64 {
        return Value::from(u);
    }
    facts
        .f64
        .and_then(|fit| serde_json::Number::from_f64(fit.value.0))
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_constructors_record_raw_and_trimmed() {
        let mut tree = Tree::new();
        let n = tree.number(" 42 ");
        let node = tree.node(n);
        assert_eq!(node.raw, " 42 ");
        assert_eq!(node.trimmed.as_deref(), Some("42"));
        assert!(node.converted());
        assert_eq!(node.node_type(), NodeType::Number);
    }

    #[test]
    fn failed_conversion_leaves_node_unconverted() {
        let mut tree = Tree::new();
        let n = tree.number("not-a-number");
        assert!(!tree.node(n).converted());
        let b = tree.boolean("maybe");
        assert!(!tree.node(b).converted());
        let z = tree.null("nil");
        assert!(!tree.node(z).converted());
        let u = tree.unset();
        assert!(!tree.node(u).converted());
    }

    #[test]
    fn string_node_strips_quotes_into_trimmed() {
        let mut tree = Tree::new();
        let s = tree.string(b"\"a\\tb\"", true);
        let node = tree.node(s);
        assert_eq!(node.trimmed.as_deref(), Some("a\\tb"));
        assert!(node.converted());
        match &node.kind {
            NodeKind::String(Some(facts)) => assert_eq!(facts.decoded, b"a\tb"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn containers_link_parents_and_siblings() {
        let mut tree = Tree::new();
        let a = tree.number("1");
        let b = tree.number("2");
        let c = tree.number("3");
        let elems = tree.elements(vec![a, b, c]);
        let arr = tree.array(vec![elems]);

        assert_eq!(tree.node(a).parent, Some(elems));
        assert_eq!(tree.node(elems).parent, Some(arr));
        assert_eq!(tree.node(a).prev, None);
        assert_eq!(tree.node(a).next, Some(b));
        assert_eq!(tree.node(b).prev, Some(a));
        assert_eq!(tree.node(b).next, Some(c));
        assert_eq!(tree.node(c).next, None);
        assert!(tree.node(arr).converted());
    }

    #[test]
    fn member_holds_decoded_name_and_value_child() {
        let mut tree = Tree::new();
        let v = tree.boolean("true");
        let m = tree.member(b"\"flag\"", true, v);
        assert_eq!(tree.member_name(m), Some(&b"flag"[..]));
        assert_eq!(tree.member_value(m), Some(v));
        assert_eq!(tree.node(v).parent, Some(m));
        assert!(tree.node(m).converted());

        let obj = tree.object(vec![m]);
        assert_eq!(tree.members(obj), &[m]);
    }

    #[test]
    fn member_with_undecodable_name_is_unconverted() {
        let mut tree = Tree::new();
        let v = tree.null("null");
        let m = tree.member(b"\"bad\\q\"", true, v);
        assert!(!tree.node(m).converted());
        assert_eq!(tree.member_name(m), None);
    }

    #[test]
    #[should_panic(expected = "object child must be a member node")]
    fn object_rejects_non_member_children() {
        let mut tree = Tree::new();
        let n = tree.number("1");
        let _ = tree.object(vec![n]);
    }

    #[test]
    #[should_panic(expected = "attached to two parents")]
    fn double_attachment_is_a_programmer_error() {
        let mut tree = Tree::new();
        let n = tree.number("1");
        let _ = tree.elements(vec![n]);
        let _ = tree.elements(vec![n]);
    }

    #[test]
    fn json_view_flattens_the_elements_layer() {
        let mut tree = Tree::new();
        let one = tree.number("1");
        let s = tree.string(b"\"x\"", true);
        let elems = tree.elements(vec![one, s]);
        let arr = tree.array(vec![elems]);

        let v = tree.member(b"\"items\"", true, arr);
        let flag = tree.boolean("false");
        let m2 = tree.member(b"\"on\"", true, flag);
        let obj = tree.object(vec![v, m2]);

        let json = tree.to_value(obj);
        assert_eq!(json, serde_json::json!({ "items": [1, "x"], "on": false }));
    }

    #[test]
    fn json_view_prefers_exact_integers() {
        let mut tree = Tree::new();
        let n = tree.number("18446744073709551615");
        assert_eq!(tree.to_value(n), serde_json::json!(u64::MAX));
        let f = tree.number("1.5");
        assert_eq!(tree.to_value(f), serde_json::json!(1.5));
    }
}
