//! Recursive-descent grammar over raw JSON bytes.
//!
//! Drives the engine's node constructors: literals are scanned as raw
//! substrings and handed to the converters, containers attach their finished
//! children. Arrays always wrap one Elements node so depths stay uniform.
//! Codec errors inside a literal are re-based to document byte offsets.

use crate::convert;
use crate::error::CheckError;
use crate::node::{NodeId, Tree};

/// Containers may nest this deep; beyond it the document is rejected.
pub const MAX_NESTING: u32 = 128;

/// Parse one JSON document into a tree, returning the root node.
pub fn parse(input: &[u8]) -> Result<(Tree, NodeId), CheckError> {
    let mut parser = Parser { input, pos: 0, tree: Tree::new(), nesting: 0 };
    let root = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos != parser.input.len() {
        return Err(parser.syntax("trailing data"));
    }
    Ok((parser.tree, root))
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    tree: Tree,
    nesting: u32,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn syntax(&self, detail: &'static str) -> CheckError {
        CheckError::Syntax { at: self.pos, detail: detail.into() }
    }

    fn syntax_at(&self, at: usize, detail: &'static str) -> CheckError {
        CheckError::Syntax { at, detail: detail.into() }
    }

    fn expect(&mut self, byte: u8, detail: &'static str) -> Result<(), CheckError> {
        if self.advance() == Some(byte) {
            Ok(())
        } else {
            Err(self.syntax_at(self.pos.saturating_sub(1), detail))
        }
    }

    fn expect_bytes(&mut self, expected: &[u8], detail: &'static str) -> Result<(), CheckError> {
        let start = self.pos;
        for &b in expected {
            if self.advance() != Some(b) {
                return Err(self.syntax_at(start, detail));
            }
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), CheckError> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(self.syntax("nesting too deep"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    fn parse_value(&mut self) -> Result<NodeId, CheckError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.syntax("unexpected end of input")),
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => {
                let start = self.pos;
                let raw = self.scan_string()?;
                let facts = convert::string(raw, true).map_err(|e| e.offset(start + 1))?;
                Ok(self.tree.string_from(raw, true, facts))
            }
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            Some(b't') => {
                self.expect_bytes(b"true", "expected 'true'")?;
                Ok(self.tree.boolean("true"))
            }
            Some(b'f') => {
                self.expect_bytes(b"false", "expected 'false'")?;
                Ok(self.tree.boolean("false"))
            }
            Some(b'n') => {
                self.expect_bytes(b"null", "expected 'null'")?;
                Ok(self.tree.null("null"))
            }
            Some(_) => Err(self.syntax("unexpected byte")),
        }
    }

    /// Scan a quoted string, escape-aware, returning the raw literal with
    /// its quotes. Content validation belongs to the codec, not the scanner.
    fn scan_string(&mut self) -> Result<&'a [u8], CheckError> {
        let start = self.pos;
        self.expect(b'"', "expected string")?;
        loop {
            match self.advance() {
                None => return Err(self.syntax_at(start, "unterminated string")),
                Some(b'"') => return Ok(&self.input[start..self.pos]),
                Some(b'\\') => {
                    self.advance();
                }
                Some(_) => {}
            }
        }
    }

    fn parse_number(&mut self) -> Result<NodeId, CheckError> {
        let start = self.pos;
        // Permissive scan over number bytes; the classifier is the validator.
        while matches!(self.peek(), Some(b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E')) {
            self.pos += 1;
        }
        let literal = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.syntax_at(start, "invalid number bytes"))?;
        let facts = convert::number(literal)?;
        Ok(self.tree.number_from(literal, facts))
    }

    fn parse_object(&mut self) -> Result<NodeId, CheckError> {
        self.enter()?;
        self.expect(b'{', "expected '{'")?;
        let mut members = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.leave();
            return Ok(self.tree.object(members));
        }
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let raw_name = self.scan_string()?;
            let name = convert::string(raw_name, true).map_err(|e| e.offset(start + 1))?;
            self.skip_whitespace();
            self.expect(b':', "expected ':' after member name")?;
            let value = self.parse_value()?;
            members.push(self.tree.member_from(raw_name, true, name, value));
            self.skip_whitespace();
            match self.advance() {
                Some(b',') => {}
                Some(b'}') => break,
                _ => return Err(self.syntax_at(self.pos.saturating_sub(1), "expected ',' or '}'")),
            }
        }
        self.leave();
        Ok(self.tree.object(members))
    }

    fn parse_array(&mut self) -> Result<NodeId, CheckError> {
        self.enter()?;
        self.expect(b'[', "expected '['")?;
        let mut values = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
        } else {
            loop {
                let value = self.parse_value()?;
                values.push(value);
                self.skip_whitespace();
                match self.advance() {
                    Some(b',') => {}
                    Some(b']') => break,
                    _ => {
                        return Err(
                            self.syntax_at(self.pos.saturating_sub(1), "expected ',' or ']'")
                        )
                    }
                }
            }
        }
        self.leave();
        let elements = self.tree.elements(values);
        Ok(self.tree.array(vec![elements]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, NodeType};
    use crate::semantic::{check_tree, UnknownPolicy};
    use crate::table;
    use crate::walk::walk;

    #[test]
    fn parses_scalars_objects_and_arrays() {
        let (tree, root) = parse(br#"{ "a": [1, "two", null], "b": { "c": false } }"#).unwrap();
        assert_eq!(
            tree.to_value(root),
            serde_json::json!({ "a": [1, "two", null], "b": { "c": false } })
        );
    }

    #[test]
    fn literals_keep_their_source_text() {
        let (tree, root) = parse(br#"{"n": -8589934594.1, "s": "a\tb"}"#).unwrap();
        let mut raws = Vec::new();
        walk(&tree, root, None, &mut |tree, id, _| {
            let node = tree.node(id);
            if !node.raw.is_empty() {
                raws.push(node.raw.clone());
            }
        });
        assert!(raws.contains(&"-8589934594.1".to_string()));
        assert!(raws.contains(&"\"a\\tb\"".to_string()));
        assert!(raws.contains(&"\"n\"".to_string()));
    }

    #[test]
    fn arrays_wrap_one_elements_layer() {
        let (tree, root) = parse(b"[1, 2]").unwrap();
        let mut shape = Vec::new();
        walk(&tree, root, None, &mut |tree, id, depth| {
            shape.push((tree.node(id).node_type(), depth));
        });
        assert_eq!(
            shape,
            vec![
                (NodeType::Array, 0),
                (NodeType::Elements, 1),
                (NodeType::Number, 2),
                (NodeType::Number, 2),
            ]
        );
    }

    #[test]
    fn empty_containers_parse() {
        let (tree, root) = parse(b"{}").unwrap();
        assert_eq!(tree.to_value(root), serde_json::json!({}));

        let (tree, root) = parse(b"[]").unwrap();
        assert_eq!(tree.to_value(root), serde_json::json!([]));
        // The Elements layer exists even when empty.
        match &tree.node(root).kind {
            NodeKind::Array(children) => {
                assert_eq!(children.len(), 1);
                assert!(matches!(
                    &tree.node(children[0]).kind,
                    NodeKind::Elements(values) if values.is_empty()
                ));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn member_names_are_decoded() {
        let (tree, root) = parse(br#"{"tab": 1}"#).unwrap();
        let members = tree.members(root);
        assert_eq!(tree.member_name(members[0]), Some(&b"tab"[..]));
    }

    #[test]
    fn number_conversion_flows_through() {
        let (tree, root) = parse(b"255").unwrap();
        match &tree.node(root).kind {
            NodeKind::Number(Some(facts)) => {
                assert_eq!(facts.ints.u8, Some(255));
                assert_eq!(facts.ints.i8, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(tree.node(root).converted());
    }

    #[test]
    fn trailing_data_is_a_syntax_error() {
        assert!(matches!(parse(b"1 2").unwrap_err(), CheckError::Syntax { .. }));
        assert!(matches!(parse(b"{} x").unwrap_err(), CheckError::Syntax { .. }));
    }

    #[test]
    fn unterminated_string_points_at_its_opening_quote() {
        let err = parse(b"  \"abc").unwrap_err();
        assert_eq!(err, CheckError::Syntax { at: 2, detail: "unterminated string".into() });
    }

    #[test]
    fn string_escape_errors_carry_document_offsets() {
        //                0123456
        let err = parse(br#"{"k": "x\q"}"#).unwrap_err();
        match err {
            CheckError::MalformedEncoding { at, .. } => assert_eq!(at, 8),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stray_bytes_and_missing_punctuation_fail() {
        assert!(parse(b"?").is_err());
        assert!(parse(b"").is_err());
        assert!(parse(br#"{"a" 1}"#).is_err());
        assert!(parse(b"[1 2]").is_err());
        assert!(parse(b"tru").is_err());
        assert!(parse(b"nulll").is_err());
    }

    #[test]
    fn malformed_numbers_are_conversion_failures() {
        assert!(matches!(
            parse(b"01").unwrap_err(),
            CheckError::ConversionFailure { .. }
        ));
        assert!(matches!(
            parse(b"1.2.3").unwrap_err(),
            CheckError::ConversionFailure { .. }
        ));
    }

    #[test]
    fn nesting_beyond_the_bound_is_rejected() {
        let deep = b"[".repeat(MAX_NESTING as usize + 1);
        assert!(matches!(
            parse(&deep).unwrap_err(),
            CheckError::Syntax { detail, .. } if detail == "nesting too deep"
        ));

        let ok = format!("{}1{}", "[".repeat(64), "]".repeat(64));
        assert!(parse(ok.as_bytes()).is_ok());
    }

    #[test]
    fn parsed_document_passes_its_generated_table() {
        let (tree, root) =
            parse(br#"{"name": "n1", "tags": ["a", "b"], "size": 3}"#).unwrap();
        let mut rules: Vec<_> = table::generate(&tree, root)
            .into_iter()
            .map(table::RuleSpec::into_rule)
            .collect();
        let errors = check_tree(&tree, root, &mut rules, UnknownPolicy::Deny);
        assert!(errors.is_empty(), "{errors:?}");

        // A document with an extra member trips the same table.
        let (tree2, root2) =
            parse(br#"{"name": "n1", "tags": ["a", "b"], "size": 3, "extra": 1}"#).unwrap();
        let errors = check_tree(&tree2, root2, &mut rules, UnknownPolicy::Deny);
        assert!(!errors.is_empty());
    }
}
