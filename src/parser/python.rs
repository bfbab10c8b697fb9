use tree_sitter::{Node, Parser, Tree};

use crate::error::ExtractError;

/// A parsed Python module.
///
/// Owns the concrete syntax tree; the source text stays with the caller
/// and is passed alongside wherever node text is needed.
#[derive(Debug)]
pub struct ParsedModule {
    tree: Tree,
}

impl ParsedModule {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

/// Reusable Python parser.
///
/// tree-sitter parsers carry internal state, so one `PythonParser` is
/// created per extraction pass and fed each file in turn.
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("tree-sitter-python grammar matches the linked tree-sitter ABI");
        Self { parser }
    }

    /// Parse one module's source.
    ///
    /// tree-sitter is error-tolerant, so "fails to parse" here means the
    /// resulting tree contains any syntax error. Such modules degrade to
    /// an empty symbol table at the call site rather than aborting the
    /// batch.
    pub fn parse(&mut self, source: &str, module: &str) -> Result<ParsedModule, ExtractError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::parse(module, "parser produced no tree"))?;
        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(0);
            return Err(ExtractError::parse(
                module,
                format!("syntax error near line {line}"),
            ));
        }
        Ok(ParsedModule { tree })
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Source text of a node. Byte ranges from the parser always fall on valid
/// boundaries of the original `&str`.
pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

fn first_error_line(root: Node<'_>) -> Option<usize> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_source() {
        let mut parser = PythonParser::new();
        let module = parser.parse("x = 1\n", "m").unwrap();
        assert_eq!(module.root().kind(), "module");
    }

    #[test]
    fn test_parse_syntax_error() {
        let mut parser = PythonParser::new();
        let err = parser.parse("def f(:\n", "m").unwrap_err();
        assert!(matches!(err, ExtractError::Parse { .. }));
    }

    #[test]
    fn test_node_text() {
        let mut parser = PythonParser::new();
        let source = "alpha = beta\n";
        let module = parser.parse(source, "m").unwrap();
        let stmt = module.root().named_child(0).unwrap();
        assert_eq!(node_text(stmt, source), "alpha = beta");
    }
}
