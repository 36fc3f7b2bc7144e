//! Parser for the bracketed tree format
//!
//! Grammar:
//! ```text
//! document := "[" subtree "]" EOF
//! subtree  := ε                                   (next token is "]")
//!           | payload [ "[" subtree "]" [ "[" subtree "]" ] ]
//!                       right child        left child
//! ```
//!
//! Tokens come from lines: leading `[` characters are open brackets,
//! trailing `]` characters are close brackets, and whatever is left in the
//! middle (trimmed, if non-empty) is one payload. Indentation and padding
//! are insignificant, so `[2` and `[3]` on single lines are accepted.
//!
//! Nesting is tracked on the heap, so depth is bounded by memory rather
//! than by the thread's call stack.

use super::error::SyntaxError;
use super::node::{Node, NodeId, Side};
use crate::types::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind<'a> {
    Open,
    Close,
    Payload(&'a str),
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind<'a>,
    /// 0-based line index
    line: usize,
}

fn describe(kind: Option<TokenKind<'_>>) -> String {
    match kind {
        Some(TokenKind::Open) => "'['".to_string(),
        Some(TokenKind::Close) => "']'".to_string(),
        Some(TokenKind::Payload(text)) => format!("payload '{}'", text),
        None => "end of input".to_string(),
    }
}

fn tokenize<S: AsRef<str>>(lines: &[S]) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();

    for (line, raw) in lines.iter().enumerate() {
        let mut rest = raw.as_ref().trim();

        while let Some(stripped) = rest.strip_prefix('[') {
            tokens.push(Token {
                kind: TokenKind::Open,
                line,
            });
            rest = stripped.trim_start();
        }

        let mut closes = 0;
        while let Some(stripped) = rest.strip_suffix(']') {
            closes += 1;
            rest = stripped.trim_end();
        }

        if !rest.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Payload(rest),
                line,
            });
        }
        for _ in 0..closes {
            tokens.push(Token {
                kind: TokenKind::Close,
                line,
            });
        }
    }

    tokens
}

/// Node whose child block is open
#[derive(Debug, Clone, Copy)]
struct Frame {
    id: NodeId,
    side: Side,
}

/// Nodes built by the parser, ready to become a tree's arena
#[derive(Debug)]
pub(crate) struct ParsedTree<T> {
    pub nodes: Vec<Option<Node<T>>>,
    pub root: Option<NodeId>,
}

pub(crate) struct Parser<'a, S, T> {
    lines: &'a [S],
    tokens: Vec<Token<'a>>,
    pos: usize,
    context_radius: usize,
    nodes: Vec<Option<Node<T>>>,
}

impl<'a, S: AsRef<str>, T: Payload> Parser<'a, S, T> {
    pub fn new(lines: &'a [S], context_radius: usize) -> Self {
        Self {
            lines,
            tokens: tokenize(lines),
            pos: 0,
            context_radius,
            nodes: Vec::new(),
        }
    }

    /// Parse a whole document: `[`, one subtree, `]`, nothing after
    pub fn parse_document(mut self) -> Result<ParsedTree<T>, SyntaxError> {
        self.expect(TokenKind::Open, "opening '['")?;
        let root = self.subtree()?;
        self.expect(TokenKind::Close, "closing ']'")?;

        if self.peek().is_some() {
            return Err(self.error_here("end of input"));
        }

        Ok(ParsedTree {
            nodes: self.nodes,
            root,
        })
    }

    /// Walk nested blocks with an explicit stack of open ones
    ///
    /// Each frame is a node whose child block is currently open; its depth
    /// in the stack is the depth of the nodes created inside the block.
    fn subtree(&mut self) -> Result<Option<NodeId>, SyntaxError> {
        let mut open: Vec<Frame> = Vec::new();
        let mut root = None;

        loop {
            let parent = open.last().copied();
            let child = self.block_head(parent.map(|frame| frame.id), open.len())?;
            match parent {
                Some(frame) => self.link(frame.id, frame.side, child),
                None => root = child,
            }

            if let Some(id) = child {
                match self.peek_kind() {
                    Some(TokenKind::Open) => {
                        self.pos += 1;
                        open.push(Frame {
                            id,
                            side: Side::Right,
                        });
                        continue;
                    }
                    Some(TokenKind::Close) => {}
                    _ => return Err(self.error_here("'[' or ']' after payload")),
                }
            }

            // block finished: close it, and the enclosing ones that are done
            loop {
                let frame = match open.pop() {
                    Some(frame) => frame,
                    None => return Ok(root),
                };
                match frame.side {
                    Side::Right => {
                        self.expect(TokenKind::Close, "']' closing the right child")?;
                        match self.peek_kind() {
                            Some(TokenKind::Open) => {
                                self.pos += 1;
                                open.push(Frame {
                                    id: frame.id,
                                    side: Side::Left,
                                });
                                break;
                            }
                            Some(TokenKind::Close) => {}
                            _ => return Err(self.error_here("'[' for the left child or ']'")),
                        }
                    }
                    Side::Left => self.expect(TokenKind::Close, "']' closing the left child")?,
                }
            }
        }
    }

    /// Start of a block: its payload (creating the node) or the `]` of an empty block
    fn block_head(&mut self, parent: Option<NodeId>, depth: usize) -> Result<Option<NodeId>, SyntaxError> {
        let (text, line) = match self.peek() {
            // empty block: the enclosing level consumes the ']'
            Some(Token {
                kind: TokenKind::Close,
                ..
            }) => return Ok(None),
            Some(Token {
                kind: TokenKind::Payload(text),
                line,
            }) => (text, line),
            _ => return Err(self.error_here("payload or ']'")),
        };

        let value = T::parse_payload(text).map_err(|reason| {
            self.error_at(
                line,
                format!("payload of type {}", T::TYPE_NAME),
                reason,
            )
        })?;
        self.pos += 1;

        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Some(Node::new(value, parent, depth)));
        Ok(Some(id))
    }

    fn link(&mut self, parent: NodeId, side: Side, child: Option<NodeId>) {
        if let Some(node) = self.nodes[parent.index()].as_mut() {
            node.set_child(side, child);
        }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind<'a>> {
        self.peek().map(|token| token.kind)
    }

    fn expect(&mut self, kind: TokenKind<'static>, expected: &str) -> Result<(), SyntaxError> {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error_here(expected))
        }
    }

    fn error_here(&self, expected: &str) -> SyntaxError {
        let found = describe(self.peek_kind());
        let line = match self.peek() {
            Some(token) => token.line,
            None => self.lines.len().saturating_sub(1),
        };
        self.error_at(line, expected.to_string(), found)
    }

    fn error_at(&self, line: usize, expected: String, found: String) -> SyntaxError {
        let first = line.saturating_sub(self.context_radius);
        let last = (line + self.context_radius + 1).min(self.lines.len());
        let context = (first..last)
            .map(|idx| (idx + 1, self.lines[idx].as_ref().to_string()))
            .collect();

        SyntaxError {
            line: line + 1,
            expected,
            found,
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ParsedTree<i32>, SyntaxError> {
        let lines: Vec<&str> = text.lines().collect();
        Parser::new(&lines, 2).parse_document()
    }

    fn data(tree: &ParsedTree<i32>, id: Option<NodeId>) -> Option<i32> {
        id.and_then(|id| tree.nodes[id.index()].as_ref())
            .map(|node| *node.data())
    }

    #[test]
    fn test_tokenize_compact_lines() {
        let lines = ["[2", "[3]", "  ]  ", "[", "]"];
        let kinds: Vec<_> = tokenize(&lines).into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Open,
                TokenKind::Payload("2"),
                TokenKind::Open,
                TokenKind::Payload("3"),
                TokenKind::Close,
                TokenKind::Close,
                TokenKind::Open,
                TokenKind::Close,
            ]
        );
    }

    #[test]
    fn test_parse_compact_document() {
        let tree = parse("[\n1\n[2\n[3]\n[4]\n]\n[5]\n]").unwrap();
        let root = tree.root;
        assert_eq!(data(&tree, root), Some(1));

        let root_node = tree.nodes[root.unwrap().index()].as_ref().unwrap();
        let two = root_node.right();
        let five = root_node.left();
        assert_eq!(data(&tree, two), Some(2));
        assert_eq!(data(&tree, five), Some(5));

        let two_node = tree.nodes[two.unwrap().index()].as_ref().unwrap();
        assert_eq!(data(&tree, two_node.right()), Some(3));
        assert_eq!(data(&tree, two_node.left()), Some(4));
        assert_eq!(two_node.depth(), 1);
        assert_eq!(two_node.parent(), root);
    }

    #[test]
    fn test_empty_block_is_absent_child() {
        let tree = parse("[\n1\n[\n]\n[\n2\n]\n]").unwrap();
        let root = tree.nodes[tree.root.unwrap().index()].as_ref().unwrap();
        assert_eq!(root.right(), None);
        assert_eq!(data(&tree, root.left()), Some(2));
    }

    #[test]
    fn test_empty_document() {
        let tree = parse("[\n]").unwrap();
        assert!(tree.root.is_none());
        assert!(tree.nodes.is_empty());
    }

    #[test]
    fn test_missing_open_bracket() {
        let err = parse("1\n]").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.expected, "opening '['");
        assert_eq!(err.found, "payload '1'");
    }

    #[test]
    fn test_two_payloads_in_a_row() {
        let err = parse("[\n1\n2\n]").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.found, "payload '2'");
        assert_eq!(err.context.len(), 4);
        assert_eq!(err.context[0], (1, "[".to_string()));
    }

    #[test]
    fn test_unexpected_end() {
        let err = parse("[\n1\n[\n2").unwrap_err();
        assert_eq!(err.found, "end of input");
        assert_eq!(err.line, 4);
    }

    #[test]
    fn test_trailing_tokens() {
        let err = parse("[\n1\n]\n]").unwrap_err();
        assert_eq!(err.expected, "end of input");
        assert_eq!(err.line, 4);
    }

    #[test]
    fn test_bad_payload() {
        let err = parse("[\nabc\n]").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.expected, "payload of type i32");
    }

    #[test]
    fn test_deep_chain_parses() {
        let depth = 10_000;
        let mut text = String::from("[\n");
        for value in 0..depth {
            text.push_str(&format!("{}\n[\n", value));
        }
        text.push_str(&"]\n".repeat(depth + 1));

        let tree = parse(&text).unwrap();
        assert_eq!(tree.nodes.len(), depth);
        let deepest = tree.nodes[depth - 1].as_ref().unwrap();
        assert_eq!(*deepest.data(), depth as i32 - 1);
        assert_eq!(deepest.depth(), depth - 1);
        assert_eq!(deepest.parent(), Some(NodeId::new(depth - 2)));
    }

    #[test]
    fn test_left_block_after_nested_right() {
        let tree = parse("[\n1\n[\n2\n[\n3\n]\n]\n[\n4\n]\n]").unwrap();
        let root = tree.nodes[tree.root.unwrap().index()].as_ref().unwrap();
        assert_eq!(data(&tree, root.right()), Some(2));
        assert_eq!(data(&tree, root.left()), Some(4));

        let four = tree.nodes[root.left().unwrap().index()].as_ref().unwrap();
        assert_eq!(four.depth(), 1);
        assert_eq!(four.parent(), tree.root);
    }

    #[test]
    fn test_unclosed_deep_block() {
        let err = parse("[\n1\n[\n2\n[\n3\n]\n]").unwrap_err();
        assert_eq!(err.expected, "']' closing the right child");
        assert_eq!(err.found, "end of input");
    }

    #[test]
    fn test_third_block_rejected() {
        let err = parse("[\n1\n[2]\n[3]\n[4]\n]").unwrap_err();
        assert_eq!(err.line, 5);
        assert_eq!(err.found, "'['");
    }
}
