//! A reader for Newick strings.
//!
//! The grammar accepted here is
//!
//! ```text
//! tree    := node ';'
//! node    := [ '(' node { ',' node } ')' ] [ label ] [ ':' length ]
//! label   := unquoted | "'" { any | "''" } "'"
//! ```
//!
//! Whitespace between tokens is ignored and `[...]` comments are skipped.
//! Missing edge lengths are read as `0.0`. Nesting depth is limited only by
//! memory: open subtrees are kept on an explicit stack.

use crate::{
    error::{ParseError, ParseErrorKind},
    Tree,
};

/// Parses a single tree from a Newick string.
///
/// # Errors
///
/// - If the input is empty.
/// - If the parentheses are unbalanced.
/// - If the `;` terminator is missing, or followed by more input.
/// - If a branch length is not a finite number.
/// - If a sum of branch lengths from the root overflows.
/// - If a comment or a quoted label is not closed.
///
/// # Examples
///
/// ```
/// use wmfd::newick::parse;
///
/// let tree = parse("((A:1,B:2):0.5,C:3);").unwrap();
/// assert_eq!(tree.num_leaves(), 3);
///
/// assert!(parse("((A,B),C)").is_err());
/// assert!(parse("((A,B),C;").is_err());
/// ```
pub fn parse(newick: &str) -> Result<Tree, ParseError> {
    let mut reader = Reader {
        bytes: newick.as_bytes(),
        text: newick,
        pos: 0,
        lengths: Vec::new(),
    };

    reader.skip_ignored()?;
    if reader.peek().is_none() {
        return Err(reader.error(ParseErrorKind::Empty));
    }

    let mut tree = Tree::with_root();
    reader.nodes(&mut tree)?;

    reader.skip_ignored()?;
    match reader.peek() {
        Some(b';') => reader.pos += 1,
        Some(b')') => return Err(reader.error(ParseErrorKind::Unbalanced)),
        Some(_) => return Err(reader.unexpected()),
        None => return Err(reader.error(ParseErrorKind::MissingTerminator)),
    }

    reader.skip_ignored()?;
    if reader.peek().is_some() {
        return Err(reader.error(ParseErrorKind::TrailingInput));
    }

    check_heights(&tree, &reader.lengths)?;
    Ok(tree)
}

/// Checks that every root-to-node sum of branch lengths is finite.
///
/// The error points at the first length that pushes a height out of range.
fn check_heights(tree: &Tree, lengths: &[(usize, usize)]) -> Result<(), ParseError> {
    let heights = tree.root_distances();
    lengths
        .iter()
        .find(|&&(i, _)| !heights[i].is_finite() && tree.node(i).parent().is_some_and(|p| heights[p].is_finite()))
        .map_or(Ok(()), |&(_, pos)| Err(ParseError::new(ParseErrorKind::HeightOverflow, pos)))
}

/// Bytes that end an unquoted label or a branch length.
const fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b',' | b':' | b';' | b'[') || b.is_ascii_whitespace()
}

/// Cursor over the input.
struct Reader<'a> {
    /// The input as bytes.
    bytes: &'a [u8],
    /// The input as text, used to slice out labels.
    text: &'a str,
    /// The current byte offset.
    pos: usize,
    /// The node and byte offset of every branch length read so far.
    lengths: Vec<(usize, usize)>,
}

impl Reader<'_> {
    /// Returns the current byte without consuming it.
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Creates an error at the current position.
    const fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.pos)
    }

    /// Creates an error for the character at the current position.
    fn unexpected(&self) -> ParseError {
        let c = self.text[self.pos..].chars().next().unwrap_or('\u{fffd}');
        self.error(ParseErrorKind::UnexpectedChar(c))
    }

    /// Skips whitespace and bracketed comments.
    fn skip_ignored(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'[') => {
                    let start = self.pos;
                    match self.bytes[start..].iter().position(|&b| b == b']') {
                        Some(offset) => self.pos = start + offset + 1,
                        None => return Err(ParseError::new(ParseErrorKind::UnclosedComment, start)),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Reads the whole tree into `tree`, starting at its root.
    ///
    /// `open` holds the nodes whose `(` has been read but not their `)`.
    fn nodes(&mut self, tree: &mut Tree) -> Result<(), ParseError> {
        let mut open = Vec::new();
        let mut current = tree.root();

        loop {
            self.skip_ignored()?;
            while self.peek() == Some(b'(') {
                self.pos += 1;
                open.push(current);
                current = tree.add_child(current);
                self.skip_ignored()?;
            }

            loop {
                self.annotations(tree, current)?;
                let Some(&parent) = open.last() else {
                    return Ok(());
                };

                self.skip_ignored()?;
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        current = tree.add_child(parent);
                        break;
                    }
                    Some(b')') => {
                        self.pos += 1;
                        open.pop();
                        current = parent;
                    }
                    Some(b';') | None => return Err(self.error(ParseErrorKind::Unbalanced)),
                    Some(_) => return Err(self.unexpected()),
                }
            }
        }
    }

    /// Reads the optional label and edge length that follow a node.
    fn annotations(&mut self, tree: &mut Tree, index: usize) -> Result<(), ParseError> {
        self.skip_ignored()?;
        if let Some(label) = self.label()? {
            tree.set_label(index, label);
        }

        self.skip_ignored()?;
        if self.peek() == Some(b':') {
            self.pos += 1;
            self.skip_ignored()?;
            let start = self.pos;
            let length = self.length()?;
            tree.set_length(index, length);
            self.lengths.push((index, start));
        }

        Ok(())
    }

    /// Reads an optional quoted or unquoted label.
    fn label(&mut self) -> Result<Option<String>, ParseError> {
        if self.peek() == Some(b'\'') {
            let start = self.pos;
            self.pos += 1;
            let mut label = String::new();
            loop {
                let rest = &self.text[self.pos..];
                let Some(offset) = rest.find('\'') else {
                    return Err(ParseError::new(ParseErrorKind::UnclosedQuote, start));
                };
                label.push_str(&rest[..offset]);
                self.pos += offset + 1;
                if self.peek() == Some(b'\'') {
                    label.push('\'');
                    self.pos += 1;
                } else {
                    return Ok(Some(label));
                }
            }
        }

        let start = self.pos;
        while self.peek().is_some_and(|b| !is_delimiter(b) && b != b'\'') {
            self.pos += 1;
        }
        Ok((self.pos > start).then(|| self.text[start..self.pos].to_string()))
    }

    /// Reads a branch length.
    fn length(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        while self.peek().is_some_and(|b| !is_delimiter(b)) {
            self.pos += 1;
        }
        let token = &self.text[start..self.pos];
        token
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidLength(token.to_string()), start))
    }
}
