//! CSS parser.
//!
//! Hand-written scanner over a `Vec<char>` with position tracking on every
//! node. The grammar is deliberately small: rules with nested blocks,
//! at-rules with or without blocks, declarations, and comments. That is
//! enough to carry directive markers and user CSS through the compiler with
//! exact provenance.

use crate::node::{AtRule, Comment, Declaration, Node, Rule, Stylesheet};
use crate::origin::{Origin, Position, SourceId};
use crate::sourcemap::SourceMap;
use crate::SyntaxError;

/// Stylesheet parser.
///
/// Produces a [`Stylesheet`] whose every node carries an [`Origin`] into the
/// named document.
pub struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    source: SourceId,
}

impl Parser {
    /// Parse a document under the given identity.
    pub fn parse(css: &str, file_name: &str) -> Result<Stylesheet, SyntaxError> {
        Self::parse_with_prev(css, file_name, None)
    }

    /// Parse a document that was itself produced by an earlier compilation,
    /// attaching the map it arrived with so printed origins chain through.
    pub fn parse_with_prev(
        css: &str,
        file_name: &str,
        prev: Option<SourceMap>,
    ) -> Result<Stylesheet, SyntaxError> {
        let mut sheet = Stylesheet::new();
        let source = sheet.sources.intern_with_prev(file_name, prev);
        let mut parser = Parser {
            chars: css.chars().collect(),
            pos: 0,
            line: 1,
            column: 0,
            source,
        };
        sheet.nodes = parser.parse_nodes(true)?;
        Ok(sheet)
    }

    fn parse_nodes(&mut self, top_level: bool) -> Result<Vec<Node>, SyntaxError> {
        let mut nodes = Vec::new();

        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            match self.peek() {
                '}' => {
                    if top_level {
                        return Err(self.error("Unexpected '}'".into()));
                    }
                    break;
                }
                '/' if self.peek_next() == Some('*') => {
                    nodes.push(self.parse_comment()?);
                }
                '@' => {
                    nodes.push(self.parse_at_rule()?);
                }
                _ => {
                    nodes.push(self.parse_rule_or_declaration(top_level)?);
                }
            }
        }

        Ok(nodes)
    }

    // --- Statements ---

    fn parse_comment(&mut self) -> Result<Node, SyntaxError> {
        let start = self.position();
        self.advance(); // '/'
        self.advance(); // '*'

        let mut text = String::new();
        loop {
            if self.is_at_end() {
                return Err(SyntaxError {
                    message: "Unclosed comment".into(),
                    line: start.line,
                    column: start.column,
                });
            }
            if self.peek() == '*' && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                break;
            }
            text.push(self.advance());
        }

        Ok(Node::Comment(Comment {
            text: text.trim().to_string(),
            origin: Origin::new(self.source, start, self.position()),
        }))
    }

    fn parse_at_rule(&mut self) -> Result<Node, SyntaxError> {
        let start = self.position();
        self.advance(); // '@'

        let mut name = String::new();
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '-') {
            name.push(self.advance());
        }
        if name.is_empty() {
            return Err(self.error("Expected at-rule name after '@'".into()));
        }

        let (params, params_end) = self.collect_until_block_or_semicolon()?;

        if self.is_at_end() {
            return Err(SyntaxError {
                message: format!("Unexpected end of input in '@{name}'"),
                line: start.line,
                column: start.column,
            });
        }

        if self.peek() == ';' || self.peek() == '}' {
            // A '}' means the at-rule was the last statement of a block and
            // dropped its ';'; leave the brace for the caller.
            let end = params_end.unwrap_or_else(|| self.position());
            if self.peek() == ';' {
                self.advance();
            }
            return Ok(Node::AtRule(AtRule {
                name,
                params,
                block: None,
                origin: Origin::new(self.source, start, end),
                layer: None,
                order_key: None,
            }));
        }

        self.advance(); // '{'
        let block = self.parse_nodes(false)?;
        if self.is_at_end() {
            return Err(SyntaxError {
                message: format!("Unclosed block in '@{name}'"),
                line: start.line,
                column: start.column,
            });
        }
        let end = self.position();
        self.advance(); // '}'

        Ok(Node::AtRule(AtRule {
            name,
            params,
            block: Some(block),
            origin: Origin::new(self.source, start, end),
            layer: None,
            order_key: None,
        }))
    }

    fn parse_rule_or_declaration(&mut self, top_level: bool) -> Result<Node, SyntaxError> {
        if self.next_delimiter() == Some('{') {
            return self.parse_rule();
        }
        if top_level {
            return Err(self.error("Declaration outside of a rule".into()));
        }
        self.parse_declaration()
    }

    fn parse_rule(&mut self) -> Result<Node, SyntaxError> {
        let start = self.position();
        let (selector, _) = self.collect_until_block_or_semicolon()?;
        if self.is_at_end() || self.peek() != '{' {
            return Err(self.error("Expected '{' after selector".into()));
        }
        if selector.is_empty() {
            return Err(self.error("Empty selector".into()));
        }

        self.advance(); // '{'
        let nodes = self.parse_nodes(false)?;
        if self.is_at_end() {
            return Err(SyntaxError {
                message: format!("Unclosed block for selector '{selector}'"),
                line: start.line,
                column: start.column,
            });
        }
        let end = self.position();
        self.advance(); // '}'

        Ok(Node::Rule(Rule {
            selector,
            nodes,
            origin: Origin::new(self.source, start, end),
            layer: None,
            order_key: None,
        }))
    }

    fn parse_declaration(&mut self) -> Result<Node, SyntaxError> {
        let start = self.position();
        let mut text = String::new();
        let mut end = self.position();
        let mut in_string: Option<char> = None;
        let mut depth = 0usize;

        while !self.is_at_end() {
            let ch = self.peek();
            match in_string {
                Some(quote) => {
                    if ch == quote {
                        in_string = None;
                    }
                }
                None => match ch {
                    '"' | '\'' => in_string = Some(ch),
                    '(' | '[' => depth += 1,
                    ')' | ']' => depth = depth.saturating_sub(1),
                    ';' | '}' if depth == 0 => break,
                    _ => {}
                },
            }
            if !ch.is_whitespace() {
                end = self.position();
                end.column += 1;
            }
            text.push(self.advance());
        }
        if !self.is_at_end() && self.peek() == ';' {
            self.advance();
        }

        let text = text.trim();
        let Some(colon) = text.find(':') else {
            return Err(SyntaxError {
                message: format!("Expected ':' in declaration '{text}'"),
                line: start.line,
                column: start.column,
            });
        };
        let property = text[..colon].trim().to_string();
        let mut value = text[colon + 1..].trim().to_string();
        if property.is_empty() {
            return Err(SyntaxError {
                message: "Declaration has no property name".into(),
                line: start.line,
                column: start.column,
            });
        }

        let mut important = false;
        let lowered = value.to_ascii_lowercase();
        if let Some(idx) = lowered.rfind("!important") {
            if lowered[idx + "!important".len()..].trim().is_empty() {
                value.truncate(idx);
                value.truncate(value.trim_end().len());
                important = true;
            }
        }

        Ok(Node::Declaration(Declaration {
            property,
            value,
            important,
            origin: Origin::new(self.source, start, end),
        }))
    }

    // --- Scanning helpers ---

    /// Collect raw text up to an unnested `{`, `;`, or `}`, collapsing
    /// internal whitespace runs. Returns the text and the position one past
    /// its last significant character.
    fn collect_until_block_or_semicolon(
        &mut self,
    ) -> Result<(String, Option<Position>), SyntaxError> {
        let mut text = String::new();
        let mut end: Option<Position> = None;
        let mut in_string: Option<char> = None;
        let mut depth = 0usize;

        while !self.is_at_end() {
            let ch = self.peek();
            match in_string {
                Some(quote) => {
                    if ch == quote {
                        in_string = None;
                    }
                }
                None => match ch {
                    '"' | '\'' => in_string = Some(ch),
                    '(' | '[' => depth += 1,
                    ')' | ']' => depth = depth.saturating_sub(1),
                    '{' | ';' | '}' if depth == 0 => break,
                    _ => {}
                },
            }
            if !ch.is_whitespace() {
                let mut after = self.position();
                after.column += 1;
                end = Some(after);
            }
            text.push(self.advance());
        }
        if in_string.is_some() {
            return Err(self.error("Unclosed string".into()));
        }

        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok((collapsed, end))
    }

    /// Look ahead (without consuming) for the next unnested `;`, `{`, or
    /// `}`, skipping strings and comments. Decides rule vs declaration.
    fn next_delimiter(&self) -> Option<char> {
        let mut idx = self.pos;
        let mut in_string: Option<char> = None;
        let mut depth = 0usize;

        while idx < self.chars.len() {
            let ch = self.chars[idx];
            match in_string {
                Some(quote) => {
                    if ch == quote {
                        in_string = None;
                    }
                }
                None => match ch {
                    '"' | '\'' => in_string = Some(ch),
                    '(' | '[' => depth += 1,
                    ')' | ']' => depth = depth.saturating_sub(1),
                    '/' if self.chars.get(idx + 1) == Some(&'*') => {
                        idx += 2;
                        while idx < self.chars.len() {
                            if self.chars[idx] == '*'
                                && self.chars.get(idx + 1) == Some(&'/')
                            {
                                idx += 1;
                                break;
                            }
                            idx += 1;
                        }
                    }
                    ';' | '{' | '}' if depth == 0 => return Some(ch),
                    _ => {}
                },
            }
            idx += 1;
        }
        None
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn error(&self, message: String) -> SyntaxError {
        SyntaxError {
            message,
            line: self.line,
            column: self.column,
        }
    }
}
