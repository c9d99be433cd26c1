//! Parses snippets with oxc and records where the style rules need to look.
//!
//! Rules work on byte offsets into the original source: string literals,
//! identifiers, keywords, parenthesized regions, statement bodies,
//! declarations and comments. A snippet that does not parse is rejected with a
//! [`ParseError`] before any rule runs.

use oxc_allocator::Allocator;
use oxc_ast::ast::{ForStatementInit, ForStatementLeft, Statement};
use oxc_ast::{AstKind, Visit};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use std::ops::Range;
use thiserror::Error;

/// Raised when a snippet is not JavaScript the parser accepts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Includes the `//` or `/* */` delimiters.
    pub range: Range<usize>,
    pub block: bool,
}

/// A keyword as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyword {
    pub keyword: &'static str,
    pub offset: usize,
}

/// The statement governed by a keyword such as `if` or `while`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Body {
    pub keyword: &'static str,
    /// Offset of the keyword.
    pub offset: usize,
    pub braced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier<'s> {
    pub name: &'s str,
    pub offset: usize,
    /// Property names and object keys, as opposed to bindings and references.
    pub property: bool,
}

/// A `var`, `let` or `const` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration {
    pub offset: usize,
    pub declarators: usize,
    pub in_for_header: bool,
}

/// What the rules inspect, every list sorted by offset.
#[derive(Debug, Default)]
pub struct Syntax<'s> {
    pub comments: Vec<Comment>,
    pub keywords: Vec<Keyword>,
    pub bodies: Vec<Body>,
    /// String literals, quotes included.
    pub strings: Vec<Range<usize>>,
    pub identifiers: Vec<Identifier<'s>>,
    /// Offsets of matching `(` and `)`.
    pub parens: Vec<(usize, usize)>,
    pub declarations: Vec<Declaration>,
}

impl Syntax<'_> {
    pub fn in_comment(&self, offset: usize) -> bool {
        self.comments.iter().any(|c| c.range.contains(&offset))
    }
}

/// Parses a snippet as a script, falling back to a module for `import`/`export`.
///
/// A script parse is tried first so sloppy-mode code such as `with` statements
/// is accepted. When both fail, the script error is reported.
pub fn parse(source: &str) -> Result<Syntax<'_>, ParseError> {
    parse_as(source, false).or_else(|script_error| {
        log::trace!("Retrying snippet as a module: {}", script_error);
        parse_as(source, true).map_err(|_| script_error)
    })
}

fn parse_as(source: &str, module: bool) -> Result<Syntax<'_>, ParseError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(module);
    let result = Parser::new(&allocator, source, source_type).parse();

    if let Some(error) = result.errors.first() {
        return Err(ParseError {
            message: error.to_string(),
        });
    }
    if result.panicked {
        return Err(ParseError {
            message: "Unexpected token".to_string(),
        });
    }

    let mut collector = Collector::new(source);
    for comment in &result.program.comments {
        collector.comment(comment.span);
    }
    collector.visit_program(&result.program);
    Ok(collector.finish())
}

struct Collector<'s> {
    source: &'s str,
    syntax: Syntax<'s>,
    /// Start offsets of declarations found in `for (...)` headers.
    for_headers: Vec<u32>,
}

impl<'s> Collector<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            syntax: Syntax::default(),
            for_headers: Vec::new(),
        }
    }

    fn finish(mut self) -> Syntax<'s> {
        let syntax = &mut self.syntax;
        syntax.comments.sort_by_key(|c| c.range.start);
        syntax.keywords.sort_by_key(|k| k.offset);
        syntax.keywords.dedup();
        syntax.bodies.sort_by_key(|b| b.offset);
        syntax.strings.sort_by_key(|s| s.start);
        syntax.strings.dedup();
        syntax.parens.sort_unstable();
        syntax.parens.dedup();
        syntax.declarations.sort_by_key(|d| d.offset);

        // Shorthand properties yield a key and a reference at the same offset.
        syntax.identifiers.sort_by_key(|i| i.offset);
        syntax.identifiers.dedup_by(|later, earlier| {
            if later.offset != earlier.offset {
                return false;
            }
            earlier.property &= later.property;
            true
        });
        self.syntax
    }

    fn comment(&mut self, span: Span) {
        let source = self.source;
        let (mut start, mut end) = (span.start as usize, span.end as usize);
        // Widen spans that exclude the delimiters.
        if !matches!(source.get(start..start + 2), Some("//" | "/*")) {
            start = start.saturating_sub(2);
        }
        let block = source.get(start..start + 2) == Some("/*");
        if block && !source[..end].ends_with("*/") && source.get(end..end + 2) == Some("*/") {
            end += 2;
        }
        self.syntax.comments.push(Comment {
            range: start..end,
            block,
        });
    }

    fn keyword(&mut self, keyword: &'static str, offset: usize) {
        self.syntax.keywords.push(Keyword { keyword, offset });
    }

    /// Nodes that start with their keyword unless decorated.
    fn leading_keyword(&mut self, keyword: &'static str, span: Span) {
        let start = span.start as usize;
        if self.source[start..].starts_with(keyword) {
            self.keyword(keyword, start);
        }
    }

    fn body(&mut self, keyword: &'static str, offset: usize, body: &Statement<'_>) {
        self.syntax.bodies.push(Body {
            keyword,
            offset,
            braced: matches!(body, Statement::BlockStatement(_)),
        });
    }

    fn identifier(&mut self, span: Span, property: bool) {
        let source = self.source;
        let offset = span.start as usize;
        self.syntax.identifiers.push(Identifier {
            name: &source[offset..span.end as usize],
            offset,
            property,
        });
    }

    /// First occurrence of `keyword` between two nodes, outside comments.
    fn find_keyword(&self, keyword: &str, from: u32, to: u32) -> Option<usize> {
        let (from, to) = (from as usize, to as usize);
        self.source
            .get(from..to)?
            .match_indices(keyword)
            .map(|(at, _)| from + at)
            .find(|&at| !self.syntax.in_comment(at))
    }

    fn next_non_space(&self, from: usize) -> Option<(usize, char)> {
        self.source[from..]
            .char_indices()
            .find(|(_, c)| !c.is_whitespace())
            .map(|(at, c)| (from + at, c))
    }

    fn previous_non_space(&self, to: usize) -> Option<(usize, char)> {
        self.source[..to]
            .char_indices()
            .rev()
            .find(|(_, c)| !c.is_whitespace())
    }

    /// The parentheses wrapping a node, as in `if ( test )`.
    fn parens_around(&mut self, inner: Span) {
        let open = self.previous_non_space(inner.start as usize);
        let close = self.next_non_space(inner.end as usize);
        if let (Some((open, '(')), Some((close, ')'))) = (open, close) {
            self.syntax.parens.push((open, close));
        }
    }

    /// A node whose span starts and ends with its own parentheses.
    fn parenthesized(&mut self, span: Span) {
        let bytes = self.source.as_bytes();
        let (start, end) = (span.start as usize, span.end as usize);
        if end > start + 1 && bytes[start] == b'(' && bytes[end - 1] == b')' {
            self.syntax.parens.push((start, end - 1));
        }
    }

    /// The argument list of a call or `new` expression.
    fn arguments(&mut self, callee_end: u32, end: u32) {
        let close = (end as usize).saturating_sub(1);
        if self.source.as_bytes().get(close) != Some(&b')') {
            return;
        }
        let callee_end = callee_end as usize;
        if let Some(open) = self.source.get(callee_end..close).and_then(|s| s.find('(')) {
            self.syntax.parens.push((callee_end + open, close));
        }
    }

    /// The `( ... )` header of a `for` loop.
    fn for_header(&mut self, start: u32, body: Span) {
        let (start, body_start) = (start as usize, body.start as usize);
        let open = self.source.get(start..body_start).and_then(|s| s.find('('));
        let close = self.previous_non_space(body_start);
        if let (Some(open), Some((close, ')'))) = (open, close) {
            self.syntax.parens.push((start + open, close));
        }
    }
}

impl<'a> Visit<'a> for Collector<'_> {
    fn enter_node(&mut self, kind: AstKind<'a>) {
        match kind {
            AstKind::IfStatement(it) => {
                let start = it.span.start as usize;
                self.keyword("if", start);
                self.parens_around(it.test.span());
                self.body("if", start, &it.consequent);
                if let Some(alternate) = &it.alternate {
                    let gap = (it.consequent.span().end, alternate.span().start);
                    if let Some(at) = self.find_keyword("else", gap.0, gap.1) {
                        self.keyword("else", at);
                        if !matches!(alternate, Statement::IfStatement(_)) {
                            self.body("else", at, alternate);
                        }
                    }
                }
            }
            AstKind::ForStatement(it) => {
                let start = it.span.start as usize;
                self.keyword("for", start);
                self.for_header(it.span.start, it.body.span());
                self.body("for", start, &it.body);
                if let Some(ForStatementInit::VariableDeclaration(decl)) = &it.init {
                    self.for_headers.push(decl.span.start);
                }
            }
            AstKind::ForInStatement(it) => {
                let start = it.span.start as usize;
                self.keyword("for", start);
                self.for_header(it.span.start, it.body.span());
                self.body("for", start, &it.body);
                if let ForStatementLeft::VariableDeclaration(decl) = &it.left {
                    self.for_headers.push(decl.span.start);
                }
            }
            AstKind::ForOfStatement(it) => {
                let start = it.span.start as usize;
                self.keyword("for", start);
                self.for_header(it.span.start, it.body.span());
                self.body("for", start, &it.body);
                if let ForStatementLeft::VariableDeclaration(decl) = &it.left {
                    self.for_headers.push(decl.span.start);
                }
            }
            AstKind::WhileStatement(it) => {
                let start = it.span.start as usize;
                self.keyword("while", start);
                self.parens_around(it.test.span());
                self.body("while", start, &it.body);
            }
            AstKind::DoWhileStatement(it) => {
                let start = it.span.start as usize;
                self.keyword("do", start);
                self.body("do", start, &it.body);
                let gap = (it.body.span().end, it.test.span().start);
                if let Some(at) = self.find_keyword("while", gap.0, gap.1) {
                    self.keyword("while", at);
                }
                self.parens_around(it.test.span());
            }
            AstKind::WithStatement(it) => {
                let start = it.span.start as usize;
                self.keyword("with", start);
                self.parens_around(it.object.span());
                self.body("with", start, &it.body);
            }
            AstKind::SwitchStatement(it) => {
                self.keyword("switch", it.span.start as usize);
                self.parens_around(it.discriminant.span());
            }
            AstKind::SwitchCase(it) => {
                let keyword = if it.test.is_some() { "case" } else { "default" };
                self.keyword(keyword, it.span.start as usize);
            }
            AstKind::TryStatement(it) => {
                self.keyword("try", it.span.start as usize);
                if let Some(finalizer) = &it.finalizer {
                    let from = it.handler.as_ref().map_or(it.block.span.end, |h| h.span.end);
                    if let Some(at) = self.find_keyword("finally", from, finalizer.span.start) {
                        self.keyword("finally", at);
                    }
                }
            }
            AstKind::CatchClause(it) => {
                self.keyword("catch", it.span.start as usize);
                if let Some(param) = &it.param {
                    self.parens_around(param.span);
                }
            }
            AstKind::ReturnStatement(it) => self.keyword("return", it.span.start as usize),
            AstKind::ThrowStatement(it) => self.keyword("throw", it.span.start as usize),
            AstKind::BreakStatement(it) => self.keyword("break", it.span.start as usize),
            AstKind::ContinueStatement(it) => self.keyword("continue", it.span.start as usize),
            AstKind::Function(it) => {
                // Methods have no `function` keyword; async functions start with `async`.
                let (source, start) = (self.source, it.span.start as usize);
                let text = &source[start..];
                let rest = text.strip_prefix("async").map_or(text, str::trim_start);
                if rest.starts_with("function") {
                    self.keyword("function", start + text.len() - rest.len());
                }
            }
            AstKind::FormalParameters(it) => self.parenthesized(it.span),
            AstKind::ParenthesizedExpression(it) => self.parenthesized(it.span),
            AstKind::CallExpression(it) => self.arguments(it.callee.span().end, it.span.end),
            AstKind::NewExpression(it) => {
                self.keyword("new", it.span.start as usize);
                self.arguments(it.callee.span().end, it.span.end);
            }
            AstKind::BinaryExpression(it) => {
                let operator = it.operator.as_str();
                if matches!(operator, "in" | "instanceof") {
                    let gap = (it.left.span().end, it.right.span().start);
                    if let Some(at) = self.find_keyword(operator, gap.0, gap.1) {
                        self.keyword(operator, at);
                    }
                }
            }
            AstKind::Class(it) => self.leading_keyword("class", it.span),
            AstKind::AwaitExpression(it) => self.leading_keyword("await", it.span),
            AstKind::YieldExpression(it) => self.leading_keyword("yield", it.span),
            AstKind::ThisExpression(it) => self.keyword("this", it.span.start as usize),
            AstKind::Super(it) => self.keyword("super", it.span.start as usize),
            AstKind::DebuggerStatement(it) => self.keyword("debugger", it.span.start as usize),
            AstKind::ImportDeclaration(it) => self.keyword("import", it.span.start as usize),
            AstKind::ExportNamedDeclaration(it) => self.keyword("export", it.span.start as usize),
            AstKind::ExportDefaultDeclaration(it) => {
                self.keyword("export", it.span.start as usize)
            }
            AstKind::ExportAllDeclaration(it) => self.keyword("export", it.span.start as usize),
            AstKind::UnaryExpression(it) => {
                let operator = it.operator.as_str();
                if matches!(operator, "typeof" | "void" | "delete") {
                    self.keyword(operator, it.span.start as usize);
                }
            }
            AstKind::VariableDeclaration(it) => {
                let keyword = it.kind.as_str();
                let offset = it.span.start as usize;
                if matches!(keyword, "var" | "let" | "const") {
                    self.keyword(keyword, offset);
                }
                self.syntax.declarations.push(Declaration {
                    offset,
                    declarators: it.declarations.len(),
                    in_for_header: self.for_headers.contains(&it.span.start),
                });
            }
            AstKind::StringLiteral(it) => {
                self.syntax
                    .strings
                    .push(it.span.start as usize..it.span.end as usize);
            }
            AstKind::BindingIdentifier(it) => self.identifier(it.span, false),
            AstKind::IdentifierReference(it) => self.identifier(it.span, false),
            AstKind::LabelIdentifier(it) => self.identifier(it.span, false),
            AstKind::IdentifierName(it) => self.identifier(it.span, true),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(source: &str) -> Vec<&'static str> {
        parse(source).unwrap().keywords.iter().map(|k| k.keyword).collect()
    }

    #[test]
    fn test_rejects_invalid_javascript() {
        let sources = [
            "var = ;\n",
            "var x = \"a\" \"b\";\n",
            "if ( a ) else {\n}\n",
            "var s = \"open;\n",
        ];
        for source in sources {
            let err = parse(source).unwrap_err();
            assert!(!err.message.is_empty(), "{source}");
        }
    }

    #[test]
    fn test_regex_after_parenthesized_condition() {
        let syntax = parse("if ( ok ) /[)]/.test( s );\n").unwrap();
        assert_eq!(syntax.parens, vec![(3, 8), (20, 24)]);
    }

    #[test]
    fn test_sloppy_script_and_module_code_parse() {
        assert_eq!(keywords("with ( obj ) {\n\tfoo();\n}\n"), vec!["with"]);
        assert!(parse("import { a } from \"b\";\nexport default a;\n").is_ok());
    }

    #[test]
    fn test_keywords_between_nodes() {
        let source = "if ( a ) {\n} /* else */ else {\n}\ndo {\n} while ( b );\n";
        let syntax = parse(source).unwrap();
        let found: Vec<_> = syntax.keywords.iter().map(|k| (k.keyword, k.offset)).collect();
        assert_eq!(
            found,
            vec![("if", 0), ("else", 24), ("do", 33), ("while", 40)]
        );
        assert_eq!(syntax.comments.len(), 1);
        assert!(syntax.comments[0].block);
        assert_eq!(&source[syntax.comments[0].range.clone()], "/* else */");
    }

    #[test]
    fn test_bodies_record_braces() {
        let syntax = parse("if ( a ) b();\nelse if ( c ) {\n}\nfor ( ;; ) {\n}\n").unwrap();
        let bodies: Vec<_> = syntax.bodies.iter().map(|b| (b.keyword, b.braced)).collect();
        assert_eq!(bodies, vec![("if", false), ("if", true), ("for", true)]);
    }

    #[test]
    fn test_identifiers_and_shorthand_properties() {
        let syntax = parse("var o = { a_b, c: d.e_f };\n").unwrap();
        let found: Vec<_> = syntax
            .identifiers
            .iter()
            .map(|i| (i.name, i.property))
            .collect();
        assert_eq!(
            found,
            vec![
                ("o", false),
                ("a_b", false),
                ("c", true),
                ("d", false),
                ("e_f", true)
            ]
        );
    }

    #[test]
    fn test_declarations_in_for_headers() {
        let source = "for ( var i = 0, n = 2; i < n; i++ ) {\n}\nlet a = 1, b;\n";
        let syntax = parse(source).unwrap();
        let found: Vec<_> = syntax
            .declarations
            .iter()
            .map(|d| (d.declarators, d.in_for_header))
            .collect();
        assert_eq!(found, vec![(2, true), (2, false)]);
    }

    #[test]
    fn test_strings_and_line_comments() {
        let source = "// note\nfoo( 'a', \"b\" );\n";
        let syntax = parse(source).unwrap();
        let strings: Vec<_> = syntax.strings.iter().map(|r| &source[r.clone()]).collect();
        assert_eq!(strings, vec!["'a'", "\"b\""]);
        assert_eq!(syntax.comments[0].range, 0..7);
        assert!(syntax.in_comment(3));
        assert!(!syntax.in_comment(8));
    }
}
