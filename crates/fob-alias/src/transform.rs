//! Rewriting aliased specifiers across a whole source file.
//!
//! The rewriter parses the file with oxc, collects every literal import,
//! `require()` and (optionally) dynamic `import()` specifier, runs each one
//! through [`AliasResolver::resolve`] and splices the results back into the
//! original text. Formatting outside the rewritten literals is preserved
//! byte for byte.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, CallExpression, Expression, ImportDeclaration, ImportExpression, StringLiteral,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser, ParserReturn};
use oxc_span::{SourceType, Span};

use crate::error::{AliasError, Result};
use crate::options::ResolveOptions;
use crate::resolver::AliasResolver;

/// Where a rewritten specifier appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// `import ... from '<specifier>'`
    Import,
    /// `require('<specifier>')`
    Require,
    /// `import('<specifier>')`
    DynamicImport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenSpecifier {
    pub original: String,
    pub replacement: String,
    pub kind: SpecifierKind,
}

/// Report of specifier rewrite operations.
#[derive(Debug, Clone, Default)]
pub struct RewriteReport {
    /// Specifiers that were replaced, in source order
    pub rewritten: Vec<RewrittenSpecifier>,
    /// Specifiers left unchanged because resolving them failed
    pub failed_specifiers: Vec<String>,
}

impl RewriteReport {
    pub fn replacements(&self) -> usize {
        self.rewritten.len()
    }
}

#[derive(Debug, Clone)]
pub struct RewriteOutput {
    pub code: String,
    pub report: RewriteReport,
}

impl RewriteOutput {
    pub fn changed(&self) -> bool {
        !self.report.rewritten.is_empty()
    }
}

/// Applies an [`AliasResolver`] to every static specifier in a file.
#[derive(Debug, Clone)]
pub struct SourceRewriter {
    resolver: AliasResolver,
    options: ResolveOptions,
}

impl SourceRewriter {
    pub fn new(resolver: AliasResolver, options: ResolveOptions) -> Self {
        Self { resolver, options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Rewrite the specifiers in `source`, the contents of `filename`.
    ///
    /// A specifier whose resolution fails is logged and left as written;
    /// the remaining specifiers are still processed.
    ///
    /// # Errors
    ///
    /// Returns [`AliasError::Parse`] if `source` does not parse.
    pub fn rewrite(&self, filename: &Path, source: &str) -> Result<RewriteOutput> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(filename).unwrap_or(SourceType::mjs());

        let ParserReturn {
            program, errors, ..
        } = Parser::new(&allocator, source, source_type).parse();

        if !errors.is_empty() {
            return Err(AliasError::Parse {
                path: filename.to_path_buf(),
                message: errors
                    .iter()
                    .map(|err| format!("{:?}", err))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let mut collector = SpecifierCollector {
            dynamic_import: self.options.dynamic_import,
            found: Vec::new(),
        };
        collector.visit_program(&program);

        let mut report = RewriteReport::default();
        let mut edits = Vec::new();

        for found in collector.found {
            match self.resolver.resolve(filename, &found.value, &self.options) {
                Ok(Some(replacement)) if replacement != found.value => {
                    let delimiter = quote_char(source, found.span);
                    edits.push((found.span, quote(&replacement, delimiter)));
                    report.rewritten.push(RewrittenSpecifier {
                        original: found.value,
                        replacement,
                        kind: found.kind,
                    });
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        "Leaving `{}` unchanged in {}: {}",
                        found.value,
                        filename.display(),
                        err
                    );
                    report.failed_specifiers.push(found.value);
                }
            }
        }

        Ok(RewriteOutput {
            code: splice(source, &edits),
            report,
        })
    }
}

struct FoundSpecifier {
    span: Span,
    value: String,
    kind: SpecifierKind,
}

struct SpecifierCollector {
    dynamic_import: bool,
    found: Vec<FoundSpecifier>,
}

impl SpecifierCollector {
    fn push(&mut self, literal: &StringLiteral<'_>, kind: SpecifierKind) {
        self.found.push(FoundSpecifier {
            span: literal.span,
            value: literal.value.as_str().to_string(),
            kind,
        });
    }
}

impl<'a> Visit<'a> for SpecifierCollector {
    fn visit_import_declaration(&mut self, import: &ImportDeclaration<'a>) {
        self.push(&import.source, SpecifierKind::Import);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(ident) = &call.callee {
            if ident.name.as_str() == "require" {
                if let Some(Argument::StringLiteral(literal)) = call.arguments.first() {
                    self.push(literal, SpecifierKind::Require);
                }
            }
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_import_expression(&mut self, import: &ImportExpression<'a>) {
        if self.dynamic_import {
            if let Expression::StringLiteral(literal) = &import.source {
                self.push(literal, SpecifierKind::DynamicImport);
            }
        }
        walk::walk_import_expression(self, import);
    }
}

/// The delimiter the literal at `span` was written with.
fn quote_char(source: &str, span: Span) -> char {
    source
        .get(span.start as usize..)
        .and_then(|rest| rest.chars().next())
        .filter(|c| *c == '\'' || *c == '"')
        .unwrap_or('"')
}

/// Render `value` as a string literal delimited by `quote`.
fn quote(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        if c == quote || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(quote);
    out
}

/// Apply non-overlapping span replacements.
fn splice(source: &str, edits: &[(Span, String)]) -> String {
    let mut sorted: Vec<&(Span, String)> = edits.iter().collect();
    sorted.sort_by_key(|(span, _)| span.start);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for (span, text) in sorted {
        let start = span.start as usize;
        let end = span.end as usize;
        if start < cursor || end > source.len() {
            continue;
        }
        out.push_str(&source[cursor..start]);
        out.push_str(text);
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    out
}
