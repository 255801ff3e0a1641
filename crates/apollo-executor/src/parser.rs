use crate::ast::Document;
use crate::node::FileId;
use crate::node::NodeLocation;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::OnceLock;

/// Configuration for parsing an input string as GraphQL syntax
#[derive(Default, Debug, Clone)]
pub struct Parser {
    recursion_limit: Option<usize>,
    token_limit: Option<usize>,
}

/// Records for error reporting information about a file that was parsed
#[derive(Clone)]
pub struct SourceFile {
    pub(crate) path: PathBuf,
    pub(crate) source_text: String,
    line_starts: OnceLock<Vec<usize>>,
}

pub type SourceMap = Arc<IndexMap<FileId, Arc<SourceFile>>>;

/// A line number and column number within a GraphQL document, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

/// A syntax error or a parser limit being reached, at some location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Syntax Error: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub location: Option<NodeLocation>,
    pub is_limit: bool,
}

/// Parsing produced syntax errors.
///
/// The partial document recovered by the parser is kept alongside the errors.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", DisplayErrors(.errors))]
pub struct ParseError {
    pub partial: Document,
    pub errors: Vec<SyntaxError>,
}

struct DisplayErrors<'a>(&'a [SyntaxError]);

impl fmt::Display for DisplayErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?
            }
            fmt::Display::fmt(error, f)?
        }
        Ok(())
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the recursion to use while parsing.
    pub fn recursion_limit(mut self, value: usize) -> Self {
        self.recursion_limit = Some(value);
        self
    }

    /// Configure the limit on the number of tokens to parse.
    /// If an input document is too big, parsing will be aborted.
    /// By default, there is no limit.
    pub fn token_limit(mut self, value: usize) -> Self {
        self.token_limit = Some(value);
        self
    }

    /// Parse the given source text into an AST document.
    ///
    /// `path` is the filesystem path (or arbitrary string) used in errors
    /// to identify this source file to users.
    pub fn parse_ast(
        &self,
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Document, ParseError> {
        self.parse_with_file_id(source_text.into(), path.as_ref().to_owned(), FileId::new())
    }

    pub(crate) fn parse_with_file_id(
        &self,
        source_text: String,
        path: PathBuf,
        file_id: FileId,
    ) -> Result<Document, ParseError> {
        let mut parser = apollo_parser::Parser::new(&source_text);
        if let Some(value) = self.recursion_limit {
            parser = parser.recursion_limit(value)
        }
        if let Some(value) = self.token_limit {
            parser = parser.token_limit(value)
        }
        let tree = parser.parse();
        let mut errors = Vec::new();
        for parser_error in tree.errors() {
            // Silently skip parse errors at index beyond 4 GiB.
            // Rowan in apollo-parser might complain about files that large
            // before we get here anyway.
            let Ok(index) = parser_error.index().try_into() else {
                continue;
            };
            let Ok(len) = parser_error.data().len().try_into() else {
                continue;
            };
            errors.push(SyntaxError {
                message: parser_error.message().to_owned(),
                location: Some(NodeLocation {
                    file_id,
                    text_range: rowan::TextRange::at(index, len),
                }),
                is_limit: parser_error.is_limit(),
            })
        }
        let source_file = Arc::new(SourceFile::new(path, source_text));
        let document = Document::from_cst(tree.document(), file_id, source_file);
        if errors.is_empty() {
            Ok(document)
        } else {
            tracing::debug!(errors = errors.len(), "GraphQL syntax errors");
            Err(ParseError {
                partial: document,
                errors,
            })
        }
    }
}

impl SourceFile {
    pub(crate) fn new(path: PathBuf, source_text: String) -> Self {
        Self {
            path,
            source_text,
            line_starts: OnceLock::new(),
        }
    }

    /// The filesystem path (or arbitrary string) used in errors
    /// to identify this source file to users.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    fn line_starts(&self) -> &[usize] {
        self.line_starts.get_or_init(|| {
            let mut starts = vec![0];
            let bytes = self.source_text.as_bytes();
            let mut i = 0;
            while i < bytes.len() {
                match bytes[i] {
                    b'\n' => starts.push(i + 1),
                    b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                        starts.push(i + 2);
                        i += 1;
                    }
                    b'\r' => starts.push(i + 1),
                    _ => {}
                }
                i += 1;
            }
            starts
        })
    }

    /// Returns the 1-based line and column for a UTF-8 byte offset.
    ///
    /// Columns count Unicode scalar values, not bytes.
    pub fn get_line_column(&self, index: usize) -> Option<LineColumn> {
        if index > self.source_text.len() {
            return None;
        }
        let starts = self.line_starts();
        let line = starts.partition_point(|&start| start <= index) - 1;
        let line_text = self.source_text.get(starts[line]..index)?;
        Some(LineColumn {
            line: line + 1,
            column: line_text.chars().count() + 1,
        })
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            path,
            source_text,
            line_starts: _, // Skipped: it’s a cache and would make debugging other things noisy
        } = self;
        let mut debug_struct = f.debug_struct("SourceFile");
        debug_struct.field("path", path);
        if path != Path::new("built_in.graphql") {
            debug_struct.field("source_text", source_text);
        } else {
            debug_struct.field(
                "source_text",
                &format_args!("include_str!(\"built_in.graphql\")"),
            );
        }
        debug_struct.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_columns() {
        let file = SourceFile::new("a.graphql".into(), "{\n  été\r\n  b }".into());
        assert_eq!(
            file.get_line_column(0),
            Some(LineColumn { line: 1, column: 1 })
        );
        assert_eq!(
            file.get_line_column(4),
            Some(LineColumn { line: 2, column: 3 })
        );
        // After the multi-byte `é`s
        assert_eq!(
            file.get_line_column(9),
            Some(LineColumn { line: 2, column: 6 })
        );
        assert_eq!(
            file.get_line_column(13),
            Some(LineColumn { line: 3, column: 3 })
        );
        assert_eq!(file.get_line_column(100), None);
    }

    #[test]
    fn syntax_errors_are_located() {
        let err = Parser::new()
            .parse_ast("{ field(arg: ) }", "query.graphql")
            .unwrap_err();
        assert!(!err.errors.is_empty());
        let location = err.errors[0].location.unwrap();
        let sources = err.partial.sources.clone();
        assert_eq!(location.line_column(&sources).unwrap().line, 1);
    }
}
