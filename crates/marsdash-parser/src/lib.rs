//! Minimal Beancount reader
//!
//! Understands transactions, postings (with `{cost}` and `@`/`@@` prices),
//! `open` and `include`. Everything else is skipped; the dashboard only
//! needs dated postings per account.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod directives;
pub mod error;
pub mod parser;
pub mod types;

pub use error::ParseError;
pub use parser::SimpleBeancountParser;

pub use directives::{Directive, IncludeDirective, OpenDirective, Posting, SpannedDirective, Transaction};
pub use types::{Amount, Price};

// ==================== Parser Trait ====================

/// Parser reference type
pub type ParserRef = Arc<dyn BeancountParserTrait>;

/// Trait for Beancount parsers
#[async_trait]
pub trait BeancountParserTrait: Send + Sync {
    /// Parse Beancount source text (includes are returned, not followed)
    async fn parse(&self, content: &str) -> Result<Vec<SpannedDirective>, ParseError>;

    /// Parse a file and everything it includes
    async fn parse_file(&self, path: PathBuf) -> Result<Vec<SpannedDirective>, ParseError>;
}

/// Default parser implementation
#[derive(Debug, Default)]
pub struct DefaultBeancountParser;

impl DefaultBeancountParser {
    /// Expand an include path (possibly a glob) relative to the including file
    fn resolve_include(base_dir: &Path, include: &str) -> Vec<PathBuf> {
        let target = base_dir.join(include);
        if include.contains('*') || include.contains('?') {
            let mut matched: Vec<PathBuf> = glob::glob(&target.to_string_lossy())
                .map(|paths| paths.flatten().filter(|p| p.is_file()).collect())
                .unwrap_or_default();
            matched.sort();
            matched
        } else if target.exists() {
            vec![target]
        } else {
            log::warn!("Included file not found: {}", target.display());
            vec![]
        }
    }
}

#[async_trait]
impl BeancountParserTrait for DefaultBeancountParser {
    async fn parse(&self, content: &str) -> Result<Vec<SpannedDirective>, ParseError> {
        SimpleBeancountParser::parse(content)
    }

    async fn parse_file(&self, path: PathBuf) -> Result<Vec<SpannedDirective>, ParseError> {
        let mut visited = HashSet::new();
        let mut pending = vec![path];
        let mut directives = Vec::new();

        // A file's directives come before those of the files it includes
        while let Some(path) = pending.pop() {
            let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
            if !visited.insert(canonical) {
                continue;
            }

            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| ParseError::IoError {
                    path: path.display().to_string(),
                    source,
                })?;
            let source_path = path.to_string_lossy().to_string();
            let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

            let mut includes = Vec::new();
            for directive in SimpleBeancountParser::parse_with_source(&content, Some(&source_path))? {
                match &directive.data {
                    Directive::Include(include) => {
                        includes.extend(Self::resolve_include(&base_dir, &include.path));
                    }
                    _ => directives.push(directive),
                }
            }
            log::debug!("Parsed {} ({} includes)", source_path, includes.len());

            // Reverse so the first include is processed next
            pending.extend(includes.into_iter().rev());
        }

        Ok(directives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parse_file_follows_includes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("2024")).unwrap();
        std::fs::write(
            dir.path().join("main.bean"),
            "2024-01-01 open Assets:Checking:Main USD\ninclude \"2024/*.bean\"\ninclude \"main.bean\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("2024/01.bean"),
            "2024-01-05 * \"Shop\" \"x\"\n  Assets:Checking:Main -5 USD\n  Expenses:Food\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("2024/02.bean"),
            "2024-02-05 * \"Shop\" \"y\"\n  Assets:Checking:Main -6 USD\n  Expenses:Food\n",
        )
        .unwrap();

        let parser = DefaultBeancountParser;
        let directives = parser.parse_file(dir.path().join("main.bean")).await.unwrap();

        // The self-include is visited once, included files follow main.bean in include order
        assert_eq!(directives.len(), 3);
        assert!(matches!(directives[0].data, Directive::Open(_)));
        assert!(directives[0].source.as_deref().unwrap().ends_with("main.bean"));
        match (&directives[1].data, &directives[2].data) {
            (Directive::Transaction(a), Directive::Transaction(b)) => assert!(a.date < b.date),
            other => panic!("unexpected directives {:?}", other),
        }
        assert!(directives[1].source.as_deref().unwrap().ends_with("01.bean"));
        assert!(directives[2].source.as_deref().unwrap().ends_with("02.bean"));
    }

    #[tokio::test]
    async fn test_parse_file_missing() {
        let parser = DefaultBeancountParser;
        let err = parser
            .parse_file(PathBuf::from("/nonexistent/main.bean"))
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::IoError { .. }));
    }
}
