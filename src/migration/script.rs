//! Schema script parsing
//!
//! A schema script is a SQL file split into statements by a four-character
//! end-of-statement sentinel, `<<>>`, placed at the end of a line. `--`
//! comment lines and blank lines are skipped. Text after the last sentinel
//! is not a statement and is discarded, so a script whose final statement
//! lacks the sentinel silently loses it; scripts must end every statement
//! with the sentinel.

use crate::migration::SchemaError;
use std::path::PathBuf;

/// End-of-statement sentinel.
pub const STATEMENT_DELIMITER: &str = "<<>>";

enum ScriptSource {
    /// Script text embedded in the binary or built in memory.
    Text(String),
    /// Script read from disk at run time.
    File(PathBuf),
}

/// One named schema script.
pub struct SchemaScript {
    name: String,
    source: ScriptSource,
}

impl SchemaScript {
    /// A script whose text is already in memory.
    pub fn embedded(name: impl Into<String>, text: impl Into<String>) -> Self {
        SchemaScript {
            name: name.into(),
            source: ScriptSource::Text(text.into()),
        }
    }

    /// A script read from `path` when its statements are requested.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        SchemaScript {
            name: name.into(),
            source: ScriptSource::File(path.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads and splits the script into its statements.
    pub fn statements(&self) -> Result<Vec<String>, SchemaError> {
        let text = match &self.source {
            ScriptSource::Text(text) => text.clone(),
            ScriptSource::File(path) => {
                std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
                    script: self.name.clone(),
                    source: e,
                })?
            }
        };
        Ok(split_statements(&text))
    }
}

/// Splits script text at the `<<>>` sentinel, dropping comments, blank
/// lines, and any trailing text the last sentinel does not cover.
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
        if let Some(body) = current.strip_suffix(STATEMENT_DELIMITER) {
            statements.push(body.trim().to_string());
            current.clear();
        }
    }
    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_sentinel() {
        let text = "CREATE TABLE T ( X INT )\n<<>>\nINSERT INTO T VALUES (1)<<>>\n";
        assert_eq!(
            split_statements(text),
            vec![
                "CREATE TABLE T ( X INT )".to_string(),
                "INSERT INTO T VALUES (1)".to_string(),
            ]
        );
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let text = "-- a header comment\n\nCREATE TABLE T ( X INT )<<>>\n-- trailing\n";
        assert_eq!(split_statements(text), vec!["CREATE TABLE T ( X INT )"]);
    }

    #[test]
    fn trailing_text_without_sentinel_is_discarded() {
        let text = "CREATE TABLE A ( X INT )<<>>\nCREATE TABLE B ( X INT )\n";
        assert_eq!(split_statements(text), vec!["CREATE TABLE A ( X INT )"]);
    }

    #[test]
    fn multi_line_statement_keeps_line_breaks() {
        let text = "CREATE TABLE T (\nX INT,\nY INT\n)<<>>\n";
        assert_eq!(
            split_statements(text),
            vec!["CREATE TABLE T (\nX INT,\nY INT\n)"]
        );
    }

    #[test]
    fn file_script_reports_io_errors_by_name() {
        let script = SchemaScript::file("sqlite_0001.sql", "/no/such/dir/sqlite_0001.sql");
        match script.statements() {
            Err(SchemaError::Io { script, .. }) => assert_eq!(script, "sqlite_0001.sql"),
            other => panic!("expected Io error, got {:?}", other.map(|v| v.len())),
        }
    }
}
