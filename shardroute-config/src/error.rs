//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{message} (line {line}): {snippet}")]
    Syntax {
        message: String,
        line: usize,
        snippet: String,
    },

    #[error("{0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("default data source \"{0}\" is not configured")]
    UnknownDefaultDataSource(String),

    #[error("no data sources configured")]
    NoDataSources,

    #[error("duplicate data source \"{0}\"")]
    DuplicateDataSource(String),

    #[error("table \"{0}\" is configured more than once")]
    DuplicateTable(String),
}

impl Error {
    /// Attach the offending line of the source document
    /// to a TOML parse error.
    pub fn config(source: &str, err: toml::de::Error) -> Self {
        let Some(span) = err.span() else {
            return Self::Toml(err);
        };

        let line = source[..span.start.min(source.len())]
            .chars()
            .filter(|c| *c == '\n')
            .count()
            + 1;
        let snippet = source
            .lines()
            .nth(line - 1)
            .unwrap_or_default()
            .trim()
            .to_string();

        Self::Syntax {
            message: err.message().to_string(),
            line,
            snippet,
        }
    }
}
