use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::project::ResolutionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("{}: missing mandatory {field}", path.display())]
    MissingMandatory { path: PathBuf, field: &'static str },

    #[error("{}", summarize(diagnostics))]
    Invalid { diagnostics: Vec<Diagnostic> },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Diagnostics of an [`Error::Invalid`]; empty for every other variant.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Invalid { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

impl From<Vec<Diagnostic>> for Error {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Error::Invalid { diagnostics }
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let mut out = format!("{errors} error(s) found");
    for diagnostic in diagnostics {
        out.push('\n');
        out.push_str(&diagnostic.to_string());
    }
    out
}
