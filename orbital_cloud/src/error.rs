//! Crate-level error types.

use std::fmt;
use std::path::PathBuf;

/// Errors produced while loading orbital data or building point clouds.
#[derive(Debug)]
pub enum CloudError {
    /// Malformed data file or file name.
    Parse {
        /// File (or file name) being parsed.
        source_name: String,
        /// 1-based line number, when the problem is tied to a row.
        line: Option<usize>,
        /// What was wrong.
        message: String,
    },
    /// The quantum numbers do not describe a bound state (n <= l, |m| > l).
    InvalidQuantumNumber { n: u32, l: u32, m: Option<i32> },
    /// Orbital family the sampler/UI does not handle (g and above).
    UnsupportedOrbital { l: u32 },
    /// Radial profile evaluated outside its tabulated range.
    OutOfRange { r: f64, r_min: f64, r_max: f64 },
    /// Generic I/O failure.
    Io { path: Option<PathBuf>, source: std::io::Error },
    /// Configuration file could not be parsed or written.
    Config(String),
    /// Failed to spawn the background sampling thread.
    ThreadSpawn(std::io::Error),
    /// The background sampling thread panicked.
    WorkerPanicked(String),
}

impl CloudError {
    pub(crate) fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            line: None,
            message: message.into(),
        }
    }

    pub(crate) fn parse_at(
        source_name: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            line: Some(line),
            message: message.into(),
        }
    }

    pub(crate) fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse {
                source_name,
                line: Some(line),
                message,
            } => write!(f, "parse error in {source_name}, line {line}: {message}"),
            Self::Parse {
                source_name,
                line: None,
                message,
            } => write!(f, "parse error in {source_name}: {message}"),
            Self::InvalidQuantumNumber { n, l, m: Some(m) } => {
                write!(f, "invalid quantum numbers n={n}, l={l}, m={m}")
            }
            Self::InvalidQuantumNumber { n, l, m: None } => {
                write!(f, "invalid quantum numbers n={n}, l={l} (need n > l)")
            }
            Self::UnsupportedOrbital { l } => {
                write!(f, "orbitals with l={l} (g and above) are not supported")
            }
            Self::OutOfRange { r, r_min, r_max } => {
                write!(f, "r={r} is outside the tabulated range [{r_min}, {r_max}]")
            }
            Self::Io {
                path: Some(path),
                source,
            } => write!(f, "I/O error on {}: {source}", path.display()),
            Self::Io { path: None, source } => write!(f, "I/O error: {source}"),
            Self::Config(msg) => write!(f, "config error: {msg}"),
            Self::ThreadSpawn(e) => write!(f, "failed to spawn sampling thread: {e}"),
            Self::WorkerPanicked(msg) => write!(f, "sampling thread panicked: {msg}"),
        }
    }
}

impl std::error::Error for CloudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::ThreadSpawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CloudError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            path: None,
            source: e,
        }
    }
}
