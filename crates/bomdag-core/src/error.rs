use std::fmt;
use std::path::PathBuf;

/// Errors produced while decoding an SBOM, building its graph, or ordering it.
///
/// Reference gaps (dependencies naming unknown refs) are deliberately absent:
/// they are dropped during graph construction and never surface as errors.
#[derive(Debug, thiserror::Error)]
pub enum SbomError {
    /// The input file could not be opened or read.
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not well-formed JSON for the document model.
    #[error("failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The top-level `bomFormat` tag is not `CycloneDX`.
    #[error("invalid BOM format: {0} (expected CycloneDX)")]
    InvalidFormat(String),

    /// The dependency graph is not a DAG.
    ///
    /// `members` lists each strongly connected component that forms a cycle
    /// (sorted IDs). Self-loops appear as single-element groups.
    #[error("dependency graph contains cycles: {}", format_cycles(.members))]
    Cycle { members: Vec<Vec<String>> },

    /// A configuration file exists but could not be read or parsed.
    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl SbomError {
    /// The machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::InputUnreadable,
            Self::Config { .. } => ErrorCode::ConfigParseError,
            Self::Decode(_) => ErrorCode::MalformedDocument,
            Self::InvalidFormat(_) => ErrorCode::UnsupportedFormat,
            Self::Cycle { .. } => ErrorCode::CycleDetected,
        }
    }

    /// Returns `true` for [`SbomError::Cycle`].
    #[must_use]
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle { .. })
    }
}

fn format_cycles(members: &[Vec<String>]) -> String {
    if members.is_empty() {
        return "unresolved nodes remain".to_string();
    }
    members
        .iter()
        .map(|group| format!("[{}]", group.join(", ")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Machine-readable error codes for scripts and CI tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputUnreadable,
    ConfigParseError,
    MalformedDocument,
    UnsupportedFormat,
    CycleDetected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputUnreadable => "E1001",
            Self::ConfigParseError => "E1002",
            Self::MalformedDocument => "E2001",
            Self::UnsupportedFormat => "E2002",
            Self::CycleDetected => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputUnreadable => "Input file unreadable",
            Self::ConfigParseError => "Config file parse error",
            Self::MalformedDocument => "Malformed SBOM document",
            Self::UnsupportedFormat => "Unsupported BOM format",
            Self::CycleDetected => "Dependency cycle detected",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputUnreadable => Some("Check the --input path and file permissions."),
            Self::ConfigParseError => Some("Fix syntax in the TOML config file and retry."),
            Self::MalformedDocument => Some("Validate the file as JSON."),
            Self::UnsupportedFormat => Some("Only CycloneDX JSON documents are supported."),
            Self::CycleDetected => {
                Some("Remove or adjust dependsOn entries to keep the graph acyclic.")
            }
        }
    }

    /// Process exit status for this class of failure.
    ///
    /// `2` is left to argument-parsing errors.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::InputUnreadable | Self::ConfigParseError => 1,
            Self::MalformedDocument | Self::UnsupportedFormat => 3,
            Self::CycleDetected => 4,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
