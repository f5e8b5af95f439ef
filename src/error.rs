use std::path::PathBuf;

/// Every error survey-lens can produce. Displayed as user-facing messages.
#[derive(Debug)]
pub enum LensError {
    NotFound {
        path: PathBuf,
    },
    PermissionDenied {
        path: PathBuf,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Fetch {
        url: String,
        reason: String,
    },
    Http {
        url: String,
        status: u16,
    },
    Config {
        path: PathBuf,
        reason: String,
    },
    InvalidColumn {
        index: usize,
        available: usize,
    },
    UnknownColumn {
        name: String,
    },
}

impl std::fmt::Display for LensError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "not found: {}", path.display()),
            Self::PermissionDenied { path } => {
                write!(f, "{} [permission denied]", path.display())
            }
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Fetch { url, reason } => write!(f, "failed to load {url}: {reason}"),
            Self::Http { url, status } => write!(f, "failed to load {url}: HTTP {status}"),
            Self::Config { path, reason } => {
                write!(f, "invalid config {}: {reason}", path.display())
            }
            Self::InvalidColumn { index, available } => {
                write!(
                    f,
                    "no column at index {index} (table has {available} columns)"
                )
            }
            Self::UnknownColumn { name } => write!(f, "no column named \"{name}\""),
        }
    }
}

impl std::error::Error for LensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl LensError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::Io { .. } | Self::Fetch { .. } | Self::Http { .. } => 2,
            Self::Config { .. } | Self::InvalidColumn { .. } | Self::UnknownColumn { .. } => 3,
            Self::PermissionDenied { .. } => 4,
        }
    }

    /// Map an I/O error on `path` onto the matching variant.
    pub(crate) fn from_io(path: &std::path::Path, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}
