/// Broad failure category. Each kind maps to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or inconsistent input arrays.
    Input,
    /// Failure writing an export file.
    Io,
    /// The snapshot could not be read or parsed.
    Load,
    /// The halo catalog has no entry at the requested index.
    Index,
    /// The least-squares solver failed or was given degenerate data.
    Fitting,
    /// A value fell outside the domain of a back-transformation.
    Domain,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Input | ErrorKind::Io | ErrorKind::Load => 2,
            ErrorKind::Index => 3,
            ErrorKind::Fitting => 4,
            ErrorKind::Domain => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Input => "input error",
            ErrorKind::Io => "I/O error",
            ErrorKind::Load => "load error",
            ErrorKind::Index => "index error",
            ErrorKind::Fitting => "fitting error",
            ErrorKind::Domain => "domain error",
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Input, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Load, message)
    }

    pub fn index(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Index, message)
    }

    pub fn fitting(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fitting, message)
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Domain, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
