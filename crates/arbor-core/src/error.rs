use std::fmt;

/// Machine-readable error codes for UI collaborators and scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    RecordNotFound,
    CycleDetected,
    InvalidStateTransition,
    IndexOutOfRange,
    MalformedRecords,
    DeleteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::RecordNotFound => "E2001",
            Self::InvalidStateTransition => "E2002",
            Self::CycleDetected => "E2003",
            Self::IndexOutOfRange => "E2006",
            Self::MalformedRecords => "E3003",
            Self::DeleteFailed => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::RecordNotFound => "Record not found",
            Self::InvalidStateTransition => "Invalid state transition",
            Self::CycleDetected => "Cycle would be created",
            Self::IndexOutOfRange => "Position is outside the visible tree",
            Self::MalformedRecords => "Malformed hierarchy records",
            Self::DeleteFailed => "Delete request failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .arbor/config.toml and retry."),
            Self::RecordNotFound => None,
            Self::InvalidStateTransition => {
                Some("Follow the menu flow: right-click -> delete -> confirm or cancel.")
            }
            Self::CycleDetected => {
                Some("Pick a parent that is not a descendant of the record being edited.")
            }
            Self::IndexOutOfRange => Some("Rebuild the view before replaying clicks."),
            Self::MalformedRecords => {
                Some("Every record needs a non-empty id that is unique within the batch.")
            }
            Self::DeleteFailed => Some("The other records in the batch were still requested."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
