use std::fmt;

use strum_macros::IntoStaticStr;

/// Represents an error raised by the parser stack or by one of its items.
#[derive(Debug, Clone)]
pub struct StackError(pub StackErrKind);

#[derive(Debug, Clone, IntoStaticStr)]
pub enum StackErrKind {
    /// The item factory has no builder registered under this kind.
    UnknownItemKind(Box<str>),
    /// A merge check produced a result the stack cannot act on.
    InvalidMergeResult { kind: Box<str> },
    /// `pop` or `prev` was called without an open scope.
    StackUnderflow(Operation),
    /// A builder was handed arguments it cannot construct an item from.
    InvalidItemArgs {
        kind: Box<str>,
        expected: &'static str,
    },
    /// An item was pushed somewhere it is not allowed, e.g. `&` outside of an array.
    Misplaced(Box<str>),
    /// A closing item does not match the scope it tries to close.
    MismatchedClose { id: CloseMismatch, name: Box<str> },
    /// The stack did not reduce to a single result when parsing finished.
    Unfinished(Box<str>),
    HardLimitExceeded,
    /// An error signaled by an externally supplied item variant.
    Parse { id: Box<str>, message: Box<str> },
}

static_assertions::const_assert!(
    std::mem::size_of::<StackError>() <= 5 * std::mem::size_of::<usize>()
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum Operation {
    #[strum(serialize = "pop")]
    Pop,
    #[strum(serialize = "prev")]
    Prev,
}

/// Identifiers for the ways a closing item can fail to match its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum CloseMismatch {
    MissingBeginExtraEnd,
    ExtraCloseMissingOpen,
    MissingLeftExtraRight,
    ExtraMiddle,
    ExtraOpenMissingClose,
}

impl StackErrKind {
    /// Returns the error message as a string.
    pub fn string(&self) -> String {
        match self {
            StackErrKind::UnknownItemKind(kind) => {
                "Unknown stack item kind \"".to_string() + kind + "\"."
            }
            StackErrKind::InvalidMergeResult { kind } => {
                "Merge check of \"".to_string() + kind + "\" returned an empty replacement list."
            }
            StackErrKind::StackUnderflow(op) => {
                "Cannot ".to_string() + <&str>::from(op) + ": the stack has no open scope."
            }
            StackErrKind::InvalidItemArgs { kind, expected } => {
                "Invalid arguments for \"".to_string() + kind + "\": expected " + expected + "."
            }
            StackErrKind::Misplaced(name) => "Misplaced ".to_string() + name + ".",
            StackErrKind::MismatchedClose { id, name } => match id {
                CloseMismatch::MissingBeginExtraEnd => {
                    "Missing \\begin{".to_string() + name + "} or extra \\end{" + name + "}."
                }
                CloseMismatch::ExtraCloseMissingOpen => {
                    "Extra close brace or missing open brace.".to_string()
                }
                CloseMismatch::MissingLeftExtraRight => {
                    "Missing \\left or extra \\right.".to_string()
                }
                CloseMismatch::ExtraMiddle => "Extra \\middle.".to_string(),
                CloseMismatch::ExtraOpenMissingClose => {
                    "Extra open brace or missing close brace.".to_string()
                }
            },
            StackErrKind::Unfinished(kind) => {
                "Parse ended with \"".to_string() + kind + "\" still open."
            }
            StackErrKind::HardLimitExceeded => {
                "Hard limit exceeded. Please simplify your equation.".to_string()
            }
            StackErrKind::Parse { message, .. } => message.to_string(),
        }
    }
}

impl StackError {
    /// A stable identifier for the error, suitable for matching in a grammar driver.
    pub fn id(&self) -> &str {
        match &self.0 {
            StackErrKind::MismatchedClose { id, .. } => <&str>::from(id),
            StackErrKind::Parse { id, .. } => &**id,
            other => <&str>::from(other),
        }
    }

    pub fn error_message(&self) -> String {
        self.0.string()
    }
}

impl From<StackErrKind> for Box<StackError> {
    #[inline]
    fn from(kind: StackErrKind) -> Self {
        Box::new(StackError(kind))
    }
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id(), self.0.string())
    }
}

impl std::error::Error for StackError {}
