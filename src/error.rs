//! The three error kinds that can unwind out of this crate. None of them
//! are caught internally — they propagate to the driver, which formats and
//! exits. There is no recovery or partial continuation anywhere in the
//! pipeline.

use crate::scanner::Token;

pub use crate::scanner::ScannerError;

/// A grammar violation at or before `token`. `token` is `None` when the
/// violation is discovered at end of input, since there is no token left to
/// blame.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub message: String,
    pub token: Option<Token>,
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.token {
            Some(t) => write!(f, "{} (found {})", self.message, t),
            None => write!(f, "{} (at end of input)", self.message),
        }
    }
}

impl std::error::Error for ParserError {}

/// A structurally well-formed program the compiler cannot lower: an
/// unresolved `goto` target or an invalid assignment target.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub position: crate::scanner::Position,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at {})", self.message, self.position)
    }
}

impl std::error::Error for CompileError {}

/// A snapshot of every stack pointer plus the PC at the moment a VM error
/// was raised, sufficient to reproduce the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VmTrace {
    pub pc: usize,
    pub operand_top: usize,
    pub call_top: usize,
    pub code_top: usize,
    pub frame_base: usize,
}

impl std::fmt::Display for VmTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pc={} operand_top={} call_top={} code_top={} frame_base={}",
            self.pc, self.operand_top, self.call_top, self.code_top, self.frame_base
        )
    }
}

/// The sub-kind of a VM fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmErrorKind {
    StackFlow,
    TypeMismatch,
    MissingTableEntry,
    BadConstantIndex,
    MalformedCode,
}

impl std::fmt::Display for VmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VmErrorKind::StackFlow => "stack underflow/overflow",
            VmErrorKind::TypeMismatch => "type mismatch",
            VmErrorKind::MissingTableEntry => "missing table entry",
            VmErrorKind::BadConstantIndex => "bad constant index",
            VmErrorKind::MalformedCode => "malformed code",
        };
        write!(f, "{name}")
    }
}

/// A fatal runtime fault. All faults are fatal to the executing script; the
/// VM does not attempt to resume after one.
#[derive(Debug, Clone, PartialEq)]
pub struct VmError {
    pub kind: VmErrorKind,
    pub message: String,
    pub trace: VmTrace,
}

impl VmError {
    pub fn new(kind: VmErrorKind, message: impl Into<String>, trace: VmTrace) -> Self {
        VmError {
            kind,
            message: message.into(),
            trace,
        }
    }
}

impl std::fmt::Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.kind, self.message, self.trace)
    }
}

impl std::error::Error for VmError {}

/// Umbrella error returned by the crate's top-level `run`/`compile` helpers,
/// so callers can propagate any stage's failure with a single `?`.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Scanner(ScannerError),
    Parser(ParserError),
    Compile(CompileError),
    Vm(VmError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Scanner(e) => write!(f, "{e}"),
            Error::Parser(e) => write!(f, "{e}"),
            Error::Compile(e) => write!(f, "{e}"),
            Error::Vm(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ScannerError> for Error {
    fn from(e: ScannerError) -> Self {
        Error::Scanner(e)
    }
}

impl From<ParserError> for Error {
    fn from(e: ParserError) -> Self {
        Error::Parser(e)
    }
}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Self {
        Error::Compile(e)
    }
}

impl From<VmError> for Error {
    fn from(e: VmError) -> Self {
        Error::Vm(e)
    }
}

