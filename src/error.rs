use thiserror::Error;

use crate::model::descriptor::ClassId;

macro_rules! shape_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::UnsupportedShape {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::UnsupportedShape {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into three categories with different propagation rules:
///
/// # Structural type errors
/// - [`Error::UnsupportedShape`] - a type descriptor was used in a position its shape does
///   not support (e.g. asking for the component type of a non-array)
/// - [`Error::ClassNotFound`] - a class declaration could not be produced by the navigator
/// - [`Error::RecursionLimit`] - a hierarchy walk exceeded the maximum depth
///
/// These indicate malformed input or an implementation bug and always terminate the current
/// operation; they are never silently defaulted.
///
/// # Usage errors
/// - [`Error::ModelUsage`] - an operation was invoked outside its legal lifecycle window
///   (e.g. querying a property's element type before the model was linked, or assigning a
///   base class twice)
///
/// Usage errors fail fast and are not routed through the validation event channel.
///
/// # Session control
/// - [`Error::ValidationAborted`] - the validation event handler rejected a report; the
///   current validation session unwinds immediately and must be discarded
#[derive(Error, Debug)]
pub enum Error {
    /// A type descriptor has a shape that the requested operation does not support.
    ///
    /// Navigator operations never fail for structurally valid but semantically unusual
    /// input (such as raw generics); this error is reserved for genuinely malformed
    /// shapes and identifies the offending descriptor in `message`.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the offending descriptor and operation
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Unsupported type shape - {file}:{line}: {message}")]
    UnsupportedShape {
        /// The message to be printed for the shape error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Failed to produce a class declaration for the given name.
    ///
    /// Returned when a navigator's backing source has no declaration for a class
    /// that the model builder or a traversal algorithm needs.
    #[error("Failed to find a class declaration for `{0}`")]
    ClassNotFound(String),

    /// A class identity was used that the navigator never issued.
    ///
    /// The associated [`ClassId`] identifies the unknown class.
    #[error("Unknown class identity - {0}")]
    UnknownClass(ClassId),

    /// General error during type-model construction.
    ///
    /// Covers declaration-table conflicts and other construction failures that
    /// do not fit a more specific variant.
    #[error("{0}")]
    TypeError(String),

    /// Recursion limit reached.
    ///
    /// Hierarchy walks (base-class resolution, subtype checks, erasure through
    /// variable bounds) enforce a maximum depth so that malformed cyclic
    /// declarations surface as an error instead of exhausting the stack.
    ///
    /// The associated value shows the recursion limit that was reached.
    #[error("Reached the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// An operation was invoked outside its legal lifecycle window.
    ///
    /// This is a programming error on the caller's side, reported distinctly from
    /// lookup misses: e.g. querying a property's element type before the owning
    /// model was linked, or assigning a class model's base twice.
    #[error("Model usage error - {0}")]
    ModelUsage(String),

    /// The validation event handler rejected a report.
    ///
    /// Raised by a [`crate::validation::ValidationSession`] to unwind the current
    /// validation pass immediately. Once raised, the session performs no further
    /// reporting or registration and must be discarded.
    #[error("Validation aborted - {0}")]
    ValidationAborted(String),
}
