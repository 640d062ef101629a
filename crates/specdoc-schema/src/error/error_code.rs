//! Error codes for the specdoc diagnostic system.
//!
//! Error codes are organized by the error kind they belong to:
//! - `E0xx` - Load errors (fatal)
//! - `E1xx` - Resolution errors
//! - `E2xx` - Name collision errors
//! - `E3xx` - Render backend errors

use std::fmt;

/// The four error kinds a diagnostic can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing specification input. Aborts the run.
    Load,
    /// A referenced type or name cannot be found.
    Resolution,
    /// Two incompatible definitions share an identity.
    NameCollision,
    /// The layout or export backend failed for one diagram.
    RenderBackend,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Load => "LoadError",
            ErrorKind::Resolution => "ResolutionError",
            ErrorKind::NameCollision => "NameCollisionError",
            ErrorKind::RenderBackend => "RenderBackendError",
        };
        f.write_str(name)
    }
}

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Load Errors (E0xx)
    // =========================================================================
    /// Unreadable file.
    ///
    /// A namespace or schema source file does not exist or cannot be read.
    E001,

    /// YAML syntax error.
    E002,

    /// Invalid specification structure.
    ///
    /// The YAML is well formed but does not have the shape of a namespace
    /// file or schema source file.
    E003,

    /// Missing namespace.
    ///
    /// A namespace was imported or selected that none of the loaded
    /// namespace files declares.
    E004,

    /// Inheritance cycle.
    ///
    /// A type is, directly or indirectly, its own ancestor.
    E005,

    // =========================================================================
    // Resolution Errors (E1xx)
    // =========================================================================
    /// Unresolved type reference.
    E100,

    /// Unresolved root type.
    ///
    /// A diagram root was requested that no loaded namespace defines.
    E101,

    // =========================================================================
    // Name Collision Errors (E2xx)
    // =========================================================================
    /// Conflicting definitions of the same `(namespace, name)` pair.
    E200,

    /// Duplicate diagram root.
    ///
    /// The same root, or two roots with the same artifact file name, were
    /// requested in one run.
    E201,

    // =========================================================================
    // Render Backend Errors (E3xx)
    // =========================================================================
    /// Layout failure.
    E300,

    /// Artifact write failure.
    E301,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unreadable file",
            ErrorCode::E002 => "YAML syntax error",
            ErrorCode::E003 => "invalid specification structure",
            ErrorCode::E004 => "missing namespace",
            ErrorCode::E005 => "inheritance cycle",
            ErrorCode::E100 => "unresolved type reference",
            ErrorCode::E101 => "unresolved root type",
            ErrorCode::E200 => "name collision",
            ErrorCode::E201 => "duplicate root",
            ErrorCode::E300 => "layout failure",
            ErrorCode::E301 => "artifact write failure",
        }
    }

    /// Returns the error kind this code belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::E001
            | ErrorCode::E002
            | ErrorCode::E003
            | ErrorCode::E004
            | ErrorCode::E005 => ErrorKind::Load,
            ErrorCode::E100 | ErrorCode::E101 => ErrorKind::Resolution,
            ErrorCode::E200 | ErrorCode::E201 => ErrorKind::NameCollision,
            ErrorCode::E300 | ErrorCode::E301 => ErrorKind::RenderBackend,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E101.to_string(), "E101");
        assert_eq!(ErrorCode::E301.to_string(), "E301");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E002.description(), "YAML syntax error");
        assert_eq!(ErrorCode::E200.description(), "name collision");
    }

    #[test]
    fn test_error_code_kind() {
        assert_eq!(ErrorCode::E005.kind(), ErrorKind::Load);
        assert_eq!(ErrorCode::E100.kind(), ErrorKind::Resolution);
        assert_eq!(ErrorCode::E201.kind(), ErrorKind::NameCollision);
        assert_eq!(ErrorCode::E300.kind(), ErrorKind::RenderBackend);
        assert_eq!(ErrorKind::NameCollision.to_string(), "NameCollisionError");
    }
}
