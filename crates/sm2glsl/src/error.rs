use std::fmt;

/// Where in the bytecode a diagnostic was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorPosition {
    /// No position is associated with the error.
    None,
    /// Raised while reading the version token, before any processing began.
    Before,
    /// Raised during final processing, after the token stream was consumed.
    After,
    /// Byte offset into the token stream.
    Offset(u32),
}

impl ErrorPosition {
    /// Integer form used in diagnostics: -3, -2, -1 for the sentinels.
    pub fn as_i64(self) -> i64 {
        match self {
            Self::None => -3,
            Self::Before => -2,
            Self::After => -1,
            Self::Offset(offset) => offset as i64,
        }
    }
}

/// One diagnostic produced while parsing a shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderError {
    pub message: String,
    pub filename: Option<String>,
    pub position: ErrorPosition,
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.position.as_i64();
        write!(
            f,
            "{} in {} at {} (0x{:08X})",
            self.message,
            self.filename.as_deref().unwrap_or("<unknown>"),
            pos,
            pos as u32
        )
    }
}

impl std::error::Error for ShaderError {}

/// Failures that prevent a parse from starting at all.
///
/// Problems with the shader itself are never reported here; they land in
/// [`crate::ParseData::errors`].
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown profile `{0}`")]
    UnknownProfile(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_sentinel_positions() {
        let err = ShaderError {
            message: "Corrupted or truncated shader".into(),
            filename: None,
            position: ErrorPosition::After,
        };
        assert_eq!(
            err.to_string(),
            "Corrupted or truncated shader in <unknown> at -1 (0xFFFFFFFF)"
        );

        let err = ShaderError {
            message: "Unknown opcode.".into(),
            filename: Some("a.vso".into()),
            position: ErrorPosition::Offset(12),
        };
        assert_eq!(err.to_string(), "Unknown opcode. in a.vso at 12 (0x0000000C)");
    }
}
