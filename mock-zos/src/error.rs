use std::fmt;
use thiserror::Error;

/// SAF / RACF return and reason codes reported by the PassTicket services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode {
    pub saf_rc: u8,
    pub racf_rc: u8,
    pub racf_rsn: u8,
    pub message: &'static str,
}

impl ErrorCode {
    pub const ERR_8_8_16: ErrorCode = ErrorCode {
        saf_rc: 8,
        racf_rc: 8,
        racf_rsn: 16,
        message: "Not authorized to use the PassTicket service for this user",
    };

    pub const ERR_8_16_28: ErrorCode = ErrorCode {
        saf_rc: 8,
        racf_rc: 16,
        racf_rsn: 28,
        message: "The application name is not valid or is not defined to RACF",
    };

    pub const ERR_8_16_32: ErrorCode = ErrorCode {
        saf_rc: 8,
        racf_rc: 16,
        racf_rsn: 32,
        message: "The PassTicket is not valid",
    };
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (SAF RC {}, RACF RC {}, RSN {})",
            self.message, self.saf_rc, self.racf_rc, self.racf_rsn
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("PassTicket generation failed: {}", ErrorCode::ERR_8_8_16)]
    UnknownUser,

    #[error("PassTicket generation failed: {}", ErrorCode::ERR_8_16_28)]
    UnknownApplId,
}

impl GenerationError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            GenerationError::UnknownUser => ErrorCode::ERR_8_8_16,
            GenerationError::UnknownApplId => ErrorCode::ERR_8_16_28,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("PassTicket evaluation failed: {}", ErrorCode::ERR_8_16_28)]
    UnknownApplId,

    #[error("PassTicket evaluation failed: {}", ErrorCode::ERR_8_16_32)]
    InvalidTicket,
}

impl EvaluationError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            EvaluationError::UnknownApplId => ErrorCode::ERR_8_16_28,
            EvaluationError::InvalidTicket => ErrorCode::ERR_8_16_32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_racf_reasons() {
        assert_eq!(GenerationError::UnknownUser.error_code().racf_rsn, 16);
        assert_eq!(GenerationError::UnknownApplId.error_code().racf_rsn, 28);
        assert_eq!(EvaluationError::InvalidTicket.error_code().racf_rsn, 32);
        assert_eq!(EvaluationError::UnknownApplId.error_code().racf_rc, 16);
    }

    #[test]
    fn display_includes_return_codes() {
        let text = EvaluationError::InvalidTicket.to_string();
        assert!(text.contains("SAF RC 8"));
        assert!(text.contains("RSN 32"));
    }
}
