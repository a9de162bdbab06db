//! Validation Error Codes
//!
//! Every failure is terminal for the current validation attempt and is
//! reported straight back to the caller as a negative errno.

/// Errors returned by post validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Caller memory is not readable.
    #[error("bad address")]
    Fault,
    /// Malformed counts, sizes, enums or geometry.
    #[error("invalid argument")]
    InvalidArgument,
    /// An interface or overlay-engine ID does not resolve.
    #[error("no such object")]
    NotFound,
    /// A transient allocation failed.
    #[error("out of memory")]
    OutOfMemory,
    /// An external memory handle could not be imported.
    #[error("bad file descriptor")]
    BadHandle,
    /// Unknown control code.
    #[error("inappropriate control code")]
    NotTty,
    /// The driver declined the post with its own status code.
    #[error("driver rejected post ({0})")]
    DriverRejected(i32),
}

/// Linux errno values used by the control operation.
pub mod errno {
    pub const ENOENT: i32 = 2;
    pub const EBADF: i32 = 9;
    pub const ENOMEM: i32 = 12;
    pub const EFAULT: i32 = 14;
    pub const EINVAL: i32 = 22;
    pub const ENOTTY: i32 = 25;
}

impl Error {
    /// Negative errno handed back to the caller of the control operation.
    ///
    /// Negative driver codes pass through verbatim. A driver code that is
    /// not negative would read as success, so it becomes `-EINVAL`.
    pub const fn errno(self) -> i64 {
        let code = match self {
            Self::Fault => -errno::EFAULT,
            Self::InvalidArgument => -errno::EINVAL,
            Self::NotFound => -errno::ENOENT,
            Self::OutOfMemory => -errno::ENOMEM,
            Self::BadHandle => -errno::EBADF,
            Self::NotTty => -errno::ENOTTY,
            Self::DriverRejected(code) if code < 0 => code,
            Self::DriverRejected(_) => -errno::EINVAL,
        };
        code as i64
    }
}

impl From<alloc::collections::TryReserveError> for Error {
    fn from(_: alloc::collections::TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(Error::Fault.errno(), -14);
        assert_eq!(Error::InvalidArgument.errno(), -22);
        assert_eq!(Error::NotFound.errno(), -2);
        assert_eq!(Error::OutOfMemory.errno(), -12);
        assert_eq!(Error::NotTty.errno(), -25);
    }

    #[test]
    fn test_driver_code_passes_through() {
        assert_eq!(Error::DriverRejected(-16).errno(), -16);
    }

    #[test]
    fn test_non_negative_driver_code_is_still_an_error() {
        assert_eq!(Error::DriverRejected(0).errno(), -22);
        assert_eq!(Error::DriverRejected(5).errno(), -22);
        assert_eq!(Error::DriverRejected(i32::MIN).errno(), i64::from(i32::MIN));
    }
}
