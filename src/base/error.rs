use std::error;
use std::fmt;
use std::io;

/// Represents errors that can occur while talking to the lidar.
#[derive(Debug)]
pub enum Error {
    /// The operation could not be carried out. Contains a description of the failure.
    OperationFail { description: String },

    /// The execution of operation is timed out.
    OperationTimeout,

    /// The received data violates the protocol. Contains a description of the protocol error.
    ProtocolError { description: String },

    /// The buffer provided is too small for message encoding.
    BufferTooSmall,

    /// An I/O error occurred while communicating with the underlying stream (e.g., serial port).
    IoError(io::Error),
}

impl Error {
    /// Returns `true` if the time budget of the operation ran out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::OperationTimeout)
    }

    /// Returns `true` for logical and protocol failures (transport not open,
    /// unexpected answer type, undersized answer, rejected checksum).
    pub fn is_fail(&self) -> bool {
        matches!(
            self,
            Error::OperationFail { .. } | Error::ProtocolError { .. }
        )
    }

    pub(crate) fn protocol(description: impl Into<String>) -> Error {
        Error::ProtocolError {
            description: description.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OperationFail { description } => write!(f, "operation failed: {}", description),
            Error::OperationTimeout => write!(f, "operation timeout"),
            Error::ProtocolError { description } => write!(f, "protocol error: {}", description),
            Error::BufferTooSmall => write!(f, "buffer is too small for message encoding"),
            Error::IoError(err) => write!(f, "io error: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IoError(err)
    }
}

/// A specialized `Result` type for lidar operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;
    use std::io;

    #[test]
    fn taxonomy() {
        assert!(Error::OperationTimeout.is_timeout());
        assert!(!Error::OperationTimeout.is_fail());
        assert!(Error::protocol("bad type").is_fail());
        assert!(Error::OperationFail {
            description: "transport not open".to_owned()
        }
        .is_fail());

        let io_err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(!io_err.is_fail());
        assert!(!io_err.is_timeout());
    }

    #[test]
    fn display() {
        assert_eq!(
            Error::protocol("unexpected answer type 0x05").to_string(),
            "protocol error: unexpected answer type 0x05"
        );
        assert_eq!(Error::OperationTimeout.to_string(), "operation timeout");
    }
}
