use std::fmt::Display;
use std::fmt::Formatter;

pub type Result<T> = std::result::Result<T, Error>;

/// every failure the library surfaces to its caller.
/// nothing in here is retried internally.
#[derive(Debug)]
pub enum Error {
    /// non-limit betting, wrong player count, or a deal too
    /// large for the hand evaluator
    UnsupportedGame(String),
    /// a strategy file line does not parse, does not sum to one,
    /// or names an infoset outside the canonical tree
    InvalidStrategy(String),
    /// an opponent model or baseline does not cover a required infoset
    MissingInfoset(String),
    /// a showdown log line hides hole cards the estimator needs
    MuckingUnsupported,
    /// a training or selection parameter is outside its legal range
    ParameterOutOfRange(String),
    /// file not readable or writable, or a malformed log line
    Io(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Error::UnsupportedGame(what) => write!(f, "unsupported game: {}", what),
            Error::InvalidStrategy(what) => write!(f, "invalid strategy: {}", what),
            Error::MissingInfoset(key) => write!(f, "missing infoset: {}", key),
            Error::MuckingUnsupported => write!(f, "mucked hole cards are not supported"),
            Error::ParameterOutOfRange(what) => write!(f, "parameter out of range: {}", what),
            Error::Io(e) => write!(f, "io failure: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
