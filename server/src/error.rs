use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("cannot parse {name}={value:?}")]
    Env { name: &'static str, value: String },
}

/// Inbound message could not be turned into a command.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("undecodable message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("non-finite number in {0}")]
    NotFinite(&'static str),
    #[error("ball radius must be > 0, got {0}")]
    BadRadius(f64),
    #[error("window extent must be >= 0, got {width}x{height}")]
    BadExtent { width: f64, height: f64 },
}

/// Well-formed command that cannot be applied to the current state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown session {0}")]
    UnknownSession(u32),
    #[error("update-window without id")]
    MissingWindowId,
    #[error("window id {0} was never assigned")]
    UnassignedWindow(u32),
    #[error("no open window with id {0}")]
    UnknownWindow(u32),
    #[error("ball limit of {0} reached")]
    BallLimit(usize),
}
