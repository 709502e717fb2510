use std::fmt;
use std::io;

#[derive(Debug)]
pub enum ChannelError {
    Io(io::Error),
    Codec(serde_json::Error),
    FrameTooLarge(usize),
    WrongThread,
    UnknownMethod(String),
    /// The peer closed its end of the channel.
    Closed,
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChannelError::Io(e) => Some(e),
            ChannelError::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Io(e) => write!(f, "Channel I/O error: {}", e),
            ChannelError::Codec(e) => write!(f, "Channel codec error: {}", e),
            ChannelError::FrameTooLarge(len) => write!(f, "Frame of {} bytes exceeds the limit", len),
            ChannelError::WrongThread => write!(f, "Channel used from a thread that does not own it"),
            ChannelError::UnknownMethod(name) => write!(f, "Unknown channel method: {}", name),
            ChannelError::Closed => write!(f, "Channel closed by peer"),
        }
    }
}

impl From<io::Error> for ChannelError {
    fn from(e: io::Error) -> Self {
        ChannelError::Io(e)
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(e: serde_json::Error) -> Self {
        ChannelError::Codec(e)
    }
}
