//! Framed RPC channel between the app process and the script sandbox process

pub mod codec;
pub mod error;
pub mod methods;
pub mod receiver;
pub mod sender;

pub use codec::{Invocation, MAX_FRAME_LEN};
pub use error::ChannelError;
pub use methods::SandboxMethod;
pub use receiver::{ChannelReceiver, InvocationHandler};
pub use sender::ChannelSender;
