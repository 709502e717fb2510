use super::codec::{Invocation, encode_reply, read_frame, write_frame};
use super::error::ChannelError;
use super::methods::SandboxMethod;
use log::{info, trace, warn};
use serde_json::Value;
use std::io::{self, Read, Write};
use std::thread::{self, JoinHandle};

/// Serves the methods one side of the channel implements.
pub trait InvocationHandler: Send + 'static {
    /// Result for a synchronous call; ignored for asynchronous ones.
    fn on_invoke(&mut self, method: SandboxMethod, args: Vec<Value>) -> Result<Option<Value>, ChannelError>;
}

/// Listening end of a sandbox channel, run on its own thread.
pub struct ChannelReceiver<R, W, H> {
    name: String,
    reader: R,
    writer: W,
    handler: H,
}

impl<R, W, H> ChannelReceiver<R, W, H>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
    H: InvocationHandler,
{
    /// `reader` carries requests, `writer` receives replies.
    pub fn new(name: &str, reader: R, writer: W, handler: H) -> Self {
        Self {
            name: name.to_string(),
            reader,
            writer,
            handler,
        }
    }

    /// Starts the listener thread. The thread ends when the peer closes the channel
    /// (`Ok`) or on the first I/O or codec failure, which the join handle returns.
    pub fn spawn(self) -> io::Result<JoinHandle<Result<(), ChannelError>>> {
        thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || self.run())
    }

    pub fn run(mut self) -> Result<(), ChannelError> {
        info!(target: "sandbox", "Channel {} listening", self.name);
        loop {
            let frame = match read_frame(&mut self.reader) {
                Ok(frame) => frame,
                Err(ChannelError::Closed) => {
                    info!(target: "sandbox", "Channel {} closed by peer", self.name);
                    return Ok(());
                }
                Err(e) => {
                    warn!(target: "sandbox", "Channel {} failed: {}", self.name, e);
                    return Err(e);
                }
            };
            let invocation = Invocation::decode(&frame)?;
            let is_sync = invocation.is_sync;
            let result = self.dispatch(invocation);
            if is_sync {
                write_frame(&mut self.writer, &encode_reply(result.as_ref())?)?;
            }
        }
    }

    fn dispatch(&mut self, invocation: Invocation) -> Option<Value> {
        trace!(target: "sandbox", "{} received {}", self.name, invocation.method);
        let method = match invocation.method.parse::<SandboxMethod>() {
            Ok(method) => method,
            Err(name) => {
                warn!(target: "sandbox", "{}", ChannelError::UnknownMethod(name));
                return None;
            }
        };
        if method == SandboxMethod::HeartBeat {
            return Some(Value::Bool(true));
        }
        match self.handler.on_invoke(method, invocation.args) {
            Ok(result) => result,
            Err(e) => {
                warn!(target: "sandbox", "Handler for {} failed: {}", method, e);
                None
            }
        }
    }
}
