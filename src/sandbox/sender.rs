use super::codec::{Invocation, decode_reply, read_frame, write_frame};
use super::error::ChannelError;
use super::methods::SandboxMethod;
use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::{Read, Write};
use std::thread::{self, ThreadId};

/// Requesting end of a sandbox channel.
///
/// The sender belongs to the thread that created it; calls from any other thread fail
/// with [`ChannelError::WrongThread`]. Requests are strictly sequential: a synchronous call
/// blocks until its reply frame has been read.
pub struct ChannelSender<R: Read, W: Write> {
    reader: R,
    writer: W,
    owner: ThreadId,
}

impl<R: Read, W: Write> ChannelSender<R, W> {
    /// `reader` receives replies, `writer` carries requests.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            owner: thread::current().id(),
        }
    }

    fn check_thread(&self) -> Result<(), ChannelError> {
        if thread::current().id() == self.owner {
            Ok(())
        } else {
            Err(ChannelError::WrongThread)
        }
    }

    fn send(&mut self, is_sync: bool, method: SandboxMethod, args: Vec<Value>) -> Result<(), ChannelError> {
        self.check_thread()?;
        let invocation = Invocation::new(is_sync, method.as_str(), args);
        write_frame(&mut self.writer, &invocation.encode()?)?;
        trace!(target: "sandbox", "Sent {} (sync: {})", method, is_sync);
        Ok(())
    }

    /// Returns once the request frame is written.
    pub fn invoke_async(&mut self, method: SandboxMethod, args: Vec<Value>) -> Result<(), ChannelError> {
        self.send(false, method, args)
    }

    /// Sends the request and waits for its reply; `None` is a null result.
    pub fn invoke_sync(&mut self, method: SandboxMethod, args: Vec<Value>) -> Result<Option<Value>, ChannelError> {
        self.send(true, method, args)?;
        let reply = decode_reply(&read_frame(&mut self.reader)?)?;
        debug!(target: "sandbox", "{} returned {}", method, if reply.is_some() { "a value" } else { "null" });
        Ok(reply)
    }

    /// [`invoke_sync`](Self::invoke_sync) with the result decoded into `T`.
    pub fn invoke_sync_as<T: DeserializeOwned>(
        &mut self,
        method: SandboxMethod,
        args: Vec<Value>,
    ) -> Result<Option<T>, ChannelError> {
        match self.invoke_sync(method, args)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Liveness probe; the receiving end answers it without involving its handler.
    pub fn heart_beat(&mut self) -> Result<bool, ChannelError> {
        Ok(self
            .invoke_sync_as::<bool>(SandboxMethod::HeartBeat, Vec::new())?
            .unwrap_or(false))
    }
}
