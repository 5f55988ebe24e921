use tokio::io::{AsyncRead, AsyncReadExt};

use crate::errors::Error;
use crate::handler::ContentHandler;
use crate::Interpreter;

impl<H: ContentHandler> Interpreter<H> {
    /// Reads `reader` to its end and replays the bytes into the bound
    /// consumer. Async version of [`Interpreter::deserialize_from`].
    ///
    /// Only reading is asynchronous: once all bytes are available, the
    /// records are replayed synchronously.
    pub async fn deserialize_from_async<R>(&mut self, mut reader: R) -> Result<(), H::Error>
    where
        R: AsyncRead + Unpin,
    {
        if self.consumer.is_none() {
            return Err(super::no_consumer());
        }
        self.input.clear();
        reader
            .read_to_end(&mut self.input)
            .await
            .map_err(Error::from)?;
        self.deserialize_input()
    }
}
