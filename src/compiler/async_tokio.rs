use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::errors::Result;
use crate::Compiler;

impl Compiler {
    /// Writes the bytes compiled so far to `writer`. Async version of [`Compiler::write_to`].
    pub async fn write_to_async<W: AsyncWrite + Unpin>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}
