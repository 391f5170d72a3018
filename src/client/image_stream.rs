use crate::client::transport::{ByteStream, HttpResponse};
use crate::error::{ApiError, Result};
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Open body of a generation download.
///
/// The stream is handed over as-is, whatever the HTTP status was. Check
/// [`status`](Self::status) or call [`error_for_status`](Self::error_for_status)
/// before trusting the bytes to be an image. Dropping the stream releases the
/// underlying connection.
pub struct ImageStream {
    generation_id: String,
    status: u16,
    body: ByteStream,
}

impl std::fmt::Debug for ImageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageStream")
            .field("generation_id", &self.generation_id)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl ImageStream {
    pub(crate) fn new(generation_id: impl Into<String>, response: HttpResponse) -> Self {
        Self {
            generation_id: generation_id.into(),
            status: response.status,
            body: response.body,
        }
    }

    pub fn generation_id(&self) -> &str {
        &self.generation_id
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Turns a non-200 download into the structured error, reading the body into `details`.
    pub async fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let status = self.status;
        let body = self.bytes().await?;
        Err(ApiError::unexpected_status(status, String::from_utf8_lossy(&body)).into())
    }

    pub async fn next_chunk(&mut self) -> Option<Result<Vec<u8>>> {
        self.body.next().await
    }

    pub async fn bytes(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }

    /// Copies the remaining body into `writer` through a `buffer_size` byte buffer.
    /// Returns the number of bytes copied.
    pub async fn copy_to<W>(&mut self, writer: &mut W, buffer_size: usize) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut out = BufWriter::with_capacity(buffer_size.max(1), writer);
        let mut copied = 0u64;
        while let Some(chunk) = self.body.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            copied += chunk.len() as u64;
        }
        out.flush().await?;
        Ok(copied)
    }
}
