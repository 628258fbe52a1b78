use crate::buffer::StreamBuffer;
use crate::config::SpoolConfig;
use crate::decoder::Decoder;
use crate::Part;
use bytes::Bytes;
use futures_util::future::poll_fn;
use futures_util::stream::{Stream, TryStreamExt};
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

/// Decodes a `multipart/form-data` body arriving as a stream of byte chunks.
///
/// The chunks are split into lines and fed to a [`Decoder`]; the parts are
/// handed out together once the terminating delimiter has been read, so a
/// malformed body never yields a partial result.
///
/// # Examples
///
/// ```
/// use formspool::Multipart;
/// use bytes::Bytes;
/// use std::convert::Infallible;
/// use futures_util::stream::once;
///
/// # async fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
/// let multipart = Multipart::new(stream, "X-BOUNDARY").unwrap();
///
/// for part in multipart.parts().await.unwrap() {
///     println!("Part: {:?}", part.text())
/// }
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
#[derive(Debug)]
pub struct Multipart<'r> {
    buffer: StreamBuffer<'r>,
    decoder: Decoder,
}

impl<'r> Multipart<'r> {
    /// Construct a new `Multipart` instance with the given [`Bytes`] stream and
    /// the boundary.
    pub fn new<S, O, E, B>(stream: S, boundary: B) -> crate::Result<Multipart<'r>>
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'r,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'r,
        B: AsRef<str>,
    {
        Multipart::with_config(stream, boundary, SpoolConfig::default())
    }

    /// Construct a new `Multipart` instance with the given [`Bytes`] stream,
    /// the boundary and a [`SpoolConfig`] for the part buffers.
    pub fn with_config<S, O, E, B>(stream: S, boundary: B, config: SpoolConfig) -> crate::Result<Multipart<'r>>
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'r,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'r,
        B: AsRef<str>,
    {
        let stream = stream
            .map_ok(|b| b.into())
            .map_err(|err| crate::Error::StreamReadFailed(err.into()));

        Ok(Multipart {
            buffer: StreamBuffer::new(stream),
            decoder: Decoder::with_config(boundary, config)?,
        })
    }

    /// Construct a new `Multipart` instance with the given [`AsyncRead`] reader
    /// and the boundary.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use formspool::Multipart;
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let reader = data.as_bytes();
    /// let multipart = Multipart::with_reader(reader, "X-BOUNDARY").unwrap();
    ///
    /// for part in multipart.parts().await.unwrap() {
    ///     println!("Part: {:?}", part.name());
    /// }
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    #[cfg(feature = "tokio-io")]
    pub fn with_reader<R, B>(reader: R, boundary: B) -> crate::Result<Multipart<'r>>
    where
        R: AsyncRead + Unpin + Send + 'r,
        B: AsRef<str>,
    {
        let stream = ReaderStream::new(reader);
        Multipart::new(stream, boundary)
    }

    /// Reads the whole body and returns its parts in the order they appeared.
    ///
    /// Parts that outgrow the spool's memory threshold are written to a
    /// temporary file with blocking I/O on the calling task.
    pub async fn parts(mut self) -> crate::Result<Vec<Part>> {
        let buffer = &mut self.buffer;
        let decoder = &mut self.decoder;

        while let Some(line) = poll_fn(|cx| buffer.poll_line(cx)).await? {
            if decoder.feed_line(&line)? {
                break;
            }
        }

        self.decoder.finish()
    }
}
