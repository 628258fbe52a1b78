use crate::constants;
use bytes::{Bytes, BytesMut};
use futures_util::stream::Stream;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

pub(crate) struct StreamBuffer<'r> {
    pub(crate) eof: bool,
    pub(crate) buf: BytesMut,
    pub(crate) stream: Pin<Box<dyn Stream<Item = Result<Bytes, crate::Error>> + Send + 'r>>,
}

impl<'r> StreamBuffer<'r> {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, crate::Error>> + Send + 'r,
    {
        StreamBuffer {
            eof: false,
            buf: BytesMut::new(),
            stream: Box::pin(stream),
        }
    }

    /// Pulls one chunk from the underlying stream into the buffer.
    pub fn poll_stream(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), crate::Error>> {
        if self.eof {
            return Poll::Ready(Ok(()));
        }

        match self.stream.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(data))) => {
                self.buf.extend_from_slice(&data);
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Some(Err(err))) => Poll::Ready(Err(err)),
            Poll::Ready(None) => {
                self.eof = true;
                Poll::Ready(Ok(()))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    /// Yields the next line including its `\n`. Once the stream is exhausted a
    /// trailing unterminated fragment comes out as the last line, then `None`.
    pub fn poll_line(&mut self, cx: &mut Context<'_>) -> Poll<Result<Option<Bytes>, crate::Error>> {
        loop {
            if let Some(line) = self.read_line() {
                return Poll::Ready(Ok(Some(line)));
            }

            if self.eof {
                return Poll::Ready(Ok(None));
            }

            match self.poll_stream(cx) {
                Poll::Ready(Ok(())) => continue,
                Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
                Poll::Pending => return Poll::Pending,
            }
        }
    }

    pub fn read_line(&mut self) -> Option<Bytes> {
        match memchr::memchr(constants::LF, &self.buf) {
            Some(idx) => Some(self.buf.split_to(idx + 1).freeze()),
            None if self.eof && !self.buf.is_empty() => Some(self.read_full_buf()),
            None => None,
        }
    }

    pub fn read_full_buf(&mut self) -> Bytes {
        self.buf.split_to(self.buf.len()).freeze()
    }
}

impl fmt::Debug for StreamBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBuffer")
            .field("eof", &self.eof)
            .field("buffered", &self.buf.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::poll_fn;
    use futures_util::stream;

    #[tokio::test]
    async fn test_lines_across_chunks() {
        let chunks = vec!["ab", "c\r\nde", "f\r", "\n", "tail"];
        let stream = stream::iter(chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk))));
        let mut buffer = StreamBuffer::new(stream);

        let mut lines = Vec::new();
        while let Some(line) = poll_fn(|cx| buffer.poll_line(cx)).await.unwrap() {
            lines.push(line);
        }

        assert_eq!(lines, vec![Bytes::from("abc\r\n"), Bytes::from("def\r\n"), Bytes::from("tail")]);
        assert!(buffer.eof);
    }

    #[tokio::test]
    async fn test_stream_error_surfaces() {
        let chunks: Vec<Result<Bytes, crate::Error>> = vec![Ok(Bytes::from("abc")), Err(crate::Error::IncompleteStream)];
        let mut buffer = StreamBuffer::new(stream::iter(chunks));

        let res = poll_fn(|cx| buffer.poll_line(cx)).await;
        assert_eq!(res, Err(crate::Error::IncompleteStream));
    }
}
