use std::fmt::{self, Debug, Display, Formatter};

use derive_more::Display;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while decoding a multipart body and while
/// storing the decoded parts.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// The multipart stream ended before its terminator, or never opened with
    /// a separator.
    #[display(fmt = "incomplete multipart stream")]
    IncompleteStream,

    /// Stream read failed.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(BoxError),

    /// Writing a part's content into its spool buffer failed.
    #[display(fmt = "failed to buffer part content: {}", _0)]
    SpoolFailed(std::io::Error),

    /// Upload storage I/O failed.
    #[display(fmt = "failed to store upload: {}", _0)]
    StoreFailed(std::io::Error),

    /// The `Content-Type` header is not `multipart/form-data`.
    #[display(fmt = "Content-Type is not multipart/form-data")]
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[display(fmt = "failed to decode Content-Type: {}", _0)]
    DecodeContentType(mime::FromStrError),

    /// No usable boundary found in `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// Failed to decode the part data as `JSON` in
    /// [`part.json()`](crate::Part::json) method.
    #[cfg(feature = "json")]
    #[display(fmt = "failed to decode part data as JSON: {}", _0)]
    DecodeJson(serde_json::Error),
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::StreamReadFailed(err) => Some(err.as_ref()),
            Error::SpoolFailed(err) | Error::StoreFailed(err) => Some(err),
            Error::DecodeContentType(err) => Some(err),
            #[cfg(feature = "json")]
            Error::DecodeJson(err) => Some(err),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}

/// Maps I/O failures onto the matching crate error.
pub(crate) trait ResultExt<T> {
    fn spool_context(self) -> crate::Result<T>;
    fn store_context(self) -> crate::Result<T>;
}

impl<T> ResultExt<T> for std::io::Result<T> {
    fn spool_context(self) -> crate::Result<T> {
        self.map_err(Error::SpoolFailed)
    }

    fn store_context(self) -> crate::Result<T> {
        self.map_err(Error::StoreFailed)
    }
}
