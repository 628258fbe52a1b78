//! A line-oriented `multipart/form-data` decoder that spools each part to
//! memory or, past a threshold, to a temporary file.
//!
//! The body is consumed one line at a time by a small state machine
//! ([`Decoder`]) that can be driven from a blocking reader ([`decode`]) or an
//! async byte stream ([`Multipart`]). Decoding either yields every part of the
//! body, in order, or fails as a whole.
//!
//! # Examples
//!
//! ```
//! use formspool::{decode, parse_boundary};
//!
//! let content_type = "multipart/form-data; boundary=X-BOUNDARY";
//! let body = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"files\"; filename=\"a.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\r\n--X-BOUNDARY--\r\n";
//!
//! let boundary = parse_boundary(content_type).unwrap();
//! for part in decode(body.as_bytes(), boundary).unwrap() {
//!     println!("Name: {:?}, File Name: {:?}", part.name(), part.file_name());
//!     println!("Content: {:?}", part.text().unwrap());
//! }
//! ```
//!
//! ## Optional Features
//!
//! * `json`: adds [`Part::json`] for parsing part contents as JSON.
//! * `tokio-io`: adds [`Multipart::with_reader`] for `tokio::io::AsyncRead`
//!   sources.

pub use bytes;

pub use blocking::{decode, decode_request, decode_with_config};
pub use config::SpoolConfig;
pub use decoder::Decoder;
pub use error::Error;
pub use header::{extract_param, HeaderLookup};
pub use multipart::Multipart;
pub use part::Part;
pub use spool::SpoolBuffer;
pub use store::{human_bytes, StoredUpload, UploadStore};

mod blocking;
mod buffer;
mod config;
mod constants;
mod decoder;
mod error;
mod header;
mod multipart;
mod part;
mod spool;
mod state;
mod store;

/// A Result type often returned from methods that can have `formspool` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// The header must name `multipart/form-data` and carry a non-empty
/// `boundary` parameter.
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> crate::Result<String> {
    let content_type = content_type.as_ref();
    let m = content_type
        .parse::<mime::Mime>()
        .map_err(crate::Error::DecodeContentType)?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(crate::Error::NoMultipart);
    }

    let boundary = extract_param(constants::BOUNDARY_PARAM, content_type);

    if boundary.is_empty() {
        Err(crate::Error::NoBoundary)
    } else {
        Ok(boundary)
    }
}

/// Looks up `Content-Type` in `headers` and extracts the boundary from it.
pub fn boundary_from_headers<H: HeaderLookup + ?Sized>(headers: &H) -> crate::Result<String> {
    headers
        .header_value(http::header::CONTENT_TYPE.as_str())
        .ok_or(crate::Error::NoMultipart)
        .and_then(parse_boundary)
}
