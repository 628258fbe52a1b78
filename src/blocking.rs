use crate::config::SpoolConfig;
use crate::constants;
use crate::decoder::Decoder;
use crate::header::HeaderLookup;
use crate::Part;
use std::io::BufRead;

/// Decodes a `multipart/form-data` body from a blocking reader.
///
/// Lines are pulled with [`BufRead::read_until`] until the terminating
/// delimiter; nothing after it is read.
///
/// # Examples
///
/// ```
/// let data = "--XYZ\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nhello\r\n--XYZ--\r\n";
/// let parts = formspool::decode(data.as_bytes(), "XYZ").unwrap();
///
/// assert_eq!(parts.len(), 1);
/// assert_eq!(parts[0].name(), Some("text"));
/// assert_eq!(parts[0].file_name(), None);
/// ```
pub fn decode<R: BufRead, B: AsRef<str>>(reader: R, boundary: B) -> crate::Result<Vec<Part>> {
    decode_with_config(reader, boundary, SpoolConfig::default())
}

/// Same as [`decode`], buffering parts as `config` says.
pub fn decode_with_config<R: BufRead, B: AsRef<str>>(
    mut reader: R,
    boundary: B,
    config: SpoolConfig,
) -> crate::Result<Vec<Part>> {
    let mut decoder = Decoder::with_config(boundary, config)?;
    let mut line = Vec::new();

    loop {
        line.clear();

        let read = reader
            .read_until(constants::LF, &mut line)
            .map_err(|err| crate::Error::StreamReadFailed(err.into()))?;

        if read == 0 || decoder.feed_line(&line)? {
            break;
        }
    }

    decoder.finish()
}

/// Decodes a request body, taking the boundary from the request's
/// `Content-Type` header.
pub fn decode_request<H, R>(headers: &H, reader: R, config: SpoolConfig) -> crate::Result<Vec<Part>>
where
    H: HeaderLookup + ?Sized,
    R: BufRead,
{
    let boundary = crate::boundary_from_headers(headers)?;
    decode_with_config(reader, boundary, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::{self, Read};

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    #[test]
    fn test_read_error_is_reported() {
        let reader = io::BufReader::new(FailingReader);
        match decode(reader, "X") {
            Err(crate::Error::StreamReadFailed(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_epilogue_left_unread() {
        let data = b"--X\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--X--\r\nrest\r\n";
        let mut reader = &data[..];

        let parts = decode(&mut reader, "X").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(reader, b"rest\r\n");
    }

    #[test]
    fn test_decode_request() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_owned(), "multipart/form-data; boundary=XYZ".to_owned());

        let data = "--XYZ\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nhello\r\n--XYZ--\r\n";
        let parts = decode_request(&headers, data.as_bytes(), SpoolConfig::default()).unwrap();
        assert_eq!(parts.len(), 1);

        let headers: HashMap<String, String> = HashMap::new();
        assert_eq!(
            decode_request(&headers, data.as_bytes(), SpoolConfig::default()).unwrap_err(),
            crate::Error::NoMultipart
        );

        let mut headers = HashMap::new();
        headers.insert("content-type".to_owned(), "multipart/form-data".to_owned());
        assert_eq!(
            decode_request(&headers, data.as_bytes(), SpoolConfig::default()).unwrap_err(),
            crate::Error::NoBoundary
        );
    }
}
