pub(crate) const DEFAULT_MEMORY_THRESHOLD: usize = 1024 * 1024;

pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CRLF: &str = "\r\n";
pub(crate) const LF: u8 = b'\n';

pub(crate) const BOUNDARY_PARAM: &str = "boundary";
pub(crate) const NAME_PARAM: &str = "name";
pub(crate) const FILE_NAME_PARAM: &str = "filename";

pub(crate) const CONTENT_DISPOSITION_MARKER: &str = "Content-Disposition:";
pub(crate) const CONTENT_TYPE_MARKER: &str = "Content-Type:";

pub(crate) fn separator(boundary: &str) -> Vec<u8> {
    format!("{}{}{}", BOUNDARY_EXT, boundary, CRLF).into_bytes()
}

pub(crate) fn terminator(boundary: &str) -> Vec<u8> {
    format!("{}{}{}{}", BOUNDARY_EXT, boundary, BOUNDARY_EXT, CRLF).into_bytes()
}

/// Whether `line` starts with the header `marker`, ignoring ASCII case.
pub(crate) fn starts_with_marker(line: &[u8], marker: &str) -> bool {
    line.len() >= marker.len() && line[..marker.len()].eq_ignore_ascii_case(marker.as_bytes())
}
