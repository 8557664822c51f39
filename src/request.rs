use std::time::SystemTime;

use http::StatusCode;

/// The read-only view of an in-flight request, consumed from the host
/// HTTP server. The host buffers the body (up to `Content-Length`) and
/// implements header access; this crate never parses HTTP itself.
pub trait DavRequest {
    fn method(&self) -> &str;
    fn path_info(&self) -> &str;
    fn protocol(&self) -> &str;
    fn scheme(&self) -> &str;
    fn host(&self) -> &str;
    fn app_id(&self) -> Option<&str>;
    fn header(&self, name: &str) -> Option<&str>;
    fn content_length(&self) -> u64;
    /// Read up to `max` bytes of the request body.
    fn read_body(&mut self, max: usize) -> std::io::Result<Vec<u8>>;
}

/// The write side of a response, implemented by the host.
pub trait DavResponseSink {
    fn prepare_headers(&mut self, status: StatusCode);
    fn add_header(&mut self, name: &str, value: &str);
    fn add_content_type(&mut self, value: &str);
    fn add_content_length(&mut self, n: u64);
    fn add_last_modified(&mut self, t: SystemTime);
    fn write_body(&mut self, chunk: &[u8]) -> std::io::Result<()>;
}

/// `Depth` header values honored by PROPFIND/DELETE/LOCK/MOVE/COPY. This
/// crate does not distinguish `1` from `infinity`; both recurse fully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Zero,
    Infinity,
}

impl Depth {
    /// Parse a `Depth` header value. Absent or unrecognized values default
    /// to `Infinity`: anything but `0` recurses fully.
    pub fn parse(value: Option<&str>) -> Depth {
        match value {
            Some("0") => Depth::Zero,
            _ => Depth::Infinity,
        }
    }
}

/// `Overwrite` header: `F` forbids overwriting an existing destination;
/// anything else (including absence) permits it.
pub fn overwrite_allowed(value: Option<&str>) -> bool {
    !matches!(value, Some("F"))
}

/// Resolve the `Destination` header to a path-info string relative to this
/// server, stripping the `scheme://host` prefix (`skip = len(scheme) + 3 +
/// len(host)`, defaulting scheme to `"http"` when the request's own scheme
/// is empty).
pub fn strip_destination_prefix(destination: &str, scheme: &str, host: &str) -> Option<String> {
    let scheme = if scheme.is_empty() { "http" } else { scheme };
    let skip = scheme.len() + 3 + host.len();
    if destination.len() < skip {
        // Destination may be a bare path already; accept it as-is.
        if destination.starts_with('/') {
            return Some(destination.to_string());
        }
        return None;
    }
    let rest = &destination[skip..];
    if rest.starts_with('/') {
        Some(rest.to_string())
    } else if destination.starts_with('/') {
        Some(destination.to_string())
    } else {
        None
    }
}
