use std::error::Error;
use std::fmt;
use std::io::ErrorKind;

use http::StatusCode;

/// Everything that can go wrong while handling a WebDAV request.
#[derive(Debug)]
pub enum DavError {
    /// The resolved path does not exist and a resource was required to.
    NotFound,
    /// `resolve_prospective` failed: parent missing, or path too long.
    Conflict,
    /// Permission denied, unexpected I/O failure, or a required header is missing.
    Forbidden,
    /// Overwrite was refused (`Overwrite: F` on an existing destination).
    PreconditionFailed,
    /// MKCOL on a path that already exists.
    MethodNotAllowed,
    /// MKCOL carrying a request body.
    UnsupportedMediaType,
    /// A lock is held and the `If` header did not carry a matching token.
    Locked,
    /// No mountpoints are configured.
    ConfigError,
    /// Malformed XML body, or the wrong root element.
    XmlParse,
    Io(std::io::Error),
    XmlRead(xml::reader::Error),
    XmlWrite(xml::writer::Error),
}

pub type DavResult<T> = Result<T, DavError>;

impl fmt::Display for DavError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DavError::NotFound => write!(f, "not found"),
            DavError::Conflict => write!(f, "conflict"),
            DavError::Forbidden => write!(f, "forbidden"),
            DavError::PreconditionFailed => write!(f, "precondition failed"),
            DavError::MethodNotAllowed => write!(f, "method not allowed"),
            DavError::UnsupportedMediaType => write!(f, "unsupported media type"),
            DavError::Locked => write!(f, "locked"),
            DavError::ConfigError => write!(f, "no mountpoints configured"),
            DavError::XmlParse => write!(f, "XML parse error"),
            DavError::Io(e) => write!(f, "I/O error: {}", e),
            DavError::XmlRead(e) => write!(f, "XML read error: {}", e),
            DavError::XmlWrite(e) => write!(f, "XML write error: {}", e),
        }
    }
}

impl Error for DavError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DavError::Io(e) => Some(e),
            DavError::XmlRead(e) => Some(e),
            DavError::XmlWrite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DavError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            ErrorKind::NotFound => DavError::NotFound,
            ErrorKind::PermissionDenied => DavError::Forbidden,
            ErrorKind::AlreadyExists => DavError::Conflict,
            _ => DavError::Io(e),
        }
    }
}

impl From<xml::reader::Error> for DavError {
    fn from(e: xml::reader::Error) -> Self {
        DavError::XmlRead(e)
    }
}

impl From<xml::writer::Error> for DavError {
    fn from(e: xml::writer::Error) -> Self {
        DavError::XmlWrite(e)
    }
}

impl DavError {
    pub fn statuscode(&self) -> StatusCode {
        match self {
            DavError::NotFound => StatusCode::NOT_FOUND,
            DavError::Conflict => StatusCode::CONFLICT,
            DavError::Forbidden => StatusCode::FORBIDDEN,
            DavError::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            DavError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            DavError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DavError::Locked => StatusCode::LOCKED,
            DavError::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,
            DavError::XmlParse => StatusCode::BAD_REQUEST,
            DavError::Io(e) => ioerror_to_status(e),
            DavError::XmlRead(_) => StatusCode::BAD_REQUEST,
            DavError::XmlWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the response should carry `Connection: close`. Set for the
    /// malformed-body case: the connection state after a bad XML body is
    /// unreliable, so we answer 400 and ask the host to close rather than
    /// keep-alive.
    pub fn must_close(&self) -> bool {
        matches!(self, DavError::XmlParse | DavError::XmlRead(_))
    }
}

fn ioerror_to_status(e: &std::io::Error) -> StatusCode {
    match e.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::TimedOut => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::FORBIDDEN,
    }
}
