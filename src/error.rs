use quick_xml::Error as XMLError;
use std::path::PathBuf;
use std::{str::Utf8Error, string::FromUtf8Error};

/// Wrapper around `std::Result`
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug)]
pub enum Error {
    /// The input file could not be opened or read.
    Read { path: PathBuf, source: std::io::Error },
    /// The output file could not be written.
    Write { path: PathBuf, source: std::io::Error },
    /// Any other [`std::io`] related error.
    Io(std::io::Error),
    /// Decoding related error.
    /// Maybe the XML declaration has an encoding value that it doesn't recognize,
    /// or it doesn't match its actual encoding,
    CannotDecode,
    /// Assorted errors while parsing XML.
    MalformedXML(String),
    /// A `<method>`/`<transport>` candidate has no attribute that the patch needs.
    MissingAttribute { tag: String, attribute: String },
    /// Output path is the input path and in-place editing was not requested.
    WouldOverwrite(PathBuf),
    /// The container element cannot have a parent.
    ContainerCannotMove,
    /// The element already belongs to another parent.
    HasAParent,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Read { path, source } => {
                write!(f, "Cannot read {}: {}", path.display(), source)
            }
            Error::Write { path, source } => {
                write!(f, "Cannot write {}: {}", path.display(), source)
            }
            Error::Io(err) => write!(f, "IO Error: {}", err),
            Error::CannotDecode => write!(f, "Cannot decode XML"),
            Error::MalformedXML(err) => write!(f, "Malformed XML: {}", err),
            Error::MissingAttribute { tag, attribute } => write!(
                f,
                "<{}> element has no `{}` attribute",
                tag, attribute
            ),
            Error::WouldOverwrite(path) => write!(
                f,
                "Refusing to overwrite {} in place. Pass --in-place or choose another --outfile.",
                path.display()
            ),
            Error::ContainerCannotMove => write!(f, "Container element cannot move"),
            Error::HasAParent => write!(f, "Element already has a parent"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { source, .. } | Error::Write { source, .. } => Some(source),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<XMLError> for Error {
    fn from(err: XMLError) -> Error {
        match err {
            XMLError::EndEventMismatch { expected, found } if expected.is_empty() => {
                Error::MalformedXML(format!("Closing tag </{}> has no opening tag", found))
            }
            XMLError::EndEventMismatch { expected, found } => Error::MalformedXML(format!(
                "Closing tag mismatch. Expected {}, found {}",
                expected, found,
            )),
            XMLError::Io(err) => Error::Io(err),
            XMLError::Utf8(_) => Error::CannotDecode,
            err => Error::MalformedXML(err.to_string()),
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_: FromUtf8Error) -> Error {
        Error::CannotDecode
    }
}

impl From<Utf8Error> for Error {
    fn from(_: Utf8Error) -> Error {
        Error::CannotDecode
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
