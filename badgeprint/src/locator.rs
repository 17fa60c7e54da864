//!
//! Document locators
//!
use std::{fmt, path::PathBuf, str::FromStr};

use enum_as_inner::EnumAsInner;
use http::Uri;

use crate::error::PrintError;

const FILE_SCHEME: &str = "file://";

/// Where a document to print lives.
///
/// The variant is chosen from the scheme only: `file://` for local files,
/// `http://` or `https://` for remote documents.
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum DocumentLocator {
    /// Local file path
    Local(PathBuf),
    /// Remote document URL
    Remote(Uri),
}

impl DocumentLocator {
    /// Create a locator for a local file
    pub fn local<P: Into<PathBuf>>(path: P) -> Self {
        DocumentLocator::Local(path.into())
    }

    /// Create a locator for a remote document
    pub fn remote(uri: Uri) -> Self {
        DocumentLocator::Remote(uri)
    }
}

impl FromStr for DocumentLocator {
    type Err = PrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix(FILE_SCHEME) {
            if path.is_empty() {
                return Err(PrintError::InvalidLocator(s.to_owned()));
            }
            return Ok(DocumentLocator::Local(PathBuf::from(path)));
        }

        let uri: Uri = s.parse()?;
        match uri.scheme_str() {
            Some("http") | Some("https") if uri.authority().is_some() => Ok(DocumentLocator::Remote(uri)),
            _ => Err(PrintError::InvalidLocator(s.to_owned())),
        }
    }
}

impl fmt::Display for DocumentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentLocator::Local(path) => write!(f, "{FILE_SCHEME}{}", path.display()),
            DocumentLocator::Remote(uri) => write!(f, "{uri}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_locator() {
        let locator: DocumentLocator = "file:///missing.pdf".parse().unwrap();
        assert_eq!(locator.as_local(), Some(&PathBuf::from("/missing.pdf")));
        assert_eq!(locator.to_string(), "file:///missing.pdf");
    }

    #[test]
    fn test_remote_locator() {
        let locator: DocumentLocator = "https://example.com/badge.pdf".parse().unwrap();
        assert!(locator.is_remote());
        assert_eq!(locator.as_remote().unwrap().host(), Some("example.com"));
    }

    #[test]
    fn test_scheme_is_required() {
        assert!(matches!(
            "/tmp/badge.pdf".parse::<DocumentLocator>(),
            Err(PrintError::InvalidLocator(_))
        ));
        assert!(matches!(
            "ftp://example.com/badge.pdf".parse::<DocumentLocator>(),
            Err(PrintError::InvalidLocator(_))
        ));
        assert!(matches!(
            "file://".parse::<DocumentLocator>(),
            Err(PrintError::InvalidLocator(_))
        ));
    }
}
