//! Content references handed to the install pipeline

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use url::Url;

/// Opens a byte stream for a reference that is not a plain file
pub type Opener = Box<dyn Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync>;

/// An opaque reference to a package artifact
///
/// References come from outside (file sharing, the command line) and are
/// untrusted until the registry has recognized the bytes behind them.
pub trait ContentReference: Send + Sync {
    /// The reference as given, for logging and error reports
    fn uri(&self) -> &str;

    /// Absolute filesystem path of the artifact, when it has one
    fn resolve_path(&self) -> Option<PathBuf>;

    /// Open the artifact for reading
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;
}

/// A reference parsed from a URI string
///
/// Plain paths and `file://` URIs address the filesystem directly. Any
/// other scheme is only readable through an opener supplied by the caller.
pub struct UriReference {
    uri: String,
    path: Option<PathBuf>,
    opener: Option<Opener>,
}

impl UriReference {
    pub fn parse(uri: &str) -> Self {
        let path = if has_scheme(uri) {
            file_url_path(uri)
        } else {
            Some(PathBuf::from(uri))
        };

        Self {
            uri: uri.to_string(),
            path,
            opener: None,
        }
    }

    /// Read through `opener` instead of the filesystem
    pub fn with_opener<F>(mut self, opener: F) -> Self
    where
        F: Fn() -> io::Result<Box<dyn Read + Send>> + Send + Sync + 'static,
    {
        self.opener = Some(Box::new(opener));
        self
    }

    /// The filesystem path named by the URI, if it names one
    pub fn local_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl std::fmt::Debug for UriReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UriReference")
            .field("uri", &self.uri)
            .field("path", &self.path)
            .field("opener", &self.opener.is_some())
            .finish()
    }
}

impl ContentReference for UriReference {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn resolve_path(&self) -> Option<PathBuf> {
        let path = self.path.as_ref()?;
        match path.canonicalize() {
            Ok(path) if path.is_file() => Some(path),
            Ok(path) => {
                tracing::debug!("{} is not a regular file", path.display());
                None
            }
            Err(e) => {
                tracing::debug!("Cannot resolve {}: {}", path.display(), e);
                None
            }
        }
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        if let Some(opener) = &self.opener {
            return opener();
        }

        match &self.path {
            Some(path) => Ok(Box::new(File::open(path)?)),
            None => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("no reader available for {}", self.uri),
            )),
        }
    }
}

/// Local path of a `file:` URL, percent-decoded. Only an empty or
/// `localhost` authority names this host.
fn file_url_path(uri: &str) -> Option<PathBuf> {
    let url = match Url::parse(uri) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Unparseable URI {}: {}", uri, e);
            return None;
        }
    };

    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}

/// `scheme://...` with an RFC 3986 scheme
fn has_scheme(uri: &str) -> bool {
    let Some((scheme, _)) = uri.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
