//! The site served by the binary: bundled web resources and the vocabulary API.

use crate::http::serve::{Content, Resolve};
use std::{fs, io, path::Path};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/resources.rs"));
}

const API_PREFIX: &[u8] = b"/api/";
const VOCAB_VERSION: &[u8] = b"1";
const GZIP: &str = "content-encoding: gzip\r\n";

/// The vocabulary file, loaded once and served as-is.
///
/// The file is expected to be gzip-compressed already; it is sent with
/// `content-encoding: gzip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary(Box<[u8]>);

impl Vocabulary {
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        fs::read(path).map(|bytes| Self(bytes.into_boxed_slice()))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Vocabulary {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }
}

/// Routes request targets to the vocabulary API or to a bundled resource.
///
/// | Target          | Content                   | Type              |
/// |-----------------|---------------------------|-------------------|
/// | `/api/vocabVer` | `1`                       | `text/plain`      |
/// | `/api/vocab`    | the vocabulary file, gzip | `text/plain`      |
/// | any resource    | the resource, gzip        | by file extension |
#[derive(Debug)]
pub struct Catalog {
    vocab: Vocabulary,
    resources: &'static [(&'static str, &'static [u8])],
}

impl Catalog {
    /// A catalog over the resources compiled from `res/`.
    pub fn new(vocab: Vocabulary) -> Self {
        Self::with_resources(vocab, generated::RESOURCES)
    }

    /// `resources` must be sorted by name.
    pub fn with_resources(
        vocab: Vocabulary,
        resources: &'static [(&'static str, &'static [u8])],
    ) -> Self {
        debug_assert!(resources.windows(2).all(|pair| pair[0].0 < pair[1].0));
        Self { vocab, resources }
    }

    #[inline]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Names of the bundled resources, in sorted order.
    pub fn resource_names(&self) -> impl Iterator<Item = &'static str> {
        self.resources.iter().map(|&(name, _)| name)
    }

    fn api(&self, key: &[u8]) -> Option<Content<'_>> {
        match key {
            b"vocabVer" => Some(Content {
                body: VOCAB_VERSION,
                content_type: "text/plain",
                extra_header: "",
            }),
            b"vocab" => Some(Content {
                body: self.vocab.as_bytes(),
                content_type: "text/plain",
                extra_header: GZIP,
            }),
            _ => None,
        }
    }

    fn resource(&self, target: &[u8]) -> Option<Content<'_>> {
        let at = self
            .resources
            .binary_search_by(|(name, _)| name.as_bytes().cmp(target))
            .ok()?;

        Some(Content {
            body: self.resources[at].1,
            content_type: mime_type(target),
            extra_header: GZIP,
        })
    }
}

impl Resolve for Catalog {
    #[inline]
    fn resolve(&self, target: &[u8]) -> Option<Content<'_>> {
        match target.strip_prefix(API_PREFIX) {
            Some(key) => self.api(key),
            None => self.resource(target),
        }
    }
}

/// Media type of a bundled resource, from its extension.
pub fn mime_type(name: &[u8]) -> &'static str {
    if name.ends_with(b".js") {
        "text/javascript"
    } else if name.ends_with(b".css") {
        "text/css"
    } else {
        "text/html"
    }
}
