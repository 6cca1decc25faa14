//! vocab_web - Minimal-latency, zero-allocation HTTP/1.x server for a vocabulary site
//!
//! Serves a small, fixed set of compressed web resources and a vocabulary
//! file to browsers. Every request is parsed in place and every response is
//! serialized into a reused buffer, so a warmed-up server performs no heap
//! allocation per request.
//!
//! # Protocol Support
//!
//! - **HTTP/1.1** and **HTTP/1.0**: `GET` requests, no request bodies
//! - Everything else is answered with `400 Bad Request` or
//!   `505 HTTP Version Not Supported` and the connection is closed
//!
//! # Performance Characteristics
//!
//! - **In-place parsing** - header names are lowercased in the receive buffer,
//!   all request data is referenced by [`Span`]s
//! - **Typed formatting** - responses are built from tuples of [`Format`](format::Format)
//!   values written straight into a [`Buffer`]
//! - **Pooled connection slots** - receive buffer, send buffer and
//!   [`HeaderStore`] are recycled across connections
//!
//! # Examples
//!
//! Serving the bundled site:
//! ```no_run
//! use vocab_web::{Catalog, Server, Vocabulary};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let vocab = Vocabulary::load("vocab.gz").unwrap();
//!
//!     Server::builder()
//!         .bind(([0, 0, 0, 0], 8080).into())
//!         .unwrap()
//!         .resolver(Catalog::new(vocab))
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```
//! Serving one request without a socket:
//! ```
//! use vocab_web::{serve, Buffer, Catalog, HeaderStore, RequestHead, Served, Vocabulary};
//!
//! let catalog = Catalog::new(Vocabulary::from(b"...".to_vec()));
//! let mut bytes = b"GET /api/vocabVer HTTP/1.1\r\nHost: example\r\n\r\n".to_vec();
//! let mut headers = HeaderStore::new();
//! let mut out = Buffer::new();
//!
//! let request = RequestHead::new(&mut bytes).unwrap().parse(&mut headers);
//! assert_eq!(serve(&request, &catalog, 5, &mut out), Served::Content);
//! assert!(out.as_slice().ends_with(b"\r\n\r\n1"));
//! ```

pub mod format {
    //! Typed serialization into caller-provided memory.
    //!
    //! Every [`Format`] value reports an upper bound of its rendered size and
    //! then writes itself; [`Buffer::put`](crate::Buffer::put) uses the
    //! bound to grow once and never checks lengths while writing.
    pub(crate) mod date;
    pub(crate) mod int;
    pub(crate) mod write;

    pub use self::{
        date::{HttpDate, Now},
        int::Padded,
        write::Format,
    };
}
pub(crate) mod http {
    pub(crate) mod headers;
    pub(crate) mod request;
    pub(crate) mod serve;
    pub(crate) mod types;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod listener;
}
pub(crate) mod buffer;
pub(crate) mod catalog;
pub mod config;
pub(crate) mod errors;
pub mod limits;
pub mod logging;

pub use crate::{
    buffer::Buffer,
    catalog::{mime_type, Catalog, Vocabulary},
    config::Config,
    errors::{Rejection, StartupError},
    http::{
        headers::{HeaderStore, Headers},
        request::{Message, RequestHead, StartLine},
        serve::{serve, Content, Resolve, Served},
        types::{Method, Span, StatusCode, Version},
    },
    server::listener::{Server, ServerBuilder},
};
