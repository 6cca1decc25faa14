use std::{io, net::SocketAddr, path::PathBuf};
use thiserror::Error;

macro_rules! http_rejections {
    ($($(#[$docs:meta])* $name:ident: $status_code:literal;)*) => {
        /// Requests answered with a fixed, body-less response before any
        /// content lookup.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Rejection { $(
            $(#[$docs])*
            $name,
        )* }

        impl Rejection {
            /// The complete response, status line to blank line.
            #[inline]
            pub const fn as_http(&self) -> &'static [u8] {
                match self { $(
                    Self::$name => concat!(
                        "HTTP/1.1 ", $status_code, "\r\n",
                        "connection: close\r\n",
                        "content-length: 0\r\n\r\n",
                    ),
                )* }.as_bytes()
            }
        }
    };
}

http_rejections! {
    /// Unknown method, or a method other than `GET`.
    BadRequest: "400 Bad Request";
    /// Anything but `HTTP/1.0` or `HTTP/1.1` in the version position.
    VersionNotSupported: "505 HTTP Version Not Supported";
}

/// Why a connection ended early.
#[derive(Debug, Error)]
pub(crate) enum ConnError {
    #[error("request head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },
    #[error("write timed out")]
    WriteTimeout,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failures that stop the process before it starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("usage: {program} <vocab-path> [<port-num>] [<log-dir>]")]
    Usage { program: String },

    #[error("couldn't open vocab file \"{}\": {source}", .path.display())]
    Vocabulary { path: PathBuf, source: io::Error },

    #[error("couldn't parse port number \"{0}\"")]
    InvalidPort(String),

    #[error("couldn't open log destination \"{}\": {source}", .path.display())]
    LogDestination { path: PathBuf, source: io::Error },

    #[error("couldn't install log subscriber: {0}")]
    Subscriber(String),

    #[error("couldn't listen on {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::*;

    #[test]
    fn rejections() {
        #[rustfmt::skip]
        let cases = [
            (Rejection::BadRequest,
                "HTTP/1.1 400 Bad Request\r\nconnection: close\r\ncontent-length: 0\r\n\r\n"),
            (Rejection::VersionNotSupported,
                "HTTP/1.1 505 HTTP Version Not Supported\r\nconnection: close\r\ncontent-length: 0\r\n\r\n"),
        ];

        for (rejection, http) in cases {
            assert_eq!(str_op(rejection.as_http()), http);
        }
    }

    #[test]
    fn startup_messages() {
        let not_found = || io::Error::new(io::ErrorKind::NotFound, "missing");

        #[rustfmt::skip]
        let cases = [
            (StartupError::Usage { program: "vocab_web".into() },
                "usage: vocab_web <vocab-path> [<port-num>] [<log-dir>]"),
            (StartupError::Vocabulary { path: "/tmp/v.txt".into(), source: not_found() },
                "couldn't open vocab file \"/tmp/v.txt\": missing"),
            (StartupError::InvalidPort("eighty".into()),
                "couldn't parse port number \"eighty\""),
            (StartupError::LogDestination { path: "/nope".into(), source: not_found() },
                "couldn't open log destination \"/nope\": missing"),
            (StartupError::Bind { addr: ([0, 0, 0, 0], 80).into(), source: not_found() },
                "couldn't listen on 0.0.0.0:80: missing"),
            (StartupError::from(not_found()), "missing"),
        ];

        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn conn_errors() {
        assert_eq!(
            ConnError::HeadTooLarge { limit: 65536 }.to_string(),
            "request head exceeds 65536 bytes"
        );
        let err = ConnError::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
        assert!(matches!(err, ConnError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }
}
