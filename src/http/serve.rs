//! Turns a parsed request into a complete response in the send buffer.

use crate::{
    buffer::Buffer,
    errors::Rejection,
    format::{Format, Now},
    http::{
        request::Message,
        types::{Method, StatusCode, Version},
    },
};
use memchr::memchr3_iter;

/// Content found for a request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Content<'a> {
    pub body: &'a [u8],
    /// Media type without parameters, e.g. `text/html`.
    pub content_type: &'a str,
    /// A complete header line ending in `\r\n`, or empty.
    pub extra_header: &'a str,
}

/// Looks up the content for a request target.
///
/// # Example
/// ```
/// use vocab_web::{Content, Resolve};
///
/// struct Hello;
///
/// impl Resolve for Hello {
///     fn resolve(&self, target: &[u8]) -> Option<Content<'_>> {
///         (target == b"/").then_some(Content {
///             body: b"hello",
///             content_type: "text/plain",
///             extra_header: "",
///         })
///     }
/// }
/// ```
pub trait Resolve: Send + Sync + 'static {
    fn resolve(&self, target: &[u8]) -> Option<Content<'_>>;
}

/// What [`serve`] answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    Content,
    NotFound,
    Rejected(Rejection),
}

impl Served {
    /// Rejections announce `connection: close`.
    #[inline]
    pub const fn closes_connection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    #[inline]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Content => StatusCode::Ok,
            Self::NotFound => StatusCode::NotFound,
            Self::Rejected(Rejection::BadRequest) => StatusCode::BadRequest,
            Self::Rejected(Rejection::VersionNotSupported) => StatusCode::HttpVersionNotSupported,
        }
    }
}

const NOT_FOUND_HEAD: &[u8] = b"<!DOCTYPE html><meta charset=utf-8><title>Error 404 (Not Found)</title>\
<p><b>404</b> Not Found.<p>The resource <code>";
const NOT_FOUND_TAIL: &[u8] = b"</code> was not found.";

/// How much of the target is echoed back in the not-found page.
const ECHOED_TARGET: usize = 100;

/// Writes the response to `request` into `out`, replacing its contents.
///
/// `keep_alive_secs` is advertised in the `keep-alive` header of
/// successful responses.
pub fn serve<R: Resolve + ?Sized>(
    request: &Message<'_>,
    resolver: &R,
    keep_alive_secs: u32,
    out: &mut Buffer,
) -> Served {
    let rejection = match (request.method(), request.version()) {
        (Method::Err, _) => Rejection::BadRequest,
        (_, Version::Err) => Rejection::VersionNotSupported,
        (Method::Get, _) => {
            let target = request.target();
            return match resolver.resolve(target) {
                Some(content) => {
                    write_content(&content, keep_alive_secs, out);
                    Served::Content
                }
                None => {
                    write_not_found(target, out);
                    Served::NotFound
                }
            };
        }
        _ => Rejection::BadRequest,
    };

    out.put(rejection.as_http());
    Served::Rejected(rejection)
}

#[inline]
fn write_content(content: &Content<'_>, keep_alive_secs: u32, out: &mut Buffer) {
    out.put((
        StatusCode::Ok.status_line(),
        b"connection: keep-alive\r\ncontent-type: ",
        content.content_type,
        b"; charset=UTF-8\r\ndate: ",
        Now,
        b"\r\ncontent-length: ",
        content.body.len(),
        b"\r\nkeep-alive: timeout=",
        keep_alive_secs,
        b"\r\n",
        content.extra_header,
        b"\r\n",
        content.body,
    ));
}

#[inline]
fn write_not_found(target: &[u8], out: &mut Buffer) {
    let echoed = Escaped(&target[..target.len().min(ECHOED_TARGET)]);
    let body_len = NOT_FOUND_HEAD.len() + echoed.escaped_len() + NOT_FOUND_TAIL.len();

    out.put((
        StatusCode::NotFound.status_line(),
        b"content-type: text/html; charset=UTF-8\r\ncontent-length: ",
        body_len,
        b"\r\ndate: ",
        Now,
        b"\r\n\r\n",
        NOT_FOUND_HEAD,
        echoed,
        NOT_FOUND_TAIL,
    ));
}

/// Bytes with `<`, `>` and `&` replaced by their HTML entities.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Escaped<'a>(pub(crate) &'a [u8]);

impl Escaped<'_> {
    #[inline]
    fn entity(byte: u8) -> &'static [u8] {
        match byte {
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            _ => b"&amp;",
        }
    }

    /// The exact rendered length.
    pub(crate) fn escaped_len(&self) -> usize {
        self.0.len()
            + memchr3_iter(b'<', b'>', b'&', self.0)
                .map(|pos| Self::entity(self.0[pos]).len() - 1)
                .sum::<usize>()
    }
}

impl Format for Escaped<'_> {
    #[inline]
    fn max_size(&self) -> usize {
        self.0.len() * 5
    }

    fn write_to(&self, dst: &mut [u8]) -> usize {
        let src = self.0;
        let (mut from, mut len) = (0, 0);

        for pos in memchr3_iter(b'<', b'>', b'&', src) {
            len += src[from..pos].write_to(&mut dst[len..]);
            len += Self::entity(src[pos]).write_to(&mut dst[len..]);
            from = pos + 1;
        }
        len + src[from..].write_to(&mut dst[len..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        http::{headers::HeaderStore, request::RequestHead},
        tools::*,
    };

    struct Table;

    impl Resolve for Table {
        fn resolve(&self, target: &[u8]) -> Option<Content<'_>> {
            match target {
                b"/a.js" => Some(Content {
                    body: b"x();",
                    content_type: "text/javascript",
                    extra_header: "content-encoding: gzip\r\n",
                }),
                b"/plain" => Some(Content {
                    body: b"",
                    content_type: "text/plain",
                    extra_header: "",
                }),
                _ => None,
            }
        }
    }

    fn respond(req: &str) -> (Served, String) {
        let mut bytes = req.as_bytes().to_vec();
        let mut store = HeaderStore::new();
        let message = RequestHead::new(&mut bytes).unwrap().parse(&mut store);

        let mut out = Buffer::with_capacity(64);
        let served = serve(&message, &Table, 5, &mut out);
        (served, str_op(out.as_slice()).to_string())
    }

    /// Replaces the 29-byte date after `date: ` with a fixed marker.
    fn mask_date(response: &str) -> String {
        let at = response.find("date: ").expect("date header") + 6;
        let date = &response[at..at + 29];
        assert!(date.ends_with(" GMT"), "{date}");
        format!("{}<date>{}", &response[..at], &response[at + 29..])
    }

    #[test]
    fn found() {
        let (served, response) = respond("GET /a.js HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(served, Served::Content);
        assert_eq!(
            mask_date(&response),
            "HTTP/1.1 200 OK\r\n\
             connection: keep-alive\r\n\
             content-type: text/javascript; charset=UTF-8\r\n\
             date: <date>\r\n\
             content-length: 4\r\n\
             keep-alive: timeout=5\r\n\
             content-encoding: gzip\r\n\
             \r\n\
             x();"
        );
    }

    #[test]
    fn found_without_extra_header() {
        let (served, response) = respond("GET /plain HTTP/1.0\r\n\r\n");
        assert_eq!(served, Served::Content);
        assert!(mask_date(&response).ends_with(
            "content-length: 0\r\nkeep-alive: timeout=5\r\n\r\n"
        ));
    }

    #[test]
    fn not_found() {
        let (served, response) = respond("GET /nope HTTP/1.1\r\n\r\n");
        let body = "<!DOCTYPE html><meta charset=utf-8><title>Error 404 (Not Found)</title>\
                    <p><b>404</b> Not Found.<p>The resource <code>/nope</code> was not found.";

        assert_eq!(served, Served::NotFound);
        assert_eq!(
            mask_date(&response),
            format!(
                "HTTP/1.1 404 Not Found\r\n\
                 content-type: text/html; charset=UTF-8\r\n\
                 content-length: {}\r\n\
                 date: <date>\r\n\
                 \r\n\
                 {body}",
                body.len()
            )
        );
    }

    #[test]
    fn not_found_echoes_target() {
        #[rustfmt::skip]
        let cases = [
            ("GET /missing HTTP/1.1\r\n\r\n", "<code>/missing</code>"),
            ("GET /<bad> HTTP/1.1\r\n\r\n",   "<code>/&lt;bad&gt;</code>"),
        ];

        for (req, echoed) in cases {
            let (served, response) = respond(req);
            assert_eq!(served, Served::NotFound);
            assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
            assert!(response.contains(echoed), "{response}");
        }
    }

    #[test]
    fn not_found_escapes_and_truncates() {
        let long = format!("/<b>&{}", "x".repeat(200));
        let (_, response) = respond(&format!("GET {long} HTTP/1.1\r\n\r\n"));

        let echoed = format!("/&lt;b&gt;&amp;{}", "x".repeat(100 - 5));
        assert!(response.contains(&format!("<code>{echoed}</code>")), "{response}");

        let (head, body) = response.split_once("\r\n\r\n").unwrap();
        assert!(head.contains(&format!("content-length: {}\r\n", body.len())));
    }

    #[test]
    fn rejections() {
        #[rustfmt::skip]
        let cases = [
            ("FOO / HTTP/1.1\r\n\r\n", Rejection::BadRequest),
            ("GET / HTTP/2.0\r\n\r\n", Rejection::VersionNotSupported),
            ("GET / HTTP/0.9\r\n\r\n", Rejection::VersionNotSupported),
            ("FOO / HTTP/2.0\r\n\r\n", Rejection::BadRequest),
            ("POST /a.js HTTP/1.1\r\n\r\n", Rejection::BadRequest),
            ("HEAD /a.js HTTP/1.1\r\n\r\n", Rejection::BadRequest),
            ("DELETE / HTTP/1.0\r\n\r\n", Rejection::BadRequest),
        ];

        for (req, rejection) in cases {
            let (served, response) = respond(req);
            assert_eq!(served, Served::Rejected(rejection));
            assert!(served.closes_connection());
            assert_eq!(response.as_bytes(), rejection.as_http());
        }
    }

    #[test]
    fn status_of_outcome() {
        assert_eq!(Served::Content.status(), StatusCode::Ok);
        assert_eq!(Served::NotFound.status(), StatusCode::NotFound);
        assert_eq!(
            Served::Rejected(Rejection::VersionNotSupported).status(),
            StatusCode::HttpVersionNotSupported
        );
        assert!(!Served::NotFound.closes_connection());
    }

    #[test]
    fn escaping() {
        #[rustfmt::skip]
        let cases: [(&[u8], &str); 5] = [
            (b"plain", "plain"),
            (b"<>&", "&lt;&gt;&amp;"),
            (b"a<b>c&d", "a&lt;b&gt;c&amp;d"),
            (b"&&", "&amp;&amp;"),
            (b"", ""),
        ];

        for (src, expected) in cases {
            let escaped = Escaped(src);
            let mut dst = vec![0u8; escaped.max_size()];
            let len = escaped.write_to(&mut dst);

            assert_eq!(str_op(&dst[..len]), expected);
            assert_eq!(escaped.escaped_len(), expected.len());
        }
    }
}
