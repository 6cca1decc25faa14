use crate::http::{
    headers::{HeaderStore, Headers},
    types::{self, Method, Span, Version},
};
use memchr::memchr;
use std::fmt;

/// The bytes of one request head, ending with the blank line.
///
/// The parser writes sentinels one and two bytes past the last header
/// line, which are the `\n` and `\r` of the terminating `\r\n\r\n`; they
/// are restored before parsing returns. Construction checks the ending,
/// so the parser itself needs no bounds tests.
///
/// # Input
///
/// ```text
/// METHOD SP target SP HTTP/1.x CRLF (name ":" OWS value CRLF)* CRLF
/// ```
///
/// Anything that does not fit this shape still parses: an unknown method
/// or version is reported as [`Method::Err`] or [`Version::Err`], and a
/// header line without a colon becomes one last field whose name runs
/// into the terminator.
#[derive(Debug)]
pub struct RequestHead<'a> {
    bytes: &'a mut [u8],
}

impl<'a> RequestHead<'a> {
    pub const DELIMITER: &'static [u8; 4] = b"\r\n\r\n";

    /// Returns `None` unless `bytes` ends with `\r\n\r\n`.
    #[inline]
    pub fn new(bytes: &'a mut [u8]) -> Option<Self> {
        bytes
            .ends_with(Self::DELIMITER)
            .then_some(Self { bytes })
    }

    /// Parses the head in place, lowercasing header names, and fills `headers`.
    pub fn parse(self, headers: &'a mut HeaderStore) -> Message<'a> {
        let buf = self.bytes;
        let last = buf.len() - Self::DELIMITER.len();
        headers.clear();

        let line_end = memchr(b'\r', &buf[..last]).unwrap_or(last);
        let start = parse_start_line(buf, line_end);
        parse_headers(buf, line_end, last, headers);

        let src: &'a [u8] = buf;
        let body = Span::new(src.len(), src.len());
        Message {
            src,
            start,
            headers: headers.view(src),
            body,
        }
    }
}

#[inline(always)]
fn skip_blanks(buf: &[u8], mut pos: usize) -> usize {
    while matches!(buf[pos], b' ' | b'\t') {
        pos += 1;
    }
    pos
}

/// `buf[line_end]` is the `\r` closing the start line; it bounds every scan.
#[inline]
fn parse_start_line(buf: &mut [u8], line_end: usize) -> StartLine {
    let (method, method_len) = Method::from_word(types::load_word(buf));
    let target_start = skip_blanks(buf, method_len);

    buf[line_end] = b' ';
    let mut target_end = target_start;
    while !matches!(buf[target_end], b' ' | b'\t') {
        target_end += 1;
    }
    buf[line_end] = b'\r';

    let version_start = skip_blanks(buf, target_end);
    let version = if version_start + 8 == line_end {
        Version::from_word(types::load_word(&buf[version_start..line_end]))
    } else {
        Version::Err
    };

    StartLine {
        method,
        target: Span::new(target_start, target_end),
        version,
    }
}

/// `buf[last..last + 4]` is the final `\r\n\r\n`.
#[inline]
fn parse_headers(buf: &mut [u8], line_end: usize, last: usize, headers: &mut HeaderStore) {
    buf[last + 1] = b':';

    let mut cr = line_end;
    while cr < last {
        let name_start = cr + 2;
        let mut colon = name_start;
        while buf[colon] != b':' {
            buf[colon] = types::to_lower(buf[colon]);
            colon += 1;
        }

        let value_start = skip_blanks(buf, colon + 1);
        let value_end = memchr(b'\r', &buf[value_start..])
            .map_or(buf.len(), |offset| value_start + offset);

        headers.insert(
            buf,
            Span::new(name_start, colon),
            Span::new(value_start, value_end),
        );
        cr = value_end;
    }

    buf[last + 1] = b'\n';
}

/// Method, target and version of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartLine {
    pub method: Method,
    pub target: Span,
    pub version: Version,
}

/// A parsed request, borrowing the bytes it was parsed from.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    src: &'a [u8],
    start: StartLine,
    headers: Headers<'a>,
    body: Span,
}

impl<'a> Message<'a> {
    #[inline(always)]
    pub fn start_line(&self) -> StartLine {
        self.start
    }

    #[inline(always)]
    pub fn method(&self) -> Method {
        self.start.method
    }

    #[inline(always)]
    pub fn version(&self) -> Version {
        self.start.version
    }

    /// The raw request target, e.g. `/api/vocab`.
    #[inline(always)]
    pub fn target(&self) -> &'a [u8] {
        self.start.target.resolve(self.src)
    }

    #[inline(always)]
    pub fn headers(&self) -> Headers<'a> {
        self.headers
    }

    #[inline(always)]
    pub fn header(&self, name: &[u8]) -> Option<&'a [u8]> {
        self.headers.get(name)
    }

    /// Always empty: request bodies are not read.
    #[inline(always)]
    pub fn body(&self) -> &'a [u8] {
        self.body.resolve(self.src)
    }
}

impl fmt::Display for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = simdutf8::basic::from_utf8(self.target()).unwrap_or("<non-utf8>");
        write!(
            f,
            "{} {} {}",
            self.method().as_str(),
            target,
            self.version().as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::*;

    macro_rules! parse_request {
        ($cases:expr) => {
            for (req, (method, target, version, fields)) in $cases {
                let mut bytes = req.as_bytes().to_vec();
                let mut store = HeaderStore::new();
                let message = RequestHead::new(&mut bytes)
                    .expect("test request ends with a blank line")
                    .parse(&mut store);

                assert_eq!(message.method(), method, "{req:?}");
                assert_eq!(str_op(message.target()), target, "{req:?}");
                assert_eq!(message.version(), version, "{req:?}");
                assert!(message.body().is_empty());

                let got: Vec<(&str, &str)> = message
                    .headers()
                    .iter()
                    .map(|(k, v)| (str_op(k), str_op(v)))
                    .collect();
                let expected: Vec<(&str, &str)> = fields.to_vec();
                assert_eq!(got, expected, "{req:?}");
            }
        };
    }

    #[test]
    fn start_line() {
        #[rustfmt::skip]
        let cases: [(&str, (Method, &str, Version, &[(&str, &str)])); 13] = [
            ("GET / HTTP/1.1\r\n\r\n", (Method::Get, "/", Version::Http11, &[])),
            ("GET /index.js HTTP/1.0\r\n\r\n", (Method::Get, "/index.js", Version::Http10, &[])),
            ("HEAD /a HTTP/1.1\r\n\r\n", (Method::Head, "/a", Version::Http11, &[])),
            ("DELETE /a HTTP/1.1\r\n\r\n", (Method::Delete, "/a", Version::Http11, &[])),
            ("OPTIONS * HTTP/1.1\r\n\r\n", (Method::Options, "*", Version::Http11, &[])),
            ("GET  \t/spaced\t  HTTP/1.1\r\n\r\n", (Method::Get, "/spaced", Version::Http11, &[])),
            ("FOO /x HTTP/1.1\r\n\r\n", (Method::Err, "FOO", Version::Err, &[])),
            ("GET /x HTTP/2.0\r\n\r\n", (Method::Get, "/x", Version::Err, &[])),
            ("GET /x HTTP/1.1 \r\n\r\n", (Method::Get, "/x", Version::Err, &[])),
            ("GET /x HTTP/1.10\r\n\r\n", (Method::Get, "/x", Version::Err, &[])),
            ("GET /x\r\n\r\n", (Method::Get, "/x", Version::Err, &[])),
            ("GET\r\n\r\n", (Method::Get, "", Version::Err, &[])),
            ("\r\n\r\n", (Method::Err, "", Version::Err, &[])),
        ];

        parse_request!(cases);
    }

    #[test]
    fn headers() {
        #[rustfmt::skip]
        let cases: [(&str, (Method, &str, Version, &[(&str, &str)])); 6] = [
            (
                "GET / HTTP/1.1\r\nHost: example.com\r\n\r\n",
                (Method::Get, "/", Version::Http11, &[("host", "example.com")]),
            ),
            (
                "GET / HTTP/1.1\r\nUser-Agent: curl\r\nACCEPT:\t*/*\r\nHost: h\r\n\r\n",
                (Method::Get, "/", Version::Http11,
                    &[("accept", "*/*"), ("host", "h"), ("user-agent", "curl")]),
            ),
            (
                "GET / HTTP/1.1\r\nA: 1\r\nA: 2\r\n\r\n",
                (Method::Get, "/", Version::Http11, &[("a", "2"), ("a", "1")]),
            ),
            (
                "GET / HTTP/1.1\r\nX-Empty:\r\nX-Value:   padded  \r\n\r\n",
                (Method::Get, "/", Version::Http11, &[("x-empty", ""), ("x-value", "padded  ")]),
            ),
            (
                "GET / HTTP/1.1\r\nNoColon\r\n\r\n",
                (Method::Get, "/", Version::Http11, &[("nocolon\r", "")]),
            ),
            (
                "GET / HTTP/1.1\r\nBroken\r\nHost: h\r\n\r\n",
                (Method::Get, "/", Version::Http11, &[("broken\r\nhost", "h")]),
            ),
        ];

        parse_request!(cases);
    }

    #[test]
    fn case_insensitive_lookup() {
        let mut bytes = b"GET / HTTP/1.1\r\nX-Custom-Thing: v\r\nA: 1\r\nA: 2\r\n\r\n".to_vec();
        let mut store = HeaderStore::new();
        let message = RequestHead::new(&mut bytes).unwrap().parse(&mut store);

        for name in ["x-custom-thing", "X-CUSTOM-THING", "X-Custom-Thing", "x-CuStOm-tHiNg"] {
            assert_eq!(str(message.header(name.as_bytes())), Some("v"));
        }
        assert_eq!(str(message.header(b"A")), Some("2"));
        assert_eq!(message.headers().get_or(b"missing", b"-"), b"-");
    }

    #[test]
    fn start_line_spans() {
        let mut bytes = b"GET /api/vocab HTTP/1.0\r\nHost: h\r\n\r\n".to_vec();
        let mut store = HeaderStore::new();
        let message = RequestHead::new(&mut bytes).unwrap().parse(&mut store);

        let start = message.start_line();
        assert!(message.body().is_empty());
        assert_eq!(
            start,
            StartLine {
                method: Method::Get,
                target: Span::new(4, 14),
                version: Version::Http10,
            }
        );
        assert_eq!(start.target.resolve(&bytes), b"/api/vocab");
    }

    #[test]
    fn sentinels_restored() {
        let original = b"GET /path HTTP/1.1\r\nHost: h\r\nBad\r\n\r\n".to_vec();
        let mut bytes = original.clone();
        let mut store = HeaderStore::new();
        RequestHead::new(&mut bytes).unwrap().parse(&mut store);

        let lowered = b"GET /path HTTP/1.1\r\nhost: h\r\nbad\r\n\r\n";
        assert_eq!(bytes, lowered);
        assert_eq!(bytes.len(), original.len());
    }

    #[test]
    fn store_reused() {
        let mut store = HeaderStore::new();

        let mut first = b"GET / HTTP/1.1\r\nA: 1\r\nB: 2\r\n\r\n".to_vec();
        assert_eq!(RequestHead::new(&mut first).unwrap().parse(&mut store).headers().len(), 2);

        let mut second = b"GET / HTTP/1.1\r\nC: 3\r\n\r\n".to_vec();
        let message = RequestHead::new(&mut second).unwrap().parse(&mut store);
        assert_eq!(message.headers().len(), 1);
        assert_eq!(message.header(b"a"), None);
    }

    #[test]
    fn requires_delimiter() {
        #[rustfmt::skip]
        let cases: [(&[u8], bool); 5] = [
            (b"GET / HTTP/1.1\r\n\r\n", true), (b"\r\n\r\n", true),
            (b"GET / HTTP/1.1\r\n", false),    (b"GET / HTTP/1.1\n\n", false),
            (b"", false),
        ];

        for (src, valid) in cases {
            let mut bytes = src.to_vec();
            assert_eq!(RequestHead::new(&mut bytes).is_some(), valid);
        }
    }

    #[test]
    fn display() {
        let mut bytes = b"GET /caf\xC3\xA9 HTTP/1.1\r\n\r\n".to_vec();
        let mut store = HeaderStore::new();
        let message = RequestHead::new(&mut bytes).unwrap().parse(&mut store);
        assert_eq!(message.to_string(), "GET /café HTTP/1.1");

        let mut bytes = b"FOO\xFF / HTTP/9\r\n\r\n".to_vec();
        let message = RequestHead::new(&mut bytes).unwrap().parse(&mut store);
        assert_eq!(message.to_string(), "<invalid> <non-utf8> <invalid>");
    }
}
