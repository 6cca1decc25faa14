use crate::http::types::Span;

/// Parsed header fields of one request, kept as spans into the request bytes.
///
/// Entries are ordered by key. A new entry goes in front of the first
/// entry whose key is greater than or equal to its own, so among equal
/// keys the most recently inserted comes first and wins lookups.
///
/// The store is reused across requests: [`clear`](HeaderStore::clear)
/// keeps the allocation, and growth doubles the capacity.
#[derive(Debug, Clone)]
pub struct HeaderStore {
    entries: Vec<(Span, Span)>,
}

impl Default for HeaderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderStore {
    pub const DEFAULT_CAPACITY: usize = 64;

    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Inserts a field whose spans point into `src`.
    pub(crate) fn insert(&mut self, src: &[u8], key: Span, value: Span) {
        if self.entries.len() == self.entries.capacity() {
            self.entries.reserve_exact(self.entries.capacity().max(1));
        }

        let new_key = key.resolve(src);
        let at = self
            .entries
            .iter()
            .position(|(existing, _)| existing.resolve(src) >= new_key)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, (key, value));
    }

    /// Pairs the store with the bytes its spans point into.
    #[inline(always)]
    pub fn view<'a>(&'a self, src: &'a [u8]) -> Headers<'a> {
        Headers { src, store: self }
    }
}

/// Read access to a request's header fields.
#[derive(Debug, Clone, Copy)]
pub struct Headers<'a> {
    src: &'a [u8],
    store: &'a HeaderStore,
}

impl<'a> Headers<'a> {
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns the value of the header `name`, compared case-insensitively.
    ///
    /// When a field is repeated the last one sent is returned.
    #[inline]
    pub fn get(&self, name: &[u8]) -> Option<&'a [u8]> {
        let (src, store) = (self.src, self.store);
        store
            .entries
            .iter()
            .find(|(key, _)| key.resolve(src).eq_ignore_ascii_case(name))
            .map(|(_, value)| value.resolve(src))
    }

    #[inline]
    pub fn get_or(&self, name: &[u8], default: &'a [u8]) -> &'a [u8] {
        self.get(name).unwrap_or(default)
    }

    /// Like [`get`](Headers::get), but only for values that are valid UTF-8.
    #[inline]
    pub fn get_str(&self, name: &[u8]) -> Option<&'a str> {
        simdutf8::basic::from_utf8(self.get(name)?).ok()
    }

    /// Iterates over `(name, value)` pairs in key order. Names are lowercase.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        let (src, store) = (self.src, self.store);
        store
            .entries
            .iter()
            .map(move |(key, value)| (key.resolve(src), value.resolve(src)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::*;

    fn store_from(src: &[u8], fields: &[(usize, usize, usize, usize)]) -> HeaderStore {
        let mut store = HeaderStore::with_capacity(2);
        for &(ks, ke, vs, ve) in fields {
            store.insert(src, Span::new(ks, ke), Span::new(vs, ve));
        }
        store
    }

    #[test]
    fn sorted_insert() {
        //                0123456789012345678
        let src: &[u8] = b"host|x|accept|y|age";
        let store = store_from(src, &[(0, 4, 5, 6), (7, 13, 14, 15), (16, 19, 5, 6)]);
        let headers = store.view(src);

        let keys: Vec<&str> = headers.iter().map(|(k, _)| str_op(k)).collect();
        assert_eq!(keys, ["accept", "age", "host"]);
        assert_eq!(str(headers.get(b"Accept")), Some("y"));
        assert_eq!(str(headers.get(b"HOST")), Some("x"));
        assert_eq!(headers.get(b"missing"), None);
        assert_eq!(headers.get_or(b"missing", b"none"), b"none");
    }

    #[test]
    fn duplicates_newest_first() {
        let src: &[u8] = b"a:1|a:2|a:3";
        let store = store_from(src, &[(0, 1, 2, 3), (4, 5, 6, 7), (8, 9, 10, 11)]);
        let headers = store.view(src);

        assert_eq!(str(headers.get(b"A")), Some("3"));
        let values: Vec<&str> = headers.iter().map(|(_, v)| str_op(v)).collect();
        assert_eq!(values, ["3", "2", "1"]);
    }

    #[test]
    fn doubling_growth() {
        let src: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
        let mut store = HeaderStore::with_capacity(4);
        for i in 0..26 {
            store.insert(src, Span::new(25 - i, 26 - i), Span::new(i, i + 1));
        }

        assert_eq!(store.len(), 26);
        assert!(store.capacity() >= 26);
        let keys: Vec<u8> = store.view(src).iter().map(|(k, _)| k[0]).collect();
        assert_eq!(keys, src);

        let capacity = store.capacity();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.capacity(), capacity);
    }

    #[test]
    fn utf8_values() {
        let src: &[u8] = b"ok|caf\xC3\xA9|bad|\xFF";
        let store = store_from(src, &[(0, 2, 3, 8), (9, 12, 13, 14)]);
        let headers = store.view(src);

        assert_eq!(headers.get_str(b"ok"), Some("café"));
        assert_eq!(headers.get_str(b"bad"), None);
        assert_eq!(headers.get(b"bad"), Some(&b"\xFF"[..]));
    }
}
