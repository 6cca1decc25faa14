use std::{borrow::Cow, rc::Rc, sync::Arc};

/// A value that renders itself into a byte slice in one pass.
///
/// Rendering is split in two steps so a whole response can be assembled
/// without reallocating: [`max_size`](Format::max_size) gives a cheap upper
/// bound, the caller makes sure that much room is available, and
/// [`write_to`](Format::write_to) then writes the exact bytes.
///
/// Tuples of up to 16 `Format` values are themselves `Format`, written
/// left to right, which is how responses are described:
/// ```
/// use vocab_web::{format::Format, Buffer};
///
/// let mut out = Buffer::new();
/// out.put((b"content-length: ", 1024u32, "\r\n"));
/// assert_eq!(out.as_slice(), b"content-length: 1024\r\n");
/// ```
///
/// # Example
/// ```
/// use vocab_web::format::Format;
///
/// struct Flag(bool);
///
/// impl Format for Flag {
///     fn max_size(&self) -> usize {
///         5
///     }
///
///     fn write_to(&self, dst: &mut [u8]) -> usize {
///         let text: &[u8] = if self.0 { b"true" } else { b"false" };
///         dst[..text.len()].copy_from_slice(text);
///         text.len()
///     }
/// }
/// ```
pub trait Format {
    /// Upper bound on the number of bytes [`write_to`](Format::write_to) produces.
    fn max_size(&self) -> usize;

    /// Writes the value at the start of `dst` and returns the exact length written.
    ///
    /// `dst` holds at least [`max_size`](Format::max_size) bytes.
    fn write_to(&self, dst: &mut [u8]) -> usize;
}

#[inline(always)]
pub(crate) fn write_bytes(value: &[u8], dst: &mut [u8]) -> usize {
    dst[..value.len()].copy_from_slice(value);
    value.len()
}

#[inline(always)]
fn str_bytes(value: &str) -> &[u8] {
    value.as_bytes()
}

#[inline(always)]
fn slice_bytes(value: &[u8]) -> &[u8] {
    value
}

macro_rules! impl_format_bytes {
    ($as_bytes:ident => $($t:ty),*) => {
        $(impl Format for $t {
            #[inline(always)]
            fn max_size(&self) -> usize {
                $as_bytes(self).len()
            }

            #[inline(always)]
            fn write_to(&self, dst: &mut [u8]) -> usize {
                write_bytes($as_bytes(self), dst)
            }
        })*
    };
}

impl<T: Format + ?Sized> Format for &T {
    #[inline(always)]
    fn max_size(&self) -> usize {
        T::max_size(*self)
    }

    #[inline(always)]
    fn write_to(&self, dst: &mut [u8]) -> usize {
        T::write_to(*self, dst)
    }
}

impl_format_bytes! { str_bytes => str, String, Box<str>, Cow<'_, str>, Arc<str>, Rc<str> }
impl_format_bytes! { slice_bytes => [u8], Vec<u8>, Box<[u8]>, Cow<'_, [u8]>, Arc<[u8]>, Rc<[u8]> }

impl<const N: usize> Format for [u8; N] {
    #[inline(always)]
    fn max_size(&self) -> usize {
        N
    }

    #[inline(always)]
    fn write_to(&self, dst: &mut [u8]) -> usize {
        write_bytes(self, dst)
    }
}

impl Format for () {
    #[inline(always)]
    fn max_size(&self) -> usize {
        0
    }

    #[inline(always)]
    fn write_to(&self, _: &mut [u8]) -> usize {
        0
    }
}

macro_rules! impl_format_tuple {
    ($($name:ident)+) => {
        impl<$($name: Format),+> Format for ($($name,)+) {
            #[inline(always)]
            #[allow(non_snake_case)]
            fn max_size(&self) -> usize {
                let ($($name,)+) = self;
                0 $(+ $name.max_size())+
            }

            #[inline(always)]
            #[allow(non_snake_case)]
            fn write_to(&self, dst: &mut [u8]) -> usize {
                let ($($name,)+) = self;
                let mut len = 0;
                $(len += $name.write_to(&mut dst[len..]);)+
                len
            }
        }
    };
}

impl_format_tuple! { A }
impl_format_tuple! { A B }
impl_format_tuple! { A B C }
impl_format_tuple! { A B C D }
impl_format_tuple! { A B C D E }
impl_format_tuple! { A B C D E F }
impl_format_tuple! { A B C D E F G }
impl_format_tuple! { A B C D E F G H }
impl_format_tuple! { A B C D E F G H I }
impl_format_tuple! { A B C D E F G H I J }
impl_format_tuple! { A B C D E F G H I J K }
impl_format_tuple! { A B C D E F G H I J K L }
impl_format_tuple! { A B C D E F G H I J K L M }
impl_format_tuple! { A B C D E F G H I J K L M N }
impl_format_tuple! { A B C D E F G H I J K L M N O }
impl_format_tuple! { A B C D E F G H I J K L M N O P }
