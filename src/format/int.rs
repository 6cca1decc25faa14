//! Division-free integer rendering.
//!
//! Decimal digits are produced two at a time from a fixed-point
//! reciprocal: the value is multiplied by a magic constant so that the
//! leading digit pair lands in the upper 32 bits of a `u64`, and every
//! further pair is obtained by multiplying the low 32 bits by 100.

use super::write::Format;

static RADIX_100: [u8; 200] = radix_100_table();

const fn radix_100_table() -> [u8; 200] {
    let mut table = [0u8; 200];
    let mut i = 0;
    while i < 100 {
        table[i * 2] = b'0' + (i / 10) as u8;
        table[i * 2 + 1] = b'0' + (i % 10) as u8;
        i += 1;
    }
    table
}

struct Digits<'a> {
    dst: &'a mut [u8],
    pos: usize,
}

impl Digits<'_> {
    #[inline(always)]
    fn one(&mut self, digit: u32) {
        self.dst[self.pos] = b'0' + digit as u8;
        self.pos += 1;
    }

    #[inline(always)]
    fn two(&mut self, pair: u32) {
        let at = pair as usize * 2;
        self.dst[self.pos..self.pos + 2].copy_from_slice(&RADIX_100[at..at + 2]);
        self.pos += 2;
    }

    /// Writes the leading one or two digits held in the upper half of `prod`.
    #[inline(always)]
    fn leading(&mut self, prod: u64, pairs: usize) {
        let head = (prod >> 32) as u32;
        if head < 10 {
            self.one(head)
        } else {
            self.two(head)
        }
        self.pairs(prod, pairs);
    }

    #[inline(always)]
    fn pairs(&mut self, mut prod: u64, count: usize) {
        for _ in 0..count {
            prod = (prod as u32 as u64) * 100;
            self.two((prod >> 32) as u32);
        }
    }
}

/// Writes `value` without leading zeros and returns the number of bytes written.
///
/// `dst` must hold at least 10 bytes for arbitrary input.
#[inline]
pub(crate) fn write_u32(value: u32, dst: &mut [u8]) -> usize {
    let mut digits = Digits { dst, pos: 0 };
    let x = value as u64;

    if value < 100 {
        if value < 10 {
            digits.one(value)
        } else {
            digits.two(value)
        }
    } else if value < 1_000_000 {
        if value < 10_000 {
            digits.leading(x * 42_949_673, 1)
        } else {
            digits.leading(x * 429_497, 2)
        }
    } else if value < 100_000_000 {
        digits.leading((x * 281_474_978) >> 16, 3)
    } else if value < 1_000_000_000 {
        let prod = (x * 1_441_151_882) >> 25;
        digits.one((prod >> 32) as u32);
        digits.pairs(prod, 4)
    } else {
        let prod = (x * 1_441_151_881) >> 25;
        digits.two((prod >> 32) as u32);
        digits.pairs(prod, 4)
    }

    digits.pos
}

/// Writes exactly `N` digits of `value`, left-padded with `'0'`.
///
/// The value must fit in `N` digits.
#[inline]
pub(crate) fn write_padded<const N: usize>(value: u32, dst: &mut [u8]) {
    if N == 10 && value >= 1_000_000_000 {
        write_u32(value, dst);
        return;
    }

    let dst = &mut dst[..N];
    let mut prod = ((value as u64 * 720_575_941) >> 24) + 1;
    for skip in [8, 6, 4, 2, 0] {
        let at = (prod >> 32) as usize * 2;
        if N == skip + 1 {
            dst[0] = RADIX_100[at + 1];
        } else if N > skip + 1 {
            dst[N - skip - 2..N - skip].copy_from_slice(&RADIX_100[at..at + 2]);
        }
        prod = (prod as u32 as u64) * 100;
    }
}

#[inline]
pub(crate) fn write_i32(value: i32, dst: &mut [u8]) -> usize {
    if value < 0 {
        dst[0] = b'-';
        1 + write_u32(value.unsigned_abs(), &mut dst[1..])
    } else {
        write_u32(value as u32, dst)
    }
}

/// 64-bit values are split into 8-digit groups and rendered with the
/// 32-bit routines.
#[inline]
pub(crate) fn write_u64(value: u64, dst: &mut [u8]) -> usize {
    const GROUP: u64 = 100_000_000;

    if let Ok(small) = u32::try_from(value) {
        return write_u32(small, dst);
    }

    let (high, low) = (value / GROUP, (value % GROUP) as u32);
    let len = match u32::try_from(high) {
        Ok(high) => write_u32(high, dst),
        Err(_) => {
            let (top, middle) = ((high / GROUP) as u32, (high % GROUP) as u32);
            let len = write_u32(top, dst);
            write_padded::<8>(middle, &mut dst[len..]);
            len + 8
        }
    };

    write_padded::<8>(low, &mut dst[len..]);
    len + 8
}

#[inline]
pub(crate) fn write_i64(value: i64, dst: &mut [u8]) -> usize {
    if value < 0 {
        dst[0] = b'-';
        1 + write_u64(value.unsigned_abs(), &mut dst[1..])
    } else {
        write_u64(value as u64, dst)
    }
}

macro_rules! impl_format_int {
    ($bound:literal, $conv:ident($as:ty) => $($t:ty),*) => {
        $(impl Format for $t {
            #[inline(always)]
            fn max_size(&self) -> usize {
                $bound
            }

            #[inline(always)]
            fn write_to(&self, dst: &mut [u8]) -> usize {
                $conv(*self as $as, dst)
            }
        })*
    };
}

impl_format_int! { 10, write_u32(u32) => u8, u16, u32 }
impl_format_int! { 11, write_i32(i32) => i8, i16, i32 }
impl_format_int! { 20, write_u64(u64) => u64, usize }
impl_format_int! { 21, write_i64(i64) => i64, isize }

/// A fixed-width integer, left-padded with zeros.
///
/// The width `N` must be between 1 and 10; other widths are rejected at
/// compile time. A negative value takes its sign in place of the
/// leftmost padding zero, so `Padded::<3, i32>::new(-5)` renders as `-05`.
///
/// ```
/// use vocab_web::{format::Padded, Buffer};
///
/// let mut out = Buffer::new();
/// out.put((Padded::<2>::new(7), b":", Padded::<2>::new(30)));
/// assert_eq!(out.as_slice(), b"07:30");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padded<const N: usize, T = u32>(T);

impl<const N: usize, T> Padded<N, T> {
    const WIDTH: () = assert!(N >= 1 && N <= 10, "padded width must be in 1..=10");

    #[inline(always)]
    pub const fn new(value: T) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::WIDTH;
        Self(value)
    }
}

macro_rules! impl_format_padded {
    (unsigned => $($t:ty),*) => {
        $(impl<const N: usize> Format for Padded<N, $t> {
            #[inline(always)]
            fn max_size(&self) -> usize {
                N
            }

            #[inline(always)]
            fn write_to(&self, dst: &mut [u8]) -> usize {
                debug_assert!(
                    N == 10 || (self.0 as u64) < 10u64.pow(N as u32),
                    "value does not fit the padded width"
                );
                write_padded::<N>(self.0 as u32, dst);
                N
            }
        })*
    };
    (signed => $($t:ty),*) => {
        $(impl<const N: usize> Format for Padded<N, $t> {
            #[inline(always)]
            fn max_size(&self) -> usize {
                N
            }

            #[inline(always)]
            fn write_to(&self, dst: &mut [u8]) -> usize {
                let value = self.0 as i32;
                let magnitude = value.unsigned_abs();
                debug_assert!(
                    (magnitude as u64) < 10u64.pow(N as u32 - (value < 0) as u32),
                    "value does not fit the padded width"
                );
                write_padded::<N>(magnitude, dst);
                if value < 0 {
                    dst[0] = b'-';
                }
                N
            }
        })*
    };
}

impl_format_padded! { unsigned => u8, u16, u32 }
impl_format_padded! { signed => i8, i16, i32 }
