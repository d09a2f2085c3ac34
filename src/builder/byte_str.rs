// Fanfare - A Statsd client with multi-metric fan-out for Rust!
//
// Copyright 2026 Nick Pillitteri
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

/// Fixed capacity, stack allocated string buffer.
///
/// Writes past the capacity are truncated rather than reallocating,
/// which is what the sample rate rendering relies on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ByteStr<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> ByteStr<N> {
    pub fn new() -> Self {
        ByteStr { bytes: [0; N], len: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn as_str(&self) -> &str {
        // Only ever filled from &str input so this cannot fail
        std::str::from_utf8(self.as_bytes()).expect("non utf8 bytes in ByteStr")
    }

    /// Append as much of the slice as fits, truncating the rest.
    pub fn extend_from_slice<T: AsRef<[u8]>>(&mut self, slice: T) {
        let bytes = slice.as_ref();
        let room = self.bytes[self.len..].iter_mut();

        for (i, byte) in room.enumerate() {
            if let Some(b) = bytes.get(i) {
                *byte = *b;
                self.len += 1;
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Remove the final byte if it equals `byte`, returning true if removed.
    pub fn chomp_trailing_byte(&mut self, byte: u8) -> bool {
        if self.as_bytes().last() == Some(&byte) {
            self.len -= 1;
            true
        } else {
            false
        }
    }
}

impl<const N: usize> fmt::Write for ByteStr<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.extend_from_slice(s);
        Ok(())
    }
}
