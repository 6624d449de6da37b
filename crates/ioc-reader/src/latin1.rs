// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! A `Read` adapter that treats the underlying bytes as Latin-1
//! (ISO-8859-1): every byte is its own Unicode code point, U+0000
//! through U+00FF. Re-encoding that to UTF-8 before handing it to
//! `serde_json` means malformed or non-UTF-8 input (arbitrary binary
//! noise in a malware trace, a Windows-1252 log dump) never aborts
//! parsing the way feeding raw bytes straight to a UTF-8-only parser
//! would - it just round-trips as mojibake in string fields, which is
//! an acceptable trade for never losing an entry to an encoding error.

use std::io::{self, Read};

pub struct Latin1Reader<R> {
    inner: R,
    // UTF-8 bytes of the previous input byte not yet handed to the caller.
    pending: Option<u8>,
}

impl<R: Read> Latin1Reader<R> {
    pub fn new(inner: R) -> Self {
        Latin1Reader { inner, pending: None }
    }
}

impl<R: Read> Read for Latin1Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut written = 0;
        if let Some(trailing) = self.pending.take() {
            buf[written] = trailing;
            written += 1;
        }
        if written == buf.len() {
            return Ok(written);
        }

        // Read raw bytes into a scratch buffer sized so that even if
        // every byte expands to two UTF-8 bytes, it still fits (plus
        // one byte of headroom for a split pair carried to next call).
        let raw_capacity = (buf.len() - written) / 2;
        if raw_capacity == 0 {
            // Only one slot left in `buf`: read exactly one raw byte.
            let mut one = [0u8; 1];
            let n = self.inner.read(&mut one)?;
            if n == 0 {
                return Ok(written);
            }
            let byte = one[0];
            if byte < 0x80 {
                buf[written] = byte;
                written += 1;
            } else {
                buf[written] = 0xC0 | (byte >> 6);
                self.pending = Some(0x80 | (byte & 0x3F));
                written += 1;
            }
            return Ok(written);
        }

        let mut raw = vec![0u8; raw_capacity];
        let n = self.inner.read(&mut raw)?;
        for &byte in &raw[..n] {
            if byte < 0x80 {
                buf[written] = byte;
                written += 1;
            } else {
                buf[written] = 0xC0 | (byte >> 6);
                buf[written + 1] = 0x80 | (byte & 0x3F);
                written += 2;
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through_unchanged() {
        let mut reader = Latin1Reader::new("hello".as_bytes());
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn high_bytes_become_two_byte_utf8() {
        let raw = vec![0xE9]; // Latin-1 'é'
        let mut reader = Latin1Reader::new(raw.as_slice());
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert_eq!(s, "\u{E9}");
    }

    #[test]
    fn mixed_content_round_trips_byte_for_code_point() {
        let raw: Vec<u8> = vec![b'a', 0xFF, b'b', 0x00, b'c'];
        let mut reader = Latin1Reader::new(raw.as_slice());
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        let chars: Vec<char> = s.chars().collect();
        assert_eq!(chars, vec!['a', '\u{FF}', 'b', '\u{0}', 'c']);
    }
}
