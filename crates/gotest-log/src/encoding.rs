// Copyright (c) 2026 - present allanpk716
// SPDX-License-Identifier: MIT

//! Input encoding detection and normalization
//!
//! Test logs captured on Windows (PowerShell redirection, `Out-File`) are
//! frequently UTF-16 rather than UTF-8. Both parsers assume UTF-8, so every
//! stream passes through [`normalize`] first: UTF-16 input, with or without
//! a byte-order mark, is transcoded in full; anything else is passed
//! through untouched.

use std::io::{self, Chain, Cursor, Read};

/// Bytes read up front to sniff the encoding.
const SNIFF_WINDOW: usize = 1024;

/// Bytes of the window examined by the null-byte heuristic.
const HEURISTIC_SPAN: usize = 100;

/// Byte order of a UTF-16 stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endianness {
    Little,
    Big,
}

/// A reader producing valid UTF-8 regardless of the source encoding.
pub enum Normalized<R> {
    /// Input already UTF-8: the sniff window followed by the untouched rest
    PassThrough(Chain<Cursor<Vec<u8>>, R>),
    /// Input was UTF-16 and has been transcoded in full
    Transcoded(Cursor<Vec<u8>>),
}

impl<R: Read> Read for Normalized<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Normalized::PassThrough(inner) => inner.read(buf),
            Normalized::Transcoded(inner) => inner.read(buf),
        }
    }
}

/// Sniff the stream's encoding and return a UTF-8 reader over its content.
///
/// Detection order: UTF-16 byte-order marks first, then a statistical
/// null-byte check for markless UTF-16; everything else is treated as
/// UTF-8 and passed through unchanged.
///
/// # Errors
///
/// Returns any read error from the underlying stream; a failure while
/// sniffing or transcoding is fatal to the whole parse.
pub fn normalize<R: Read>(mut reader: R) -> io::Result<Normalized<R>> {
    let mut window = [0u8; SNIFF_WINDOW];
    let n = read_window(&mut reader, &mut window)?;
    let window = &window[..n];

    if window.starts_with(&[0xFF, 0xFE]) {
        return transcode_utf16(reader, &window[2..], Endianness::Little)
            .map(Normalized::Transcoded);
    }
    if window.starts_with(&[0xFE, 0xFF]) {
        return transcode_utf16(reader, &window[2..], Endianness::Big).map(Normalized::Transcoded);
    }
    if let Some(endianness) = sniff_bomless_utf16(window) {
        return transcode_utf16(reader, window, endianness).map(Normalized::Transcoded);
    }

    Ok(Normalized::PassThrough(
        Cursor::new(window.to_vec()).chain(reader),
    ))
}

/// Fill as much of `window` as the stream can provide.
fn read_window<R: Read>(reader: &mut R, window: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < window.len() {
        match reader.read(&mut window[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Detect markless UTF-16 by counting null bytes at alternating offsets.
///
/// ASCII-heavy UTF-16 text has a zero in every other byte: odd offsets for
/// little-endian, even offsets for big-endian. More than a quarter of the
/// sampled bytes being such zeros is taken as detection.
fn sniff_bomless_utf16(window: &[u8]) -> Option<Endianness> {
    if window.len() < 4 {
        return None;
    }
    let span = window.len().min(HEURISTIC_SPAN);
    let threshold = span / 4;

    let odd_nulls = (1..span).step_by(2).filter(|&i| window[i] == 0).count();
    if odd_nulls > threshold {
        return Some(Endianness::Little);
    }
    let even_nulls = (0..span).step_by(2).filter(|&i| window[i] == 0).count();
    if even_nulls > threshold {
        return Some(Endianness::Big);
    }
    None
}

/// Decode the head bytes plus the rest of the stream as UTF-16, re-encoding
/// as UTF-8.
///
/// Surrogate pairs decode to their supplementary characters; unpaired
/// surrogates and a trailing odd byte are dropped silently rather than
/// substituted.
fn transcode_utf16<R: Read>(
    mut reader: R,
    head: &[u8],
    endianness: Endianness,
) -> io::Result<Cursor<Vec<u8>>> {
    let mut raw = head.to_vec();
    reader.read_to_end(&mut raw)?;

    // chunks_exact drops a trailing unpaired byte.
    let units = raw.chunks_exact(2).map(|pair| match endianness {
        Endianness::Little => u16::from_le_bytes([pair[0], pair[1]]),
        Endianness::Big => u16::from_be_bytes([pair[0], pair[1]]),
    });

    let text: String = char::decode_utf16(units)
        .filter_map(Result::ok)
        .collect();

    Ok(Cursor::new(text.into_bytes()))
}
