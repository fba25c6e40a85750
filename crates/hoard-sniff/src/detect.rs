use std::io::{self, Read, Seek};

use crate::MediaType;

/// Number of leading bytes considered when sniffing.
pub const SNIFF_LEN: usize = 512;

/// Best-effort media type of `data`, looking at no more than [`SNIFF_LEN`] bytes.
///
/// Never fails: unknown binary content is `application/octet-stream`.
pub fn sniff(data: &[u8]) -> MediaType {
    let data = &data[..data.len().min(SNIFF_LEN)];
    detect_specialized(data).unwrap_or_else(|| detect_generic(data))
}

/// Read up to [`SNIFF_LEN`] bytes from the start of `reader`, then rewind.
///
/// The cursor is always left at offset 0 on success.
pub fn detect_from_reader<R: Read + Seek>(reader: &mut R) -> io::Result<MediaType> {
    reader.rewind()?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    reader.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    reader.rewind()?;
    Ok(sniff(&header))
}

// Containers the generic table below would misfile as plain RIFF.
fn detect_specialized(data: &[u8]) -> Option<MediaType> {
    match data {
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(MediaType::WEBP),
        _ => None,
    }
}

fn detect_generic(data: &[u8]) -> MediaType {
    match data {
        [0xFE, 0xFF, ..] => MediaType::TEXT_UTF16BE,
        [0xFF, 0xFE, ..] => MediaType::TEXT_UTF16LE,
        [0xEF, 0xBB, 0xBF, ..] => MediaType::TEXT,
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => MediaType::PNG,
        [0xFF, 0xD8, 0xFF, ..] => MediaType::JPEG,
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => MediaType::GIF,
        [b'B', b'M', ..] => MediaType::BMP,
        [0x00, 0x00, 0x01 | 0x02, 0x00, ..] => MediaType::ICON,
        [b'%', b'P', b'D', b'F', b'-', ..] => MediaType::PDF,
        [b'P', b'K', 0x03, 0x04, ..] => MediaType::ZIP,
        [0x1F, 0x8B, 0x08, ..] => MediaType::GZIP,
        [b'O', b'g', b'g', b'S', 0x00, ..] => MediaType::OGG,
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => MediaType::WAVE,
        [b'R', b'I', b'F', b'F', _, _, _, _, b'A', b'V', b'I', b' ', ..] => MediaType::AVI,
        [0x1A, 0x45, 0xDF, 0xA3, ..] => MediaType::WEBM,
        [b'I', b'D', b'3', ..] => MediaType::MPEG,
        _ if is_mp4(data) => MediaType::MP4,
        _ => detect_text(data),
    }
}

/// ISO base media file with an `mp4*` brand in its `ftyp` box.
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }
    (8..box_size)
        .step_by(4)
        .filter(|&st| st != 12)
        .any(|st| data.get(st..st + 3) == Some(b"mp4".as_slice()))
}

const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

fn detect_text(data: &[u8]) -> MediaType {
    let trimmed = skip_whitespace(data);

    if HTML_TAGS.iter().any(|tag| is_html_tag(trimmed, tag)) {
        return MediaType::HTML;
    }
    if trimmed.starts_with(b"<?xml") {
        return MediaType::XML;
    }
    if data.iter().any(|&b| is_binary_byte(b)) {
        return MediaType::OCTET_STREAM;
    }
    MediaType::TEXT
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | 0x0C | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

/// Case-insensitive tag match that must be followed by a space or `>`.
fn is_html_tag(data: &[u8], tag: &[u8]) -> bool {
    data.len() > tag.len()
        && data[..tag.len()].eq_ignore_ascii_case(tag)
        && matches!(data[tag.len()], b' ' | b'>')
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
