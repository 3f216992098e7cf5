use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::domain::JsonStyle;

/// Single-line JSON with configurable separators and ASCII-only strings.
///
/// The published datasets were produced with `, `/`: ` (or `,`/`:` for the
/// compact one) and every character outside printable ASCII escaped as a
/// lowercase `\uXXXX` sequence. Control characters are already escaped by
/// serde_json before they reach `write_string_fragment`.
#[derive(Debug, Clone, Copy)]
pub struct SeparatorFormatter {
    item_separator: &'static [u8],
    key_separator: &'static [u8],
}

impl SeparatorFormatter {
    pub fn new(style: JsonStyle) -> Self {
        match style {
            JsonStyle::Spaced => Self {
                item_separator: b", ",
                key_separator: b": ",
            },
            JsonStyle::Compact => Self {
                item_separator: b",",
                key_separator: b":",
            },
        }
    }
}

impl Formatter for SeparatorFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(self.item_separator)
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(self.item_separator)
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(self.key_separator)
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let bytes = fragment.as_bytes();
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            if start < index {
                writer.write_all(&bytes[start..index])?;
            }
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + ch.len_utf8();
        }
        if start < bytes.len() {
            writer.write_all(&bytes[start..])?;
        }
        Ok(())
    }
}

pub fn to_writer<W, T>(writer: W, value: &T, style: JsonStyle) -> serde_json::Result<()>
where
    W: Write,
    T: ?Sized + Serialize,
{
    let mut serializer =
        serde_json::Serializer::with_formatter(writer, SeparatorFormatter::new(style));
    value.serialize(&mut serializer)
}

pub fn to_vec<T>(value: &T, style: JsonStyle) -> serde_json::Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut buffer = Vec::with_capacity(128);
    to_writer(&mut buffer, value, style)?;
    Ok(buffer)
}

pub fn to_string<T>(value: &T, style: JsonStyle) -> serde_json::Result<String>
where
    T: ?Sized + Serialize,
{
    let buffer = to_vec(value, style)?;
    // ASCII only, so the lossy conversion never substitutes.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
