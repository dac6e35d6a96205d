// SPDX-License-Identifier: Apache-2.0

//! XML handling for metadata and style documents.
//!
//! Works on raw qualified names (`gmd:MD_Metadata`), not resolved namespaces:
//! the catalog serves documents with fixed, well-known prefixes.

use quick_xml::events::{BytesDecl, Event};
use quick_xml::{Reader, Writer};

use crate::error::{ExtractError, Result};

const INDENT: u8 = b' ';
const INDENT_SIZE: usize = 2;

/// Serializes the single occurrence of `tag` (with its whole subtree) out of
/// `xml`, pretty-printed and prefixed with an XML declaration. Any other
/// occurrence count violates the expected document shape.
pub(crate) fn extract_single_element(xml: &[u8], tag: &str) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new_with_indent(Vec::new(), INDENT, INDENT_SIZE);
    let mut buf = Vec::new();

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| ExtractError::Structural(format!("failed to serialize XML: {e}")))?;

    let mut depth = 0usize;
    let mut matches = 0usize;
    loop {
        let event = reader.read_event_into(&mut buf)?;
        let capturing = depth > 0 && matches == 1;
        match event {
            Event::Eof => break,
            Event::Start(start) => {
                if capturing {
                    depth += 1;
                    write_owned(&mut writer, Event::Start(start.into_owned()))?;
                } else if depth == 0 && start.name().as_ref() == tag.as_bytes() {
                    matches += 1;
                    depth = 1;
                    if matches == 1 {
                        write_owned(&mut writer, Event::Start(start.into_owned()))?;
                    }
                } else if depth > 0 {
                    // inside a second occurrence; keep tracking depth silently
                    depth += 1;
                }
            }
            Event::Empty(start) => {
                if capturing {
                    write_owned(&mut writer, Event::Empty(start.into_owned()))?;
                } else if depth == 0 && start.name().as_ref() == tag.as_bytes() {
                    matches += 1;
                    if matches == 1 {
                        write_owned(&mut writer, Event::Empty(start.into_owned()))?;
                    }
                }
            }
            Event::End(end) => {
                if depth > 0 {
                    depth -= 1;
                    if capturing {
                        write_owned(&mut writer, Event::End(end.into_owned()))?;
                    }
                }
            }
            Event::Text(text) => {
                if capturing && !text.iter().all(|b| b.is_ascii_whitespace()) {
                    write_owned(&mut writer, Event::Text(text.into_owned()))?;
                }
            }
            other => {
                if capturing {
                    write_owned(&mut writer, other.into_owned())?;
                }
            }
        }
        buf.clear();
    }

    if matches != 1 {
        return Err(ExtractError::Structural(format!(
            "expected one and only one <{tag}> element, found {matches}"
        )));
    }

    let mut out = writer.into_inner();
    out.push(b'\n');
    Ok(out)
}

/// Re-indents an XML document. Returns an error for input the parser rejects,
/// letting callers fall back to writing the raw bytes.
pub(crate) fn pretty_print(xml: &[u8]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new_with_indent(Vec::new(), INDENT, INDENT_SIZE);
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Eof => break,
            Event::Text(text) => {
                if !text.iter().all(|b| b.is_ascii_whitespace()) {
                    write_owned(&mut writer, Event::Text(text.into_owned()))?;
                }
            }
            other => write_owned(&mut writer, other.into_owned())?,
        }
        buf.clear();
    }

    let mut out = writer.into_inner();
    out.push(b'\n');
    Ok(out)
}

fn write_owned(writer: &mut Writer<Vec<u8>>, event: Event<'static>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ExtractError::Structural(format!("failed to serialize XML: {e}")))
}
