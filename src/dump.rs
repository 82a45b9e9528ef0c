import_stdlib!();

use crate::conformance::DecoderConfig;
use crate::decode::Decoder;
use crate::error::Result;
use crate::head::{encode_head, encode_indefinite_head, MajorType};
use crate::item::{Item, ItemCase};
use crate::string_util::{flanked, sanitized};
use crate::tag::Tag;
use crate::tags_store::TagsStoreTrait;

/// Options controlling [`hex_opt`]'s output.
#[derive(Clone, Default)]
pub struct HexFormatOpts<'a> {
    annotate: bool,
    tags: Option<&'a dyn TagsStoreTrait>,
}

impl<'a> HexFormatOpts<'a> {
    /// Sets whether to annotate the hex dump with one comment per item.
    pub fn annotate(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Supplies a tag registry consulted for tag-name comments.
    pub fn tags(mut self, tags: &'a dyn TagsStoreTrait) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Returns the plain, unannotated hex encoding of `data`.
pub fn hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Returns `data`'s hex encoding, broken into one semantically meaningful
/// line per item, with each line commented with its type, length, and (for
/// tags) registered name.
pub fn hex_annotated(data: &[u8]) -> Result<String> {
    hex_opt(data, HexFormatOpts::default().annotate(true))
}

/// Returns `data`'s hex encoding, optionally annotated per `opts`.
pub fn hex_opt(data: &[u8], opts: HexFormatOpts<'_>) -> Result<String> {
    if !opts.annotate {
        return Ok(hex::encode(data));
    }
    let mut decoder = Decoder::new(data, DecoderConfig::default())?;
    let item = decoder.get_next_raw()?;
    let (items, _) = dump_items(&mut decoder, item, 0, &opts)?;
    decoder.finish()?;

    let note_column = items.iter().fold(0, |largest, item| largest.max(item.format_first_column().len()));
    // Round up to the nearest multiple of 4, matching the teacher's layout.
    let note_column = ((note_column + 4) & !3).saturating_sub(1);
    let lines: Vec<_> = items.iter().map(|x| x.format(note_column)).collect();
    Ok(lines.join("\n"))
}

/// Renders one decoded item (and, recursively, its children) into a flat
/// list of hex/comment lines, returning that list plus the depth of
/// whatever item follows it (mirrors `diag::build_item`'s threading of
/// `next_level` so indefinite and definite aggregates are handled
/// identically).
fn dump_items<'a>(
    decoder: &mut Decoder<'a>,
    item: Item<'a>,
    level: usize,
    opts: &HexFormatOpts<'_>,
) -> Result<(Vec<DumpItem>, usize)> {
    let mut items = Vec::new();
    let mut content_level = level;
    for tag in item.tags().to_vec(decoder.tag_overflow()) {
        let mut header = [0u8; 9];
        let n = encode_head(&mut header, MajorType::Tagged, tag)?;
        let mut note = format!("tag({tag})");
        if opts.annotate {
            if let Some(name) = opts.tags.and_then(|t| t.assigned_name_for_tag(&Tag::from(tag))) {
                note.push(' ');
                note.push_str(&name);
            }
        }
        items.push(DumpItem::new(content_level, vec![header[..n].to_vec()], Some(note)));
        content_level += 1;
    }

    let (mut body, next_level) = dump_body(decoder, &item, content_level, opts)?;
    items.append(&mut body);
    Ok((items, next_level))
}

fn dump_body<'a>(
    decoder: &mut Decoder<'a>,
    item: &Item<'a>,
    level: usize,
    opts: &HexFormatOpts<'_>,
) -> Result<(Vec<DumpItem>, usize)> {
    match item.case() {
        ItemCase::UnsignedInt(n) => {
            let mut header = [0u8; 9];
            let len = encode_head(&mut header, MajorType::Unsigned, *n)?;
            Ok((vec![DumpItem::new(level, vec![header[..len].to_vec()], Some(format!("unsigned({n})")))], item.next_level()))
        }
        ItemCase::SignedInt(n) if *n >= 0 => {
            let mut header = [0u8; 9];
            let len = encode_head(&mut header, MajorType::Unsigned, *n as u64)?;
            Ok((vec![DumpItem::new(level, vec![header[..len].to_vec()], Some(format!("unsigned({n})")))], item.next_level()))
        }
        ItemCase::SignedInt(n) => {
            let arg = (-1 - *n) as u64;
            let mut header = [0u8; 9];
            let len = encode_head(&mut header, MajorType::Negative, arg)?;
            Ok((vec![DumpItem::new(level, vec![header[..len].to_vec()], Some(format!("negative({n})")))], item.next_level()))
        }
        ItemCase::NegativeBig(n) => {
            let mut header = [0u8; 9];
            let len = encode_head(&mut header, MajorType::Negative, *n)?;
            Ok((
                vec![DumpItem::new(level, vec![header[..len].to_vec()], Some(format!("negative({})", -1i128 - *n as i128)))],
                item.next_level(),
            ))
        }
        ItemCase::ByteString(b) => {
            let mut header = [0u8; 9];
            let len = encode_head(&mut header, MajorType::ByteString, b.len() as u64)?;
            let mut out = vec![DumpItem::new(level, vec![header[..len].to_vec()], Some(format!("bytes({})", b.len())))];
            if !b.is_empty() {
                let note = str::from_utf8(b).ok().and_then(sanitized).map(|s| flanked(&s, "\"", "\""));
                out.push(DumpItem::new(level + 1, vec![b.to_vec()], note));
            }
            Ok((out, item.next_level()))
        }
        ItemCase::TextString(s) => {
            let mut header = [0u8; 9];
            let len = encode_head(&mut header, MajorType::Text, s.len() as u64)?;
            Ok((
                vec![
                    DumpItem::new(level, vec![header[..len].to_vec()], Some(format!("text({})", s.len()))),
                    DumpItem::new(level + 1, vec![s.as_bytes().to_vec()], Some(flanked(s, "\"", "\""))),
                ],
                item.next_level(),
            ))
        }
        ItemCase::Bool(b) => {
            let byte = if *b { 0xf5 } else { 0xf4 };
            Ok((vec![DumpItem::new(level, vec![vec![byte]], Some(b.to_string()))], item.next_level()))
        }
        ItemCase::Null => Ok((vec![DumpItem::new(level, vec![vec![0xf6]], Some("null".to_string()))], item.next_level())),
        ItemCase::Undefined => Ok((vec![DumpItem::new(level, vec![vec![0xf7]], Some("undefined".to_string()))], item.next_level())),
        ItemCase::Simple(v) => Ok((vec![DumpItem::new(level, vec![vec![0xf8, *v]], Some(format!("simple({v})")))], item.next_level())),
        ItemCase::Half(f) => Ok((vec![DumpItem::new(level, vec![vec![0xf9]], Some(format!("half({f})")))], item.next_level())),
        ItemCase::Single(f) => Ok((vec![DumpItem::new(level, vec![vec![0xfa]], Some(format!("single({f})")))], item.next_level())),
        ItemCase::Double(f) => Ok((vec![DumpItem::new(level, vec![vec![0xfb]], Some(format!("double({f})")))], item.next_level())),
        ItemCase::Array(_) | ItemCase::Map(_) | ItemCase::MapAsArray(_) => dump_aggregate(decoder, item, level, opts),
        other => unreachable!("raw traversal never surfaces {:?}", other),
    }
}

fn dump_aggregate<'a>(
    decoder: &mut Decoder<'a>,
    item: &Item<'a>,
    level: usize,
    opts: &HexFormatOpts<'_>,
) -> Result<(Vec<DumpItem>, usize)> {
    let is_map = matches!(item.case(), ItemCase::Map(_));
    let major = if is_map { MajorType::Map } else { MajorType::Array };
    let reported_count = match item.case() {
        ItemCase::Array(c) | ItemCase::Map(c) | ItemCase::MapAsArray(c) => *c,
        _ => unreachable!(),
    };
    let mut header = [0u8; 9];
    let (header_bytes, note) = match reported_count {
        crate::item::Count::Indefinite => {
            let len = encode_indefinite_head(&mut header, major)?;
            (header[..len].to_vec(), if is_map { "map(*)".to_string() } else { "array(*)".to_string() })
        }
        crate::item::Count::Definite(n) => {
            let entries = if is_map { n / 2 } else { n };
            let len = encode_head(&mut header, major, entries as u64)?;
            (header[..len].to_vec(), format!("{}({entries})", if is_map { "map" } else { "array" }))
        }
    };

    let own_level = item.level();
    let mut items = vec![DumpItem::new(level, vec![header_bytes], Some(note))];
    let mut next_level = item.next_level();
    while next_level > own_level {
        let child_item = decoder.get_next_raw()?;
        let (mut child_lines, nl) = dump_items(decoder, child_item, level + 1, opts)?;
        items.append(&mut child_lines);
        next_level = nl;
    }
    Ok((items, next_level))
}

#[derive(Debug)]
struct DumpItem {
    level: usize,
    data: Vec<Vec<u8>>,
    note: Option<String>,
}

impl DumpItem {
    fn new(level: usize, data: Vec<Vec<u8>>, note: Option<String>) -> DumpItem {
        DumpItem { level, data, note }
    }

    fn format(&self, note_column: usize) -> String {
        let column_1 = self.format_first_column();
        let (column_2, padding) = if let Some(note) = &self.note {
            let padding_count = 1.max(39.min(note_column as i64) - (column_1.len() as i64) + 1);
            let padding = " ".repeat(padding_count.try_into().unwrap());
            (format!("# {note}"), padding)
        } else {
            ("".to_string(), "".to_string())
        };
        column_1 + &padding + &column_2
    }

    fn format_first_column(&self) -> String {
        let indent = " ".repeat(self.level * 4);
        let hex: Vec<_> = self.data.iter().map(hex::encode).filter(|x| !x.is_empty()).collect();
        indent + &hex.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags_store::TagsStore;

    #[test]
    fn plain_hex_matches_raw_encoding() {
        let bytes = [0x01, 0x02];
        assert_eq!(hex(&bytes), "0102");
    }

    #[test]
    fn annotated_unsigned_has_type_comment() {
        let rendered = hex_annotated(&[0x0a]).unwrap();
        assert!(rendered.contains("unsigned(10)"));
    }

    #[test]
    fn annotated_array_breaks_into_one_line_per_item() {
        // [1, 2]
        let bytes = [0x82, 0x01, 0x02];
        let rendered = hex_annotated(&bytes).unwrap();
        assert_eq!(rendered.lines().count(), 3);
        assert!(rendered.lines().next().unwrap().contains("array(2)"));
    }

    #[test]
    fn annotated_tag_shows_registered_name() {
        let bytes = [0xd8, 0x20, 0x62, b'a', b':'];
        let tags = TagsStore::new([Tag::new_with_name(32, "uri")]);
        let rendered = hex_opt(&bytes, HexFormatOpts::default().annotate(true).tags(&tags)).unwrap();
        assert!(rendered.lines().next().unwrap().contains("uri"));
    }

    #[test]
    fn text_string_gets_a_quoted_content_line() {
        let bytes = [0x65, b'h', b'e', b'l', b'l', b'o'];
        let rendered = hex_annotated(&bytes).unwrap();
        assert!(rendered.contains("\"hello\""));
    }
}
