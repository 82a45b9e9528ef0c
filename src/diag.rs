import_stdlib!();

use crate::conformance::DecoderConfig;
use crate::decode::Decoder;
use crate::error::Result;
use crate::item::{Item, ItemCase};
use crate::string_util::flanked;
use crate::tag::Tag;
use crate::tags_store::TagsStoreTrait;

/// Renders `data` as CBOR diagnostic notation (RFC 8949 §8), unannotated.
pub fn diagnostic(data: &[u8]) -> Result<String> {
    let mut decoder = Decoder::new(data, DecoderConfig::default())?;
    let result = decoder.to_diagnostic(false, None)?;
    decoder.finish()?;
    Ok(result)
}

/// Renders `data` as diagnostic notation, annotating tag numbers with any
/// names `tags` knows.
pub fn diagnostic_annotated(data: &[u8], tags: &dyn TagsStoreTrait) -> Result<String> {
    let mut decoder = Decoder::new(data, DecoderConfig::default())?;
    let result = decoder.to_diagnostic(true, Some(tags))?;
    decoder.finish()?;
    Ok(result)
}

/// Affordances for viewing a decoded stream in diagnostic notation.
impl<'a> Decoder<'a> {
    /// Reads the next top-level item (descending through any aggregates it
    /// contains) and renders it as diagnostic notation.
    ///
    /// Reads with [`Decoder::get_next_raw`] rather than [`Decoder::get_next`]
    /// so every tag number is rendered as its own `tag(...)` wrapper, even
    /// ones a dispatch table would otherwise have consumed.
    pub fn to_diagnostic(&mut self, annotate: bool, tags: Option<&dyn TagsStoreTrait>) -> Result<String> {
        let item = self.get_next_raw()?;
        let (tree, _) = build_item(self, item, annotate, tags)?;
        Ok(tree.format(annotate))
    }
}

fn build_item<'a>(
    decoder: &mut Decoder<'a>,
    item: Item<'a>,
    annotate: bool,
    tags: Option<&dyn TagsStoreTrait>,
) -> Result<(DiagItem, usize)> {
    let level = item.level();
    let tag_values = item.tags().to_vec(decoder.tag_overflow());
    let (inner, next_level) = if item.is_aggregate() {
        build_aggregate(decoder, &item, level, annotate, tags)?
    } else {
        (leaf_item(&item), item.next_level())
    };
    Ok((wrap_tags(inner, tag_values, annotate, tags), next_level))
}

fn build_aggregate<'a>(
    decoder: &mut Decoder<'a>,
    item: &Item<'a>,
    level: usize,
    annotate: bool,
    tags: Option<&dyn TagsStoreTrait>,
) -> Result<(DiagItem, usize)> {
    let is_map = matches!(item.case(), ItemCase::Map(_));
    let (begin, end) = if is_map { ("{", "}") } else { ("[", "]") };

    let mut children = Vec::new();
    let mut next_level = item.next_level();
    while next_level > level {
        let child_item = decoder.get_next_raw()?;
        let (child, nl) = build_item(decoder, child_item, annotate, tags)?;
        children.push(child);
        next_level = nl;
    }
    Ok((DiagItem::Group(begin.to_string(), end.to_string(), children, is_map, None), next_level))
}

fn wrap_tags(inner: DiagItem, tag_values: Vec<u64>, annotate: bool, tags: Option<&dyn TagsStoreTrait>) -> DiagItem {
    let mut result = inner;
    for tag in tag_values {
        let comment = if annotate {
            tags.and_then(|t| t.assigned_name_for_tag(&Tag::from(tag)))
        } else {
            None
        };
        result = DiagItem::Group(format!("{tag}("), ")".to_string(), vec![result], false, comment);
    }
    result
}

/// Renders a non-aggregate item's value, matching RFC 8949 §8's notation.
///
/// Only ever sees the base item cases: [`Decoder::to_diagnostic`] reads with
/// `get_next_raw`, which never runs tag-content dispatch, so the lower
/// "tag content" `ItemCase` variants (and `Break`) never reach here.
fn leaf_item(item: &Item<'_>) -> DiagItem {
    let s = match item.case() {
        ItemCase::SignedInt(n) => n.to_string(),
        ItemCase::UnsignedInt(n) => n.to_string(),
        ItemCase::NegativeBig(n) => (-1i128 - *n as i128).to_string(),
        ItemCase::ByteString(b) => format!("h'{}'", hex::encode(b)),
        ItemCase::TextString(s) => quoted(s),
        ItemCase::Bool(b) => b.to_string(),
        ItemCase::Null => "null".to_string(),
        ItemCase::Undefined => "undefined".to_string(),
        ItemCase::Half(f) | ItemCase::Single(f) | ItemCase::Double(f) => format_float(*f),
        ItemCase::Simple(v) => format!("simple({v})"),
        other => unreachable!("raw traversal never surfaces {:?}", other),
    };
    DiagItem::Item(s)
}

fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if f == f.trunc() && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

#[derive(Debug)]
enum DiagItem {
    Item(String),
    Group(String, String, Vec<DiagItem>, bool, Option<String>),
}

impl DiagItem {
    fn format(&self, annotate: bool) -> String {
        self.format_opt(0, "", annotate)
    }

    fn format_opt(&self, level: usize, separator: &str, annotate: bool) -> String {
        match self {
            DiagItem::Item(string) => self.format_line(level, string, separator, None),
            DiagItem::Group(..) => {
                if self.contains_group() || self.total_strings_len() > 20 || self.greatest_strings_len() > 20 {
                    self.multiline_composition(level, separator, annotate)
                } else {
                    self.single_line_composition(level, separator, annotate)
                }
            }
        }
    }

    fn format_line(&self, level: usize, string: &str, separator: &str, comment: Option<&str>) -> String {
        let result = format!("{}{}{}", " ".repeat(level * 4), string, separator);
        if let Some(comment) = comment {
            format!("{result}   / {comment} /")
        } else {
            result
        }
    }

    fn single_line_composition(&self, level: usize, separator: &str, _annotate: bool) -> String {
        let string: String;
        let comment: Option<&str>;
        match self {
            DiagItem::Item(s) => {
                string = s.clone();
                comment = None;
            }
            DiagItem::Group(begin, end, items, is_pairs, comm) => {
                let components: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        DiagItem::Item(string) => string.clone(),
                        DiagItem::Group(..) => "<group>".to_string(),
                    })
                    .collect();
                let pair_separator = if *is_pairs { ": " } else { ", " };
                string = flanked(&Self::joined(&components, ", ", Some(pair_separator)), begin, end);
                comment = comm.as_deref();
            }
        };
        self.format_line(level, &string, separator, comment)
    }

    fn multiline_composition(&self, level: usize, separator: &str, annotate: bool) -> String {
        match self {
            DiagItem::Item(string) => string.to_owned(),
            DiagItem::Group(begin, end, items, is_pairs, comment) => {
                let mut lines: Vec<String> = vec![];
                lines.push(self.format_line(level, begin, "", comment.as_deref()));
                for (index, item) in items.iter().enumerate() {
                    let separator = if index == items.len() - 1 {
                        ""
                    } else if *is_pairs && index & 1 == 0 {
                        ":"
                    } else {
                        ","
                    };
                    lines.push(item.format_opt(level + 1, separator, annotate));
                }
                lines.push(self.format_line(level, end, "", None));
                lines.join("\n")
            }
        }
    }

    fn total_strings_len(&self) -> usize {
        match self {
            DiagItem::Item(string) => string.len(),
            DiagItem::Group(_, _, items, _, _) => items.iter().fold(0, |acc, item| acc + item.total_strings_len()),
        }
    }

    fn greatest_strings_len(&self) -> usize {
        match self {
            DiagItem::Item(string) => string.len(),
            DiagItem::Group(_, _, items, _, _) => items.iter().fold(0, |acc, item| acc.max(item.total_strings_len())),
        }
    }

    fn is_group(&self) -> bool {
        matches!(self, DiagItem::Group(..))
    }

    fn contains_group(&self) -> bool {
        match self {
            DiagItem::Item(_) => false,
            DiagItem::Group(_, _, items, _, _) => items.iter().any(|x| x.is_group()),
        }
    }

    fn joined(elements: &[String], item_separator: &str, pair_separator: Option<&str>) -> String {
        let pair_separator = pair_separator.unwrap_or(item_separator);
        let mut result = String::new();
        let len = elements.len();
        for (index, item) in elements.iter().enumerate() {
            result += item;
            if index != len - 1 {
                if index & 1 != 0 {
                    result += item_separator;
                } else {
                    result += pair_separator;
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags_store::TagsStore;

    #[test]
    fn renders_plain_integer() {
        assert_eq!(diagnostic(&[0x0a]).unwrap(), "10");
    }

    #[test]
    fn renders_text_string() {
        let bytes = [0x65, b'h', b'e', b'l', b'l', b'o'];
        assert_eq!(diagnostic(&bytes).unwrap(), "\"hello\"");
    }

    #[test]
    fn renders_short_array_on_one_line() {
        // [1, 2, 3]
        let bytes = [0x83, 0x01, 0x02, 0x03];
        assert_eq!(diagnostic(&bytes).unwrap(), "[1, 2, 3]");
    }

    #[test]
    fn renders_map_with_pair_separator() {
        // {1: 2}
        let bytes = [0xa1, 0x01, 0x02];
        assert_eq!(diagnostic(&bytes).unwrap(), "{1: 2}");
    }

    #[test]
    fn renders_tag_wrapper() {
        // tag 32, "a:"
        let bytes = [0xd8, 0x20, 0x62, b'a', b':'];
        assert_eq!(diagnostic(&bytes).unwrap(), "32(\"a:\")");
    }

    #[test]
    fn annotated_tag_shows_registered_name() {
        let bytes = [0xd8, 0x20, 0x62, b'a', b':'];
        let tags = TagsStore::new([Tag::new_with_name(32, "uri")]);
        let rendered = diagnostic_annotated(&bytes, &tags).unwrap();
        assert!(rendered.contains("uri"));
    }
}
