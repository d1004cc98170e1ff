//! XML projection into the value tree.
//!
//! ```text
//! <order id="7">                      {"order": {
//!   <line>a</line>                        "@id": "7",
//!   <line>b</line>             =>         "line": ["a", "b"],
//!   <note lang="en">hi</note>             "note": {"@lang": "en", "#text": "hi"},
//!   <empty/>                              "empty": ""
//! </order>                            }}
//! ```
//!
//! Values stay strings: XML carries no types. Whitespace-only text between
//! elements is dropped and text around child elements is trimmed.

use std::collections::BTreeMap;
use std::fmt::Display;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use jcmp_types::Value;

use crate::error::{CodecError, CodecResult};

/// Prefix of the fields holding attributes.
pub const ATTRIBUTE_PREFIX: &str = "@";
/// Field holding the text of an element that also has attributes or children.
pub const TEXT_FIELD: &str = "#text";

/// An element being read.
struct Element {
    name: String,
    fields: BTreeMap<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> CodecResult<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut fields = BTreeMap::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(xml_error)?;
            let key = format!(
                "{ATTRIBUTE_PREFIX}{}",
                String::from_utf8_lossy(attribute.key.as_ref())
            );
            let value = attribute.unescape_value().map_err(xml_error)?;
            fields.insert(key, Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn push_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text);
    }

    /// Repeated children turn into an array, in document order.
    fn add_child(&mut self, name: String, value: Value) {
        match self.fields.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::take(existing);
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }

    fn close(self) -> (String, Value) {
        if self.fields.is_empty() {
            return (self.name, Value::String(self.text));
        }
        let mut fields = self.fields;
        if !self.text.is_empty() {
            fields.insert(TEXT_FIELD.to_string(), Value::String(self.text));
        }
        (self.name, Value::Object(fields))
    }
}

/// Decode an XML document.
pub fn decode_xml(text: &str) -> CodecResult<Value> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => {
                ensure_open_allowed(&stack, &root)?;
                stack.push(Element::open(&start)?);
            }
            Event::Empty(start) => {
                ensure_open_allowed(&stack, &root)?;
                let element = Element::open(&start)?;
                attach(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CodecError::Xml("closing tag without an opening tag".into()))?;
                attach(element, &mut stack, &mut root);
            }
            Event::Text(content) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&content.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(content) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&String::from_utf8_lossy(&content));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(CodecError::Xml(format!("unclosed element <{}>", open.name)));
    }
    let (name, value) = root.ok_or_else(|| CodecError::Xml("no root element".into()))?;
    Ok(Value::Object(BTreeMap::from([(name, value)])))
}

fn ensure_open_allowed(stack: &[Element], root: &Option<(String, Value)>) -> CodecResult<()> {
    if stack.is_empty() {
        if let Some((name, _)) = root {
            return Err(CodecError::Xml(format!(
                "more than one root element (after <{name}>)"
            )));
        }
    }
    Ok(())
}

fn attach(element: Element, stack: &mut [Element], root: &mut Option<(String, Value)>) {
    let (name, value) = element.close();
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value),
        None => *root = Some((name, value)),
    }
}

fn xml_error(e: impl Display) -> CodecError {
    CodecError::Xml(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(text: &str) -> serde_json::Value {
        serde_json::to_value(decode_xml(text).unwrap()).unwrap()
    }

    #[test]
    fn projects_documented_shapes() {
        let value = decode(
            r#"<?xml version="1.0"?>
            <order id="7">
              <line>a</line>
              <line>b</line>
              <note lang="en">hi</note>
              <empty/>
              <blank></blank>
            </order>"#,
        );
        assert_eq!(
            value,
            json!({"order": {
                "@id": "7",
                "line": ["a", "b"],
                "note": {"@lang": "en", "#text": "hi"},
                "empty": "",
                "blank": ""
            }})
        );
    }

    #[test]
    fn mixed_content_goes_under_text() {
        let value = decode("<p>hello <b>big</b> world</p>");
        assert_eq!(value, json!({"p": {"b": "big", "#text": "hello world"}}));
    }

    #[test]
    fn entities_and_cdata_are_decoded() {
        let value = decode("<a><x>1 &lt; 2</x><y><![CDATA[<raw>]]></y></a>");
        assert_eq!(value, json!({"a": {"x": "1 < 2", "y": "<raw>"}}));
    }

    #[test]
    fn repeated_complex_children() {
        let value = decode(r#"<r><i id="1"/><i id="2"/><i id="3"/></r>"#);
        assert_eq!(
            value,
            json!({"r": {"i": [{"@id": "1"}, {"@id": "2"}, {"@id": "3"}]}})
        );
    }

    #[test]
    fn malformed_documents_fail() {
        for text in ["", "<a>", "<a></b>", "<a/><b/>", "</a>"] {
            match decode_xml(text) {
                Err(CodecError::Xml(_)) => {}
                other => panic!("expected Xml error for {text:?}, got {:?}", other),
            }
        }
    }
}
