//! XML response decoding.
//!
//! Turns a REST response body into the wire tree consumed by the mappers:
//!
//! - the root element is unwrapped, so `<tickets><ticket/>...</tickets>`
//!   decodes to `{"ticket": ...}`
//! - a text-only element becomes a string
//! - attributes live under `_attributes`
//! - text of an element with attributes or children lives under `_contents`
//! - a tag seen once is a bare value, a repeated tag is a list

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::codec::{ATTRIBUTES_KEY, CONTENTS_KEY};
use crate::error::{KayakoError, Result};
use crate::transport::WireData;

struct Frame {
    name: String,
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| KayakoError::decode(format!("bad attribute: {}", e)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| KayakoError::decode(format!("bad attribute value: {}", e)))?;
            attributes.insert(key, Value::String(value.into_owned()));
        }
        Ok(Frame {
            name,
            attributes,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        if self.attributes.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(self.text));
        }

        let mut node = self.children;
        if !self.attributes.is_empty() {
            node.insert(ATTRIBUTES_KEY.to_string(), Value::Object(self.attributes));
            node.insert(CONTENTS_KEY.to_string(), Value::String(self.text));
        } else if !self.text.is_empty() {
            node.insert(CONTENTS_KEY.to_string(), Value::String(self.text));
        }
        (self.name, Value::Object(node))
    }
}

fn attach(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        None => {
            children.insert(name, value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

/// Decodes an XML response body.
///
/// An empty body decodes to `Value::Null`; an empty root decodes to an
/// empty node.
///
/// # Errors
///
/// Returns `KayakoError::Decode` for malformed XML.
pub fn decode(body: &str) -> Result<WireData> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| KayakoError::decode(format!("invalid XML at {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(start) => stack.push(Frame::open(&start)?),
            Event::Empty(start) => {
                let (name, value) = Frame::open(&start)?.close();
                match stack.last_mut() {
                    Some(parent) => attach(&mut parent.children, name, value),
                    None => root = Some(value),
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| KayakoError::decode(format!("bad text: {}", e)))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| KayakoError::decode("unbalanced closing tag"))?;
                let (name, value) = frame.close();
                match stack.last_mut() {
                    Some(parent) => attach(&mut parent.children, name, value),
                    None => root = Some(value),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(KayakoError::decode("unexpected end of document"));
    }

    match root {
        Some(Value::String(s)) if s.is_empty() => Ok(Value::Object(Map::new())),
        Some(value) => Ok(value),
        None => Err(KayakoError::decode("document has no root element")),
    }
}
