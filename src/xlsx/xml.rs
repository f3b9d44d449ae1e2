use std::borrow::Cow;

use anyhow::Context;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Flat event list of one package part. Kept lossless so a part can be patched and written
/// back without disturbing anything that was not edited.
#[derive(Clone, Debug, PartialEq)]
pub enum XmlEvent {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Empty {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
    // Declaration, comments, CDATA, processing instructions, doctype: copied as written.
    Verbatim {
        markup: String,
    },
}

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

impl XmlEvent {
    /// Character data of a text node or CDATA section.
    pub fn char_data(&self) -> Option<&str> {
        match self {
            XmlEvent::Text { text } => Some(text),
            XmlEvent::Verbatim { markup } => markup
                .strip_prefix(CDATA_OPEN)
                .and_then(|m| m.strip_suffix(CDATA_CLOSE)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct XmlPart {
    pub name: String,
    pub events: Vec<XmlEvent>,
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn verbatim(open: &str, body: &[u8], close: &str) -> XmlEvent {
    XmlEvent::Verbatim {
        markup: format!("{open}{}{close}", String::from_utf8_lossy(body)),
    }
}

fn attrs_of(start: &BytesStart<'_>) -> anyhow::Result<Vec<(String, String)>> {
    start
        .attributes()
        .map(|a| {
            let a = a.context("malformed attribute")?;
            // Values stay escaped and are written back as-is.
            Ok((lossy(a.key.as_ref()), lossy(&a.value)))
        })
        .collect()
}

pub fn parse_xml_part(name: &str, xml_bytes: &[u8]) -> anyhow::Result<XmlPart> {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().trim_text(false);

    let mut events = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let ev = match reader
            .read_event_into(&mut buf)
            .with_context(|| format!("{name}: xml error at byte {}", reader.buffer_position()))?
        {
            Event::Eof => break,
            Event::Start(s) => XmlEvent::Start {
                name: lossy(s.name().as_ref()),
                attrs: attrs_of(&s)?,
            },
            Event::Empty(s) => XmlEvent::Empty {
                name: lossy(s.name().as_ref()),
                attrs: attrs_of(&s)?,
            },
            Event::End(e) => XmlEvent::End {
                name: lossy(e.name().as_ref()),
            },
            Event::Text(t) => XmlEvent::Text {
                text: t.unescape().context("unescape text")?.into_owned(),
            },
            Event::CData(t) => verbatim(CDATA_OPEN, &t, CDATA_CLOSE),
            Event::Decl(d) => verbatim("<?", &d, "?>"),
            Event::PI(p) => verbatim("<?", &p, "?>"),
            Event::Comment(c) => verbatim("<!--", &c, "-->"),
            Event::DocType(d) => verbatim("<!DOCTYPE", &d, ">"),
        };
        events.push(ev);
    }

    Ok(XmlPart {
        name: name.to_string(),
        events,
    })
}

/// Element name without its namespace prefix (`x:c` -> `c`).
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, l)| l).unwrap_or(name)
}

/// Namespace prefix including the colon (`x:c` -> `x:`), empty when unprefixed.
pub fn name_prefix(name: &str) -> &str {
    name.rfind(':').map(|i| &name[..=i]).unwrap_or("")
}

pub fn find_attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Attribute value with XML entities resolved; falls back to the raw text on bad escapes.
pub fn attr_value<'a>(attrs: &'a [(String, String)], key: &str) -> Option<Cow<'a, str>> {
    let raw = find_attr(attrs, key)?;
    Some(quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw)))
}

fn push_tag(out: &mut String, name: &str, attrs: &[(String, String)], self_closing: bool) {
    out.push('<');
    out.push_str(name);
    for (k, v) in attrs {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(v);
        out.push('"');
    }
    out.push_str(if self_closing { "/>" } else { ">" });
}

pub fn write_xml_part(part: &XmlPart) -> Vec<u8> {
    let mut out = String::new();
    for ev in &part.events {
        match ev {
            XmlEvent::Start { name, attrs } => push_tag(&mut out, name, attrs, false),
            XmlEvent::Empty { name, attrs } => push_tag(&mut out, name, attrs, true),
            XmlEvent::End { name } => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            XmlEvent::Text { text } => out.push_str(&partial_escape(text.as_str())),
            XmlEvent::Verbatim { markup } => out.push_str(markup),
        }
    }
    out.into_bytes()
}
