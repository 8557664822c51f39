use std::io::Cursor;
use std::time::SystemTime;

use headers::Header;
use http::StatusCode;
use xml::writer::{EmitterConfig, XmlEvent};
use xmltree::Element;

use crate::errors::{DavError, DavResult};

const DAV_NS: &str = "DAV:";

/// Whether a PROPFIND response should carry values, or just property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropfindMode {
    WithValues,
    NamesOnly,
}

/// One resource's worth of data needed to build its `D:response` element.
pub struct PropfindEntry {
    pub href: String,
    pub is_collection: bool,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub creationdate: SystemTime,
    pub lastmodified: SystemTime,
    /// (local name, namespace URI, value)
    pub dead_properties: Vec<(String, Option<String>, Vec<u8>)>,
}

/// A single `set` or `remove` operation parsed out of a PROPPATCH body.
#[derive(Debug, Clone)]
pub enum PropUpdateOp {
    Set { local_name: String, namespace: Option<String>, value: Vec<u8> },
    Remove { local_name: String, namespace: Option<String> },
}

impl PropUpdateOp {
    pub fn local_name(&self) -> &str {
        match self {
            PropUpdateOp::Set { local_name, .. } => local_name,
            PropUpdateOp::Remove { local_name, .. } => local_name,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            PropUpdateOp::Set { namespace, .. } => namespace.as_deref(),
            PropUpdateOp::Remove { namespace, .. } => namespace.as_deref(),
        }
    }
}

/// Parses request bodies and serializes multistatus responses for
/// PROPFIND and PROPPATCH.
pub struct XmlCodec;

impl XmlCodec {
    /// Parse a PROPFIND request body. An empty body defaults to `WithValues`
    /// (spec default when no body is sent).
    pub fn parse_propfind(body: &[u8]) -> DavResult<PropfindMode> {
        if body.is_empty() {
            return Ok(PropfindMode::WithValues);
        }
        let root = Element::parse(Cursor::new(body)).map_err(|_| DavError::XmlParse)?;
        if root.name != "propfind" {
            return Err(DavError::XmlParse);
        }
        for child in &root.children {
            let Some(el) = child.as_element() else { continue };
            match el.name.as_str() {
                "prop" | "allprop" => return Ok(PropfindMode::WithValues),
                "propname" => return Ok(PropfindMode::NamesOnly),
                _ => continue,
            }
        }
        Ok(PropfindMode::WithValues)
    }

    /// Parse a PROPPATCH request body into an ordered list of set/remove ops.
    pub fn parse_proppatch(body: &[u8]) -> DavResult<Vec<PropUpdateOp>> {
        let root = Element::parse(Cursor::new(body)).map_err(|_| DavError::XmlParse)?;
        if root.name != "propertyupdate" {
            return Err(DavError::XmlParse);
        }
        let mut ops = Vec::new();
        for child in &root.children {
            let Some(el) = child.as_element() else { continue };
            let is_set = match el.name.as_str() {
                "set" => true,
                "remove" => false,
                _ => continue,
            };
            for prop_wrapper in &el.children {
                let Some(prop_el) = prop_wrapper.as_element() else { continue };
                if prop_el.name != "prop" {
                    continue;
                }
                for prop_child in &prop_el.children {
                    let Some(p) = prop_child.as_element() else { continue };
                    let local_name = p.name.clone();
                    let namespace = p.namespace.clone();
                    if is_set {
                        let value = p.get_text().map(|t| t.into_owned()).unwrap_or_default();
                        ops.push(PropUpdateOp::Set { local_name, namespace, value: value.into_bytes() });
                    } else {
                        ops.push(PropUpdateOp::Remove { local_name, namespace });
                    }
                }
            }
        }
        Ok(ops)
    }

    /// Build a 207 Multi-Status PROPFIND response body.
    pub fn build_propfind_response(protocol: &str, entries: &[PropfindEntry], mode: PropfindMode) -> DavResult<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut w = EmitterConfig::new()
                .perform_indent(true)
                .write_document_declaration(true)
                .create_writer(&mut out);

            w.write(XmlEvent::start_element("D:multistatus").ns("D", DAV_NS))?;
            for entry in entries {
                write_propfind_response_element(&mut w, protocol, entry, mode)?;
            }
            w.write(XmlEvent::end_element())?;
        }
        Ok(out)
    }

    /// Build a 207 Multi-Status PROPPATCH response body. `href` is the
    /// request URI; `results` pairs each parsed operation with the status
    /// the PropertyStore call against it produced.
    pub fn build_proppatch_response(protocol: &str, href: &str, results: &[(PropUpdateOp, StatusCode)]) -> DavResult<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut w = EmitterConfig::new()
                .perform_indent(true)
                .write_document_declaration(true)
                .create_writer(&mut out);

            w.write(XmlEvent::start_element("D:multistatus").ns("D", DAV_NS))?;
            w.write(XmlEvent::start_element("D:response"))?;
            write_text_element(&mut w, "D:href", href)?;

            for (op, status) in results {
                w.write(XmlEvent::start_element("D:propstat"))?;
                w.write(XmlEvent::start_element("D:prop"))?;
                let mut name_el = XmlEvent::start_element(op.local_name());
                if let Some(ns_uri) = op.namespace() {
                    name_el = name_el.ns("", ns_uri);
                }
                w.write(name_el)?;
                w.write(XmlEvent::end_element())?; // name element
                write_text_element(&mut w, "D:status", &status_line(protocol, *status))?;
                w.write(XmlEvent::end_element())?; // D:prop
                w.write(XmlEvent::end_element())?; // D:propstat
            }

            w.write(XmlEvent::end_element())?; // D:response
            w.write(XmlEvent::end_element())?; // D:multistatus
        }
        Ok(out)
    }
}

fn write_propfind_response_element<W: std::io::Write>(
    w: &mut xml::writer::EventWriter<W>,
    protocol: &str,
    entry: &PropfindEntry,
    mode: PropfindMode,
) -> DavResult<()> {
    w.write(XmlEvent::start_element("D:response"))?;
    write_text_element(w, "D:href", &entry.href)?;

    w.write(XmlEvent::start_element("D:propstat"))?;
    write_text_element(w, "D:status", &status_line(protocol, StatusCode::OK))?;
    w.write(XmlEvent::start_element("D:prop"))?;

    write_prop_body(w, entry, mode)?;

    w.write(XmlEvent::end_element())?; // D:prop
    w.write(XmlEvent::end_element())?; // D:propstat
    w.write(XmlEvent::end_element())?; // D:response
    Ok(())
}

fn write_prop_body<W: std::io::Write>(
    w: &mut xml::writer::EventWriter<W>,
    entry: &PropfindEntry,
    mode: PropfindMode,
) -> DavResult<()> {
    let with_values = mode == PropfindMode::WithValues;

    write_maybe_text(w, "D:displayname", with_values.then_some(entry.href.as_str()))?;

    w.write(XmlEvent::start_element("D:resourcetype"))?;
    if entry.is_collection {
        w.write(XmlEvent::start_element("D:collection"))?;
        w.write(XmlEvent::end_element())?;
    }
    w.write(XmlEvent::end_element())?;

    if !entry.is_collection {
        if let Some(len) = entry.content_length {
            write_maybe_text(w, "D:getcontentlength", with_values.then(|| len.to_string()).as_deref())?;
        }
        if let Some(ct) = &entry.content_type {
            write_maybe_text(w, "D:getcontenttype", with_values.then_some(ct.as_str()))?;
        }
    }

    write_maybe_text(w, "D:creationdate", with_values.then(|| http_date(entry.creationdate)).as_deref())?;
    write_maybe_text(w, "D:getlastmodified", with_values.then(|| http_date(entry.lastmodified)).as_deref())?;

    w.write(XmlEvent::start_element("D:executable"))?;
    w.write(XmlEvent::end_element())?;

    for (name, ns, value) in &entry.dead_properties {
        let mut start = XmlEvent::start_element(name.as_str());
        if let Some(ns_uri) = ns {
            start = start.ns("", ns_uri.as_str());
        }
        w.write(start)?;
        if with_values {
            if let Ok(text) = std::str::from_utf8(value) {
                w.write(XmlEvent::characters(text))?;
            }
        }
        w.write(XmlEvent::end_element())?;
    }

    Ok(())
}

fn write_maybe_text<W: std::io::Write>(
    w: &mut xml::writer::EventWriter<W>,
    tag: &str,
    text: Option<&str>,
) -> DavResult<()> {
    w.write(XmlEvent::start_element(tag))?;
    if let Some(t) = text {
        w.write(XmlEvent::characters(t))?;
    }
    w.write(XmlEvent::end_element())?;
    Ok(())
}

fn write_text_element<W: std::io::Write>(w: &mut xml::writer::EventWriter<W>, tag: &str, text: &str) -> DavResult<()> {
    w.write(XmlEvent::start_element(tag))?;
    w.write(XmlEvent::characters(text))?;
    w.write(XmlEvent::end_element())?;
    Ok(())
}

fn status_line(protocol: &str, status: StatusCode) -> String {
    format!("{} {} {}", protocol, status.as_u16(), status.canonical_reason().unwrap_or(""))
}

/// HTTP-date formatting for `creationdate`/`getlastmodified`, via the same
/// `headers::Date` type the teacher uses.
pub fn http_date(t: SystemTime) -> String {
    let d = headers::Date::from(t);
    let mut v = Vec::new();
    d.encode(&mut v);
    v[0].to_str().unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn propfind_empty_body_defaults_to_with_values() {
        assert_eq!(XmlCodec::parse_propfind(b"").unwrap(), PropfindMode::WithValues);
    }

    #[test]
    fn propfind_propname_is_names_only() {
        let body = br#"<?xml version="1.0"?><propfind xmlns="DAV:"><propname/></propfind>"#;
        assert_eq!(XmlCodec::parse_propfind(body).unwrap(), PropfindMode::NamesOnly);
    }

    #[test]
    fn propfind_allprop_is_with_values() {
        let body = br#"<?xml version="1.0"?><propfind xmlns="DAV:"><allprop/></propfind>"#;
        assert_eq!(XmlCodec::parse_propfind(body).unwrap(), PropfindMode::WithValues);
    }

    #[test]
    fn propfind_wrong_root_is_error() {
        let body = br#"<?xml version="1.0"?><nonsense xmlns="DAV:"/>"#;
        assert!(XmlCodec::parse_propfind(body).is_err());
    }

    #[test]
    fn proppatch_parses_set_and_remove() {
        let body = br#"<?xml version="1.0"?>
            <propertyupdate xmlns="DAV:" xmlns:x="http://example.org/">
              <set><prop><x:color>red</x:color></prop></set>
              <remove><prop><x:color/></prop></remove>
            </propertyupdate>"#;
        let ops = XmlCodec::parse_proppatch(body).unwrap();
        assert_eq!(ops.len(), 2);
        match &ops[0] {
            PropUpdateOp::Set { local_name, namespace, value } => {
                assert_eq!(local_name, "color");
                assert_eq!(namespace.as_deref(), Some("http://example.org/"));
                assert_eq!(value, b"red");
            }
            _ => panic!("expected Set"),
        }
        assert!(matches!(ops[1], PropUpdateOp::Remove { .. }));
    }

    #[test]
    fn propfind_response_contains_href_and_resourcetype() {
        let entry = PropfindEntry {
            href: "/".to_string(),
            is_collection: true,
            content_length: None,
            content_type: None,
            creationdate: UNIX_EPOCH,
            lastmodified: UNIX_EPOCH,
            dead_properties: Vec::new(),
        };
        let xml = XmlCodec::build_propfind_response("HTTP/1.1", &[entry], PropfindMode::WithValues).unwrap();
        let text = String::from_utf8(xml).unwrap();
        assert!(text.contains("D:href"));
        assert!(text.contains("D:collection"));
        assert!(text.contains("D:multistatus"));
    }

    #[test]
    fn depth_zero_yields_single_response() {
        let entry = PropfindEntry {
            href: "/".to_string(),
            is_collection: true,
            content_length: None,
            content_type: None,
            creationdate: UNIX_EPOCH,
            lastmodified: UNIX_EPOCH,
            dead_properties: Vec::new(),
        };
        let xml = XmlCodec::build_propfind_response("HTTP/1.1", &[entry], PropfindMode::WithValues).unwrap();
        let text = String::from_utf8(xml).unwrap();
        assert_eq!(text.matches("<D:response>").count(), 1);
    }
}
