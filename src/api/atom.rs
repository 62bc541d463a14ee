//! AtomPub envelopes sent to Hatena and the few response fields we read back

use crate::config::FOTOLIFE_SUBJECT_MAX_CHARS;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Wrap HTML in CDATA, splitting any `]]>` so the envelope stays well-formed.
pub fn cdata(content: &str) -> String {
    format!(
        "<![CDATA[{}]]>",
        content.replace("]]>", "]]]]><![CDATA[>")
    )
}

/// Blog entry envelope for create (POST) and update (PUT).
pub fn blog_entry_xml(title: &str, author: &str, html: &str, draft: bool) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<entry xmlns="http://www.w3.org/2005/Atom" xmlns:app="http://www.w3.org/2007/app">
    <title>{title}</title>
    <author><name>{author}</name></author>
    <content type="text/html">{content}</content>
    <app:control><app:draft>{draft}</app:draft></app:control>
</entry>"#,
        title = escape(title),
        author = escape(author),
        content = cdata(html),
        draft = if draft { "yes" } else { "no" },
    )
}

/// Fotolife upload envelope. `<dc:subject>` (the folder) is capped at 24 characters.
pub fn image_entry_xml(title: &str, encoded_image: &str) -> String {
    let subject: String = title.chars().take(FOTOLIFE_SUBJECT_MAX_CHARS).collect();
    format!(
        r#"<?xml version="1.0"?>
<entry xmlns="http://purl.org/atom/ns#" xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:subject>{subject}</dc:subject>
    <title>{title}</title>
    <content mode="base64" type="image/png">{encoded_image}</content>
</entry>"#,
        subject = escape(subject.as_str()),
        title = escape(title),
    )
}

fn name_matches(start: &BytesStart<'_>, name: &str) -> bool {
    if start.name().as_ref() == name.as_bytes() {
        return true;
    }
    !name.contains(':') && start.local_name().as_ref() == name.as_bytes()
}

/// Text of the first element called `name` (qualified, e.g. `hatena:imageurl`,
/// or a bare local name). Text and CDATA sections are concatenated.
pub fn element_text(xml: &str, name: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if depth > 0 {
                    depth += 1;
                } else if name_matches(e, name) {
                    depth = 1;
                }
            }
            Ok(Event::Empty(ref e)) if depth == 0 && name_matches(e, name) => {
                return Some(String::new());
            }
            Ok(Event::Text(ref e)) if depth > 0 => {
                text.push_str(&e.unescape().ok()?);
            }
            Ok(Event::CData(e)) if depth > 0 => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(_)) if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(text);
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// `href` of the first `<link rel="edit">`.
pub fn edit_link(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"link" =>
            {
                let mut rel = None;
                let mut href = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.as_ref() {
                        b"rel" => rel = Some(value),
                        b"href" => href = Some(value),
                        _ => {}
                    }
                }
                if rel.as_deref() == Some("edit") {
                    return href;
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Entry id is the last path segment of the edit link.
pub fn entry_id_from_edit_link(link: &str) -> Option<u64> {
    link.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}
