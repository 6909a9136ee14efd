use anyhow::{Context, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

pub const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
pub const DSQ_NS: &str = "http://www.disqus.com/";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const WP_NS: &str = "http://wordpress.org/export/1.0/";

/// `comment_parent` value for a top-level comment.
pub const NO_PARENT: &str = "0";

/// One `<wp:comment>` element.
///
/// Author e-mail, URL and IP are always written empty and the comment is
/// always marked approved, so they are not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportComment {
    pub id: String,
    pub author: String,
    /// Already formatted; empty when the source had no timestamp.
    pub date_gmt: String,
    /// Written as CDATA, never escaped.
    pub content: String,
    /// [`NO_PARENT`] for top-level comments, otherwise the thread root's id.
    pub parent: String,
}

impl ExportComment {
    pub const APPROVED: &'static str = "1";
}

/// A Disqus WXR import file for a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub title: String,
    pub link: String,
    pub thread_identifier: String,
    pub comments: Vec<ExportComment>,
}

impl ExportDocument {
    pub const COMMENT_STATUS: &'static str = "open";

    /// Serializes the document as a WXR (RSS 2.0 with WordPress extensions)
    /// string with an XML declaration.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .context("Failed to write XML declaration")?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        rss.push_attribute(("xmlns:content", CONTENT_NS));
        rss.push_attribute(("xmlns:dsq", DSQ_NS));
        rss.push_attribute(("xmlns:dc", DC_NS));
        rss.push_attribute(("xmlns:wp", WP_NS));
        writer
            .write_event(Event::Start(rss))
            .context("Failed to write rss element")?;
        writer
            .write_event(Event::Start(BytesStart::new("channel")))
            .context("Failed to write channel element")?;
        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .context("Failed to write item element")?;

        write_text_element(&mut writer, "title", &self.title)?;
        write_text_element(&mut writer, "link", &self.link)?;
        write_text_element(&mut writer, "content:encoded", "")?;
        write_text_element(&mut writer, "dsq:thread_identifier", &self.thread_identifier)?;
        write_text_element(&mut writer, "wp:post_date_gmt", "")?;
        write_text_element(&mut writer, "wp:comment_status", Self::COMMENT_STATUS)?;

        for comment in &self.comments {
            write_comment(&mut writer, comment)?;
        }

        for name in ["item", "channel", "rss"] {
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .with_context(|| format!("Failed to write {name} end"))?;
        }

        let result = writer.into_inner().into_inner();
        String::from_utf8(result).context("Generated WXR contains invalid UTF-8")
    }
}

fn write_comment(writer: &mut Writer<Cursor<Vec<u8>>>, comment: &ExportComment) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("wp:comment")))
        .context("Failed to write comment element")?;

    write_text_element(writer, "wp:comment_id", &comment.id)?;
    write_text_element(writer, "wp:comment_author", &comment.author)?;
    write_text_element(writer, "wp:comment_author_email", "")?;
    write_text_element(writer, "wp:comment_author_url", "")?;
    write_text_element(writer, "wp:comment_author_IP", "")?;
    write_text_element(writer, "wp:comment_date_gmt", &comment.date_gmt)?;

    writer
        .write_event(Event::Start(BytesStart::new("wp:comment_content")))
        .context("Failed to write comment_content element")?;
    write_cdata(writer, &comment.content)?;
    writer
        .write_event(Event::End(BytesEnd::new("wp:comment_content")))
        .context("Failed to write comment_content end")?;

    write_text_element(writer, "wp:comment_approved", ExportComment::APPROVED)?;
    write_text_element(writer, "wp:comment_parent", &comment.parent)?;

    writer
        .write_event(Event::End(BytesEnd::new("wp:comment")))
        .context("Failed to write comment end")?;
    Ok(())
}

/// Writes `<name>text</name>` on one line, escaping `text`. An empty text
/// event is still written so the indenter keeps the end tag inline.
fn write_text_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {name} element"))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .with_context(|| format!("Failed to write {name} text"))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {name} end"))?;
    Ok(())
}

/// CDATA cannot contain `]]>`, so the text is split across adjacent
/// sections at every occurrence. Readers concatenate them back.
fn write_cdata(writer: &mut Writer<Cursor<Vec<u8>>>, text: &str) -> Result<()> {
    let mut rest = text;
    while let Some(idx) = rest.find("]]>") {
        let (head, tail) = rest.split_at(idx + 2);
        writer
            .write_event(Event::CData(BytesCData::new(head)))
            .context("Failed to write CDATA section")?;
        rest = tail;
    }
    writer
        .write_event(Event::CData(BytesCData::new(rest)))
        .context("Failed to write CDATA section")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Reader;

    fn sample() -> ExportDocument {
        ExportDocument {
            title: "Hello & welcome".into(),
            link: "https://ignas.me/hello".into(),
            thread_identifier: "post-42".into(),
            comments: vec![
                ExportComment {
                    id: "c1".into(),
                    author: "Alice".into(),
                    date_gmt: "2017-03-20 12:13:14".into(),
                    content: "<b>bold</b> & raw".into(),
                    parent: NO_PARENT.into(),
                },
                ExportComment {
                    id: "c2".into(),
                    author: "Bob".into(),
                    date_gmt: "".into(),
                    content: "reply".into(),
                    parent: "c1".into(),
                },
            ],
        }
    }

    /// Collects (element name, text) pairs for every text or CDATA node.
    fn text_nodes(xml: &str) -> Vec<(String, String)> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut stack: Vec<String> = Vec::new();
        let mut out = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) => stack.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap()),
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(t) => out.push((
                    stack.last().cloned().unwrap_or_default(),
                    t.unescape().unwrap().into_owned(),
                )),
                Event::CData(c) => out.push((
                    stack.last().cloned().unwrap_or_default(),
                    String::from_utf8(c.into_inner().into_owned()).unwrap(),
                )),
                Event::Eof => break,
                _ => {}
            }
        }
        out
    }

    fn value_of<'a>(nodes: &'a [(String, String)], name: &str) -> Vec<&'a str> {
        nodes
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn test_header_and_namespaces() {
        let xml = sample().to_xml().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<rss version=\"2.0\""));
        assert!(xml.contains(&format!("xmlns:content=\"{CONTENT_NS}\"")));
        assert!(xml.contains(&format!("xmlns:dsq=\"{DSQ_NS}\"")));
        assert!(xml.contains(&format!("xmlns:dc=\"{DC_NS}\"")));
        assert!(xml.contains(&format!("xmlns:wp=\"{WP_NS}\"")));
    }

    #[test]
    fn test_item_fields() {
        let xml = sample().to_xml().unwrap();
        let nodes = text_nodes(&xml);

        assert_eq!(value_of(&nodes, "title"), ["Hello & welcome"]);
        assert_eq!(value_of(&nodes, "link"), ["https://ignas.me/hello"]);
        assert_eq!(value_of(&nodes, "dsq:thread_identifier"), ["post-42"]);
        assert_eq!(value_of(&nodes, "wp:comment_status"), ["open"]);
        // Empty elements carry no text node at all
        assert!(value_of(&nodes, "content:encoded").is_empty());
        assert!(value_of(&nodes, "wp:post_date_gmt").is_empty());
        assert!(xml.contains("<content:encoded></content:encoded>"));
        assert!(xml.contains("<wp:post_date_gmt></wp:post_date_gmt>"));
    }

    #[test]
    fn test_comment_fields() {
        let xml = sample().to_xml().unwrap();
        let nodes = text_nodes(&xml);

        assert_eq!(value_of(&nodes, "wp:comment_id"), ["c1", "c2"]);
        assert_eq!(value_of(&nodes, "wp:comment_author"), ["Alice", "Bob"]);
        assert_eq!(value_of(&nodes, "wp:comment_date_gmt"), ["2017-03-20 12:13:14"]);
        assert_eq!(value_of(&nodes, "wp:comment_approved"), ["1", "1"]);
        assert_eq!(value_of(&nodes, "wp:comment_parent"), ["0", "c1"]);
        assert!(xml.contains("<wp:comment_author_email></wp:comment_author_email>"));
        assert!(xml.contains("<wp:comment_author_IP></wp:comment_author_IP>"));
    }

    #[test]
    fn test_content_written_as_cdata() {
        let xml = sample().to_xml().unwrap();
        assert!(xml.contains("<![CDATA[<b>bold</b> & raw]]>"));
        assert!(xml.contains("<title>Hello &amp; welcome</title>"));
    }

    #[test]
    fn test_cdata_terminator_is_split() {
        let mut doc = sample();
        doc.comments.truncate(1);
        doc.comments[0].content = "a]]>b".into();

        let xml = doc.to_xml().unwrap();
        assert!(xml.contains("<![CDATA[a]]]]><![CDATA[>b]]>"));

        let nodes = text_nodes(&xml);
        let joined: String = value_of(&nodes, "wp:comment_content").concat();
        assert_eq!(joined, "a]]>b");
    }

    #[test]
    fn test_no_comments() {
        let mut doc = sample();
        doc.comments.clear();

        let xml = doc.to_xml().unwrap();
        assert!(!xml.contains("wp:comment>"));
        assert!(xml.trim_end().ends_with("</rss>"));
    }
}
