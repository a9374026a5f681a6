//! Loader for Qt Linguist `.ts` documents.
//!
//! The reader walks `quick-xml` events with one method per element level
//! (`TS` → `context` → `message` → text). Whitespace between elements is
//! ignored; any other stray text is a structural error.
//!
//! Unknown elements are skipped wholesale, so documents written by newer
//! extractors (with `userdata`, `extra-*`, `dependencies`, ...) still load.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Not well-formed XML | `Malformed` with the reader's position |
//! | Root is not `TS`, or lacks `language` | `Malformed` |
//! | `context` without `name` | `Malformed` |
//! | `message` without `source` or `translation` | `Malformed` |
//! | Repeated key in a context | `DuplicateMessage` |
//! | Unreadable file | `Io` |

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};
use tracing::debug;

use crate::catalog::{Catalog, CatalogBuilder};
use crate::error::CatalogError;
use crate::model::{Context, Location, Message, TranslationState};

/// Parse a catalog document held in memory.
pub fn load_str(document: &str) -> Result<Catalog, CatalogError> {
    let document = document.strip_prefix('\u{feff}').unwrap_or(document);
    let catalog = TsReader::new(document).read_document()?;
    debug!(
        language = catalog.language(),
        contexts = catalog.contexts().len(),
        messages = catalog.len(),
        "loaded translation catalog"
    );
    Ok(catalog)
}

/// Read and parse a catalog file.
pub fn load_path(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|err| CatalogError::io(path, &err))?;
    let document = String::from_utf8(bytes).map_err(|err| {
        CatalogError::malformed(err.utf8_error().valid_up_to(), "document is not valid UTF-8")
    })?;
    debug!(path = %path.display(), bytes = document.len(), "reading translation catalog");
    load_str(&document)
}

fn is_blank(text: &BytesText<'_>) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

struct TsReader<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> TsReader<'a> {
    fn new(document: &'a str) -> Self {
        let mut reader = Reader::from_str(document);
        reader.trim_text(false);
        Self { reader }
    }

    fn error(&self, reason: impl Into<String>) -> CatalogError {
        CatalogError::malformed(self.reader.buffer_position(), reason)
    }

    fn next(&mut self) -> Result<Event<'a>, CatalogError> {
        self.reader
            .read_event()
            .map_err(|err| CatalogError::malformed(self.reader.buffer_position(), err.to_string()))
    }

    fn attr(&self, start: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, CatalogError> {
        for attr in start.attributes() {
            let attr = attr.map_err(|err| self.error(err.to_string()))?;
            if attr.key.as_ref() == key {
                let value = attr
                    .unescape_value()
                    .map_err(|err| self.error(err.to_string()))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn skip(&mut self, start: &BytesStart<'_>) -> Result<(), CatalogError> {
        let name = start.name();
        self.reader
            .read_to_end(name)
            .map_err(|err| CatalogError::malformed(self.reader.buffer_position(), err.to_string()))?;
        Ok(())
    }

    fn read_document(mut self) -> Result<Catalog, CatalogError> {
        loop {
            match self.next()? {
                Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_) => {}
                Event::Text(text) if is_blank(&text) => {}
                Event::Start(start) if start.name().as_ref() == b"TS" => {
                    let mut builder = self.root(&start)?;
                    self.read_root(&mut builder)?;
                    self.expect_eof()?;
                    return builder.build();
                }
                Event::Empty(start) if start.name().as_ref() == b"TS" => {
                    let builder = self.root(&start)?;
                    self.expect_eof()?;
                    return builder.build();
                }
                Event::Eof => return Err(self.error("document has no <TS> root element")),
                Event::Start(start) | Event::Empty(start) => {
                    return Err(self.error(format!(
                        "root element must be <TS>, found <{}>",
                        tag_name(start.name().as_ref())
                    )));
                }
                _ => return Err(self.error("unexpected content before <TS>")),
            }
        }
    }

    fn root(&self, start: &BytesStart<'_>) -> Result<CatalogBuilder, CatalogError> {
        let language = self
            .attr(start, b"language")?
            .ok_or_else(|| self.error("<TS> is missing the language attribute"))?;
        let mut builder = CatalogBuilder::new(language);
        if let Some(source_language) = self.attr(start, b"sourcelanguage")? {
            builder.set_source_language(source_language);
        }
        if let Some(version) = self.attr(start, b"version")? {
            builder.set_version(version);
        }
        Ok(builder)
    }

    fn expect_eof(&mut self) -> Result<(), CatalogError> {
        loop {
            match self.next()? {
                Event::Eof => return Ok(()),
                Event::Comment(_) | Event::PI(_) => {}
                Event::Text(text) if is_blank(&text) => {}
                _ => return Err(self.error("unexpected content after </TS>")),
            }
        }
    }

    fn read_root(&mut self, builder: &mut CatalogBuilder) -> Result<(), CatalogError> {
        loop {
            match self.next()? {
                Event::Start(start) if start.name().as_ref() == b"context" => {
                    let context = self.read_context()?;
                    builder.push_context(context);
                }
                Event::Empty(start) if start.name().as_ref() == b"context" => {
                    return Err(self.error("<context> has no <name>"));
                }
                Event::Start(start) => self.skip(&start)?,
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.error("unterminated <TS>")),
                Event::Text(text) if !is_blank(&text) => {
                    return Err(self.error("unexpected text inside <TS>"));
                }
                _ => {}
            }
        }
    }

    fn read_context(&mut self) -> Result<Context, CatalogError> {
        let mut name = None;
        let mut messages = Vec::new();
        loop {
            match self.next()? {
                Event::Start(start) => match start.name().as_ref() {
                    b"name" => name = Some(self.read_text(b"name")?),
                    b"message" => {
                        let context = name.as_deref().unwrap_or("<unnamed>");
                        let numerus = self.attr(&start, b"numerus")?.as_deref() == Some("yes");
                        messages.push(self.read_message(context, numerus)?);
                    }
                    _ => self.skip(&start)?,
                },
                Event::Empty(start) => match start.name().as_ref() {
                    b"name" => name = Some(String::new()),
                    b"message" => return Err(self.error("<message> has no <source>")),
                    _ => {}
                },
                Event::End(_) => break,
                Event::Eof => return Err(self.error("unterminated <context>")),
                Event::Text(text) if !is_blank(&text) => {
                    return Err(self.error("unexpected text inside <context>"));
                }
                _ => {}
            }
        }
        let name = name.ok_or_else(|| self.error("<context> has no <name>"))?;
        Ok(Context { name, messages })
    }

    fn read_message(&mut self, context: &str, numerus: bool) -> Result<Message, CatalogError> {
        let mut message = Message {
            numerus,
            ..Message::default()
        };
        let mut source = None;
        let mut translation = None;

        loop {
            match self.next()? {
                Event::Empty(start) => match start.name().as_ref() {
                    b"location" => message.locations.push(self.location(&start)?),
                    b"source" => source = Some(String::new()),
                    b"comment" => message.comment = None,
                    b"translation" => {
                        message.state = self.translation_state(&start)?;
                        translation = Some(String::new());
                    }
                    _ => {}
                },
                Event::Start(start) => match start.name().as_ref() {
                    b"location" => {
                        message.locations.push(self.location(&start)?);
                        self.skip(&start)?;
                    }
                    b"source" => source = Some(self.read_text(b"source")?),
                    b"comment" => {
                        let comment = self.read_text(b"comment")?;
                        message.comment = (!comment.is_empty()).then_some(comment);
                    }
                    b"oldsource" => message.old_source = Some(self.read_text(b"oldsource")?),
                    b"oldcomment" => message.old_comment = Some(self.read_text(b"oldcomment")?),
                    b"extracomment" => {
                        message.extra_comment = Some(self.read_text(b"extracomment")?);
                    }
                    b"translatorcomment" => {
                        message.translator_comment = Some(self.read_text(b"translatorcomment")?);
                    }
                    b"translation" => {
                        message.state = self.translation_state(&start)?;
                        if numerus {
                            message.numerus_forms = self.read_numerus_forms()?;
                            translation = Some(String::new());
                        } else {
                            translation = Some(self.read_text(b"translation")?);
                        }
                    }
                    _ => self.skip(&start)?,
                },
                Event::End(_) => break,
                Event::Eof => return Err(self.error("unterminated <message>")),
                Event::Text(text) if !is_blank(&text) => {
                    return Err(self.error("unexpected text inside <message>"));
                }
                _ => {}
            }
        }

        message.source = source
            .ok_or_else(|| self.error(format!("message in context '{context}' has no <source>")))?;
        message.translation = translation.ok_or_else(|| {
            self.error(format!(
                "message '{}' in context '{context}' has no <translation>",
                message.source
            ))
        })?;
        Ok(message)
    }

    fn location(&self, start: &BytesStart<'_>) -> Result<Location, CatalogError> {
        Ok(Location {
            filename: self.attr(start, b"filename")?,
            line: self.attr(start, b"line")?,
        })
    }

    fn translation_state(&self, start: &BytesStart<'_>) -> Result<TranslationState, CatalogError> {
        match self.attr(start, b"type")? {
            None => Ok(TranslationState::Finished),
            Some(value) => TranslationState::from_attr(&value)
                .ok_or_else(|| self.error(format!("unknown translation type '{value}'"))),
        }
    }

    fn read_numerus_forms(&mut self) -> Result<Vec<String>, CatalogError> {
        let mut forms = Vec::new();
        loop {
            match self.next()? {
                Event::Start(start) if start.name().as_ref() == b"numerusform" => {
                    forms.push(self.read_text(b"numerusform")?);
                }
                Event::Empty(start) if start.name().as_ref() == b"numerusform" => {
                    forms.push(String::new());
                }
                Event::Start(start) => self.skip(&start)?,
                Event::End(_) => return Ok(forms),
                Event::Eof => return Err(self.error("unterminated <translation>")),
                Event::Text(text) if !is_blank(&text) => {
                    return Err(self.error("numerus <translation> holds text outside <numerusform>"));
                }
                _ => {}
            }
        }
    }

    /// Collect character data up to the end of `tag`, decoding `<byte/>`.
    fn read_text(&mut self, tag: &[u8]) -> Result<String, CatalogError> {
        let mut out = String::new();
        loop {
            match self.next()? {
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|err| self.error(err.to_string()))?;
                    out.push_str(&text);
                }
                Event::CData(data) => {
                    let data = std::str::from_utf8(&data)
                        .map_err(|_| self.error("CDATA section is not valid UTF-8"))?;
                    out.push_str(data);
                }
                Event::Empty(start) if start.name().as_ref() == b"byte" => {
                    out.push(self.byte_char(&start)?);
                }
                Event::Comment(_) => {}
                Event::End(_) => return Ok(out),
                Event::Eof => {
                    return Err(self.error(format!("unterminated <{}>", tag_name(tag))));
                }
                _ => {
                    return Err(self.error(format!(
                        "unexpected markup inside <{}>",
                        tag_name(tag)
                    )));
                }
            }
        }
    }

    /// `<byte value="x1b"/>` (hex) or `<byte value="27"/>` (decimal).
    fn byte_char(&self, start: &BytesStart<'_>) -> Result<char, CatalogError> {
        let value = self
            .attr(start, b"value")?
            .ok_or_else(|| self.error("<byte> is missing the value attribute"))?;
        let code = match value.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => value.parse().ok(),
        };
        code.and_then(char::from_u32)
            .ok_or_else(|| self.error(format!("invalid <byte> value '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resolution;

    fn doc(body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n\
             <TS version=\"2.1\" language=\"nl\" sourcelanguage=\"en\">\n{body}\n</TS>\n"
        )
    }

    #[test]
    fn loads_header_and_entities() {
        let catalog = load_str(&doc(
            "<context>\n    <name>GeometryShapes</name>\n    <message>\n        \
             <location filename=\"../geometry_shapes.py\" line=\"264\"/>\n        \
             <source>&amp;Geometry Shapes</source>\n        \
             <translation>&amp;Geometrievormen</translation>\n    </message>\n</context>",
        ))
        .unwrap();

        assert_eq!(catalog.language(), "nl");
        assert_eq!(catalog.source_language(), Some("en"));
        assert_eq!(catalog.version(), Some("2.1"));
        let message = &catalog.contexts()[0].messages[0];
        assert_eq!(message.source, "&Geometry Shapes");
        assert_eq!(message.translation, "&Geometrievormen");
        assert_eq!(message.locations, vec![Location::new("../geometry_shapes.py", 264)]);
    }

    #[test]
    fn keeps_surrounding_whitespace_in_text() {
        let catalog = load_str(&doc(
            "<context><name>A</name><message><source> x </source>\
             <translation> y </translation></message></context>",
        ))
        .unwrap();
        assert_eq!(catalog.lookup("A", " x ", None).unwrap(), " y ");
    }

    #[test]
    fn optional_fields_and_states() {
        let catalog = load_str(&doc(
            "<context><name>GeometryTool</name>\
             <message><source>Set size</source><comment>GeometryTool</comment>\
             <extracomment>dialog title</extracomment>\
             <translatorcomment>checked</translatorcomment>\
             <oldsource>Set Size</oldsource>\
             <translation type=\"unfinished\">Afmetingen instellen</translation></message>\
             <message><source>Old</source><translation type=\"vanished\">Oud</translation></message>\
             <message><source>Empty</source><translation type=\"unfinished\"/></message>\
             </context>",
        ))
        .unwrap();

        let messages = &catalog.contexts()[0].messages;
        assert_eq!(messages[0].comment.as_deref(), Some("GeometryTool"));
        assert_eq!(messages[0].extra_comment.as_deref(), Some("dialog title"));
        assert_eq!(messages[0].translator_comment.as_deref(), Some("checked"));
        assert_eq!(messages[0].old_source.as_deref(), Some("Set Size"));
        assert_eq!(messages[0].state, TranslationState::Unfinished);
        assert_eq!(messages[1].state, TranslationState::Vanished);
        assert_eq!(
            catalog.resolve("GeometryTool", "Old", None).unwrap(),
            Resolution::Missing
        );
        assert_eq!(
            catalog.resolve("GeometryTool", "Empty", None).unwrap(),
            Resolution::Untranslated
        );
    }

    #[test]
    fn numerus_forms() {
        let catalog = load_str(&doc(
            "<context><name>OvalGeometryTool</name>\
             <message numerus=\"yes\"><source>%n segment(s)</source>\
             <translation>\n<numerusform>%n segment</numerusform>\n\
             <numerusform>%n segmenten</numerusform>\n</translation></message></context>",
        ))
        .unwrap();
        let message = &catalog.contexts()[0].messages[0];
        assert!(message.numerus);
        assert_eq!(message.numerus_forms, vec!["%n segment", "%n segmenten"]);
        assert_eq!(
            catalog
                .lookup_numerus("OvalGeometryTool", "%n segment(s)", None, 3)
                .unwrap(),
            "%n segmenten"
        );
    }

    #[test]
    fn byte_elements_and_cdata() {
        let catalog = load_str(&doc(
            "<context><name>A</name><message><source>bell<byte value=\"x7\"/></source>\
             <translation><![CDATA[<b>]]>bel<byte value=\"7\"/></translation></message></context>",
        ))
        .unwrap();
        let message = &catalog.contexts()[0].messages[0];
        assert_eq!(message.source, "bell\u{7}");
        assert_eq!(message.translation, "<b>bel\u{7}");
    }

    #[test]
    fn skips_unknown_elements() {
        let catalog = load_str(&doc(
            "<dependencies><dependency catalog=\"qtbase\"/></dependencies>\
             <context><name>A</name><message id=\"a.b\"><source>x</source>\
             <userdata>opaque</userdata><extra-po-flags>c-format</extra-po-flags>\
             <translation>y</translation></message></context>",
        ))
        .unwrap();
        assert_eq!(catalog.lookup("A", "x", None).unwrap(), "y");
    }

    #[test]
    fn stale_locations_are_not_errors() {
        let catalog = load_str(&doc(
            "<context><name>GeometryTool</name>\
             <message><location filename=\"../t.py\" line=\"164\"/>\
             <location filename=\"../t.py\" line=\"164\"/>\
             <source>Add feature</source><translation>Object toevoegen</translation></message>\
             <message><location filename=\"../t.py\" line=\"164\"/>\
             <location line=\"+3\"/>\
             <source>No active polygon layer</source>\
             <translation>Geen actieve polygoonlaag</translation></message></context>",
        ))
        .unwrap();
        assert_eq!(catalog.contexts()[0].messages[0].locations.len(), 2);
        assert_eq!(
            catalog.contexts()[0].messages[1].locations[1],
            Location {
                filename: None,
                line: Some("+3".into())
            }
        );
    }

    #[test]
    fn empty_ts_root() {
        let catalog = load_str("<TS language=\"nl\"/>").unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.source_language(), None);
    }

    fn assert_malformed(document: &str, needle: &str) {
        match load_str(document) {
            Err(CatalogError::Malformed { reason, .. }) => {
                assert!(reason.contains(needle), "reason {reason:?} lacks {needle:?}");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn malformed_documents() {
        assert_malformed("", "no <TS> root");
        assert_malformed("<root/>", "root element must be <TS>");
        assert_malformed("<TS version=\"2.1\"></TS>", "language");
        assert_malformed(&doc("<context><message/></context>"), "no <source>");
        assert_malformed(
            &doc("<context><message><source>x</source><translation>y</translation></message></context>"),
            "<context> has no <name>",
        );
        assert_malformed(
            &doc("<context><name>A</name><message><source>x</source></message></context>"),
            "no <translation>",
        );
        assert_malformed(
            &doc("<context><name>A</name>stray</context>"),
            "unexpected text",
        );
        assert_malformed(
            &doc("<context><name>A</name><message><source>x</source>\
                  <translation type=\"done\">y</translation></message></context>"),
            "unknown translation type",
        );
        assert_malformed("<TS language=\"nl\"><context>", "unterminated");
        assert_malformed("<TS language=\"nl\"></TS><TS/>", "after </TS>");
    }

    #[test]
    fn mismatched_tags_are_malformed() {
        let err = load_str("<TS language=\"nl\"><context></TS>").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn duplicate_keys_fail_the_load() {
        let err = load_str(&doc(
            "<context><name>A</name>\
             <message><source>x</source><translation>1</translation></message>\
             <message><source>x</source><translation>2</translation></message></context>",
        ))
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateMessage { .. }));
    }

    #[test]
    fn empty_comment_elements_are_no_comment() {
        let catalog = load_str(&doc(
            "<context><name>GeometryTool</name>\
             <message><source>Radius</source><comment></comment>\
             <translation>Straal</translation></message>\
             <message><source>Segments</source><comment/>\
             <translation>Segmenten</translation></message></context>",
        ))
        .unwrap();
        let messages = &catalog.contexts()[0].messages;
        assert_eq!(messages[0].comment, None);
        assert_eq!(messages[1].comment, None);
        assert_eq!(catalog.lookup("GeometryTool", "Radius", None).unwrap(), "Straal");

        let err = load_str(&doc(
            "<context><name>GeometryTool</name>\
             <message><source>Set size</source><translation>A</translation></message>\
             <message><source>Set size</source><comment/>\
             <translation>B</translation></message></context>",
        ))
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateMessage {
                context: "GeometryTool".into(),
                source: "Set size".into(),
                comment: None,
            }
        );
    }

    #[test]
    fn load_path_reports_io_and_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("geometry_shapes_xx.ts");
        assert!(matches!(
            load_path(&missing),
            Err(CatalogError::Io {
                kind: std::io::ErrorKind::NotFound,
                ..
            })
        ));

        let latin1 = dir.path().join("latin1.ts");
        std::fs::write(&latin1, b"<TS language=\"nl\">\xe9</TS>").unwrap();
        assert!(load_path(&latin1).unwrap_err().is_malformed());
    }
}
