//! Serializer back to the `.ts` layout Linguist tools read and write.
//!
//! Element order inside `<message>` follows the extractor's own output so a
//! rewritten file diffs cleanly against the original. The extractor leaves
//! `<context>` flush with `<TS>` and indents everything below it by four
//! spaces, so whitespace is emitted as explicit text events rather than
//! through the writer's uniform indentation. Characters XML 1.0 cannot
//! carry (controls other than tab and newline) are written as
//! `<byte value="xNN"/>`, which [`crate::parse`] decodes again.

use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::model::{Context, Location, Message};

const INDENT: &str = "    ";

/// Render a catalog as a `.ts` document.
pub fn to_ts_string(catalog: &Catalog) -> Result<String, CatalogError> {
    let mut writer = TsWriter::new(256 + catalog.len() * 160);
    writer.document(catalog)?;
    writer.finish()
}

/// Write a catalog to `path`, replacing any existing file.
pub fn save_path(catalog: &Catalog, path: impl AsRef<Path>) -> Result<(), CatalogError> {
    let path = path.as_ref();
    let document = to_ts_string(catalog)?;
    std::fs::write(path, &document).map_err(|err| CatalogError::io(path, &err))?;
    debug!(
        path = %path.display(),
        language = catalog.language(),
        messages = catalog.len(),
        "wrote translation catalog"
    );
    Ok(())
}

struct TsWriter {
    xml: Writer<Vec<u8>>,
}

impl TsWriter {
    fn new(capacity: usize) -> Self {
        Self {
            xml: Writer::new(Vec::with_capacity(capacity)),
        }
    }

    fn finish(self) -> Result<String, CatalogError> {
        String::from_utf8(self.xml.into_inner())
            .map_err(|err| CatalogError::Serialize(err.to_string()))
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), CatalogError> {
        self.xml
            .write_event(event)
            .map_err(|err| CatalogError::Serialize(err.to_string()))
    }

    fn document(&mut self, catalog: &Catalog) -> Result<(), CatalogError> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        self.newline(0)?;
        self.event(Event::DocType(BytesText::from_escaped("TS")))?;
        self.newline(0)?;

        let mut root = BytesStart::new("TS");
        if let Some(version) = catalog.version() {
            root.push_attribute(("version", version));
        }
        root.push_attribute(("language", catalog.language()));
        if let Some(source_language) = catalog.source_language() {
            root.push_attribute(("sourcelanguage", source_language));
        }
        self.event(Event::Start(root))?;

        for context in catalog.contexts() {
            self.context(context)?;
        }
        self.newline(0)?;
        self.event(Event::End(BytesEnd::new("TS")))?;
        self.newline(0)
    }

    fn context(&mut self, context: &Context) -> Result<(), CatalogError> {
        self.newline(0)?;
        self.event(Event::Start(BytesStart::new("context")))?;
        self.element(1, "name", &context.name)?;
        for message in &context.messages {
            self.message(message)?;
        }
        self.newline(0)?;
        self.event(Event::End(BytesEnd::new("context")))
    }

    fn message(&mut self, message: &Message) -> Result<(), CatalogError> {
        let mut start = BytesStart::new("message");
        if message.numerus {
            start.push_attribute(("numerus", "yes"));
        }
        self.newline(1)?;
        self.event(Event::Start(start))?;

        for location in &message.locations {
            self.location(location)?;
        }
        self.element(2, "source", &message.source)?;
        self.optional("oldsource", message.old_source.as_deref())?;
        self.optional("comment", message.comment.as_deref())?;
        self.optional("oldcomment", message.old_comment.as_deref())?;
        self.optional("extracomment", message.extra_comment.as_deref())?;
        self.optional("translatorcomment", message.translator_comment.as_deref())?;

        let mut translation = BytesStart::new("translation");
        if let Some(kind) = message.state.as_attr() {
            translation.push_attribute(("type", kind));
        }
        self.newline(2)?;
        self.event(Event::Start(translation))?;
        if message.numerus {
            for form in &message.numerus_forms {
                self.element(3, "numerusform", form)?;
            }
            self.newline(2)?;
        } else {
            self.text(&message.translation)?;
        }
        self.event(Event::End(BytesEnd::new("translation")))?;

        self.newline(1)?;
        self.event(Event::End(BytesEnd::new("message")))
    }

    fn location(&mut self, location: &Location) -> Result<(), CatalogError> {
        let mut empty = BytesStart::new("location");
        if let Some(filename) = &location.filename {
            empty.push_attribute(("filename", filename.as_str()));
        }
        if let Some(line) = &location.line {
            empty.push_attribute(("line", line.as_str()));
        }
        self.newline(2)?;
        self.event(Event::Empty(empty))
    }

    fn optional(&mut self, tag: &str, value: Option<&str>) -> Result<(), CatalogError> {
        match value {
            Some(value) => self.element(2, tag, value),
            None => Ok(()),
        }
    }

    fn element(&mut self, depth: usize, tag: &str, text: &str) -> Result<(), CatalogError> {
        self.newline(depth)?;
        self.event(Event::Start(BytesStart::new(tag)))?;
        self.text(text)?;
        self.event(Event::End(BytesEnd::new(tag)))
    }

    /// Line break followed by `depth` levels of indentation.
    fn newline(&mut self, depth: usize) -> Result<(), CatalogError> {
        let whitespace = format!("\n{}", INDENT.repeat(depth));
        self.event(Event::Text(BytesText::from_escaped(whitespace)))
    }

    /// Escaped text, with forbidden control characters as `<byte/>`.
    fn text(&mut self, text: &str) -> Result<(), CatalogError> {
        let mut rest = text;
        while let Some(pos) = rest.find(needs_byte_element) {
            self.plain(&rest[..pos])?;
            let Some(ch) = rest[pos..].chars().next() else {
                break;
            };
            let value = format!("x{:x}", u32::from(ch));
            let byte = BytesStart::new("byte").with_attributes([("value", value.as_str())]);
            self.event(Event::Empty(byte))?;
            rest = &rest[pos + ch.len_utf8()..];
        }
        self.plain(rest)
    }

    fn plain(&mut self, text: &str) -> Result<(), CatalogError> {
        if text.is_empty() {
            return Ok(());
        }
        self.event(Event::Text(BytesText::new(text)))
    }
}

fn needs_byte_element(ch: char) -> bool {
    ch.is_control() && u32::from(ch) < 0x20 && ch != '\t' && ch != '\n'
}
