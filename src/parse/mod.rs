use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use thiserror::Error;

use crate::schema::ItemSchema;

/// One result entry parsed from the XML endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: String,
    pub poster_path: String,
    pub title: String,
    pub release_label: String,
    pub watchable: bool,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid XML at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("invalid attribute on <{tag}>: {message}")]
    Attribute { tag: String, message: String },

    #[error("<{tag}> #{index} is missing required <{field}>")]
    MissingField {
        tag: String,
        index: usize,
        field: &'static str,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Id,
    Poster,
    Title,
    Label,
}

fn field_for(name: &[u8], schema: &ItemSchema) -> Option<Field> {
    if name == b"id" {
        Some(Field::Id)
    } else if name == b"title" {
        Some(Field::Title)
    } else if name == schema.poster_tag.as_bytes() {
        Some(Field::Poster)
    } else if name == schema.label_tag.as_bytes() {
        Some(Field::Label)
    } else {
        None
    }
}

#[derive(Default)]
struct ItemBuilder {
    watchable: bool,
    id: Option<String>,
    poster: Option<String>,
    title: Option<String>,
    label: Option<String>,
    open: Option<(Field, String)>,
}

impl ItemBuilder {
    fn from_start(start: &BytesStart, schema: &ItemSchema) -> Result<Self, ParseError> {
        let mut builder = ItemBuilder::default();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::Attribute {
                tag: schema.item_tag.clone(),
                message: e.to_string(),
            })?;
            if attr.key.as_ref() == b"watchable" {
                let value = attr.unescape_value().map_err(|e| ParseError::Attribute {
                    tag: schema.item_tag.clone(),
                    message: e.to_string(),
                })?;
                builder.watchable = value == "true";
            }
        }
        Ok(builder)
    }

    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Id => &mut self.id,
            Field::Poster => &mut self.poster,
            Field::Title => &mut self.title,
            Field::Label => &mut self.label,
        }
    }

    fn open(&mut self, field: Field) {
        if self.open.is_none() && self.slot(field).is_none() {
            self.open = Some((field, String::new()));
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some((_, buf)) = self.open.as_mut() {
            buf.push_str(text);
        }
    }

    fn close(&mut self, field: Field) {
        if let Some((open_field, text)) = self.open.take() {
            if open_field == field {
                *self.slot(field) = Some(text);
            } else {
                self.open = Some((open_field, text));
            }
        }
    }

    // first occurrence wins, like a lookup of the first matching descendant
    fn set_empty(&mut self, field: Field) {
        if self.open.is_none() {
            let slot = self.slot(field);
            if slot.is_none() {
                *slot = Some(String::new());
            }
        }
    }

    fn finish(self, schema: &ItemSchema, index: usize) -> Result<Item, ParseError> {
        let missing = |field: &'static str| ParseError::MissingField {
            tag: schema.item_tag.clone(),
            index,
            field,
        };
        Ok(Item {
            id: self.id.ok_or_else(|| missing("id"))?,
            title: self.title.ok_or_else(|| missing("title"))?,
            poster_path: self.poster.unwrap_or_default(),
            release_label: self.label.unwrap_or_default(),
            watchable: self.watchable,
        })
    }
}

/// Parses every result element of `schema.item_tag` in document order.
///
/// A result element without `id` or `title` fails the whole payload; nothing
/// from a malformed response is returned.
pub fn parse_items(xml: &str, schema: &ItemSchema) -> Result<Vec<Item>, ParseError> {
    let mut reader = Reader::from_str(xml);

    let item_tag = schema.item_tag.as_bytes();
    let mut items = Vec::new();
    let mut pending: Option<ItemBuilder> = None;
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(ParseError::Syntax {
                    position: reader.buffer_position(),
                    message: e.to_string(),
                })
            }
            Ok(Event::Start(ref e)) => {
                depth += 1;
                if let Some(builder) = pending.as_mut() {
                    if let Some(field) = field_for(e.name().as_ref(), schema) {
                        builder.open(field);
                    }
                } else if e.name().as_ref() == item_tag {
                    pending = Some(ItemBuilder::from_start(e, schema)?);
                }
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(builder) = pending.as_mut() {
                    if let Some(field) = field_for(e.name().as_ref(), schema) {
                        builder.set_empty(field);
                    }
                } else if e.name().as_ref() == item_tag {
                    let builder = ItemBuilder::from_start(e, schema)?;
                    items.push(builder.finish(schema, items.len())?);
                }
            }
            Ok(Event::Text(ref t)) => {
                if let Some(builder) = pending.as_mut() {
                    let text = t.unescape().map_err(|e| ParseError::Syntax {
                        position: reader.buffer_position(),
                        message: e.to_string(),
                    })?;
                    builder.push_text(&text);
                }
            }
            Ok(Event::CData(ref c)) => {
                if let Some(builder) = pending.as_mut() {
                    builder.push_text(&String::from_utf8_lossy(c));
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                if e.name().as_ref() == item_tag {
                    if let Some(builder) = pending.take() {
                        items.push(builder.finish(schema, items.len())?);
                    }
                } else if let Some(builder) = pending.as_mut() {
                    if let Some(field) = field_for(e.name().as_ref(), schema) {
                        builder.close(field);
                    }
                }
            }
            Ok(Event::Eof) => {
                if depth > 0 || pending.is_some() {
                    return Err(ParseError::Syntax {
                        position: reader.buffer_position(),
                        message: "unexpected end of document".to_string(),
                    });
                }
                break;
            }
            Ok(_) => {}
        }
        buf.clear();
    }

    Ok(items)
}
