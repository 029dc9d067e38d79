//! TwiML messaging responses.
//!
//! Renders the markup Twilio expects in reply to an inbound message webhook:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?><Response><Message>Hi</Message></Response>
//! ```

use std::io::Cursor;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use wa_core::GatewayError;

/// A `<Message>` verb: body text plus optional `<Media>` attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    body: String,
    media: Vec<String>,
}

impl Message {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            media: Vec::new(),
        }
    }

    pub fn media(mut self, url: impl Into<String>) -> Self {
        self.media.push(url.into());
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn media_urls(&self) -> &[String] {
        &self.media
    }

    fn is_empty(&self) -> bool {
        self.body.is_empty() && self.media.is_empty()
    }
}

/// Root `<Response>` document returned to the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagingResponse {
    messages: Vec<Message>,
}

impl MessagingResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain text `<Message>`.
    pub fn message(self, body: impl Into<String>) -> Self {
        self.push(Message::new(body))
    }

    pub fn push(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Serialize the document. Only `&`, `<` and `>` are escaped in text.
    pub fn to_xml(&self) -> Result<String, GatewayError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;

        if self.is_empty() {
            writer
                .write_event(Event::Empty(empty_element("Response")))
                .map_err(xml_error)?;
        } else {
            writer
                .write_event(Event::Start(BytesStart::new("Response")))
                .map_err(xml_error)?;
            for message in &self.messages {
                write_message(&mut writer, message)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("Response")))
                .map_err(xml_error)?;
        }

        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| GatewayError::Unexpected(format!("twiml encoding: {}", e)))
    }
}

fn write_message(writer: &mut Writer<Cursor<Vec<u8>>>, message: &Message) -> Result<(), GatewayError> {
    if message.is_empty() {
        return writer
            .write_event(Event::Empty(empty_element("Message")))
            .map_err(xml_error);
    }
    writer
        .write_event(Event::Start(BytesStart::new("Message")))
        .map_err(xml_error)?;
    write_text(writer, &message.body)?;
    for url in &message.media {
        writer
            .write_event(Event::Start(BytesStart::new("Media")))
            .map_err(xml_error)?;
        write_text(writer, url)?;
        writer
            .write_event(Event::End(BytesEnd::new("Media")))
            .map_err(xml_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("Message")))
        .map_err(xml_error)
}

fn write_text(writer: &mut Writer<Cursor<Vec<u8>>>, text: &str) -> Result<(), GatewayError> {
    if text.is_empty() {
        return Ok(());
    }
    writer
        .write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))
        .map_err(xml_error)
}

/// Twilio's own libraries render empty elements as `<Name />`.
fn empty_element(name: &str) -> BytesStart<'static> {
    BytesStart::from_content(format!("{} ", name), name.len())
}

fn xml_error(e: quick_xml::Error) -> GatewayError {
    GatewayError::Unexpected(format!("twiml write: {}", e))
}
