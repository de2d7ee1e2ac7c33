//! Raw message parsing

use crate::backend::RawMessageParser;
use crate::error::{Error, Result};
use crate::message::MessageRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mailparse::{DispositionType, MailHeaderMap, ParsedMail};

/// Parses raw RFC 5322 payloads into canonical records.
///
/// Extracts the headers the backing store indexes on (subject,
/// message-id, priority, from, to, date), the plain-text body, and
/// the filenames of attachment parts. Anything the payload lacks
/// stays unset on the record and picks up a default during ingestion.
#[derive(Debug, Default, Clone, Copy)]
pub struct MimeParser;

#[async_trait]
impl RawMessageParser for MimeParser {
    async fn parse(&self, raw: &[u8]) -> Result<MessageRecord> {
        let mail = mailparse::parse_mail(raw).map_err(|e| Error::Parse(e.to_string()))?;
        build_record(&mail)
    }
}

fn build_record(mail: &ParsedMail<'_>) -> Result<MessageRecord> {
    let headers = mail
        .headers
        .iter()
        .map(|h| (h.get_key(), h.get_value()))
        .collect();

    let date = mail
        .headers
        .get_first_value("Date")
        .and_then(|value| mailparse::dateparse(&value).ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    Ok(MessageRecord {
        text: body_text(mail)?,
        headers,
        subject: mail.headers.get_first_value("Subject"),
        message_id: mail.headers.get_first_value("Message-ID"),
        priority: mail.headers.get_first_value("X-Priority"),
        from: mail.headers.get_first_value("From"),
        to: mail.headers.get_all_values("To"),
        date,
        attached_files: attachment_names(mail),
        ..MessageRecord::default()
    })
}

/// The message's plain-text body: the root body for single-part text
/// messages, otherwise the first `text/plain` part found depth-first.
fn body_text(mail: &ParsedMail<'_>) -> Result<Option<String>> {
    if mail.subparts.is_empty() {
        if mail.ctype.mimetype.starts_with("text/") {
            let body = mail.get_body().map_err(|e| Error::Parse(e.to_string()))?;
            return Ok(Some(body));
        }
        return Ok(None);
    }
    for part in &mail.subparts {
        if part.ctype.mimetype == "text/plain" && part.subparts.is_empty() {
            let body = part.get_body().map_err(|e| Error::Parse(e.to_string()))?;
            return Ok(Some(body));
        }
        if let Some(body) = body_text(part)? {
            return Ok(Some(body));
        }
    }
    Ok(None)
}

/// Filenames of every part delivered as an attachment.
fn attachment_names(mail: &ParsedMail<'_>) -> Vec<String> {
    let mut names = Vec::new();
    collect_attachment_names(mail, &mut names);
    names
}

fn collect_attachment_names(mail: &ParsedMail<'_>, names: &mut Vec<String>) {
    for part in &mail.subparts {
        let disposition = part.get_content_disposition();
        if disposition.disposition == DispositionType::Attachment
            && let Some(filename) = disposition.params.get("filename")
        {
            names.push(filename.clone());
        }
        collect_attachment_names(part, names);
    }
}
