use std::fmt;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Reader};
use lettre::message::header::{ContentTransferEncoding, ContentType};
use lettre::message::{Attachment, Body, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::MailSettings;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to read report file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open workbook: {0}")]
    Workbook(String),

    #[error("Workbook has no sheets")]
    EmptyWorkbook,

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Invalid attachment content type: {0}")]
    ContentType(String),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Who sends, who receives, and the sender's application password
#[derive(Clone)]
pub struct Credentials {
    pub sender: String,
    pub recipient: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .field("password", &"***")
            .finish()
    }
}

/// Number of data rows in the first sheet, header excluded
pub fn count_data_rows(bytes: &[u8]) -> Result<usize, NotifyError> {
    let mut sheets = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| NotifyError::Workbook(e.to_string()))?;

    let range = sheets
        .worksheet_range_at(0)
        .ok_or(NotifyError::EmptyWorkbook)?
        .map_err(|e| NotifyError::Workbook(e.to_string()))?;

    Ok(range.height().saturating_sub(1))
}

/// Russian plural ending of "строк-" for `count` rows
pub fn row_suffix(count: usize) -> &'static str {
    if (11..=14).contains(&(count % 100)) || count % 10 > 5 || count % 5 == 0 {
        ""
    } else if count % 10 == 1 {
        "у"
    } else {
        "и"
    }
}

pub fn message_text(filename: &str, count: usize) -> String {
    format!(
        "Файл {} содержит {} строк{} с данными.",
        filename,
        count,
        row_suffix(count)
    )
}

pub fn default_subject(first_currency: &str, second_currency: &str) -> String {
    format!(
        "Курсы валют({first_currency}/RUB, {second_currency}/RUB, {second_currency}/{first_currency})"
    )
}

/// Mails a finished report as an attachment
pub struct Notifier {
    credentials: Credentials,
    settings: MailSettings,
}

impl Notifier {
    pub fn new(credentials: Credentials, settings: MailSettings) -> Self {
        Self {
            credentials,
            settings,
        }
    }

    /// Multipart message: row-count sentence plus the file, base64 encoded
    #[instrument(skip(self), fields(recipient = %self.credentials.recipient))]
    pub async fn build_message(&self, path: &Path, subject: &str) -> Result<Message, NotifyError> {
        let bytes = tokio::fs::read(path).await?;
        let rows = count_data_rows(&bytes)?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let text = message_text(&filename, rows);
        debug!("Message body: {}", text);

        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let content_type = ContentType::parse(mime.essence_str())
            .map_err(|e| NotifyError::ContentType(e.to_string()))?;
        debug!("Attaching {} ({} bytes) as {}", filename, bytes.len(), mime);

        // Base64 accepts any payload
        let body = Body::new_with_encoding(bytes, ContentTransferEncoding::Base64)
            .unwrap_or_else(Body::new);
        let attachment = Attachment::new(filename).body(body, content_type);

        let message = Message::builder()
            .from(self.credentials.sender.parse::<Mailbox>()?)
            .to(self.credentials.recipient.parse::<Mailbox>()?)
            .subject(subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(text))
                    .singlepart(attachment),
            )?;

        Ok(message)
    }

    #[instrument(skip(self), fields(host = %self.settings.host, port = self.settings.port))]
    pub async fn send_report(&self, path: &Path, subject: &str) -> Result<(), NotifyError> {
        let message = self.build_message(path, subject).await?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.settings.host)?
            .port(self.settings.port)
            .credentials(SmtpCredentials::new(
                self.credentials.sender.clone(),
                self.credentials.password.clone(),
            ))
            .build();

        debug!("Sending report to {}", self.credentials.recipient);
        let response = mailer.send(message).await?;
        info!(
            "Report {} sent to {} (SMTP {})",
            path.display(),
            self.credentials.recipient,
            response.code()
        );
        Ok(())
    }
}
