// dmail – outbound mail composition and DKIM signing
// Copyright © 2022–2023 David Bürgin <dbuergin@gluet.ch>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

//! Composition of outgoing mail.

use crate::{
    header::HeaderFieldError,
    message::{Message, MessageConfig},
    signer::{Signer, SignerError},
};
use chrono::{DateTime, Utc};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};
use tracing::{debug, trace};

/// An email address with optional display name.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Address {
    pub address: String,
    pub name: String,
}

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: String::new(),
        }
    }

    pub fn with_name(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }

    /// Whether the address has the form `local@domain` with non-empty parts.
    pub fn is_valid(&self) -> bool {
        let mut parts = self.address.split('@');
        matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
        )
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// A mail to be composed into a [`Message`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Mail {
    pub from: Address,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub subject: String,
    pub body: String,
    /// The value of the *Date* header; the current time if absent.
    pub date: Option<DateTime<Utc>>,
}

impl Mail {
    pub fn new(
        from: impl Into<Address>,
        to: impl IntoIterator<Item = Address>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into_iter().collect(),
            cc: vec![],
            subject: subject.into(),
            body: body.into(),
            date: None,
        }
    }
}

/// An error that occurs when composing a message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MessageError {
    InvalidFromAddress,
    InvalidRecipientAddress(String),
    Header(HeaderFieldError),
    Signing(SignerError),
}

impl Display for MessageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFromAddress => write!(f, "invalid from address"),
            Self::InvalidRecipientAddress(addr) => write!(f, "invalid recipient address {addr}"),
            Self::Header(_) => write!(f, "invalid header field"),
            Self::Signing(_) => write!(f, "failed to sign message"),
        }
    }
}

impl Error for MessageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Header(e) => Some(e),
            Self::Signing(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HeaderFieldError> for MessageError {
    fn from(error: HeaderFieldError) -> Self {
        Self::Header(error)
    }
}

impl From<SignerError> for MessageError {
    fn from(error: SignerError) -> Self {
        Self::Signing(error)
    }
}

/// Composes a mail into a message. If a signer is given, the message is
/// signed and the *DKIM-Signature* header is placed at the top.
pub fn compose(
    mail: &Mail,
    config: &MessageConfig,
    signer: Option<&Signer>,
) -> Result<Message, MessageError> {
    if !mail.from.is_valid() {
        return Err(MessageError::InvalidFromAddress);
    }
    if let Some(rcpt) = mail.to.iter().chain(&mail.cc).find(|a| !a.is_valid()) {
        return Err(MessageError::InvalidRecipientAddress(rcpt.address.clone()));
    }

    let mut message = Message::new(config.clone());

    message.add_content_type()?;
    message.add_transfer_encoding_header()?;
    match &mail.date {
        Some(date) => message.add_date_header("Date", date)?,
        None => message.add_date()?,
    }

    message.add_address_header("From", &mail.from.address, &mail.from.name)?;
    for rcpt in &mail.to {
        message.add_address_header("To", &rcpt.address, &rcpt.name)?;
    }
    for rcpt in &mail.cc {
        message.add_address_header("Cc", &rcpt.address, &rcpt.name)?;
    }
    message.add_text_header("Subject", &mail.subject)?;
    message.set_body(mail.body.as_str());

    trace!(headers = message.headers().len(), "message composed");

    if let Some(signer) = signer {
        let result = signer.sign_message(&message)?;
        message.prepend_header(result.to_header_field()?);

        debug!(from = %mail.from.address, "DKIM-Signature header added");
    }

    Ok(message)
}
