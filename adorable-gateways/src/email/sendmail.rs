use adorable_core::entities::*;
use std::{
    io::{Error, ErrorKind, Result},
    thread,
};
#[cfg(not(test))]
use std::{
    io::prelude::*,
    process::{Command, Stdio},
};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use super::EmailGateway;

/// Hands e-mails over to the local `sendmail` binary.
#[derive(Debug, Clone)]
pub struct Sendmail {
    from: EmailAddress,
}

impl Sendmail {
    pub fn new(from: EmailAddress) -> Self {
        Self { from }
    }

    fn send(&self, mail: String) {
        thread::spawn(move || {
            if let Err(err) = send_raw(&mail) {
                log::warn!("Could not send e-mail: {err}");
            }
        });
    }
}

#[cfg(not(test))]
fn send_raw(mail: &str) -> Result<()> {
    let mut child = Command::new("sendmail")
        .arg("-t")
        .stdin(Stdio::piped())
        .spawn()?;
    child
        .stdin
        .as_mut()
        .ok_or_else(|| Error::new(ErrorKind::Other, "Could not get stdin"))?
        .write_all(mail.as_bytes())?;
    child.wait_with_output()?;
    Ok(())
}

/// Don't actually send e-mails while running the tests.
#[cfg(test)]
fn send_raw(email: &str) -> Result<()> {
    log::debug!("Would send e-mail: {email}");
    Ok(())
}

impl EmailGateway for Sendmail {
    fn compose_and_send(&self, recipients: &[EmailAddress], email: &EmailContent) {
        log::debug!("Sending e-mails to {} recipient(s)", recipients.len());
        for to in recipients {
            match compose(&self.from, std::slice::from_ref(to), email) {
                Ok(mail) => self.send(mail),
                Err(err) => log::warn!("Failed to compose e-mail: {err}"),
            }
        }
    }
}

// quoted_printable limits the length of lines to 76 chars
// and otherwise inserts unintended line breaks! The max.
// length of a header line is 78 chars including the \r\n
// line break.
const MAX_HEADER_FIELD_LEN: usize = 76;

const LINE_BREAK: &str = "\r\n";

fn encode_header_field_partially(input: &str, encoded_max_len: usize) -> (String, usize) {
    debug_assert!(encoded_max_len >= "=?UTF-8?Q??=".len());
    debug_assert!(encoded_max_len <= MAX_HEADER_FIELD_LEN);
    // Binary search for the longest prefix that fits
    let mut input_min_len = 0;
    let mut input_max_len = input.len() * 2;
    loop {
        let mut input_len = input_min_len + (input_max_len - input_min_len) / 2;
        while input_len > input.len() || !input.is_char_boundary(input_len) {
            input_len -= 1;
        }
        let encoded = format!(
            "=?UTF-8?Q?{}?=",
            quoted_printable::encode_to_str(input[..input_len].as_bytes())
        );
        if encoded.len() <= encoded_max_len {
            if input_len == input_min_len {
                return (encoded, input_len);
            }
            input_min_len = input_len;
        } else {
            debug_assert!(input_min_len < input_len);
            input_max_len = input_len;
        }
    }
}

fn encode_header_field(name: &str, input: &str) -> String {
    let mut prefix_len = name.len() + 1;
    let mut encoded_output = String::with_capacity(prefix_len + input.len() * 2);
    encoded_output.push_str(name);
    encoded_output.push(':');
    let mut input_len = 0;
    while input_len < input.len() {
        if input_len > 0 {
            // continuation line
            encoded_output.push_str(LINE_BREAK);
            encoded_output.push(' ');
            prefix_len = 1;
        }
        let (encoded_part, input_part_len) =
            encode_header_field_partially(&input[input_len..], MAX_HEADER_FIELD_LEN - prefix_len);
        debug_assert!(input_part_len > 0);
        encoded_output.push_str(&encoded_part);
        input_len += input_part_len;
    }
    encoded_output
}

pub fn compose(from: &EmailAddress, to: &[EmailAddress], email: &EmailContent) -> Result<String> {
    let to: Vec<_> = to
        .iter()
        .map(EmailAddress::as_str)
        .filter(|addr| addr.parse::<EmailAddress>().is_ok())
        .collect();
    if to.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "No valid email addresses specified",
        ));
    }
    let date = OffsetDateTime::now_utc()
        .format(&Rfc2822)
        .map_err(|err| Error::new(ErrorKind::Other, err))?;
    let mail = format!(
        "Date:{date}\r\n\
         From:{from}\r\n\
         To:{to}\r\n\
         {subject_header}\r\n\
         MIME-Version:1.0\r\n\
         Content-Type:text/plain;charset=utf-8\r\n\r\n\
         {body}",
        to = to.join(","),
        subject_header = encode_header_field("Subject", &email.subject),
        body = email.body
    );
    log::debug!("Composed e-mail: {mail}");
    Ok(mail)
}
