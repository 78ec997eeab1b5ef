use std::{fmt, str::FromStr};
use thiserror::Error;

/// A parsed mailbox, optionally with a display name.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EmailAddress {
    address: String,
    display_name: Option<String>,
}

impl EmailAddress {
    pub const fn new_unchecked(address: String) -> Self {
        Self {
            address,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn into_string(self) -> String {
        self.address
    }

    pub fn as_str(&self) -> &str {
        self.address.as_str()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

#[derive(Debug, Error)]
#[error("Invalid e-mail address")]
pub struct EmailAddressParseError;

impl FromStr for EmailAddress {
    type Err = EmailAddressParseError;
    fn from_str(s: &str) -> Result<EmailAddress, Self::Err> {
        let info = mailparse::addrparse(s.trim())
            .ok()
            .and_then(|list| list.extract_single_info())
            .ok_or(EmailAddressParseError)?;
        let address = info.addr.to_lowercase();
        let at = address.find('@').ok_or(EmailAddressParseError)?;
        if at == 0 || at + 1 == address.len() {
            return Err(EmailAddressParseError);
        }
        Ok(Self {
            address,
            display_name: info.display_name,
        })
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let EmailAddress {
            address,
            display_name,
        } = self;
        if let Some(display_name) = &display_name {
            write!(
                f,
                r#""{display_name}" <{address}>"#,
                display_name = display_name.replace('"', r#"\""#)
            )
        } else {
            write!(f, "{address}")
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_address() {
        let addr: EmailAddress = "Alice@Example.com".parse().unwrap();
        assert_eq!("alice@example.com", addr.as_str());
        assert!(addr.display_name().is_none());
    }

    #[test]
    fn parse_with_display_name() {
        let addr: EmailAddress = r#""Alice A." <alice@example.com>"#.parse().unwrap();
        assert_eq!("alice@example.com", addr.as_str());
        assert_eq!(Some("Alice A."), addr.display_name());
        assert_eq!(r#""Alice A." <alice@example.com>"#, addr.to_string());
    }

    #[test]
    fn reject_invalid_addresses() {
        assert!("".parse::<EmailAddress>().is_err());
        assert!("no-at-sign".parse::<EmailAddress>().is_err());
        assert!("@example.com".parse::<EmailAddress>().is_err());
    }
}
