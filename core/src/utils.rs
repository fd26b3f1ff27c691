//! Utility functions and types.

use std::fmt::{Debug, Display, Formatter};

/// `Authorization` schemes kept readable by [`Redact`].
const AUTH_SCHEMES: [&str; 3] = ["Bearer ", "SharedKey ", "Basic "];

/// Secrets shorter than this are hidden completely.
const MIN_PARTIAL_LEN: usize = 12;

/// Mask a secret for logs and `Debug` output.
///
/// Secrets of 12 chars or more keep their first and last three chars so two
/// values can still be told apart, shorter ones become `***`. A leading
/// `Authorization` scheme such as `Bearer ` stays visible.
#[derive(Clone, Copy)]
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        Redact(value.as_deref().unwrap_or_default())
    }
}

impl<'a> From<&'a http::HeaderValue> for Redact<'a> {
    fn from(value: &'a http::HeaderValue) -> Self {
        Redact(value.to_str().unwrap_or_default())
    }
}

fn mask(f: &mut Formatter<'_>, secret: &str) -> std::fmt::Result {
    let len = secret.len();
    if len < MIN_PARTIAL_LEN || !secret.is_char_boundary(3) || !secret.is_char_boundary(len - 3) {
        return f.write_str("***");
    }
    write!(f, "{}***{}", &secret[..3], &secret[len - 3..])
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return f.write_str("EMPTY");
        }

        match AUTH_SCHEMES.iter().find(|s| self.0.starts_with(*s)) {
            Some(scheme) => {
                f.write_str(scheme)?;
                mask(f, &self.0[scheme.len()..])
            }
            None => mask(f, self.0),
        }
    }
}

impl Display for Redact<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}
