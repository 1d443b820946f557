//! Input cleaning shared by the user and task services.
//!
//! Errors are collected per field so a single response can report every
//! problem with a payload at once.

use super::{ServiceError, ServiceResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeMap, fmt};

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_EMAIL_LEN: usize = 254;
const MAX_EMAIL_LOCAL_LEN: usize = 64;
const MAX_DOMAIN_LABEL_LEN: usize = 63;

pub const REQUIRED: &str = "This field is required.";
pub const MAY_NOT_BE_NULL: &str = "This field may not be null.";
pub const MAY_NOT_BE_BLANK: &str = "This field may not be blank.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const DUPLICATE_EMAIL: &str = "user with this email already exists.";

pub fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

pub fn invalid_pk(id: i64) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

pub fn incorrect_pk_type(received: &str) -> String {
    format!("Incorrect type. Expected pk value, received {}.", received)
}

/// Field name -> list of messages, ordered by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> ServiceResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A JSON body field that distinguishes "absent" from an explicit `null`.
///
/// Use together with `#[serde(default)]` so absent keys become `Missing`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Field<T> {
    #[default]
    Missing,
    Null,
    Value(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Value(value),
            None => Field::Null,
        })
    }
}

impl<T> Field<T> {
    /// Must be present and non-null.
    pub fn required(self, field: &str, errors: &mut FieldErrors) -> Option<T> {
        match self {
            Field::Missing => {
                errors.add(field, REQUIRED);
                None
            }
            Field::Null => {
                errors.add(field, MAY_NOT_BE_NULL);
                None
            }
            Field::Value(value) => Some(value),
        }
    }

    /// May be absent, but not null.
    pub fn optional(self, field: &str, errors: &mut FieldErrors) -> Option<T> {
        match self {
            Field::Missing => None,
            Field::Null => {
                errors.add(field, MAY_NOT_BE_NULL);
                None
            }
            Field::Value(value) => Some(value),
        }
    }

    /// May be absent or null; `Some(None)` means "set to null".
    pub fn nullable(self) -> Option<Option<T>> {
        match self {
            Field::Missing => None,
            Field::Null => Some(None),
            Field::Value(value) => Some(Some(value)),
        }
    }
}

/// A related-object id as sent by clients: a JSON integer or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PkValue {
    Int(i64),
    Text(String),
    Other(serde_json::Value),
}

impl PkValue {
    /// Resolve to an id, recording a type error on `field` otherwise.
    pub fn resolve(self, field: &str, errors: &mut FieldErrors) -> Option<i64> {
        let received = match self {
            PkValue::Int(id) => return Some(id),
            PkValue::Text(raw) => match raw.trim().parse::<i64>() {
                Ok(id) => return Some(id),
                Err(_) => "str",
            },
            PkValue::Other(serde_json::Value::Bool(_)) => "bool",
            PkValue::Other(serde_json::Value::Number(n)) if n.is_f64() => "float",
            PkValue::Other(serde_json::Value::Number(_)) => "int",
            PkValue::Other(serde_json::Value::Array(_)) => "list",
            PkValue::Other(serde_json::Value::Object(_)) => "dict",
            PkValue::Other(_) => "str",
        };
        errors.add(field, incorrect_pk_type(received));
        None
    }
}

/// Trim a user name and check it is non-blank and within bounds.
pub fn clean_name(raw: &str, errors: &mut FieldErrors) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() {
        errors.add("name", MAY_NOT_BE_BLANK);
        return None;
    }
    if name.chars().count() > MAX_NAME_LEN {
        errors.add("name", too_long(MAX_NAME_LEN));
        return None;
    }
    Some(name.to_string())
}

/// Trim a task title and check it is non-blank and within bounds.
pub fn clean_title(raw: &str, errors: &mut FieldErrors) -> Option<String> {
    let title = raw.trim();
    if title.is_empty() {
        errors.add("title", MAY_NOT_BE_BLANK);
        return None;
    }
    if title.chars().count() > MAX_TITLE_LEN {
        errors.add("title", too_long(MAX_TITLE_LEN));
        return None;
    }
    Some(title.to_string())
}

/// Trim an email address and check its syntax and length.
pub fn clean_email(raw: &str, errors: &mut FieldErrors) -> Option<String> {
    let email = raw.trim();
    if email.is_empty() {
        errors.add("email", MAY_NOT_BE_BLANK);
        return None;
    }
    let mut ok = true;
    if !is_valid_email(email) {
        errors.add("email", INVALID_EMAIL);
        ok = false;
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        errors.add("email", too_long(MAX_EMAIL_LEN));
        ok = false;
    }
    ok.then(|| email.to_string())
}

/// Dot-atom local part, `@`, then a hostname with an alphabetic TLD
/// (or `localhost`).
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    is_valid_local_part(local) && is_valid_domain(domain)
}

fn is_valid_local_part(local: &str) -> bool {
    if local.is_empty() || local.len() > MAX_EMAIL_LOCAL_LEN {
        return false;
    }
    local.split('.').all(|atom| {
        !atom.is_empty()
            && atom
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~-".contains(c))
    })
}

fn is_valid_domain(domain: &str) -> bool {
    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_DOMAIN_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld = labels[labels.len() - 1];
    let tld_ok = tld.len() >= 2
        && (tld.chars().all(|c| c.is_ascii_alphabetic()) || tld.starts_with("xn--"));
    labels_ok && tld_ok
}
