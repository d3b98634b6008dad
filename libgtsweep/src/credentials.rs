//! Credential types for the Twitter API
//!
//! Credentials are collected in two stages. Command-line overrides and the
//! config file each produce a [`PartialCredentials`]; the two are merged with
//! [`PartialCredentials::or`] and then checked once with
//! [`PartialCredentials::complete`]. Only a complete set can become a
//! [`CredentialSet`], which is what the API client is built from.
//!
//! # Example
//!
//! ```
//! use libgtsweep::credentials::{CredentialField, PartialCredentials};
//!
//! let overrides = PartialCredentials::default()
//!     .with(CredentialField::ConsumerKey, Some("from-flag".to_string()));
//! let file = PartialCredentials::default()
//!     .with(CredentialField::User, Some("alice".to_string()))
//!     .with(CredentialField::ConsumerKey, Some("from-file".to_string()));
//!
//! let merged = overrides.or(file);
//! assert_eq!(merged.get(CredentialField::ConsumerKey), Some("from-flag"));
//! assert!(merged.complete().is_err());
//! ```

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, Result};

/// Number of leading characters shown when a secret is printed
pub const MASK_PREFIX_LEN: usize = 4;

/// One of the five values needed to talk to the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    User,
    ConsumerKey,
    ConsumerSecret,
    AccessToken,
    AccessSecret,
}

impl CredentialField {
    pub const ALL: [CredentialField; 5] = [
        CredentialField::User,
        CredentialField::ConsumerKey,
        CredentialField::ConsumerSecret,
        CredentialField::AccessToken,
        CredentialField::AccessSecret,
    ];

    /// The marker used for this field in the config file
    pub fn key(&self) -> &'static str {
        match self {
            CredentialField::User => "user",
            CredentialField::ConsumerKey => "consumer-key",
            CredentialField::ConsumerSecret => "consumer-secret",
            CredentialField::AccessToken => "access-token",
            CredentialField::AccessSecret => "access-secret",
        }
    }

    /// Human-readable name used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            CredentialField::User => "username",
            CredentialField::ConsumerKey => "consumer key",
            CredentialField::ConsumerSecret => "consumer secret",
            CredentialField::AccessToken => "access token",
            CredentialField::AccessSecret => "access secret",
        }
    }

    /// Whether the value must be masked when printed
    pub fn is_sensitive(&self) -> bool {
        !matches!(self, CredentialField::User)
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Mask a secret down to a short prefix
///
/// Values no longer than [`MASK_PREFIX_LEN`] characters are hidden entirely,
/// otherwise the prefix would be the whole secret.
pub fn mask(value: &str) -> String {
    if value.chars().count() <= MASK_PREFIX_LEN {
        return "****".to_string();
    }
    let prefix: String = value.chars().take(MASK_PREFIX_LEN).collect();
    format!("{}...", prefix)
}

/// Credentials that are still being assembled
///
/// Empty strings are stored as `None`, so an empty flag value never shadows a
/// value from the config file.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PartialCredentials {
    user: Option<String>,
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    access_token: Option<String>,
    access_secret: Option<String>,
}

impl PartialCredentials {
    fn slot(&self, field: CredentialField) -> &Option<String> {
        match field {
            CredentialField::User => &self.user,
            CredentialField::ConsumerKey => &self.consumer_key,
            CredentialField::ConsumerSecret => &self.consumer_secret,
            CredentialField::AccessToken => &self.access_token,
            CredentialField::AccessSecret => &self.access_secret,
        }
    }

    fn slot_mut(&mut self, field: CredentialField) -> &mut Option<String> {
        match field {
            CredentialField::User => &mut self.user,
            CredentialField::ConsumerKey => &mut self.consumer_key,
            CredentialField::ConsumerSecret => &mut self.consumer_secret,
            CredentialField::AccessToken => &mut self.access_token,
            CredentialField::AccessSecret => &mut self.access_secret,
        }
    }

    pub fn get(&self, field: CredentialField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Set a field, overwriting any earlier value
    pub fn set(&mut self, field: CredentialField, value: impl Into<String>) {
        let value = value.into();
        *self.slot_mut(field) = if value.is_empty() { None } else { Some(value) };
    }

    /// Builder form of [`set`](Self::set) that ignores `None`
    pub fn with(mut self, field: CredentialField, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.set(field, value);
        }
        self
    }

    pub fn is_complete(&self) -> bool {
        CredentialField::ALL.iter().all(|f| self.get(*f).is_some())
    }

    /// Fields that are still empty, in canonical order
    pub fn missing(&self) -> Vec<CredentialField> {
        CredentialField::ALL
            .iter()
            .copied()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// Fill every empty field from `fallback`; fields already set are kept
    pub fn or(mut self, fallback: PartialCredentials) -> Self {
        for field in CredentialField::ALL {
            let slot = self.slot_mut(field);
            if slot.is_none() {
                *slot = fallback.slot(field).clone();
            }
        }
        self
    }

    /// Present/missing summary with sensitive values masked
    pub fn report(&self) -> CredentialReport {
        let entries = CredentialField::ALL
            .iter()
            .map(|field| {
                let shown = self.get(*field).map(|value| {
                    if field.is_sensitive() {
                        mask(value)
                    } else {
                        value.to_string()
                    }
                });
                (*field, shown)
            })
            .collect();
        CredentialReport { entries }
    }

    /// Turn the collected values into a usable [`CredentialSet`]
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::IncompleteCredentials` listing every field when
    /// any of them is still empty.
    pub fn complete(self) -> Result<CredentialSet> {
        match self {
            PartialCredentials {
                user: Some(username),
                consumer_key: Some(consumer_key),
                consumer_secret: Some(consumer_secret),
                access_token: Some(access_token),
                access_secret: Some(access_secret),
            } => Ok(CredentialSet {
                username,
                consumer_key,
                consumer_secret: SecretString::from(consumer_secret),
                access_token,
                access_secret: SecretString::from(access_secret),
            }),
            incomplete => Err(ConfigError::IncompleteCredentials(incomplete.report()).into()),
        }
    }
}

impl fmt::Debug for PartialCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialCredentials")
            .field("report", &self.report())
            .finish()
    }
}

/// Diagnostic listing of which credential fields were found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialReport {
    entries: Vec<(CredentialField, Option<String>)>,
}

impl CredentialReport {
    pub fn missing(&self) -> impl Iterator<Item = CredentialField> + '_ {
        self.entries
            .iter()
            .filter(|(_, shown)| shown.is_none())
            .map(|(field, _)| *field)
    }

    pub fn present(&self) -> impl Iterator<Item = (CredentialField, &str)> + '_ {
        self.entries
            .iter()
            .filter_map(|(field, shown)| shown.as_deref().map(|s| (*field, s)))
    }
}

impl fmt::Display for CredentialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, shown)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match shown {
                Some(value) => write!(f, "  have {} '{}'", field.label(), value)?,
                None => write!(f, "  missing {}", field.label())?,
            }
        }
        Ok(())
    }
}

/// A complete, validated set of API credentials
///
/// Only obtainable through [`PartialCredentials::complete`], so holding one
/// means every field is non-empty.
pub struct CredentialSet {
    username: String,
    consumer_key: String,
    consumer_secret: SecretString,
    access_token: String,
    access_secret: SecretString,
}

impl CredentialSet {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn consumer_secret(&self) -> &SecretString {
        &self.consumer_secret
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn access_secret(&self) -> &SecretString {
        &self.access_secret
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("username", &self.username)
            .field("consumer_key", &mask(&self.consumer_key))
            .field("consumer_secret", &mask(self.consumer_secret.expose_secret()))
            .field("access_token", &mask(&self.access_token))
            .field("access_secret", &mask(self.access_secret.expose_secret()))
            .finish()
    }
}
