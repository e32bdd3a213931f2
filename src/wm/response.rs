//! Deserialized MediaWiki action API responses (`formatversion=2`).
//!
//! Only the fields the bot reads are declared. See https://www.mediawiki.org/wiki/API:Main_page
use serde::Deserialize;

use super::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Body {
    pub error: Option<Error>,
    pub query: Option<Query>,
    pub login: Option<Login>,
    pub edit: Option<EditResult>,
}

impl Body {
    /// Turn an `error` object into an [ApiError].
    pub fn check(self) -> Result<Self, ApiError> {
        match self.error {
            Some(Error { code, info }) => Err(ApiError::Api { code, info }),
            None => Ok(self),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Error {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Query {
    pub tokens: Tokens,
    /// Redirects followed when `redirects` was requested.
    pub redirects: Vec<Redirect>,
    pub pages: Vec<QueryPage>,
}

#[derive(Debug, Deserialize)]
pub struct Redirect {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Tokens {
    pub logintoken: Option<String>,
    pub csrftoken: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryPage {
    pub title: String,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub invalid: bool,
    #[serde(default)]
    pub invalidreason: Option<String>,
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
pub struct Revision {
    pub timestamp: Option<String>,
    pub slots: Slots,
}

#[derive(Debug, Deserialize)]
pub struct Slots {
    pub main: Slot,
}

#[derive(Debug, Deserialize)]
pub struct Slot {
    /// Absent when the revision text is suppressed.
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Login {
    pub result: String,
    pub reason: Option<String>,
    pub lgusername: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditResult {
    pub result: String,
    #[serde(default)]
    pub nochange: bool,
    pub newrevid: Option<u64>,
}
