//! Wikimedia types and the MediaWiki API client.
use std::io;

mod client;
pub use client::Client;
mod page;
pub use page::Page;
mod response;

/// Reading and writing wiki pages.
pub trait Wiki {
    /// Get the current wikitext of `title`.
    fn fetch(&mut self, title: &str) -> Result<Page, FetchError>;

    fn submit(&mut self, edit: &Edit) -> Result<(), SubmitError>;
}

/// A single page edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub title: String,
    pub text: String,
    pub summary: String,
    pub precondition: Precondition,
    pub mode: Mode,
    pub section: Section,
    pub minor: bool,
    pub bot: bool,
    /// Timestamp of the revision the edit is based on, used to detect edit conflicts.
    pub base_timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Fail if the page was deleted in the meantime.
    Exists,
    /// Fail if the page was created in the meantime.
    Missing,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Replace the page or section text.
    Replace,
    /// Add to the end of the page or section.
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Whole,
    /// Add a new section with this heading.
    New(String),
}

/// Request level failures shared by all API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed")]
    Http(#[source] Box<ureq::Error>),
    #[error("could not decode response")]
    Decode(#[source] io::Error),
    #[error("api error {code:?}: {info}")]
    Api { code: String, info: String },
    #[error("unexpected response: {0}")]
    Unexpected(&'static str),
}

impl From<ureq::Error> for ApiError {
    fn from(e: ureq::Error) -> Self {
        ApiError::Http(Box::new(e))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("page {0:?} does not exist")]
    Missing(String),
    #[error("invalid title {title:?}: {reason}")]
    InvalidTitle { title: String, reason: String },
    #[error("content of {0:?} is hidden")]
    Hidden(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("edit conflict")]
    EditConflict,
    #[error("page does not exist")]
    PageMissing,
    #[error("page already exists")]
    PageExists,
    #[error("page is protected: {0}")]
    Protected(String),
    #[error("session is not logged in or token expired: {0}")]
    NotLoggedIn(String),
    #[error("edit was not saved: {0}")]
    Rejected(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SubmitError {
    /// Classify an error code returned by `action=edit`.
    ///
    /// See <https://www.mediawiki.org/wiki/API:Edit#Possible_errors>.
    pub(crate) fn from_api(e: ApiError) -> Self {
        let (code, info) = match e {
            ApiError::Api { code, info } => (code, info),
            e => return SubmitError::Api(e),
        };
        match code.as_str() {
            "ratelimited" => SubmitError::RateLimited(info),
            "editconflict" => SubmitError::EditConflict,
            "missingtitle" | "pagedeleted" => SubmitError::PageMissing,
            "articleexists" => SubmitError::PageExists,
            "protectedpage" | "protectedtitle" | "cascadeprotected" => {
                SubmitError::Protected(info)
            }
            "badtoken" | "notloggedin" | "assertuserfailed" | "assertbotfailed" => {
                SubmitError::NotLoggedIn(info)
            }
            _ => SubmitError::Api(ApiError::Api { code, info }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("login rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod test {
    use super::*;

    fn api(code: &str) -> ApiError {
        ApiError::Api {
            code: code.to_owned(),
            info: "info".to_owned(),
        }
    }

    #[test]
    fn classifies_edit_errors() {
        assert!(matches!(
            SubmitError::from_api(api("ratelimited")),
            SubmitError::RateLimited(_)
        ));
        assert!(matches!(
            SubmitError::from_api(api("editconflict")),
            SubmitError::EditConflict
        ));
        assert!(matches!(
            SubmitError::from_api(api("missingtitle")),
            SubmitError::PageMissing
        ));
        assert!(matches!(
            SubmitError::from_api(api("badtoken")),
            SubmitError::NotLoggedIn(_)
        ));
        assert!(matches!(
            SubmitError::from_api(api("spamblacklist")),
            SubmitError::Api(ApiError::Api { .. })
        ));
        assert!(matches!(
            SubmitError::from_api(ApiError::Unexpected("x")),
            SubmitError::Api(ApiError::Unexpected(_))
        ));
    }
}
