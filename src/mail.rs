//! Sending the run report by mail.
use std::time::Duration;

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer {
    fn send(&mut self, message: &Message) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail relay request failed")]
    Http(#[source] Box<ureq::Error>),
}

impl From<ureq::Error> for MailError {
    fn from(e: ureq::Error) -> Self {
        MailError::Http(Box::new(e))
    }
}

/// Mail relay reachable over HTTP.
///
/// Each message is posted as a form with `from`, `to`, `subject` and `text` fields,
/// which is accepted by common transactional mail APIs.
/// A non-2xx status is treated as a failure.
pub struct HttpRelay {
    agent: ureq::Agent,
    url: Url,
    token: Option<String>,
}

impl HttpRelay {
    pub fn new(url: Url, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent, url, token }
    }
}

impl Mailer for HttpRelay {
    fn send(&mut self, message: &Message) -> Result<(), MailError> {
        let mut request = self.agent.post(self.url.as_str());
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        let response = request.send_form(&[
            ("from", message.from.as_str()),
            ("to", message.to.as_str()),
            ("subject", message.subject.as_str()),
            ("text", message.body.as_str()),
        ])?;
        debug!(
            status = response.status(),
            "Sent {:?} to {:?}", message.subject, message.to
        );
        Ok(())
    }
}
