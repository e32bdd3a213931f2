use std::time::Duration;

use url::Url;

use super::{
    response::Body, ApiError, Edit, FetchError, LoginError, Mode, Page, Precondition, Section,
    SubmitError, Wiki,
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Blocking MediaWiki action API client with a cookie session.
///
/// See https://www.mediawiki.org/wiki/API:Main_page
pub struct Client {
    agent: ureq::Agent,
    api: Url,
    csrf_token: Option<String>,
    /// Set after a successful login, so edits assert the session is still valid.
    user: Option<String>,
}

impl Client {
    /// `api` is the `api.php` endpoint, e.g. `https://en.wikipedia.org/w/api.php`.
    pub fn new(api: Url, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build();
        Self {
            agent,
            api,
            csrf_token: None,
            user: None,
        }
    }

    /// Log in with a bot password (`Username@BotName`).
    ///
    /// See https://www.mediawiki.org/wiki/API:Login
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), LoginError> {
        let token = self
            .get(&[("action", "query"), ("meta", "tokens"), ("type", "login")])?
            .query
            .and_then(|q| q.tokens.logintoken)
            .ok_or(ApiError::Unexpected("no login token"))?;

        let login = self
            .post(&[
                ("action", "login"),
                ("lgname", username),
                ("lgpassword", password),
                ("lgtoken", token.as_str()),
            ])?
            .login
            .ok_or(ApiError::Unexpected("no login result"))?;

        if login.result != "Success" {
            return Err(LoginError::Rejected(
                login.reason.unwrap_or(login.result),
            ));
        }

        let user = login.lgusername.unwrap_or_else(|| username.to_owned());
        info!("Logged in as {user:?}");
        self.user = Some(user);
        // Tokens are tied to the session.
        self.csrf_token = None;
        Ok(())
    }

    fn csrf_token(&mut self) -> Result<String, ApiError> {
        if let Some(token) = &self.csrf_token {
            return Ok(token.clone());
        }
        let token = self
            .get(&[("action", "query"), ("meta", "tokens"), ("type", "csrf")])?
            .query
            .and_then(|q| q.tokens.csrftoken)
            .ok_or(ApiError::Unexpected("no csrf token"))?;
        self.csrf_token = Some(token.clone());
        Ok(token)
    }

    fn get(&self, params: &[(&str, &str)]) -> Result<Body, ApiError> {
        let mut request = self.agent.get(self.api.as_str());
        for (key, value) in common_params().iter().chain(params) {
            request = request.query(key, value);
        }
        trace!("GET {params:?}");
        let body: Body = request.call()?.into_json().map_err(ApiError::Decode)?;
        body.check()
    }

    fn post(&self, params: &[(&str, &str)]) -> Result<Body, ApiError> {
        let form: Vec<(&str, &str)> = common_params().iter().chain(params).copied().collect();
        // Params may contain passwords and tokens.
        trace!(
            "POST {:?}",
            form.iter().map(|(key, _)| key).collect::<Vec<_>>()
        );
        let body: Body = self
            .agent
            .post(self.api.as_str())
            .send_form(&form)?
            .into_json()
            .map_err(ApiError::Decode)?;
        body.check()
    }
}

/// Extract the single page of a `prop=revisions` query.
///
/// Redirects are resolved by the API, so the returned title is the target's.
fn page_from_query(title: &str, body: Body) -> Result<Page, FetchError> {
    let query = body.query.ok_or(ApiError::Unexpected("no query result"))?;
    for redirect in &query.redirects {
        info!("Following redirect from {:?} to {:?}", redirect.from, redirect.to);
    }

    let page = query
        .pages
        .into_iter()
        .next()
        .ok_or(ApiError::Unexpected("no pages in query result"))?;

    if page.invalid {
        return Err(FetchError::InvalidTitle {
            title: title.to_owned(),
            reason: page.invalidreason.unwrap_or_default(),
        });
    }
    if page.missing {
        return Err(FetchError::Missing(page.title));
    }

    let revision = page
        .revisions
        .into_iter()
        .next()
        .ok_or(ApiError::Unexpected("no revision for existing page"))?;
    let text = revision
        .slots
        .main
        .content
        .ok_or_else(|| FetchError::Hidden(page.title.clone()))?;

    Ok(Page {
        title: page.title,
        text,
        timestamp: revision.timestamp,
    })
}

fn common_params() -> [(&'static str, &'static str); 2] {
    [("format", "json"), ("formatversion", "2")]
}

impl Wiki for Client {
    fn fetch(&mut self, title: &str) -> Result<Page, FetchError> {
        let body = self.get(&[
            ("action", "query"),
            ("prop", "revisions"),
            ("rvprop", "content|timestamp"),
            ("rvslots", "main"),
            ("redirects", "1"),
            ("titles", title),
        ])?;
        let page = page_from_query(title, body)?;
        debug!(bytes = page.text.len(), "Fetched {:?}", page.title);
        Ok(page)
    }

    fn submit(&mut self, edit: &Edit) -> Result<(), SubmitError> {
        let token = self.csrf_token()?;

        let mut params = vec![
            ("action", "edit"),
            ("title", edit.title.as_str()),
            ("summary", edit.summary.as_str()),
        ];
        params.push(match edit.mode {
            Mode::Replace => ("text", edit.text.as_str()),
            Mode::Append => ("appendtext", edit.text.as_str()),
        });
        match edit.precondition {
            Precondition::Exists => params.push(("nocreate", "1")),
            Precondition::Missing => params.push(("createonly", "1")),
            Precondition::Any => {}
        }
        if let Section::New(heading) = &edit.section {
            params.push(("section", "new"));
            params.push(("sectiontitle", heading.as_str()));
        }
        if edit.minor {
            params.push(("minor", "1"));
        }
        if edit.bot {
            params.push(("bot", "1"));
        }
        if let Some(timestamp) = &edit.base_timestamp {
            params.push(("basetimestamp", timestamp.as_str()));
        }
        if self.user.is_some() {
            params.push(("assert", "user"));
        }
        params.push(("token", token.as_str()));

        let result = self
            .post(&params)
            .map_err(SubmitError::from_api)?
            .edit
            .ok_or(ApiError::Unexpected("no edit result"))?;

        if result.result != "Success" {
            return Err(SubmitError::Rejected(result.result));
        }
        if result.nochange {
            warn!("Edit to {:?} did not change the page", edit.title);
        } else {
            debug!(revision = ?result.newrevid, "Saved {:?}", edit.title);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn body(json: &str) -> Body {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn redirect_resolves_to_target() {
        let page = page_from_query(
            "Big Ben",
            body(
                r#"{"batchcomplete":true,"query":{"redirects":[{"from":"Big Ben","to":"Elizabeth Tower"}],
                "pages":[{"pageid":2,"ns":0,"title":"Elizabeth Tower",
                "revisions":[{"timestamp":"2023-05-01T10:00:00Z","slots":{"main":{"content":"A clock tower."}}}]}]}}"#,
            ),
        )
        .unwrap();
        assert_eq!(page.title, "Elizabeth Tower");
        assert_eq!(page.text, "A clock tower.");
        assert_eq!(page.timestamp.as_deref(), Some("2023-05-01T10:00:00Z"));
    }

    #[test]
    fn missing_and_invalid_pages() {
        let missing = page_from_query(
            "Nowhere",
            body(r#"{"query":{"pages":[{"ns":0,"title":"Nowhere","missing":true}]}}"#),
        );
        assert!(matches!(missing, Err(FetchError::Missing(t)) if t == "Nowhere"));

        let invalid = page_from_query(
            "a|b",
            body(
                r#"{"query":{"pages":[{"title":"a|b","invalid":true,"invalidreason":"bad character"}]}}"#,
            ),
        );
        assert!(matches!(
            invalid,
            Err(FetchError::InvalidTitle { reason, .. }) if reason == "bad character"
        ));
    }

    #[test]
    fn suppressed_text_is_hidden() {
        let hidden = page_from_query(
            "Secret",
            body(
                r#"{"query":{"pages":[{"title":"Secret","revisions":[{"slots":{"main":{"texthidden":true}}}]}]}}"#,
            ),
        );
        assert!(matches!(hidden, Err(FetchError::Hidden(_))));
    }
}
