//! Run report: collected during the edit loop and sent once at the end.
use std::{error::Error, fmt::Display};

use crate::{
    mail::{MailError, Mailer, Message},
    transform::{Change, Skip},
    wm::{Edit, Mode, Precondition, Section, SubmitError, Wiki},
};

pub const MAIL_SUBJECT: &str = "Coordinate bot report";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Loaded {
        count: usize,
    },
    Edited {
        title: String,
        change: Change,
    },
    /// Would have been edited, but live edits are disabled.
    DryRun {
        title: String,
        change: Change,
    },
    Skipped {
        title: String,
        skip: Skip,
    },
    FetchFailed {
        title: String,
        error: String,
    },
    SubmitFailed {
        title: String,
        error: String,
    },
    ItemFailed {
        title: String,
        error: String,
    },
    EditLimitReached {
        limit: usize,
        remaining: usize,
    },
    ReportNotPosted,
    ReportSubmitFailed {
        error: String,
    },
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entry::Loaded { count: 1 } => write!(f, "Found 1 location in placemark file."),
            Entry::Loaded { count } => write!(f, "Found {count} locations in placemark file."),
            Entry::Edited { title, change } => write!(f, "[[{title}]]: {change}"),
            Entry::DryRun { title, change } => write!(f, "[[{title}]]: (dry run) {change}"),
            Entry::Skipped { title, skip } => write!(f, "[[{title}]]: Skipped. {skip}"),
            Entry::FetchFailed { title, error } => {
                write!(f, "[[{title}]]: Could not fetch page: {error}")
            }
            Entry::SubmitFailed { title, error } => {
                write!(f, "[[{title}]]: Could not save page: {error}")
            }
            Entry::ItemFailed { title, error } => write!(f, "[[{title}]]: Error: {error}"),
            Entry::EditLimitReached { limit, remaining } => write!(
                f,
                "Edit limit of {limit} reached, stopping with {remaining} pages left."
            ),
            Entry::ReportNotPosted => write!(f, "Report not posted to the wiki in a dry run."),
            Entry::ReportSubmitFailed { error } => {
                write!(f, "Could not post report to the wiki: {error}")
            }
        }
    }
}

/// Ordered record of what happened in a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    entries: Vec<Entry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Wikitext bullet list, one line per entry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str("* ");
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }
}

/// Format an error and all of its sources on one line.
pub fn error_chain(e: &dyn Error) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(e) = source {
        out.push_str(": ");
        out.push_str(&e.to_string());
        source = e.source();
    }
    out
}

/// Where the report goes at the end of the run.
#[derive(Debug, Clone)]
pub struct Destination {
    /// Post a new section on `page`.
    pub post_to_wiki: bool,
    /// Live edits are disabled, so the report is not posted either.
    pub dry_run: bool,
    pub page: String,
    pub section_title: String,
    pub mail_from: String,
    pub mail_to: String,
}

#[derive(Debug, thiserror::Error)]
#[error("could not post report to {page:?}")]
pub struct ReportSubmitError {
    pub page: String,
    #[source]
    pub source: SubmitError,
}

/// Post the report to the wiki (best effort), then mail it.
///
/// A failed wiki post is added to the report before mailing.
pub fn dispatch(
    mut report: Report,
    wiki: &mut impl Wiki,
    mailer: &mut impl Mailer,
    destination: &Destination,
) -> Result<Report, MailError> {
    if destination.post_to_wiki {
        if destination.dry_run {
            report.push(Entry::ReportNotPosted);
        } else if let Err(e) = post(&report, wiki, destination) {
            error!("{}", error_chain(&e));
            report.push(Entry::ReportSubmitFailed {
                error: error_chain(&e.source),
            });
        } else {
            info!("Posted report to {:?}", destination.page);
        }
    }

    let message = Message {
        from: destination.mail_from.clone(),
        to: destination.mail_to.clone(),
        subject: MAIL_SUBJECT.to_owned(),
        body: report.render(),
    };
    mailer.send(&message)?;
    info!("Mailed report to {:?}", destination.mail_to);

    Ok(report)
}

fn post(
    report: &Report,
    wiki: &mut impl Wiki,
    destination: &Destination,
) -> Result<(), ReportSubmitError> {
    let edit = Edit {
        title: destination.page.clone(),
        text: report.render(),
        summary: MAIL_SUBJECT.to_owned(),
        precondition: Precondition::Any,
        mode: Mode::Append,
        section: Section::New(destination.section_title.clone()),
        minor: false,
        bot: true,
        base_timestamp: None,
    };
    wiki.submit(&edit).map_err(|source| ReportSubmitError {
        page: destination.page.clone(),
        source,
    })
}
