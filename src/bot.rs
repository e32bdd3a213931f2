//! The edit loop: fetch, annotate and save each article in turn.
use std::{
    any::Any,
    io::Write,
    panic::{self, AssertUnwindSafe},
};

use crate::{
    report::{error_chain, Entry, Report},
    transform::{apply_coordinates, Change, Outcome, Skip},
    wm::{Edit, FetchError, Mode, Precondition, Section, SubmitError, Wiki},
    Location, Locations,
};

pub const EDIT_SUMMARY: &str = "Adding coordinates from placemark file";

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Name checked against `{{bots|deny=...}}`.
    pub bot_name: String,
    /// Maximum number of edits, counting dry-run edits.
    pub edit_limit: Option<usize>,
    /// Don't save any edits.
    pub dry_run: bool,
}

/// Totals for a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub edited: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Stopped early at the edit limit.
    pub aborted: bool,
}

/// Per-article failures. None of these stop the run.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error("panicked: {0}")]
    Panic(String),
}

enum Processed {
    Skipped(Skip),
    Edited(Change),
}

/// Add coordinates to every article in `locations`, in title order.
///
/// Progress lines are written to `console`; pass [std::io::sink] to silence them.
pub fn run(
    wiki: &mut impl Wiki,
    locations: &Locations,
    options: &RunOptions,
    console: &mut impl Write,
) -> (Report, RunSummary) {
    let mut report = Report::new();
    let mut summary = RunSummary::default();

    report.push(Entry::Loaded {
        count: locations.len(),
    });
    info!("Processing {} articles", locations.len());

    for (i, (title, location)) in locations.iter().enumerate() {
        if let Some(limit) = options.edit_limit {
            if summary.edited >= limit {
                let remaining = locations.len() - i;
                warn!("Edit limit of {limit} reached with {remaining} articles left");
                report.push(Entry::EditLimitReached { limit, remaining });
                narrate(console, format_args!("Edit limit of {limit} reached, stopping."));
                summary.aborted = true;
                break;
            }
        }

        let span = info_span!("article", title = title.as_str(), %location);
        let _handle = span.enter();

        narrate(console, format_args!("[[{title}]]: {location}"));

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            process(wiki, title, *location, options)
        }))
        .unwrap_or_else(|payload| Err(ItemError::Panic(panic_message(payload))));

        match result {
            Ok(Processed::Skipped(skip)) => {
                debug!("Skipped: {skip}");
                narrate(console, format_args!("  {skip}"));
                report.push(Entry::Skipped {
                    title: title.clone(),
                    skip,
                });
                summary.skipped += 1;
            }
            Ok(Processed::Edited(change)) => {
                info!("{change}");
                narrate(console, format_args!("  {change}"));
                report.push(if options.dry_run {
                    Entry::DryRun {
                        title: title.clone(),
                        change,
                    }
                } else {
                    Entry::Edited {
                        title: title.clone(),
                        change,
                    }
                });
                summary.edited += 1;
            }
            Err(e) => {
                let error = error_chain(&e);
                error!("{error}");
                narrate(console, format_args!("  Error: {error}"));
                let title = title.clone();
                report.push(match e {
                    ItemError::Fetch(_) => Entry::FetchFailed { title, error },
                    ItemError::Submit(_) => Entry::SubmitFailed { title, error },
                    ItemError::Panic(_) => Entry::ItemFailed { title, error },
                });
                summary.failed += 1;
            }
        }
    }

    info!(
        edited = summary.edited,
        skipped = summary.skipped,
        failed = summary.failed,
        aborted = summary.aborted,
        "Finished"
    );

    (report, summary)
}

fn process(
    wiki: &mut impl Wiki,
    title: &str,
    location: Location,
    options: &RunOptions,
) -> Result<Processed, ItemError> {
    let page = wiki.fetch(title)?;

    let (text, change) = match apply_coordinates(&page.text, location, &options.bot_name) {
        Outcome::Unchanged(skip) => return Ok(Processed::Skipped(skip)),
        Outcome::Changed { text, change } => (text, change),
    };

    if options.dry_run {
        return Ok(Processed::Edited(change));
    }

    wiki.submit(&Edit {
        title: page.title,
        text,
        summary: format!("{EDIT_SUMMARY}: {change}"),
        precondition: Precondition::Exists,
        mode: Mode::Replace,
        section: Section::Whole,
        minor: true,
        bot: true,
        base_timestamp: page.timestamp,
    })?;

    Ok(Processed::Edited(change))
}

fn narrate(console: &mut impl Write, line: std::fmt::Arguments) {
    if let Err(e) = writeln!(console, "{line}") {
        debug!("Could not write to console: {e}");
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
