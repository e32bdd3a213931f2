//! Adding `{{coord}}` annotations to article wikitext.
use std::fmt::Display;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::{
    coord::{Annotation, DisplayMode},
    exclusion, Location,
};

/// Any existing coordinate template, including `{{Coord missing}}`.
static EXISTING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{[Cc]oord").unwrap());

/// Empty infobox fields, one per line, e.g. `| coordinates = `.
///
/// The second group keeps a trailing carriage return in place.
static EMPTY_FIELDS: Lazy<[Regex; 2]> = Lazy::new(|| {
    ["coordinates", "coords"].map(|key| {
        Regex::new(&format!(r"(?m)^([ \t]*\|[ \t]*{key}[ \t]*=[ \t]*)(\r?)$")).unwrap()
    })
});

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Unchanged(Skip),
    Changed { text: String, change: Change },
}

/// Why a page was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    Excluded,
    HasCoordinates,
}

impl Display for Skip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Skip::Excluded => write!(f, "Page excludes this bot."),
            Skip::HasCoordinates => write!(f, "Page already has coordinates."),
        }
    }
}

/// Where the annotation was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Infobox,
    Appended,
}

impl Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::Infobox => write!(f, "Added coordinates to infobox."),
            Change::Appended => write!(f, "Added coordinates at end of article."),
        }
    }
}

/// Add a coordinate annotation for `location` to the page `text`.
///
/// In order:
/// 1. Pages that exclude `bot_name` are skipped.
/// 2. Pages with a `{{coord}}`/`{{Coord}}` template are skipped.
/// 3. The first empty `coordinates` field and the first empty `coords` field are filled with an inline annotation.
/// 4. Otherwise a title-only annotation is appended after a blank line.
///
/// ```
/// use coordbot::{transform::{apply_coordinates, Change, Outcome}, Location};
///
/// let outcome = apply_coordinates("| coordinates = \n", Location::new(51.5, -0.1), "CoordBot");
/// assert_eq!(
///     outcome,
///     Outcome::Changed {
///         text: "| coordinates = {{coord|51.5|N|-0.1|E|display=inline,title}}\n".into(),
///         change: Change::Infobox,
///     }
/// );
/// ```
pub fn apply_coordinates(text: &str, location: Location, bot_name: &str) -> Outcome {
    if exclusion::excludes(text, bot_name) {
        return Outcome::Unchanged(Skip::Excluded);
    }

    if EXISTING.is_match(text) {
        return Outcome::Unchanged(Skip::HasCoordinates);
    }

    if let Some(text) = fill_infobox(text, Annotation::new(location, DisplayMode::InlineTitle)) {
        return Outcome::Changed {
            text,
            change: Change::Infobox,
        };
    }

    let annotation = Annotation::new(location, DisplayMode::Title);
    Outcome::Changed {
        text: format!("{}\n\n{annotation}", text.trim_end()),
        change: Change::Appended,
    }
}

/// Fill empty coordinate fields, returning `None` if there are none.
fn fill_infobox(text: &str, annotation: Annotation) -> Option<String> {
    let mut filled: Option<String> = None;
    for field in EMPTY_FIELDS.iter() {
        let current = filled.as_deref().unwrap_or(text);
        if !field.is_match(current) {
            continue;
        }
        let replaced = field
            .replacen(current, 1, |caps: &Captures| {
                format!("{}{annotation}{}", &caps[1], &caps[2])
            })
            .into_owned();
        filled = Some(replaced);
    }
    filled
}

#[cfg(test)]
mod test {
    use super::*;

    const BOT: &str = "CoordBot";
    const LOC: Location = Location::new(51.5, -0.1);

    fn changed(outcome: Outcome) -> (String, Change) {
        match outcome {
            Outcome::Changed { text, change } => (text, change),
            Outcome::Unchanged(skip) => panic!("expected a change, got {skip:?}"),
        }
    }

    #[test]
    fn exclusion_wins_over_everything() {
        for text in [
            "{{nobots}}\n| coordinates = \n",
            "{{bots|deny=CoordBot}}\n{{coord|1|N|2|E}}",
            "{{bots|deny=all}}",
        ] {
            assert_eq!(
                apply_coordinates(text, LOC, BOT),
                Outcome::Unchanged(Skip::Excluded)
            );
        }
    }

    #[test]
    fn existing_coordinates() {
        for text in [
            "{{coord|1|N|2|E}}",
            "{{Coord|1|N|2|E|display=title}}",
            "{{Coord missing|England}}",
        ] {
            assert_eq!(
                apply_coordinates(text, LOC, BOT),
                Outcome::Unchanged(Skip::HasCoordinates)
            );
        }
    }

    #[test]
    fn existing_check_is_case_sensitive_after_first_letter() {
        let (_, change) = changed(apply_coordinates("{{COORD|1|N|2|E}}", LOC, BOT));
        assert_eq!(change, Change::Appended);
    }

    #[test]
    fn infobox_fill_grows_by_annotation_length() {
        let text = "{{Infobox building\n| name = Tower\n| coordinates = \n| architect = Someone\n}}\nBody.";
        let annotation = Annotation::new(LOC, DisplayMode::InlineTitle).to_string();

        let (output, change) = changed(apply_coordinates(text, LOC, BOT));

        assert_eq!(change, Change::Infobox);
        assert_eq!(output.len(), text.len() + annotation.len());
        assert!(output.contains(&format!("| coordinates = {annotation}\n")));
    }

    #[test]
    fn filled_field_keeps_crlf() {
        let (output, _) = changed(apply_coordinates("|coords=\r\n", LOC, BOT));
        assert_eq!(
            output,
            "|coords={{coord|51.5|N|-0.1|E|display=inline,title}}\r\n"
        );
    }

    #[test]
    fn only_first_empty_field_of_each_key() {
        let text = "| coordinates =\n| coordinates =\n| coords =\n";
        let (output, _) = changed(apply_coordinates(text, LOC, BOT));
        let annotation = Annotation::new(LOC, DisplayMode::InlineTitle).to_string();
        assert_eq!(
            output,
            format!("| coordinates ={annotation}\n| coordinates =\n| coords ={annotation}\n")
        );
    }

    #[test]
    fn field_with_value_is_not_refilled() {
        let text = "| coordinates = somewhere\nText";
        let (output, change) = changed(apply_coordinates(text, LOC, BOT));
        assert_eq!(change, Change::Appended);
        assert!(output.starts_with(text));
    }

    #[test]
    fn field_key_is_case_sensitive() {
        let (_, change) = changed(apply_coordinates("| Coordinates = \n", LOC, BOT));
        assert_eq!(change, Change::Appended);
    }

    #[test]
    fn appends_after_blank_line() {
        let (output, change) = changed(apply_coordinates("Some text.\n\n", LOC, BOT));
        assert_eq!(change, Change::Appended);
        assert_eq!(
            output,
            "Some text.\n\n{{coord|51.5|N|-0.1|E|display=title}}"
        );
    }

    #[test]
    fn second_pass_is_a_no_op() {
        for text in ["| coordinates = \n", "Plain article."] {
            let (once, _) = changed(apply_coordinates(text, LOC, BOT));
            assert_eq!(
                apply_coordinates(&once, LOC, BOT),
                Outcome::Unchanged(Skip::HasCoordinates)
            );
        }
    }
}
