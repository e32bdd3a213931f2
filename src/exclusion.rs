//! Detection of `{{nobots}}`/`{{bots}}` opt-out directives.
//!
//! See <https://en.wikipedia.org/wiki/Template:Bots>.
use once_cell::sync::Lazy;
use regex::Regex;

/// Directives that exclude every bot.
static BLANKET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\{\{\s*(?:nobots\s*(?:\|[^}]*)?|bots\s*\|\s*(?:allow\s*=\s*none|optout\s*=\s*all)\s*)\}\}",
    )
    .unwrap()
});

static DENY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\{\s*bots\s*\|\s*deny\s*=([^}]*)\}\}").unwrap());

/// Check if the page text asks `bot_name` (or all bots) to stay away.
///
/// Matching is case-insensitive, and spaces and underscores in names are equivalent.
///
/// ```
/// use coordbot::exclusion::excludes;
///
/// assert!(excludes("{{NoBots}}", "CoordBot"));
/// assert!(excludes("{{bots|deny=OtherBot, coord bot}}", "Coord_Bot"));
/// assert!(excludes("{{bots|deny=all}}", "CoordBot"));
/// assert!(!excludes("{{bots|deny=OtherBot}}", "CoordBot"));
/// assert!(!excludes("{{bots|deny=none}}", "CoordBot"));
/// ```
pub fn excludes(text: &str, bot_name: &str) -> bool {
    if BLANKET.is_match(text) {
        return true;
    }

    let bot_name = normalize(bot_name);
    DENY.captures_iter(text).any(|caps| {
        caps[1]
            .split(',')
            .map(normalize)
            .any(|denied| denied == "all" || denied == bot_name)
    })
}

fn normalize(name: &str) -> String {
    name.trim().replace('_', " ").to_lowercase()
}

#[cfg(test)]
mod test {
    use super::*;

    const BOT: &str = "CoordBot";

    #[test]
    fn blanket_opt_outs() {
        for text in [
            "{{nobots}}",
            "Intro\n{{ nobots }}\nMore",
            "{{nobots|reason=contested}}",
            "{{bots|allow=none}}",
            "{{Bots | optout = all}}",
        ] {
            assert!(excludes(text, BOT), "{text:?} should exclude");
        }
    }

    #[test]
    fn unrelated_templates() {
        for text in [
            "",
            "{{bots}}",
            "{{bots|allow=CoordBot}}",
            "{{bots|optout=nosource}}",
            "{{robots}}",
            "nobots",
        ] {
            assert!(!excludes(text, BOT), "{text:?} should not exclude");
        }
    }

    #[test]
    fn deny_list() {
        assert!(excludes("{{bots|deny=coordbot}}", BOT));
        assert!(excludes("{{bots|deny=A,B,CoordBot}}", BOT));
        assert!(excludes("{{bots|deny=A, ALL}}", BOT));
        assert!(!excludes("{{bots|deny=CoordBot2}}", BOT));
    }
}
