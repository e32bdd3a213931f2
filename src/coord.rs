//! `{{coord}}` template rendering.
use std::fmt::Display;

use crate::Location;

/// Where the wiki renders the coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// In the running text and the article title bar, used inside infoboxes.
    InlineTitle,
    Inline,
    /// Only in the title bar, used when appended to the article body.
    Title,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::InlineTitle => "inline,title",
            DisplayMode::Inline => "inline",
            DisplayMode::Title => "title",
        }
    }
}

/// A `{{coord}}` template for a location.
///
/// Latitude and longitude are written as signed decimal degrees with fixed `N`/`E` hemispheres.
///
/// ```
/// use coordbot::{coord::{Annotation, DisplayMode}, Location};
///
/// let coord = Annotation::new(Location::new(51.5, -0.1), DisplayMode::InlineTitle);
/// assert_eq!(coord.to_string(), "{{coord|51.5|N|-0.1|E|display=inline,title}}");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Annotation {
    pub location: Location,
    pub display: DisplayMode,
}

impl Annotation {
    pub fn new(location: Location, display: DisplayMode) -> Self {
        Self { location, display }
    }
}

impl Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{{coord|{}|N|{}|E|display={}}}}}",
            self.location.latitude(),
            self.location.longitude(),
            self.display.as_str()
        )
    }
}
