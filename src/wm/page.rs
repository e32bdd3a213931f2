/// Current revision of a wiki page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub text: String,
    /// Timestamp of the revision `text` belongs to, if known.
    pub timestamp: Option<String>,
}
