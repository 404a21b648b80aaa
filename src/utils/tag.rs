use regex::Regex;
use tracing::warn;

/// Finds product tags such as `(P_ID: 123)` in free text.
///
/// The label is matched case-insensitively and whitespace is allowed around the
/// colon and inside the parentheses. Matches never overlap and are yielded in
/// order of appearance.
#[derive(Debug, Clone)]
pub struct TagScanner {
    pattern: Regex,
}

impl TagScanner {
    pub fn new(label: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"(?i)\(\s*{}\s*:\s*(\d+)\s*\)",
            regex::escape(label)
        ))?;
        Ok(Self { pattern })
    }

    /// Numeric ids of every tag in `text`. Ids too large for `u64` are skipped.
    pub fn scan<'a>(&'a self, text: &'a str) -> impl Iterator<Item = u64> + 'a {
        self.pattern.captures_iter(text).filter_map(|caps| {
            let digits = caps.get(1)?.as_str();
            match digits.parse::<u64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!("Ignoring out-of-range product id {digits}");
                    None
                }
            }
        })
    }

    pub fn has_tags(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}
