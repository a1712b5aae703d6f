use crate::discourse::Post;

/// Case-insensitive substring matcher over a fixed keyword list.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    #[must_use]
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Returns true iff any keyword occurs in the post body.
    ///
    /// A post without a body never matches; the feed omits `raw` on some
    /// posts and a missing body must not count as a hit.
    #[must_use]
    pub fn matches(&self, post: &Post) -> bool {
        let Some(raw) = post.raw.as_deref() else {
            return false;
        };
        let haystack = raw.to_lowercase();
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }
}
