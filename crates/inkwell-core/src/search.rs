//! Keyword search over posts.
//!
//! Matching is a case-insensitive substring test of the trimmed keyword
//! against the post title and/or content. There is no index: callers hand
//! in every candidate post, so a search costs O(n) in the number of posts.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::domain::Post;
use crate::error::DomainError;

/// Restricts a search to a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCategory {
    Title,
    Content,
}

impl FromStr for SearchCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("title") {
            Ok(SearchCategory::Title)
        } else if s.eq_ignore_ascii_case("content") {
            Ok(SearchCategory::Content)
        } else {
            Err(DomainError::validation(format!(
                "category must be one of title, content; got {s:?}"
            )))
        }
    }
}

impl fmt::Display for SearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchCategory::Title => f.write_str("title"),
            SearchCategory::Content => f.write_str("content"),
        }
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
    category: Option<SearchCategory>,
}

impl SearchQuery {
    /// Validate a raw keyword and optional category.
    ///
    /// A blank category is the same as no category.
    pub fn parse(keyword: &str, category: Option<&str>) -> Result<Self, DomainError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(DomainError::validation("keyword is required"));
        }

        let category = match category.map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse()?),
        };

        Ok(Self {
            needle: keyword.to_lowercase(),
            category,
        })
    }

    /// The normalised (trimmed, lowercased) keyword.
    pub fn keyword(&self) -> &str {
        &self.needle
    }

    pub fn category(&self) -> Option<SearchCategory> {
        self.category
    }

    pub fn matches(&self, post: &Post) -> bool {
        let in_title = self.category != Some(SearchCategory::Content)
            && contains(post.title.as_deref(), &self.needle);
        let in_content = self.category != Some(SearchCategory::Title)
            && contains(post.content.as_deref(), &self.needle);
        in_title || in_content
    }

    /// Keep the matching posts, in the order given.
    pub fn filter<I>(&self, posts: I) -> Vec<Post>
    where
        I: IntoIterator<Item = Post>,
    {
        posts.into_iter().filter(|post| self.matches(post)).collect()
    }
}

fn contains(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|text| text.to_lowercase().contains(needle))
}

/// Newest first; ties are broken by id so the order is stable.
pub fn by_recency(a: &Post, b: &Post) -> Ordering {
    b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id))
}

pub fn sort_by_recency(posts: &mut [Post]) {
    posts.sort_by(by_recency);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: Option<&str>, content: Option<&str>) -> Post {
        Post::new(
            "u1".to_string(),
            title.map(str::to_string),
            content.map(str::to_string),
            vec![],
        )
    }

    fn corpus() -> Vec<Post> {
        vec![
            post(Some("Hello World"), None),
            post(None, Some("Hello World")),
            post(Some("Goodbye"), Some("Goodbye")),
        ]
    }

    #[test]
    fn test_search_without_category_checks_both_fields() {
        let posts = corpus();
        let query = SearchQuery::parse("hello", None).unwrap();

        let found = query.filter(posts.clone());
        assert_eq!(found, posts[..2].to_vec());
    }

    #[test]
    fn test_search_by_title_only() {
        let posts = corpus();
        let query = SearchQuery::parse("hello", Some("title")).unwrap();

        let found = query.filter(posts.clone());
        assert_eq!(found, vec![posts[0].clone()]);
    }

    #[test]
    fn test_search_by_content_only() {
        let posts = corpus();
        let query = SearchQuery::parse("  WORLD ", Some("content")).unwrap();

        let found = query.filter(posts.clone());
        assert_eq!(found, vec![posts[1].clone()]);
    }

    #[test]
    fn test_post_matching_both_fields_appears_once() {
        let query = SearchQuery::parse("goodbye", None).unwrap();
        assert_eq!(query.filter(corpus()).len(), 1);
    }

    #[test]
    fn test_substring_match_inside_words() {
        let query = SearchQuery::parse("ell", None).unwrap();
        assert_eq!(query.filter(corpus()).len(), 2);
    }

    #[test]
    fn test_blank_keyword_is_rejected() {
        assert!(matches!(
            SearchQuery::parse("   ", None),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!(matches!(
            SearchQuery::parse("hello", Some("author")),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(
            SearchQuery::parse("hello", Some(" ")).unwrap().category(),
            None
        );
    }

    #[test]
    fn test_sort_by_recency_is_newest_first() {
        let mut older = post(Some("a"), None);
        let newer = post(Some("b"), None);
        older.created = newer.created - chrono::Duration::seconds(1);

        let mut posts = vec![older.clone(), newer.clone()];
        sort_by_recency(&mut posts);
        assert_eq!(posts, vec![newer, older]);
    }
}
