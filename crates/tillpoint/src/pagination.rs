//! Page/limit handling for list endpoints.

use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw `?page=&limit=` query parameters.
///
/// Kept as strings so that garbage values fall back to the defaults instead
/// of rejecting the request.
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    /// Build from decoded query pairs. The first occurrence of a key wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "limit" => &mut query.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    pub fn resolve(&self) -> Page {
        let parse = |value: &Option<String>| value.as_deref().and_then(|v| v.trim().parse::<i64>().ok());

        let page = parse(&self.page).filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let limit = parse(&self.limit)
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);

        Page { page, limit }
    }
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total_items: i64,
    pub total_pages: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total_items: i64, page: Page) -> Self {
        let total_pages = if total_items <= 0 {
            0
        } else {
            (total_items + page.limit - 1) / page.limit
        };

        Self {
            items,
            total_items,
            total_pages,
            page: page.page,
            limit: page.limit,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            page: self.page,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PageQuery::default().resolve(), Page { page: 1, limit: 10 });
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        assert_eq!(query(Some("0"), Some("0")).resolve(), Page { page: 1, limit: 10 });
        assert_eq!(query(Some("-3"), Some("-1")).resolve(), Page { page: 1, limit: 10 });
        assert_eq!(query(Some("abc"), Some("x")).resolve(), Page { page: 1, limit: 10 });
        assert_eq!(query(Some("2"), Some("500")).resolve(), Page { page: 2, limit: 100 });
    }

    #[test]
    fn test_from_pairs_takes_first_value() {
        let pairs = [
            ("sort", "desc"),
            ("page", "3"),
            ("limit", "x"),
            ("page", "9"),
            ("limit", "20"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));

        let query = PageQuery::from_pairs(pairs);
        assert_eq!(query.page.as_deref(), Some("3"));
        assert_eq!(query.limit.as_deref(), Some("x"));
        assert_eq!(query.resolve(), Page { page: 3, limit: 10 });
    }

    #[test]
    fn test_offset() {
        assert_eq!(Page { page: 1, limit: 10 }.offset(), 0);
        assert_eq!(Page { page: 3, limit: 25 }.offset(), 50);
    }

    #[test]
    fn test_total_pages() {
        let page = Page { page: 1, limit: 10 };
        assert_eq!(Paginated::<()>::new(vec![], 0, page).total_pages, 0);
        assert_eq!(Paginated::<()>::new(vec![], 10, page).total_pages, 1);
        assert_eq!(Paginated::<()>::new(vec![], 11, page).total_pages, 2);
    }
}
