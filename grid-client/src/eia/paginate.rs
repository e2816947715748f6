use super::{parse_page, EiaError, EiaPage, EiaQuery, EiaRow};

/// Upper bound on pages walked for one query.
const DEFAULT_MAX_PAGES: usize = 10_000;

/// Transport for one page request. Implementations perform the HTTP call
/// (with the `X-Params` header from [`EiaQuery::params`]) and return the raw body.
pub trait PageFetcher {
    fn fetch(&mut self, query: &EiaQuery, offset: usize, length: usize) -> Result<String, EiaError>;
}

impl<F> PageFetcher for F
where
    F: FnMut(&EiaQuery, usize, usize) -> Result<String, EiaError>,
{
    fn fetch(&mut self, query: &EiaQuery, offset: usize, length: usize) -> Result<String, EiaError> {
        self(query, offset, length)
    }
}

/// Lazily walks the pages of one query.
///
/// Stops once the rows seen reach the reported total, when a page comes back
/// empty, or after the first error.
pub struct Paginator<'q, F> {
    fetcher: F,
    query: &'q EiaQuery,
    page_size: usize,
    max_pages: usize,
    page: usize,
    seen: usize,
    done: bool,
}

impl<'q, F: PageFetcher> Paginator<'q, F> {
    pub fn new(fetcher: F, query: &'q EiaQuery, page_size: usize) -> Self {
        Self {
            fetcher,
            query,
            page_size: page_size.max(1),
            max_pages: DEFAULT_MAX_PAGES,
            page: 0,
            seen: 0,
            done: false,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }
}

impl<F: PageFetcher> Iterator for Paginator<'_, F> {
    type Item = Result<EiaPage, EiaError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.page >= self.max_pages {
            self.done = true;
            return Some(Err(EiaError::PageLimit(self.page)));
        }

        let offset = self.page * self.page_size;
        let result = self
            .fetcher
            .fetch(self.query, offset, self.page_size)
            .and_then(|body| parse_page(&body));

        match result {
            Ok(page) => {
                self.page += 1;
                self.seen += page.returned;
                if page.returned == 0 || self.seen >= page.total {
                    self.done = true;
                }
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Concatenates every page's rows in fetch order.
pub fn fetch_all<F: PageFetcher>(
    fetcher: F,
    query: &EiaQuery,
    page_size: usize,
) -> Result<Vec<EiaRow>, EiaError> {
    let mut rows = Vec::new();
    for page in Paginator::new(fetcher, query, page_size) {
        rows.extend(page?.rows);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn query() -> EiaQuery {
        EiaQuery::interchange(&["ISNE".to_string()], date!(2024-01-01), date!(2024-01-02))
    }

    fn body(offset: usize, count: usize, total: usize) -> String {
        let rows: Vec<String> = (offset..offset + count)
            .map(|i| {
                format!(
                    r#"{{"period": "2024-01-01T{:02}", "fromba": "NYIS", "toba": "ISNE", "value": {i}}}"#,
                    i % 24
                )
            })
            .collect();
        format!(r#"{{"response": {{"total": {total}, "data": [{}]}}}}"#, rows.join(","))
    }

    #[test]
    fn walks_pages_until_total_is_reached() {
        let total = 5;
        let mut offsets = Vec::new();
        let fetcher = |_: &EiaQuery, offset: usize, length: usize| {
            offsets.push(offset);
            let count = length.min(total - offset);
            Ok::<_, EiaError>(body(offset, count, total))
        };
        let q = query();
        let rows = fetch_all(fetcher, &q, 2).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4].value, Some(4.0));
        assert_eq!(offsets, vec![0, 2, 4]);
    }

    #[test]
    fn empty_page_ends_iteration() {
        let fetcher = |_: &EiaQuery, _: usize, _: usize| Ok::<_, EiaError>(body(0, 0, 100));
        let q = query();
        let pages: Vec<_> = Paginator::new(fetcher, &q, 10).collect();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_ok());
    }

    #[test]
    fn transport_error_is_yielded_once() {
        let fetcher = |_: &EiaQuery, _: usize, _: usize| {
            Err::<String, _>(EiaError::Transport("connection reset".to_string()))
        };
        let q = query();
        let pages: Vec<_> = Paginator::new(fetcher, &q, 10).collect();
        assert_eq!(pages.len(), 1);
        assert!(matches!(pages[0], Err(EiaError::Transport(_))));
    }

    #[test]
    fn page_cap_stops_a_total_that_is_never_reached() {
        // Server keeps claiming more rows than it ever returns.
        let fetcher = |_: &EiaQuery, offset: usize, _: usize| Ok::<_, EiaError>(body(offset, 1, 1_000_000));
        let q = query();
        let pages: Vec<_> = Paginator::new(fetcher, &q, 1).with_max_pages(3).collect();
        assert_eq!(pages.len(), 4);
        assert!(matches!(pages[3], Err(EiaError::PageLimit(3))));
    }
}
