//! Paged results
//!
//! Both the blocking [`PagedIterable`] and the async [`PagedFlux`] are lazy
//! and forward-only: nothing is fetched until iteration starts, and each
//! traversal walks pages in order. A traversal can be started from any
//! continuation token a previous traversal observed, so a listing can be
//! resumed from a separate invocation.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::Deserialize;

use crate::error::{HttpError, Result};
use crate::transport::HttpResponse;

/// One page of items
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    continuation_token: Option<String>,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(items: Vec<T>, continuation_token: Option<String>) -> Self { Self { items, continuation_token } }

    /// Items on this page
    pub fn items(&self) -> &[T] { &self.items }

    /// Token resuming the listing after this page; `None` on the last page
    pub fn continuation_token(&self) -> Option<&str> { self.continuation_token.as_deref() }

    /// Take the items
    pub fn into_items(self) -> Vec<T> { self.items }
}

impl<T: for<'de> Deserialize<'de>> Page<T> {
    /// Decode a page body holding an item array and an optional next link
    pub fn from_response(response: &HttpResponse, item_name: &str, next_link_name: Option<&str>) -> Result<Self> {
        let body: serde_json::Value = response.json()?;
        let items = match body.get(item_name) {
            Some(v) => serde_json::from_value(v.clone())?,
            None => Vec::new(),
        };
        let next = next_link_name
            .and_then(|name| body.get(name))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(Self::new(items, next))
    }

    /// Decode a page whose continuation token travels in a response header
    pub fn from_response_header(response: &HttpResponse, item_name: &str, header: &str) -> Result<Self> {
        let page = Self::from_response(response, item_name, None)?;
        let token = response.header(header).filter(|s| !s.is_empty()).map(str::to_string);
        Ok(Self::new(page.into_items(), token))
    }
}

type PageFn<T> = Arc<dyn Fn(Option<String>) -> Result<Page<T>> + Send + Sync>;
type AsyncPageFn<T> = Arc<dyn Fn(Option<String>) -> BoxFuture<'static, Result<Page<T>>> + Send + Sync>;

/// Blocking, lazy sequence of page items
pub struct PagedIterable<T> {
    fetch: PageFn<T>,
}

impl<T> Clone for PagedIterable<T> {
    fn clone(&self) -> Self { Self { fetch: Arc::clone(&self.fetch) } }
}

impl<T> PagedIterable<T> {
    /// Create from a page fetcher; the fetcher receives `None` for the first page
    pub fn new(fetch: impl Fn(Option<String>) -> Result<Page<T>> + Send + Sync + 'static) -> Self {
        Self { fetch: Arc::new(fetch) }
    }

    /// Walk pages starting from `continuation_token` (`None` starts at the beginning)
    pub fn by_page(&self, continuation_token: Option<String>) -> PageIter<T> {
        PageIter { fetch: Arc::clone(&self.fetch), next: Some(continuation_token) }
    }

    /// Walk items from the beginning
    pub fn iter(&self) -> ItemIter<T> { ItemIter { pages: self.by_page(None), buffer: VecDeque::new() } }
}

impl<T> IntoIterator for PagedIterable<T> {
    type Item = Result<T>;
    type IntoIter = ItemIter<T>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

/// Iterator over pages
pub struct PageIter<T> {
    fetch: PageFn<T>,
    next: Option<Option<String>>,
}

impl<T> Iterator for PageIter<T> {
    type Item = Result<Page<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next.take()?;
        match (self.fetch)(token) {
            Ok(page) => {
                self.next = page.continuation_token.clone().map(Some);
                Some(Ok(page))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Iterator over items across pages
pub struct ItemIter<T> {
    pages: PageIter<T>,
    buffer: VecDeque<T>,
}

impl<T> Iterator for ItemIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            match self.pages.next()? {
                Ok(page) => self.buffer.extend(page.items),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Async, lazy stream of page items
pub struct PagedFlux<T> {
    fetch: AsyncPageFn<T>,
}

impl<T> Clone for PagedFlux<T> {
    fn clone(&self) -> Self { Self { fetch: Arc::clone(&self.fetch) } }
}

impl<T: Send + 'static> PagedFlux<T> {
    /// Create from an async page fetcher; the fetcher receives `None` for the first page
    pub fn new(fetch: impl Fn(Option<String>) -> BoxFuture<'static, Result<Page<T>>> + Send + Sync + 'static) -> Self {
        Self { fetch: Arc::new(fetch) }
    }

    /// Stream pages starting from `continuation_token`
    pub fn by_page(&self, continuation_token: Option<String>) -> BoxStream<'static, Result<Page<T>>> {
        let fetch = Arc::clone(&self.fetch);
        stream::unfold(Some(continuation_token), move |state| {
            let fetch = Arc::clone(&fetch);
            async move {
                let token = state?;
                match fetch(token).await {
                    Ok(page) => {
                        let next = page.continuation_token.clone().map(Some);
                        Some((Ok(page), next))
                    }
                    Err(e) => Some((Err(e), None)),
                }
            }
        })
        .boxed()
    }

    /// Stream items from the beginning
    pub fn items(&self) -> BoxStream<'static, Result<T>> {
        self.by_page(None)
            .map_ok(|page| stream::iter(page.into_items().into_iter().map(Ok::<T, HttpError>)))
            .try_flatten()
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> PagedIterable<u32> {
        PagedIterable::new(|token| match token.as_deref() {
            None => Ok(Page::new(vec![1, 2], Some("p2".to_string()))),
            Some("p2") => Ok(Page::new(vec![3], Some("p3".to_string()))),
            Some("p3") => Ok(Page::new(vec![4], None)),
            Some(other) => Err(HttpError::Transport(format!("bad token {}", other))),
        })
    }

    #[test]
    fn test_items_across_pages() {
        let items: Vec<u32> = pages().iter().collect::<Result<_>>().expect("all pages");
        assert_eq!(items, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_resume_from_token() {
        let listing = pages();
        let mut first = listing.by_page(None);
        let page = first.next().expect("first page").expect("ok");
        let token = page.continuation_token().map(str::to_string);

        let resumed: Vec<Vec<u32>> = listing
            .by_page(token)
            .map(|p| p.map(Page::into_items))
            .collect::<Result<_>>()
            .expect("resumed pages");
        assert_eq!(resumed, vec![vec![3], vec![4]]);
    }

    #[test]
    fn test_error_ends_traversal() {
        let mut iter = pages().by_page(Some("nope".to_string()));
        assert!(matches!(iter.next(), Some(Err(HttpError::Transport(_)))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_page_from_response() {
        let response = HttpResponse::new(200)
            .with_json(&serde_json::json!({"value": [1, 2], "nextLink": "https://svc/next"}));
        let page: Page<u32> = Page::from_response(&response, "value", Some("nextLink")).expect("page");
        assert_eq!(page.items(), &[1, 2]);
        assert_eq!(page.continuation_token(), Some("https://svc/next"));
    }

    #[test]
    fn test_page_token_from_header() {
        let response = HttpResponse::new(200)
            .with_json(&serde_json::json!({"value": [5]}))
            .with_header("x-ms-continuation", "abc");
        let page: Page<u32> = Page::from_response_header(&response, "value", "x-ms-continuation").expect("page");
        assert_eq!(page.items(), &[5]);
        assert_eq!(page.continuation_token(), Some("abc"));
    }
}
