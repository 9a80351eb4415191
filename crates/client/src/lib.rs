//! HTTP client for the book server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use shelftrack_core::{
    ApiError, BookId, CatalogId, LibrarySnapshot, Rating, ReadingStatus, SearchItem, Settings,
};

mod executor;
mod wire;

pub use executor::{Executor, execute};

/// Remote operations the client depends on.
#[async_trait]
pub trait BookApi: Send + Sync {
    async fn library(&self) -> Result<LibrarySnapshot, ApiError>;
    async fn add_book(&self, catalog_id: &CatalogId, status: ReadingStatus)
    -> Result<(), ApiError>;
    async fn move_book(&self, book_id: &BookId, status: ReadingStatus) -> Result<(), ApiError>;
    async fn remove_book(&self, book_id: &BookId) -> Result<(), ApiError>;
    async fn rate_book(&self, book_id: &BookId, rating: Rating) -> Result<(), ApiError>;
    async fn search(&self, query: &str) -> Result<Vec<SearchItem>, ApiError>;
    async fn fetch_cover(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpBookApi {
    client: Client,
    base_url: String,
    origin: Url,
    session_cookie: Option<String>,
    placeholder_cover: String,
}

impl HttpBookApi {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(ApiError::transport)?;
        let base_url = settings.server_url.trim_end_matches('/').to_string();
        let origin =
            Url::parse(&base_url).map_err(|_| ApiError::InvalidInput("invalid server url"))?;
        Ok(Self {
            client,
            base_url,
            origin,
            session_cookie: settings.session_cookie.clone(),
            placeholder_cover: settings.placeholder_cover.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// The session cookie is only sent to the book server itself.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        let to_server = Url::parse(&url).is_ok_and(|url| same_origin(&self.origin, &url));
        let builder = self.client.request(method, url);
        match &self.session_cookie {
            Some(cookie) if to_server => builder.header(COOKIE, cookie),
            _ => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        builder.send().await.map_err(ApiError::transport)
    }

    /// Operations that only care about a 2xx status.
    async fn expect_success(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        let response = self.send(builder).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Transport(format!("server responded with {status}")))
        }
    }

    /// Operations answering `{success, error?}`. The body decides, whatever the
    /// status code; an unreadable body is a transport failure.
    async fn expect_outcome(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        let response = self.send(builder).await?;
        let status = response.status();
        let outcome = response.json::<wire::Outcome>().await.map_err(|err| {
            ApiError::Transport(format!("unreadable response ({status}): {err}"))
        })?;
        if outcome.success {
            Ok(())
        } else {
            Err(ApiError::Application(outcome.error))
        }
    }
}

/// Scheme, host and effective port all match.
fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

#[async_trait]
impl BookApi for HttpBookApi {
    async fn library(&self) -> Result<LibrarySnapshot, ApiError> {
        let builder = self
            .request(Method::GET, "/books/library")
            .header(ACCEPT, "application/json");
        let response = self.send(builder).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Transport(format!("server responded with {status}")));
        }
        let body = response
            .json::<wire::LibraryResponse>()
            .await
            .map_err(ApiError::transport)?;
        Ok(body.into_snapshot())
    }

    async fn add_book(
        &self,
        catalog_id: &CatalogId,
        status: ReadingStatus,
    ) -> Result<(), ApiError> {
        if catalog_id.is_empty() {
            return Err(ApiError::InvalidInput("missing catalog id"));
        }
        let form = Form::new()
            .text("google_books_id", catalog_id.to_string())
            .text("status", status.as_str());
        self.expect_success(self.request(Method::POST, "/books/add").multipart(form))
            .await
    }

    async fn move_book(&self, book_id: &BookId, status: ReadingStatus) -> Result<(), ApiError> {
        if book_id.is_empty() {
            return Err(ApiError::InvalidInput("missing book id"));
        }
        let form = Form::new()
            .text("book_id", book_id.to_string())
            .text("status", status.as_str());
        self.expect_success(self.request(Method::POST, "/books/move").multipart(form))
            .await
    }

    async fn remove_book(&self, book_id: &BookId) -> Result<(), ApiError> {
        if book_id.is_empty() {
            return Err(ApiError::InvalidInput("missing book id"));
        }
        let builder = self
            .request(Method::POST, "/books/remove")
            .form(&[("book_id", book_id.as_str())]);
        self.expect_outcome(builder).await
    }

    async fn rate_book(&self, book_id: &BookId, rating: Rating) -> Result<(), ApiError> {
        if book_id.is_empty() {
            return Err(ApiError::InvalidInput("missing book id"));
        }
        let form = Form::new()
            .text("book_id", book_id.to_string())
            .text("rating", rating.to_string());
        self.expect_outcome(self.request(Method::POST, "/books/rate").multipart(form))
            .await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchItem>, ApiError> {
        let builder = self
            .request(Method::GET, "/books/search")
            .query(&[("q", query)]);
        let response = self.send(builder).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Transport(format!("server responded with {status}")));
        }
        let body = response
            .json::<wire::SearchResponse>()
            .await
            .map_err(ApiError::transport)?;
        Ok(body.into_items(&self.placeholder_cover))
    }

    async fn fetch_cover(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.send(self.request(Method::GET, url)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Transport(format!("server responded with {status}")));
        }
        let bytes = response.bytes().await.map_err(ApiError::transport)?;
        Ok(bytes.to_vec())
    }
}
