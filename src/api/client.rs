use reqwest::blocking::Client;
use tracing::{debug, info};

use super::cache::ResponseCache;
use super::feed::Feed;
use super::model::{parse_launches, LaunchJson};
use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// Where a sync reads launch feeds from
pub trait LaunchSource {
    fn fetch(&mut self, feed: Feed) -> Result<Vec<LaunchJson>>;
}

pub struct SpaceXClient {
    client: Client,
    base_url: String,
    cache: Option<ResponseCache>,
}

impl SpaceXClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: None,
        })
    }

    /// Write every successful response body to `cache`
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn feed_url(&self, feed: Feed) -> String {
        format!("{}/{}", self.base_url, feed.path())
    }

    /// Fetch the raw response body for a feed
    pub fn fetch_body(&self, feed: Feed) -> Result<String> {
        let url = self.feed_url(feed);
        debug!(%url, "Fetching launch feed");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text()?;
        info!(feed = %feed, bytes = body.len(), "Fetched launch feed");
        Ok(body)
    }
}

impl LaunchSource for SpaceXClient {
    fn fetch(&mut self, feed: Feed) -> Result<Vec<LaunchJson>> {
        let body = self.fetch_body(feed)?;
        let launches = parse_launches(&body)?;

        if let Some(cache) = &self.cache {
            cache.store(feed, &body)?;
        }

        Ok(launches)
    }
}

/// Reads feeds from the response cache only
pub struct CachedSource {
    cache: ResponseCache,
}

impl CachedSource {
    pub fn new(cache: ResponseCache) -> Self {
        Self { cache }
    }
}

impl LaunchSource for CachedSource {
    fn fetch(&mut self, feed: Feed) -> Result<Vec<LaunchJson>> {
        let body = self.cache.load(feed)?;
        Ok(parse_launches(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve exactly one HTTP response and hand back the request line
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            request_line
        });

        (format!("http://{addr}"), handle)
    }

    fn config(base_url: String) -> ApiConfig {
        ApiConfig {
            base_url,
            ..ApiConfig::default()
        }
    }

    #[test]
    fn test_feed_url_trims_slash() {
        let client = SpaceXClient::new(&config("https://api.example.com/v5/".into())).unwrap();
        assert_eq!(client.feed_url(Feed::Upcoming), "https://api.example.com/v5/launches/upcoming");
    }

    #[test]
    fn test_fetch_latest_object_and_cache_it() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"id": "abc", "name": "Latest", "date_utc": "2023-01-01T00:00:00.000Z"}"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(Some(dir.path().to_path_buf())).unwrap();

        let mut client = SpaceXClient::new(&config(base)).unwrap().with_cache(cache.clone());
        let launches = client.fetch(Feed::Latest).unwrap();

        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].id, "abc");
        assert!(server.join().unwrap().starts_with("GET /launches/latest "));

        let mut offline = CachedSource::new(cache);
        assert_eq!(offline.fetch(Feed::Latest).unwrap(), launches);
    }

    #[test]
    fn test_http_error_status() {
        let (base, server) = serve_once("503 Service Unavailable", "{}");
        let mut client = SpaceXClient::new(&config(base)).unwrap();

        let err = client.fetch(Feed::Past).unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
        server.join().unwrap();
    }
}
