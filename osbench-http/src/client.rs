use bytes::Bytes;
use http_body_util::Empty;
use hyper::Request;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

use super::config::DEFAULT_CONNECT_TIMEOUT;
use super::{Error, Result};

#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(Some(DEFAULT_CONNECT_TIMEOUT))
    }
}

impl HttpClient {
    /// Must be called inside a tokio runtime context.
    #[must_use]
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);
        http_connector.set_connect_timeout(connect_timeout);

        let https_connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let inner = Client::builder(TokioExecutor::new()).build(https_connector);

        Self { inner }
    }

    /// Sends a GET and returns once the response head has arrived; the body is left
    /// unread. `timeout` bounds the wait for the head.
    pub async fn get(
        &self,
        url: &url::Url,
        headers: &[(&'static str, &str)],
        timeout: Option<Duration>,
    ) -> Result<hyper::Response<Incoming>> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::UnsupportedScheme(url.to_string()));
        }
        let uri: hyper::Uri = url
            .as_str()
            .parse()
            .map_err(|_| Error::InvalidUrl(url.to_string()))?;

        let mut builder = Request::builder().method(http::Method::GET).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, http::header::HeaderValue::from_str(value)?);
        }
        let req: Request<Empty<Bytes>> = builder.body(Empty::new())?;

        let res = if let Some(timeout) = timeout {
            match tokio::time::timeout(timeout, self.inner.request(req)).await {
                Ok(res) => res?,
                Err(_) => return Err(Error::Timeout(timeout)),
            }
        } else {
            self.inner.request(req).await?
        };

        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn unreachable_host_fails_fast_with_connect_timeout() {
        let client = HttpClient::new(Some(Duration::from_millis(200)));
        let url = match url::Url::parse("http://192.0.2.1:81/") {
            Ok(v) => v,
            Err(err) => panic!("url: {err}"),
        };

        let started = Instant::now();
        let res = client.get(&url, &[], None).await;
        let elapsed = started.elapsed();

        assert!(res.is_err());
        assert!(
            elapsed < Duration::from_secs(2),
            "expected fast failure, elapsed={elapsed:?}"
        );
    }

    #[tokio::test]
    async fn rejects_non_http_schemes() {
        let client = HttpClient::default();
        let url = match url::Url::parse("ftp://example.com/x") {
            Ok(v) => v,
            Err(err) => panic!("url: {err}"),
        };
        assert!(matches!(
            client.get(&url, &[], None).await,
            Err(Error::UnsupportedScheme(_))
        ));
    }
}
