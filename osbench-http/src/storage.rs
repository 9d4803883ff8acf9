use std::future::Future;
use std::sync::RwLock;

use hyper::body::Incoming;
use osbench_core::{AuthFlag, ByteStream, Config, Interrupt, StorageApi, StorageError};
use tokio::runtime::Handle;

use super::client::HttpClient;
use super::config::{Credentials, HttpStorageConfig};
use super::reader::{BodyReader, interrupted};
use super::{Error, Result};

#[derive(Debug, Clone)]
struct AuthSession {
    storage_url: url::Url,
    token: Option<String>,
}

/// Object store reached over HTTP, speaking the Swift container-listing API.
///
/// The [`StorageApi`] calls block the calling thread on `handle`, so they must come from
/// plain OS threads (the worker threads of a run), never from inside the runtime.
/// With [`HttpStorage::with_interrupt`], a raised interrupt cuts any pending request or
/// body read short with an `Interrupted` storage error.
#[derive(Debug)]
pub struct HttpStorage {
    client: HttpClient,
    handle: Handle,
    config: HttpStorageConfig,
    auth_url: Option<url::Url>,
    session: RwLock<Option<AuthSession>>,
    auth: AuthFlag,
    interrupt: Option<Interrupt>,
}

impl HttpStorage {
    pub fn new(config: HttpStorageConfig, handle: Handle) -> Result<Self> {
        let (auth_url, session) = match &config.credentials {
            Credentials::Swift { auth_url, .. } => (Some(parse_url(auth_url)?), None),
            Credentials::Static { storage_url, token } => (
                None,
                Some(AuthSession {
                    storage_url: parse_url(storage_url)?,
                    token: token.clone(),
                }),
            ),
        };

        // The connector spawns onto the runtime it is built in.
        let client = {
            let _guard = handle.enter();
            HttpClient::new(Some(config.connect_timeout))
        };

        Ok(Self {
            client,
            handle,
            config,
            auth_url,
            session: RwLock::new(session),
            auth: AuthFlag::default(),
            interrupt: None,
        })
    }

    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    pub fn from_config(config: &Config, handle: Handle) -> Result<Self> {
        Self::new(HttpStorageConfig::from_config(config)?, handle)
    }

    pub fn config(&self) -> &HttpStorageConfig {
        &self.config
    }

    async fn authenticate(&self, auth_url: &url::Url) -> Result<AuthSession> {
        let Credentials::Swift {
            username, password, ..
        } = &self.config.credentials
        else {
            return Err(Error::MissingConfig("auth_url"));
        };

        let res = self
            .client
            .get(
                auth_url,
                &[
                    ("x-auth-user", username.as_str()),
                    ("x-auth-key", password.as_str()),
                ],
                self.config.timeout,
            )
            .await?;
        if !res.status().is_success() {
            return Err(Error::Status(res.status()));
        }

        let storage_url = parse_url(required_header(&res, "x-storage-url")?)?;
        let token = required_header(&res, "x-auth-token")?.to_string();
        Ok(AuthSession {
            storage_url,
            token: Some(token),
        })
    }

    fn current_session(&self) -> std::result::Result<AuthSession, StorageError> {
        if let Some(session) = self.read_session() {
            return Ok(session);
        }
        self.login()?;
        self.read_session()
            .ok_or_else(|| StorageError::other("http storage has no session after login"))
    }

    /// Blocks on `fut` unless the interrupt is raised first.
    fn block_on<T>(
        &self,
        fut: impl Future<Output = Result<T>>,
        what: &str,
    ) -> std::result::Result<T, StorageError> {
        let interrupt = self.interrupt.as_ref();
        self.handle.block_on(async move {
            tokio::select! {
                res = fut => res.map_err(Error::into_storage_error),
                () = interrupted(interrupt) => {
                    Err(StorageError::interrupted(format!("{what} interrupted")))
                }
            }
        })
    }

    fn read_session(&self) -> Option<AuthSession> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl StorageApi for HttpStorage {
    fn list(
        &self,
        container: &str,
        object: &str,
        _config: &Config,
    ) -> std::result::Result<ByteStream, StorageError> {
        let session = self.current_session()?;
        let url = listing_url(&session.storage_url, container, object)
            .map_err(Error::into_storage_error)?;

        let mut headers = Vec::with_capacity(1);
        if let Some(token) = session.token.as_deref() {
            headers.push(("x-auth-token", token));
        }

        let res = self.block_on(
            self.client.get(&url, &headers, self.config.timeout),
            "http listing request",
        )?;
        if !res.status().is_success() {
            tracing::debug!(status = %res.status(), %url, "listing rejected");
            return Err(Error::Status(res.status()).into_storage_error());
        }

        let body: Incoming = res.into_body();
        Ok(Box::new(
            BodyReader::new(self.handle.clone(), body).with_interrupt(self.interrupt.clone()),
        ))
    }

    /// Exchanges the configured credentials for a fresh token. A no-op with static
    /// credentials.
    fn login(&self) -> std::result::Result<(), StorageError> {
        let Some(auth_url) = &self.auth_url else {
            return Ok(());
        };

        let session = self.block_on(self.authenticate(auth_url), "http login")?;
        tracing::debug!(storage_url = %session.storage_url, "authenticated");

        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session);
        Ok(())
    }

    fn auth_flag(&self) -> bool {
        self.auth.get()
    }

    fn set_auth_flag(&self, authorized: bool) {
        self.auth.set(authorized);
    }
}

fn parse_url(s: &str) -> Result<url::Url> {
    let url = url::Url::parse(s).map_err(|_| Error::InvalidUrl(s.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::UnsupportedScheme(s.to_string()));
    }
    Ok(url)
}

fn required_header<'a, B>(res: &'a hyper::Response<B>, name: &'static str) -> Result<&'a str> {
    res.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(Error::MissingAuthHeader(name))
}

/// `{storage_url}/{container}?prefix={object}`, with both names percent-encoded.
fn listing_url(storage_url: &url::Url, container: &str, object: &str) -> Result<url::Url> {
    let mut url = storage_url.clone();
    url.path_segments_mut()
        .map_err(|()| Error::InvalidUrl(storage_url.to_string()))?
        .pop_if_empty()
        .push(container);
    url.query_pairs_mut().append_pair("prefix", object);
    Ok(url)
}
