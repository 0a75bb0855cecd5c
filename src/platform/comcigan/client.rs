//! Represents a client abstraction for the `컴시간학생` service, both public and private methods.

use crate::stdx::{encoding, http::DEFAULT_USER_AGENT};

use super::{
    discovery,
    errors::{ClientError, DiscoveryError},
    session::{Options, Session},
};
use std::sync::Arc;
use url::Url;

/// Address of the service root page. It only holds a `frame` pointing at the real service.
pub const DEFAULT_ROOT: &str = "http://컴시간학생.kr";

/// A builder for configuring and creating instances of [`Client`] with custom settings.
///
/// # Example
///
/// ```
/// # use comcigan::platform::comcigan::ClientBuilder;
/// let client = ClientBuilder::new()
///     .user_agent("custom-agent/1.0")
///     .build()?;
/// # Ok::<(), comcigan::platform::comcigan::errors::ClientError>(())
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    builder: reqwest::ClientBuilder,
    root: Option<String>,
}

impl Default for ClientBuilder {
    #[must_use]
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    ///
    /// This includes a default user agent (`comcigan/VERSION`) and the default root [`DEFAULT_ROOT`].
    ///
    /// # Example
    ///
    /// ```
    /// # use comcigan::platform::comcigan::ClientBuilder;
    /// let builder = ClientBuilder::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        // NOTE: the service is only reachable over plain `http`, so `https_only` must stay off.
        let builder = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .use_rustls_tls();

        Self {
            builder,
            root: None,
        }
    }

    /// Sets a custom `User-Agent` header for the [`Client`].
    #[must_use]
    pub fn user_agent(self, user_agent: &str) -> Self {
        Self {
            builder: self.builder.user_agent(user_agent),
            root: self.root,
        }
    }

    /// Overrides the service root page the [`Client`] starts discovery from.
    ///
    /// Useful for mirrors of the service, or a mock server in tests.
    ///
    /// # Example
    ///
    /// ```
    /// # use comcigan::platform::comcigan::ClientBuilder;
    /// let client = ClientBuilder::new()
    ///     .root("http://127.0.0.1:8080/")
    ///     .build()?;
    /// # Ok::<(), comcigan::platform::comcigan::errors::ClientError>(())
    /// ```
    #[must_use]
    pub fn root(self, root: &str) -> Self {
        Self {
            builder: self.builder,
            root: Some(root.to_owned()),
        }
    }

    /// Consumes the `ClientBuilder` and returns a fully-configured [`Client`].
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the root is not a valid URL, or if the underlying HTTP
    /// client could not be built (TLS backend or resolver initialization failure).
    pub fn build(self) -> Result<Client, ClientError> {
        let root = self.root.as_deref().unwrap_or(DEFAULT_ROOT);
        let root = Url::parse(root).map_err(|err| ClientError::Unexpected(err.into()))?;

        Ok(Client {
            root: Arc::new(root),
            http: self
                .builder
                .build()
                .map_err(|err| ClientError::Unexpected(err.into()))?,
        })
    }
}

/// A high-level, asynchronous client for the `컴시간학생` service.
///
/// The `Client` itself holds no protocol state. Everything the service hands out
/// at runtime lives in the [`Session`] returned by [`Client::init()`].
///
/// # Example
///
/// ```no_run
/// # use comcigan::platform::comcigan::{Client, Options, errors::Error};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Error> {
/// let client = Client::new();
///
/// let mut session = client.init(Options::default()).await?;
/// let schools = session.search("기흥").await?;
///
/// session.set_school(schools[0].code());
/// let timetable = session.timetable().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    pub(super) http: reqwest::Client,
    root: Arc<Url>,
}

// Creation impls
impl Client {
    /// Instantiates a new [`Client`] with the default user agent and root.
    ///
    /// # Panics
    ///
    /// This function will panic if the TLS backend cannot be initialized or if the DNS resolver
    /// fails to load the system's configuration. Use [`ClientBuilder`] to handle that as an error.
    #[must_use]
    pub fn new() -> Self {
        ClientBuilder::new().build().expect("Client::new()")
    }

    /// Returns a [`ClientBuilder`] for creating a custom-configured `Client`.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

// Public facing impls
impl Client {
    /// Resolves the service's routing and returns a [`Session`] ready for searching schools.
    ///
    /// This fetches the root page, follows its `frame` to the framed document and extracts the
    /// protocol constants and render script from it. Nothing is cached between calls: each
    /// `init` gives an independent session.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscoveryError`] when the upstream pages can't be fetched or don't have the
    /// expected structure.
    pub async fn init(&self, options: Options) -> Result<Session, DiscoveryError> {
        let discovery = discovery::resolve(self, self.root.as_str()).await?;

        tracing::info!(
            framed_url = %discovery.framed_url(),
            base_url = %discovery.constants().base_path(),
            "resolved timetable service endpoints"
        );

        Ok(Session::new(self.clone(), Arc::new(discovery), options))
    }

    /// The root page discovery starts from.
    #[must_use]
    pub fn root(&self) -> &str {
        self.root.as_str()
    }
}

// Internal only impls
impl Client {
    /// Fetches `url` and decodes the body as UTF-8, replacing invalid sequences.
    pub(super) async fn get_text(&self, url: &str) -> Result<String, ClientError> {
        let bytes = self.get_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Fetches `url` and decodes the body as EUC-KR.
    pub(super) async fn get_legacy_text(&self, url: &str) -> Result<String, ClientError> {
        let bytes = self.get_bytes(url).await?;
        Ok(encoding::decode_legacy(&bytes))
    }

    pub(super) async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        tracing::debug!(url, "fetching");

        let response = self.http.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        tracing::debug!(url, len = bytes.len(), "fetched");

        Ok(bytes.to_vec())
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
