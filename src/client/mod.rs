//! S3 client implementation.
//!
//! The client wires one configuration, one transport and one signer into
//! the services. It holds no mutable state; services are created lazily.

use crate::config::S3Config;
use crate::error::S3Error;
use crate::executor::RequestExecutor;
use crate::services::{MultipartCoordinator, ObjectsService, PresignService};
use crate::transport::{HttpTransport, ReqwestTransport};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::debug;

/// S3 client trait.
pub trait S3Client: Send + Sync {
    /// Get the objects service.
    fn objects(&self) -> &ObjectsService;

    /// Get the multipart coordinator.
    fn multipart(&self) -> &MultipartCoordinator;

    /// Get the presign service.
    fn presign(&self) -> &PresignService;

    /// Get the request executor for calls the services do not cover.
    fn executor(&self) -> &Arc<RequestExecutor>;

    /// Get the client configuration.
    fn config(&self) -> &S3Config;
}

/// S3 client implementation.
pub struct S3ClientImpl {
    config: Arc<S3Config>,
    executor: Arc<RequestExecutor>,

    objects: OnceCell<ObjectsService>,
    multipart: OnceCell<MultipartCoordinator>,
    presign: OnceCell<PresignService>,
}

impl S3ClientImpl {
    /// Create a new S3 client with the given configuration.
    pub fn new(config: S3Config, transport: Arc<dyn HttpTransport>) -> Self {
        let config = Arc::new(config);
        let executor = Arc::new(RequestExecutor::new(config.clone(), transport));

        Self {
            config,
            executor,
            objects: OnceCell::new(),
            multipart: OnceCell::new(),
            presign: OnceCell::new(),
        }
    }
}

impl S3Client for S3ClientImpl {
    fn objects(&self) -> &ObjectsService {
        self.objects
            .get_or_init(|| ObjectsService::new(self.executor.clone()))
    }

    fn multipart(&self) -> &MultipartCoordinator {
        self.multipart
            .get_or_init(|| MultipartCoordinator::new(self.executor.clone()))
    }

    fn presign(&self) -> &PresignService {
        self.presign.get_or_init(|| {
            PresignService::new(self.config.clone(), self.executor.signer().clone())
        })
    }

    fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    fn config(&self) -> &S3Config {
        &self.config
    }
}

impl std::fmt::Debug for S3ClientImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ClientImpl")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for S3 client.
///
/// Without an explicit configuration the builder reads the environment.
pub struct S3ClientBuilder {
    config: Option<S3Config>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl S3ClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            transport: None,
        }
    }

    /// Use the provided configuration.
    pub fn config(mut self, config: S3Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Result<Self, S3Error> {
        self.config = Some(S3Config::builder().from_env()?.build()?);
        Ok(self)
    }

    /// Use a custom HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the S3 client.
    pub fn build(self) -> Result<S3ClientImpl, S3Error> {
        let config = match self.config {
            Some(config) => config,
            None => S3Config::builder().from_env()?.build()?,
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::from_config(&config)?),
        };

        debug!(
            region = %config.region,
            endpoint = %config.base_url(),
            "Built S3 client"
        );
        Ok(S3ClientImpl::new(config, transport))
    }
}

impl Default for S3ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
