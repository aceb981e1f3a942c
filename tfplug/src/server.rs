//! Server module for running Terraform providers
//!
//! Terraform launches the provider binary with the go-plugin magic cookie in
//! the environment and reads a single handshake line from stdout. Everything
//! else the provider wants to say must go to stderr.

use crate::error::{Result, TfplugError};
use crate::grpc::GrpcProviderServer;
use crate::logging::{init_logging, LogLevel};
use crate::proto::ProviderServer;
use crate::provider::Provider;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tonic::transport::{Identity, Server, ServerTlsConfig};

/// Environment variable carrying the go-plugin magic cookie
pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
/// Value Terraform sets for the magic cookie
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

const CORE_PROTOCOL_VERSION: u32 = 1;
const APP_PROTOCOL_VERSION: u32 = 6;

/// Server configuration for running a Terraform provider
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PEM certificate; TLS is enabled when both cert and key are set
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    /// Maximum message size in bytes
    pub max_message_size: usize,
    pub enable_logging: bool,
    pub log_level: LogLevel,
    /// Grace period for in-flight requests after Ctrl-C
    pub shutdown_timeout: Duration,
    /// Skip the magic cookie check (useful when launching the binary by hand)
    pub skip_handshake_check: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cert_path: None,
            key_path: None,
            max_message_size: 256 << 20, // 256MB
            enable_logging: true,
            log_level: LogLevel::Info,
            shutdown_timeout: Duration::from_secs(30),
            skip_handshake_check: false,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults plus `TFPLUG_TLS_CERT` / `TFPLUG_TLS_KEY`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("TFPLUG_TLS_CERT") {
            if !path.is_empty() {
                config.cert_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("TFPLUG_TLS_KEY") {
            if !path.is_empty() {
                config.key_path = Some(PathBuf::from(path));
            }
        }
        config
    }

    pub fn with_cert_path(mut self, path: PathBuf) -> Self {
        self.cert_path = Some(path);
        self
    }

    pub fn with_key_path(mut self, path: PathBuf) -> Self {
        self.key_path = Some(path);
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn without_logging(mut self) -> Self {
        self.enable_logging = false;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn without_handshake_check(mut self) -> Self {
        self.skip_handshake_check = true;
        self
    }

    fn tls_paths(&self) -> Result<Option<(&PathBuf, &PathBuf)>> {
        match (&self.cert_path, &self.key_path) {
            (Some(cert), Some(key)) => Ok(Some((cert, key))),
            (None, None) => Ok(None),
            _ => Err(TfplugError::TlsError(
                "both a certificate and a key are required to enable TLS".to_string(),
            )),
        }
    }
}

/// Checks that Terraform launched us
pub fn verify_magic_cookie() -> Result<()> {
    match std::env::var(MAGIC_COOKIE_KEY) {
        Ok(value) if value == MAGIC_COOKIE_VALUE => Ok(()),
        _ => Err(TfplugError::HandshakeError(
            "This binary is a plugin. It is not meant to be executed directly. \
             Execute the program that consumes these plugins, which will load \
             any plugins automatically."
                .to_string(),
        )),
    }
}

/// Formats the go-plugin handshake line
///
/// With TLS the base64 DER certificate is appended so go-plugin can trust it.
pub fn handshake_line(addr: SocketAddr, server_cert: Option<&str>) -> String {
    let mut line = format!(
        "{}|{}|tcp|{}|grpc",
        CORE_PROTOCOL_VERSION, APP_PROTOCOL_VERSION, addr
    );
    if let Some(cert) = server_cert {
        line.push('|');
        line.push_str(cert);
    }
    line
}

/// Base64 body of the first PEM certificate, without padding
fn pem_certificate_body(pem: &str) -> Option<String> {
    let mut body = String::new();
    let mut inside = false;
    for line in pem.lines() {
        let line = line.trim();
        if line.starts_with("-----BEGIN CERTIFICATE") {
            inside = true;
        } else if line.starts_with("-----END CERTIFICATE") {
            break;
        } else if inside {
            body.push_str(line);
        }
    }
    let body = body.trim_end_matches('=').to_string();
    (!body.is_empty()).then_some(body)
}

/// Main entry point for running a provider
pub async fn serve<P: Provider + 'static>(provider: P, config: ServerConfig) -> Result<()> {
    if config.enable_logging {
        init_logging(config.log_level);
    }

    if !config.skip_handshake_check {
        if let Err(e) = verify_magic_cookie() {
            eprintln!("{}", e);
            return Err(e);
        }
    }

    let grpc_server = GrpcProviderServer::new(provider);
    let provider_service = ProviderServer::new(grpc_server)
        .max_decoding_message_size(config.max_message_size)
        .max_encoding_message_size(config.max_message_size);

    let mut builder = Server::builder();
    let mut server_cert = None;
    if let Some((cert_path, key_path)) = config.tls_paths()? {
        // tonic's rustls backend needs a process-wide crypto provider
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let cert = tokio::fs::read(cert_path)
            .await
            .map_err(|e| TfplugError::TlsError(format!("Failed to read certificate: {}", e)))?;
        let key = tokio::fs::read(key_path)
            .await
            .map_err(|e| TfplugError::TlsError(format!("Failed to read key: {}", e)))?;

        server_cert = pem_certificate_body(&String::from_utf8_lossy(&cert));
        let identity = Identity::from_pem(cert, key);
        builder = builder.tls_config(ServerTlsConfig::new().identity(identity))?;
        tracing::debug!(cert = %cert_path.display(), "TLS enabled");
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    println!("{}", handshake_line(addr, server_cert.as_deref()));
    tracing::info!(%addr, tls = server_cert.is_some(), "provider listening");

    let shutdown_timeout = config.shutdown_timeout;
    let incoming = tokio_stream::wrappers::TcpListenerStream::new(listener);
    let server = builder
        .add_service(provider_service)
        .serve_with_incoming_shutdown(incoming, async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, shutting down");
            }
        });

    tokio::pin!(server);
    tokio::select! {
        result = &mut server => result?,
        _ = async {
            // Only starts counting once the shutdown signal has fired
            let _ = tokio::signal::ctrl_c().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!("shutdown timeout elapsed with requests still in flight");
        }
    }

    Ok(())
}

/// Convenience function to run a provider with configuration from the environment
pub async fn serve_default<P: Provider + 'static>(provider: P) -> Result<()> {
    serve(provider, ServerConfig::from_env()).await
}
