//! QUIC endpoints for the inventory sync layer.
//!
//! Both sides run the same [`session_transport`]: a session uses exactly one
//! unidirectional stream per direction, and flow-control windows are sized so
//! a maximum-length frame never stalls waiting for credit.
//!
//! The host presents a certificate generated at bind time. Clients skip
//! chain validation but still check handshake signatures, which is enough for
//! LAN and test sessions.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use quinn::{ClientConfig, Endpoint, ServerConfig, TransportConfig, VarInt};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use tracing::{debug, info};

use crate::channel::{FRAME_HEADER_LEN, MAX_FRAME_LEN};

const ALPN: &[u8] = b"gridstash";

/// Name the host certificate is issued for and clients dial.
const SERVER_NAME: &str = "gridstash.local";

/// Unidirectional streams a peer may have open: the single ordered channel.
const SESSION_STREAMS: u32 = 1;

/// Room for two maximum-length frames in flight on the session stream.
const STREAM_WINDOW: u32 = 2 * (MAX_FRAME_LEN + FRAME_HEADER_LEN) as u32;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(5);
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport parameters shared by host and client.
fn session_transport() -> Result<TransportConfig> {
    let mut transport = TransportConfig::default();
    transport
        .max_concurrent_uni_streams(VarInt::from_u32(SESSION_STREAMS))
        .max_concurrent_bidi_streams(VarInt::from_u32(0))
        .stream_receive_window(VarInt::from_u32(STREAM_WINDOW))
        .receive_window(VarInt::from_u32(STREAM_WINDOW))
        .send_window(u64::from(STREAM_WINDOW))
        .keep_alive_interval(Some(KEEP_ALIVE_INTERVAL))
        .max_idle_timeout(Some(IDLE_TIMEOUT.try_into().context("Idle timeout out of range")?));
    Ok(transport)
}

fn crypto_provider() -> Arc<CryptoProvider> {
    // Already installed by an earlier endpoint in this process.
    let _ = rustls::crypto::ring::default_provider().install_default();
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Certificate and key the host presents.
struct HostIdentity {
    cert: CertificateDer<'static>,
    key: PrivateKeyDer<'static>,
}

impl HostIdentity {
    fn generate() -> Result<Self> {
        debug!(name = SERVER_NAME, "Generating host certificate");
        let certified = rcgen::generate_simple_self_signed(vec![SERVER_NAME.to_string()])
            .context("Failed to generate host certificate")?;
        Ok(Self {
            cert: CertificateDer::from(certified.cert),
            key: PrivateKeyDer::Pkcs8(certified.key_pair.serialize_der().into()),
        })
    }
}

/// Host endpoint accepting client sessions.
pub struct ServerEndpoint {
    endpoint: Endpoint,
    addr: SocketAddr,
}

impl ServerEndpoint {
    /// Bind to `addr` (port 0 picks a free port).
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let provider = crypto_provider();
        let identity = HostIdentity::generate()?;

        let mut tls = rustls::ServerConfig::builder_with_provider(provider)
            .with_protocol_versions(&[&rustls::version::TLS13])
            .context("TLS 1.3 unavailable")?
            .with_no_client_auth()
            .with_single_cert(vec![identity.cert], identity.key)
            .context("Failed to build TLS server config")?;
        tls.alpn_protocols = vec![ALPN.to_vec()];

        let mut config = ServerConfig::with_crypto(Arc::new(
            quinn::crypto::rustls::QuicServerConfig::try_from(tls)
                .context("TLS config unusable for QUIC")?,
        ));
        config.transport_config(Arc::new(session_transport()?));

        let endpoint = Endpoint::server(config, addr)
            .with_context(|| format!("Failed to bind host endpoint on {addr}"))?;
        let addr = endpoint.local_addr()?;
        info!("Host endpoint bound to {}", addr);

        Ok(Self { endpoint, addr })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Next incoming connection, or `None` once the endpoint is closed.
    pub async fn accept(&self) -> Option<quinn::Incoming> {
        self.endpoint.accept().await
    }

    /// Stop accepting and close every session.
    pub fn close(&self) {
        self.endpoint.close(0u32.into(), b"server shutting down");
    }
}

/// Client endpoint dialing a host.
pub struct ClientEndpoint {
    endpoint: Endpoint,
}

impl ClientEndpoint {
    /// Client endpoint on an ephemeral local port.
    pub fn new() -> Result<Self> {
        let provider = crypto_provider();
        let verifier = Arc::new(AcceptHostCertificate {
            algorithms: provider.signature_verification_algorithms,
        });

        let mut tls = rustls::ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(&[&rustls::version::TLS13])
            .context("TLS 1.3 unavailable")?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();
        tls.alpn_protocols = vec![ALPN.to_vec()];

        let mut config = ClientConfig::new(Arc::new(
            quinn::crypto::rustls::QuicClientConfig::try_from(tls)
                .context("TLS config unusable for QUIC")?,
        ));
        config.transport_config(Arc::new(session_transport()?));

        let mut endpoint = Endpoint::client(SocketAddr::from(([0, 0, 0, 0], 0)))
            .context("Failed to create client endpoint")?;
        endpoint.set_default_client_config(config);
        debug!("Client endpoint on {}", endpoint.local_addr()?);

        Ok(Self { endpoint })
    }

    /// Open a session with the host at `server_addr`.
    pub async fn connect(&self, server_addr: SocketAddr) -> Result<quinn::Connection> {
        info!("Connecting to host at {}", server_addr);
        let connection = self
            .endpoint
            .connect(server_addr, SERVER_NAME)
            .context("Failed to initiate connection")?
            .await
            .context("Failed to establish connection")?;
        debug!("Session established with {}", server_addr);
        Ok(connection)
    }

    /// Close the endpoint and every session on it.
    pub fn close(&self) {
        self.endpoint.close(0u32.into(), b"client shutting down");
    }
}

/// Trusts whatever certificate the host presents while still requiring valid
/// handshake signatures from it.
#[derive(Debug)]
struct AcceptHostCertificate {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for AcceptHostCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelManager, ChannelType};

    async fn session() -> (ServerEndpoint, ClientEndpoint, quinn::Connection, quinn::Connection) {
        let server = ServerEndpoint::bind("127.0.0.1:0".parse().unwrap())
            .expect("Failed to bind host");
        let client = ClientEndpoint::new().expect("Failed to create client");
        let (incoming, client_conn) =
            tokio::join!(server.accept(), client.connect(server.local_addr()));
        let server_conn = incoming
            .expect("Host closed early")
            .await
            .expect("Failed to accept connection");
        (server, client, server_conn, client_conn.expect("Failed to connect"))
    }

    #[test]
    fn windows_fit_a_maximum_frame() {
        assert!(STREAM_WINDOW as usize >= MAX_FRAME_LEN + FRAME_HEADER_LEN);
        assert!(session_transport().is_ok());
    }

    #[tokio::test]
    async fn host_certificate_is_accepted() {
        let (server, client, server_conn, client_conn) = session().await;
        assert_eq!(client_conn.remote_address(), server.local_addr());
        assert!(server_conn.remote_address().port() > 0);
        client.close();
        server.close();
    }

    #[tokio::test]
    async fn maximum_frame_crosses_the_session() {
        let (server, client, server_conn, client_conn) = session().await;
        let sender = ChannelManager::new(client_conn);
        let receiver = ChannelManager::new(server_conn);

        let payload = vec![0xAB; MAX_FRAME_LEN];
        let (sent, received) = tokio::join!(
            sender.send(ChannelType::Inventory, &payload),
            receiver.recv()
        );
        sent.expect("send failed");
        let (channel, data) = received.expect("recv failed");
        assert_eq!(channel, ChannelType::Inventory);
        assert_eq!(data.len(), MAX_FRAME_LEN);

        client.close();
        server.close();
    }

    #[tokio::test]
    async fn peers_allow_a_single_session_stream() {
        let (server, client, _server_conn, client_conn) = session().await;
        let _first = client_conn.open_uni().await.expect("first stream");
        let second =
            tokio::time::timeout(Duration::from_millis(200), client_conn.open_uni()).await;
        assert!(second.is_err());
        let bidi = tokio::time::timeout(Duration::from_millis(200), client_conn.open_bi()).await;
        assert!(bidi.is_err());
        client.close();
        server.close();
    }
}
