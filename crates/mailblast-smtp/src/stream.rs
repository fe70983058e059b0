//! Low-level SMTP stream handling (TCP, implicit TLS, STARTTLS upgrade).

use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

use crate::error::{Error, Result};

/// SMTP stream (plain TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
}

impl SmtpStream {
    /// Reads one CRLF-terminated line, bounded by `deadline`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the deadline passes,
    /// [`Error::ConnectionClosed`] on EOF, or an I/O error.
    pub async fn read_line(&mut self, deadline: Duration) -> Result<String> {
        let mut line = String::new();
        let read = match self {
            Self::Tcp(reader) => timeout(deadline, reader.read_line(&mut line)).await,
            Self::Tls(reader) => timeout(deadline, reader.read_line(&mut line)).await,
        };
        let n = read.map_err(|_| Error::Timeout(deadline))??;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        Ok(line.trim_end().to_string())
    }

    /// Writes and flushes `data`, bounded by `deadline`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the deadline passes, or an I/O error.
    pub async fn write_all(&mut self, data: &[u8], deadline: Duration) -> Result<()> {
        let write = async {
            match self {
                Self::Tcp(reader) => {
                    reader.get_mut().write_all(data).await?;
                    reader.get_mut().flush().await
                }
                Self::Tls(reader) => {
                    reader.get_mut().write_all(data).await?;
                    reader.get_mut().flush().await
                }
            }
        };
        timeout(deadline, write)
            .await
            .map_err(|_| Error::Timeout(deadline))??;
        Ok(())
    }

    /// Upgrades a plain TCP stream to TLS after a `STARTTLS` exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already TLS or the handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str, deadline: Duration) -> Result<Self> {
        let tcp = match self {
            Self::Tcp(reader) => reader.into_inner(),
            Self::Tls(_) => return Err(Error::Protocol("already using TLS".into())),
        };

        let connector = tls_connector();
        let server_name = server_name(hostname)?;
        let tls = timeout(deadline, connector.connect(server_name, tcp))
            .await
            .map_err(|_| Error::Timeout(deadline))??;
        Ok(Self::Tls(Box::new(BufReader::new(tls))))
    }
}

/// Connects over plain TCP (ports 25 and 587).
///
/// # Errors
///
/// Returns [`Error::Timeout`] or an I/O error if the connection fails.
pub async fn connect(hostname: &str, port: u16, deadline: Duration) -> Result<SmtpStream> {
    let addr = format!("{hostname}:{port}");
    let stream = timeout(deadline, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::Timeout(deadline))??;
    Ok(SmtpStream::Tcp(BufReader::new(stream)))
}

/// Connects with implicit TLS (port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16, deadline: Duration) -> Result<SmtpStream> {
    let addr = format!("{hostname}:{port}");
    let tcp = timeout(deadline, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::Timeout(deadline))??;

    let connector = tls_connector();
    let name = server_name(hostname)?;
    let tls = timeout(deadline, connector.connect(name, tcp))
        .await
        .map_err(|_| Error::Timeout(deadline))??;
    Ok(SmtpStream::Tls(Box::new(BufReader::new(tls))))
}

fn server_name(hostname: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("invalid hostname: {hostname}")))
}

/// TLS connector with the webpki root store.
fn tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
