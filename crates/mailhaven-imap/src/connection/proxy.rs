//! Proxy tunnelling for the transport layer.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::config::Proxy;
use super::stream::BoxedIo;
use crate::{Error, Result};

/// Opens a TCP connection to `(host, port)` through the given proxy.
pub async fn connect_via(proxy: &Proxy, host: &str, port: u16) -> Result<BoxedIo> {
    match proxy {
        Proxy::HttpConnect {
            host: proxy_host,
            port: proxy_port,
        } => {
            let stream = TcpStream::connect((proxy_host.as_str(), *proxy_port)).await?;
            let stream = http_connect(stream, host, port).await?;
            Ok(Box::new(stream))
        }
        Proxy::Socks5 {
            host: proxy_host,
            port: proxy_port,
        } => {
            let stream = tokio_socks::tcp::Socks5Stream::connect(
                (proxy_host.as_str(), *proxy_port),
                (host, port),
            )
            .await
            .map_err(|e| Error::Proxy(format!("SOCKS5 connect failed: {e}")))?;
            Ok(Box::new(stream))
        }
    }
}

/// Issues an HTTP CONNECT request and waits for a 2xx status.
async fn http_connect(mut stream: TcpStream, host: &str, port: u16) -> Result<TcpStream> {
    let request = format!("CONNECT {host}:{port} HTTP/1.1\r\nHost: {host}:{port}\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    // Read until the end of the response headers
    let mut response = Vec::with_capacity(256);
    let mut byte = [0u8; 1];
    while !response.ends_with(b"\r\n\r\n") {
        if response.len() > 8192 {
            return Err(Error::Proxy("CONNECT response too large".to_string()));
        }
        let n = stream.read(&mut byte).await?;
        if n == 0 {
            return Err(Error::Proxy("proxy closed during CONNECT".to_string()));
        }
        response.push(byte[0]);
    }

    let status_line = response
        .split(|&b| b == b'\r')
        .next()
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .unwrap_or_default();

    // "HTTP/1.1 200 Connection established"
    let accepted = status_line
        .split_whitespace()
        .nth(1)
        .is_some_and(|code| code.starts_with('2'));

    if accepted {
        Ok(stream)
    } else {
        Err(Error::Proxy(format!("CONNECT refused: {status_line}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    async fn proxy_stub(listener: TcpListener, status: &'static str) {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(status.as_bytes()).await;
        }
    }

    #[tokio::test]
    async fn http_connect_accepts_2xx() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|_| {
            panic!("bind failed");
        });
        let addr = listener.local_addr().map_or_else(
            |_| panic!("no local addr"),
            |a| a,
        );
        tokio::spawn(proxy_stub(
            listener,
            "HTTP/1.1 200 Connection established\r\n\r\n",
        ));

        let proxy = Proxy::HttpConnect {
            host: addr.ip().to_string(),
            port: addr.port(),
        };
        let result = connect_via(&proxy, "imap.example.com", 993).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn http_connect_rejects_failure_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|_| {
            panic!("bind failed");
        });
        let addr = listener.local_addr().map_or_else(
            |_| panic!("no local addr"),
            |a| a,
        );
        tokio::spawn(proxy_stub(listener, "HTTP/1.1 403 Forbidden\r\n\r\n"));

        let proxy = Proxy::HttpConnect {
            host: addr.ip().to_string(),
            port: addr.port(),
        };
        let result = connect_via(&proxy, "imap.example.com", 993).await;
        assert!(matches!(result, Err(Error::Proxy(_))));
    }
}
