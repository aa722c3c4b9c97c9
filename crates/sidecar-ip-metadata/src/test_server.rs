//! Minimal HTTP responder for exercising the metadata sources
//!
//! Answers every connection with whatever the handler returns for the
//! request line and headers, then closes the connection.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A parsed request as seen by the responder
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub head: String,
}

impl SeenRequest {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

pub struct TestServer {
    pub url: String,
    requests: Arc<Mutex<Vec<SeenRequest>>>,
}

impl TestServer {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a responder on an ephemeral local port
pub async fn serve<F>(handler: F) -> TestServer
where
    F: Fn(&SeenRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }

            let head = String::from_utf8_lossy(&buf).to_string();
            let mut parts = head.split_whitespace();
            let request = SeenRequest {
                method: parts.next().unwrap_or_default().to_string(),
                path: parts.next().unwrap_or_default().to_string(),
                head: head.clone(),
            };
            seen.lock().unwrap().push(request.clone());

            let (status, body) = handler(&request);
            let response = format!(
                concat!(
                    "HTTP/1.1 {} {}\r\n",
                    "Content-Type: application/json\r\n",
                    "Content-Length: {}\r\n",
                    "Connection: close\r\n\r\n{}"
                ),
                status,
                if status < 400 { "OK" } else { "Error" },
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    TestServer { url, requests }
}
