//! TCP listener serving the leaderboard endpoints.

use super::http::{parse_request, RequestError, Response};
use super::routes::{route, Boards};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// Shared, mutex-guarded ranking pools.
pub type SharedBoards = Arc<Mutex<Boards>>;

/// Serve forever on `0.0.0.0:port`.
pub async fn start_leaderboard_server(port: u16, boards: SharedBoards) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    log::info!("leaderboard server listening on http://localhost:{}", port);
    serve(listener, boards).await
}

/// Accept loop over an already bound listener.
pub async fn serve(listener: TcpListener, boards: SharedBoards) -> std::io::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let boards = Arc::clone(&boards);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, addr, boards).await {
                        log::warn!("connection error from {}: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                log::error!("accept error: {}", e);
            }
        }
    }
}

/// Read one request, answer it, close.
async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    boards: SharedBoards,
) -> std::io::Result<()> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let response = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(());
            }
            break Response::error(400, "incomplete request");
        }
        buf.extend_from_slice(&chunk[..n]);

        match parse_request(&buf) {
            Ok(Some(request)) => {
                log::debug!("{} {} {}", addr, request.method, request.path);
                let now_ms = chrono::Utc::now().timestamp_millis();
                let mut boards = boards.lock().await;
                break route(&request, &mut boards, now_ms);
            }
            Ok(None) => continue,
            Err(RequestError::BodyTooLarge(len)) => {
                log::warn!("{} sent a {} byte body", addr, len);
                break Response::error(413, "payload too large");
            }
            Err(e) => break Response::error(400, &e.to_string()),
        }
    };

    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}
