use crate::{error::ServerError, protocol::ServerMessage, session::Session};
use chart_panels::PanelRegistry;
use futures::{SinkExt, StreamExt};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Bind the WebSocket server to the provided address.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!("WebSocket server bound to {}", addr);
    Ok(listener)
}

/// Accept connections until `shutdown` completes. Every connection runs on its own task with its
/// own [`Session`].
pub async fn serve<Shutdown>(
    listener: TcpListener,
    registry: Arc<PanelRegistry>,
    shutdown: Shutdown,
) where
    Shutdown: Future<Output = ()>,
{
    futures::pin_mut!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    info!("New WebSocket connection from {}", peer_addr);
                    tokio::spawn(handle_client(stream, peer_addr, registry.clone()));
                }
                Err(error) => {
                    warn!(%error, "failed to accept connection");
                }
            },
            _ = &mut shutdown => {
                info!("Shutting down WebSocket server");
                break;
            }
        }
    }
}

/// Handle individual WebSocket client connection
async fn handle_client(stream: TcpStream, peer_addr: SocketAddr, registry: Arc<PanelRegistry>) {
    if let Err(error) = run_session(stream, peer_addr, registry).await {
        error!("WebSocket error for {}: {}", peer_addr, error);
    }

    info!("WebSocket connection closed for {}", peer_addr);
}

async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    registry: Arc<PanelRegistry>,
) -> Result<(), ServerError> {
    let ws_stream = accept_async(stream).await?;
    debug!("WebSocket handshake completed for {}", peer_addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut session = Session::new(registry);

    send(&mut ws_sender, &session.welcome()).await?;

    while let Some(message) = ws_receiver.next().await {
        match message? {
            Message::Text(text) => {
                debug!("Received text from {}: {} bytes", peer_addr, text.len());
                let reply = session.handle_text(text.as_str());
                send(&mut ws_sender, &reply).await?;
            }
            Message::Close(_) => break,
            Message::Ping(_) => {
                // Tungstenite queues the pong, flushed with the next send
                debug!("Received ping from {}", peer_addr);
            }
            other => {
                debug!("Ignoring non-text frame from {}: {:?}", peer_addr, other);
            }
        }
    }

    Ok(())
}

async fn send<Tx>(sink: &mut Tx, message: &ServerMessage) -> Result<(), ServerError>
where
    Tx: futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(message)?;
    sink.send(Message::Text(json.into())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::connect_async;

    fn text(input: &str) -> Message {
        Message::Text(input.to_string().into())
    }

    async fn next_json<Stream>(stream: &mut Stream) -> serde_json::Value
    where
        Stream: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(payload))) => {
                    return serde_json::from_str(payload.as_str()).unwrap();
                }
                Some(Ok(_)) => continue,
                other => panic!("expected text frame, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_serve_render_then_hover() {
        let listener = bind(SocketAddr::from(([127, 0, 0, 1], 0))).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(serve(
            listener,
            Arc::new(PanelRegistry::with_presets()),
            async move {
                let _ = shutdown_rx.await;
            },
        ));

        let (mut client, _) = connect_async(format!("ws://{addr}")).await.unwrap();

        let welcome = next_json(&mut client).await;
        assert_eq!(welcome["type"], "welcome");
        assert_eq!(welcome["panels"][0], "positions_5m");

        let render = r#"
            {
                "type": "render",
                "panel": "triple_ma_4h",
                "data": { "series": [ { "fields": [
                    { "name": "time", "values": [1000] },
                    { "name": "close", "values": [100] },
                    { "name": "metric_triple_ma_fast_sma_4h", "values": [99.5] }
                ] } ] }
            }
        "#;
        client.send(text(render)).await.unwrap();
        let config = next_json(&mut client).await;
        assert_eq!(config["type"], "config");
        assert_eq!(config["config"]["series"][0]["kind"], "candlestick");

        client
            .send(text(r#"{"type":"hover","time":1000,"label":"t"}"#))
            .await
            .unwrap();
        let tooltip = next_json(&mut client).await;
        assert_eq!(tooltip["type"], "tooltip");
        assert_eq!(tooltip["text"], "t<br/>C: 100.0000<br/>MA Fast: 99.50");

        client
            .send(text(r#"{"type":"unknown"}"#))
            .await
            .unwrap();
        let error = next_json(&mut client).await;
        assert_eq!(error["type"], "error");

        shutdown_tx.send(()).unwrap();
        server.await.unwrap();
    }
}
