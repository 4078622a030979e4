//! BingX user data stream
//!
//! Connects with a listen key, inflates gzip frames, answers the text
//! `Ping` heartbeat and routes account/order pushes into the channels that
//! back `watch_balance` / `watch_orders`. Reconnects with capped
//! exponential backoff until cancelled.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use flate2::read::GzDecoder;
use futures_util::{SinkExt, StreamExt};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::adapters::bingx::adapter::BingxClient;
use crate::adapters::bingx::types::WsEvent;
use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::types::{VenueBalance, VenueOrder};
use crate::config::constants::{listen_key_keepalive_interval, stream_reconnect_max_backoff};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// A routed user-stream push
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UserStreamEvent {
    Balance(VenueBalance),
    Orders(Vec<VenueOrder>),
}

/// Inflate a gzip-compressed frame into UTF-8 text
pub(crate) fn decompress_frame(bytes: &[u8]) -> ExchangeResult<String> {
    let mut decoder = GzDecoder::new(bytes);
    let mut text = String::new();
    decoder
        .read_to_string(&mut text)
        .map_err(|e| ExchangeError::InvalidResponse(format!("gzip frame: {}", e)))?;
    Ok(text)
}

/// Route a decoded push; returns None for events we do not consume
pub(crate) fn route_event(text: &str, quote: &str) -> Option<UserStreamEvent> {
    let event: WsEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            trace!(error = %e, message = %text, "[USER-STREAM] Ignoring non-event stream message");
            return None;
        }
    };

    match event.event_type.as_str() {
        "ACCOUNT_UPDATE" => event
            .account?
            .balances
            .into_iter()
            .find(|b| b.asset == quote)
            .map(|b| UserStreamEvent::Balance(b.into())),
        "ORDER_TRADE_UPDATE" => event
            .order
            .map(|o| UserStreamEvent::Orders(vec![o.into()])),
        other => {
            debug!(event_type = %other, "[USER-STREAM] Unhandled user stream event");
            None
        }
    }
}

impl BingxClient {
    /// Run the user data stream in the background until `cancel` fires
    pub fn spawn_user_stream(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move { client.run_user_stream(cancel).await })
    }

    async fn run_user_stream(&self, cancel: CancellationToken) {
        let max_backoff = stream_reconnect_max_backoff();
        let mut backoff = INITIAL_BACKOFF;

        info!(exchange = "bingx", "[USER-STREAM] User data stream started");
        while !cancel.is_cancelled() {
            match self.stream_session(&cancel).await {
                Ok(true) => backoff = INITIAL_BACKOFF,
                Ok(false) => {}
                Err(e) => {
                    error!(exchange = "bingx", error = %e, "[USER-STREAM] User data stream failed");
                }
            }
            if cancel.is_cancelled() {
                break;
            }

            warn!(
                exchange = "bingx",
                delay_ms = backoff.as_millis() as u64,
                "[USER-STREAM] Reconnecting user data stream"
            );
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(max_backoff);
        }
        info!(exchange = "bingx", "[USER-STREAM] User data stream stopped");
    }

    /// One connection lifetime. `Ok(true)` when at least one message was received.
    async fn stream_session(&self, cancel: &CancellationToken) -> ExchangeResult<bool> {
        let listen_key = self.create_listen_key().await?;
        let url = format!("{}?listenKey={}", self.config.ws_base_url(), listen_key);
        let (ws_stream, _response) = connect_async(url.as_str()).await?;
        let (mut writer, mut reader) = ws_stream.split();
        info!(exchange = "bingx", "[USER-STREAM] User data stream connected");

        let mut keepalive = tokio::time::interval(listen_key_keepalive_interval());
        // the first tick completes immediately
        keepalive.tick().await;
        let mut received = false;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = writer.close().await;
                    return Ok(received);
                }
                _ = keepalive.tick() => {
                    if let Err(e) = self.extend_listen_key(&listen_key).await {
                        warn!(exchange = "bingx", error = %e, "[USER-STREAM] listenKey keepalive failed");
                    }
                }
                msg = reader.next() => {
                    let text = match msg {
                        None => return Ok(received),
                        Some(Err(e)) => return Err(e.into()),
                        Some(Ok(Message::Binary(bytes))) => decompress_frame(&bytes)?,
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Ping(payload))) => {
                            writer.send(Message::Pong(payload)).await?;
                            continue;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            info!(exchange = "bingx", frame = ?frame, "[USER-STREAM] User data stream closed by server");
                            return Ok(received);
                        }
                        Some(Ok(_)) => continue,
                    };
                    received = true;

                    if text == "Ping" {
                        writer.send(Message::Text("Pong".to_string())).await?;
                        continue;
                    }
                    self.dispatch(route_event(&text, &self.quote));
                }
            }
        }
    }

    fn dispatch(&self, event: Option<UserStreamEvent>) {
        let result = match event {
            Some(UserStreamEvent::Balance(balance)) => {
                self.balance_tx.try_send(balance).map_err(|e| e.to_string())
            }
            Some(UserStreamEvent::Orders(orders)) => {
                self.orders_tx.try_send(orders).map_err(|e| e.to_string())
            }
            None => Ok(()),
        };
        if let Err(e) = result {
            warn!(exchange = "bingx", error = %e, "[USER-STREAM] Dropped user stream event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_decompress_frame() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"Ping").unwrap();
        let bytes = encoder.finish().unwrap();
        assert_eq!(decompress_frame(&bytes).unwrap(), "Ping");
    }

    #[test]
    fn test_decompress_frame_rejects_plain_bytes() {
        assert!(decompress_frame(b"not gzip").is_err());
    }

    #[test]
    fn test_route_account_update_picks_quote_asset() {
        let text = r#"{"e":"ACCOUNT_UPDATE","a":{"B":[
            {"a":"VST","wb":"1","cw":"1"},
            {"a":"USDT","wb":"250.5","cw":"240"}]}}"#;
        match route_event(text, "USDT") {
            Some(UserStreamEvent::Balance(b)) => {
                assert_eq!(b.asset, "USDT");
                assert_eq!(b.balance, 250.5);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_route_order_update() {
        let text = r#"{"e":"ORDER_TRADE_UPDATE","o":{"s":"ETH-USDT","i":"77","S":"BUY",
            "ps":"SHORT","q":"1.5","p":"1800","X":"NEW","T":1700000000000}}"#;
        match route_event(text, "USDT") {
            Some(UserStreamEvent::Orders(orders)) => {
                assert_eq!(orders.len(), 1);
                assert_eq!(orders[0].order_id, "77");
                assert_eq!(orders[0].position_side, "SHORT");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_route_ignores_unknown_and_garbage() {
        assert_eq!(route_event(r#"{"e":"listenKeyExpired"}"#, "USDT"), None);
        assert_eq!(route_event("Pong", "USDT"), None);
    }

    #[tokio::test]
    async fn test_dispatch_feeds_watch_channels() {
        use crate::adapters::bingx::config::BingxConfig;
        use crate::adapters::traits::VenueClient;

        let client = BingxClient::new(BingxConfig::default(), "USDT");
        let balance = VenueBalance {
            asset: "USDT".to_string(),
            balance: 10.0,
            ..Default::default()
        };
        client.dispatch(Some(UserStreamEvent::Balance(balance.clone())));
        assert_eq!(client.watch_balance().await.unwrap(), balance);
    }
}
