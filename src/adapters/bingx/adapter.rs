//! BingX Exchange Adapter
//!
//! Implements the VenueClient trait for BingX perpetual swaps.
//! REST calls are HMAC-signed; balance and order pushes arrive through the
//! user data stream (see `stream.rs`) and are handed out by `watch_*`.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::adapters::bingx::config::BingxConfig;
use crate::adapters::bingx::signing::{build_query, sign_query};
use crate::adapters::bingx::types::{
    ApiResponse, BalanceEnvelope, ListenKeyResponse, OrderEnvelope, OrdersEnvelope,
};
use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::VenueClient;
use crate::adapters::types::{
    create_http_client, LimitOrderRequest, MarginMode, PositionSide, VenueBalance, VenueCandle,
    VenueMarket, VenueOrder, VenuePosition, VenueTicker,
};

const API_KEY_HEADER: &str = "X-BX-APIKEY";
const BROKER_HEADER: &str = "X-SOURCE-KEY";
const LISTEN_KEY_PATH: &str = "/openApi/user/auth/userDataStream";

/// Capacity of the user-stream hand-off channels
const USER_STREAM_CHANNEL_CAPACITY: usize = 256;

/// BingX swap client
pub struct BingxClient {
    pub(crate) config: BingxConfig,
    http: reqwest::Client,
    /// Quote asset whose balance is reported (e.g. "USDT")
    pub(crate) quote: String,
    pub(crate) balance_tx: mpsc::Sender<VenueBalance>,
    balance_rx: Mutex<mpsc::Receiver<VenueBalance>>,
    pub(crate) orders_tx: mpsc::Sender<Vec<VenueOrder>>,
    orders_rx: Mutex<mpsc::Receiver<Vec<VenueOrder>>>,
}

impl BingxClient {
    pub fn new(config: BingxConfig, quote: &str) -> Self {
        let (balance_tx, balance_rx) = mpsc::channel(USER_STREAM_CHANNEL_CAPACITY);
        let (orders_tx, orders_rx) = mpsc::channel(USER_STREAM_CHANNEL_CAPACITY);
        Self {
            config,
            http: create_http_client("bingx"),
            quote: quote.to_string(),
            balance_tx,
            balance_rx: Mutex::new(balance_rx),
            orders_tx,
            orders_rx: Mutex::new(orders_rx),
        }
    }

    fn timestamp_ms() -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }

    fn with_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(API_KEY_HEADER, &self.config.api_key);
        match &self.config.broker_code {
            Some(code) => builder.header(BROKER_HEADER, code),
            None => builder,
        }
    }

    /// Unsigned GET for market data endpoints
    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let query = build_query(params);
        let url = if query.is_empty() {
            format!("{}{}", self.config.rest_base_url(), path)
        } else {
            format!("{}{}?{}", self.config.rest_base_url(), path, query)
        };
        let builder = self.with_headers(self.http.get(url));
        let data = self.send(builder, path).await?;
        require_data(path, data)
    }

    /// Signed request for account endpoints; returns the raw `data` payload
    async fn signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        mut params: Vec<(&str, String)>,
    ) -> ExchangeResult<Option<T>> {
        params.push(("timestamp", Self::timestamp_ms().to_string()));
        let query = build_query(&params);
        let signature = sign_query(&self.config.api_secret, &query)?;
        let url = format!(
            "{}{}?{}&signature={}",
            self.config.rest_base_url(),
            path,
            query,
            signature
        );
        let builder = self.with_headers(self.http.request(method, url));
        self.send(builder, path).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        path: &str,
    ) -> ExchangeResult<Option<T>> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(path = %path, status = %status, bytes = body.len(), "[BINGX] BingX response");
        decode_envelope(status.as_u16(), &body)
    }

    /// Obtain a user-stream listen key
    pub(crate) async fn create_listen_key(&self) -> ExchangeResult<String> {
        let url = format!("{}{}", self.config.rest_base_url(), LISTEN_KEY_PATH);
        let response = self.with_headers(self.http.post(url)).send().await?;
        let body = response.text().await?;
        let parsed: ListenKeyResponse = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::InvalidResponse(format!("listenKey: {} ({})", e, body)))?;
        Ok(parsed.listen_key)
    }

    /// Extend a listen key's validity
    pub(crate) async fn extend_listen_key(&self, listen_key: &str) -> ExchangeResult<()> {
        let url = format!(
            "{}{}?listenKey={}",
            self.config.rest_base_url(),
            LISTEN_KEY_PATH,
            listen_key
        );
        let response = self.with_headers(self.http.put(url)).send().await?;
        if !response.status().is_success() {
            return Err(ExchangeError::ConnectionFailed(format!(
                "listenKey keepalive returned HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Decode a `{code,msg,data}` envelope; non-zero codes become `ExchangeError::Venue`
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    http_status: u16,
    body: &str,
) -> ExchangeResult<Option<T>> {
    let envelope: ApiResponse<serde_json::Value> = match serde_json::from_str(body) {
        Ok(env) => env,
        Err(e) if (200..300).contains(&http_status) => {
            return Err(ExchangeError::InvalidResponse(format!("{}: {}", e, body)));
        }
        Err(_) => {
            return Err(ExchangeError::ConnectionFailed(format!(
                "HTTP {}: {}",
                http_status, body
            )));
        }
    };

    if envelope.code != 0 {
        return Err(ExchangeError::Venue {
            code: envelope.code,
            msg: envelope.msg,
        });
    }

    match envelope.data {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ExchangeError::InvalidResponse(e.to_string())),
    }
}

fn require_data<T>(path: &str, data: Option<T>) -> ExchangeResult<T> {
    data.ok_or_else(|| ExchangeError::InvalidResponse(format!("{}: missing data", path)))
}

#[async_trait]
impl VenueClient for BingxClient {
    async fn fetch_markets(&self) -> ExchangeResult<Vec<VenueMarket>> {
        self.public_get("/openApi/swap/v2/quote/contracts", &[]).await
    }

    async fn create_limit_order(&self, request: &LimitOrderRequest) -> ExchangeResult<VenueOrder> {
        let time_in_force = if request.post_only { "PostOnly" } else { "GTC" };
        let params = vec![
            ("symbol", request.symbol_id.clone()),
            ("side", request.side.as_venue_str().to_string()),
            ("positionSide", request.position_side.as_venue_str().to_string()),
            ("type", "LIMIT".to_string()),
            ("price", request.price.to_string()),
            ("quantity", request.qty.to_string()),
            ("clientOrderID", request.client_order_id.clone()),
            ("timeInForce", time_in_force.to_string()),
        ];
        let path = "/openApi/swap/v2/trade/order";
        let data: Option<OrderEnvelope> = self.signed_request(Method::POST, path, params).await?;
        Ok(require_data(path, data)?.order)
    }

    async fn cancel_order(&self, order_id: &str, symbol_id: &str) -> ExchangeResult<VenueOrder> {
        let params = vec![
            ("symbol", symbol_id.to_string()),
            ("orderId", order_id.to_string()),
        ];
        let path = "/openApi/swap/v2/trade/order";
        let data: Option<OrderEnvelope> = self.signed_request(Method::DELETE, path, params).await?;
        Ok(require_data(path, data)?.order)
    }

    async fn fetch_open_orders(&self) -> ExchangeResult<Vec<VenueOrder>> {
        let path = "/openApi/swap/v2/trade/openOrders";
        let data: Option<OrdersEnvelope> = self.signed_request(Method::GET, path, vec![]).await?;
        Ok(data.map(|d| d.orders).unwrap_or_default())
    }

    async fn fetch_positions(&self) -> ExchangeResult<Vec<VenuePosition>> {
        let path = "/openApi/swap/v2/user/positions";
        let data: Option<Vec<VenuePosition>> =
            self.signed_request(Method::GET, path, vec![]).await?;
        Ok(data.unwrap_or_default())
    }

    async fn fetch_balance(&self) -> ExchangeResult<VenueBalance> {
        let path = "/openApi/swap/v2/user/balance";
        let data: Option<BalanceEnvelope> = self.signed_request(Method::GET, path, vec![]).await?;
        Ok(require_data(path, data)?.balance)
    }

    async fn fetch_tickers(&self) -> ExchangeResult<Vec<VenueTicker>> {
        self.public_get("/openApi/swap/v2/quote/ticker", &[]).await
    }

    async fn fetch_ohlcv(
        &self,
        symbol_id: &str,
        timeframe: &str,
        limit: u32,
    ) -> ExchangeResult<Vec<VenueCandle>> {
        let params = [
            ("symbol", symbol_id.to_string()),
            ("interval", timeframe.to_string()),
            ("limit", limit.to_string()),
        ];
        let mut candles: Vec<VenueCandle> =
            self.public_get("/openApi/swap/v3/quote/klines", &params).await?;
        candles.sort_by_key(|c| c.time);
        Ok(candles)
    }

    async fn fetch_order_history(
        &self,
        start_ms: u64,
        end_ms: u64,
        limit: usize,
    ) -> ExchangeResult<Vec<VenueOrder>> {
        let params = vec![
            ("startTime", start_ms.to_string()),
            ("endTime", end_ms.to_string()),
            ("limit", limit.to_string()),
        ];
        let path = "/openApi/swap/v2/trade/allOrders";
        let data: Option<OrdersEnvelope> = self.signed_request(Method::GET, path, params).await?;
        Ok(data.map(|d| d.orders).unwrap_or_default())
    }

    async fn set_margin_mode(&self, symbol_id: &str, mode: MarginMode) -> ExchangeResult<()> {
        let params = vec![
            ("symbol", symbol_id.to_string()),
            ("marginType", mode.as_venue_str().to_string()),
        ];
        let _: Option<serde_json::Value> = self
            .signed_request(Method::POST, "/openApi/swap/v2/trade/marginType", params)
            .await?;
        Ok(())
    }

    async fn set_leverage(
        &self,
        symbol_id: &str,
        leverage: u32,
        side: PositionSide,
    ) -> ExchangeResult<()> {
        let params = vec![
            ("symbol", symbol_id.to_string()),
            ("side", side.as_venue_str().to_string()),
            ("leverage", leverage.to_string()),
        ];
        let _: Option<serde_json::Value> = self
            .signed_request(Method::POST, "/openApi/swap/v2/trade/leverage", params)
            .await?;
        Ok(())
    }

    async fn watch_balance(&self) -> ExchangeResult<VenueBalance> {
        self.balance_rx
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| ExchangeError::ConnectionFailed("balance stream closed".into()))
    }

    async fn watch_orders(&self) -> ExchangeResult<Vec<VenueOrder>> {
        self.orders_rx
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| ExchangeError::ConnectionFailed("order stream closed".into()))
    }

    fn exchange_name(&self) -> &'static str {
        "bingx"
    }
}
