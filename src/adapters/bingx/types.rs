//! BingX wire shapes: REST envelopes and user-stream events

use serde::Deserialize;

use crate::adapters::types::{de_f64, de_string_id, de_u64, VenueBalance, VenueOrder};

/// Every REST response: `{"code": 0, "msg": "", "data": ...}`
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct OrderEnvelope {
    pub order: VenueOrder,
}

#[derive(Debug, Deserialize)]
pub struct OrdersEnvelope {
    #[serde(default)]
    pub orders: Vec<VenueOrder>,
}

#[derive(Debug, Deserialize)]
pub struct BalanceEnvelope {
    pub balance: VenueBalance,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenKeyResponse {
    pub listen_key: String,
}

// =============================================================================
// User data stream
// =============================================================================

/// Envelope of a user-stream push; only the fields we route on
#[derive(Debug, Deserialize)]
pub struct WsEvent {
    #[serde(rename = "e", default)]
    pub event_type: String,
    #[serde(rename = "a")]
    pub account: Option<WsAccountUpdate>,
    #[serde(rename = "o")]
    pub order: Option<WsOrderUpdate>,
}

#[derive(Debug, Deserialize)]
pub struct WsAccountUpdate {
    #[serde(rename = "B", default)]
    pub balances: Vec<WsBalance>,
}

#[derive(Debug, Deserialize)]
pub struct WsBalance {
    #[serde(rename = "a", default)]
    pub asset: String,
    #[serde(rename = "wb", default, deserialize_with = "de_f64")]
    pub wallet_balance: f64,
    #[serde(rename = "cw", default, deserialize_with = "de_f64")]
    pub cross_wallet: f64,
}

impl From<WsBalance> for VenueBalance {
    fn from(b: WsBalance) -> Self {
        VenueBalance {
            asset: b.asset,
            balance: b.wallet_balance,
            equity: 0.0,
            available_margin: b.cross_wallet,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WsOrderUpdate {
    #[serde(rename = "s", default)]
    pub symbol: String,
    #[serde(rename = "c", default)]
    pub client_order_id: String,
    #[serde(rename = "i", deserialize_with = "de_string_id")]
    pub order_id: String,
    #[serde(rename = "S", default)]
    pub side: String,
    #[serde(rename = "ps", default)]
    pub position_side: String,
    #[serde(rename = "q", default, deserialize_with = "de_f64")]
    pub qty: f64,
    #[serde(rename = "p", default, deserialize_with = "de_f64")]
    pub price: f64,
    #[serde(rename = "z", default, deserialize_with = "de_f64")]
    pub cum_filled_qty: f64,
    #[serde(rename = "X", default)]
    pub status: String,
    #[serde(rename = "T", default, deserialize_with = "de_u64")]
    pub timestamp: u64,
    #[serde(rename = "rp", default, deserialize_with = "de_f64")]
    pub realized_pnl: f64,
}

impl From<WsOrderUpdate> for VenueOrder {
    fn from(u: WsOrderUpdate) -> Self {
        VenueOrder {
            order_id: u.order_id,
            symbol: u.symbol,
            side: u.side,
            position_side: u.position_side,
            price: u.price,
            orig_qty: u.qty,
            executed_qty: u.cum_filled_qty,
            status: u.status,
            client_order_id: u.client_order_id,
            time: u.timestamp,
            update_time: u.timestamp,
            reduce_only: None,
            profit: u.realized_pnl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_without_data() {
        let json = r#"{"code":101400,"msg":"order size too small"}"#;
        let resp: ApiResponse<OrderEnvelope> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.code, 101400);
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_order_trade_update_maps_to_venue_order() {
        let json = r#"{
            "e": "ORDER_TRADE_UPDATE",
            "E": 1702000000123,
            "o": {"s":"BTC-USDT","c":"cid-1","i":12345,"S":"SELL","o":"LIMIT",
                  "q":"0.0020","p":"31000","ap":"0","x":"NEW","X":"NEW",
                  "T":1702000000100,"ps":"LONG","z":"0","rp":"0"}
        }"#;
        let event: WsEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, "ORDER_TRADE_UPDATE");
        let order: VenueOrder = event.order.unwrap().into();
        assert_eq!(order.order_id, "12345");
        assert_eq!(order.position_side, "LONG");
        assert_eq!(order.orig_qty, 0.002);
        assert_eq!(order.time, 1702000000100);
    }

    #[test]
    fn test_account_update_balances() {
        let json = r#"{"e":"ACCOUNT_UPDATE","a":{"m":"ORDER","B":[{"a":"USDT","wb":"105.5","cw":"100.1","bc":"0"}]}}"#;
        let event: WsEvent = serde_json::from_str(json).unwrap();
        let balances = event.account.unwrap().balances;
        assert_eq!(balances.len(), 1);
        let balance: VenueBalance = balances.into_iter().next().unwrap().into();
        assert_eq!(balance.asset, "USDT");
        assert_eq!(balance.balance, 105.5);
    }
}
