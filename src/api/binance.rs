use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use crate::api::error::{Error, Result};
use crate::models::{Balance, Candle, LotConstraint, Side};

const BINANCE_API_BASE: &str = "https://api.binance.com";
const HTTP_TIMEOUT_SECS: u64 = 30;

type HmacSha256 = Hmac<Sha256>;

/// Binance spot REST client.
///
/// Cloneable so the notifier task and the trading loop can share it; all
/// clones share the same connection pool.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    api_key: String,
    secret_key: String,
    base_url: String,
}

/// Kline response entry: a JSON array of mixed types.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawKline(
    i64,    // 0: open time
    String, // 1: open
    String, // 2: high
    String, // 3: low
    String, // 4: close
    String, // 5: volume
    i64,    // 6: close time
    String, // 7: quote asset volume
    i64,    // 8: number of trades
    String, // 9: taker buy base volume
    String, // 10: taker buy quote volume
    String, // 11: ignore
);

#[derive(Debug, Deserialize)]
struct AccountResponse {
    balances: Vec<RawBalance>,
}

#[derive(Debug, Deserialize)]
struct RawBalance {
    asset: String,
    free: String,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct SymbolInfo {
    symbol: String,
    filters: Vec<RawFilter>,
}

#[derive(Debug, Deserialize)]
struct RawFilter {
    #[serde(rename = "filterType")]
    filter_type: String,
    #[serde(rename = "minQty")]
    min_qty: Option<String>,
    #[serde(rename = "stepSize")]
    step_size: Option<String>,
}

/// Acknowledgement returned by the order endpoint.
///
/// The bot is fire-and-forget: this is logged and never polled again.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub symbol: String,
    pub order_id: i64,
    pub status: String,
    #[serde(default)]
    pub executed_qty: Option<String>,
}

/// Parse a decimal string field from a response
fn parse_f64(field: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| Error::MalformedResponse(format!("{}: not a decimal: {:?}", field, raw)))
}

fn parse_millis(field: &str, ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| Error::MalformedResponse(format!("{}: invalid timestamp: {}", field, ms)))
}

/// Binance reports failures as `{"code": ..., "msg": ...}` with a 200 or
/// 4xx status, so every response body is probed before deserializing.
fn check_api_error(value: &Value) -> Result<()> {
    if let Some(code) = value.get("code").and_then(Value::as_i64) {
        let msg = value
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(Error::Api { code, msg });
    }
    Ok(())
}

impl BinanceClient {
    pub fn new(api_key: String, secret_key: String) -> Result<Self> {
        Self::with_base_url(api_key, secret_key, BINANCE_API_BASE.to_string())
    }

    /// Create a client against a non-default endpoint (testnet, mock server)
    pub fn with_base_url(api_key: String, secret_key: String, base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(Error::ClientBuild)?;

        Ok(Self {
            client,
            api_key,
            secret_key,
            base_url,
        })
    }

    /// HMAC-SHA256 signature over the query string, hex-encoded
    fn sign(&self, query_string: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC accepts keys of any size");
        mac.update(query_string.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Append the timestamp and signature required by private endpoints
    fn signed_query(&self, params: &mut String) {
        let timestamp = Utc::now().timestamp_millis();

        if !params.is_empty() {
            params.push('&');
        }
        params.push_str(&format!("timestamp={}", timestamp));

        let signature = self.sign(params);
        params.push_str(&format!("&signature={}", signature));
    }

    async fn get_json(&self, url: &str, signed: bool) -> Result<Value> {
        let mut request = self.client.get(url);
        if signed {
            request = request.header("X-MBX-APIKEY", &self.api_key);
        }

        let text = request
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        let value: Value = serde_json::from_str(&text)?;
        check_api_error(&value)?;
        Ok(value)
    }

    /// Fetch the most recent `limit` closed candles, oldest first.
    ///
    /// `GET /api/v3/klines`. Close times arrive as exchange epoch
    /// milliseconds and leave converted to the display zone.
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
        display_tz: Tz,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );

        let body = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        let raw_klines: Vec<RawKline> = serde_json::from_str(&body).map_err(|e| {
            // A failed array parse is usually a Binance error object
            if let Ok(value) = serde_json::from_str::<Value>(&body) {
                if let Err(api_err) = check_api_error(&value) {
                    return api_err;
                }
            }
            Error::DeserializationFailed(e)
        })?;

        let mut candles = Vec::with_capacity(raw_klines.len());
        for raw in raw_klines {
            candles.push(Candle {
                open_time: parse_millis("open_time", raw.0)?,
                close: parse_f64("close", &raw.4)?,
                close_time: parse_millis("close_time", raw.6)?.with_timezone(&display_tz),
            });
        }

        tracing::debug!(symbol, count = candles.len(), "Fetched klines");

        Ok(candles)
    }

    /// Fetch all spot balances. `GET /api/v3/account` (signed).
    pub async fn get_balances(&self) -> Result<Vec<Balance>> {
        let mut params = String::new();
        self.signed_query(&mut params);

        let url = format!("{}/api/v3/account?{}", self.base_url, params);
        let value = self.get_json(&url, true).await?;

        let account: AccountResponse = serde_json::from_value(value)?;

        account
            .balances
            .into_iter()
            .map(|raw| {
                Ok(Balance {
                    free: parse_f64("free", &raw.free)?,
                    asset: raw.asset,
                })
            })
            .collect()
    }

    /// Current ticker price for the symbol. `GET /api/v3/ticker/price`.
    pub async fn get_ticker_price(&self, symbol: &str) -> Result<f64> {
        let url = format!("{}/api/v3/ticker/price?symbol={}", self.base_url, symbol);
        let value = self.get_json(&url, false).await?;

        let ticker: TickerPrice = serde_json::from_value(value)?;
        parse_f64("price", &ticker.price)
    }

    /// Lot-size filter for the symbol. `GET /api/v3/exchangeInfo`.
    pub async fn get_lot_constraint(&self, symbol: &str) -> Result<LotConstraint> {
        let url = format!("{}/api/v3/exchangeInfo?symbol={}", self.base_url, symbol);
        let value = self.get_json(&url, false).await?;

        let info: ExchangeInfo = serde_json::from_value(value)?;
        let symbol_info = info
            .symbols
            .into_iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| {
                Error::MalformedResponse(format!("exchangeInfo missing symbol {}", symbol))
            })?;

        let lot_filter = symbol_info
            .filters
            .into_iter()
            .find(|f| f.filter_type == "LOT_SIZE")
            .ok_or_else(|| {
                Error::MalformedResponse(format!("no LOT_SIZE filter for {}", symbol))
            })?;

        let min_qty = lot_filter
            .min_qty
            .ok_or_else(|| Error::MalformedResponse("LOT_SIZE missing minQty".to_string()))?;
        let step_size = lot_filter
            .step_size
            .ok_or_else(|| Error::MalformedResponse("LOT_SIZE missing stepSize".to_string()))?;

        Ok(LotConstraint {
            min_qty: parse_f64("minQty", &min_qty)?,
            step_size: parse_f64("stepSize", &step_size)?,
        })
    }

    /// Place a market order. `POST /api/v3/order` (signed).
    ///
    /// Fire-and-forget: a rejected order surfaces as `Error::Api`, but the
    /// caller never polls for fills.
    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: f64,
    ) -> Result<OrderAck> {
        let mut params = format!(
            "symbol={}&side={}&type=MARKET&quantity={}",
            symbol,
            side.as_str(),
            format_quantity(quantity)
        );
        self.signed_query(&mut params);

        let url = format!("{}/api/v3/order", self.base_url);

        let text = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(params)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        let value: Value = serde_json::from_str(&text)?;
        check_api_error(&value)?;

        let ack: OrderAck = serde_json::from_value(value)?;

        tracing::info!(
            symbol = %ack.symbol,
            order_id = ack.order_id,
            status = %ack.status,
            "Market order submitted"
        );

        Ok(ack)
    }
}

/// Render a quantity for the order endpoint.
///
/// Eight decimals covers every step size Binance uses; trailing zeros are
/// trimmed so a snapped quantity like 2.0 goes out as "2".
fn format_quantity(quantity: f64) -> String {
    let mut s = format!("{:.8}", quantity);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}
