use std::str::FromStr;

use crate::api::{self, BinanceClient};
use crate::execution::sizing::order_quantity;
use crate::models::Side;

/// When the position state is allowed to advance after a signal.
///
/// `Optimistic` flips the state as soon as the signal is computed, whether
/// or not the order goes through. `Confirmed` only flips after the exchange
/// acknowledges the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionUpdatePolicy {
    #[default]
    Optimistic,
    Confirmed,
}

impl FromStr for PositionUpdatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "optimistic" => Ok(PositionUpdatePolicy::Optimistic),
            "confirmed" => Ok(PositionUpdatePolicy::Confirmed),
            other => Err(format!(
                "unknown position update policy {:?} (expected optimistic or confirmed)",
                other
            )),
        }
    }
}

/// What happened to a signal once the executor was done with it
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    /// True only when a market order was actually submitted
    pub submitted: bool,
    pub detail: String,
}

/// Turns a signal into a market order.
///
/// Performs the decision-time queries (price, balances, lot constraint) in
/// sequence, sizes the order, and submits it. Fire-and-forget: no fill
/// polling, no retry, no state rollback — any exchange error propagates to
/// the cycle boundary where it is logged and reported.
pub struct Executor {
    client: BinanceClient,
    symbol: String,
    base_asset: String,
    quote_asset: String,
}

impl Executor {
    pub fn new(
        client: BinanceClient,
        symbol: String,
        base_asset: String,
        quote_asset: String,
    ) -> Self {
        Self {
            client,
            symbol,
            base_asset,
            quote_asset,
        }
    }

    /// Size and submit a market order for the given signal side
    pub async fn execute(&self, side: Side) -> api::Result<ExecutionOutcome> {
        let price = self.client.get_ticker_price(&self.symbol).await?;

        // Buys spend the quote currency, sells dispose of the base asset
        let funding_asset = match side {
            Side::Buy => &self.quote_asset,
            Side::Sell => &self.base_asset,
        };

        let balances = self.client.get_balances().await?;
        let free = balances
            .iter()
            .find(|b| &b.asset == funding_asset)
            .map(|b| b.free)
            .unwrap_or(0.0);

        let lot = self.client.get_lot_constraint(&self.symbol).await?;
        let quantity = order_quantity(side, free, price, &lot);

        if quantity <= 0.0 {
            tracing::warn!(
                side = %side,
                free,
                price,
                min_qty = lot.min_qty,
                step_size = lot.step_size,
                "Computed order quantity is zero, dropping signal"
            );
            return Ok(ExecutionOutcome {
                side,
                quantity,
                price,
                submitted: false,
                detail: format!(
                    "{} signal dropped: free {} {} sizes to zero quantity",
                    side, free, funding_asset
                ),
            });
        }

        let ack = self
            .client
            .place_market_order(&self.symbol, side, quantity)
            .await?;

        Ok(ExecutionOutcome {
            side,
            quantity,
            price,
            submitted: true,
            detail: format!(
                "{} {} {} @ ~{} ({}, order id {})",
                side, quantity, self.symbol, price, ack.status, ack.order_id
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn mock_common_endpoints(server: &mut mockito::ServerGuard, usdt_free: &str) {
        server
            .mock("GET", "/api/v3/ticker/price")
            .match_query(mockito::Matcher::Any)
            .with_body(r#"{"symbol": "NEIROUSDT", "price": "50.0"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v3/account")
            .match_query(mockito::Matcher::Any)
            .with_body(format!(
                r#"{{"balances": [
                    {{"asset": "USDT", "free": "{}", "locked": "0"}},
                    {{"asset": "NEIRO", "free": "0", "locked": "0"}}
                ]}}"#,
                usdt_free
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/api/v3/exchangeInfo")
            .match_query(mockito::Matcher::Any)
            .with_body(
                r#"{"symbols": [{"symbol": "NEIROUSDT", "filters": [
                    {"filterType": "LOT_SIZE", "minQty": "1.0", "stepSize": "0.1"}
                ]}]}"#,
            )
            .create_async()
            .await;
    }

    fn test_executor(base_url: String) -> Executor {
        let client = BinanceClient::with_base_url(
            "test-key".to_string(),
            "test-secret".to_string(),
            base_url,
        )
        .unwrap();
        Executor::new(
            client,
            "NEIROUSDT".to_string(),
            "NEIRO".to_string(),
            "USDT".to_string(),
        )
    }

    #[tokio::test]
    async fn test_buy_sizes_and_submits() {
        let mut server = mockito::Server::new_async().await;
        mock_common_endpoints(&mut server, "100.0").await;
        let order_mock = server
            .mock("POST", "/api/v3/order")
            .match_body(mockito::Matcher::Regex(
                "side=BUY&type=MARKET&quantity=2&timestamp=".to_string(),
            ))
            .with_body(r#"{"symbol": "NEIROUSDT", "orderId": 7, "status": "FILLED"}"#)
            .create_async()
            .await;

        let executor = test_executor(server.url());
        let outcome = executor.execute(Side::Buy).await.unwrap();

        // 100 USDT / 50 = 2.0, already on the 0.1 grid
        assert!(outcome.submitted);
        assert_eq!(outcome.quantity, 2.0);
        assert_eq!(outcome.price, 50.0);
        order_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_zero_quantity_drops_signal_without_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/ticker/price")
            .match_query(mockito::Matcher::Any)
            .with_body(r#"{"symbol": "NEIROUSDT", "price": "50.0"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v3/account")
            .match_query(mockito::Matcher::Any)
            .with_body(r#"{"balances": [{"asset": "USDT", "free": "0", "locked": "0"}]}"#)
            .create_async()
            .await;
        // min_qty 0: nothing lifts the raw quantity off the floor
        server
            .mock("GET", "/api/v3/exchangeInfo")
            .match_query(mockito::Matcher::Any)
            .with_body(
                r#"{"symbols": [{"symbol": "NEIROUSDT", "filters": [
                    {"filterType": "LOT_SIZE", "minQty": "0.0", "stepSize": "0.1"}
                ]}]}"#,
            )
            .create_async()
            .await;
        let order_mock = server
            .mock("POST", "/api/v3/order")
            .expect(0)
            .create_async()
            .await;

        let executor = test_executor(server.url());
        let outcome = executor.execute(Side::Buy).await.unwrap();

        assert!(!outcome.submitted);
        assert_eq!(outcome.quantity, 0.0);
        assert!(outcome.detail.contains("dropped"));
        order_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_error_propagates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/ticker/price")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body(r#"{"code": -1003, "msg": "Service unavailable."}"#)
            .create_async()
            .await;

        let executor = test_executor(server.url());
        let result = executor.execute(Side::Buy).await;

        assert!(result.is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "optimistic".parse::<PositionUpdatePolicy>().unwrap(),
            PositionUpdatePolicy::Optimistic
        );
        assert_eq!(
            "Confirmed".parse::<PositionUpdatePolicy>().unwrap(),
            PositionUpdatePolicy::Confirmed
        );
        assert!("eager".parse::<PositionUpdatePolicy>().is_err());
    }
}
