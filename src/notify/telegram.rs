//! Telegram notifications for signals, status reports and cycle errors

use reqwest::Client;
use serde_json::json;
use tracing::{debug, error};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Telegram Bot API client for pushing bot status to a chat.
///
/// Delivery is best-effort: failures are logged and swallowed, never
/// propagated. A dead notification channel must not stop the trading loop.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self::with_base_url(token, chat_id, TELEGRAM_API_BASE.to_string())
    }

    /// Create a notifier against a non-default endpoint (mock server)
    pub fn with_base_url(token: String, chat_id: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url,
            token,
            chat_id,
        }
    }

    /// Send a Markdown-formatted message to the configured chat
    pub async fn send(&self, message: &str) {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        match self.client.post(&url).json(&payload).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    debug!("Telegram message delivered");
                } else {
                    error!("Telegram API returned {}", response.status());
                }
            }
            Err(e) => {
                error!("Failed to reach Telegram: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_posts_to_bot_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let notifier = TelegramNotifier::with_base_url(
            "123:abc".to_string(),
            "42".to_string(),
            server.url(),
        );
        notifier.send("hello").await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_swallows_failures() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/bot123:abc/sendMessage")
            .with_status(500)
            .create_async()
            .await;

        let notifier = TelegramNotifier::with_base_url(
            "123:abc".to_string(),
            "42".to_string(),
            server.url(),
        );
        // Must not panic or return an error
        notifier.send("hello").await;
    }
}
