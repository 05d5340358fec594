use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::{Alert, AlertKind, NotificationChannel, NotificationConfig, NotificationError};

pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let bot_token = config
            .telegram_bot_token
            .clone()
            .ok_or_else(|| NotificationError::Config("TELEGRAM_BOT_TOKEN not set".into()))?;
        let chat_id = config
            .telegram_chat_id
            .clone()
            .ok_or_else(|| NotificationError::Config("TELEGRAM_CHAT_ID not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotificationError::Telegram(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            bot_token,
            chat_id,
        })
    }
}

fn render_text(alert: &Alert) -> String {
    match &alert.kind {
        AlertKind::TradeSignal {
            symbol,
            signal,
            confidence,
            quantity_lots,
            reasons,
        } => {
            let emoji = if signal == "BUY" { "\u{1f7e2}" } else { "\u{1f534}" };
            format!(
                "{emoji} <b>{signal} {symbol}</b>\n\
                 Confidence: <b>{confidence:.1}%</b>\n\
                 Suggested lots: {quantity_lots}\n\n\
                 {reasons}"
            )
        }
        AlertKind::DailyReport {
            decisions,
            executed,
            net_pnl,
        } => {
            format!(
                "\u{1f4ca} <b>Daily Trading Report</b>\n\
                 Decisions: {decisions}\n\
                 Executed: {executed}\n\
                 Net P&amp;L: <b>{net_pnl:.2}</b>"
            )
        }
    }
}

#[async_trait]
impl NotificationChannel for TelegramNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": render_text(alert),
                "parse_mode": "HTML",
            }))
            .send()
            .await
            .map_err(|e| NotificationError::Telegram(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Telegram(format!(
                "Telegram API returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
