mod smtp;
mod telegram;

pub use smtp::SmtpNotifier;
pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Alert types that trigger notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlertKind {
    TradeSignal {
        symbol: String,
        signal: String,
        confidence: f64,
        quantity_lots: u32,
        reasons: String,
    },
    DailyReport {
        decisions: usize,
        executed: usize,
        net_pnl: f64,
    },
}

/// A notification to be dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn trade_signal(
        symbol: impl Into<String>,
        signal: impl Into<String>,
        confidence: f64,
        quantity_lots: u32,
        reasons: impl Into<String>,
    ) -> Self {
        let symbol = symbol.into();
        let signal = signal.into();
        let reasons = reasons.into();
        Self {
            title: format!("Trade Alert: {signal} {symbol}"),
            message: format!(
                "Symbol: {symbol}\nSignal: {signal}\nConfidence: {confidence:.1}%\nSuggested lots: {quantity_lots}\nReasoning: {reasons}"
            ),
            timestamp: chrono::Utc::now(),
            kind: AlertKind::TradeSignal {
                symbol,
                signal,
                confidence,
                quantity_lots,
                reasons,
            },
        }
    }

    pub fn daily_report(decisions: usize, executed: usize, net_pnl: f64) -> Self {
        Self {
            title: "Daily Trading Report".to_string(),
            message: format!(
                "Decisions: {decisions}\nExecuted: {executed}\nNet P&L: {net_pnl:.2}"
            ),
            timestamp: chrono::Utc::now(),
            kind: AlertKind::DailyReport {
                decisions,
                executed,
                net_pnl,
            },
        }
    }
}

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Telegram error: {0}")]
    Telegram(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Channel configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub alert_emails: Vec<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_user: None,
            smtp_password: None,
            smtp_from: "TradeBot <tradebot@example.com>".to_string(),
            alert_emails: Vec::new(),
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

impl NotificationConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let alert_emails = std::env::var("ALERT_EMAILS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            smtp_host: std::env::var("SMTP_HOST").unwrap_or(defaults.smtp_host),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.smtp_port),
            smtp_user: std::env::var("SMTP_USER").ok().filter(|s| !s.is_empty()),
            smtp_password: std::env::var("SMTP_PASSWORD")
                .ok()
                .filter(|s| !s.is_empty()),
            smtp_from: std::env::var("SMTP_FROM").unwrap_or(defaults.smtp_from),
            alert_emails,
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }

    pub fn smtp_configured(&self) -> bool {
        self.smtp_user.is_some() && self.smtp_password.is_some() && !self.alert_emails.is_empty()
    }

    pub fn telegram_configured(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}

/// Dispatches alerts to every configured channel.
pub struct NotificationService {
    channels: std::sync::Arc<Vec<Box<dyn NotificationChannel>>>,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if config.smtp_configured() {
            match SmtpNotifier::new(config) {
                Ok(notifier) => {
                    tracing::info!(
                        "Email alerts enabled (SMTP -> {} recipients)",
                        config.alert_emails.len()
                    );
                    channels.push(Box::new(notifier));
                }
                Err(e) => tracing::warn!("Failed to initialize SMTP notifier: {}", e),
            }
        }

        if config.telegram_configured() {
            match TelegramNotifier::new(config) {
                Ok(notifier) => {
                    tracing::info!("Telegram alerts enabled");
                    channels.push(Box::new(notifier));
                }
                Err(e) => tracing::warn!("Failed to initialize Telegram notifier: {}", e),
            }
        }

        if channels.is_empty() {
            tracing::info!(
                "No alert channels configured (set SMTP_USER/SMTP_PASSWORD/ALERT_EMAILS or TELEGRAM_BOT_TOKEN)"
            );
        }

        Self {
            channels: std::sync::Arc::new(channels),
        }
    }

    pub fn from_env() -> Self {
        Self::new(&NotificationConfig::from_env())
    }

    /// Send an alert to all channels without blocking the caller. A
    /// channel failure logs a warning and never fails the pipeline.
    pub fn send_alert(&self, alert: Alert) {
        let channels = self.channels.clone();
        tokio::spawn(async move {
            for channel in channels.iter() {
                match channel.send(&alert).await {
                    Ok(()) => tracing::debug!("Sent alert via {}", channel.name()),
                    Err(e) => tracing::warn!("Failed to send alert via {}: {}", channel.name(), e),
                }
            }
        });
    }

    /// Send an alert to all channels, awaiting completion.
    pub async fn send_alert_async(&self, alert: &Alert) {
        for channel in self.channels.iter() {
            match channel.send(alert).await {
                Ok(()) => tracing::debug!("Sent alert via {}", channel.name()),
                Err(e) => tracing::warn!("Failed to send alert via {}: {}", channel.name(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_signal_alert_carries_subject_and_body() {
        let alert = Alert::trade_signal("NIFTY", "BUY", 83.7, 2, "Composite probability: 83.7%");

        assert_eq!(alert.title, "Trade Alert: BUY NIFTY");
        assert!(alert.message.contains("Symbol: NIFTY"));
        assert!(alert.message.contains("Confidence: 83.7%"));
        assert!(alert.message.contains("Suggested lots: 2"));
    }

    #[test]
    fn smtp_requires_credentials_and_recipients() {
        let mut config = NotificationConfig::default();
        assert!(!config.smtp_configured());

        config.smtp_user = Some("bot@example.com".to_string());
        config.smtp_password = Some("secret".to_string());
        assert!(!config.smtp_configured());

        config.alert_emails = vec!["trader@example.com".to_string()];
        assert!(config.smtp_configured());
    }

    #[test]
    fn unconfigured_service_has_no_channels() {
        let service = NotificationService::new(&NotificationConfig::default());
        assert!(service.channels.is_empty());
    }
}
