use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{Alert, AlertKind, NotificationChannel, NotificationConfig, NotificationError};

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl SmtpNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let user = config
            .smtp_user
            .as_deref()
            .ok_or_else(|| NotificationError::Config("SMTP_USER not set".into()))?;
        let password = config
            .smtp_password
            .as_deref()
            .ok_or_else(|| NotificationError::Config("SMTP_PASSWORD not set".into()))?;

        let from: Mailbox = config
            .smtp_from
            .parse()
            .map_err(|e| NotificationError::Config(format!("Invalid from address: {}", e)))?;

        let to: Vec<Mailbox> = config
            .alert_emails
            .iter()
            .filter_map(|addr| addr.parse().ok())
            .collect();
        if to.is_empty() {
            return Err(NotificationError::Config(
                "No valid ALERT_EMAILS addresses".into(),
            ));
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| NotificationError::Smtp(format!("SMTP transport error: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }
}

fn render_html(alert: &Alert) -> String {
    let body = match &alert.kind {
        AlertKind::TradeSignal {
            symbol,
            signal,
            confidence,
            quantity_lots,
            reasons,
        } => {
            let signal_color = if signal == "BUY" { "#22c55e" } else { "#ef4444" };
            format!(
                r#"<div style="background:{signal_color};color:#fff;padding:12px 20px;border-radius:8px 8px 0 0;font-size:18px;font-weight:700;">{signal} {symbol}</div>
<table style="width:100%;border-collapse:collapse;">
  <tr><td style="padding:8px 12px;color:#94a3b8;">Symbol</td><td style="padding:8px 12px;font-weight:600;">{symbol}</td></tr>
  <tr style="background:#f8fafc;"><td style="padding:8px 12px;color:#94a3b8;">Signal</td><td style="padding:8px 12px;font-weight:600;color:{signal_color};">{signal}</td></tr>
  <tr><td style="padding:8px 12px;color:#94a3b8;">Confidence</td><td style="padding:8px 12px;font-weight:600;">{confidence:.1}%</td></tr>
  <tr style="background:#f8fafc;"><td style="padding:8px 12px;color:#94a3b8;">Suggested lots</td><td style="padding:8px 12px;font-weight:600;">{quantity_lots}</td></tr>
</table>
<div style="padding:16px 20px;color:#334155;">{reasons}</div>"#
            )
        }
        AlertKind::DailyReport {
            decisions,
            executed,
            net_pnl,
        } => {
            let pnl_color = if *net_pnl >= 0.0 { "#22c55e" } else { "#ef4444" };
            format!(
                r#"<div style="background:#0f172a;color:#fff;padding:12px 20px;border-radius:8px 8px 0 0;font-size:18px;font-weight:700;">Daily Trading Report</div>
<table style="width:100%;border-collapse:collapse;">
  <tr><td style="padding:8px 12px;color:#94a3b8;">Decisions</td><td style="padding:8px 12px;font-weight:600;">{decisions}</td></tr>
  <tr style="background:#f8fafc;"><td style="padding:8px 12px;color:#94a3b8;">Executed</td><td style="padding:8px 12px;font-weight:600;">{executed}</td></tr>
  <tr><td style="padding:8px 12px;color:#94a3b8;">Net P&amp;L</td><td style="padding:8px 12px;font-weight:600;color:{pnl_color};">{net_pnl:.2}</td></tr>
</table>"#
            )
        }
    };

    format!(
        r#"<div style="font-family:system-ui,sans-serif;max-width:520px;margin:0 auto;border:1px solid #e2e8f0;border-radius:8px;">
{body}
<div style="padding:12px 20px;color:#94a3b8;font-size:12px;border-top:1px solid #e2e8f0;">Automated alert sent {timestamp}</div>
</div>"#,
        timestamp = alert.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

#[async_trait]
impl NotificationChannel for SmtpNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError> {
        let html_body = render_html(alert);

        for recipient in &self.to {
            let email = Message::builder()
                .from(self.from.clone())
                .to(recipient.clone())
                .subject(&alert.title)
                .header(ContentType::TEXT_HTML)
                .body(html_body.clone())
                .map_err(|e| NotificationError::Smtp(format!("Failed to build email: {}", e)))?;

            self.transport
                .send(email)
                .await
                .map_err(|e| NotificationError::Smtp(format!("Failed to send email: {}", e)))?;
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}
