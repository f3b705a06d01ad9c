//! Email service for tenant invoices and payment reminders.

use async_trait::async_trait;
use futures::{StreamExt, stream};
use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{path::Path, sync::Arc};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    billing::{Statement, charges::ChargeBreakdown},
    config::{EmailConfig, EmailTransportConfig},
    errors::{Error, Result},
};

/// Concurrent sends per notification run
const SEND_CONCURRENCY: usize = 4;

/// Everything an invoice or reminder says about one tenancy
#[derive(Debug, Clone, PartialEq)]
pub struct BillingNotice {
    pub recipient: String,
    pub tenant_name: String,
    pub room_number: String,
    pub period: Option<String>,
    pub charges: ChargeBreakdown,
    pub amount_due: Decimal,
}

impl BillingNotice {
    /// `None` when the tenant has no email address on file
    pub fn from_statement(statement: &Statement) -> Option<Self> {
        let recipient = statement.email.clone()?;
        Some(Self {
            recipient,
            tenant_name: statement.tenant_name.clone(),
            room_number: statement.room_number.clone(),
            period: statement.billing_period.clone(),
            charges: statement.charges,
            amount_due: statement.amount_due,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Invoice,
    Reminder,
}

/// Outgoing billing mail
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_invoice(&self, notice: &BillingNotice) -> Result<()>;
    async fn send_reminder(&self, notice: &BillingNotice) -> Result<()>;
}

/// Counts from one notification run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationReport {
    pub sent: usize,
    /// Tenancies without an email address
    pub skipped: usize,
    pub failed: usize,
}

/// Send a notice for each statement. Individual failures are logged and counted, not returned.
#[instrument(skip_all, fields(kind = ?kind, statements = statements.len()))]
pub async fn send_notices(sender: Arc<dyn NotificationSender>, statements: &[Statement], kind: NoticeKind) -> NotificationReport {
    let notices: Vec<BillingNotice> = statements.iter().filter_map(BillingNotice::from_statement).collect();
    let mut report = NotificationReport {
        skipped: statements.len() - notices.len(),
        ..Default::default()
    };

    let results: Vec<(String, Result<()>)> = stream::iter(notices)
        .map(|notice| {
            let sender = Arc::clone(&sender);
            async move {
                let result = match kind {
                    NoticeKind::Invoice => sender.send_invoice(&notice).await,
                    NoticeKind::Reminder => sender.send_reminder(&notice).await,
                };
                (notice.room_number, result)
            }
        })
        .buffer_unordered(SEND_CONCURRENCY)
        .collect()
        .await;

    for (room_number, result) in results {
        match result {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!(%room_number, error = %e, "Failed to send billing notice");
                report.failed += 1;
            }
        }
    }

    info!(sent = report.sent, skipped = report.skipped, failed = report.failed, "Billing notices sent");
    report
}

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
    reply_to: Option<String>,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let transport = match &config.transport {
            EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            EmailTransportConfig::File { path } => {
                let emails_dir = Path::new(path);
                std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                    operation: format!("create emails directory: {e}"),
                })?;
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
            reply_to: config.reply_to.clone(),
        })
    }

    async fn send_email(&self, to_email: &str, to_name: &str, subject: &str, body: String) -> Result<()> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })?;

        // A bad tenant address is a data problem, not a server fault
        let to = format!("{to_name} <{to_email}>")
            .parse::<Mailbox>()
            .map_err(|e| Error::invalid_input(format!("Invalid recipient address {to_email}: {e}")))?;

        let mut builder = Message::builder().from(from).to(to).subject(subject);
        if let Some(reply_to) = &self.reply_to {
            let reply_to = reply_to.parse::<Mailbox>().map_err(|e| Error::Internal {
                operation: format!("parse reply-to email: {e}"),
            })?;
            builder = builder.reply_to(reply_to);
        }

        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationSender for EmailService {
    async fn send_invoice(&self, notice: &BillingNotice) -> Result<()> {
        let subject = format!("Invoice for room {}", notice.room_number);
        let body = invoice_body(notice);
        self.send_email(&notice.recipient, &notice.tenant_name, &subject, body).await
    }

    async fn send_reminder(&self, notice: &BillingNotice) -> Result<()> {
        let subject = format!("Payment reminder for room {}", notice.room_number);
        let body = reminder_body(notice);
        self.send_email(&notice.recipient, &notice.tenant_name, &subject, body).await
    }
}

fn format_amount(amount: Decimal) -> String {
    amount.round_dp(0).to_string()
}

fn charges_table(charges: &ChargeBreakdown, amount_due: Decimal) -> String {
    format!(
        r#"<table>
            <tr><td>Room</td><td>{room}</td></tr>
            <tr><td>Electricity ({usage} kWh)</td><td>{electricity}</td></tr>
            <tr><td>Water</td><td>{water}</td></tr>
            <tr class="total"><td>Total</td><td>{total}</td></tr>
        </table>"#,
        room = format_amount(charges.room_price),
        usage = charges.electricity_usage,
        electricity = format_amount(charges.electricity),
        water = format_amount(charges.water),
        total = format_amount(amount_due),
    )
}

fn wrap_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        td {{ padding: 4px 12px 4px 0; }}
        .total td {{ font-weight: bold; border-top: 1px solid #ccc; }}
        .footer {{ margin-top: 30px; font-size: 12px; color: #666; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>{title}</h2>
        {content}
        <div class="footer">
            <p>This is an automated message, please do not reply to this email.</p>
        </div>
    </div>
</body>
</html>"#
    )
}

fn period_label(notice: &BillingNotice) -> String {
    notice
        .period
        .as_deref()
        .map(|p| format!(" for {p}"))
        .unwrap_or_default()
}

fn invoice_body(notice: &BillingNotice) -> String {
    let content = format!(
        "<p>Hello {name},</p>\n        <p>Here are your charges{period} for room {room}:</p>\n        {table}",
        name = notice.tenant_name,
        period = period_label(notice),
        room = notice.room_number,
        table = charges_table(&notice.charges, notice.amount_due),
    );
    wrap_html(&format!("Invoice for room {}", notice.room_number), &content)
}

fn reminder_body(notice: &BillingNotice) -> String {
    let content = format!(
        "<p>Hello {name},</p>\n        <p>We have not yet received payment{period} for room {room}. The amount due is:</p>\n        {table}\n        <p>If you have already paid, please ignore this message.</p>",
        name = notice.tenant_name,
        period = period_label(notice),
        room = notice.room_number,
        table = charges_table(&notice.charges, notice.amount_due),
    );
    wrap_html(&format!("Payment reminder for room {}", notice.room_number), &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingNotifier;

    fn notice() -> BillingNotice {
        BillingNotice {
            recipient: "lan@example.com".to_string(),
            tenant_name: "Lan".to_string(),
            room_number: "101".to_string(),
            period: Some("2024-03".to_string()),
            charges: ChargeBreakdown {
                electricity_usage: 50,
                electricity: Decimal::from(150_000),
                water: Decimal::from(100_000),
                room_price: Decimal::from(3_000_000),
                total: Decimal::from(3_250_000),
            },
            amount_due: Decimal::from(3_250_000),
        }
    }

    fn file_config(dir: &Path) -> EmailConfig {
        EmailConfig {
            enabled: true,
            transport: EmailTransportConfig::File {
                path: dir.display().to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_invoice_body_lists_charges() {
        let body = invoice_body(&notice());
        assert!(body.contains("Hello Lan,"));
        assert!(body.contains("for 2024-03"));
        assert!(body.contains("Electricity (50 kWh)"));
        assert!(body.contains("3250000"));
    }

    #[test]
    fn test_reminder_body_without_period() {
        let mut notice = notice();
        notice.period = None;
        let body = reminder_body(&notice);
        assert!(body.contains("We have not yet received payment for room 101"));
    }

    #[tokio::test]
    async fn test_file_transport_writes_invoice() {
        let dir = tempfile::tempdir().unwrap();
        let service = EmailService::new(&file_config(dir.path())).unwrap();

        service.send_invoice(&notice()).await.unwrap();

        let written: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(written.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let service = EmailService::new(&file_config(dir.path())).unwrap();

        let mut notice = notice();
        notice.recipient = "not an address".to_string();
        let err = service.send_reminder(&notice).await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_send_notices_skips_tenants_without_email() {
        use crate::{
            db::models::{rooms::Room, tenants::Tenant},
            test_utils::{sample_room, sample_tenant, test_rates},
        };

        let room: Room = sample_room("101");
        let mut with_email: Tenant = sample_tenant(room.id, "001");
        with_email.email = Some("lan@example.com".to_string());
        let without_email = sample_tenant(room.id, "002");

        let statements = vec![
            Statement::new(&room, &with_email, &test_rates()),
            Statement::new(&room, &without_email, &test_rates()),
        ];

        let notifier = Arc::new(RecordingNotifier::default());
        let report = send_notices(notifier.clone(), &statements, NoticeKind::Reminder).await;

        assert_eq!(
            report,
            NotificationReport {
                sent: 1,
                skipped: 1,
                failed: 0
            }
        );
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, NoticeKind::Reminder);
        assert_eq!(sent[0].1.recipient, "lan@example.com");
    }
}
