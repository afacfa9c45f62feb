use anyhow::{anyhow, Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{NotificationEvent, Notifier};

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailSender {
    /// `Ok(None)` when `SMTP_HOST` is unset. Partial SMTP settings are an error.
    pub fn from_env() -> Result<Option<Self>> {
        let Some(host) = std::env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let var = |k: &str| std::env::var(k).map_err(|_| anyhow!("{k} missing"));
        let user = var("SMTP_USER")?;
        let pass = var("SMTP_PASS")?;
        let from_addr = var("NOTIFY_EMAIL_FROM")?;
        let to_addr = var("NOTIFY_EMAIL_TO")?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(Credentials::new(user, pass))
            .build();

        let from = from_addr.parse().context("invalid NOTIFY_EMAIL_FROM")?;
        let to = to_addr.parse().context("invalid NOTIFY_EMAIL_TO")?;

        Ok(Some(Self { mailer, from, to }))
    }
}

#[async_trait::async_trait]
impl Notifier for EmailSender {
    async fn send(&self, ev: &NotificationEvent) -> Result<()> {
        let subject = format!("[{}] {}", ev.watcher, ev.title);
        let body = format!(
            "Watcher: {}\nTitle: {}\nApply: {}\nSeen: {}\n",
            ev.watcher,
            ev.title,
            ev.url,
            ev.ts.to_rfc3339()
        );

        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const KEYS: [&str; 5] = [
        "SMTP_HOST",
        "SMTP_USER",
        "SMTP_PASS",
        "NOTIFY_EMAIL_FROM",
        "NOTIFY_EMAIL_TO",
    ];

    fn clear() {
        for k in KEYS {
            env::remove_var(k);
        }
    }

    #[test]
    #[serial_test::serial]
    fn disabled_without_smtp_host() {
        clear();
        env::set_var("SMTP_USER", "ignored");
        assert!(EmailSender::from_env().unwrap().is_none());
        clear();
    }

    #[test]
    #[serial_test::serial]
    fn partial_smtp_settings_are_an_error() {
        clear();
        env::set_var("SMTP_HOST", "smtp.example.com");
        env::set_var("SMTP_USER", "bot");
        let err = EmailSender::from_env().err().expect("partial config must fail");
        assert!(err.to_string().contains("SMTP_PASS"), "got: {err}");
        clear();
    }
}
