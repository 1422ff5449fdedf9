//! Transactional email through the Resend HTTP API.

use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::domain::KanbanError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
    public_url: String,
}

impl Mailer {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.resend_api_url.clone(),
            api_key: config.resend_api_key.clone(),
            from: config.mail_from.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn link(&self, path: &str) -> String {
        format!("{}{}", self.public_url, path)
    }

    /// Sends the message. Returns `Ok(false)` when no API key is configured.
    pub async fn send(&self, message: &EmailMessage) -> Result<bool, KanbanError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!(to = message.to.as_str(), subject = message.subject.as_str(), "RESEND_API_KEY not set, email skipped");
            return Ok(false);
        };

        let body = ResendRequest {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| KanbanError::Internal(format!("Mail request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let detail: Value = resp.json().await.unwrap_or(Value::Null);
            return Err(KanbanError::Internal(format!(
                "Mail API returned {}: {}",
                status, detail
            )));
        }

        tracing::info!(to = message.to.as_str(), subject = message.subject.as_str(), "Email sent");
        Ok(true)
    }

    /// Sends in the background; failures are logged, never surfaced.
    pub fn send_detached(&self, message: EmailMessage) {
        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&message).await {
                tracing::warn!(to = message.to.as_str(), "Email delivery failed: {}", e);
            }
        });
    }
}

pub fn welcome_email(to: &str, user_name: &str, login_url: &str) -> EmailMessage {
    let name = escape_html(user_name);
    let url = escape_html(login_url);
    EmailMessage {
        to: to.to_string(),
        subject: "Bienvenue sur TeamFlow".to_string(),
        html: format!(
            r#"<h1>Bienvenue {name} !</h1>
<p>Nous sommes ravis de vous accueillir sur TeamFlow, votre nouvelle plateforme de gestion de projet collaborative.</p>
<p>Vous pouvez maintenant commencer à créer des boards, inviter votre équipe et organiser vos projets.</p>
<p><a href="{url}">Accéder au dashboard</a></p>
<p>Si vous n'avez pas créé ce compte, vous pouvez ignorer cet email.</p>"#
        ),
    }
}

pub fn invitation_email(to: &str, organization_name: &str, invite_url: &str) -> EmailMessage {
    let org = escape_html(organization_name);
    let url = escape_html(invite_url);
    EmailMessage {
        to: to.to_string(),
        subject: format!("You've been invited to join {}", organization_name),
        html: format!(
            r#"<h1>You've been invited!</h1>
<p>You've been invited to join <strong>{org}</strong>.</p>
<a href="{url}">Accept invitation</a>
<p>If you didn't expect this invitation, you can ignore this email.</p>"#
        ),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_email_greets_user() {
        let msg = welcome_email("ana@example.com", "Ana", "http://localhost/dashboard");
        assert_eq!(msg.to, "ana@example.com");
        assert_eq!(msg.subject, "Bienvenue sur TeamFlow");
        assert!(msg.html.contains("Bienvenue Ana !"));
        assert!(msg.html.contains(r#"href="http://localhost/dashboard""#));
    }

    #[test]
    fn test_invitation_email_escapes_organization_name() {
        let msg = invitation_email("bo@example.com", "R&D <core>", "http://x/invite/t");
        assert_eq!(msg.subject, "You've been invited to join R&D <core>");
        assert!(msg.html.contains("<strong>R&amp;D &lt;core&gt;</strong>"));
    }

    #[tokio::test]
    async fn test_send_without_key_is_skipped() {
        let config = Config {
            resend_api_key: None,
            ..Config::default()
        };
        let mailer = Mailer::new(reqwest::Client::new(), &config);
        assert!(!mailer.is_enabled());

        let sent = mailer
            .send(&welcome_email("a@b.c", "A", "http://x"))
            .await
            .unwrap();
        assert!(!sent);
    }

    #[test]
    fn test_link_joins_public_url() {
        let config = Config {
            public_url: "http://teamflow.test/".into(),
            ..Config::default()
        };
        let mailer = Mailer::new(reqwest::Client::new(), &config);
        assert_eq!(mailer.link("/dashboard"), "http://teamflow.test/dashboard");
    }
}
