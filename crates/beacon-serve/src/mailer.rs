//! Registration mail delivery and address screening.

use std::collections::HashSet;

use crate::state::MailConfig;

/// Domains of throwaway-mail providers refused at registration.
const DISPOSABLE_DOMAINS: &[&str] = &[
    "10minutemail.com",
    "discard.email",
    "getnada.com",
    "guerrillamail.com",
    "mailinator.com",
    "sharklasers.com",
    "temp-mail.org",
    "tempmail.com",
    "trashmail.com",
    "yopmail.com",
];

/// Sends registration credentials through an HTTP mail API.
///
/// The API receives a JSON document in the common transactional-mail shape
/// (`personalizations` / `from` / `subject` / `content`). Delivery failure
/// is reported to the caller but never fails the registration itself.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_url: String,
    from: String,
}

impl Mailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            from: config.from.clone(),
        }
    }

    /// Send the freshly issued project id and secret key to `to`.
    pub async fn send_credentials(
        &self,
        to: &str,
        project_id: &str,
        secret_key: &str,
    ) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from },
            "subject": "Your analytics project credentials",
            "content": [{
                "type": "text/plain",
                "value": format!(
                    "Your analytics project was created.\n\n\
                     Project ID: {project_id}\n\
                     Secret key: {secret_key}\n\n\
                     Keep the secret key safe; it is the only way to read \
                     your project's logs and it cannot be recovered."
                ),
            }],
        });

        let response = self
            .client
            .post(&self.api_url)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("mail API returned {}", response.status());
        }
        Ok(())
    }
}

/// Screen a registration email address.
///
/// Rejects syntactically invalid addresses, disposable-mail domains, and
/// domains on the configured blocklist. Returns the reason text on failure.
pub fn screen_address(email: &str, blocklist: &HashSet<String>) -> Result<(), String> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("invalid email address".to_string());
    };
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err("invalid email address".to_string());
    }

    let domain = domain.to_lowercase();
    if DISPOSABLE_DOMAINS.contains(&domain.as_str()) {
        return Err("disposable email addresses are not accepted".to_string());
    }
    if blocklist.contains(&domain) {
        return Err("email domain is not accepted".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_blocklist() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn accepts_a_plain_address() {
        assert!(screen_address("owner@example.com", &no_blocklist()).is_ok());
    }

    #[test]
    fn rejects_missing_at_sign() {
        assert!(screen_address("example.com", &no_blocklist()).is_err());
    }

    #[test]
    fn rejects_empty_local_part() {
        assert!(screen_address("@example.com", &no_blocklist()).is_err());
    }

    #[test]
    fn rejects_dotless_domain() {
        assert!(screen_address("owner@localhost", &no_blocklist()).is_err());
    }

    #[test]
    fn rejects_whitespace() {
        assert!(screen_address("owner @example.com", &no_blocklist()).is_err());
    }

    #[test]
    fn rejects_disposable_domains_case_insensitively() {
        let err = screen_address("x@Mailinator.com", &no_blocklist()).unwrap_err();
        assert!(err.contains("disposable"));
    }

    #[test]
    fn rejects_blocklisted_domains() {
        let blocklist: HashSet<String> = ["spam.example".to_string()].into_iter().collect();
        assert!(screen_address("x@spam.example", &blocklist).is_err());
        assert!(screen_address("x@ok.example", &blocklist).is_ok());
    }
}
