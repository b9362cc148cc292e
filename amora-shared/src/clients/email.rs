use reqwest::Client;
use serde::Serialize;

#[derive(Clone)]
pub struct EmailClient {
    client: Client,
    api_key: String,
    from_email: String,
    from_name: String,
}

#[derive(Debug, Serialize)]
struct SendRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
}

impl EmailClient {
    pub fn new(api_key: &str, from_email: &str, from_name: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            from_email: from_email.to_string(),
            from_name: from_name.to_string(),
        }
    }

    pub async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), String> {
        let request = SendRequest {
            from: format!("{} <{}>", self.from_name, self.from_email),
            to: vec![to.to_string()],
            subject: subject.to_string(),
            html: html.to_string(),
        };

        let response = self
            .client
            .post("https://api.resend.com/emails")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("email send failed: {e}"))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("email API error: {body}"));
        }

        tracing::debug!(to = %to, subject = %subject, "email sent");
        Ok(())
    }

    pub async fn send_verification_link(&self, to: &str, link: &str) -> Result<(), String> {
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
            <h2 style="color: #e0486b;">Amora - Email Verification</h2>
            <p>Confirm your address by opening the link below:</p>
            <p><a href="{link}" style="background: #e0486b; color: #fff; padding: 12px 24px; border-radius: 8px; text-decoration: none;">Verify my email</a></p>
            <p style="color: #666; margin-top: 20px;">If you did not create an account, please ignore this email.</p>
            </div>"#
        );

        self.send_email(to, "Amora - Verify your email", &html).await
    }

    pub async fn send_gdpr_export(&self, to: &str, export_json: &str) -> Result<(), String> {
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
            <h2 style="color: #e0486b;">Amora - Your data export</h2>
            <p>Here is everything we store about your account:</p>
            <pre style="background: #f4f4f4; padding: 16px; border-radius: 8px; overflow: auto;">{export_json}</pre>
            </div>"#
        );

        self.send_email(to, "Amora - Your data export", &html).await
    }
}
