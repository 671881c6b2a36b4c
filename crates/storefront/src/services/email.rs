//! Contact-form email delivery.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Port 465
//! connects with implicit TLS, any other port upgrades with STARTTLS.

use askama::Template;
use bultex_core::ValidContact;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML body of the contact notification.
#[derive(Template)]
#[template(path = "email/contact.html")]
struct ContactEmailHtml<'a> {
    company_name: &'a str,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    message: &'a str,
}

/// Plain text body of the contact notification.
#[derive(Template)]
#[template(path = "email/contact.txt")]
struct ContactEmailText<'a> {
    company_name: &'a str,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    message: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Sends contact-form submissions to the configured recipient.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be set up for the host.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let builder = if config.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        };

        let mailer = builder
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }

    /// Notify `to` about a contact submission. Replies go to the submitter.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_contact_notification(
        &self,
        to: &str,
        company_name: &str,
        contact: &ValidContact,
    ) -> Result<(), EmailError> {
        let (subject, text, html) = render_contact(company_name, contact)?;

        let from = Mailbox::new(
            Some(self.from_name.clone()),
            self.from_email
                .parse()
                .map_err(|_| EmailError::InvalidAddress(self.from_email.clone()))?,
        );
        let reply_to = Mailbox::new(
            Some(contact.name.clone()),
            contact
                .email
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(contact.email.to_string()))?,
        );

        let email = Message::builder()
            .from(from)
            .reply_to(reply_to)
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Contact email sent");
        Ok(())
    }
}

/// Subject, text body and HTML body for a contact notification.
fn render_contact(
    company_name: &str,
    contact: &ValidContact,
) -> Result<(String, String, String), askama::Error> {
    let subject = format!("Nuevo mensaje de contacto de {}", contact.name);

    let html = ContactEmailHtml {
        company_name,
        name: &contact.name,
        email: contact.email.as_str(),
        phone: &contact.phone,
        message: &contact.message,
    }
    .render()?;

    let text = ContactEmailText {
        company_name,
        name: &contact.name,
        email: contact.email.as_str(),
        phone: &contact.phone,
        message: &contact.message,
    }
    .render()?;

    Ok((subject, text, html))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bultex_core::ContactSubmission;

    use super::*;

    fn contact(name: &str, message: &str) -> ValidContact {
        ContactSubmission {
            name: name.to_string(),
            email: "cliente@example.com".to_string(),
            phone: "5512345678".to_string(),
            message: message.to_string(),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_subject_names_the_sender() {
        let (subject, _, _) = render_contact("BULTEX", &contact("Ana", "Hola")).unwrap();
        assert_eq!(subject, "Nuevo mensaje de contacto de Ana");
    }

    #[test]
    fn test_bodies_include_every_field() {
        let (_, text, html) =
            render_contact("BULTEX", &contact("Ana", "Necesito 50 overoles")).unwrap();
        for body in [&text, &html] {
            assert!(body.contains("Ana"));
            assert!(body.contains("cliente@example.com"));
            assert!(body.contains("5512345678"));
            assert!(body.contains("Necesito 50 overoles"));
        }
    }

    #[test]
    fn test_html_body_escapes_markup() {
        let (_, _, html) = render_contact("BULTEX", &contact("Ana", "<script>x</script>")).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;") || html.contains("&#60;script&#62;"));
    }

    #[tokio::test]
    async fn test_new_accepts_both_tls_modes() {
        for port in [465_u16, 587] {
            let config = EmailConfig {
                smtp_host: "smtp.example.com".to_string(),
                smtp_port: port,
                smtp_username: "ventas@bultex.mx".to_string(),
                smtp_password: secrecy::SecretString::from("pw"),
                from_email: "ventas@bultex.mx".to_string(),
                from_name: "BULTEX".to_string(),
            };
            assert!(EmailService::new(&config).is_ok());
        }
    }
}
