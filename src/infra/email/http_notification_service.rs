use crate::domain::models::availability::SlotModality;
use crate::domain::models::booking::Booking;
use crate::domain::models::site_content::ColorPalette;
use crate::domain::ports::{NotificationReceipt, NotificationService};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tera::{Context, Tera};
use tracing::{debug, error};

pub const NOTIFICATION_TEMPLATE: &str = "booking_notification.html";

/// Renders the booking notification and hands it to the mail relay.
pub struct HttpNotificationService {
    client: Client,
    api_url: String,
    api_key: String,
    templates: Arc<Tera>,
}

impl HttpNotificationService {
    pub fn new(api_url: String, api_key: String, templates: Arc<Tera>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        Self { client, api_url, api_key, templates }
    }

    fn render(
        &self,
        booking: &Booking,
        package_title: Option<&str>,
        business_name: &str,
        palette: &ColorPalette,
    ) -> Result<String, AppError> {
        let context = Context::from_value(json!({
            "booking": booking,
            "package_title": package_title,
            "business_name": business_name,
            "palette": palette,
            "modality": describe_modality(&booking.modality()),
        }))
        .map_err(|e| AppError::Notification(format!("Template context error: {}", e)))?;

        self.templates
            .render(NOTIFICATION_TEMPLATE, &context)
            .map_err(|e| AppError::Notification(format!("Template render error: {:?}", e)))
    }
}

fn describe_modality(modality: &SlotModality) -> String {
    match modality {
        SlotModality::Online => "Online session".to_string(),
        SlotModality::InStudio => "In the studio".to_string(),
        SlotModality::Studio(name) => format!("Studio {}", name),
        SlotModality::FreeConsultation => "Free consultation".to_string(),
    }
}

#[derive(Serialize)]
struct EmailPayload {
    from_alias: String,
    to_addr: String,
    subject: String,
    html_body: String,
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    async fn notify(
        &self,
        booking: &Booking,
        package_title: Option<&str>,
        notification_email: &str,
        business_name: &str,
        palette: &ColorPalette,
    ) -> Result<NotificationReceipt, AppError> {
        let html_body = self.render(booking, package_title, business_name, palette)?;

        let payload = EmailPayload {
            from_alias: "default".to_string(),
            to_addr: notification_email.to_string(),
            subject: format!("New booking: {} on {} at {}", booking.name, booking.date, booking.slot),
            html_body,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Mail relay connection error: {}", e);
                error!("{}", msg);
                AppError::Notification(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Mail relay failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::Notification(msg));
        }

        debug!("Notification for booking {} accepted by relay", booking.id);
        Ok(NotificationReceipt {
            success: true,
            message: format!("Notification sent to {}", notification_email),
        })
    }
}
