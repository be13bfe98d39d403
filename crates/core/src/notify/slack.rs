//! Slack incoming-webhook sender for deployment notifications.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::blocks::{Attachment, WebhookPayload};
use super::message::build_attachment;
use super::options::DeploymentOptions;
use crate::config::SlackConfig;
use crate::errors::NotificationError;

/// One deployment notification: where to post it and what it says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    webhook_url: String,
    channel: String,
    options: DeploymentOptions,
    success: bool,
    task: Option<String>,
}

impl NotificationRequest {
    /// Create a request. Nothing is validated here; a bad webhook URL
    /// surfaces as [`NotificationError::SendFailure`] when sending.
    pub fn new(
        webhook_url: impl Into<String>,
        channel: impl Into<String>,
        options: DeploymentOptions,
        success: bool,
    ) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            channel: channel.into(),
            options,
            success,
            task: None,
        }
    }

    /// Name the task that failed. Only appears in the failure status line.
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn options(&self) -> &DeploymentOptions {
        &self.options
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn task(&self) -> Option<&str> {
        self.task.as_deref()
    }

    /// Render the Block Kit attachment for this request.
    pub fn build_attachment(&self) -> Result<Attachment, NotificationError> {
        build_attachment(&self.options, self.success, self.task())
    }

    /// Render the exact body that will be posted.
    ///
    /// The body is the bare attachment unless `include_channel` is set and the
    /// channel is non-empty, in which case a top-level `channel` key is added.
    pub fn payload(&self, include_channel: bool) -> Result<WebhookPayload, NotificationError> {
        let attachment = self.build_attachment()?;
        let channel = if include_channel && !self.channel.is_empty() {
            Some(self.channel.clone())
        } else {
            None
        };
        Ok(WebhookPayload {
            attachment,
            channel,
        })
    }
}

/// Posts [`NotificationRequest`]s to their webhook.
pub struct SlackNotifier {
    http: reqwest::Client,
    include_channel: bool,
}

impl SlackNotifier {
    /// Create a notifier with reqwest's default client settings.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            include_channel: false,
        }
    }

    /// Create a notifier whose requests give up after `timeout`.
    ///
    /// A client that cannot be built is [`NotificationError::ClientSetup`],
    /// not a send failure.
    pub fn with_timeout(timeout: Duration) -> Result<Self, NotificationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NotificationError::ClientSetup)?;
        Ok(Self {
            http,
            include_channel: false,
        })
    }

    /// Create a notifier from the `[slack]` config section.
    pub fn from_config(config: &SlackConfig) -> Result<Self, NotificationError> {
        let notifier = match config.timeout_secs {
            Some(secs) => Self::with_timeout(Duration::from_secs(secs))?,
            None => Self::new(),
        };
        Ok(notifier.include_channel(config.include_channel))
    }

    /// Add the request's channel as a top-level `channel` key in the body.
    pub fn include_channel(mut self, include: bool) -> Self {
        self.include_channel = include;
        self
    }

    /// Send the notification: one POST with a JSON body.
    ///
    /// The response body is ignored. Any transport error or non-2xx status
    /// is returned as [`NotificationError::SendFailure`]; nothing is retried.
    pub async fn send(&self, request: &NotificationRequest) -> Result<(), NotificationError> {
        let payload = request.payload(self.include_channel)?;

        debug!(
            success = request.success(),
            task = request.task().unwrap_or_default(),
            with_channel = payload.channel.is_some(),
            "sending Slack deployment notification"
        );

        // The webhook URL is the credential, keep it out of errors and logs.
        let resp = self
            .http
            .post(request.webhook_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!(error = %e, "Slack webhook request failed");
                NotificationError::SendFailure(e)
            })?;

        let status = resp.status();
        resp.error_for_status().map_err(|e| {
            warn!(status = %status, "Slack webhook returned error");
            NotificationError::SendFailure(e.without_url())
        })?;

        info!(status = %status, "Slack deployment notification sent");
        Ok(())
    }
}

impl Default for SlackNotifier {
    fn default() -> Self {
        Self::new()
    }
}
