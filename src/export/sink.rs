//! Delivery of encoded reports
//!
//! Downloads land in a directory on disk. E-mail is spooled to an outbox
//! directory, one sub-directory per message holding the attachment and a
//! `message.json` envelope, for an external mailer to pick up.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::error::ExportError;

use super::{Artifact, DeliveryChannel, Receipt};

/// Name of the envelope written next to each queued attachment
pub const ENVELOPE_FILE: &str = "message.json";

/// Suffix of a message directory still being written
const STAGING_SUFFIX: &str = ".partial";

/// Check that `recipient` is a single well-formed e-mail address
pub fn validate_recipient(recipient: &str) -> Result<(), ExportError> {
    let address = recipient.trim().to_string();
    if address.is_empty() || !address.validate_email() {
        return Err(ExportError::InvalidRecipient(recipient.to_string()));
    }
    Ok(())
}

/// Saves artifacts into a download directory
#[derive(Debug, Clone)]
pub struct DownloadSink {
    dir: PathBuf,
}

impl DownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save(&self, artifact: &Artifact) -> Result<Receipt, ExportError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| delivery_error(&self.dir, e))?;

        let path = self.dir.join(&artifact.file_name);
        tokio::fs::write(&path, &artifact.bytes)
            .await
            .map_err(|e| delivery_error(&path, e))?;

        tracing::info!(path = %path.display(), size = artifact.bytes.len(), "💾 Report saved");
        Ok(Receipt::Downloaded { path })
    }
}

/// Spools e-mails with the report attached into an outbox directory
#[derive(Debug, Clone)]
pub struct OutboxMailer {
    dir: PathBuf,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Queue one message. Nothing is written if the recipient is invalid.
    ///
    /// The message is built in a hidden staging directory and renamed into
    /// place once complete. A failed send leaves nothing in the outbox.
    pub async fn send(&self, artifact: &Artifact, recipient: &str) -> Result<Receipt, ExportError> {
        validate_recipient(recipient)?;
        let recipient = recipient.trim().to_string();

        let queued_at = Utc::now();
        let envelope = serde_json::to_vec_pretty(&json!({
            "to": recipient,
            "subject": artifact.title,
            "body": format!("Please find the attached report: {}", artifact.title),
            "attachment": artifact.file_name,
            "media_type": artifact.media_type,
            "queued_at": queued_at,
        }))?;

        let name = format!(
            "{}-{}",
            queued_at.format("%Y%m%dT%H%M%S"),
            Uuid::new_v4().simple()
        );
        let staging = self.dir.join(format!(".{}{}", name, STAGING_SUFFIX));
        let message_dir = self.dir.join(name);

        let spooled = async {
            write_file(&staging.join(&artifact.file_name), &artifact.bytes).await?;
            write_file(&staging.join(ENVELOPE_FILE), &envelope).await?;
            tokio::fs::rename(&staging, &message_dir)
                .await
                .map_err(|e| delivery_error(&message_dir, e))
        };
        if let Err(e) = spooled.await {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&staging).await {
                tracing::warn!(dir = %staging.display(), error = %cleanup, "Failed to clean up staged message");
            }
            return Err(e);
        }

        tracing::info!(%recipient, dir = %message_dir.display(), "📧 Report queued for e-mail");
        Ok(Receipt::Queued {
            recipient,
            message_dir,
        })
    }
}

/// Create the parent directories of `path`, then write `bytes` to it
async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| delivery_error(parent, e))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| delivery_error(path, e))
}

/// Routes an artifact to the sink matching its channel
#[derive(Debug, Clone)]
pub struct Exporter {
    downloads: DownloadSink,
    mailer: OutboxMailer,
}

impl Exporter {
    pub fn new(downloads: DownloadSink, mailer: OutboxMailer) -> Self {
        Self { downloads, mailer }
    }

    pub async fn deliver(
        &self,
        artifact: &Artifact,
        channel: &DeliveryChannel,
    ) -> Result<Receipt, ExportError> {
        match channel {
            DeliveryChannel::Download => self.downloads.save(artifact).await,
            DeliveryChannel::Email { recipient } => self.mailer.send(artifact, recipient).await,
        }
    }
}

fn delivery_error(path: &Path, e: std::io::Error) -> ExportError {
    ExportError::Delivery(format!("{}: {}", path.display(), e))
}
