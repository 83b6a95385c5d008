//! Troubleshooter step attachments.
//!
//! Contents travel base64 encoded in both directions and are decoded on
//! parse. Listings may omit them; [`TroubleshooterAttachment::contents`]
//! fetches the single attachment when they are missing.

use std::fmt;
use std::path::Path;

use base64::Engine;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::client::Client;
use crate::codec::{
    format_bytes, format_timestamp, scalar_text, to_positive_int, to_string_or_null, to_timestamp,
};
use crate::entity::{Entity, FieldSpec, Requirement, Resource};
use crate::error::{KayakoError, Operation, Result};
use crate::identity::Identity;
use crate::models::common::LIST_ALL;
use crate::result_set::ResultSet;
use crate::transport::{RequestData, WireMap};

/// A file attached to a troubleshooter step.
#[derive(Debug, Clone, Default)]
pub struct TroubleshooterAttachment {
    id: Option<u64>,
    step_id: Option<u64>,
    file_name: Option<String>,
    file_size: Option<u64>,
    file_type: Option<String>,
    dateline: Option<DateTime<Utc>>,
    contents: Option<Vec<u8>>,
}

impl Resource for TroubleshooterAttachment {
    const NAME: &'static str = "TroubleshooterAttachment";
    const CONTROLLER: &'static str = "/Troubleshooter/Attachment";
    const NODE: &'static str = "troubleshooterattachment";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec {
            name: "step_id",
            wire: "troubleshooterstepid",
            requirement: Requirement::Create,
            is_set: |a| a.step_id.is_some(),
        },
        FieldSpec {
            name: "file_name",
            wire: "filename",
            requirement: Requirement::Create,
            is_set: |a| a.file_name.is_some(),
        },
        FieldSpec {
            name: "contents",
            wire: "contents",
            requirement: Requirement::Create,
            is_set: |a| a.contents.is_some(),
        },
    ];

    fn parse(data: &WireMap) -> Result<Self> {
        let contents = match data.get("contents").and_then(scalar_text) {
            Some(encoded) if !encoded.trim().is_empty() => Some(
                base64::engine::general_purpose::STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| KayakoError::decode(format!("attachment contents: {}", e)))?,
            ),
            _ => None,
        };

        Ok(TroubleshooterAttachment {
            id: to_positive_int(data.get("id")),
            step_id: to_positive_int(data.get("troubleshooterstepid")),
            file_name: to_string_or_null(data.get("filename")),
            file_size: to_positive_int(data.get("filesize")),
            file_type: to_string_or_null(data.get("filetype")),
            dateline: to_timestamp(data.get("dateline")),
            contents,
        })
    }

    fn build(&self, _op: Operation) -> Result<RequestData> {
        let mut data = RequestData::new();
        data.put_u64("troubleshooterstepid", self.step_id)
            .put_str("filename", self.file_name.as_deref());
        if let Some(contents) = &self.contents {
            let encoded = base64::engine::general_purpose::STANDARD.encode(contents);
            data.put_str("contents", Some(&encoded));
        }
        Ok(data)
    }

    fn identity(&self) -> Option<Identity> {
        Some(Identity::nested(&[self.step_id?, self.id?]))
    }

    fn permits(op: Operation) -> bool {
        op != Operation::Update
    }
}

impl TroubleshooterAttachment {
    /// A new attachment of step `step_id`.
    #[must_use]
    pub fn create_new(
        step_id: u64,
        contents: Vec<u8>,
        file_name: impl Into<String>,
    ) -> Entity<TroubleshooterAttachment> {
        Entity::new(TroubleshooterAttachment {
            step_id: Some(step_id),
            file_name: Some(file_name.into()),
            contents: Some(contents),
            ..TroubleshooterAttachment::default()
        })
    }

    /// A new attachment read from a local file.
    ///
    /// The file name defaults to the last path component.
    ///
    /// # Errors
    ///
    /// Returns `KayakoError::Io` if the file cannot be read.
    pub async fn create_new_from_file(
        step_id: u64,
        path: impl AsRef<Path>,
        file_name: Option<&str>,
    ) -> Result<Entity<TroubleshooterAttachment>> {
        let path = path.as_ref();
        let contents = tokio::fs::read(path).await?;
        let file_name = match file_name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    KayakoError::validation(format!("{} has no file name", path.display()))
                })?,
        };
        Ok(Self::create_new(step_id, contents, file_name))
    }

    /// Fetches one attachment of a step.
    pub async fn get(
        client: &Client,
        step_id: u64,
        id: u64,
    ) -> Result<Entity<TroubleshooterAttachment>> {
        Entity::fetch(client, &[step_id.to_string(), id.to_string()]).await
    }

    /// Fetches every attachment of a step.
    pub async fn get_all(
        client: &Client,
        step_id: u64,
    ) -> Result<ResultSet<TroubleshooterAttachment>> {
        Entity::fetch_all(client, &[LIST_ALL.to_string(), step_id.to_string()]).await
    }

    /// Server id.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Troubleshooter step id.
    #[must_use]
    pub fn step_id(&self) -> Option<u64> {
        self.step_id
    }

    /// Sets the troubleshooter step id.
    pub fn set_step_id(&mut self, step_id: Option<u64>) -> &mut Self {
        self.step_id = step_id;
        self
    }

    /// File name.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Sets the file name.
    pub fn set_file_name(&mut self, file_name: impl Into<String>) -> &mut Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Size in bytes.
    #[must_use]
    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    /// Size in binary units, e.g. `2 KB`.
    #[must_use]
    pub fn file_size_formatted(&self) -> Option<String> {
        self.file_size.map(format_bytes)
    }

    /// MIME type.
    #[must_use]
    pub fn file_type(&self) -> Option<&str> {
        self.file_type.as_deref()
    }

    /// Upload time.
    #[must_use]
    pub fn dateline(&self) -> Option<DateTime<Utc>> {
        self.dateline
    }

    /// Upload time formatted with `format`, or the configured datetime format.
    #[must_use]
    pub fn dateline_formatted(&self, client: &Client, format: Option<&str>) -> Option<String> {
        format_timestamp(
            self.dateline,
            format.unwrap_or(client.config().datetime_format.as_str()),
        )
    }

    /// Decoded contents, without fetching.
    #[must_use]
    pub fn cached_contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }

    /// Decoded contents, fetching the attachment when they were not sent.
    ///
    /// Returns `None` without a request while the attachment has no id.
    ///
    /// # Errors
    ///
    /// Returns fetch errors.
    pub async fn contents(&mut self, client: &Client) -> Result<Option<&[u8]>> {
        if self.contents.is_none() {
            if let (Some(step_id), Some(id)) = (self.step_id, self.id) {
                debug!(step_id, id, "Fetching attachment contents");
                let fetched = Self::get(client, step_id, id).await?;
                self.contents = fetched.into_record().contents;
            }
        }
        Ok(self.contents.as_deref())
    }

    /// Replaces the contents.
    pub fn set_contents(&mut self, contents: Vec<u8>) -> &mut Self {
        self.contents = Some(contents);
        self
    }
}

impl fmt::Display for TroubleshooterAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (filetype: {}, filesize: {})",
            self.file_name.as_deref().unwrap_or_default(),
            self.file_type.as_deref().unwrap_or_default(),
            format_bytes(self.file_size.unwrap_or(0))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_decodes_contents() {
        let attachment = Entity::<TroubleshooterAttachment>::from_wire(&json!({
            "id": "3",
            "troubleshooterstepid": "12",
            "filename": "reset.txt",
            "filesize": "2048",
            "filetype": "text/plain",
            "dateline": "1300000000",
            "contents": "SG9sZCB0aGUgYnV0dG9u"
        }))
        .unwrap();
        assert_eq!(attachment.identity(), Some(Identity::nested(&[12, 3])));
        assert_eq!(attachment.cached_contents(), Some(&b"Hold the button"[..]));
        assert_eq!(
            attachment.to_string(),
            "reset.txt (filetype: text/plain, filesize: 2 KB)"
        );
    }

    #[test]
    fn test_build_encodes_contents() {
        let attachment =
            TroubleshooterAttachment::create_new(12, b"Hold the button".to_vec(), "reset.txt");
        let data = attachment.build(Operation::Create).unwrap();
        assert_eq!(data.scalar("contents"), Some("SG9sZCB0aGUgYnV0dG9u"));
        assert_eq!(data.scalar("troubleshooterstepid"), Some("12"));
    }

    #[test]
    fn test_invalid_base64_is_a_decode_error() {
        let err = Entity::<TroubleshooterAttachment>::from_wire(&json!({
            "id": "3",
            "contents": "not base64!"
        }))
        .unwrap_err();
        assert!(matches!(err, KayakoError::Decode(_)));
    }

    #[tokio::test]
    async fn test_create_from_file_uses_file_name() {
        let dir = std::env::temp_dir().join(format!("kayako-attachment-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("steps.txt");
        tokio::fs::write(&path, b"1. unplug").await.unwrap();

        let attachment = TroubleshooterAttachment::create_new_from_file(4, &path, None)
            .await
            .unwrap();
        assert_eq!(attachment.file_name(), Some("steps.txt"));
        assert_eq!(attachment.cached_contents(), Some(&b"1. unplug"[..]));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
