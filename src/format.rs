use std::path::Path;

use ply_rs::ply::{DefaultElement, Ply};

use crate::{
    error::{FilterError, Result},
    point_cloud::PointCloud,
    retain_mask::RetainMask,
};

mod ply;
mod text;

/// Point cloud file formats, selected by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointCloudFormat {
    /// Stanford polygon file (ascii or binary)
    Ply,
    /// Delimited text: `.txt`, `.xyz`, `.csv` or `.pts`
    Text,
}

impl PointCloudFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ply" => Some(Self::Ply),
            "txt" | "xyz" | "csv" | "pts" => Some(Self::Text),
            _ => None,
        }
    }
}

enum Records {
    Ply(Box<Ply<DefaultElement>>),
    Text(text::TextRecords),
}

/// A decoded point cloud file: the positions to filter plus the full records,
/// so that retained points are written back with all their attributes.
pub struct PointCloudDocument {
    cloud: PointCloud,
    records: Records,
}

impl PointCloudDocument {
    pub fn decode(format: PointCloudFormat, bytes: &[u8]) -> Result<Self> {
        match format {
            PointCloudFormat::Ply => {
                let (cloud, ply) = ply::decode(bytes)?;
                Ok(Self {
                    cloud,
                    records: Records::Ply(Box::new(ply)),
                })
            }
            PointCloudFormat::Text => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| FilterError::malformed(format!("text point cloud: {}", e)))?;
                let (cloud, records) = text::decode(text)?;
                Ok(Self {
                    cloud,
                    records: Records::Text(records),
                })
            }
        }
    }

    /// Encodes the records whose mask entry is set, in input order.
    pub fn encode_retained(self, mask: &RetainMask) -> std::io::Result<Vec<u8>> {
        if mask.len() != self.cloud.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "mask has {} entries but the cloud has {} points",
                    mask.len(),
                    self.cloud.len()
                ),
            ));
        }
        match self.records {
            Records::Ply(ply) => ply::encode(*ply, mask),
            Records::Text(records) => Ok(text::encode(records, mask)),
        }
    }

    pub async fn read(path: &Path) -> Result<Self> {
        let format = PointCloudFormat::from_path(path)
            .ok_or_else(|| FilterError::UnsupportedFormat(path.to_path_buf()))?;
        let bytes = tokio::fs::read(path).await.map_err(|source| FilterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("read {} bytes from {:?}", bytes.len(), path);
        Self::decode(format, &bytes)
    }

    pub async fn write_retained(self, mask: &RetainMask, path: &Path) -> Result<()> {
        let write_failure = |source| FilterError::WriteFailure {
            path: path.to_path_buf(),
            source,
        };
        let bytes = self.encode_retained(mask).map_err(write_failure)?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(write_failure)?;
        log::debug!("wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }

    pub fn format(&self) -> PointCloudFormat {
        match self.records {
            Records::Ply(_) => PointCloudFormat::Ply,
            Records::Text(_) => PointCloudFormat::Text,
        }
    }

    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }
}
