use prost::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::TaskList;

/// The two wire encodings being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    /// Protobuf
    CompactBinary,
    /// JSON
    StructuredText,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("protobuf decode failed: {0}")]
    Binary(#[from] prost::DecodeError),
    #[error("json decode failed: {0}")]
    Text(#[from] serde_json::Error),
}

impl Codec {
    pub const ALL: [Codec; 2] = [Codec::CompactBinary, Codec::StructuredText];

    /// Display name used in progress lines and the chart legend.
    pub fn label(self) -> &'static str {
        match self {
            Self::CompactBinary => "Protobuf",
            Self::StructuredText => "JSON",
        }
    }

    /// Server route that serves the dataset in this encoding.
    pub fn path(self) -> &'static str {
        match self {
            Self::CompactBinary => "/tasks/protobuf",
            Self::StructuredText => "/tasks/json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::CompactBinary => "application/x-protobuf",
            Self::StructuredText => "application/json",
        }
    }

    pub fn encode(self, list: &TaskList) -> Vec<u8> {
        match self {
            Self::CompactBinary => list.encode_to_vec(),
            // A TaskList has only string keys, so this cannot fail.
            Self::StructuredText => serde_json::to_vec(list).unwrap_or_default(),
        }
    }

    /// Fully materializes the object graph from `bytes`.
    pub fn decode(self, bytes: &[u8]) -> Result<TaskList, DecodeError> {
        match self {
            Self::CompactBinary => Ok(TaskList::decode(bytes)?),
            Self::StructuredText => Ok(serde_json::from_slice(bytes)?),
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
