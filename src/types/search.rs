use serde::{Deserialize, Serialize};

use crate::error::NexusError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MountingType {
    #[default]
    None,
    ThroughHole,
    SurfaceMount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    pub start_position: u32,
    pub in_stock_only: bool,
    pub exclude_marketplace: bool,
}

/// Unified inbound search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub part_number: String,
    #[serde(default)]
    pub part_type: Option<String>,
    #[serde(default)]
    pub mounting_type: MountingType,
    #[serde(default = "default_record_count")]
    pub record_count: i32,
    #[serde(default)]
    pub options: SearchOptions,
}

fn default_record_count() -> i32 {
    25
}

impl SearchRequest {
    pub fn new(part_number: impl Into<String>) -> Self {
        Self {
            part_number: part_number.into(),
            part_type: None,
            mounting_type: MountingType::None,
            record_count: default_record_count(),
            options: SearchOptions::default(),
        }
    }

    pub fn with_part_type(mut self, part_type: impl Into<String>) -> Self {
        self.part_type = Some(part_type.into());
        self
    }

    pub fn with_mounting_type(mut self, mounting_type: MountingType) -> Self {
        self.mounting_type = mounting_type;
        self
    }

    pub fn with_record_count(mut self, record_count: i32) -> Self {
        self.record_count = record_count;
        self
    }

    /// Reject requests that must never reach a vendor.
    pub fn validate(&self) -> Result<(), NexusError> {
        if self.record_count <= 0 {
            return Err(NexusError::ArgumentOutOfRange {
                name: "record_count",
                value: self.record_count.to_string(),
            });
        }
        Ok(())
    }

    /// Whitespace separated free-text keywords.
    pub fn keywords(&self) -> Vec<String> {
        self.part_number
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}
