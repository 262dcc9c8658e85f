use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};

/// Server encoding of the host database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DatabaseEncoding {
    #[default]
    #[serde(rename = "UTF8")]
    Utf8,
    #[serde(rename = "SQL_ASCII")]
    SqlAscii,
    #[serde(rename = "LATIN1")]
    Latin1,
    #[serde(rename = "EUC_JP")]
    EucJp,
}

impl DatabaseEncoding {
    pub fn is_utf8(&self) -> bool { matches!(self, DatabaseEncoding::Utf8) }

    /// Bytes `c` occupies in this encoding
    pub fn char_len(&self, c: char) -> usize {
        match self {
            DatabaseEncoding::Utf8 => c.len_utf8(),
            DatabaseEncoding::Latin1 if (c as u32) < 0x100 => 1,
            _ if c.is_ascii() => 1,
            DatabaseEncoding::EucJp => 2,
            // input outside the single byte range arrived as several bytes
            DatabaseEncoding::Latin1 | DatabaseEncoding::SqlAscii => c.len_utf8(),
        }
    }
}

/// Process-wide settings, created at startup and passed by reference to every operation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Whether the planner is offered the custom scan path
    pub enable_custom_scan: bool,
    pub database_encoding: DatabaseEncoding,
}

impl ScanConfig {
    pub fn new(enable_custom_scan: bool, database_encoding: DatabaseEncoding) -> Self { Self { enable_custom_scan, database_encoding } }

    /// Custom scan enabled on a UTF-8 database
    pub fn enabled() -> Self { Self::new(true, DatabaseEncoding::Utf8) }

    pub fn from_json(json: &str) -> ScanResult<Self> {
        serde_json::from_str(json).map_err(|e| ScanError::InvalidArgument(format!("[config] {e}")))
    }

    pub fn is_enabled(&self) -> bool { self.enable_custom_scan }
    pub fn enable(&mut self) { self.enable_custom_scan = true }
    pub fn disable(&mut self) { self.enable_custom_scan = false }
}
