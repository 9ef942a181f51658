use serde::{Deserialize, Serialize};

use super::PlatefileId;

/// Pixel layout of the tiles stored in a platefile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    Gray,
    GrayA,
    Rgb,
    #[default]
    Rgba,
}

/// Channel storage type of the tiles stored in a platefile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelType {
    #[default]
    Uint8,
    Uint16,
    Int16,
    Float32,
}

/// Versioned metadata block describing a platefile.
///
/// Callers fill one in when creating a platefile, leaving `platefile_id`
/// unset; the service's copy in the open/create reply replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub version: i32,
    pub tile_size: i32,
    pub tile_filetype: String,
    pub pixel_format: PixelFormat,
    pub channel_type: ChannelType,
    pub platefile_id: Option<PlatefileId>,
}

impl IndexHeader {
    /// A version-1 header with no platefile id assigned yet.
    pub fn new(
        tile_size: i32,
        tile_filetype: impl Into<String>,
        pixel_format: PixelFormat,
        channel_type: ChannelType,
    ) -> Self {
        Self {
            version: 1,
            tile_size,
            tile_filetype: tile_filetype.into(),
            pixel_format,
            channel_type,
            platefile_id: None,
        }
    }
}

/// Identity the service hands back when a platefile is opened or created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatefileIdentity {
    pub platefile_id: PlatefileId,
    /// Logical name, e.g. `mars.plate`.
    pub short_name: String,
    /// Storage location chosen by the service.
    pub full_name: String,
}
