use crate::error::Result;
use crate::headset::{Headset, HeadsetConfig};
use crate::id::HeadsetId;

/// Open the dongle at `path` and bind to `headset_id` with default settings.
///
/// Pass [`HeadsetId::ANY`] to take whichever headset the dongle finds.
pub fn connect(path: &str, headset_id: HeadsetId) -> Result<Headset> {
    connect_with_config(
        path,
        HeadsetConfig {
            headset_id,
            ..HeadsetConfig::default()
        },
    )
}

/// Connect with explicit configuration.
pub fn connect_with_config(path: &str, config: HeadsetConfig) -> Result<Headset> {
    Headset::connect(path, config)
}
