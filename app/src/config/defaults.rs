//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

type DefTuple = (&'static str, &'static str, bool, &'static str);

const DEFS: &[DefTuple] = &[
    ("BASE_DIRECTORY", "", true, "Directory to watch for new images"),
    ("FILE_FILTER", "", true, "File name pattern to react to, e.g. *.png"),
    ("CORNER_RADIUS", "30", false, "Radius of the rounded corners in pixels"),
    ("WORKER_COUNT", "2", false, "Number of images processed concurrently"),
    ("QUEUE_CAPACITY", "100", false, "Maximum number of images waiting to be processed"),
    (
        "SETTLE_TIMEOUT_MS",
        "2000",
        false,
        "Longest wait for a new file's size to stop changing (0 disables)",
    ),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, required, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    required,
                    description,
                },
            )
        })
        .collect()
});

/// Setting keys in declaration order.
pub fn keys() -> impl Iterator<Item = &'static str> {
    DEFS.iter().map(|&(key, ..)| key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_settings_have_no_default() {
        for def in DEFAULT_SETTINGS.values().filter(|d| d.required) {
            assert!(def.default.is_empty(), "{} should not have a default", def.key);
        }
    }

    #[test]
    fn corner_radius_has_compiled_in_default() {
        let radius = &DEFAULT_SETTINGS["CORNER_RADIUS"];
        assert_eq!(radius.default, "30");
        assert!(!radius.required);
        assert!(!DEFAULT_SETTINGS.contains_key("NOT_A_SETTING"));
    }

    #[test]
    fn keys_are_unique() {
        assert_eq!(keys().count(), DEFAULT_SETTINGS.len());
    }
}
