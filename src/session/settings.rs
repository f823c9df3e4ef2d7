//! User-configurable presentation and feature settings
//!
//! Settings always hold a value for every recognized key. Updates arrive as a
//! [`SettingsPatch`] and are merged over the current value; nothing in a patch
//! can remove a key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Color scheme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

/// Flat bag of presentation parameters (colors, radii, spacing)
pub type MessageStyle = BTreeMap<String, String>;

/// Capability toggles read by collaborators. The store never branches on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub markdown: bool,
    pub code_highlighting: bool,
    pub file_uploads: bool,
    pub streaming: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            markdown: true,
            code_highlighting: true,
            file_uploads: true,
            streaming: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_message_style")]
    pub message_style: MessageStyle,
    #[serde(default)]
    pub features: Features,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            message_style: default_message_style(),
            features: Features::default(),
        }
    }
}

pub fn default_message_style() -> MessageStyle {
    [
        ("userBg", "#6366f1"),
        ("aiBg", "#f3f4f6"),
        ("borderRadius", "12px"),
        ("padding", "16px"),
        ("userTextColor", "#ffffff"),
        ("aiTextColor", "#1f2937"),
        ("systemBg", "#fef3c7"),
        ("systemTextColor", "#92400e"),
        (
            "shadow",
            "0 1px 3px 0 rgba(0, 0, 0, 0.1), 0 1px 2px 0 rgba(0, 0, 0, 0.06)",
        ),
        ("maxWidth", "max-content"),
        ("minWidth", "200px"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Per-flag feature update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_highlighting: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_uploads: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
}

/// Partial settings update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    /// Keys present here override; every other style key survives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_style: Option<MessageStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeaturesPatch>,
}

impl SettingsPatch {
    pub fn theme(theme: Theme) -> Self {
        Self {
            theme: Some(theme),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.theme.is_none() && self.message_style.is_none() && self.features.is_none()
    }
}

impl Features {
    fn merged(self, patch: FeaturesPatch) -> Self {
        Self {
            markdown: patch.markdown.unwrap_or(self.markdown),
            code_highlighting: patch.code_highlighting.unwrap_or(self.code_highlighting),
            file_uploads: patch.file_uploads.unwrap_or(self.file_uploads),
            streaming: patch.streaming.unwrap_or(self.streaming),
        }
    }
}

impl Settings {
    /// Merge a patch over these settings, field by field
    pub fn merged(&self, patch: SettingsPatch) -> Self {
        let mut next = self.clone();
        if let Some(theme) = patch.theme {
            next.theme = theme;
        }
        if let Some(style) = patch.message_style {
            next.message_style.extend(style);
        }
        if let Some(features) = patch.features {
            next.features = next.features.merged(features);
        }
        next
    }
}
