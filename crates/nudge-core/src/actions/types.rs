//! Action union and its editing operations.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use tracing::debug;

/// Screen a notification opens when tapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, EnumIter)]
pub enum TargetView {
    #[default]
    #[serde(rename = "/home")]
    #[strum(serialize = "/home")]
    Home,
    #[serde(rename = "/journal")]
    #[strum(serialize = "/journal")]
    Journal,
    #[serde(rename = "/habits")]
    #[strum(serialize = "/habits")]
    Habits,
    #[serde(rename = "/nutrition")]
    #[strum(serialize = "/nutrition")]
    Nutrition,
    #[serde(rename = "/settings")]
    #[strum(serialize = "/settings")]
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertStyle {
    #[default]
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Discriminant of [`Action`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionType {
    Notification,
    InAppAlert,
    AddMemory,
    AddInsight,
}

/// Action types allowed on rules that run in background mode.
pub const BACKGROUND_ACTIONS: &[ActionType] = &[ActionType::Notification];

impl ActionType {
    pub fn is_background_safe(self) -> bool {
        BACKGROUND_ACTIONS.contains(&self)
    }

    /// Short human label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Notification => "Push notification",
            Self::InAppAlert => "In-app alert",
            Self::AddMemory => "Add to memory",
            Self::AddInsight => "Add insight",
        }
    }
}

/// Effect executed when a rule fires. Tagged on `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Notification {
        title: String,
        body: String,
        #[serde(rename = "targetView", default, skip_serializing_if = "Option::is_none")]
        target_view: Option<TargetView>,
    },
    InAppAlert {
        title: String,
        body: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<AlertStyle>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dismissable: Option<bool>,
    },
    AddMemory {
        category: String,
        content: String,
    },
    AddInsight {
        category: String,
        title: String,
        body: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<ActionPriority>,
    },
}

impl Action {
    /// Minimal instance of the given type with the editor defaults.
    pub fn create_default(action_type: ActionType) -> Self {
        match action_type {
            ActionType::Notification => Self::Notification {
                title: String::new(),
                body: String::new(),
                target_view: Some(TargetView::Home),
            },
            ActionType::InAppAlert => Self::InAppAlert {
                title: String::new(),
                body: String::new(),
                style: Some(AlertStyle::Info),
                dismissable: Some(true),
            },
            ActionType::AddMemory => Self::AddMemory {
                category: "health_pattern".to_string(),
                content: String::new(),
            },
            ActionType::AddInsight => Self::AddInsight {
                category: "activity".to_string(),
                title: String::new(),
                body: String::new(),
                priority: Some(ActionPriority::Medium),
            },
        }
    }

    /// Notification with the given text, opening the dashboard.
    pub fn notification(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Notification {
            title: title.into(),
            body: body.into(),
            target_view: Some(TargetView::Home),
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Notification { .. } => ActionType::Notification,
            Self::InAppAlert { .. } => ActionType::InAppAlert,
            Self::AddMemory { .. } => ActionType::AddMemory,
            Self::AddInsight { .. } => ActionType::AddInsight,
        }
    }

    /// Switch to another type. Nothing is carried over; the same type is a no-op.
    pub fn replace_type(self, action_type: ActionType) -> Self {
        if self.action_type() == action_type {
            return self;
        }
        debug!(from = %self.action_type(), to = %action_type, "Replacing action type");
        Self::create_default(action_type)
    }

    /// Every free-text field, keyed by its wire name.
    pub fn text_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Notification { title, body, .. } | Self::InAppAlert { title, body, .. } => {
                vec![("title", title.as_str()), ("body", body.as_str())]
            }
            Self::AddMemory { category, content } => {
                vec![("category", category.as_str()), ("content", content.as_str())]
            }
            Self::AddInsight {
                category,
                title,
                body,
                ..
            } => vec![
                ("category", category.as_str()),
                ("title", title.as_str()),
                ("body", body.as_str()),
            ],
        }
    }

    /// Wire names of text fields that are blank.
    pub fn empty_text_fields(&self) -> Vec<&'static str> {
        self.text_fields()
            .into_iter()
            .filter(|(_, text)| text.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Check that every action may run in background mode.
///
/// On failure returns the position and type of each offending action.
pub fn validate_background_compatibility(actions: &[Action]) -> Result<(), Vec<(usize, ActionType)>> {
    let offending: Vec<_> = actions
        .iter()
        .enumerate()
        .map(|(idx, action)| (idx, action.action_type()))
        .filter(|(_, ty)| !ty.is_background_safe())
        .collect();

    if offending.is_empty() {
        Ok(())
    } else {
        Err(offending)
    }
}
