//! Explicit theme store with a subscribe/notify contract.
//!
//! Replaces the pattern of watching the document root's class attribute and
//! storage events for dark-mode toggles: the theme is owned state published
//! through a watch channel. Components subscribe and observe changes;
//! nothing polls.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// UI theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    /// Light mode.
    #[default]
    Light,
    /// Dark mode.
    Dark,
}

impl Theme {
    /// Returns the other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Shared theme state with subscribe/notify semantics.
#[derive(Debug)]
pub struct ThemeStore {
    sender: watch::Sender<Theme>,
}

impl ThemeStore {
    /// Creates a store with the given initial theme.
    #[must_use]
    pub fn new(initial: Theme) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// The current theme.
    #[must_use]
    pub fn current(&self) -> Theme {
        *self.sender.borrow()
    }

    /// Sets the theme, notifying subscribers only on an actual change.
    pub fn set(&self, theme: Theme) {
        self.sender.send_if_modified(|current| {
            if *current == theme {
                false
            } else {
                *current = theme;
                true
            }
        });
    }

    /// Flips between light and dark.
    pub fn toggle(&self) {
        self.set(self.current().toggled());
    }

    /// Subscribes to theme changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.sender.subscribe()
    }
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new(Theme::Light)
    }
}
