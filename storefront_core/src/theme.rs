//! 主题偏好

use crate::error::{Error, Result};
use crate::storage::{SessionStorage, THEME_KEY};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    /// 读取保存的主题；没有或无法识别时为 `System`
    pub fn load(storage: &dyn SessionStorage) -> Result<Self> {
        Ok(storage
            .get(THEME_KEY)?
            .and_then(|value| value.parse().ok())
            .unwrap_or_default())
    }

    pub fn save(&self, storage: &dyn SessionStorage) -> Result<()> {
        storage.set(THEME_KEY, self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(Error::InvalidParam(format!("unknown theme: {}", other))),
        }
    }
}
