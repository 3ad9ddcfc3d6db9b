//! Xenon configuration
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! pixel_width = 1024
//! pixel_height = 768
//! dpr = 2.0
//! enable_joystick_scroll = true
//! scroll_sensitivity = 50.0
//! uv_convention = "bottom_left"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use xenon_core::{UvConvention, Viewport};

use crate::error::{Result, XenonError};

/// Settings for one Xenon surface
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct XenonConfig {
    /// Logical width of the UI in pixels
    #[serde(default = "default_pixel_size")]
    pub pixel_width: u32,
    /// Logical height of the UI in pixels
    #[serde(default = "default_pixel_size")]
    pub pixel_height: u32,
    /// Backing buffer scale
    #[serde(default = "default_dpr")]
    pub dpr: f32,
    /// Translate controller thumbsticks into wheel scrolling
    #[serde(default = "default_true")]
    pub enable_joystick_scroll: bool,
    /// Wheel pixels per frame at full stick deflection
    #[serde(default = "default_scroll_sensitivity")]
    pub scroll_sensitivity: f32,
    #[serde(default)]
    pub uv_convention: UvConvention,
}

fn default_pixel_size() -> u32 {
    1024
}

fn default_dpr() -> f32 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_scroll_sensitivity() -> f32 {
    50.0
}

impl Default for XenonConfig {
    fn default() -> Self {
        Self {
            pixel_width: default_pixel_size(),
            pixel_height: default_pixel_size(),
            dpr: default_dpr(),
            enable_joystick_scroll: true,
            scroll_sensitivity: default_scroll_sensitivity(),
            uv_convention: UvConvention::default(),
        }
    }
}

impl XenonConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| XenonError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| XenonError::Other(err.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.pixel_width == 0 || self.pixel_height == 0 {
            return Err(XenonError::InvalidConfig(format!(
                "pixel size must be non-zero, got {}x{}",
                self.pixel_width, self.pixel_height
            )));
        }
        if !self.dpr.is_finite() || self.dpr <= 0.0 {
            return Err(XenonError::InvalidConfig(format!(
                "dpr must be finite and positive, got {}",
                self.dpr
            )));
        }
        if !self.scroll_sensitivity.is_finite() {
            return Err(XenonError::InvalidConfig(format!(
                "scroll_sensitivity must be finite, got {}",
                self.scroll_sensitivity
            )));
        }
        Ok(())
    }

    /// Logical viewport the UI lays out against
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.pixel_width as f32, self.pixel_height as f32, self.dpr)
    }

    pub fn with_size(mut self, pixel_width: u32, pixel_height: u32) -> Self {
        self.pixel_width = pixel_width;
        self.pixel_height = pixel_height;
        self
    }

    pub fn with_dpr(mut self, dpr: f32) -> Self {
        self.dpr = dpr;
        self
    }

    pub fn with_joystick_scroll(mut self, enabled: bool) -> Self {
        self.enable_joystick_scroll = enabled;
        self
    }

    pub fn with_scroll_sensitivity(mut self, sensitivity: f32) -> Self {
        self.scroll_sensitivity = sensitivity;
        self
    }

    pub fn with_uv_convention(mut self, convention: UvConvention) -> Self {
        self.uv_convention = convention;
        self
    }
}
