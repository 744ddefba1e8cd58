//! Configuration variants of the JavaScript backend.
//!
//! A [`ConfigVariant`] selects a combination of optional backend features.
//! Each feature is tri-state: unset, enabled or disabled. The serialized form
//! doubles as a cache directory segment, so it must be canonical:
//!
//! ```text
//! default                      // nothing set
//! use-js-string                // use-js-string enabled
//! !use-js-string+effects       // use-js-string disabled, effects enabled
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Serialized form of the variant with no feature set.
pub const DEFAULT_VARIANT: &str = "default";

const ENABLE_FLAG: &str = "--enable";
const DISABLE_FLAG: &str = "--disable";

/// An optional backend feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    UseJsString,
    Effects,
}

impl Feature {
    /// Features in their serialization order.
    pub const ALL: [Feature; 2] = [Feature::UseJsString, Feature::Effects];

    pub fn name(self) -> &'static str {
        match self {
            Feature::UseJsString => "use-js-string",
            Feature::Effects => "effects",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// A combination of feature toggles.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigVariant {
    pub use_js_string: Option<bool>,
    pub effects: Option<bool>,
}

impl ConfigVariant {
    pub fn get(&self, feature: Feature) -> Option<bool> {
        match feature {
            Feature::UseJsString => self.use_js_string,
            Feature::Effects => self.effects,
        }
    }

    pub fn with(self, feature: Feature, value: Option<bool>) -> Self {
        match feature {
            Feature::UseJsString => Self {
                use_js_string: value,
                ..self
            },
            Feature::Effects => Self {
                effects: value,
                ..self
            },
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Every combination of feature values, `default` first.
    pub fn all() -> Vec<ConfigVariant> {
        const VALUES: [Option<bool>; 3] = [None, Some(true), Some(false)];
        VALUES
            .into_iter()
            .flat_map(|use_js_string| {
                VALUES.into_iter().map(move |effects| ConfigVariant {
                    use_js_string,
                    effects,
                })
            })
            .collect()
    }

    /// Command-line flags selecting this variant.
    pub fn to_flags(&self) -> Vec<String> {
        Feature::ALL
            .into_iter()
            .filter_map(|feature| {
                self.get(feature).map(|enabled| {
                    let flag = if enabled { ENABLE_FLAG } else { DISABLE_FLAG };
                    [flag.to_string(), feature.name().to_string()]
                })
            })
            .flatten()
            .collect()
    }

    /// Read the variant selected by a compile flag list.
    ///
    /// Flags are applied left to right, so the last occurrence of a feature
    /// wins. Tokens that are not `--enable`/`--disable` followed by a known
    /// feature are skipped.
    pub fn of_flags<S: AsRef<str>>(flags: &[S]) -> Self {
        let mut variant = Self::default();
        let mut tokens = flags.iter().map(AsRef::as_ref).peekable();
        while let Some(token) = tokens.next() {
            let value = match token {
                ENABLE_FLAG => true,
                DISABLE_FLAG => false,
                _ => continue,
            };
            let Some(feature) = tokens.peek().and_then(|name| Feature::from_name(name)) else {
                continue;
            };
            tokens.next();
            variant = variant.with(feature, Some(value));
        }
        variant
    }
}

impl fmt::Display for ConfigVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            return f.write_str(DEFAULT_VARIANT);
        }
        let tokens: Vec<String> = Feature::ALL
            .into_iter()
            .filter_map(|feature| {
                self.get(feature).map(|enabled| {
                    if enabled {
                        feature.name().to_string()
                    } else {
                        format!("!{}", feature.name())
                    }
                })
            })
            .collect();
        f.write_str(&tokens.join("+"))
    }
}

impl FromStr for ConfigVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == DEFAULT_VARIANT {
            return Ok(Self::default());
        }
        let invalid = || Error::InvalidVariant(s.to_string());
        let mut variant = Self::default();
        for token in s.split('+') {
            let (value, name) = match token.strip_prefix('!') {
                Some(name) => (false, name),
                None => (true, token),
            };
            let feature = Feature::from_name(name).ok_or_else(invalid)?;
            if variant.get(feature).is_some() {
                return Err(invalid());
            }
            variant = variant.with(feature, Some(value));
        }
        Ok(variant)
    }
}

impl TryFrom<String> for ConfigVariant {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ConfigVariant> for String {
    fn from(variant: ConfigVariant) -> Self {
        variant.to_string()
    }
}
