//! OpenType feature settings
//!
//! An ordered tag → value mapping, handed to the shaper as-is. Tags the font
//! does not know are the shaper's business, not ours.

use std::fmt;
use std::str::FromStr;

use crate::error::{HaloError, Result};

/// Feature string the CLI starts from
pub const DEFAULT_FEATURES: &str = "calt=1,liga=0,ss02=1,zero=1,ss07=1,aalt=1";

/// Ordered mapping from 4-character OpenType tag to feature value
///
/// Setting a tag twice replaces its value but keeps its first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSettings {
    entries: Vec<(String, u32)>,
}

impl FeatureSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma or space separated list
    ///
    /// Accepts `tag=N`, `tag` and `+tag` (on), and `-tag` (off).
    pub fn parse(list: &str) -> Result<Self> {
        let mut settings = Self::new();

        for part in list.split(|c: char| c == ',' || c.is_whitespace()) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (tag, value) = if let Some(tag) = part.strip_prefix('+') {
                (tag, 1)
            } else if let Some(tag) = part.strip_prefix('-') {
                (tag, 0)
            } else if let Some((tag, raw)) = part.split_once('=') {
                let value = raw.trim().parse::<u32>().map_err(|_| {
                    HaloError::invalid(format!("invalid feature value in {part:?}"))
                })?;
                (tag.trim(), value)
            } else {
                (part, 1)
            };

            settings.set(tag, value)?;
        }

        Ok(settings)
    }

    /// Insert or replace a feature value
    pub fn set(&mut self, tag: &str, value: u32) -> Result<()> {
        validate_tag(tag)?;

        match self.entries.iter_mut().find(|(t, _)| t == tag) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((tag.to_string(), value)),
        }
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tag bytes padded with spaces, the way OpenType stores short tags
    pub fn tag_bytes(tag: &str) -> [u8; 4] {
        let mut bytes = [b' '; 4];
        for (slot, b) in bytes.iter_mut().zip(tag.bytes()) {
            *slot = b;
        }
        bytes
    }
}

fn validate_tag(tag: &str) -> Result<()> {
    let ok = (1..=4).contains(&tag.len()) && tag.bytes().all(|b| b.is_ascii_graphic());
    if ok {
        Ok(())
    } else {
        Err(HaloError::invalid(format!(
            "feature tag {tag:?} must be 1-4 printable ASCII characters"
        )))
    }
}

impl FromStr for FeatureSettings {
    type Err = HaloError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FeatureSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (tag, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{tag}={value}")?;
        }
        Ok(())
    }
}
