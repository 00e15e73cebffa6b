use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::Result;

pub const ATTR_TITLE: &str = "data-title";
pub const ATTR_ROLE: &str = "data-role";
pub const ATTR_TOOLS: &str = "data-tools";
pub const ATTR_DESCRIPTION: &str = "data-desc";

const SAMPLE_PORTFOLIO: &str = include_str!("../assets/portfolio.json");

/// Raw attributes attached to one selectable card, keyed like `data-*` markup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemAttributes(BTreeMap<String, String>);

impl ItemAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortfolioItem {
    pub title: String,
    pub role: String,
    pub tools: String,
    pub description: String,
}

impl PortfolioItem {
    pub fn new(
        title: impl Into<String>,
        role: impl Into<String>,
        tools: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            role: role.into(),
            tools: tools.into(),
            description: description.into(),
        }
    }

    /// Missing attributes read as empty text.
    pub fn from_attributes(attributes: &ItemAttributes) -> Self {
        let read = |key: &str| attributes.get(key).unwrap_or_default().to_string();
        Self {
            title: read(ATTR_TITLE),
            role: read(ATTR_ROLE),
            tools: read(ATTR_TOOLS),
            description: read(ATTR_DESCRIPTION),
        }
    }

    pub fn to_attributes(&self) -> ItemAttributes {
        ItemAttributes::new()
            .with(ATTR_TITLE, self.title.as_str())
            .with(ATTR_ROLE, self.role.as_str())
            .with(ATTR_TOOLS, self.tools.as_str())
            .with(ATTR_DESCRIPTION, self.description.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub items: Vec<ItemAttributes>,
}

impl Portfolio {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn sample() -> Result<Self> {
        Self::from_json(SAMPLE_PORTFOLIO)
    }

    pub fn items(&self) -> Vec<PortfolioItem> {
        self.items.iter().map(PortfolioItem::from_attributes).collect()
    }
}
