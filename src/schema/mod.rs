use serde::{Deserialize, Serialize};

/// Markup flavor served by the XML endpoint.
///
/// The film pages and the card pages carry the same information under
/// different element names and with different window sizes, so both are
/// described by an [`ItemSchema`] and handled by one implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaFlavor {
    Film,
    Card,
}

impl SchemaFlavor {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "film" | "films" => Some(Self::Film),
            "card" | "cards" => Some(Self::Card),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Film => "film",
            Self::Card => "card",
        }
    }

    pub fn schema(self) -> ItemSchema {
        match self {
            Self::Film => ItemSchema {
                item_tag: "film".to_string(),
                poster_tag: "poster".to_string(),
                label_tag: "release_date".to_string(),
                window_size: 9,
                media_prefix: "media/".to_string(),
            },
            Self::Card => ItemSchema {
                item_tag: "card".to_string(),
                poster_tag: "picture".to_string(),
                label_tag: "text".to_string(),
                window_size: 24,
                media_prefix: String::new(),
            },
        }
    }
}

/// Field names and paging constants for one result markup flavor.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ItemSchema {
    pub item_tag: String,
    pub poster_tag: String,
    pub label_tag: String,
    pub window_size: usize,
    /// Prepended to non-empty poster paths when rendering the image source.
    #[serde(default)]
    pub media_prefix: String,
}

impl ItemSchema {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.window_size == 0 {
            return Err("window size must be a positive integer".to_string());
        }
        for (name, tag) in [
            ("item_tag", &self.item_tag),
            ("poster_tag", &self.poster_tag),
            ("label_tag", &self.label_tag),
        ] {
            if tag.trim().is_empty() {
                return Err(format!("{name} must not be empty"));
            }
        }
        Ok(())
    }
}

impl Default for ItemSchema {
    fn default() -> Self {
        SchemaFlavor::Card.schema()
    }
}
