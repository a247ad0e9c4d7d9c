use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Wire name of the identifier field.
const ID_KEY: &str = "id";

/// Anything the recently-viewed cache can hold.
///
/// The cache only ever looks at the identifier; everything else is carried
/// through to the persisted snapshot untouched.
pub trait CatalogEntry {
    fn identifier(&self) -> &str;
}

/// A catalog item as handed over by the storefront's catalog layer.
///
/// Only `id` is required. Titles, handles, prices, images and whatever else the
/// catalog query returned live in `fields` and round-trip as-is. `fields` never
/// holds an `id` key, so the serialized object always has exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Attach an opaque field (builder style). `id` is reserved for the
    /// identifier and is ignored here.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key == ID_KEY {
            warn!(id = %self.id, "ignoring catalog field that would shadow the item id");
            return self;
        }
        self.fields.insert(key, value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Every field other than `id`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl CatalogEntry for CatalogItem {
    fn identifier(&self) -> &str {
        &self.id
    }
}
