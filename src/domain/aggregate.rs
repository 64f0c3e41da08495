use crate::domain::model::ConfigItem;
use serde::ser::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};

/// 單一集合：保持插入順序，並以標準表示去重
#[derive(Debug, Clone, Default)]
pub struct ItemCollection {
    items: Vec<ConfigItem>,
    seen: HashSet<String>,
}

impl ItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入物件；已有結構相同的物件時不加入並回傳 false
    pub fn insert(&mut self, item: ConfigItem) -> bool {
        if !self.seen.insert(item.canonical_key()) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn items(&self) -> &[ConfigItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<ConfigItem> {
        self.items
    }
}

impl PartialEq for ItemCollection {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

/// 一次擷取的結果：集合名稱 → 去重後的有序物件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultAggregate {
    collections: BTreeMap<String, ItemCollection>,
}

impl ResultAggregate {
    /// 建立包含所有集合鍵的空結果
    pub fn with_collections<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let collections = names
            .into_iter()
            .map(|name| (name.to_string(), ItemCollection::new()))
            .collect();
        Self { collections }
    }

    pub fn insert(&mut self, collection: &str, item: ConfigItem) -> bool {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(item)
    }

    pub fn get(&self, collection: &str) -> Option<&[ConfigItem]> {
        self.collections.get(collection).map(|c| c.items())
    }

    pub fn len_of(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.len())
    }

    pub fn contains_collection(&self, collection: &str) -> bool {
        self.collections.contains_key(collection)
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// 所有集合皆為空
    pub fn is_empty(&self) -> bool {
        self.collections.values().all(ItemCollection::is_empty)
    }

    pub fn total_items(&self) -> usize {
        self.collections.values().map(ItemCollection::len).sum()
    }

    /// 將 `templates` 集合的物件排在 `target` 之前，並移除 `templates` 鍵
    pub fn merge_templates(&mut self, templates: &str, target: &str) {
        let templates = self.collections.remove(templates).unwrap_or_default();
        let instances = self.collections.remove(target).unwrap_or_default();

        let mut merged = templates;
        for item in instances.into_items() {
            merged.insert(item);
        }
        self.collections.insert(target.to_string(), merged);
    }
}

impl Serialize for ResultAggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.collections
                .iter()
                .map(|(name, collection)| (name, collection.items())),
        )
    }
}
