//! Flattening of a [`StyleGuide`] into the three lookup tables the applier
//! reads from.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::guide::{ColorEntry, ImageEntry, Lenient, Named, StyleGuide, TypeStyle};

/// Colors, typography and images keyed by normalized identifier.
///
/// Built once per successful load and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleDataMap {
    pub colors: BTreeMap<String, ColorEntry>,
    pub typography: BTreeMap<String, TypeStyle>,
    pub images: BTreeMap<String, ImageEntry>,
}

impl StyleDataMap {
    /// Index a style guide. Later entries overwrite earlier ones with the
    /// same key, in the order: color sections, image sections, icon
    /// sections, type styles, logos.
    pub fn from_guide(guide: &StyleGuide) -> Self {
        let mut map = Self::default();

        for section in guide.colors.iter().flatten() {
            insert_all(&mut map.colors, section.colors.as_deref());
        }
        for section in guide.image_sections.iter().flatten() {
            insert_all(&mut map.images, section.images.as_deref());
        }
        for section in guide.icon_sections.iter().flatten() {
            insert_all(&mut map.images, section.icons.as_deref());
        }
        insert_all(&mut map.typography, guide.type_styles.as_deref());
        insert_all(&mut map.images, guide.logos.as_deref());

        tracing::debug!(
            colors = map.colors.len(),
            typography = map.typography.len(),
            images = map.images.len(),
            "indexed style guide"
        );
        map
    }

    pub fn color(&self, key: &str) -> Option<&ColorEntry> {
        self.colors.get(key)
    }

    pub fn type_style(&self, key: &str) -> Option<&TypeStyle> {
        self.typography.get(key)
    }

    pub fn image(&self, key: &str) -> Option<&ImageEntry> {
        self.images.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.typography.is_empty() && self.images.is_empty()
    }
}

fn insert_all<T: Named + Clone>(table: &mut BTreeMap<String, T>, entries: Option<&[Lenient<T>]>) {
    for entry in entries.unwrap_or_default() {
        match entry.key() {
            Some(k) => {
                table.insert(k, entry.to_entry());
            }
            None => tracing::debug!("skipping style guide entry without a name"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guide;

    fn index(json: &str) -> StyleDataMap {
        let guide = guide::parse(json).unwrap().unwrap_or_default();
        StyleDataMap::from_guide(&guide)
    }

    #[test]
    fn empty_guide_gives_empty_tables() {
        assert!(index("{}").is_empty());
    }

    #[test]
    fn colors_from_every_section() {
        let map = index(
            r#"{"colors": [
                {"name": "Secondary colors", "colors": []},
                {"name": "Primary colors", "colors": [{"kebabName": "brand-1", "value": "red"}]},
                {"name": "Accents"}
            ]}"#,
        );
        assert_eq!(map.color("brand-1").and_then(|c| c.value.as_deref()), Some("red"));
        assert_eq!(map.colors.len(), 1);
    }

    #[test]
    fn later_section_wins() {
        let map = index(
            r#"{"colors": [
                {"colors": [{"kebabName": "brand-1", "value": "red"}]},
                {"colors": [{"kebabName": "brand-1", "value": "blue"}]}
            ]}"#,
        );
        assert_eq!(map.color("brand-1").and_then(|c| c.value.as_deref()), Some("blue"));
    }

    #[test]
    fn logos_override_image_and_icon_sections() {
        let map = index(
            r#"{
                "imageSections": [{"images": [{"kebabName": "hero", "url": "a.png"}]}],
                "iconSections": [{"icons": [{"kebabName": "hero", "url": "b.svg"},
                                            {"kebabName": "arrow", "url": "arrow.svg"}]}],
                "logos": [{"kebabName": "hero", "url": "c.png"}]
            }"#,
        );
        assert_eq!(map.image("hero").and_then(|i| i.url.as_deref()), Some("c.png"));
        assert_eq!(map.image("arrow").and_then(|i| i.url.as_deref()), Some("arrow.svg"));
    }

    #[test]
    fn malformed_later_entry_still_replaces_by_name() {
        let map = index(
            r#"{"colors": [
                {"colors": [{"kebabName": "brand-1", "value": "red"},
                            {"kebabName": "brand-2", "value": "green"}]},
                {"colors": [{"kebabName": "brand-1", "value": 7}, 42]}
            ]}"#,
        );
        let replaced = map.color("brand-1").unwrap();
        assert_eq!(replaced.value, None);
        assert_eq!(map.color("brand-2").and_then(|c| c.value.as_deref()), Some("green"));
        assert_eq!(map.colors.len(), 2);
    }

    #[test]
    fn unnamed_entries_are_unreachable() {
        let map = index(r#"{"logos": [{"url": "x.png"}], "typeStyles": [{"fontSize": 12}]}"#);
        assert!(map.is_empty());
    }

    #[test]
    fn display_names_are_normalized() {
        let map = index(
            r#"{"colors": [{"colors": [{"name": "branD 5", "value": "red"}]}],
                "logos": [{"displayName": "Image 3", "url": "http://img/"}]}"#,
        );
        assert!(map.color("brand-5").is_some());
        assert!(map.image("image-3").is_some());
    }

    #[test]
    fn serializes_as_three_tables() {
        let map = index(r#"{"typeStyles": [{"kebabName": "h1", "fontSize": 32}]}"#);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["typography"]["h1"]["fontSize"], 32);
        assert!(json["colors"].as_object().unwrap().is_empty());
    }
}
