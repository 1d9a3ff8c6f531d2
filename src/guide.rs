//! Typed view of the style guide document served by the brand endpoint.
//!
//! Sections are optional and individual entries are read leniently: an entry
//! whose fields have the wrong shape loses its values without failing its
//! siblings.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::naming;

/// The whole response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleGuide {
    pub colors: Option<Vec<ColorSection>>,
    pub image_sections: Option<Vec<ImageSection>>,
    pub icon_sections: Option<Vec<IconSection>>,
    pub type_styles: Option<Vec<Lenient<TypeStyle>>>,
    pub logos: Option<Vec<Lenient<ImageEntry>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorSection {
    pub name: Option<String>,
    pub colors: Option<Vec<Lenient<ColorEntry>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageSection {
    pub name: Option<String>,
    pub images: Option<Vec<Lenient<ImageEntry>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IconSection {
    pub name: Option<String>,
    pub icons: Option<Vec<Lenient<ImageEntry>>>,
}

/// Naming fields every entry kind carries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryName {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kebab_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntryName {
    /// The normalized lookup key: `kebabName`, else `displayName`, else `name`.
    pub fn key(&self) -> Option<String> {
        [&self.kebab_name, &self.display_name, &self.name]
            .into_iter()
            .flatten()
            .find_map(|n| naming::normalize(n))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ColorEntry {
    #[serde(flatten)]
    pub name: EntryName,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStyle {
    #[serde(flatten)]
    pub name: EntryName,
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<Scalar>,
    pub font_style: Option<String>,
    pub font_weight: Option<Scalar>,
    pub line_height: Option<Scalar>,
    pub alignment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ImageEntry {
    #[serde(flatten)]
    pub name: EntryName,
    pub url: Option<String>,
}

/// A numeric style field that the endpoint may send as a number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Zero and blank values count as unset, matching how optional
    /// dimensions are skipped in the browser.
    pub fn is_set(&self) -> bool {
        match self {
            Scalar::Int(v) => *v != 0,
            Scalar::Float(v) => *v != 0.0,
            Scalar::Text(s) => !s.trim().is_empty(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

/// Entry kinds that carry an [`EntryName`].
pub trait Named: Default {
    fn entry_name(&self) -> &EntryName;

    /// An entry with only its name set.
    fn blank(name: EntryName) -> Self;
}

macro_rules! impl_named {
    ($($ty:ty),*) => {$(
        impl Named for $ty {
            fn entry_name(&self) -> &EntryName {
                &self.name
            }

            fn blank(name: EntryName) -> Self {
                Self { name, ..Default::default() }
            }
        }
    )*};
}

impl_named!(ColorEntry, TypeStyle, ImageEntry);

/// An array element read without failing its siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum Lenient<T> {
    Entry(T),
    /// The element had the wrong shape. Its name is kept when the naming
    /// fields still read, so it still replaces earlier entries of that name.
    Malformed(EntryName),
}

impl<T: Named> Lenient<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Lenient::Entry(entry) => Some(entry),
            Lenient::Malformed(_) => None,
        }
    }

    pub fn key(&self) -> Option<String> {
        match self {
            Lenient::Entry(entry) => entry.entry_name().key(),
            Lenient::Malformed(name) => name.key(),
        }
    }

    /// The value to index: the entry itself, or a blank carrying the name.
    pub fn to_entry(&self) -> T
    where
        T: Clone,
    {
        match self {
            Lenient::Entry(entry) => entry.clone(),
            Lenient::Malformed(name) => T::blank(name.clone()),
        }
    }
}

impl<'de, T: serde::de::DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match T::deserialize(&value) {
            Ok(entry) => Ok(Lenient::Entry(entry)),
            Err(e) => {
                tracing::debug!("malformed style guide entry: {e}");
                Ok(Lenient::Malformed(EntryName::deserialize(&value).unwrap_or_default()))
            }
        }
    }
}

/// Parse a response body.
///
/// An empty body or the JSON literal `null` yields `Ok(None)`.
pub fn parse(body: &str) -> Result<Option<StyleGuide>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str::<Option<StyleGuide>>(body)?)
}
