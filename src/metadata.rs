//! Item metadata as seen by the visibility decision.
//!
//! The repository owns persistence; this module only describes the shape of
//! the values the evaluator reads and the [`MetadataStore`] seam it reads
//! them through.

use std::fmt;

use crate::error::RetrievalFault;

/// Schema of the ownership field.
pub const OWNER_SCHEMA: &str = "cris";
/// Element of the ownership field.
pub const OWNER_ELEMENT: &str = "owner";

/// A `(schema, element, qualifier)` slot on an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataField {
    /// Schema prefix, e.g. `dc` or `cris`
    pub schema: String,
    /// Element name, e.g. `title`
    pub element: String,
    /// Optional qualifier, e.g. `alternative`
    pub qualifier: Option<String>,
}

impl MetadataField {
    /// Creates a field from its parts.
    pub fn new(schema: &str, element: &str, qualifier: Option<&str>) -> Self {
        Self {
            schema: schema.to_string(),
            element: element.to_string(),
            qualifier: qualifier.map(str::to_string),
        }
    }

    /// Parses the dotted form `schema.element[.qualifier]`.
    ///
    /// Returns `None` when the schema or element is missing or when there
    /// are more than three segments.
    ///
    /// ```
    /// use repository_guard::MetadataField;
    ///
    /// let field = MetadataField::parse("dc.title.alternative").unwrap();
    /// assert_eq!(field.qualifier.as_deref(), Some("alternative"));
    /// assert!(MetadataField::parse("dc").is_none());
    /// ```
    pub fn parse(dotted: &str) -> Option<Self> {
        let mut parts = dotted.split('.');
        let schema = parts.next().filter(|s| !s.is_empty())?;
        let element = parts.next().filter(|s| !s.is_empty())?;
        let qualifier = match parts.next() {
            Some("") => return None,
            other => other,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(schema, element, qualifier))
    }

    /// The ownership field, `cris.owner`.
    pub fn owner() -> Self {
        Self::new(OWNER_SCHEMA, OWNER_ELEMENT, None)
    }

    /// True if this field has the given schema and element, whatever its qualifier.
    pub fn matches(&self, schema: &str, element: &str) -> bool {
        self.schema == schema && self.element == element
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.element)?;
        if let Some(q) = &self.qualifier {
            write!(f, ".{}", q)?;
        }
        Ok(())
    }
}

/// Security level tag carried by a metadata value.
///
/// Level 0 is public. Higher levels are restricted and are only shown when
/// an evaluator registered for that level allows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecurityLevel(pub u8);

impl SecurityLevel {
    /// Visible to everyone.
    pub const PUBLIC: SecurityLevel = SecurityLevel(0);
    /// Visible to owning administrators.
    pub const OWNER_ADMIN: SecurityLevel = SecurityLevel(2);
}

/// One value of a field attached to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataValue {
    /// The field this value belongs to
    pub field: MetadataField,
    /// The value text
    pub value: String,
    /// Optional language tag
    pub language: Option<String>,
    /// Optional authority; on `cris.owner` this encodes the owner's identifier
    pub authority: Option<String>,
    /// Position among the values of the same field
    pub place: usize,
    /// Optional authority confidence score
    pub confidence: Option<i32>,
    /// Optional security level; absent means public
    pub security_level: Option<SecurityLevel>,
}

impl MetadataValue {
    /// Creates a plain value with no language, authority, confidence or level.
    pub fn new(field: MetadataField, value: impl Into<String>, place: usize) -> Self {
        Self {
            field,
            value: value.into(),
            language: None,
            authority: None,
            place,
            confidence: None,
            security_level: None,
        }
    }

    /// Sets the authority.
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    /// Sets the language tag.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the confidence score.
    pub fn with_confidence(mut self, confidence: i32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Sets the security level.
    pub fn with_security_level(mut self, level: SecurityLevel) -> Self {
        self.security_level = Some(level);
        self
    }
}

/// The content-bearing entity whose metadata is being rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Item identifier
    pub id: String,
    /// All values, in insertion order
    pub metadata: Vec<MetadataValue>,
}

impl Item {
    /// Creates an item with no metadata.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: Vec::new(),
        }
    }

    /// Appends a value, placing it after existing values of the same field.
    pub fn add_value(&mut self, field: MetadataField, value: impl Into<String>) -> &mut MetadataValue {
        let place = self
            .metadata
            .iter()
            .filter(|v| v.field == field)
            .count();
        self.metadata.push(MetadataValue::new(field, value, place));
        let last = self.metadata.len() - 1;
        &mut self.metadata[last]
    }

    /// Records `owner` as an owner of this item on `cris.owner`.
    pub fn add_owner(&mut self, display: impl Into<String>, owner: &str) {
        let value = self.add_value(MetadataField::owner(), display);
        value.authority = Some(owner.to_string());
    }
}

/// Source of an item's metadata values.
///
/// Implementations may hit a database; any failure to answer must be
/// reported as a [`RetrievalFault`], never as an empty result.
pub trait MetadataStore {
    /// Returns every value on `item` with the given schema and element,
    /// regardless of qualifier, ordered by place.
    fn values_for_field(
        &self,
        item: &Item,
        schema: &str,
        element: &str,
    ) -> Result<Vec<MetadataValue>, RetrievalFault>;
}

/// A [`MetadataStore`] that reads the values already loaded on the item.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemMetadata;

impl MetadataStore for ItemMetadata {
    fn values_for_field(
        &self,
        item: &Item,
        schema: &str,
        element: &str,
    ) -> Result<Vec<MetadataValue>, RetrievalFault> {
        let mut values: Vec<MetadataValue> = item
            .metadata
            .iter()
            .filter(|v| v.field.matches(schema, element))
            .cloned()
            .collect();
        // Stable sort keeps insertion order between qualifiers sharing a place.
        values.sort_by_key(|v| v.place);
        Ok(values)
    }
}
