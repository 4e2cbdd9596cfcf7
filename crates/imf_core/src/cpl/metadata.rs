//! Descriptive composition metadata: versions, locales, descriptors.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use roxmltree::Node;
use serde::Serialize;

use crate::error::{ImfError, ImfResult};
use crate::identifier::Identifier;
use crate::xml::{self, UserText};

/// Default scope of `ContentKind` values.
pub const CONTENT_KIND_SCOPE: &str = "http://www.smpte-ra.org/schemas/2067-3/2013#content-kind";

/// Kind of work a composition represents (`feature`, `trailer`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentKind {
    pub kind: String,
    pub scope: String,
}

impl ContentKind {
    pub(crate) fn from_node(node: Node<'_, '_>) -> Self {
        Self {
            kind: node.text().map(str::trim).unwrap_or_default().to_string(),
            scope: node
                .attribute("scope")
                .unwrap_or(CONTENT_KIND_SCOPE)
                .to_string(),
        }
    }
}

/// One version of the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentVersion {
    pub id: Identifier,
    pub label: UserText,
}

impl ContentVersion {
    fn from_node(node: Node<'_, '_>) -> ImfResult<Self> {
        Ok(Self {
            id: xml::required_id(node, "Id")?,
            label: xml::required_user_text(node, "LabelText")?,
        })
    }
}

/// Content versions keyed by id, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContentVersions {
    entries: Vec<ContentVersion>,
    #[serde(skip)]
    index: HashMap<Identifier, usize>,
}

impl ContentVersions {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a version; ids must be unique.
    pub fn insert(&mut self, version: ContentVersion) -> ImfResult<()> {
        if self.index.contains_key(&version.id) {
            return Err(ImfError::DuplicateIdentifier {
                what: "ContentVersion",
                id: version.id,
            });
        }
        self.index.insert(version.id, self.entries.len());
        self.entries.push(version);
        Ok(())
    }

    /// Version with the given id.
    pub fn get(&self, id: &Identifier) -> Option<&ContentVersion> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Versions in document order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentVersion> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Two compositions refer to the same content when they share a version id.
    pub fn shares_content_with(&self, other: &ContentVersions) -> bool {
        self.index.keys().any(|id| other.index.contains_key(id))
    }

    pub(crate) fn from_list(list: Option<Node<'_, '_>>) -> ImfResult<Self> {
        let mut versions = Self::new();
        if let Some(list) = list {
            for node in xml::children_named(list, "ContentVersion") {
                versions.insert(ContentVersion::from_node(node)?)?;
            }
        }
        Ok(versions)
    }
}

/// A rating issued by one agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentMaturityRating {
    /// URI of the rating agency.
    pub agency: String,
    /// Rating as issued by the agency.
    pub rating: String,
    /// Audience text keyed by scope.
    pub audiences: BTreeMap<String, String>,
}

impl ContentMaturityRating {
    fn from_node(node: Node<'_, '_>) -> ImfResult<Self> {
        let audiences = xml::children_named(node, "Audience")
            .map(|aud| {
                (
                    aud.attribute("scope").unwrap_or_default().to_string(),
                    aud.text().map(str::trim).unwrap_or_default().to_string(),
                )
            })
            .collect();

        Ok(Self {
            agency: xml::required_text(node, "Agency")?,
            rating: xml::required_text(node, "Rating")?,
            audiences,
        })
    }
}

/// Audience information for one territory or language group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Locale {
    pub annotation: Option<UserText>,
    /// RFC 5646 language tags.
    pub languages: Vec<String>,
    /// RFC 5646 region subtags.
    pub regions: Vec<String>,
    pub content_maturity_ratings: Vec<ContentMaturityRating>,
}

impl Locale {
    /// Rating issued by an agency.
    pub fn rating_by(&self, agency: &str) -> Option<&ContentMaturityRating> {
        self.content_maturity_ratings
            .iter()
            .find(|r| r.agency == agency)
    }

    pub(crate) fn from_node(node: Node<'_, '_>) -> ImfResult<Self> {
        let texts = |list: &str| -> Vec<String> {
            xml::child(node, list)
                .map(|l| {
                    xml::elements(l)
                        .filter_map(|n| n.text())
                        .map(|t| t.trim().to_string())
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut ratings: Vec<ContentMaturityRating> = Vec::new();
        if let Some(list) = xml::child(node, "ContentMaturityRatingList") {
            for rating_node in xml::children_named(list, "ContentMaturityRating") {
                let rating = ContentMaturityRating::from_node(rating_node)?;
                if ratings.iter().any(|r| r.agency == rating.agency) {
                    return Err(ImfError::DuplicateRatingAgency(rating.agency));
                }
                ratings.push(rating);
            }
        }

        Ok(Self {
            annotation: xml::optional_user_text(node, "Annotation"),
            languages: texts("LanguageList"),
            regions: texts("RegionList"),
            content_maturity_ratings: ratings,
        })
    }
}

/// An essence descriptor; only the names of its body elements are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EssenceDescriptor {
    pub id: Identifier,
    pub element_names: Vec<String>,
}

impl EssenceDescriptor {
    pub(crate) fn from_node(node: Node<'_, '_>) -> ImfResult<Self> {
        Ok(Self {
            id: xml::required_id(node, "Id")?,
            element_names: xml::elements(node)
                .map(|n| n.tag_name().name())
                .filter(|name| *name != "Id")
                .map(str::to_string)
                .collect(),
        })
    }
}

/// An application extension element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionProperty {
    /// Local name of the element.
    pub name: String,
    /// Namespace URI, if any.
    pub namespace: Option<String>,
}

impl ExtensionProperty {
    pub(crate) fn from_node(node: Node<'_, '_>) -> Self {
        Self {
            name: node.tag_name().name().to_string(),
            namespace: node.tag_name().namespace().map(str::to_string),
        }
    }
}

/// Parse a `TotalRuntime` value (`HH:MM:SS`, hours may exceed 99).
pub fn parse_total_runtime(text: &str) -> ImfResult<Duration> {
    let invalid = || ImfError::invalid_value("TotalRuntime", text);

    let parts: Vec<&str> = text.trim().split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return Err(invalid());
    };
    let hours: u64 = hours.parse().map_err(|_| invalid())?;
    let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
    let seconds: u64 = seconds.parse().map_err(|_| invalid())?;
    if minutes > 59 || seconds > 59 {
        return Err(invalid());
    }
    let total = hours
        .checked_mul(3600)
        .and_then(|s| s.checked_add(minutes * 60 + seconds))
        .ok_or_else(invalid)?;
    Ok(Duration::from_secs(total))
}
