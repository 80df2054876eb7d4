//! Record types for the scraped output. Field names serialize to the
//! output document keys: camelCase except `geipan_id` and `cas_title`.
//! Absent fields are omitted from the JSON rather than written as `null`.

use serde::{Deserialize, Serialize};

/// One observation report, the top-level unit of output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    /// Trailing path segment of the case detail URL.
    #[serde(rename = "geipan_id")]
    pub geipan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_event: Option<String>,
    /// Strangeness score; unparsable sidebar text falls back to 0.
    pub strange: f64,
    /// Consistency score; same fallback as `strange`.
    pub consistance: f64,
    /// Attached documents, then testimony-container links that turned out
    /// not to be testimony pages.
    pub documents: Vec<DocumentLink>,
    /// One entry per testimony page, in request order.
    pub testimonials: Vec<Testimony>,
}

/// GEIPAN classification of a case, from A (identified) to D (unexplained
/// despite good data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    A,
    B,
    C,
    D,
}

impl Classification {
    /// Parse the sidebar rendering. Anything outside the closed set
    /// degrades to `None`, it never fails the case.
    pub fn from_site(s: &str) -> Option<Self> {
        match s.trim() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }
}

/// A named link attached to a case. `link` is the raw `href`, kept
/// relative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLink {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// One witness account nested under a case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimony {
    /// Trailing path segment of the testimony URL, independent of the
    /// parent case's id.
    #[serde(rename = "geipan_id")]
    pub geipan_id: String,
    /// The parent case title as rendered on the testimony page.
    #[serde(rename = "cas_title", skip_serializing_if = "Option::is_none")]
    pub cas_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation_at: Option<String>,
    /// Witness age. Absent or unparsable stays unset, never 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_event_witness: Option<String>,
    pub location: Location,
}

/// Witness gender code as rendered on testimony pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    H,
    M,
}

impl Gender {
    pub fn from_site(s: &str) -> Option<Self> {
        match s.trim() {
            "H" => Some(Self::H),
            "M" => Some(Self::M),
            _ => None,
        }
    }
}

/// What was observed, as described by the witness. Six independent
/// descriptors; any of them may be missing from the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specificity_observation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_event: Option<String>,
}
