use std::fmt;

use super::LOCATIONS;

/// Path-style link from an appraisal to its location: `"<collection>/<id>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRef {
    collection: String,
    id: String,
}

impl LocationRef {
    /// Reference to a document in the `locations` collection.
    pub fn for_location(id: &str) -> Self {
        Self {
            collection: LOCATIONS.to_string(),
            id: id.to_string(),
        }
    }

    /// Accepts exactly two `/`-separated segments. The collection segment is
    /// not checked; the second segment is the lookup key.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut segments = raw.split('/');
        let (Some(collection), Some(id), None) =
            (segments.next(), segments.next(), segments.next())
        else {
            return None;
        };
        if id.is_empty() {
            return None;
        }

        Some(Self {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for LocationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
