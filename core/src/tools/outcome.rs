//! Result shape shared by the lookup tools

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

/// Records found by a lookup, or the message explaining that none were.
///
/// Both variants serialize to a JSON array: the records themselves, or a
/// single `{"message": ...}` object.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<T> {
    Found(Vec<T>),
    NotFound { message: String },
}

#[derive(Serialize)]
struct NotFoundRecord<'a> {
    message: &'a str,
}

impl<T> SearchOutcome<T> {
    /// `Found` for a non-empty list, otherwise `NotFound` with the given message
    pub fn from_records(records: Vec<T>, not_found: impl FnOnce() -> String) -> Self {
        if records.is_empty() {
            SearchOutcome::NotFound {
                message: not_found(),
            }
        } else {
            SearchOutcome::Found(records)
        }
    }

    pub fn records(&self) -> &[T] {
        match self {
            SearchOutcome::Found(records) => records,
            SearchOutcome::NotFound { .. } => &[],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SearchOutcome::Found(_) => None,
            SearchOutcome::NotFound { message } => Some(message),
        }
    }
}

impl<T: Serialize> Serialize for SearchOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SearchOutcome::Found(records) => records.serialize(serializer),
            SearchOutcome::NotFound { message } => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(&NotFoundRecord { message })?;
                seq.end()
            }
        }
    }
}
