//! Paths into the validated data.
//!
//! Every evaluated node that came from the data carries the path it was
//! read from; rule results report the set of paths their outcome depended
//! on. The printed form is `user.profile.age` for fields and
//! `items[1].value` for list elements.

use std::fmt;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// A path from the data root to a nested value. The empty path is the
/// root itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn empty() -> FieldPath {
        FieldPath::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Extend with a field segment, returning the longer path.
    pub fn field(&self, name: impl Into<String>) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.into()));
        FieldPath { segments }
    }

    /// Extend with an index segment, returning the longer path.
    pub fn index(&self, index: usize) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        FieldPath { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}
