#![forbid(unsafe_code)]

//! Tree coordinates.
//!
//! A [`Path`] is the sequence of child indices leading from the root sentinel
//! to a node. Paths are immutable values with structural equality and hashing,
//! so they can be used directly as cache keys.
//!
//! # Text form
//!
//! Paths display as `/`-separated indices (`"0/12/63"`); the root displays as
//! `"/"`. [`FromStr`] accepts the same form, with or without a leading slash.
//!
//! ```
//! use nanotree_core::Path;
//!
//! let path: Path = "0/12/63".parse().unwrap();
//! assert_eq!(path.segments(), &[0, 12, 63]);
//! assert_eq!(path.parent().unwrap().to_string(), "0/12");
//! assert!(Path::root().parent().is_none());
//! ```

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

/// Number of children under every node.
pub const BRANCHING: usize = 64;

/// Deepest path the tree models (root sentinel excluded).
pub const MAX_PATH_LEN: usize = 10;

/// Errors raised when building a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A segment was not a valid child index.
    SegmentOutOfRange { position: usize, value: u32 },
    /// The path would be deeper than [`MAX_PATH_LEN`].
    TooDeep { len: usize },
    /// A segment in the text form was not an integer.
    Parse { segment: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SegmentOutOfRange { position, value } => write!(
                f,
                "segment {position} is {value}, expected a child index below {BRANCHING}"
            ),
            Self::TooDeep { len } => {
                write!(f, "path of length {len} exceeds the {MAX_PATH_LEN}-level tree")
            }
            Self::Parse { segment } => write!(f, "invalid path segment {segment:?}"),
        }
    }
}

impl std::error::Error for PathError {}

/// Position of a node in the 64-ary tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<u8>", into = "Vec<u8>")
)]
pub struct Path {
    segments: SmallVec<[u8; MAX_PATH_LEN]>,
}

impl Path {
    /// The root sentinel (empty path).
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from child indices.
    pub fn new(segments: &[u8]) -> Result<Self, PathError> {
        if segments.len() > MAX_PATH_LEN {
            return Err(PathError::TooDeep {
                len: segments.len(),
            });
        }
        if let Some((position, &value)) = segments
            .iter()
            .enumerate()
            .find(|(_, s)| usize::from(**s) >= BRANCHING)
        {
            return Err(PathError::SegmentOutOfRange {
                position,
                value: u32::from(value),
            });
        }
        Ok(Self {
            segments: SmallVec::from_slice(segments),
        })
    }

    /// Path to child `index` of this node.
    pub fn child(&self, index: usize) -> Result<Self, PathError> {
        if index >= BRANCHING {
            return Err(PathError::SegmentOutOfRange {
                position: self.len(),
                value: u32::try_from(index).unwrap_or(u32::MAX),
            });
        }
        if self.len() == MAX_PATH_LEN {
            return Err(PathError::TooDeep { len: self.len() + 1 });
        }
        let mut segments = self.segments.clone();
        segments.push(index as u8);
        Ok(Self { segments })
    }

    /// Path of the enclosing node, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: SmallVec::from_slice(rest),
        })
    }

    /// The first `len` segments of this path.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        let len = len.min(self.len());
        Self {
            segments: SmallVec::from_slice(&self.segments[..len]),
        }
    }

    /// Child index of this node within its parent.
    #[must_use]
    pub fn last(&self) -> Option<usize> {
        self.segments.last().map(|&s| usize::from(s))
    }

    #[must_use]
    pub fn segments(&self) -> &[u8] {
        &self.segments
    }

    /// Tree depth (0 for the root).
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Zero-based level of the node (`len - 1`), `None` for the root.
    #[must_use]
    pub fn level(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    /// Paths to all 64 children, or `None` at [`MAX_PATH_LEN`].
    pub fn children(&self) -> Option<impl Iterator<Item = Path> + '_> {
        if self.len() == MAX_PATH_LEN {
            return None;
        }
        Some((0..BRANCHING).map(move |i| {
            let mut segments = self.segments.clone();
            segments.push(i as u8);
            Path { segments }
        }))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for (position, part) in trimmed.split('/').enumerate() {
            let value: u32 = part.trim().parse().map_err(|_| PathError::Parse {
                segment: part.to_string(),
            })?;
            let segment = u8::try_from(value)
                .map_err(|_| PathError::SegmentOutOfRange { position, value })?;
            segments.push(segment);
        }
        Self::new(&segments)
    }
}

impl TryFrom<Vec<u8>> for Path {
    type Error = PathError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Path> for Vec<u8> {
    fn from(path: Path) -> Self {
        path.segments.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn root_is_empty() {
        let root = Path::root();
        assert!(root.is_root());
        assert_eq!(root.len(), 0);
        assert_eq!(root.level(), None);
        assert_eq!(root.last(), None);
        assert!(root.parent().is_none());
    }

    #[test]
    fn new_rejects_out_of_range_segment() {
        let err = Path::new(&[1, 64]).unwrap_err();
        assert_eq!(
            err,
            PathError::SegmentOutOfRange {
                position: 1,
                value: 64
            }
        );
    }

    #[test]
    fn new_rejects_too_deep() {
        let err = Path::new(&[0; 11]).unwrap_err();
        assert_eq!(err, PathError::TooDeep { len: 11 });
        assert!(Path::new(&[0; 10]).is_ok());
    }

    #[test]
    fn child_and_parent_round_trip() {
        let path = Path::new(&[3, 7]).unwrap();
        let child = path.child(42).unwrap();
        assert_eq!(child.segments(), &[3, 7, 42]);
        assert_eq!(child.last(), Some(42));
        assert_eq!(child.level(), Some(2));
        assert_eq!(child.parent(), Some(path));
    }

    #[test]
    fn child_rejects_bad_index_and_depth() {
        assert!(Path::root().child(64).is_err());
        let deep = Path::new(&[1; 10]).unwrap();
        assert_eq!(deep.child(0).unwrap_err(), PathError::TooDeep { len: 11 });
        assert!(deep.children().is_none());
    }

    #[test]
    fn children_enumerates_all_indices() {
        let path = Path::new(&[5]).unwrap();
        let children: Vec<Path> = path.children().unwrap().collect();
        assert_eq!(children.len(), BRANCHING);
        assert_eq!(children[0].segments(), &[5, 0]);
        assert_eq!(children[63].segments(), &[5, 63]);
    }

    #[test]
    fn prefix_truncates() {
        let path = Path::new(&[1, 2, 3, 4]).unwrap();
        assert_eq!(path.prefix(2).segments(), &[1, 2]);
        assert_eq!(path.prefix(0), Path::root());
        assert_eq!(path.prefix(99), path);
    }

    #[test]
    fn display_and_parse() {
        let path = Path::new(&[0, 12, 63]).unwrap();
        assert_eq!(path.to_string(), "0/12/63");
        assert_eq!("0/12/63".parse::<Path>().unwrap(), path);
        assert_eq!("/0/12/63".parse::<Path>().unwrap(), path);
        assert_eq!(Path::root().to_string(), "/");
        assert_eq!("/".parse::<Path>().unwrap(), Path::root());
        assert_eq!("".parse::<Path>().unwrap(), Path::root());
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            "1/x".parse::<Path>(),
            Err(PathError::Parse { .. })
        ));
        assert!(matches!(
            "1/300".parse::<Path>(),
            Err(PathError::SegmentOutOfRange { position: 1, value: 300 })
        ));
        assert!(matches!(
            "1/64".parse::<Path>(),
            Err(PathError::SegmentOutOfRange { position: 1, value: 64 })
        ));
    }

    #[test]
    fn usable_as_map_key() {
        let mut map = HashMap::new();
        map.insert(Path::new(&[1, 2]).unwrap(), "a");
        let key = Path::root().child(1).unwrap().child(2).unwrap();
        assert_eq!(map.get(&key), Some(&"a"));
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = Path::new(&[0, 63]).unwrap();
        let b = Path::new(&[1]).unwrap();
        assert!(a < b);
        assert!(Path::root() < a);
    }

    #[test]
    fn error_display() {
        let msg = PathError::TooDeep { len: 12 }.to_string();
        assert!(msg.contains("12"));
    }
}
