//! Top-level display modes of the directory.
//!
//! # Examples
//! ```
//! use spotfinder_core::ViewMode;
//!
//! assert_eq!(ViewMode::default(), ViewMode::Map);
//! assert_eq!(ViewMode::Detail.to_string(), "detail");
//! assert_eq!("LIST".parse::<ViewMode>(), Ok(ViewMode::List));
//! ```

/// Which presentation surface is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ViewMode {
    /// Spots drawn as map markers.
    #[default]
    Map,
    /// Spots listed as cards.
    List,
    /// A single selected spot shown in full.
    Detail,
}

impl ViewMode {
    /// Return the mode as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::List => "list",
            Self::Detail => "detail",
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "map" => Ok(Self::Map),
            "list" => Ok(Self::List),
            "detail" => Ok(Self::Detail),
            _ => Err(format!("unknown view mode '{s}'")),
        }
    }
}
