//! Sheet layouts – the static geometry of label-paper products – and the
//! registry that resolves a format key to one.
//!
//! The registry is a plain value owned by the caller, so different renders
//! can use different format tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LabelError, Result};
use crate::layout::{Size, Spacing};
use crate::units::inch_to_mm;

/// Label counts per page axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub columns: usize,
    pub rows: usize,
}

/// Offset of the first cell from the page origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageMargin {
    pub top: f32,
    pub left: f32,
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
}

impl PaperSize {
    /// Portrait dimensions in millimetres.
    pub fn dimensions(self) -> Size {
        match self {
            PaperSize::A4 => Size::new(210.0, 297.0),
            PaperSize::A5 => Size::new(148.0, 210.0),
            PaperSize::Letter => Size::new(inch_to_mm(8.5), inch_to_mm(11.0)),
            PaperSize::Legal => Size::new(inch_to_mm(8.5), inch_to_mm(14.0)),
        }
    }
}

/// A page size given either by name (`"A4"`) or explicitly
/// (`{"width": 210, "height": 297}`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageSize {
    Named(PaperSize),
    Custom(Size),
}

impl PageSize {
    pub fn dimensions(self) -> Size {
        match self {
            PageSize::Named(paper) => paper.dimensions(),
            PageSize::Custom(size) => size,
        }
    }
}

/// Geometry of one label-sheet product, in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetLayout {
    pub grid: Grid,
    pub cell_size: Size,
    #[serde(default)]
    pub gutter: Spacing,
    #[serde(default)]
    pub page_margin: PageMargin,
    pub page_size: PageSize,
}

impl SheetLayout {
    pub fn slots_per_page(&self) -> usize {
        self.grid.columns * self.grid.rows
    }

    pub fn page_dimensions(&self) -> Size {
        self.page_size.dimensions()
    }

    /// Check the invariants every layout must satisfy: finite, non-negative
    /// measurements and at least one slot per page.
    pub fn validate(&self, key: &str) -> Result<()> {
        let invalid = |reason: String| LabelError::InvalidLayout {
            key: key.to_string(),
            reason,
        };

        if self.slots_per_page() == 0 {
            return Err(invalid(format!(
                "grid {}x{} has no slots",
                self.grid.columns, self.grid.rows
            )));
        }

        let page = self.page_dimensions();
        let fields = [
            ("cellSize.width", self.cell_size.width),
            ("cellSize.height", self.cell_size.height),
            ("gutter.x", self.gutter.x),
            ("gutter.y", self.gutter.y),
            ("pageMargin.top", self.page_margin.top),
            ("pageMargin.left", self.page_margin.left),
            ("pageSize.width", page.width),
            ("pageSize.height", page.height),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be a non-negative number, got {value}")));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Format key → [`SheetLayout`] lookup table.
#[derive(Debug, Clone, Default)]
pub struct SheetRegistry {
    formats: BTreeMap<String, SheetLayout>,
}

impl SheetRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The Avery formats shipped with the crate.
    pub fn builtin() -> Self {
        let mut formats = BTreeMap::new();
        formats.insert(
            "averyL4731".to_string(),
            SheetLayout {
                grid: Grid { columns: 7, rows: 27 },
                cell_size: Size::new(25.4, 10.0),
                gutter: Spacing::new(2.5, 0.0),
                page_margin: PageMargin { top: 13.5, left: 9.0 },
                page_size: PageSize::Named(PaperSize::A4),
            },
        );
        formats.insert(
            "avery5160".to_string(),
            SheetLayout {
                grid: Grid { columns: 3, rows: 10 },
                cell_size: Size::new(inch_to_mm(2.6), inch_to_mm(1.0)),
                gutter: Spacing::new(inch_to_mm(1.0 / 6.0), 0.0),
                page_margin: PageMargin {
                    top: inch_to_mm(0.5),
                    left: inch_to_mm(0.19),
                },
                page_size: PageSize::Named(PaperSize::Letter),
            },
        );
        formats.insert(
            "avery5167".to_string(),
            SheetLayout {
                grid: Grid { columns: 4, rows: 20 },
                cell_size: Size::new(inch_to_mm(1.75), inch_to_mm(0.5)),
                gutter: Spacing::new(inch_to_mm(0.3), 0.0),
                page_margin: PageMargin {
                    top: inch_to_mm(0.5),
                    left: inch_to_mm(0.3),
                },
                page_size: PageSize::Named(PaperSize::Letter),
            },
        );
        Self { formats }
    }

    /// Add or replace a format after validating it.
    pub fn insert(&mut self, key: impl Into<String>, layout: SheetLayout) -> Result<()> {
        let key = key.into();
        layout.validate(&key)?;
        self.formats.insert(key, layout);
        Ok(())
    }

    /// Merge formats from a JSON object of `key → layout`. Existing keys are
    /// replaced. Returns the number of formats read.
    pub fn extend_from_json(&mut self, json: &str) -> Result<usize> {
        let parsed: BTreeMap<String, SheetLayout> = serde_json::from_str(json)?;
        let count = parsed.len();
        for (key, layout) in parsed {
            log::debug!("Registering sheet format '{key}'");
            self.insert(key, layout)?;
        }
        Ok(count)
    }

    pub fn get(&self, key: &str) -> Result<&SheetLayout> {
        self.formats.get(key).ok_or_else(|| LabelError::UnknownFormat {
            key: key.to_string(),
            known: self.keys().collect::<Vec<_>>().join(", "),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.formats.contains_key(key)
    }

    /// Format keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SheetLayout)> {
        self.formats.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_formats_are_valid() {
        let registry = SheetRegistry::builtin();
        assert_eq!(registry.len(), 3);
        for (key, layout) in registry.iter() {
            layout.validate(key).unwrap();
        }
        assert_eq!(registry.get("averyL4731").unwrap().slots_per_page(), 189);
        assert_eq!(registry.get("avery5160").unwrap().slots_per_page(), 30);
    }

    #[test]
    fn unknown_format_lists_known_keys() {
        let err = SheetRegistry::builtin().get("nope").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Unknown label format: nope"), "{msg}");
        assert!(msg.contains("averyL4731"), "{msg}");
    }

    #[test]
    fn letter_resolves_to_millimetres() {
        let size = PageSize::Named(PaperSize::Letter).dimensions();
        assert!((size.width - 215.9).abs() < 1e-3);
        assert!((size.height - 279.4).abs() < 1e-3);
    }

    #[test]
    fn extend_from_json_accepts_named_and_custom_pages() {
        let mut registry = SheetRegistry::new();
        let json = r#"{
            "tiny": {
                "grid": {"columns": 2, "rows": 2},
                "cellSize": {"width": 40, "height": 20},
                "pageSize": "A5"
            },
            "custom": {
                "grid": {"columns": 1, "rows": 3},
                "cellSize": {"width": 50, "height": 10},
                "gutter": {"x": 0, "y": 2},
                "pageMargin": {"top": 5, "left": 5},
                "pageSize": {"width": 60, "height": 50}
            }
        }"#;
        assert_eq!(registry.extend_from_json(json).unwrap(), 2);
        assert_eq!(
            registry.get("tiny").unwrap().page_dimensions(),
            Size::new(148.0, 210.0)
        );
        assert_eq!(
            registry.get("custom").unwrap().page_dimensions(),
            Size::new(60.0, 50.0)
        );
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["custom", "tiny"]);
    }

    #[test]
    fn empty_grid_is_rejected() {
        let mut registry = SheetRegistry::new();
        let layout = SheetLayout {
            grid: Grid { columns: 0, rows: 4 },
            cell_size: Size::new(10.0, 10.0),
            gutter: Spacing::default(),
            page_margin: PageMargin::default(),
            page_size: PageSize::Named(PaperSize::A4),
        };
        assert!(matches!(
            registry.insert("empty", layout),
            Err(LabelError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn negative_gutter_is_rejected() {
        let json = r#"{"bad": {"grid": {"columns": 1, "rows": 1},
            "cellSize": {"width": 10, "height": 10},
            "gutter": {"x": -1, "y": 0}, "pageSize": "A4"}}"#;
        let err = SheetRegistry::new().extend_from_json(json).unwrap_err();
        assert!(err.to_string().contains("gutter.x"));
    }
}
