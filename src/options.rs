//! Render options – everything about a run that is not sheet geometry.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::content::{ContentPolicy, MAX_COUNTER_DIGITS};
use crate::error::{LabelError, Result};
use crate::layout::{Calibration, GridPositioner, Orientation, Spacing};
use crate::sheet::SheetLayout;

/// What is drawn into each cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Code image plus printed text (default).
    #[default]
    Codes,
    /// Cell outlines only; the counter never advances.
    Blank,
}

/// Per-run options. Every field has a default, so a JSON options file only
/// needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    pub orientation: Orientation,
    pub calibration: Calibration,
    /// Padding between a cell's edge and its content, in millimetres.
    pub inner_margin: Spacing,
    /// Stroke each cell's outline.
    pub border: bool,
    /// Leading slots (document-wide) left empty.
    pub skip: usize,
    pub content: ContentMode,
    #[serde(flatten)]
    pub numbering: ContentPolicy,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "Labels".to_string(),
            orientation: Orientation::RowMajor,
            calibration: Calibration::default(),
            inner_margin: Spacing::new(1.0, 1.0),
            border: false,
            skip: 0,
            content: ContentMode::Codes,
            numbering: ContentPolicy::default(),
        }
    }
}

impl RenderOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject options that cannot produce a sensible document for `total`
    /// slots. Runs before any rendering.
    pub fn validate(&self, total: usize) -> Result<()> {
        let scale = self.calibration.scale;
        for (field, value) in [("calibration.scale.x", scale.x), ("calibration.scale.y", scale.y)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LabelError::invalid_option(
                    field,
                    format!("must be greater than zero, got {value}"),
                ));
            }
        }

        let offset = self.calibration.offset;
        for (field, value) in [("calibration.offset.x", offset.x), ("calibration.offset.y", offset.y)] {
            if !value.is_finite() {
                return Err(LabelError::invalid_option(field, "must be a finite number"));
            }
        }

        let margin = self.inner_margin;
        for (field, value) in [("innerMargin.x", margin.x), ("innerMargin.y", margin.y)] {
            if !value.is_finite() || value < 0.0 {
                return Err(LabelError::invalid_option(
                    field,
                    format!("must be zero or positive, got {value}"),
                ));
            }
        }

        if self.skip > total {
            return Err(LabelError::SkipExceedsCount {
                skip: self.skip,
                total,
            });
        }

        let digits = self.numbering.counter_digits;
        if digits > MAX_COUNTER_DIGITS {
            return Err(LabelError::invalid_option(
                "counterDigits",
                format!("must be at most {MAX_COUNTER_DIGITS}, got {digits}"),
            ));
        }

        // The counter after the last label must still be representable.
        let start = self.numbering.counter_start;
        let labels = (total - self.skip) as u64;
        if start.checked_add(labels).is_none() {
            return Err(LabelError::invalid_option(
                "counterStart",
                format!("{start} + {labels} labels overflows the sequence"),
            ));
        }
        Ok(())
    }
}

/// A 1-based `row:column` grid position, an alternative way to express
/// `skip` on the first sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartPosition {
    pub row: usize,
    pub column: usize,
}

impl FromStr for StartPosition {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            LabelError::invalid_option("startPosition", format!("expected ROW:COLUMN, got {s:?}"))
        };
        let (row, column) = s.split_once(':').ok_or_else(invalid)?;
        let row: usize = row.trim().parse().map_err(|_| invalid())?;
        let column: usize = column.trim().parse().map_err(|_| invalid())?;
        if row == 0 || column == 0 {
            return Err(LabelError::invalid_option(
                "startPosition",
                "rows and columns are numbered from 1",
            ));
        }
        Ok(Self { row, column })
    }
}

impl StartPosition {
    /// Number of slots before this position in the given iteration order.
    pub fn to_skip(self, layout: &SheetLayout, orientation: Orientation) -> Result<usize> {
        GridPositioner::new(layout, orientation)
            .slot_at(self.column - 1, self.row - 1)
            .ok_or_else(|| {
                LabelError::invalid_option(
                    "startPosition",
                    format!(
                        "{}:{} is outside the {}x{} grid",
                        self.row, self.column, layout.grid.rows, layout.grid.columns
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Point, Scale};
    use crate::sheet::SheetRegistry;

    #[test]
    fn defaults_validate() {
        RenderOptions::default().validate(10).unwrap();
    }

    #[test]
    fn non_positive_scale_rejected() {
        let mut opts = RenderOptions::default();
        opts.calibration.scale = Scale { x: 1.0, y: 0.0 };
        let err = opts.validate(10).unwrap_err();
        assert!(err.to_string().contains("calibration.scale.y"), "{err}");
    }

    #[test]
    fn negative_margin_rejected() {
        let opts = RenderOptions {
            inner_margin: Spacing::new(-0.5, 1.0),
            ..RenderOptions::default()
        };
        assert!(matches!(
            opts.validate(10),
            Err(LabelError::InvalidOption { field: "innerMargin.x", .. })
        ));
    }

    #[test]
    fn negative_offset_allowed() {
        let mut opts = RenderOptions::default();
        opts.calibration.offset = Point::new(-2.0, -1.5);
        opts.validate(10).unwrap();
    }

    #[test]
    fn skip_beyond_total_rejected() {
        let opts = RenderOptions {
            skip: 11,
            ..RenderOptions::default()
        };
        assert!(matches!(
            opts.validate(10),
            Err(LabelError::SkipExceedsCount { skip: 11, total: 10 })
        ));
        opts.validate(11).unwrap();
    }

    #[test]
    fn counter_overflow_rejected() {
        let mut opts = RenderOptions::default();
        opts.numbering.counter_start = u64::MAX;
        assert!(matches!(
            opts.validate(1),
            Err(LabelError::InvalidOption { field: "counterStart", .. })
        ));
        // Nothing is drawn, so the counter never moves.
        opts.validate(0).unwrap();

        opts.numbering.counter_start = u64::MAX - 10;
        opts.validate(10).unwrap();
        opts.skip = 2;
        opts.validate(12).unwrap();
        assert!(opts.validate(13).is_err());
    }

    #[test]
    fn excessive_digits_rejected() {
        let mut opts = RenderOptions::default();
        opts.numbering.counter_digits = MAX_COUNTER_DIGITS;
        opts.validate(1).unwrap();
        opts.numbering.counter_digits = 1 << 30;
        let err = opts.validate(1).unwrap_err();
        assert!(err.to_string().contains("counterDigits"), "{err}");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let opts = RenderOptions::from_json(
            r#"{"codePrefix": "BOX", "counterDigits": 4, "orientation": "column-major",
                "calibration": {"scale": {"x": 0.98, "y": 1.01}}}"#,
        )
        .unwrap();
        assert_eq!(opts.numbering.code_prefix, "BOX");
        assert_eq!(opts.numbering.counter_digits, 4);
        assert_eq!(opts.numbering.counter_start, 1);
        assert_eq!(opts.orientation, Orientation::ColumnMajor);
        assert_eq!(opts.calibration.offset, Point::default());
        assert_eq!(opts.inner_margin, Spacing::new(1.0, 1.0));
    }

    #[test]
    fn json_round_trip() {
        let opts = RenderOptions {
            skip: 3,
            border: true,
            content: ContentMode::Blank,
            ..RenderOptions::default()
        };
        assert_eq!(RenderOptions::from_json(&opts.to_json()).unwrap(), opts);
    }

    #[test]
    fn start_position_parses() {
        let pos: StartPosition = "3:2".parse().unwrap();
        assert_eq!(pos, StartPosition { row: 3, column: 2 });
        assert!("0:1".parse::<StartPosition>().is_err());
        assert!("3".parse::<StartPosition>().is_err());
        assert!("a:b".parse::<StartPosition>().is_err());
    }

    #[test]
    fn start_position_to_skip_follows_orientation() {
        let registry = SheetRegistry::builtin();
        let layout = registry.get("avery5160").unwrap();
        let pos = StartPosition { row: 3, column: 2 };
        assert_eq!(pos.to_skip(layout, Orientation::RowMajor).unwrap(), 7);
        assert_eq!(pos.to_skip(layout, Orientation::ColumnMajor).unwrap(), 12);
        let off_grid = StartPosition { row: 11, column: 1 };
        assert!(off_grid.to_skip(layout, Orientation::RowMajor).is_err());
    }
}
