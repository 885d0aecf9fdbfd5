//! Line catalog and usable-line selection policy.

mod parser;

pub use parser::{LINE_CATALOG_FILE, LINE_SELECTION_FILE, load_line_catalog, load_line_selection};

use crate::domain::{LsfError, LsfResult};
use crate::modules::traits::{LineCatalog, LineSelection};
use std::collections::BTreeMap;

/// Ordered reference wavelengths for one spectral configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LineCatalogTable {
    wavelengths: Vec<f64>,
}

impl LineCatalogTable {
    pub fn new(wavelengths: Vec<f64>) -> Self {
        Self { wavelengths }
    }
}

impl LineCatalog for LineCatalogTable {
    fn reference_wavelength(&self, line: usize) -> LsfResult<f64> {
        self.wavelengths.get(line).copied().ok_or_else(|| {
            LsfError::input_validation(
                "INPUT.LINE_INDEX",
                format!(
                    "line catalog holds {} lines, line {} requested",
                    self.wavelengths.len(),
                    line
                ),
            )
        })
    }

    fn line_count(&self) -> usize {
        self.wavelengths.len()
    }
}

/// Inclusive usable-line ranges, per slice with a catalog-wide default.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSelectionTable {
    default: [usize; 2],
    per_slice: BTreeMap<usize, [usize; 2]>,
}

impl LineSelectionTable {
    pub fn new(default: [usize; 2], per_slice: BTreeMap<usize, [usize; 2]>) -> Self {
        Self { default, per_slice }
    }

    fn range(&self, slice: usize) -> [usize; 2] {
        self.per_slice.get(&slice).copied().unwrap_or(self.default)
    }
}

impl LineSelection for LineSelectionTable {
    fn first_usable_line(&self, slice: usize) -> usize {
        self.range(slice)[0]
    }

    fn last_usable_line(&self, slice: usize) -> usize {
        self.range(slice)[1]
    }
}
