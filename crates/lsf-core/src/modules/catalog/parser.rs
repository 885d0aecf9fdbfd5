use super::{LineCatalogTable, LineSelectionTable};
use crate::domain::{LsfError, LsfResult};
use crate::modules::traits::LineCatalog;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const LINE_CATALOG_FILE: &str = "line_catalog.json";
pub const LINE_SELECTION_FILE: &str = "line_selection.json";

#[derive(Debug, Deserialize)]
struct CatalogFile {
    configs: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct SelectionFile {
    configs: BTreeMap<String, SelectionEntry>,
}

#[derive(Debug, Deserialize)]
struct SelectionEntry {
    default: [usize; 2],
    #[serde(default)]
    slices: BTreeMap<String, [usize; 2]>,
}

/// Load the line catalog for one spectral configuration from `dir`.
pub fn load_line_catalog(dir: &Path, config: &str) -> LsfResult<LineCatalogTable> {
    let path = dir.join(LINE_CATALOG_FILE);
    let source = fs::read_to_string(&path).map_err(|source| {
        LsfError::io_system(
            "IO.LINE_CATALOG_READ",
            format!("failed to read line catalog '{}': {}", path.display(), source),
        )
    })?;
    let file: CatalogFile = serde_json::from_str(&source).map_err(|source| {
        LsfError::input_validation(
            "INPUT.LINE_CATALOG_FORMAT",
            format!("line catalog '{}' is malformed: {}", path.display(), source),
        )
    })?;
    let wavelengths = file.configs.get(config).cloned().ok_or_else(|| {
        LsfError::input_validation(
            "INPUT.LINE_CATALOG_CONFIG",
            format!(
                "line catalog '{}' has no entry for configuration '{}'",
                path.display(),
                config
            ),
        )
    })?;
    if wavelengths.is_empty() {
        return Err(LsfError::input_validation(
            "INPUT.LINE_CATALOG_EMPTY",
            format!("line catalog for configuration '{config}' is empty"),
        ));
    }
    Ok(LineCatalogTable::new(wavelengths))
}

/// Load the usable-line selection policy for one spectral configuration.
///
/// An absent selection file is not an error: the whole catalog range is
/// usable by default.
pub fn load_line_selection(
    dir: &Path,
    config: &str,
    catalog: &LineCatalogTable,
) -> LsfResult<LineSelectionTable> {
    let path = dir.join(LINE_SELECTION_FILE);
    let full_range = [0, catalog.line_count().saturating_sub(1)];
    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(LineSelectionTable::new(full_range, BTreeMap::new()));
        }
        Err(error) => {
            return Err(LsfError::io_system(
                "IO.LINE_SELECTION_READ",
                format!(
                    "failed to read line selection '{}': {}",
                    path.display(),
                    error
                ),
            ));
        }
    };
    let file: SelectionFile = serde_json::from_str(&source).map_err(|source| {
        LsfError::input_validation(
            "INPUT.LINE_SELECTION_FORMAT",
            format!(
                "line selection '{}' is malformed: {}",
                path.display(),
                source
            ),
        )
    })?;
    let Some(entry) = file.configs.get(config) else {
        return Ok(LineSelectionTable::new(full_range, BTreeMap::new()));
    };
    let per_slice = entry
        .slices
        .iter()
        .map(|(slice, range)| {
            slice.parse::<usize>().map(|index| (index, *range)).map_err(|_| {
                LsfError::input_validation(
                    "INPUT.LINE_SELECTION_SLICE",
                    format!("line selection slice key '{slice}' is not an index"),
                )
            })
        })
        .collect::<LsfResult<BTreeMap<usize, [usize; 2]>>>()?;
    Ok(LineSelectionTable::new(entry.default, per_slice))
}

#[cfg(test)]
mod tests {
    use super::{load_line_catalog, load_line_selection};
    use crate::modules::traits::{LineCatalog, LineSelection};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn catalog_rows_are_indexed_by_line_number() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(
            temp.path().join("line_catalog.json"),
            r#"{"configs": {"H": [1.61, 1.62, 1.63]}}"#,
        )
        .unwrap();

        let catalog = load_line_catalog(temp.path(), "H").unwrap();
        assert_eq!(catalog.line_count(), 3);
        assert!((catalog.reference_wavelength(1).unwrap() - 1.62).abs() < 1e-12);
        assert!(catalog.reference_wavelength(3).is_err());
    }

    #[test]
    fn absent_selection_file_defaults_to_full_range() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(
            temp.path().join("line_catalog.json"),
            r#"{"configs": {"H": [1.61, 1.62, 1.63]}}"#,
        )
        .unwrap();

        let catalog = load_line_catalog(temp.path(), "H").unwrap();
        let selection = load_line_selection(temp.path(), "H", &catalog).unwrap();
        assert_eq!(selection.first_usable_line(5), 0);
        assert_eq!(selection.last_usable_line(5), 2);
    }

    #[test]
    fn per_slice_ranges_override_the_default() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(
            temp.path().join("line_catalog.json"),
            r#"{"configs": {"H": [1.6, 1.61, 1.62, 1.63, 1.64]}}"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("line_selection.json"),
            r#"{"configs": {"H": {"default": [1, 3], "slices": {"2": [0, 4]}}}}"#,
        )
        .unwrap();

        let catalog = load_line_catalog(temp.path(), "H").unwrap();
        let selection = load_line_selection(temp.path(), "H", &catalog).unwrap();
        assert_eq!(selection.first_usable_line(0), 1);
        assert_eq!(selection.last_usable_line(0), 3);
        assert_eq!(selection.first_usable_line(2), 0);
        assert_eq!(selection.last_usable_line(2), 4);
    }
}
