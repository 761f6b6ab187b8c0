use crate::error::{Error, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions of class descriptor files
const DESCRIPTOR_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Class path scanner.
///
/// Each class path entry is either a descriptor file or a directory that is
/// searched recursively for descriptor files (`.yaml`, `.yml`, `.json`). The
/// `target` directory and hidden directories are skipped.
///
/// # Example
///
/// ```no_run
/// use openapi_from_classes::scanner::ClasspathScanner;
/// use std::path::PathBuf;
///
/// let scanner = ClasspathScanner::new(vec![PathBuf::from("./classes")]);
/// let result = scanner.scan().unwrap();
/// println!("Found {} descriptor files", result.descriptor_files.len());
/// ```
pub struct ClasspathScanner {
    entries: Vec<PathBuf>,
}

/// Result of a class path scan.
pub struct ScanResult {
    /// Descriptor files in class path order; files of one directory are sorted
    /// by name
    pub descriptor_files: Vec<PathBuf>,
    /// Warning messages for paths that could not be accessed
    pub warnings: Vec<String>,
}

fn is_descriptor_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|extension| DESCRIPTOR_EXTENSIONS.contains(&extension))
}

impl ClasspathScanner {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    /// Collects the descriptor files of all class path entries.
    ///
    /// Entries that exist but cannot be fully read produce warnings; scanning
    /// continues with the rest.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the entry if a class path entry does
    /// not exist.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut descriptor_files = Vec::new();
        let mut warnings = Vec::new();

        for root in &self.entries {
            if !root.exists() {
                return Err(Error::config(
                    root.display().to_string(),
                    "class path entry does not exist",
                ));
            }
            if root.is_file() {
                descriptor_files.push(root.clone());
                continue;
            }

            for entry in WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    if e.path() == root.as_path() {
                        return true;
                    }
                    let file_name = e.file_name().to_string_lossy();
                    !file_name.starts_with('.') && file_name != "target"
                })
            {
                match entry {
                    Ok(entry) => {
                        let path = entry.path();
                        if path.is_file() && is_descriptor_file(path) {
                            descriptor_files.push(path.to_path_buf());
                        }
                    }
                    Err(e) => {
                        let warning = format!("Failed to access path: {}", e);
                        warn!("{}", warning);
                        warnings.push(warning);
                    }
                }
            }
        }

        debug!("Found {} descriptor files", descriptor_files.len());
        Ok(ScanResult {
            descriptor_files,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn file_names(result: &ScanResult) -> Vec<String> {
        result
            .descriptor_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("Greeter.yaml"), "name: com.example.Greeter").unwrap();
        fs::write(root.join("Item.json"), "{\"name\": \"com.example.Item\"}").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let result = ClasspathScanner::new(vec![root.to_path_buf()]).scan().unwrap();

        assert_eq!(file_names(&result), vec!["Greeter.yaml", "Item.json"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_nested_directories_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("com/example/model")).unwrap();
        fs::write(root.join("com/example/model/Person.yml"), "name: com.example.model.Person")
            .unwrap();
        fs::write(root.join("com/example/Api.yaml"), "name: com.example.Api").unwrap();

        let result = ClasspathScanner::new(vec![root.to_path_buf()]).scan().unwrap();

        assert_eq!(file_names(&result), vec!["Api.yaml", "Person.yml"]);
    }

    #[test]
    fn test_scan_skips_target_and_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("target")).unwrap();
        fs::create_dir(root.join(".cache")).unwrap();
        fs::write(root.join("target/Stale.yaml"), "name: com.example.Stale").unwrap();
        fs::write(root.join(".cache/Hidden.yaml"), "name: com.example.Hidden").unwrap();
        fs::write(root.join("Live.yaml"), "name: com.example.Live").unwrap();

        let result = ClasspathScanner::new(vec![root.to_path_buf()]).scan().unwrap();

        assert_eq!(file_names(&result), vec!["Live.yaml"]);
    }

    #[test]
    fn test_single_file_entry() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("classes.json");
        fs::write(&file, "{\"classes\": []}").unwrap();

        let result = ClasspathScanner::new(vec![file.clone()]).scan().unwrap();

        assert_eq!(result.descriptor_files, vec![file]);
    }

    #[test]
    fn test_missing_entry_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let result = ClasspathScanner::new(vec![missing]).scan();

        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
