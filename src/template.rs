//! File-backed template store.
//!
//! Templates live at `<root>/<category>/<template_id>.sql`, where the category is the
//! part of the identifier before the first `_`. A store never caches: every
//! [`TemplateStore::resolve`] reads the file again.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::TemplateError;

/// A validated `<category>_<name>` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateId<'a> {
    id: &'a str,
    category: &'a str,
}

impl<'a> TemplateId<'a> {
    /// Split an identifier on its first `_`.
    ///
    /// # Errors
    /// Returns `TemplateError::InvalidTemplate` if there is no `_`, either side of it is
    /// empty, or the identifier would step outside its category directory.
    pub fn parse(id: &'a str) -> Result<Self, TemplateError> {
        let Some((category, name)) = id.split_once('_') else {
            return Err(TemplateError::InvalidTemplate(format!(
                "'{id}' has no category prefix"
            )));
        };
        if category.is_empty() || name.is_empty() {
            return Err(TemplateError::InvalidTemplate(format!(
                "'{id}' must look like <category>_<name>"
            )));
        }
        if id.contains(['/', '\\']) || category == "." || category == ".." {
            return Err(TemplateError::InvalidTemplate(format!(
                "'{id}' contains a path component"
            )));
        }
        Ok(Self { id, category })
    }

    #[must_use]
    pub fn as_str(&self) -> &'a str {
        self.id
    }

    #[must_use]
    pub fn category(&self) -> &'a str {
        self.category
    }

    /// The part after the first `_`.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.id[self.category.len() + 1..]
    }
}

/// Resolves template identifiers against a directory tree.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a template identifier maps to. The file is not required to exist.
    #[must_use]
    pub fn path_for(&self, id: &TemplateId<'_>) -> PathBuf {
        self.root
            .join(id.category())
            .join(format!("{}.sql", id.as_str()))
    }

    /// Load the SQL body for `template_id`, unmodified.
    ///
    /// # Errors
    /// Returns `TemplateError::InvalidTemplate` if the identifier is malformed, the
    /// category directory or SQL file is missing, or the file is not readable text.
    pub fn resolve(&self, template_id: &str) -> Result<String, TemplateError> {
        let id = TemplateId::parse(template_id)?;

        let category_dir = self.root.join(id.category());
        if !category_dir.is_dir() {
            return Err(TemplateError::InvalidTemplate(format!(
                "category '{}' not found",
                id.category()
            )));
        }

        let path = self.path_for(&id);
        if !path.is_file() {
            return Err(TemplateError::InvalidTemplate(format!(
                "'{template_id}' not found in category '{}'",
                id.category()
            )));
        }

        debug!(template = template_id, path = %path.display(), "resolving template");
        fs::read_to_string(&path).map_err(|e| {
            TemplateError::InvalidTemplate(format!("'{template_id}' could not be read: {e}"))
        })
    }

    /// Every template identifier currently present in the store, sorted.
    ///
    /// # Errors
    /// Returns `TemplateError::InvalidTemplate` if the root directory cannot be listed.
    pub fn list(&self) -> Result<Vec<String>, TemplateError> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            TemplateError::InvalidTemplate(format!(
                "template root {} could not be listed: {e}",
                self.root.display()
            ))
        })?;

        let mut ids = Vec::new();
        for entry in entries.flatten() {
            let category_dir = entry.path();
            if !category_dir.is_dir() {
                continue;
            }
            let Some(category) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            // Ids split on the first `_`, so such a directory can never be reached.
            if category.contains('_') {
                continue;
            }
            let Ok(files) = fs::read_dir(&category_dir) else {
                continue;
            };
            let prefix = format!("{category}_");
            for file in files.flatten() {
                let path = file.path();
                if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("sql") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if stem.len() > prefix.len() && stem.starts_with(&prefix) {
                        ids.push(stem.to_string());
                    }
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn store_with(files: &[(&str, &str)]) -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        for (rel, body) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let store = TemplateStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn parses_on_first_underscore() {
        let id = TemplateId::parse("users_get_by_id").unwrap();
        assert_eq!(id.category(), "users");
        assert_eq!(id.name(), "get_by_id");
    }

    #[test]
    fn rejects_malformed_ids() {
        for bad in ["nofolder", "_name", "users_", "users_../x", "a\\b_c", ".._x"] {
            let err = TemplateId::parse(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTemplate, "{bad}");
        }
    }

    #[test]
    fn resolves_file_contents_verbatim() {
        let body = "SELECT *\nFROM users -- @not_a_param? still verbatim\n";
        let (_dir, store) = store_with(&[("users/users_getAll.sql", body)]);
        assert_eq!(store.resolve("users_getAll").unwrap(), body);
    }

    #[test]
    fn missing_category_is_invalid() {
        let (_dir, store) = store_with(&[("orders/orders_all.sql", "SELECT 1")]);
        let err = store.resolve("users_getAll").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTemplate);
    }

    #[test]
    fn missing_file_is_invalid() {
        let (_dir, store) = store_with(&[("users/users_other.sql", "SELECT 1")]);
        let err = store.resolve("users_getAll").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTemplate);
    }

    #[test]
    fn category_directory_that_is_a_file_is_invalid() {
        let (_dir, store) = store_with(&[("users", "not a dir")]);
        let err = store.resolve("users_getAll").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTemplate);
    }

    #[test]
    fn rereads_on_every_resolve() {
        let (dir, store) = store_with(&[("t/t_q.sql", "SELECT 1")]);
        assert_eq!(store.resolve("t_q").unwrap(), "SELECT 1");
        fs::write(dir.path().join("t/t_q.sql"), "SELECT 2").unwrap();
        assert_eq!(store.resolve("t_q").unwrap(), "SELECT 2");
    }

    #[test]
    fn lists_reachable_templates() {
        let (_dir, store) = store_with(&[
            ("users/users_getAll.sql", ""),
            ("users/users_byId.sql", ""),
            ("users/readme.txt", ""),
            ("users/orders_misfiled.sql", ""),
            ("orders/orders_open.sql", ""),
            ("bad_dir/bad_dir_x.sql", ""),
        ]);
        assert_eq!(
            store.list().unwrap(),
            ["orders_open", "users_byId", "users_getAll"]
        );
    }
}
