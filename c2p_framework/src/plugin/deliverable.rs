//! Filesystem helpers for writing plugin deliverables

use super::errors::PluginError;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ensure `path` is a directory, creating it when missing
pub fn prepare_deliverable_dir(path: &Path) -> Result<(), PluginError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PluginError::NotADirectory {
                path: path.display().to_string(),
            });
        }
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| PluginError::filesystem(path, e))
}

/// Recursively copy `src` into `dst`, returning the copied file paths under `dst`
///
/// Existing files in `dst` are overwritten.
pub fn copy_template_dir(src: &Path, dst: &Path) -> Result<Vec<PathBuf>, PluginError> {
    if !src.is_dir() {
        return Err(PluginError::TemplateNotFound {
            path: src.display().to_string(),
        });
    }

    let mut copied = Vec::new();
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
            PluginError::filesystem(&path, std::io::Error::other(e.to_string()))
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| PluginError::invalid_template(entry.path(), e))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| PluginError::filesystem(&target, e))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| PluginError::filesystem(&target, e))?;
            copied.push(target);
        }
    }
    Ok(copied)
}

/// Split a multi-document YAML stream on `---` separator lines
///
/// Documents holding only blank lines or comments are dropped.
pub fn split_yaml_documents(content: &str) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if line.trim_end() == "---" || line.starts_with("--- ") {
            documents.push(std::mem::take(&mut current));
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    documents.push(current);

    documents
        .into_iter()
        .filter(|doc| {
            doc.lines()
                .map(str::trim)
                .any(|l| !l.is_empty() && !l.starts_with('#'))
        })
        .collect()
}

/// Parse every document of a YAML stream, failing on the first bad one
///
/// Empty documents are dropped.
pub fn parse_yaml_documents(content: &str) -> Result<Vec<Value>, String> {
    let documents = serde_saphyr::from_multiple::<Value>(content).map_err(|e| e.to_string())?;
    Ok(documents.into_iter().filter(|doc| !doc.is_null()).collect())
}

/// Unquoted value of a top-level `key:` line, for documents that do not parse
pub fn top_level_scalar(document: &str, key: &str) -> Option<String> {
    document.lines().find_map(|line| {
        let rest = line.strip_prefix(key)?.strip_prefix(':')?;
        let value = rest.split(" #").next().unwrap_or_default().trim();
        let value = value.trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

pub fn read_text(path: &Path) -> Result<String, PluginError> {
    std::fs::read_to_string(path).map_err(|e| PluginError::filesystem(path, e))
}

pub fn write_text(path: &Path, content: &str) -> Result<(), PluginError> {
    std::fs::write(path, content).map_err(|e| PluginError::filesystem(path, e))
}

/// Serialize `value` as YAML and write it to `path`
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), PluginError> {
    let yaml = serde_saphyr::to_string(value).map_err(|e| {
        PluginError::Core(crate::error::C2PError::serialize(&path.display().to_string(), e))
    })?;
    write_text(path, &yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_prepare_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out/nested");
        prepare_deliverable_dir(&target).unwrap();
        assert!(target.is_dir());
        prepare_deliverable_dir(&target).unwrap();
    }

    #[test]
    fn test_prepare_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert_matches!(prepare_deliverable_dir(&file), Err(PluginError::NotADirectory { .. }));
    }

    #[test]
    fn test_copy_template_dir() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("templates/rule-a");
        std::fs::create_dir_all(src.join("sub")).unwrap();
        std::fs::write(src.join("a.yaml"), "a: 1\n").unwrap();
        std::fs::write(src.join("sub/b.yaml"), "b: 2\n").unwrap();

        let dst = dir.path().join("out/rule-a");
        let copied = copy_template_dir(&src, &dst).unwrap();

        assert_eq!(copied.len(), 2);
        assert_eq!(std::fs::read_to_string(dst.join("sub/b.yaml")).unwrap(), "b: 2\n");
    }

    #[test]
    fn test_copy_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let result = copy_template_dir(&dir.path().join("nope"), &dir.path().join("out"));
        assert_matches!(result, Err(PluginError::TemplateNotFound { .. }));
    }

    #[test]
    fn test_split_yaml_documents() {
        let content = "---\na: 1\n---\n# only a comment\n---\nb: 2\n";
        let docs = split_yaml_documents(content);
        assert_eq!(docs, vec!["a: 1\n".to_string(), "b: 2\n".to_string()]);

        let parsed = parse_yaml_documents(content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["b"], 2);
        assert!(parse_yaml_documents("owner: {{ request.userInfo.username }}\n").is_err());
    }

    #[test]
    fn test_top_level_scalar() {
        let doc = "apiVersion: \"kyverno.io/v1\"\nkind: ClusterPolicy # cluster wide\nspec:\n  kind: Nested\n";
        assert_eq!(top_level_scalar(doc, "apiVersion").as_deref(), Some("kyverno.io/v1"));
        assert_eq!(top_level_scalar(doc, "kind").as_deref(), Some("ClusterPolicy"));
        assert_eq!(top_level_scalar(doc, "metadata"), None);
        assert_eq!(top_level_scalar("kindness: 1\n", "kind"), None);
    }
}
