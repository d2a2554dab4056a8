//! On-disk skill scanning and activation.
//!
//! A skill is a directory containing a `SKILL.md` file: YAML frontmatter
//! (`name`, `description`) followed by the skill body. Activation returns
//! the body plus a directory tree of the skill's companion files so the
//! model can decide which of them to read.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors scanning or activating a skill.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SkillError {
    /// Filesystem access failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// `SKILL.md` did not start with a `---`-delimited frontmatter block.
    #[error("{0} is missing YAML frontmatter")]
    MissingFrontmatter(PathBuf),
    /// The frontmatter block did not parse as the expected shape.
    #[error("invalid frontmatter: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// No skill with this name exists under the skills root.
    #[error("no skill named {0:?}")]
    NotFound(String),
}

#[derive(Debug, Deserialize)]
struct Frontmatter {
    name: String,
    description: String,
}

/// A discovered skill's metadata, without its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillMeta {
    /// The skill's declared name (from frontmatter, not the directory name).
    pub name: String,
    /// One-line description shown in catalog listings.
    pub description: String,
    /// The skill's directory.
    pub path: PathBuf,
}

/// Split `SKILL.md` content into its frontmatter and body.
fn split_frontmatter(content: &str, source: &Path) -> Result<(Frontmatter, String), SkillError> {
    let rest = content.strip_prefix("---").ok_or_else(|| SkillError::MissingFrontmatter(source.to_path_buf()))?;
    let end = rest.find("\n---").ok_or_else(|| SkillError::MissingFrontmatter(source.to_path_buf()))?;
    let yaml = &rest[..end];
    let body = rest[end + 4..].trim_start_matches('\n').to_string();
    let frontmatter: Frontmatter = serde_yaml::from_str(yaml)?;
    Ok((frontmatter, body))
}

/// Scan every immediate subdirectory of `root` for a `SKILL.md`, returning
/// metadata for each one found. Subdirectories without a `SKILL.md` are
/// silently skipped.
pub async fn scan_skills(root: &Path) -> Result<Vec<SkillMeta>, SkillError> {
    let mut skills = Vec::new();
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(skills),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let manifest = path.join("SKILL.md");
        let content = match tokio::fs::read_to_string(&manifest).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        let (frontmatter, _) = split_frontmatter(&content, &manifest).inspect_err(|e| {
            tracing::warn!(path = %manifest.display(), error = %e, "skipping skill with unparsable frontmatter");
        })?;
        skills.push(SkillMeta { name: frontmatter.name, description: frontmatter.description, path });
    }
    skills.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(skills)
}

/// Resolve `name` case-insensitively against `root`'s skills, returning the
/// stripped body followed by a directory tree of the skill's files.
pub async fn activate_skill(root: &Path, name: &str) -> Result<String, SkillError> {
    let skills = scan_skills(root).await?;
    let skill = skills
        .into_iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| SkillError::NotFound(name.to_string()))?;
    let manifest = skill.path.join("SKILL.md");
    let content = tokio::fs::read_to_string(&manifest).await?;
    let (_, body) = split_frontmatter(&content, &manifest)?;
    let tree = render_tree(&skill.path)?;
    Ok(format!("{body}\n\n{tree}"))
}

const IGNORED: &[&str] = &[".git", "node_modules", ".DS_Store"];

fn is_ignored(file_name: &str) -> bool {
    file_name.starts_with('.') || IGNORED.contains(&file_name)
}

/// Render `root`'s contents as a Unicode box-drawing tree, directories
/// first, alphabetically within each group, skipping dotfiles and the
/// usual VCS/tooling clutter.
fn render_tree(root: &Path) -> Result<String, SkillError> {
    let mut out = String::new();
    walk(root, "", &mut out)?;
    Ok(out)
}

fn walk(dir: &Path, prefix: &str, out: &mut String) -> Result<(), SkillError> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter(|e| !is_ignored(&e.file_name().to_string_lossy()))
        .collect();
    entries.sort_by(|a, b| {
        let a_dir = a.path().is_dir();
        let b_dir = b.path().is_dir();
        b_dir.cmp(&a_dir).then_with(|| a.file_name().cmp(&b.file_name()))
    });
    let len = entries.len();
    for (i, entry) in entries.iter().enumerate() {
        let last = i + 1 == len;
        let connector = if last { "└── " } else { "├── " };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&entry.file_name().to_string_lossy());
        out.push('\n');
        if entry.path().is_dir() {
            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            walk(&entry.path(), &child_prefix, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn write_skill(root: &Path, dir: &str, name: &str, description: &str, body: &str) {
        let skill_dir = root.join(dir);
        tokio::fs::create_dir_all(&skill_dir).await.unwrap();
        let manifest = format!("---\nname: {name}\ndescription: {description}\n---\n{body}");
        tokio::fs::write(skill_dir.join("SKILL.md"), manifest).await.unwrap();
    }

    #[tokio::test]
    async fn scans_skills_sorted_by_name() {
        let dir = tempdir().unwrap();
        write_skill(dir.path(), "b-skill", "zeta", "does zeta things", "zeta body").await;
        write_skill(dir.path(), "a-skill", "alpha", "does alpha things", "alpha body").await;

        let skills = scan_skills(dir.path()).await.unwrap();
        let names: Vec<_> = skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn activation_is_case_insensitive_and_strips_frontmatter() {
        let dir = tempdir().unwrap();
        write_skill(dir.path(), "researcher", "Researcher", "finds things", "# Researcher\n\nDo research.").await;

        let activated = activate_skill(dir.path(), "researcher").await.unwrap();
        assert!(activated.contains("Do research."));
        assert!(!activated.contains("description:"));
    }

    #[tokio::test]
    async fn activation_tree_excludes_dotfiles_and_git() {
        let dir = tempdir().unwrap();
        write_skill(dir.path(), "researcher", "Researcher", "finds things", "body").await;
        let skill_dir = dir.path().join("researcher");
        tokio::fs::create_dir_all(skill_dir.join(".git")).await.unwrap();
        tokio::fs::write(skill_dir.join(".DS_Store"), "x").await.unwrap();
        tokio::fs::write(skill_dir.join("reference.md"), "ref").await.unwrap();

        let activated = activate_skill(dir.path(), "Researcher").await.unwrap();
        assert!(activated.contains("reference.md"));
        assert!(!activated.contains(".git"));
        assert!(!activated.contains(".DS_Store"));
    }

    #[tokio::test]
    async fn unknown_skill_name_errors() {
        let dir = tempdir().unwrap();
        let err = activate_skill(dir.path(), "missing").await.unwrap_err();
        assert!(matches!(err, SkillError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_skills_directory_scans_to_empty() {
        let dir = tempdir().unwrap();
        let skills = scan_skills(&dir.path().join("nonexistent")).await.unwrap();
        assert!(skills.is_empty());
    }
}
