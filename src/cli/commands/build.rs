//! build command - Generate a manifest from GraphQL files on disk

use crate::build::{BuildPass, Contribution, SourceModule};
use crate::cli::Context;
use crate::core::config::Config;
use crate::plugin::{Mode, PersistPlugin, SealOutcome};
use crate::ui::output;
use anyhow::{bail, Context as _, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const GRAPHQL_EXTENSIONS: [&str; 2] = ["graphql", "gql"];

/// Build a manifest from the GraphQL files under `paths`.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `paths` - Files or directories, relative to the project directory
/// * `module_name` - Overrides `module_name` from the config file
/// * `add_typename` - Enables typename injection regardless of config
/// * `output` - Overrides the configured `filename` as the output file
/// * `check` - Compare with the output file instead of writing it
pub fn build(
    ctx: &Context,
    paths: &[PathBuf],
    module_name: Option<&str>,
    add_typename: bool,
    output: Option<&Path>,
    check: bool,
) -> Result<()> {
    let project_dir = ctx.project_dir()?;
    let verbosity = ctx.verbosity();

    let explicit = ctx.config.as_ref().map(|path| project_dir.join(path));
    let loaded =
        Config::load(&project_dir, explicit.as_deref()).context("Failed to load config")?;
    for warning in &loaded.warnings {
        output::warn(&warning.message, verbosity);
    }

    let mut settings = loaded.config.manifest;
    if let Some(name) = module_name {
        settings.module_name = Some(name.to_string());
    }
    if add_typename {
        settings.add_typename = Some(true);
    }

    let plugin = PersistPlugin::new(&settings, Mode::Standalone)?;

    let files = collect_graphql_files(&project_dir, paths)?;
    output::debug(format!("collected {} GraphQL files", files.len()), verbosity);

    let mut pass = BuildPass::new(&project_dir);
    plugin.on_compilation(&pass);
    for file in files {
        let source = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        pass.add_module(SourceModule::new(file).with_contribution(Contribution::Document(source)));
    }

    let published = match plugin.on_seal(&mut pass)? {
        SealOutcome::Published(published) | SealOutcome::Unchanged(published) => published,
        SealOutcome::Skipped => bail!("No manifest was generated"),
    };
    let contents = format!("{}\n", published.json());
    let operations = published.manifest().len();

    let target = output
        .map(|path| project_dir.join(path))
        .or_else(|| settings.filename.as_ref().map(|name| project_dir.join(name)));

    if check {
        let Some(target) = target else {
            bail!("--check needs --output or a configured filename");
        };
        let existing = fs::read_to_string(&target).ok();
        if existing.as_deref() != Some(contents.as_str()) {
            bail!(
                "{} is out of date; run 'persistgql build' to regenerate it",
                target.display()
            );
        }
        output::success(
            format!("{} is up to date ({} operations)", target.display(), operations),
            verbosity,
        );
        return Ok(());
    }

    match target {
        Some(target) => {
            write_atomic(&target, &contents)?;
            output::success(
                format!("Wrote {} operations to {}", operations, target.display()),
                verbosity,
            );
        }
        None => print!("{contents}"),
    }

    Ok(())
}

/// Collect `.graphql` and `.gql` files under `paths`.
///
/// Directories are walked recursively, skipping hidden entries. The result
/// is sorted and free of duplicates.
pub fn collect_graphql_files(project_dir: &Path, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let path = project_dir.join(path);
        if path.is_dir() {
            walk(&path, &mut files)?;
        } else if path.is_file() {
            files.push(path);
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            walk(&path, files)?;
        } else if is_graphql_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_graphql_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| GRAPHQL_EXTENSIONS.contains(&ext))
}

/// Write a file atomically (write to temp file, then rename).
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("Failed to create {}", temp_path.display()))?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "query a { x }").unwrap();
    }

    #[test]
    fn collects_sorted_graphql_files() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/b.graphql");
        touch(temp.path(), "src/a.gql");
        touch(temp.path(), "src/nested/c.graphql");
        touch(temp.path(), "src/readme.md");

        let files = collect_graphql_files(temp.path(), &[PathBuf::from("src")]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(temp.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from("src/a.gql"),
                PathBuf::from("src/b.graphql"),
                PathBuf::from("src/nested/c.graphql"),
            ]
        );
    }

    #[test]
    fn skips_hidden_entries() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), ".cache/a.graphql");
        touch(temp.path(), "b.graphql");

        let files = collect_graphql_files(temp.path(), &[PathBuf::from(".")]).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("b.graphql"));
    }

    #[test]
    fn explicit_file_kept_regardless_of_extension() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "queries.txt");

        let files = collect_graphql_files(temp.path(), &[PathBuf::from("queries.txt")]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn overlapping_paths_deduplicated() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/a.graphql");

        let files = collect_graphql_files(
            temp.path(),
            &[PathBuf::from("src"), PathBuf::from("src/a.graphql")],
        )
        .unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn missing_path_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(collect_graphql_files(temp.path(), &[PathBuf::from("nope")]).is_err());
    }
}
