//! init command - Write a persistgql.toml for this project

use crate::cli::Context;
use crate::core::config::{Config, ManifestConfig};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Write the project config file.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `module_name` - Path at which the manifest module is resolvable
/// * `filename` - Asset name the manifest is emitted under
/// * `add_typename` - Enable typename injection
/// * `force` - Overwrite an existing config file
pub fn init(
    ctx: &Context,
    module_name: &str,
    filename: Option<&str>,
    add_typename: bool,
    force: bool,
) -> Result<()> {
    let project_dir = ctx.project_dir()?;
    let verbosity = ctx.verbosity();
    let config_path = Config::config_path(&project_dir);

    if config_path.exists() && !force {
        output::print(
            format!("{} already exists.", config_path.display()),
            verbosity,
        );
        output::print("Use --force to overwrite it.", verbosity);
        return Ok(());
    }

    let config = ManifestConfig {
        module_name: Some(module_name.to_string()),
        filename: filename.map(str::to_string),
        add_typename: add_typename.then_some(true),
    };

    let path = Config::write(&project_dir, &config).context("Failed to write config")?;
    output::success(format!("Wrote {}", path.display()), verbosity);
    Ok(())
}
