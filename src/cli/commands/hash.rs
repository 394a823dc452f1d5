//! hash command - Print the content hash of a query

use crate::cli::Context;
use crate::core::types::QueryHash;
use anyhow::{bail, Context as _, Result};
use std::path::Path;

/// Print the hash of `text`, or of the contents of `file`.
///
/// The text is hashed exactly as given; it is not normalized.
pub fn hash(ctx: &Context, text: Option<&str>, file: Option<&Path>) -> Result<()> {
    let contents = match (text, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(file)) => {
            let path = ctx.project_dir()?.join(file);
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?
        }
        (None, None) => bail!("Provide query text or --file"),
    };

    println!("{}", QueryHash::compute(&contents));
    Ok(())
}
