//! Post-codes command - post a batch of session results

use std::fs;
use std::path::Path;

use anyhow::Context;
use descil_mturk::output::{ExchangeResult, OutputMode};
use descil_mturk::{CodeResult, Descil, Operation};

/// Post every result listed in a JSON file
pub async fn post_codes(descil: &Descil, file: &Path, mode: OutputMode) -> anyhow::Result<()> {
    let content =
        fs::read_to_string(file).with_context(|| format!("could not read {}", file.display()))?;
    let batch: Vec<CodeResult> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of code results", file.display()))?;

    let response = descil.post_codes(&batch).await?;

    ExchangeResult {
        operation: Operation::PostCodes.to_string(),
        access_code: None,
        record: None,
        response,
    }
    .render(mode);

    Ok(())
}
