//! Codes command - fetch and list the project's access codes

use descil_mturk::Descil;
use descil_mturk::output::{CodesResult, OutputMode};

/// Fetch codes into the registry and list them
pub async fn codes(descil: &Descil, mode: OutputMode) -> anyhow::Result<()> {
    let fetch = descil.get_codes().await?;

    CodesResult {
        source: descil.source().to_string(),
        fetch,
        codes: descil.records(),
    }
    .render(mode);

    Ok(())
}
