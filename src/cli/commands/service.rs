//! Service commands that touch no access code

use descil_mturk::output::{ExchangeResult, OutputMode};
use descil_mturk::{Descil, Operation};

/// Send a `HelloWorld`
pub async fn ping(descil: &Descil, mode: OutputMode) -> anyhow::Result<()> {
    let response = descil.hello_world().await?;
    ExchangeResult {
        operation: Operation::HelloWorld.to_string(),
        access_code: None,
        record: None,
        response,
    }
    .render(mode);
    Ok(())
}

/// Fetch payoff records
pub async fn payoffs(descil: &Descil, mode: OutputMode) -> anyhow::Result<()> {
    let response = descil.get_payoffs().await?;
    ExchangeResult {
        operation: Operation::GetPayoffs.to_string(),
        access_code: None,
        record: None,
        response,
    }
    .render(mode);
    Ok(())
}
