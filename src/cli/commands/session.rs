//! Session commands - check-in, check-out and drop-out
//!
//! Codes are fetched first so the record exists locally before its state changes.

use descil_mturk::output::{ExchangeResult, OutputMode};
use descil_mturk::{Descil, Operation, ServiceResponse};

fn render(
    descil: &Descil,
    operation: Operation,
    access_code: &str,
    response: ServiceResponse,
    mode: OutputMode,
) {
    ExchangeResult {
        operation: operation.to_string(),
        access_code: Some(access_code.to_string()),
        record: descil.code_exists(access_code),
        response,
    }
    .render(mode);
}

/// Check a worker in
pub async fn check_in(descil: &Descil, access_code: &str, mode: OutputMode) -> anyhow::Result<()> {
    descil.get_codes().await?;
    let response = descil.check_in(access_code).await?;
    render(descil, Operation::CheckIn, access_code, response, mode);
    Ok(())
}

/// Check a worker out
pub async fn check_out(
    descil: &Descil,
    access_code: &str,
    exit_code: &str,
    bonus: f64,
    mode: OutputMode,
) -> anyhow::Result<()> {
    descil.get_codes().await?;
    let response = descil.check_out(access_code, exit_code, bonus).await?;
    render(descil, Operation::CheckOut, access_code, response, mode);
    Ok(())
}

/// Mark a worker as dropped out
pub async fn drop_out(
    descil: &Descil,
    access_code: &str,
    exit_code: &str,
    bonus: f64,
    mode: OutputMode,
) -> anyhow::Result<()> {
    descil.get_codes().await?;
    let response = descil.drop_out(access_code, exit_code, bonus).await?;
    render(descil, Operation::DropOut, access_code, response, mode);
    Ok(())
}
