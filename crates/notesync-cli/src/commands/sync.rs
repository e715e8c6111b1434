use crate::commands::common::Session;
use crate::error::CliError;

pub async fn run_sync(session: &Session) -> Result<(), CliError> {
    if !session.server_sync {
        return Err(CliError::SyncNotConfigured);
    }

    let report = session.finish().await?;
    if report.errors > 0 {
        println!(
            "Sync finished with {} error(s); pending changes will be retried",
            report.errors
        );
    } else {
        println!(
            "Sync completed ({} updated, {} removed)",
            report.updated.len(),
            report.removed.len()
        );
    }
    Ok(())
}
