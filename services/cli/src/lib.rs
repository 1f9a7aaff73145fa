mod cli;
mod commands;

use tca_analysis::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
