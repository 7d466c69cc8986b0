mod admin;
mod cli;
mod infra;
mod routes;
mod server;

use bracket_pool::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
