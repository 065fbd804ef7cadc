use clap::Parser;
use focuslock::{cli::Args, error::FocusLockError};

#[tokio::main]
async fn main() -> Result<(), FocusLockError> {
    env_logger::init();

    let args = Args::parse();

    focuslock::cli::run(args).await
}
