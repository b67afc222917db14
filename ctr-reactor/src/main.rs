use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ctr_reactor::cli::execute_from_args(std::env::args_os())
        .await
        .context("ctr-reactor failed")
}
