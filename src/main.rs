#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sacco_ledger::cli::run_with_sys_args().await
}
