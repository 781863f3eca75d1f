#[tokio::main]
async fn main() {
    let code = ferry_cli::run().await;
    std::process::exit(code);
}
