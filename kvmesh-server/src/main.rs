use clap::Parser;
use kvmesh_http::serve;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kvmesh", about = "Replicated in-memory key-value cache node")]
struct Cli {
    /// Directory holding node.json
    #[arg(long, env = "KVMESH_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,
    /// Listen address; overrides bind_addr from node.json
    #[arg(long, env = "KVMESH_BIND_ADDR")]
    bind_addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    serve(&cli.data_dir, cli.bind_addr).await
}
