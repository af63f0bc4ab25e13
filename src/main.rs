#[tokio::main]
async fn main() {
    minimap_scout::init_tracing();

    if let Err(e) = minimap_scout::run(std::env::args()).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
