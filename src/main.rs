#[tokio::main]
async fn main() {
    if let Err(e) = ekitsa_lib::run().await {
        eprintln!("ekitsa: {e}");
        std::process::exit(1);
    }
}
