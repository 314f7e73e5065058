use lightscan::{command_argument_builder, handle_scan};

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    let code = handle_scan(&matches).await;
    std::process::exit(code);
}
