#[tokio::main(flavor = "current_thread")]
async fn main() {
    sortcam::run_cli().await;
}
