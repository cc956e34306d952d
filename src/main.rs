use container_registry_manager::cli::{Args, Runner};
use container_registry_manager::dispatcher::OperationStatus;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();
    let runner = Runner::new(args);

    match runner.run().await {
        Ok(OperationStatus::Success) => {}
        Ok(OperationStatus::Failure) => std::process::exit(1),
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    }
}
