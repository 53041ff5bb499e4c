
use std::error::Error;
use futures::StreamExt;
use ollama_client::{init_default_tracing, CreateRequest, Ollama};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_default_tracing();

    let ollama = Ollama::new()?;

    // FROM lines naming a local file are uploaded as blobs first
    let path = std::env::args().nth(1).unwrap_or_else(|| "Modelfile".into());
    let mut progress = ollama.create_stream(CreateRequest::from_path("my-model", path)).await?;

    while let Some(update) = progress.next().await {
        let update = update?;
        match (update.completed, update.total) {
            (Some(done), Some(total)) => println!("-> {} {done}/{total}", update.status),
            _ => println!("-> {}", update.status),
        }
    }

    Ok(())
}
