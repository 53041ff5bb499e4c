
use std::error::Error;
use ollama_client::{init_default_tracing, ClientConfig, GenerateRequest, Ollama};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_default_tracing();

    // OLLAMA_HOST / OLLAMA_API_KEY, falling back to the local server
    let ollama = Ollama::try_from(ClientConfig::from_env())?;
    println!("-> Server {} (version {})", ollama.host(), ollama.version().await?.version);

    let prompt = "Why is the sky blue? Answer in one sentence.";
    let resp = ollama.generate(GenerateRequest::new("qwen3:0.6b", prompt)).await?;
    println!("\n-> Model: {}", resp.response);

    for model in ollama.list().await?.models {
        println!("   {} ({} bytes)", model.name, model.size);
    }

    Ok(())
}
