
use std::{error::Error, io::Write, time::Duration};
use futures::StreamExt;
use ollama_client::{
    init_default_tracing, ChatRequest, ClientBuilder, ClientConfig, ClientError, Message,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_default_tracing();

    let ollama = ClientConfig::default().host("127.0.0.1").build()?;

    let request = ChatRequest::new(
        "qwen3:0.6b",
        vec![
            Message::system("You are a helpful assistant."),
            Message::user("Tell me a very long story about a lighthouse."),
        ],
    );
    let mut stream = ollama.chat_stream(request).await?;

    // cancel from elsewhere after a couple of seconds
    let aborter = ollama.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        aborter.abort();
    });

    while let Some(part) = stream.next().await {
        match part {
            Ok(part) => {
                if let Some(message) = part.message {
                    print!("{}", message.content);
                    std::io::stdout().flush()?;
                }
            }
            Err(ClientError::Aborted) => {
                println!("\n\n-> aborted after {:?}", stream.state());
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
