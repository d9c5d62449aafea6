//! Live connection server for real-time chat.
//!
//! Accepts authenticated WebSocket connections, tracks presence, and fans out
//! chat events to the online members of each chat.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin yoriai-server
//! cargo run --bin yoriai-server -- --host 0.0.0.0 --port 3000 --seed chats.json
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use yoriai_server::{
    domain::PushNotifier,
    hub::{
        ClientConfig, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_QUEUE_CAPACITY, Hub, Repositories,
    },
    infrastructure::{
        notifier::{LoggingPushNotifier, WebhookPushNotifier},
        repository::{
            InMemoryChatRepository, InMemoryMessageRepository, InMemoryPinRepository,
            InMemoryReactionRepository,
        },
    },
    ui::{DEFAULT_IDENTITY_HEADER, Server, ServerConfig, TrustedHeaderAuthenticator},
};
use yoriai_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "yoriai-server")]
#[command(about = "Live connection hub for real-time chat", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "YORIAI_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "YORIAI_PORT", default_value = "8080")]
    port: u16,

    /// Maximum number of concurrently open connections
    #[arg(long, env = "YORIAI_MAX_CONNECTIONS", default_value = "10000")]
    max_connections: usize,

    /// Request header carrying the authenticated user id
    #[arg(long, env = "YORIAI_IDENTITY_HEADER", default_value = DEFAULT_IDENTITY_HEADER)]
    identity_header: String,

    /// Seconds without inbound traffic before a connection is closed
    #[arg(long, env = "YORIAI_IDLE_TIMEOUT_SECS", default_value = "60",
          value_parser = clap::value_parser!(u64).range(1..=86_400))]
    idle_timeout_secs: u64,

    /// Seconds allowed for writing one frame
    #[arg(long, env = "YORIAI_WRITE_TIMEOUT_SECS", default_value = "10",
          value_parser = clap::value_parser!(u64).range(1..=3_600))]
    write_timeout_secs: u64,

    /// Maximum inbound frame size in bytes
    #[arg(long, env = "YORIAI_MAX_MESSAGE_SIZE", default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    max_message_size: usize,

    /// Outbound queue capacity per connection
    #[arg(long, env = "YORIAI_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// JSON file with chats and members to load into the in-memory store
    #[arg(long, env = "YORIAI_SEED")]
    seed: Option<PathBuf>,

    /// Push gateway endpoint; notifications are only logged when unset
    #[arg(long, env = "YORIAI_PUSH_WEBHOOK_URL")]
    push_webhook_url: Option<String>,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            max_connections: self.max_connections,
            client: ClientConfig {
                queue_capacity: self.queue_capacity,
                idle_timeout: Duration::from_secs(self.idle_timeout_secs),
                write_timeout: Duration::from_secs(self.write_timeout_secs),
                max_message_size: self.max_message_size,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize dependencies in order:
    // 1. Clock
    // 2. Repositories
    // 3. PushNotifier
    // 4. Hub
    // 5. Server

    // 1. Clock
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 2. Repositories (in-memory store)
    let chats = match &args.seed {
        Some(path) => {
            let chats = InMemoryChatRepository::from_seed_file(path)?;
            tracing::info!(
                "Loaded {} chats from {}",
                chats.count_chats().await,
                path.display()
            );
            chats
        }
        None => InMemoryChatRepository::new(),
    };
    let repositories = Repositories {
        chats: Arc::new(chats),
        messages: Arc::new(InMemoryMessageRepository::new(clock.clone())),
        reactions: Arc::new(InMemoryReactionRepository::new(clock.clone())),
        pins: Arc::new(InMemoryPinRepository::new(clock.clone())),
    };

    // 3. PushNotifier
    let notifier: Arc<dyn PushNotifier> = match &args.push_webhook_url {
        Some(url) => {
            tracing::info!("Push notifications are sent to {}", url);
            Arc::new(WebhookPushNotifier::new(url.clone())?)
        }
        None => Arc::new(LoggingPushNotifier),
    };

    // 4. Hub
    let hub = Arc::new(Hub::new(repositories, notifier, clock));

    // 5. Server
    let authenticator = Arc::new(TrustedHeaderAuthenticator::new(&args.identity_header)?);
    let server = Server::new(hub, authenticator, args.server_config());
    server.run().await
}
