use async_std::task;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use rivulet::config::{self, ServerConfig};
use rivulet::net::resolver;
use rivulet::net::server::{Server, TaskPerConnection};

fn main() -> std::io::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let cfg = match std::env::args().nth(1) {
        Some(path) => ServerConfig::from_file(&path),
        None => ServerConfig::default(),
    };
    config::set_config(cfg);

    task::block_on(async {
        let addrs = resolver::resolve(&config::config().address, config::config().port).await?;
        let server = Server::bind(&addrs).await?;
        tracing::info!(addr = %server.local_addr()?, "server started");
        server.run(TaskPerConnection).await
    })
}
