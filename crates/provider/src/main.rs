//! Terraform Provider for Apache CloudStack
//!
//! This binary implements the Terraform Plugin Protocol v6 for managing
//! CloudStack resources such as VPCs, security groups and SSH key pairs.

use std::io::{self, Write};

use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing::info;

mod proto;
mod provider;
mod resources;
mod retry;
mod schema;
mod state;

use proto::tfplugin6::provider_server::ProviderServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr, stdout belongs to the plugin handshake.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting CloudStack Terraform Provider");

    // Terraform expects the provider to listen on a port and communicate
    // via gRPC. The protocol handshake is done on stdout.

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    info!("Provider listening on {}", addr);

    let provider_service = provider::CloudStackProvider::new();

    // Handshake format: <proto_version>|<addr>|<proto_type>|<cert>|<server_cert>
    // Plain TCP without certificates for local connections.
    let handshake = format!("1|{}|tcp||\n", addr);
    io::stdout().write_all(handshake.as_bytes())?;
    io::stdout().flush()?;

    info!("Handshake sent, starting gRPC server");

    // Release the port so tonic can rebind the same address.
    drop(listener);

    Server::builder()
        .add_service(ProviderServer::new(provider_service))
        .serve(addr)
        .await?;

    Ok(())
}
