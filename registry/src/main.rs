//! The registry server binary: serves the HTTP API and manages records.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use record_store::{ModuleName, ModuleRecord, Store};
use terraform_registry::config::Config;
use terraform_registry::RegistryBuilder;

#[derive(Debug, Parser)]
#[command(name = "terraform-registry-server", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, default_value = "registry.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the registry HTTP API.
    Serve,

    /// Provision the record store (idempotent).
    Init,

    /// Seed one module record into the store.
    Import(ImportArgs),

    /// List every record in the store.
    List,

    /// Delete one record from the store.
    Remove {
        /// The fully qualified module name, `namespace/name/provider`.
        module: ModuleName,
        /// The exact version to delete.
        version: String,
    },
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// The module namespace.
    #[arg(long)]
    namespace: String,

    /// The module name.
    #[arg(long)]
    name: String,

    /// The module's primary provider.
    #[arg(long)]
    provider: String,

    /// The semantic version to publish.
    #[arg(long)]
    version: String,

    /// The artifact location, in go-getter URL syntax.
    #[arg(long)]
    getter_url: String,

    /// A short human-readable description.
    #[arg(long)]
    description: Option<String>,

    /// The owning user or team.
    #[arg(long)]
    owner: Option<String>,

    /// The human-facing repository URL.
    #[arg(long)]
    source: Option<String>,

    /// Mark the module as verified.
    #[arg(long)]
    verified: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let store = config.store.build();

    match cli.command {
        Command::Serve => serve(store, config).await?,
        Command::Init => {
            store.provision().await?;
            println!("store `{}` provisioned", store.name());
        }
        Command::Import(args) => {
            let name = ModuleName::new(args.namespace, args.name, args.provider)?;
            let mut record = ModuleRecord::new(name, args.version, args.getter_url);
            record.description = args.description;
            record.owner = args.owner;
            record.source = args.source;
            record.verified = args.verified.then_some(true);

            store.put(record.clone()).await?;
            println!("imported {}/{}", record.name, record.version);
        }
        Command::List => {
            for record in store.scan().await? {
                println!(
                    "{}/{}\t{}",
                    record.name, record.version, record.getter_url
                );
            }
        }
        Command::Remove { module, version } => {
            store.delete(&module, &version).await?;
            println!("removed {module}/{version}");
        }
    }

    Ok(())
}

async fn serve(store: Store, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = RegistryBuilder::new()
        .store(store)
        .base_path(&config.server.base_path)
        .page_limit(config.server.page_limit);
    if let Some(advertise) = &config.server.advertise {
        builder = builder.advertise(advertise);
    }
    let app = builder.build();

    let listener = tokio::net::TcpListener::bind(config.server.bind).await?;
    tracing::info!("registry listening on http://{}", config.server.bind);
    tracing::info!(
        "discovery: curl http://{}/.well-known/terraform.json",
        config.server.bind
    );

    axum::serve(listener, app).await?;
    Ok(())
}
