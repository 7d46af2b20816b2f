use std::env;
use std::error::Error;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use clap::Parser;
use log::info;
use cms_edit::modules::logging::init_logger;
use cms_edit::modules::serialize::{is_not_found, load_elements};
use cms_edit::modules::stub::{router, StubState};

#[derive(Parser)]
#[command(
    name = "edit_stub",
    version,
    about = "Stand-in CMS content server for trying cms-edit locally",
    long_about = None
)]
struct Cli {
    #[arg(short = 'l', long = "log-file", default_value = "edit_stub.log")]
    log_file: String,

    #[arg(long = "log-level", default_value = "info")]
    log_level: String,

    #[arg(short = 'e', long = "elements", default_value = "./elements.toml")]
    elements: String,

    #[arg(short = 'p', long = "page", value_name = "FILE", help = "HTML page served at /")]
    page: Option<String>,

    #[arg(long = "csrf-token", help = "Token the toggle endpoint expects in X-CSRFToken")]
    csrf_token: Option<String>,

    #[arg(long = "persist", help = "Write accepted changes back to the elements file")]
    persist: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logger(&cli.log_file, &cli.log_level)?;

    let elements = match load_elements(&cli.elements) {
        Ok(elements) => elements,
        Err(err) if is_not_found(&err) => Vec::new(),
        Err(err) => return Err(err),
    };
    info!("Loaded {} elements from {}", elements.len(), cli.elements);

    let mut state = StubState::new(elements);
    if let Some(path) = &cli.page {
        state = state.with_page(fs::read_to_string(path)?);
    }
    if let Some(token) = cli.csrf_token {
        state = state.with_csrf_token(token);
    }
    if cli.persist {
        state = state.persisting_to(cli.elements.clone());
    }

    let port = env::var("EDIT_STUB_PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(8000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    println!("Content stub running on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(Arc::new(state))).await?;
    Ok(())
}
