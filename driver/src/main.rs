use anyhow::Context;
use clap::Parser;
use rupacore::service::{EmbeddingModel, HttpCompareClient};
use rupacore::{ResultView, WorkflowState};
use session::config::{load_settings, SessionConfig};
use session::runner::{Runner, SlotSource};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use stub::{StubBackend, StubReply};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod session;
mod stub;

#[derive(Parser)]
#[command(author, version, about = "CerminRupa face comparison driver")]
struct Args {
    /// Load frontend settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Image for the first slot
    #[arg(long)]
    first: Option<PathBuf>,
    /// Image for the second slot
    #[arg(long)]
    second: Option<PathBuf>,
    /// Fill the first slot from the camera instead of a file
    #[arg(long, default_value_t = false)]
    capture_first: bool,
    #[arg(long, default_value_t = false)]
    capture_second: bool,
    /// Embedding model, e.g. Facenet512 or VGG-Face
    #[arg(long)]
    model: Option<EmbeddingModel>,
    /// Comparison endpoint, overrides the settings file
    #[arg(long)]
    service_url: Option<String>,
    /// Decide verification locally at this similarity percentage
    #[arg(long)]
    threshold: Option<f64>,
    /// Run the local stub backend
    #[arg(long, default_value_t = false)]
    serve_stub: bool,
    #[arg(long, default_value_t = 8000)]
    stub_port: u16,
    /// YAML reply the stub backend replays
    #[arg(long)]
    stub_script: Option<PathBuf>,
}

impl Args {
    fn wants_comparison(&self) -> bool {
        self.first.is_some() || self.second.is_some() || self.capture_first || self.capture_second
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref())?;
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    runtime.block_on(run(args, settings))
}

async fn run(args: Args, settings: rupacore::Settings) -> anyhow::Result<()> {
    let mut stub = None;
    if args.serve_stub {
        let reply = match &args.stub_script {
            Some(path) => StubReply::load(path)?,
            None => StubReply::default(),
        };
        let (backend, server) =
            StubBackend::bind(SocketAddr::from(([127, 0, 0, 1], args.stub_port)), reply)?;
        tokio::spawn(server);
        println!("Stub backend listening on {}", backend.compare_url());
        stub = Some(backend);
    }

    let compare = args.wants_comparison();
    if compare {
        // A running stub is the default target unless a URL was given.
        let service_url = args
            .service_url
            .clone()
            .or_else(|| stub.as_ref().map(StubBackend::compare_url));
        let config = SessionConfig::from_args(settings, args.model, service_url, args.threshold);
        let client = HttpCompareClient::new(&config.settings.service, config.policy)
            .context("building comparison client")?;
        log::info!("comparing against {}", client.url());
        let camera = Arc::new(config.settings.camera.clone());
        let runner = Runner::new(config, Arc::new(client), camera);

        let first = SlotSource::from_flags(args.first.clone(), args.capture_first);
        let second = SlotSource::from_flags(args.second.clone(), args.capture_second);
        let workflow = runner.execute(first, second).await?;

        match ResultView::of(workflow.state()) {
            ResultView::Success(summary) => {
                for line in summary.lines() {
                    println!("{}", line);
                }
            }
            ResultView::Failure(message) => eprintln!("{}", message),
            ResultView::Hidden | ResultView::Busy => {}
        }

        if !args.serve_stub {
            if let WorkflowState::Failed(err) = workflow.state() {
                anyhow::bail!("comparison failed: {}", err);
            }
        }
    }

    if let Some(backend) = &stub {
        println!("Stub backend running (Ctrl+C to stop)...");
        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
        let mut fields: Vec<String> = backend
            .last_form()
            .map(|form| form.into_keys().collect())
            .unwrap_or_default();
        fields.sort();
        println!(
            "Stub backend handled {} request(s); last form fields: {:?}",
            backend.requests(),
            fields
        );
    } else if !compare {
        println!("Nothing to do: pass --first/--second or --serve-stub.");
    }

    Ok(())
}
