use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc::{self, UnboundedSender};

use fooderator::api::ApiClient;
use fooderator::camera::{Camera, FfmpegCamera, FrameFileCamera};
use fooderator::config::{self, Config};
use fooderator::display::Panel;
use fooderator::lookup::Lookup;
use fooderator::scanner::{
    CaptureIndicator, ScanCommand, ScanController, ScanOutcome, ScanSettings,
};

/// fooderator: scan a barcode, see what's in the food
#[derive(Parser)]
#[command(name = "fooderator")]
#[command(version, about = "Barcode scanner and nutrition lookup client")]
#[command(long_about = "Scan product barcodes with a camera or a still image and \
    print the product's ingredients and nutrition facts, fetched from a \
    product lookup service.")]
#[command(after_help = "EXAMPLES:
    # Scan continuously with the default camera
    fooderator scan

    # Scan from a file another program keeps overwriting
    fooderator scan --frame-file /tmp/frame.jpg

    # Decode a photo of a barcode
    fooderator decode label.jpg

    # Look up a barcode directly, in Spanish
    fooderator --lang es lookup 5449000000996

ENVIRONMENT:
    FOODERATOR_SERVER    Base URL of the lookup service (overrides the config file)
    RUST_LOG             Log filter, e.g. debug or fooderator=info")]
struct Cli {
    /// Base URL of the lookup service
    #[arg(long, global = true)]
    server: Option<String>,

    /// Language code for product data (en, es, fr, ...)
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Path to a config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan continuously until a barcode is found
    #[command(after_help = "CONTROLS (while scanning):
    Enter     Capture the current frame and decode it once
    Ctrl+C    Close the scanner")]
    Scan {
        /// Capture device passed to ffmpeg (e.g. /dev/video0, or 0 on macOS)
        #[arg(long, short = 'd', conflicts_with = "frame_file")]
        device: Option<String>,

        /// Read frames from an image file instead of a camera
        #[arg(long)]
        frame_file: Option<PathBuf>,
    },

    /// Decode a barcode from an image file and look it up
    Decode {
        /// Image file (JPEG or PNG)
        image: PathBuf,
    },

    /// Look up a barcode
    Lookup {
        barcode: String,
    },

    /// List the languages the service supports
    Languages,
}

/// Load .env file
///
/// Does not override existing environment variables.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Config file, then environment, then CLI flags.
fn load_config(cli: &Cli) -> Result<Config, String> {
    let mut cfg = Config::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    cfg.apply_env();

    if let Some(server) = &cli.server {
        cfg.server.base_url = server.clone();
    }
    if let Some(lang) = &cli.lang {
        cfg.display.language = lang.clone();
    }
    Ok(cfg)
}

/// Print a finished panel. Errors become the process error.
fn show(panel: Panel) -> Result<(), String> {
    match panel {
        Panel::Error(message) => Err(message),
        Panel::Empty => Ok(()),
        panel => {
            println!("{}", panel);
            Ok(())
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let cfg = load_config(&cli)?;
    log::debug!("Using lookup service at {}", cfg.server.base_url);

    let client = ApiClient::with_timeout(
        cfg.server.base_url.clone(),
        Duration::from_secs(cfg.server.timeout_secs),
    )
    .map_err(|e| e.to_string())?;
    let lookup = Lookup::new(client.clone(), cfg.display.language.clone());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create async runtime: {}", e))?;

    match cli.command {
        Commands::Scan { device, frame_file } => {
            let mut camera: Box<dyn Camera> = match frame_file {
                Some(path) => Box::new(FrameFileCamera::new(path)),
                None => {
                    let device = device
                        .or_else(|| cfg.scan.device.clone())
                        .unwrap_or_else(|| FfmpegCamera::default_device().to_string());
                    Box::new(FfmpegCamera::new(device))
                }
            };
            let settings = ScanSettings::from(&cfg.scan);
            rt.block_on(run_scan(client, &lookup, camera.as_mut(), settings))
        }
        Commands::Decode { image } => rt.block_on(async {
            eprintln!("{}", Panel::Loading);
            show(lookup.process_file(&image).await)
        }),
        // Blank input shows nothing
        Commands::Lookup { barcode } => {
            rt.block_on(async { show(lookup.search(&barcode).await.unwrap_or_default()) })
        }
        Commands::Languages => rt.block_on(async {
            let languages = client.languages().await.map_err(|e| e.to_string())?;
            for (code, name) in &languages {
                println!("{:<6} {}", code, name);
            }
            Ok(())
        }),
    }
}

async fn run_scan(
    client: ApiClient,
    lookup: &Lookup,
    camera: &mut dyn Camera,
    settings: ScanSettings,
) -> Result<(), String> {
    let (tx, mut commands) = mpsc::unbounded_channel();
    if let Err(e) = setup_ctrlc_handler(tx.clone()) {
        eprintln!("Warning: Could not set up Ctrl+C handler: {}", e);
    }
    spawn_enter_listener(tx);

    let mut controller = ScanController::new(client, settings);
    if let Err(e) = controller.open_camera(camera) {
        return show(lookup.complete_scan(Err(e)).await);
    }
    eprintln!("{}  (Enter to capture, Ctrl+C to close)", controller.indicator());

    SCANNER_OPEN.store(true, Ordering::SeqCst);
    let outcome = controller.run(&mut commands).await;
    SCANNER_OPEN.store(false, Ordering::SeqCst);
    match &outcome {
        Ok(ScanOutcome::Found(barcode)) => {
            eprintln!("{} {}", CaptureIndicator::Found, barcode);
            eprintln!("{}", Panel::Loading);
        }
        Ok(ScanOutcome::Captured(_)) => eprintln!("{}", Panel::Loading),
        _ => {}
    }
    show(lookup.complete_scan(outcome).await)
}

/// Set while the scanner loop is reading commands.
static SCANNER_OPEN: AtomicBool = AtomicBool::new(false);

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    CloseScanner,
    Exit,
}

/// Ctrl+C closes an open scanner; at any other time it ends the process.
fn route_interrupt(scanner_open: bool, commands: &UnboundedSender<ScanCommand>) -> Interrupt {
    if scanner_open && commands.send(ScanCommand::Close).is_ok() {
        Interrupt::CloseScanner
    } else {
        Interrupt::Exit
    }
}

fn setup_ctrlc_handler(commands: UnboundedSender<ScanCommand>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        match route_interrupt(SCANNER_OPEN.load(Ordering::SeqCst), &commands) {
            Interrupt::CloseScanner => eprintln!("\nReceived Ctrl+C, closing scanner..."),
            Interrupt::Exit => {
                eprintln!("\nReceived Ctrl+C, shutting down...");
                std::process::exit(130);
            }
        }
    })
}

/// Every line on stdin asks for a manual capture.
fn spawn_enter_listener(commands: UnboundedSender<ScanCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() || commands.send(ScanCommand::Capture).is_err() {
                break;
            }
        }
    });
}

fn main() {
    // Load .env file before anything else
    load_env();
    init_logging();

    let cli = Cli::parse();
    if let Some(path) = cli.config.as_ref().filter(|p| !p.exists()) {
        eprintln!("Error: Config file not found: {}", path.display());
        std::process::exit(1);
    }
    log::debug!("Default config path: {}", config::default_path().display());

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
