use clap::{Parser, Subcommand};
use diyruz_motion::config::Config;
use diyruz_motion::devices::{Definition, diyruz};
use diyruz_motion::error::Result;
use diyruz_motion::zigbee::{Message, Payload, RecordingDevice, RecordingEndpoint};
use log::{error, info, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// DIYRuZ_Motion device definition tooling
#[derive(Parser)]
#[command(name = "diyruz-motion", version, about)]
struct Cli {
    /// JSON config file with converter options
    #[arg(short, long, env = "DIYRUZ_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the device definition as JSON
    Describe,
    /// Convert JSON-lines messages into device state
    Convert {
        /// Read messages from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Run the configure routine against a recording device and print the requests
    Plan {
        /// Make the request with this zero-based index fail
        #[arg(long)]
        fail_at: Option<usize>,
    },
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            let mut config = Config::from_file(path)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            Ok(config)
        }
        None => Config::from_env(),
    }
}

fn describe(definition: &Definition) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&definition.summary())?);
    Ok(())
}

fn convert(definition: &Definition, config: &Config, input: Option<&Path>) -> Result<()> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    let publish = |payload: Payload| info!("[Convert] Out-of-band publish: {:?}", payload);
    let mut state = Payload::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let message: Message = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!("[Convert] Skipping line {}: {}", index + 1, e);
                continue;
            }
        };

        let payload = definition.convert_message(&message, &config.options, &state, &publish);
        state.extend(payload.clone());

        let output = serde_json::json!({ "payload": payload, "state": state });
        println!("{output}");
    }

    Ok(())
}

async fn plan(definition: &Definition, fail_at: Option<usize>) -> Result<()> {
    let mut device = RecordingDevice::new("0x0000000000000000", &[1, 2, 3]);
    if let Some(index) = fail_at {
        device = device.fail_at(index);
    }
    let coordinator = RecordingEndpoint::coordinator();

    let result = definition
        .configure_if_stale(&device, &coordinator, None)
        .await;
    println!("{}", serde_json::to_string_pretty(&device.calls())?);

    let key = result?;
    info!("Configure succeeded, configure key to store: {:?}", key);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let definition = diyruz::motion_definition();

    let result = match cli.command {
        Command::Describe => describe(&definition),
        Command::Convert { input } => convert(&definition, &config, input.as_deref()),
        Command::Plan { fail_at } => plan(&definition, fail_at).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
