use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hearth::{
    AudioFormat, ConversationClient, Microphone, OpenAiBackend, Playback, SessionConfig, Speaker,
};

/// Hearth - wake-word voice assistant
#[derive(Parser)]
#[command(name = "hearth", version, about)]
struct Cli {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: Option<String>,

    /// Picovoice access key for the wake word engine
    #[arg(long, env = "PICOVOICE_ACCESS_KEY", hide_env_values = true)]
    picovoice_key: Option<String>,

    /// Input device index (see `hearth list-devices`); default device if omitted
    #[arg(short, long)]
    device: Option<usize>,

    /// Wake keywords; the first triggers a turn, the second exits
    #[arg(short, long, default_values_t = vec!["grapefruit".to_string(), "terminator".to_string()])]
    keyword: Vec<String>,

    /// Directory holding listen_<n>.mp3 acknowledgment sounds
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Maximum prompt recording duration in seconds
    #[arg(long, default_value = "20")]
    max_record_secs: f32,

    /// RMS amplitude below which a frame counts as silent
    #[arg(long, default_value = "100")]
    silence_threshold: f32,

    /// Trailing silence (seconds) that ends a recording early
    #[arg(long, default_value = "2")]
    max_silence_secs: f32,

    /// Initial system prompt
    #[arg(
        long,
        default_value = "You are home assistant that helps with everyday duties"
    )]
    prompt: String,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List available input devices
    ListDevices,
    /// Synthesize text and play it through the speaker
    Say {
        /// Text to speak
        #[arg(default_value = "Hello! I am listening.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,hearth=info",
        1 => "info,hearth=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = &cli.command {
        return match cmd {
            Command::ListDevices => {
                for (i, name) in Microphone::list_devices()?.iter().enumerate() {
                    println!("Device {i}: {name}");
                }
                Ok(())
            }
            Command::Say { text } => say(&cli, text).await,
        };
    }

    run_assistant(cli).await
}

fn session_config(cli: &Cli) -> SessionConfig {
    SessionConfig {
        max_record_secs: cli.max_record_secs,
        silence_threshold: cli.silence_threshold,
        max_silence_secs: cli.max_silence_secs,
        initial_prompt: Some(cli.prompt.clone()),
        ..SessionConfig::default()
    }
}

fn openai_backend(cli: &Cli) -> anyhow::Result<OpenAiBackend> {
    let key = cli
        .openai_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is required"))?;
    Ok(OpenAiBackend::new(key)?)
}

#[allow(clippy::future_not_send)]
async fn say(cli: &Cli, text: &str) -> anyhow::Result<()> {
    let config = session_config(cli);
    let client = ConversationClient::new(openai_backend(cli)?, config);

    let audio = client.text_to_speech(text).await?;
    let format = AudioFormat::from_tag(client.tts_format())?;
    Speaker.play(format, audio).await?;
    Ok(())
}

#[cfg(feature = "porcupine")]
#[allow(clippy::future_not_send)]
async fn run_assistant(cli: Cli) -> anyhow::Result<()> {
    use hearth::wake::{PorcupineEngine, WakeWordEngine};
    use hearth::{LoopConfig, WakeLoop};

    /// Samples per frame for prompt recording
    const PROMPT_FRAME_LENGTH: usize = 512;

    let picovoice_key = cli
        .picovoice_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("PICOVOICE_ACCESS_KEY is required"))?;
    let engine = PorcupineEngine::new(&picovoice_key, &cli.keyword)?;

    // The wake stream and the prompt stream are never open at the same
    // time; they may share a device.
    let wake_mic = Microphone::open(cli.device, engine.frame_length())?;
    let prompt_mic = Microphone::open(cli.device, PROMPT_FRAME_LENGTH)?;

    let config = session_config(&cli);
    let client = ConversationClient::new(openai_backend(&cli)?, config.clone());

    let loop_config = LoopConfig {
        data_dir: cli.data_dir.clone(),
        ..LoopConfig::default()
    };

    let mut wake_loop = WakeLoop::new(
        engine,
        wake_mic,
        prompt_mic,
        Speaker,
        client,
        &config,
        loop_config,
    );
    wake_loop.run().await?;
    Ok(())
}

#[cfg(not(feature = "porcupine"))]
#[allow(clippy::unused_async)]
async fn run_assistant(_cli: Cli) -> anyhow::Result<()> {
    anyhow::bail!(
        "built without a wake word engine; rebuild with `--features porcupine` \
         (list-devices and say still work)"
    )
}
