use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use glimpse::voice::{
    AudioSink, FileSink, MicrophoneRecorder, PcmAudio, SpeakerSink, SpeechClient, Synthesizer,
    WaveformEncoder, play_blocking,
};
use glimpse::{AnalysisClient, Assistant, Config, FileFrameSource, Recording, SessionState};

/// glimpse - push-to-talk voice and vision client
#[derive(Parser)]
#[command(name = "glimpse", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive push-to-talk: Enter starts recording, Enter again sends it
    Listen {
        /// Image file read as the camera frame for each question
        #[arg(short, long, env = "GLIMPSE_FRAME")]
        image: PathBuf,
        /// Save replies to this directory instead of playing them
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Run one session from a recorded audio file
    Ask {
        /// Image file used as the camera frame
        #[arg(short, long)]
        image: PathBuf,
        /// Recorded audio (webm, ogg, mp3, wav, ...)
        #[arg(short, long)]
        audio: PathBuf,
        /// Save the reply to this directory instead of playing it
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Re-encode a recording to 16-bit PCM WAV
    Encode {
        /// Recorded audio
        input: PathBuf,
        /// Destination WAV file
        output: PathBuf,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,glimpse=info",
        1 => "info,glimpse=debug",
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
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Command::Listen { image, out } => listen(&config, image, out).await,
        Command::Ask { image, audio, out } => ask(&config, image, &audio, out).await,
        Command::Encode { input, output } => encode(&config, &input, &output).await,
        Command::TestSpeaker => test_speaker().await,
        Command::TestTts { text } => test_tts(&config, &text).await,
    }
}

/// Build an assistant wired to the configured endpoints
fn build_assistant(
    config: &Config,
    image: PathBuf,
    out: Option<PathBuf>,
) -> anyhow::Result<Assistant> {
    let encoder = WaveformEncoder::default().with_limits(config.recording.limits);
    let analyzer = AnalysisClient::new(&config.analysis, config.timeout)?;
    let synthesizer = SpeechClient::new(&config.speech, config.timeout)?;
    let sink: Arc<dyn AudioSink> = match out {
        Some(dir) => Arc::new(FileSink::new(dir)),
        None => Arc::new(SpeakerSink),
    };

    Ok(Assistant::new(
        encoder,
        Arc::new(FileFrameSource::new(image)),
        Arc::new(analyzer),
        Arc::new(synthesizer),
        sink,
    ))
}

/// Interactive push-to-talk loop
#[allow(clippy::future_not_send)]
async fn listen(config: &Config, image: PathBuf, out: Option<PathBuf>) -> anyhow::Result<()> {
    let mut assistant = build_assistant(config, image, out)?;
    let mut recorder = MicrophoneRecorder::new(config.recording.chunk_bytes)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Microphone: {} Hz, {} channel(s)",
        recorder.sample_rate(),
        recorder.channels()
    );
    println!("Press Enter to talk, Enter again to send. Ctrl-D quits.\n");

    while lines.next_line().await?.is_some() {
        match assistant.state() {
            SessionState::Idle => {
                if let Err(e) = recorder.start() {
                    tracing::error!(error = %e, "failed to start recording");
                    continue;
                }
                assistant.begin_recording();
                println!("Recording... (Enter to send)");
            }
            SessionState::Recording => {
                let recording = match recorder.stop() {
                    Ok(recording) => recording,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to finish recording");
                        assistant.cancel_recording();
                        continue;
                    }
                };
                println!("Processing...");
                if let Some(reply) = assistant.process(recording).await {
                    println!("> {}\n", reply.text);
                }
                println!("Press Enter to talk.");
            }
            SessionState::Processing => {}
        }
    }

    if recorder.is_recording()
        && let Err(e) = recorder.stop()
    {
        tracing::warn!(error = %e, "failed to stop recording on exit");
    }
    Ok(())
}

/// One session from files
async fn ask(
    config: &Config,
    image: PathBuf,
    audio: &Path,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut assistant = build_assistant(config, image, out)?;
    let recording = Recording::from_file(audio, config.recording.chunk_bytes)?;

    match assistant.process(recording).await {
        Some(reply) => {
            println!("{}", reply.text);
            Ok(())
        }
        None => anyhow::bail!("session failed, see log for details"),
    }
}

/// Re-encode a recording without contacting any backend
async fn encode(config: &Config, input: &Path, output: &Path) -> anyhow::Result<()> {
    let encoder = WaveformEncoder::default().with_limits(config.recording.limits);
    let recording = Recording::from_file(input, config.recording.chunk_bytes)?;

    let wav = encoder.encode(recording).await?;
    tokio::fs::write(output, &wav).await?;

    println!("Wrote {} bytes to {}", wav.len(), output.display());
    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sample_rate = 24000_u32;
    let frequency = 440.0_f32;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..sample_rate * 2)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);

    let pcm = PcmAudio {
        samples,
        sample_rate,
    };
    tokio::task::spawn_blocking(move || play_blocking(&pcm)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");
    println!("  3. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let synthesizer = SpeechClient::new(&config.speech, config.timeout)?;

    println!("Synthesizing speech...");
    let audio = synthesizer.synthesize(text).await?;
    println!("Got {} bytes of {} audio", audio.data.len(), audio.format);

    println!("Playing audio...");
    SpeakerSink.play(&audio).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
