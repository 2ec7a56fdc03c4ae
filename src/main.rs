use std::io::Cursor;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chatvoice::feed::YouTubeChatClient;
use chatvoice::speech::{AudioPlayback, VoicevoxSynthesizer};
use chatvoice::{
    AudioSink, ChatFeed, Config, Orchestrator, ReplyGenerator, SpeechPlayback, StreamId, reply,
};

/// Chatvoice - speak replies to live stream chat comments
#[derive(Parser)]
#[command(name = "chatvoice", version, about)]
struct Cli {
    /// Live stream (video) id whose chat is followed
    #[arg(short, long, env = "CHATVOICE_STREAM_ID")]
    stream_id: Option<String>,

    /// Seconds to wait between polls
    #[arg(short, long)]
    interval: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Print the live chat id of a stream
    Resolve {
        /// Live stream (video) id
        stream_id: String,
    },
    /// Generate one reply and print it
    TestReply {
        /// Comment to reply to
        #[arg(default_value = "good day")]
        text: String,
    },
    /// Synthesize and play one comment/reply pair
    TestSpeech {
        /// Comment text
        #[arg(long, default_value = "おはようございます")]
        comment: String,
        /// Reply text
        #[arg(long, default_value = "おはようございます！今日も頑張りましょう！")]
        reply: String,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,chatvoice=info",
        1 => "info,chatvoice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(stream_id) = cli.stream_id {
        config.stream_id = Some(stream_id);
    }
    if let Some(secs) = cli.interval {
        config.poll_interval = Duration::from_secs(secs);
    }
    tracing::debug!(?config, "loaded configuration");

    // Handle subcommands
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Resolve { stream_id } => resolve(&config, &stream_id).await,
            Command::TestReply { text } => test_reply(&config, &text).await,
            Command::TestSpeech { comment, reply } => test_speech(&config, &comment, &reply).await,
            Command::TestSpeaker => test_speaker().await,
        };
    }

    tracing::info!(
        stream = ?config.stream_id,
        interval_secs = config.poll_interval.as_secs(),
        backend = config.reply.backend.as_str(),
        "starting chatvoice"
    );

    let mut orchestrator = Orchestrator::from_config(&config)?;
    orchestrator.run().await?;

    Ok(())
}

/// Print the live chat id of a stream
async fn resolve(config: &Config, stream_id: &str) -> anyhow::Result<()> {
    let client = YouTubeChatClient::new(
        config.youtube_api_key()?.to_string(),
        config.feed.base_url.clone(),
    )?;
    let handle = client.resolve_feed(&StreamId::new(stream_id)).await?;
    println!("Live chat id: {handle}");
    Ok(())
}

/// Generate one reply through the configured backend
async fn test_reply(config: &Config, text: &str) -> anyhow::Result<()> {
    println!(
        "Asking {} ({}) to reply to: \"{text}\"\n",
        config.reply.backend.as_str(),
        config.reply.model
    );

    let generator = reply::from_config(config)?;
    let reply = generator.generate_reply(text).await?;
    println!("Reply: {reply}");
    Ok(())
}

/// Synthesize and play one comment/reply pair
async fn test_speech(config: &Config, comment: &str, reply: &str) -> anyhow::Result<()> {
    println!(
        "Synthesizing with VOICEVOX at {} (speaker {})...",
        config.speech.voicevox_url, config.speech.speaker
    );

    let speech = SpeechPlayback::new(
        Box::new(VoicevoxSynthesizer::new(
            config.speech.voicevox_url.clone(),
            config.speech.speaker,
        )),
        Box::new(AudioPlayback::new()?),
        config.speech.artifact_path.clone(),
    );
    speech.synthesize_and_play(comment, reply).await?;

    println!("\n---");
    println!("Audio written to {}", speech.artifact_path().display());
    println!("If you heard the speech, synthesis and playback are working!");
    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Playing a 2 second 440 Hz tone...");

    let playback = AudioPlayback::new()?;
    println!("Output device: {}", playback.device_name());

    let wav = sine_wav(440.0, 2.0, 24_000)?;
    playback.play(&wav).await?;

    println!("Tone played. If it was silent, pick another default output device;");
    println!("chatvoice always speaks through the system default.");

    Ok(())
}

/// Encode a mono sine tone as 16-bit WAV
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn sine_wav(frequency: f32, duration_secs: f32, sample_rate: u32) -> anyhow::Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;

    let num_samples = (sample_rate as f32 * duration_secs) as usize;
    for i in 0..num_samples {
        let t = i as f32 / sample_rate as f32;
        let sample = (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3; // 30% volume
        writer.write_sample((sample * f32::from(i16::MAX)) as i16)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}
