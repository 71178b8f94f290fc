use anyhow::{Context, Result};
use clap::Parser;
use murmur_audio::{ChunkerConfig, DeviceManager, StreamChunker, WavFileSource};
use murmur_core::{AppConfig, InferenceOptions, PipelineEvent, SampleBuffer};
use murmur_engine::{CoordinatorHandle, EngineRegistry, InferenceCoordinator};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "murmur", about = "Streaming speech recognition pipeline")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Transcribe a WAV file instead of capturing live audio
    #[arg(short, long)]
    wav: Option<PathBuf>,

    /// List available input devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        AppConfig::load_from_file(&cli.config)
            .with_context(|| format!("failed to load config from {:?}", cli.config))?
    } else {
        AppConfig::from_toml_str("").context("default configuration failed to parse")?
    };

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    tracing::info!("murmur starting");
    if !cli.config.exists() {
        tracing::info!("no config file at {:?}, using defaults", cli.config);
    }

    if cli.list_devices {
        let manager = DeviceManager::new();
        for (name, _) in manager
            .list_input_devices()
            .context("failed to enumerate input devices")?
        {
            println!("{name}");
        }
        return Ok(());
    }

    // Engine and coordinator
    let registry = EngineRegistry::new();
    let engine = registry
        .create(&config.engine.name)
        .with_context(|| format!("failed to create engine '{}'", config.engine.name))?;

    let mut coordinator = InferenceCoordinator::new(
        engine,
        Duration::from_secs(config.engine.timeout_seconds),
    );
    coordinator
        .initialize(config.engine.extra.clone())
        .await
        .with_context(|| format!("failed to initialize engine '{}'", config.engine.name))?;
    tracing::info!("engine '{}' ready", config.engine.name);

    let mut event_rx = coordinator
        .take_event_receiver()
        .context("event receiver already taken")?;
    let handle = coordinator.handle();
    let loop_task = coordinator.start();

    // Subscriber side: log whatever the pipeline publishes
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                PipelineEvent::Transcript { request_id, event } => {
                    if event.is_partial {
                        tracing::debug!(request_id, "partial: {}", event.text);
                    } else {
                        tracing::info!(request_id, "transcript: {}", event.text);
                    }
                }
                PipelineEvent::Progress(p) => {
                    tracing::info!("model preparation: {:.0}%", p.percent);
                }
                PipelineEvent::Error(e) => {
                    tracing::warn!(sequence_id = ?e.sequence_id, "{:?}: {}", e.kind, e.message);
                }
            }
        }
    });

    let options = InferenceOptions {
        language: config.engine.language.clone(),
        return_timestamps: config.engine.return_timestamps,
        chunk_length_seconds: config.chunker.chunk_length_seconds,
        stride_length_seconds: config.chunker.overlap_seconds,
    };
    let mut chunker = StreamChunker::new(ChunkerConfig {
        chunk_length_seconds: config.chunker.chunk_length_seconds,
        overlap_seconds: config.chunker.overlap_seconds,
        min_chunk_seconds: config.chunker.min_chunk_seconds,
        sample_rate: config.chunker.target_sample_rate,
    })
    .context("invalid chunker configuration")?;

    if let Some(wav_path) = cli.wav {
        run_from_file(&wav_path, &config, &mut chunker, &handle, &options).await?;
    } else {
        run_live(&config, &mut chunker, &handle, &options).await?;
    }

    drop(handle);
    loop_task.await.context("coordinator loop panicked")?;
    tracing::info!("murmur stopped");
    Ok(())
}

/// Condition one capture frame and hand every completed window to the
/// coordinator.
fn feed_frame(
    frame: SampleBuffer,
    target_rate: u32,
    chunker: &mut StreamChunker,
    handle: &CoordinatorHandle,
    options: &InferenceOptions,
) -> Result<Vec<murmur_engine::DoneReceiver>> {
    let mono = murmur_audio::to_mono(frame);
    let resampled = murmur_audio::resample(mono, target_rate).context("resampling failed")?;
    Ok(chunker
        .push(&resampled.samples)
        .into_iter()
        .map(|chunk| handle.submit(chunk, options.clone()).1)
        .collect())
}

async fn run_from_file(
    path: &PathBuf,
    config: &AppConfig,
    chunker: &mut StreamChunker,
    handle: &CoordinatorHandle,
    options: &InferenceOptions,
) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {path:?}"))?;
    let buffer = murmur_audio::decode_pcm16(&bytes)
        .with_context(|| format!("failed to decode {path:?}"))?;
    tracing::info!(
        "transcribing {:?}: {:.2}s at {}Hz, {} ch",
        path,
        buffer.duration_secs(),
        buffer.sample_rate,
        buffer.channels,
    );

    let target_rate = config.chunker.target_sample_rate;
    let mut done = Vec::new();
    for frame in WavFileSource::new(buffer, config.capture.buffer_size as usize) {
        done.extend(feed_frame(frame, target_rate, chunker, handle, options)?);
    }
    if let Some(last) = chunker.flush() {
        done.push(handle.submit(last, options.clone()).1);
    }

    for rx in done {
        match rx.await.context("coordinator dropped a request")? {
            Ok(transcript) => println!("{}", transcript.text),
            Err(e) => tracing::warn!("chunk failed: {e}"),
        }
    }
    Ok(())
}

async fn run_live(
    config: &AppConfig,
    chunker: &mut StreamChunker,
    handle: &CoordinatorHandle,
    options: &InferenceOptions,
) -> Result<()> {
    let manager = DeviceManager::new();
    let device = manager
        .get_input_device(&config.capture.device_name)
        .with_context(|| {
            format!("failed to get input device '{}'", config.capture.device_name)
        })?;
    tracing::info!(
        "capturing from '{}' at {}Hz, {} ch",
        config.capture.device_name,
        config.capture.sample_rate,
        config.capture.channels,
    );

    // ~2 seconds of headroom between the audio callback and the pump
    let ring_capacity =
        config.capture.sample_rate as usize * config.capture.channels as usize * 2;
    let (producer, consumer) = murmur_audio::create_ring_buffer(ring_capacity);

    let (_capture, capture_status) = murmur_audio::CaptureNode::new(
        &device,
        producer,
        config.capture.sample_rate,
        config.capture.channels,
        config.capture.buffer_size,
    )
    .context("failed to build capture stream")?;

    let (frame_tx, mut frame_rx) = tokio::sync::mpsc::unbounded_channel();
    let pump = murmur_audio::spawn_frame_pump(
        consumer,
        config.capture.sample_rate,
        config.capture.channels,
        frame_tx,
        Duration::from_millis(10),
    );

    let target_rate = config.chunker.target_sample_rate;
    tracing::info!("listening; press Ctrl-C to stop");
    let mut interrupted = false;
    loop {
        tokio::select! {
            frame = frame_rx.recv() => match frame {
                // Final transcripts are reported by the event subscriber;
                // live mode does not track per-chunk completions.
                Some(frame) => drop(feed_frame(frame, target_rate, chunker, handle, options)?),
                None => {
                    tracing::warn!("capture pump stopped unexpectedly");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                interrupted = true;
                break;
            }
        }
    }

    drop(frame_rx);
    let _ = pump.await;
    if capture_status.status() == murmur_audio::CaptureStatus::Error {
        tracing::warn!("capture stream reported an error during the session");
    }

    // A deliberate stop emits the trailing audio as the terminal chunk; a
    // capture failure mid-stream only submits what is worth transcribing,
    // dropping sub-minimum fragments.
    let last = if interrupted {
        chunker.flush()
    } else {
        chunker.flush_non_final()
    };
    if let Some(last) = last {
        let (_, done) = handle.submit(last, options.clone());
        match tokio::time::timeout(
            Duration::from_secs(config.engine.timeout_seconds),
            done,
        )
        .await
        {
            Ok(Ok(Ok(transcript))) => println!("{}", transcript.text),
            Ok(Ok(Err(e))) => tracing::warn!("final chunk failed: {e}"),
            Ok(Err(_)) | Err(_) => tracing::warn!("final chunk was not resolved"),
        }
    }
    Ok(())
}
