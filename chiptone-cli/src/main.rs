//! Chiptone CLI: play and render the shop's retro sounds and theme.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chiptone_engine::{
    build_sound, list_output_devices, AudioOutput, BankFile, ControllerConfig, CpalOutput, OutputOptions,
    PlaybackController, SampleBuffer, SeededNoise, ThreadNoise,
};
use clap::{Args, Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "chiptone")]
#[command(author, version, about = "Retro square/saw sound effects and music loop", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audio output devices
    Devices,

    /// List the sounds in a bank
    Sounds {
        #[command(flatten)]
        bank: BankArg,
    },

    /// Play sounds and/or the music loop on an output device
    Play(PlayArgs),

    /// Render one sound or the music loop to a 16-bit mono WAV file
    Render(RenderArgs),
}

#[derive(Args)]
struct BankArg {
    /// JSON bank file (default: built-in shop presets and theme)
    #[arg(long)]
    bank: Option<PathBuf>,
}

impl BankArg {
    fn load(&self) -> Result<BankFile> {
        match &self.bank {
            Some(path) => BankFile::load(path).with_context(|| format!("loading bank {}", path.display())),
            None => Ok(BankFile::shop()?),
        }
    }
}

#[derive(Args)]
struct PlayArgs {
    #[command(flatten)]
    bank: BankArg,

    /// Sound to fire, in order (repeatable)
    #[arg(short, long = "sound")]
    sounds: Vec<String>,

    /// Start the music loop
    #[arg(short, long)]
    music: bool,

    /// Seconds to keep playing after the last sound fires
    #[arg(short, long, default_value_t = 2.0)]
    duration: f64,

    /// Seconds between consecutive sounds
    #[arg(long, default_value_t = 0.3)]
    gap: f64,

    /// Music volume in [0, 1]
    #[arg(long, default_value_t = chiptone_engine::config::DEFAULT_MUSIC_VOLUME)]
    music_volume: f32,

    /// Effects volume in [0, 1]
    #[arg(long, default_value_t = chiptone_engine::config::DEFAULT_SFX_VOLUME)]
    sfx_volume: f32,

    /// Output device name (default: host default)
    #[arg(long)]
    device: Option<String>,

    /// Requested device sample rate
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Requested device channel count
    #[arg(long)]
    channels: Option<u16>,
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    bank: BankArg,

    /// Sound to render
    #[arg(short, long, conflicts_with = "music", required_unless_present = "music")]
    sound: Option<String>,

    /// Render the music loop instead of a sound
    #[arg(short, long)]
    music: bool,

    /// Output WAV path
    #[arg(short, long)]
    out: PathBuf,

    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,

    /// Seed for noise sounds (default: thread RNG)
    #[arg(long)]
    seed: Option<u64>,
}

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s.max(0.0))
}

fn list_devices() -> Result<()> {
    println!("Available output devices:");
    for name in list_output_devices()? {
        println!("- {name}");
    }
    Ok(())
}

fn list_sounds(bank: &BankArg) -> Result<()> {
    let file = bank.load()?;
    for def in &file.sounds {
        println!(
            "{:<10} {:<8} {:>7.1} Hz  {:.2} s  {} step(s)",
            def.name(),
            def.waveform().name(),
            def.base_frequency(),
            def.duration(),
            def.steps().len()
        );
    }
    if let Some(music) = &file.music {
        println!(
            "music: {} lead / {} bass notes, {:.2} s loop",
            music.melody.len(),
            music.bass.len(),
            music.loop_duration
        );
    }
    Ok(())
}

fn play(args: &PlayArgs) -> Result<()> {
    let file = args.bank.load()?;
    let output = CpalOutput::open(&OutputOptions {
        device_name: args.device.clone(),
        sample_rate: args.sample_rate,
        channels: args.channels,
    })?;
    println!("Using device: {} ({} Hz, {} ch)", output.device_name(), output.sample_rate(), output.channels());

    let config = ControllerConfig {
        music_volume: args.music_volume,
        sfx_volume: args.sfx_volume,
        muted: false,
    };
    let mut controller = PlaybackController::from_bank_file(output, &file, config, &mut ThreadNoise::new())?;

    if args.music {
        controller.play_music();
        if !controller.is_music_playing() {
            bail!("bank has no music");
        }
    }
    for (i, name) in args.sounds.iter().enumerate() {
        if controller.bank().get(name).is_none() {
            bail!("unknown sound: {name}");
        }
        if i > 0 {
            thread::sleep(secs(args.gap));
        }
        info!(sound = %name, "fire");
        controller.play_one_shot(name);
    }

    thread::sleep(secs(args.duration));
    controller.stop_music();
    Ok(())
}

fn render(args: &RenderArgs) -> Result<()> {
    let file = args.bank.load()?;
    let buffer: SampleBuffer = if args.music {
        let Some(music) = &file.music else { bail!("bank has no music") };
        music.build(args.sample_rate)?
    } else {
        let name = args.sound.as_deref().unwrap_or_default();
        let def = file
            .sounds
            .iter()
            .find(|d| d.name() == name)
            .with_context(|| format!("unknown sound: {name}"))?;
        match args.seed {
            Some(seed) => build_sound(def, args.sample_rate, &mut SeededNoise::new(seed))?,
            None => build_sound(def, args.sample_rate, &mut ThreadNoise::new())?,
        }
    };

    buffer.write_wav(&args.out).with_context(|| format!("writing {}", args.out.display()))?;
    println!(
        "Wrote {} ({} samples, {:.3} s, peak {:.3})",
        args.out.display(),
        buffer.len(),
        buffer.duration(),
        buffer.peak()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Devices => list_devices(),
        Commands::Sounds { bank } => list_sounds(bank),
        Commands::Play(args) => play(args),
        Commands::Render(args) => render(args),
    }
}
