//! WAV PCM Source - 文件音频源命令行
//!
//! - info: 显示容器头部与负载布局
//! - stream: 按 10ms 帧拉取负载，可选写出原始 PCM

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};

use wav_pcm_source::{
    ChunkScan, InspectOptions, Inspector, PcmFileSource, PcmFrameSource, StreamStats, QUANTUM_MS,
};

/// WAV PCM Source - stream a WAV file as 10ms PCM frames
#[derive(Parser)]
#[command(name = "wav-pcm-source")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// How to treat chunks between "fmt " and "data"
    #[arg(long, value_enum, default_value_t = ScanArg::UntilData, global = true)]
    scan: ScanArg,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show container header and payload layout
    Info {
        /// WAV file to inspect
        file: PathBuf,
    },

    /// Pull every frame until the payload is exhausted
    Stream {
        /// WAV file to stream
        file: PathBuf,

        /// Write the raw interleaved PCM of the first pass to this file
        #[arg(short, long, value_name = "RAW")]
        output: Option<PathBuf>,

        /// Number of passes (reset between passes)
        #[arg(short, long, default_value = "1")]
        passes: u32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScanArg {
    /// Skip any chunk until "data", bounded by the RIFF size
    UntilData,
    /// Skip at most one known metadata chunk (LIST, JUNK, ...)
    SingleMetadata,
}

impl From<ScanArg> for ChunkScan {
    fn from(arg: ScanArg) -> Self {
        match arg {
            ScanArg::UntilData => ChunkScan::UntilData,
            ScanArg::SingleMetadata => ChunkScan::SingleMetadata,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let options = InspectOptions {
        chunk_scan: cli.scan.into(),
    };

    match cli.command {
        Commands::Info { ref file } => show_info(file, options),
        Commands::Stream {
            ref file,
            ref output,
            passes,
        } => stream(file, options, output.as_deref(), passes),
    }
}

/// 显示头部信息
fn show_info(path: &Path, options: InspectOptions) -> anyhow::Result<()> {
    let opened = Inspector::new(options)
        .open(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let header = &opened.header;
    let layout = &opened.layout;

    println!("=== {} ===\n", path.display());
    println!("Container:    {} ({} bytes declared)", header.container_tag, header.total_size);
    println!("Form type:    {}", header.form_type_tag);
    println!(
        "Format chunk: {} ({} bytes)",
        header.format_chunk_tag, header.format_chunk_size
    );
    println!("Encoding:     {}", header.encoding());
    println!("Channels:     {}", header.channel_count);
    println!("Sample rate:  {} Hz", header.sample_rate_hz);
    println!("Bits:         {}", header.bits_per_sample);
    println!("Byte rate:    {}", header.byte_rate);
    println!("Block align:  {}", header.block_align);
    println!();
    println!("Payload:      {} bytes @ offset {}", layout.data_len, layout.data_offset);
    println!(
        "Duration:     {:.3} s",
        layout.format.duration_secs(layout.data_len)
    );
    println!(
        "Frame:        {} bytes per {} ms",
        layout.frame_bytes(),
        QUANTUM_MS
    );
    println!(
        "Pulls:        {}",
        layout.format.quanta_for(layout.data_len)
    );

    Ok(())
}

/// 拉取全部帧
fn stream(
    path: &Path,
    options: InspectOptions,
    output: Option<&Path>,
    passes: u32,
) -> anyhow::Result<()> {
    if passes == 0 {
        bail!("--passes must be at least 1");
    }

    let mut source = PcmFileSource::with_options(path, options);
    source
        .try_open()
        .with_context(|| format!("Cannot open {}", path.display()))?;

    let format = source
        .format()
        .context("Source reported open but has no format")?;

    let mut writer = match output {
        Some(out) => Some(BufWriter::new(
            File::create(out).with_context(|| format!("Cannot create {}", out.display()))?,
        )),
        None => None,
    };

    let mut stats = StreamStats::new(format);
    let mut buffer = vec![0u8; source.max_frame_len()];

    for pass in 1..=passes {
        if pass > 1 && source.reset() != 0 {
            bail!("Reset failed on pass {}", pass);
        }
        stats.reset();

        while source.has_next() {
            let len = source.get_next(&mut buffer);
            let frame = &buffer[..len];
            stats.record_frame(frame);
            if let (1, Some(w)) = (pass, writer.as_mut()) {
                w.write_all(frame).context("Write failed")?;
            }
        }

        println!("--- Pass {}/{} ---", pass, passes);
        print!("{}", stats.report());
    }

    if let Some(mut w) = writer {
        w.flush().context("Flush failed")?;
    }

    Ok(())
}
