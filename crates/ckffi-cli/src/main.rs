// crates/ckffi-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{Context, Result};
use ckffi::fetch::Fetcher;
use ckffi::{
    artifact_filename, io::write_proof_auto, open_backend, BackendKind, IcicleDevice,
    ProofResult, ProverBackend, Runtime, Settings,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "ckffi",
    about = "circomkit-ffi command-line bindings",
    long_about = "circomkit-ffi command-line bindings.\n\nDownload the prebuilt prover library for this machine and generate Groth16 proofs with it.\nDefaults come from CIRCOMKIT_FFI_RUNTIME, CIRCOMKIT_FFI_DIR and CIRCOMKIT_FFI_RELEASE_URL.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the artifact filename for this machine
    Filename,

    /// Download the artifact for this machine
    Download {
        /// Target directory (defaults to CIRCOMKIT_FFI_DIR, then `.`)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Download even if the file is already there
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Round-trip a string through the library
    Echo {
        /// Text to send
        input: String,

        #[command(flatten)]
        lib: LibArgs,
    },

    /// Generate a Groth16 proof
    Prove {
        #[command(subcommand)]
        prover: ProverCmd,

        #[command(flatten)]
        lib: LibArgs,

        /// Write the result here (`.cbor` or JSON); prints JSON to stdout when omitted
        #[arg(long, global = true)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ProverCmd {
    /// Arkworks prover (binary r1cs + zkey)
    Arkworks {
        /// Witness file (.wtns)
        #[arg(long)]
        wtns: PathBuf,
        /// Constraint system (.r1cs)
        #[arg(long)]
        r1cs: PathBuf,
        /// Proving key (.zkey)
        #[arg(long)]
        pkey: PathBuf,
    },
    /// Lambdaworks prover (JSON-exported r1cs)
    Lambdaworks {
        /// Witness file (.wtns)
        #[arg(long)]
        wtns: PathBuf,
        /// Constraint system exported as JSON
        #[arg(long)]
        r1cs: PathBuf,
    },
    /// ICICLE prover (unstable)
    Icicle {
        /// Witness file (.wtns)
        #[arg(long)]
        wtns: PathBuf,
        /// Proving key (.zkey)
        #[arg(long)]
        pkey: PathBuf,
        /// Device to run on
        #[arg(long, value_enum, default_value_t = DeviceOpt::Cpu)]
        device: DeviceOpt,
    },
}

/// Options shared by every command that opens the library.
#[derive(Args, Debug)]
struct LibArgs {
    /// Binding to use
    #[arg(long, value_enum, default_value_t = BackendOpt::Auto, global = true)]
    backend: BackendOpt,

    /// Runtime flag (defaults to CIRCOMKIT_FFI_RUNTIME, then `direct`)
    #[arg(long, value_enum, global = true)]
    runtime: Option<RuntimeOpt>,

    /// Explicit library path (defaults to the artifact under CIRCOMKIT_FFI_DIR)
    #[arg(long, global = true)]
    lib: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BackendOpt {
    Direct,
    Bridge,
    Auto,
}

impl From<BackendOpt> for BackendKind {
    fn from(b: BackendOpt) -> Self {
        match b {
            BackendOpt::Direct => Self::Direct,
            BackendOpt::Bridge => Self::Bridge,
            BackendOpt::Auto => Self::Auto,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RuntimeOpt {
    Direct,
    Bridged,
}

impl From<RuntimeOpt> for Runtime {
    fn from(r: RuntimeOpt) -> Self {
        match r {
            RuntimeOpt::Direct => Self::Direct,
            RuntimeOpt::Bridged => Self::Bridged,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DeviceOpt {
    Cpu,
    Cuda,
    Metal,
}

impl From<DeviceOpt> for IcicleDevice {
    fn from(d: DeviceOpt) -> Self {
        match d {
            DeviceOpt::Cpu => Self::Cpu,
            DeviceOpt::Cuda => Self::Cuda,
            DeviceOpt::Metal => Self::Metal,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.cmd {
        Cmd::Filename => {
            println!("{}", artifact_filename()?);
        }
        Cmd::Download { dir, force } => download(&settings, dir, force)?,
        Cmd::Echo { input, lib } => {
            let backend = open(&settings, &lib)?;
            println!("{}", backend.echo(&input).context("echo failed")?);
        }
        Cmd::Prove { prover, lib, out } => {
            let backend = open(&settings, &lib)?;
            let result = prove(backend.as_ref(), &prover)?;
            emit(&result, out.as_deref())?;
        }
    }

    Ok(())
}

/* -------------------------------------------------------------------------- */
/*                                   Helpers                                  */
/* -------------------------------------------------------------------------- */

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so stdout stays machine-readable.
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Ensure the parent directory of `path` exists (no-op if none).
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating parent directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn open(settings: &Settings, lib: &LibArgs) -> Result<Box<dyn ProverBackend>> {
    let runtime = lib.runtime.map_or(settings.runtime, Runtime::from);
    let path = match &lib.lib {
        Some(p) => p.clone(),
        None => settings.lib_path().context("resolving artifact path")?,
    };
    open_backend(lib.backend.into(), &path, runtime)
        .with_context(|| format!("opening {}", path.display()))
}

/* -------------------------------------------------------------------------- */
/*                                  Commands                                  */
/* -------------------------------------------------------------------------- */

fn download(settings: &Settings, dir: Option<PathBuf>, force: bool) -> Result<()> {
    let dir = dir.unwrap_or_else(|| settings.lib_dir.clone());
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let fetcher = Fetcher::from_settings(settings);
    let url = fetcher.url_for(&artifact_filename()?);
    let path = if force {
        fetcher.fetch_into(&dir)
    } else {
        fetcher.fetch_if_missing(&dir)
    }
    .with_context(|| format!("downloading {url}"))?;

    println!("{}", path.display());
    Ok(())
}

fn prove(backend: &dyn ProverBackend, prover: &ProverCmd) -> Result<ProofResult> {
    info!(backend = backend.name(), lib = %backend.path().display(), "proving");
    let result = match prover {
        ProverCmd::Arkworks { wtns, r1cs, pkey } => backend
            .arkworks_prove(&arg(wtns)?, &arg(r1cs)?, &arg(pkey)?)
            .context("arkworks prover failed")?,
        ProverCmd::Lambdaworks { wtns, r1cs } => backend
            .lambdaworks_prove(&arg(wtns)?, &arg(r1cs)?)
            .context("lambdaworks prover failed")?,
        ProverCmd::Icicle { wtns, pkey, device } => backend
            .icicle_prove(&arg(wtns)?, &arg(pkey)?, (*device).into())
            .context("icicle prover failed")?,
    };
    info!(public_signals = result.public_signals.len(), "proof generated");
    Ok(result)
}

/// Native symbols take UTF-8 paths.
fn arg(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_owned)
        .with_context(|| format!("path is not valid UTF-8: {}", path.display()))
}

fn emit(result: &ProofResult, out: Option<&Path>) -> Result<()> {
    match out {
        Some(out) => {
            ensure_parent_dir(out)?;
            write_proof_auto(out, result)
                .with_context(|| format!("writing proof result to {}", out.display()))?;
            println!("Wrote {}", out.display());
        }
        None => {
            let text = serde_json::to_string_pretty(result).context("serializing proof result")?;
            println!("{text}");
        }
    }
    Ok(())
}
