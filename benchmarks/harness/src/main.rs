//! ckffi-bench-harness
//!
//! Time native proof generation over circuits compiled by circomkit and
//! append CSV rows into `benchmarks/reports/bench-<unix>.csv`.
//!
//! Usage examples:
//!   cargo run -p ckffi-bench-harness -- --profile benchmarks/configs/profiles/small.toml
//!   cargo run -p ckffi-bench-harness -- --profile benchmarks/configs/profiles/compare.toml --backend direct --lib ./libcircomkit_ffi-linux-amd64.so

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use ckffi::{open_backend, BackendKind, IcicleDevice, ProofResult, ProverBackend, Settings};

#[derive(Debug, Deserialize)]
struct Profile {
    /// Circuit names under `build_dir`
    circuits: Vec<String>,
    /// Input name (witness directory) per circuit
    #[serde(default = "default_input")]
    input: String,
    /// circomkit build directory
    #[serde(default = "default_build_dir")]
    build_dir: PathBuf,
    /// Proofs per circuit
    repeats: u32,
    /// `arkworks` | `lambdaworks` | `icicle`
    #[serde(default = "default_prover")]
    prover: String,
    /// `direct` | `bridge` | `auto`
    #[serde(default)]
    backend: Option<String>,
    /// ICICLE device when `prover = "icicle"`
    #[serde(default)]
    device: Option<String>,
}

fn default_input() -> String {
    "default".to_string()
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_prover() -> String {
    "arkworks".to_string()
}

#[derive(Clone, Copy, Debug)]
enum ProverSel {
    Arkworks,
    Lambdaworks,
    Icicle(IcicleDevice),
}

impl ProverSel {
    fn parse(name: &str, device: Option<&str>) -> Result<Self> {
        Ok(match name {
            "arkworks" => Self::Arkworks,
            "lambdaworks" => Self::Lambdaworks,
            "icicle" => Self::Icicle(device.unwrap_or("CPU").parse()?),
            other => bail!("unknown prover {other} (use arkworks|lambdaworks|icicle)"),
        })
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Arkworks => "arkworks",
            Self::Lambdaworks => "lambdaworks",
            Self::Icicle(_) => "icicle",
        }
    }
}

/// Artifact paths circomkit produces for one circuit/input pair.
#[derive(Debug, PartialEq, Eq)]
struct CircuitFiles {
    wtns: PathBuf,
    r1cs: PathBuf,
    r1cs_json: PathBuf,
    pkey: PathBuf,
}

impl CircuitFiles {
    fn locate(build_dir: &Path, circuit: &str, input: &str) -> Self {
        let dir = build_dir.join(circuit);
        Self {
            wtns: dir.join(input).join("witness.wtns"),
            r1cs: dir.join(format!("{circuit}.r1cs")),
            r1cs_json: dir.join(format!("{circuit}.r1cs.json")),
            pkey: dir.join("groth16_pkey.zkey"),
        }
    }

    fn required(&self, prover: ProverSel) -> Vec<&Path> {
        match prover {
            ProverSel::Arkworks => {
                vec![self.wtns.as_path(), self.r1cs.as_path(), self.pkey.as_path()]
            }
            ProverSel::Lambdaworks => vec![self.wtns.as_path(), self.r1cs_json.as_path()],
            ProverSel::Icicle(_) => vec![self.wtns.as_path(), self.pkey.as_path()],
        }
    }
}

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

fn dur_ms(d: Duration) -> u128 {
    d.as_millis()
}

fn path_str(p: &Path) -> Result<&str> {
    p.to_str()
        .with_context(|| format!("path is not valid UTF-8: {}", p.display()))
}

/// Create `dir` and open `bench-<ts>.csv` in it, header written.
fn open_report(dir: &Path, ts: u64) -> Result<(PathBuf, fs::File)> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let csv_path = dir.join(format!("bench-{ts}.csv"));
    let mut csv = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&csv_path)
        .with_context(|| format!("open {}", csv_path.display()))?;
    writeln!(csv, "timestamp,backend,runtime,prover,circuit,repeat,ms,public_signals")?;
    Ok((csv_path, csv))
}

fn prove_once(
    backend: &dyn ProverBackend,
    prover: ProverSel,
    files: &CircuitFiles,
) -> Result<ProofResult> {
    let wtns = path_str(&files.wtns)?;
    Ok(match prover {
        ProverSel::Arkworks => {
            backend.arkworks_prove(wtns, path_str(&files.r1cs)?, path_str(&files.pkey)?)?
        }
        ProverSel::Lambdaworks => backend.lambdaworks_prove(wtns, path_str(&files.r1cs_json)?)?,
        ProverSel::Icicle(device) => backend.icicle_prove(wtns, path_str(&files.pkey)?, device)?,
    })
}

fn main() -> Result<()> {
    let profile_path =
        PathBuf::from(parse_flag("profile", "benchmarks/configs/profiles/small.toml"));
    let profile_src = fs::read_to_string(&profile_path)
        .with_context(|| format!("read profile {}", profile_path.display()))?;
    let profile: Profile = toml::from_str(&profile_src).context("parse profile toml")?;

    let prover = ProverSel::parse(&profile.prover, profile.device.as_deref())?;
    let backend_str = parse_flag("backend", profile.backend.as_deref().unwrap_or("auto"));
    let kind: BackendKind = backend_str.parse()?;

    let settings = Settings::from_env();
    let lib = match parse_flag("lib", "") {
        s if s.is_empty() => settings.lib_path()?,
        s => PathBuf::from(s),
    };
    let backend = open_backend(kind, &lib, settings.runtime)
        .with_context(|| format!("open {}", lib.display()))?;
    println!(
        "Profile: circuits={:?}, input={}, repeats={}, prover={}, backend={} ({}), runtime={}",
        profile.circuits,
        profile.input,
        profile.repeats,
        prover.label(),
        backend_str,
        backend.name(),
        settings.runtime
    );

    let ts = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let (csv_path, mut csv) = open_report(Path::new("benchmarks/reports"), ts)?;

    for circuit in &profile.circuits {
        let files = CircuitFiles::locate(&profile.build_dir, circuit, &profile.input);
        if let Some(missing) = files.required(prover).into_iter().find(|p| !p.is_file()) {
            bail!("{circuit}: missing {} (run circomkit first)", missing.display());
        }

        for rep in 0..profile.repeats {
            let t0 = Instant::now();
            let out = prove_once(backend.as_ref(), prover, &files)
                .with_context(|| format!("{circuit}: repeat {rep}"))?;
            let t_prove = t0.elapsed();
            writeln!(
                csv,
                "{ts},{},{},{},{circuit},{rep},{},{}",
                backend.name(),
                settings.runtime,
                prover.label(),
                dur_ms(t_prove),
                out.public_signals.len()
            )?;
        }
    }

    println!("Wrote report → {}", csv_path.display());
    Ok(())
}
