use std::fs;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

const LAMBDA_PACKAGE: &str = "inventory_lambda";
const LAMBDA_BINARIES: [&str; 3] = ["load_inventory", "get_inventory_api", "notify_low_stock"];
const DEFAULT_ARTIFACTS_DIR: &str = "target/lambda";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the inventory pipeline workspace",
    long_about = "A unified CLI for staging Lambda artifacts, deploying and tearing\n\
                  down the inventory pipeline, and running CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the Lambda binaries and stage each as <out-dir>/<function>/bootstrap
    PackageLambdas {
        #[command(flatten)]
        build: LambdaBuild,
    },
    /// Stage the Lambda binaries, then run `inventory_infra deploy`
    Deploy {
        #[command(flatten)]
        build: LambdaBuild,
        /// Extra arguments passed to `inventory_infra deploy`
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Run `inventory_infra teardown`
    Teardown {
        /// Extra arguments passed to `inventory_infra teardown`
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Run CI checks (fmt, clippy, tests, lambda build)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(clap::Args)]
struct LambdaBuild {
    /// Compilation target triple for Lambda binaries
    #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
    target: String,
    /// Build profile used for binaries
    #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
    profile: BuildProfile,
    /// Directory receiving one sub-directory per function
    #[arg(long, env = "LAMBDA_ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    out_dir: String,
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build and stage the Lambda binaries
    Lambdas,
    /// Run check + lambdas
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_infra(subcommand: &str, extra: &[String]) {
    let mut args = vec!["run", "-p", "inventory_infra", "--", subcommand];
    args.extend(extra.iter().map(String::as_str));
    run_cargo(&args);
}

fn package_lambdas(build: &LambdaBuild) {
    let target = build.target.as_str();
    ensure_rust_target_installed(target);
    ensure_c_linker_available(target);

    step("Build inventory lambda binaries");
    let mut cargo_args = vec!["build", "-p", LAMBDA_PACKAGE, "--target", target];
    for bin in LAMBDA_BINARIES {
        cargo_args.extend(["--bin", bin]);
    }
    if let Some(flag) = build.profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Stage bootstrap artifacts");
    let target_dir = Path::new("target").join(target).join(build.profile.dir_name());
    let out_dir = Path::new(&build.out_dir);
    let mut staged = Vec::new();
    for bin in LAMBDA_BINARIES {
        let function_dir = out_dir.join(bin);
        stage_bootstrap(&target_dir.join(binary_name(bin, target)), &function_dir);
        staged.push(function_dir.join("bootstrap"));
    }

    eprintln!("\nStaged artifacts:");
    for path in staged {
        eprintln!("- {}", path.display());
    }
}

fn stage_bootstrap(binary_path: &Path, function_dir: &Path) {
    if !binary_path.exists() {
        panic!("expected lambda binary at '{}'", binary_path.display());
    }

    fs::create_dir_all(function_dir).expect("failed to create lambda artifact directory");
    let bootstrap = function_dir.join("bootstrap");
    fs::copy(binary_path, &bootstrap).expect("failed to copy lambda binary");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&bootstrap, fs::Permissions::from_mode(0o755))
            .expect("failed to mark bootstrap executable");
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- package-lambdas`"
        );
    }
}

fn ensure_c_linker_available(target: &str) {
    if !cfg!(windows) || !target.ends_with("unknown-linux-gnu") {
        return;
    }

    let env_override_keys = [
        format!("CC_{}", target.replace('-', "_")),
        format!("CC_{target}"),
        "TARGET_CC".to_string(),
        "CC".to_string(),
    ];

    for key in env_override_keys {
        if let Ok(value) = std::env::var(&key) {
            let candidate = value.trim();
            if candidate.is_empty() {
                continue;
            }
            if tool_works(candidate) {
                return;
            }
        }
    }

    let canonical = "x86_64-linux-gnu-gcc";
    if tool_works(canonical) {
        return;
    }

    panic!(
        "missing C cross-linker for target `{target}`. install `{canonical}` (or set CC_x86_64_unknown_linux_gnu) before running `cargo run -p xtask -- package-lambdas`.\n\
         Tip: the AWS SDK's TLS stack needs a Linux C toolchain when cross-compiling from Windows."
    );
}

fn tool_works(program: &str) -> bool {
    let mut parts = program.split_whitespace();
    let Some(bin) = parts.next() else {
        return false;
    };
    let args: Vec<&str> = parts.collect();

    Command::new(bin)
        .args(&args)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test inventory_core");
    run_cargo(&["test", "-p", "inventory_core"]);

    step("Test inventory_lambda");
    run_cargo(&["test", "-p", "inventory_lambda"]);

    step("Test inventory_infra");
    run_cargo(&["test", "-p", "inventory_infra"]);
}

fn ci_lambdas() {
    package_lambdas(&LambdaBuild {
        target: "x86_64-unknown-linux-gnu".to_string(),
        profile: BuildProfile::Debug,
        out_dir: DEFAULT_ARTIFACTS_DIR.to_string(),
    });
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::PackageLambdas { build } => package_lambdas(&build),
        Commands::Deploy { build, args } => {
            package_lambdas(&build);
            step("Deploy inventory pipeline");
            let mut args = args;
            if !args.iter().any(|arg| arg.starts_with("--artifacts-dir")) {
                args.extend(["--artifacts-dir".to_string(), build.out_dir.clone()]);
            }
            run_infra("deploy", &args);
        }
        Commands::Teardown { args } => {
            step("Tear down inventory pipeline");
            run_infra("teardown", &args);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Lambdas => ci_lambdas(),
                CiJob::All => {
                    ci_check();
                    ci_lambdas();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
