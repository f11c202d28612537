use anyhow::Context;
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Repo automation for tgate")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// (Re)generate JSON Schemas for the check receipt and config file.
    Schema {
        /// Output directory
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,

        /// Fail if the files on disk differ instead of rewriting them
        #[arg(long, default_value_t = false)]
        check: bool,
    },

    /// Run the "usual" repo checks (fmt, clippy, test) and regenerate schemas.
    Ci,

    /// Run the domain criterion benchmarks.
    Bench {
        /// Extra args forwarded to `cargo bench`
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Schema { out_dir, check } => cmd_schema(&out_dir, check),
        Command::Ci => cmd_ci(),
        Command::Bench { args } => cmd_bench(args),
    }
}

fn cmd_ci() -> anyhow::Result<()> {
    run("cargo", &["fmt", "--all", "--", "--check"])?;
    run(
        "cargo",
        &["clippy", "--all-targets", "--all-features", "--", "-D", "warnings"],
    )?;
    run("cargo", &["test", "--all"])?;
    cmd_schema(Path::new("schemas"), false)
}

fn cmd_bench(args: Vec<String>) -> anyhow::Result<()> {
    let mut argv = vec!["bench", "-p", "tgate-domain", "--"];
    argv.extend(args.iter().map(String::as_str));
    run("cargo", &argv)
}

fn run(bin: &str, args: &[&str]) -> anyhow::Result<()> {
    let status = std::process::Command::new(bin)
        .args(args)
        .status()
        .with_context(|| format!("running {bin}"))?;
    if !status.success() {
        anyhow::bail!("{bin} failed: {status}");
    }
    Ok(())
}

fn cmd_schema(out_dir: &Path, check: bool) -> anyhow::Result<()> {
    let schemas = [
        (
            "tgate.check.v1.schema.json",
            render(schema_for!(tgate_types::CheckReceipt))?,
        ),
        (
            "tgate.config.v1.schema.json",
            render(schema_for!(tgate_types::ConfigFile))?,
        ),
    ];

    if check {
        let stale: Vec<&str> = schemas
            .iter()
            .filter(|(name, json)| {
                fs::read(out_dir.join(name)).map_or(true, |on_disk| on_disk != *json)
            })
            .map(|(name, _)| *name)
            .collect();
        if !stale.is_empty() {
            anyhow::bail!(
                "schemas out of date: {} (run `cargo run -p xtask -- schema`)",
                stale.join(", ")
            );
        }
        return Ok(());
    }

    fs::create_dir_all(out_dir).with_context(|| format!("create dir {}", out_dir.display()))?;
    for (name, json) in &schemas {
        let path = out_dir.join(name);
        fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

fn render<T: serde::Serialize>(schema: T) -> anyhow::Result<Vec<u8>> {
    let mut json = serde_json::to_vec_pretty(&schema)?;
    json.push(b'\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_schemas_pass_their_own_drift_check() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("schemas");

        cmd_schema(&out, false).unwrap();
        assert!(out.join("tgate.check.v1.schema.json").is_file());
        assert!(out.join("tgate.config.v1.schema.json").is_file());
        cmd_schema(&out, true).unwrap();
    }

    #[test]
    fn drift_check_reports_missing_and_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("schemas");

        let err = cmd_schema(&out, true).unwrap_err();
        assert!(err.to_string().contains("tgate.check.v1.schema.json"));

        cmd_schema(&out, false).unwrap();
        fs::write(out.join("tgate.config.v1.schema.json"), "{}\n").unwrap();
        let err = cmd_schema(&out, true).unwrap_err().to_string();
        assert!(err.contains("tgate.config.v1.schema.json"));
        assert!(!err.contains("tgate.check.v1.schema.json"));
    }
}
