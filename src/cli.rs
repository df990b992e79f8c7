// Idiomatic Rust CLI for Oxiblt.
//
// Subcommands cover the reconciliation workflow end to end: build a table
// from a record list, subtract a peer's table, decode the difference, and
// inspect tables on disk.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::config::{DEFAULT_DIGEST_LEN, DEFAULT_HASH_COUNT, HashKey, MAX_DIGEST_LEN, TableShape};
use crate::io::{self as fio, RecordFormat, TableStats};
use crate::peel::{DecodeOptions, ExpectedCounts};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Difference size assumed when neither `--buckets` nor `--expected-diff` is given.
const DEFAULT_EXPECTED_DIFF: usize = 32;

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Invertible Bloom Lookup Table builder and decoder.
#[derive(Parser, Debug)]
#[command(
    name = "oxiblt",
    version,
    about = "IBLT set reconciliation tool",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,

    /// Hash key as K0:K1 (decimal or 0x-hex halves).
    #[arg(long, global = true, default_value_t = HashKey::default())]
    key: HashKey,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Build a table from a record list.
    Build(BuildArgs),
    /// Subtract table B from table A.
    Subtract(SubtractArgs),
    /// Decode a (subtracted) table into its difference.
    Decode(DecodeArgs),
    /// Print shape and occupancy of a table.
    Info(InfoArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Raw,
    Hex,
}

impl From<FormatArg> for RecordFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Raw => RecordFormat::Raw,
            FormatArg::Hex => RecordFormat::Hex,
        }
    }
}

#[derive(Args, Debug)]
struct ShapeArgs {
    /// Record length in bytes.
    #[arg(long = "record-len", short = 'r', value_parser = clap::value_parser!(u16).range(1..))]
    record_len: u16,

    /// Bucket count (overrides --expected-diff).
    #[arg(long, short = 'b', value_parser = clap::value_parser!(u16).range(1..))]
    buckets: Option<u16>,

    /// Size the table for about this many differing records.
    #[arg(long = "expected-diff", conflicts_with = "buckets")]
    expected_diff: Option<usize>,

    /// Truncated digest length in bytes.
    #[arg(long = "digest-len", value_parser = clap::value_parser!(u16).range(1..=MAX_DIGEST_LEN as i64), default_value_t = DEFAULT_DIGEST_LEN as u16)]
    digest_len: u16,

    /// Buckets per record.
    #[arg(long = "hash-count", value_parser = clap::value_parser!(u16).range(1..), default_value_t = DEFAULT_HASH_COUNT as u16)]
    hash_count: u16,
}

impl ShapeArgs {
    fn shape(&self) -> TableShape {
        let record_len = self.record_len as usize;
        let mut shape = TableShape::for_expected_diff(
            self.expected_diff.unwrap_or(DEFAULT_EXPECTED_DIFF),
            record_len,
        );
        if let Some(b) = self.buckets {
            shape.bucket_count = b as usize;
        }
        shape.digest_len = self.digest_len as usize;
        shape.hash_count = self.hash_count as usize;
        shape
    }
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[command(flatten)]
    shape: ShapeArgs,

    /// Record list format.
    #[arg(long, value_enum, default_value_t = FormatArg::Hex)]
    format: FormatArg,

    /// Record list (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output table file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Record list (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output table file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SubtractArgs {
    /// Table to subtract from.
    #[arg(value_hint = ValueHint::FilePath)]
    a: PathBuf,

    /// Table to subtract.
    #[arg(value_hint = ValueHint::FilePath)]
    b: PathBuf,

    /// Output table file (default: stdout).
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Table to decode (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Expected number of records only in A.
    #[arg(long = "expect-alpha", requires = "expect_beta")]
    expect_alpha: Option<usize>,

    /// Expected number of records only in B.
    #[arg(long = "expect-beta", requires = "expect_alpha")]
    expect_beta: Option<usize>,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Table file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Global options
// ---------------------------------------------------------------------------

struct Options {
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    key: HashKey,
}

fn split_cli(cli: Cli) -> (Options, Cmd) {
    let opts = Options {
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        key: cli.key,
    };
    (opts, cli.command)
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("oxiblt".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = split_cli(cli);
    }
}

fn print_json(value: serde_json::Value) {
    match serde_json::to_string_pretty(&value) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => eprintln!("oxiblt: json: {e}"),
    }
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

fn open_input(path: Option<&Path>) -> io::Result<Box<dyn Read>> {
    Ok(match path {
        Some(p) => Box::new(BufReader::with_capacity(BUF_SIZE, File::open(p)?)),
        None => Box::new(BufReader::new(io::stdin())),
    })
}

fn write_output(opts: &Options, path: Option<&Path>, data: &[u8]) -> Result<(), String> {
    match path {
        Some(p) => {
            if p.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    p.display()
                ));
            }
            std::fs::write(p, data).map_err(|e| format!("output file: {}: {e}", p.display()))
        }
        None => {
            let mut out = BufWriter::with_capacity(BUF_SIZE, io::stdout().lock());
            out.write_all(data)
                .and_then(|()| out.flush())
                .map_err(|e| format!("write: {e}"))
        }
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("oxiblt version {version} (Rust), Copyright (C) oxiblt contributors");
    eprintln!("Licensed under the MIT License");

    eprintln!("DEFAULT_HASH_COUNT={DEFAULT_HASH_COUNT}");
    eprintln!("DEFAULT_DIGEST_LEN={DEFAULT_DIGEST_LEN}");
    eprintln!("MAX_DIGEST_LEN={MAX_DIGEST_LEN}");
    eprintln!("BUCKETS_PER_DIFF={}", crate::config::BUCKETS_PER_DIFF);
    eprintln!("INDEX_RETRY_FACTOR={}", crate::config::INDEX_RETRY_FACTOR);
    eprintln!("PEEL_STEP_FACTOR={}", crate::config::PEEL_STEP_FACTOR);
    eprintln!("DEFAULT_KEY={}", HashKey::default());

    0
}

// ---------------------------------------------------------------------------
// Build command
// ---------------------------------------------------------------------------

fn cmd_build(opts: &Options, args: BuildArgs) -> i32 {
    let shape = args.shape.shape();
    let input = args.input.or(args.input_pos);
    let output = args.output.or(args.output_pos);

    let reader = match open_input(input.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("oxiblt: input: {e}");
            return 1;
        }
    };
    let records = match fio::read_records(reader, args.format.into(), shape.record_len) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("oxiblt: build: {e}");
            return 1;
        }
    };
    let table = match fio::build_table(records.iter().map(Vec::as_slice), shape, opts.key) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("oxiblt: build: {e}");
            return 1;
        }
    };
    let data = match table.serialize() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("oxiblt: build: {e}");
            return 1;
        }
    };
    if let Err(e) = write_output(opts, output.as_deref(), &data) {
        eprintln!("oxiblt: {e}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxiblt: build: {} records, {} buckets, {} occupied, {} bytes",
            records.len(),
            shape.bucket_count,
            table.occupied(),
            data.len()
        );
    }
    if opts.json_output {
        print_json(serde_json::json!({
            "command": "build",
            "records": records.len(),
            "bucket_count": shape.bucket_count,
            "record_len": shape.record_len,
            "digest_len": shape.digest_len,
            "hash_count": shape.hash_count,
            "occupied": table.occupied(),
            "wire_len": data.len(),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Subtract command
// ---------------------------------------------------------------------------

fn cmd_subtract(opts: &Options, args: SubtractArgs) -> i32 {
    let mut a = match fio::load_table(&args.a, opts.key) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("oxiblt: {}: {e}", args.a.display());
            return 1;
        }
    };
    let b = match fio::load_table(&args.b, opts.key) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("oxiblt: {}: {e}", args.b.display());
            return 1;
        }
    };
    if let Err(e) = a.subtract(&b) {
        eprintln!("oxiblt: subtract: {e}");
        return 1;
    }
    let data = match a.serialize() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("oxiblt: subtract: {e}");
            return 1;
        }
    };
    if let Err(e) = write_output(opts, args.output.as_deref(), &data) {
        eprintln!("oxiblt: {e}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxiblt: subtract: {} occupied, {} pure",
            a.occupied(),
            a.pure_count()
        );
    }
    if opts.json_output {
        print_json(serde_json::json!({
            "command": "subtract",
            "occupied": a.occupied(),
            "pure": a.pure_count(),
            "wire_len": data.len(),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Decode command
// ---------------------------------------------------------------------------

fn cmd_decode(opts: &Options, args: DecodeArgs) -> i32 {
    let mut data = Vec::new();
    let read = open_input(args.input.as_deref()).and_then(|mut r| r.read_to_end(&mut data));
    if let Err(e) = read {
        eprintln!("oxiblt: input: {e}");
        return 1;
    }
    let table = match crate::table::Table::deserialize_with_key(&data, opts.key) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("oxiblt: decode: {e}");
            return 1;
        }
    };

    let expected = match (args.expect_alpha, args.expect_beta) {
        (Some(alpha), Some(beta)) => Some(ExpectedCounts { alpha, beta }),
        _ => None,
    };
    let decode_opts = DecodeOptions {
        expected,
        ..Default::default()
    };
    let diff = match table.decode_with(&decode_opts) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("oxiblt: decode: {e}");
            return 1;
        }
    };

    let mut out = BufWriter::with_capacity(BUF_SIZE, io::stdout().lock());
    let lines = diff
        .alpha()
        .iter()
        .map(|r| ('+', r))
        .chain(diff.beta().iter().map(|r| ('-', r)));
    for (sign, record) in lines {
        if let Err(e) = writeln!(out, "{sign}{}", fio::record_hex(record)) {
            eprintln!("oxiblt: write: {e}");
            return 1;
        }
    }
    if let Err(e) = out.flush() {
        eprintln!("oxiblt: write flush error: {e}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxiblt: decode: {} only in A, {} only in B",
            diff.alpha_len(),
            diff.beta_len()
        );
    }
    if opts.json_output {
        print_json(serde_json::json!({
            "command": "decode",
            "alpha": diff.alpha_len(),
            "beta": diff.beta_len(),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Info command
// ---------------------------------------------------------------------------

fn cmd_info(opts: &Options, args: InfoArgs) -> i32 {
    let table = match fio::load_table(&args.input, opts.key) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("oxiblt: {}: {e}", args.input.display());
            return 1;
        }
    };
    let stats = TableStats::of(&table);

    if opts.json_output {
        print_json(serde_json::json!({
            "command": "info",
            "bucket_count": stats.shape.bucket_count,
            "record_len": stats.shape.record_len,
            "digest_len": stats.shape.digest_len,
            "hash_count": stats.shape.hash_count,
            "occupied": stats.occupied,
            "pure": stats.pure,
            "wire_len": stats.wire_len,
        }));
        return 0;
    }

    if !opts.quiet {
        println!("bucket count:   {}", stats.shape.bucket_count);
        println!("record length:  {}", stats.shape.record_len);
        println!("digest length:  {}", stats.shape.digest_len);
        println!("hash count:     {}", stats.shape.hash_count);
        println!("occupied:       {}", stats.occupied);
        println!("pure:           {}", stats.pure);
        println!("wire length:    {}", stats.wire_len);
        if opts.verbose > 1 {
            for (i, bucket) in table.buckets().filter(|(_, b)| !b.is_empty()) {
                println!("  [{i:5}] {bucket}");
            }
        }
    }

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let (opts, cmd) = split_cli(Cli::parse());

    let exit_code = match cmd {
        Cmd::Build(args) => cmd_build(&opts, args),
        Cmd::Subtract(args) => cmd_subtract(&opts, args),
        Cmd::Decode(args) => cmd_decode(&opts, args),
        Cmd::Info(args) => cmd_info(&opts, args),
        Cmd::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> (Options, Cmd) {
        let argv: Vec<String> = std::iter::once("oxiblt".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        split_cli(Cli::try_parse_from(argv).expect("cli parse failed"))
    }

    #[test]
    fn build_subcommand_maps_correctly() {
        let (_, cmd) = parse(&[
            "build",
            "--record-len",
            "4",
            "--buckets",
            "120",
            "--digest-len",
            "2",
            "--format",
            "raw",
            "in.bin",
            "out.iblt",
        ]);
        let Cmd::Build(args) = cmd else {
            panic!("expected build");
        };
        assert_eq!(args.shape.shape(), TableShape::new(120, 4, 2, 4));
        assert_eq!(args.format, FormatArg::Raw);
        assert_eq!(args.input_pos, Some(PathBuf::from("in.bin")));
        assert_eq!(args.output_pos, Some(PathBuf::from("out.iblt")));
    }

    #[test]
    fn expected_diff_sizes_table() {
        let (_, cmd) = parse(&["build", "-r", "8", "--expected-diff", "50"]);
        let Cmd::Build(args) = cmd else {
            panic!("expected build");
        };
        assert_eq!(args.shape.shape().bucket_count, 200);
    }

    #[test]
    fn buckets_conflict_with_expected_diff() {
        let argv = ["oxiblt", "build", "-r", "4", "-b", "10", "--expected-diff", "3"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn digest_len_bounded() {
        assert!(Cli::try_parse_from(["oxiblt", "build", "-r", "4", "--digest-len", "9"]).is_err());
        assert!(Cli::try_parse_from(["oxiblt", "build", "-r", "0"]).is_err());
    }

    #[test]
    fn global_flags_and_key() {
        let (opts, cmd) = parse(&["--force", "--json", "--key", "1:0x2", "info", "t.iblt"]);
        assert!(opts.force);
        assert!(opts.json_output);
        assert_eq!(opts.key, HashKey::new(1, 2));
        assert!(matches!(cmd, Cmd::Info(_)));
    }

    #[test]
    fn default_key() {
        let (opts, _) = parse(&["config"]);
        assert_eq!(opts.key, HashKey::default());
    }

    #[test]
    fn verbose_is_capped() {
        let (opts, _) = parse(&["-v", "-v", "-v", "config"]);
        assert_eq!(opts.verbose, 2);
    }

    #[test]
    fn decode_expectations_come_in_pairs() {
        let (_, cmd) = parse(&["decode", "--expect-alpha", "3", "--expect-beta", "4", "d.iblt"]);
        let Cmd::Decode(args) = cmd else {
            panic!("expected decode");
        };
        assert_eq!((args.expect_alpha, args.expect_beta), (Some(3), Some(4)));

        assert!(Cli::try_parse_from(["oxiblt", "decode", "--expect-alpha", "3", "d"]).is_err());
    }

    #[test]
    fn subtract_args() {
        let (_, cmd) = parse(&["subtract", "a.iblt", "b.iblt", "-o", "d.iblt"]);
        let Cmd::Subtract(args) = cmd else {
            panic!("expected subtract");
        };
        assert_eq!(args.a, PathBuf::from("a.iblt"));
        assert_eq!(args.b, PathBuf::from("b.iblt"));
        assert_eq!(args.output, Some(PathBuf::from("d.iblt")));
    }
}
