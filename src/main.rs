// lplc: LPL to SSM assembly compiler

use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::Level;

use lplc::compile_source;
use lplc::config::{CompilerConfig, ShadowPolicy, MAX_WORD_SIZE};

struct Options {
    input: String,
    output: Option<String>,
    config: CompilerConfig,
    verbosity: u8,
}

fn usage(program_name: &str) {
    eprintln!(
        "Usage: {} [-o <out.ssm>] [--word-size <n>] [--shadowing allow|warn|reject] [-v|-vv] <file.lpl>",
        program_name
    );
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} demo.lpl              # Print the assembly to stdout", program_name);
    eprintln!("  {} -o demo.ssm demo.lpl  # Write it to a file", program_name);
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut input = None;
    let mut output = None;
    let mut config = CompilerConfig::default();
    let mut verbosity = 0;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" => {
                let path = iter.next().ok_or("-o needs an output path")?;
                output = Some(path.clone());
            }
            "--word-size" => {
                let value = iter.next().ok_or("--word-size needs a value")?;
                let word_size = value
                    .parse::<i32>()
                    .ok()
                    .filter(|n| (1..=MAX_WORD_SIZE).contains(n))
                    .ok_or_else(|| {
                        format!("invalid word size '{}' (expected 1..={})", value, MAX_WORD_SIZE)
                    })?;
                config = config.with_word_size(word_size);
            }
            "--shadowing" => {
                let value = iter.next().ok_or("--shadowing needs a policy")?;
                config = config.with_shadowing(ShadowPolicy::from_str(value)?);
            }
            "-v" => verbosity = verbosity.max(1),
            "-vv" => verbosity = 2,
            flag if flag.starts_with('-') => return Err(format!("unknown option '{}'", flag)),
            path => {
                if input.replace(path.to_string()).is_some() {
                    return Err("only one input file can be compiled at a time".to_string());
                }
            }
        }
    }

    Ok(Options {
        input: input.ok_or("No input file provided")?,
        output,
        config,
        verbosity,
    })
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("lplc");

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            usage(program_name);
            std::process::exit(1);
        }
    };

    init_logging(options.verbosity);

    if !Path::new(&options.input).exists() {
        eprintln!("Error: File '{}' not found", options.input);
        std::process::exit(1);
    }

    let source = match fs::read_to_string(&options.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", options.input, e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        input = %options.input,
        word_size = options.config.word_size,
        shadowing = %options.config.shadowing,
        "compiling"
    );

    let assembly = match compile_source(&source, &options.config) {
        Ok(assembly) => assembly,
        Err(e) => {
            eprintln!("{}: {}", options.input, e);
            std::process::exit(1);
        }
    };

    match &options.output {
        Some(path) => {
            if let Err(e) = fs::write(path, assembly.to_string()) {
                eprintln!("Error: cannot write '{}': {}", path, e);
                std::process::exit(1);
            }
            tracing::info!(output = %path, instructions = assembly.len(), "wrote assembly");
        }
        None => print!("{}", assembly),
    }
}
