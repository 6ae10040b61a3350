//! fray CLI
//!
//! Command-line driver around the grammar engine: reads a grammar file plus
//! optional prefix/suffix wrappers, then writes the requested number of
//! generated artifacts into an output directory as `<n>.<filetype>`.

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use fray::Generator;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fray")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Grammar-driven fuzz-case generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate artifacts from a grammar
    Generate(GenerateArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Grammar file describing the artifacts
    #[arg(short = 'i', long)]
    grammar: PathBuf,

    /// Existing directory the numbered output files are written into
    #[arg(short = 'o', long)]
    out: PathBuf,

    /// Number of artifacts to emit
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u32,

    /// Extension for the output files
    #[arg(short = 'f', long, default_value = "html")]
    filetype: String,

    /// File prepended verbatim to every artifact
    #[arg(short = 'p', long)]
    prefix: Option<PathBuf>,

    /// File appended verbatim to every artifact
    #[arg(short = 's', long)]
    suffix: Option<PathBuf>,

    /// Tab indentation applied to emitted lines and \n template escapes
    #[arg(short = 't', long, default_value_t = 0)]
    tabs: usize,

    /// PRNG seed; identical seeds replay identical runs. Defaults to the
    /// process id.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fray=info".parse().unwrap()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => {
            let seed = args.seed.unwrap_or_else(|| u64::from(process::id()));
            if let Err(e) = run_generate(&args, seed) {
                error!("{e}");
                process::exit(1);
            }
        }
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "fray", &mut io::stdout());
        }
    }
}

fn run_generate(args: &GenerateArgs, seed: u64) -> Result<(), String> {
    let source = fs::read_to_string(&args.grammar).map_err(|e| {
        format!(
            "error opening grammar file {}: {e}",
            args.grammar.display()
        )
    })?;

    if !args.out.is_dir() {
        return Err(format!(
            "output directory {} does not exist",
            args.out.display()
        ));
    }

    let prefix = read_wrapper(args.prefix.as_deref())?;
    let suffix = read_wrapper(args.suffix.as_deref())?;

    info!("using grammar {}", args.grammar.display());
    info!("using output directory {}", args.out.display());
    info!("using seed {seed}");

    let mut generator = Generator::from_grammar_text(&source, args.tabs, seed)?;

    info!("generating output");
    for n in 1..=args.count {
        let document = generator.emit_document(&prefix, &suffix)?;
        let path = args.out.join(format!("{n}.{}", args.filetype));
        fs::write(&path, document)
            .map_err(|e| format!("error writing output file {}: {e}", path.display()))?;
    }

    info!("run complete");
    Ok(())
}

fn read_wrapper(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(p) => fs::read_to_string(p)
            .map_err(|e| format!("error reading wrapper file {}: {e}", p.display())),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GRAMMAR: &str = "%section% := value\n\
                           x :=\n\
                           \thi\n\
                           \n\
                           %section% := variance\n\
                           v :=\n\
                           \t+x+\n";

    fn args(grammar: &Path, out: &Path, count: u32) -> GenerateArgs {
        GenerateArgs {
            grammar: grammar.to_path_buf(),
            out: out.to_path_buf(),
            count,
            filetype: "html".to_string(),
            prefix: None,
            suffix: None,
            tabs: 0,
            seed: Some(1),
        }
    }

    #[test]
    fn test_generate_writes_numbered_files() {
        let dir = TempDir::new().unwrap();
        let grammar_path = dir.path().join("g.fray");
        fs::write(&grammar_path, GRAMMAR).unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();

        run_generate(&args(&grammar_path, &out, 3), 1).unwrap();

        for n in 1..=3 {
            let content = fs::read_to_string(out.join(format!("{n}.html"))).unwrap();
            assert_eq!(content, "hi\n");
        }
        assert!(!out.join("4.html").exists());
    }

    #[test]
    fn test_generate_applies_wrappers() {
        let dir = TempDir::new().unwrap();
        let grammar_path = dir.path().join("g.fray");
        fs::write(&grammar_path, GRAMMAR).unwrap();
        let prefix_path = dir.path().join("prefix.txt");
        fs::write(&prefix_path, "<html>\n").unwrap();
        let suffix_path = dir.path().join("suffix.txt");
        fs::write(&suffix_path, "</html>\n").unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();

        let mut generate_args = args(&grammar_path, &out, 1);
        generate_args.filetype = "svg".to_string();
        generate_args.prefix = Some(prefix_path);
        generate_args.suffix = Some(suffix_path);
        run_generate(&generate_args, 1).unwrap();

        let content = fs::read_to_string(out.join("1.svg")).unwrap();
        assert_eq!(content, "<html>\nhi\n</html>\n");
    }

    #[test]
    fn test_missing_output_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let grammar_path = dir.path().join("g.fray");
        fs::write(&grammar_path, GRAMMAR).unwrap();
        let missing = dir.path().join("nope");

        let err = run_generate(&args(&grammar_path, &missing, 1), 1).unwrap_err();
        assert!(err.contains("output directory"));
        assert!(err.contains("does not exist"));
    }

    #[test]
    fn test_missing_grammar_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = run_generate(&args(&dir.path().join("nope.fray"), dir.path(), 1), 1).unwrap_err();
        assert!(err.contains("error opening grammar file"));
    }

    #[test]
    fn test_same_seed_same_files() {
        let grammar = "%section% := value\n\
                       d :=\n\
                       \t%range%(0-9)\n\
                       \n\
                       %section% := variance\n\
                       v :=\n\
                       \t+d++d++d+\n";
        let dir = TempDir::new().unwrap();
        let grammar_path = dir.path().join("g.fray");
        fs::write(&grammar_path, grammar).unwrap();
        let out_a = dir.path().join("a");
        let out_b = dir.path().join("b");
        fs::create_dir(&out_a).unwrap();
        fs::create_dir(&out_b).unwrap();

        run_generate(&args(&grammar_path, &out_a, 4), 77).unwrap();
        run_generate(&args(&grammar_path, &out_b, 4), 77).unwrap();

        for n in 1..=4 {
            let a = fs::read(out_a.join(format!("{n}.html"))).unwrap();
            let b = fs::read(out_b.join(format!("{n}.html"))).unwrap();
            assert_eq!(a, b);
        }
    }
}
