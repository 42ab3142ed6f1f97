//! fieldcrypt CLI - Passphrase-based document field encryption
//!
//! Encrypts the `content` field of JSON documents with AES-256-CBC under a
//! PBKDF2-derived key, and reverses the transformation.

use clap::{ArgAction, Parser, Subcommand};
use std::error::Error as _;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use fieldcrypt::document::{DemoDocumentSource, DocumentSource, JsonDocumentSource};
use fieldcrypt::envelope::IvPolicy;
use fieldcrypt::error::{ErrorCategory, ErrorKind, FieldcryptError, Result};
use fieldcrypt::file_ops;
use fieldcrypt::passphrase::{
    EnvPassphraseReader, PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader,
};

/// Environment variable holding a tracing filter directive
const LOG_ENV_VAR: &str = "FIELDCRYPT_LOG";

#[derive(Parser)]
#[command(name = "fieldcrypt")]
#[command(version)]
#[command(about = "Passphrase-based document field encryption.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of FIELDCRYPT_PASSPHRASE or the terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Increase log verbosity (-v info, -vv debug); FIELDCRYPT_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt the content of a JSON array of documents
    #[command(alias = "e")]
    Encrypt {
        /// JSON array of {id, title, content} records (default: stdin)
        #[arg(short, long, value_name = "FILE", conflicts_with = "demo")]
        input: Option<PathBuf>,

        /// Where to write the encrypted batch (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Encrypt the two built-in sample documents instead of reading input
        #[arg(long)]
        demo: bool,

        /// IV assignment: per-record (fresh IV per document) or shared (one per batch)
        #[arg(long, value_name = "POLICY", env = "FIELDCRYPT_IV_POLICY", default_value_t = IvPolicy::PerRecord)]
        iv_policy: IvPolicy,
    },

    /// Decrypt an encrypted batch back to plaintext documents
    #[command(alias = "d")]
    Decrypt {
        /// Encrypted batch produced by `encrypt` (default: stdin)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Where to write the decrypted documents (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Encrypt {
            input,
            output,
            demo,
            iv_policy,
        } => {
            if cli.passphrase_stdin && input.is_none() && !demo {
                return Err(stdin_conflict());
            }
            let mut source: Box<dyn DocumentSource> = if demo {
                Box::new(DemoDocumentSource)
            } else {
                let data = file_ops::read_input(input.as_deref())?;
                Box::new(JsonDocumentSource::new(Box::new(std::io::Cursor::new(data))))
            };
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::encrypt_documents(&mut *source, output.as_deref(), &mut *reader, iv_policy)
        }
        Commands::Decrypt { input, output } => {
            if cli.passphrase_stdin && input.is_none() {
                return Err(stdin_conflict());
            }
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::decrypt_documents(input.as_deref(), output.as_deref(), &mut *reader)
        }
    }
}

fn stdin_conflict() -> FieldcryptError {
    FieldcryptError::with_kind(
        ErrorCategory::User,
        ErrorKind::InvalidParameter,
        "--passphrase-stdin requires --input, since stdin cannot carry both",
    )
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    let env = EnvPassphraseReader::default();
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else if env.is_set() {
        Box::new(env)
    } else {
        Box::new(TerminalPassphraseReader::new())
    }
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
