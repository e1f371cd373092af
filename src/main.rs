// Reads OCR text and prints the decoded machine readable zone.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error};
use serde::Serialize;
use serde_json::json;

use mrz_burst::models::{MrzData, ValidationIssue};
use mrz_burst::validation::{ExpiryValidator, FormatValidator};
use mrz_burst::{AccessKey, MrzError, ScanConfig, ScanOutcome, ScanSession};

#[derive(Parser, Debug)]
#[command(name = "mrzscan", version)]
#[command(about = "Extract and validate ICAO 9303 MRZ data from OCR text", long_about = None)]
struct Cli {
    /// OCR text files, one frame per file. Reads stdin when none are given.
    files: Vec<PathBuf>,

    /// Vote a consensus across all frames instead of decoding the first good one
    #[arg(long)]
    burst: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Line that separates frames on stdin
    #[arg(long, default_value = "---")]
    separator: String,

    /// Manually entered document number; skips scanning
    #[arg(long, requires = "birth_date", requires = "expiry_date")]
    document_number: Option<String>,

    /// Manually entered date of birth (YYMMDD)
    #[arg(long, requires = "document_number")]
    birth_date: Option<String>,

    /// Manually entered date of expiry (YYMMDD)
    #[arg(long, requires = "document_number")]
    expiry_date: Option<String>,

    /// Path to a JSON scan configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<bool, MrzError> {
    let manual_key = (&cli.document_number, &cli.birth_date, &cli.expiry_date);
    if let (Some(number), Some(birth), Some(expiry)) = manual_key {
        let key = AccessKey::manual(number, birth, expiry)?;
        print_access_key(&key, cli.json)?;
        return Ok(true);
    }

    let config = match &cli.config {
        Some(path) => ScanConfig::from_json_file(path)?,
        None => ScanConfig::default(),
    };
    let mut session = ScanSession::new(config)?;
    let frames = read_frames(cli)?;
    debug!("read {} frame(s)", frames.len());

    let data = if cli.burst {
        run_burst(&mut session, &frames)
    } else {
        run_single(&session, &frames)
    };

    match data {
        Some(data) => {
            print_record(&data, cli.json)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn run_single(session: &ScanSession, frames: &[String]) -> Option<MrzData> {
    let mut last_error = MrzError::NoCandidateFound;
    for (index, frame) in frames.iter().enumerate() {
        match session.scan_once(frame) {
            Ok(data) => return Some(data),
            Err(err) => {
                debug!("frame {}: {}", index + 1, err);
                last_error = err;
            }
        }
    }
    eprintln!("No MRZ found: {}", last_error);
    None
}

fn run_burst(session: &mut ScanSession, frames: &[String]) -> Option<MrzData> {
    for (index, frame) in frames.iter().enumerate() {
        let outcome = session.process_frame(Some(frame.as_str()));
        match &outcome {
            ScanOutcome::Accepted { data, consensus } => {
                eprintln!("frame {}: accepted (confidence {})", index + 1, consensus.confidence);
                return Some(data.clone());
            }
            other => {
                if let Some(err) = other.error() {
                    eprintln!("frame {}: {}", index + 1, err);
                }
            }
        }
    }
    eprintln!("No consensus reached after {} frame(s)", frames.len());
    None
}

fn read_frames(cli: &Cli) -> Result<Vec<String>, MrzError> {
    if !cli.files.is_empty() {
        return cli
            .files
            .iter()
            .map(|path| {
                fs::read_to_string(path)
                    .map_err(|e| MrzError::Io(format!("Failed to read {}: {}", path.display(), e)))
            })
            .collect();
    }

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(split_frames(&input, &cli.separator))
}

fn split_frames(input: &str, separator: &str) -> Vec<String> {
    let mut frames = vec![String::new()];
    for line in input.lines() {
        if line.trim() == separator {
            frames.push(String::new());
        } else if let Some(frame) = frames.last_mut() {
            frame.push_str(line);
            frame.push('\n');
        }
    }
    frames.retain(|frame| !frame.trim().is_empty());
    frames
}

/// Output failures are I/O errors, not configuration errors.
fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, MrzError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| MrzError::Io(format!("Failed to write JSON output: {}", e)))
}

fn print_access_key(key: &AccessKey, as_json: bool) -> Result<(), MrzError> {
    if as_json {
        println!("{}", to_json(key)?);
    } else {
        println!("ACCESS KEY:");
        println!("  Document Number: {}", key.document_number);
        println!("  Date of Birth:   {}", key.date_of_birth_yymmdd);
        println!("  Date of Expiry:  {}", key.date_of_expiry_yymmdd);
    }
    Ok(())
}

fn print_record(data: &MrzData, as_json: bool) -> Result<(), MrzError> {
    let format_check = FormatValidator::validate(data);
    let expiry_check = ExpiryValidator::validate_today(data);
    let issues: Vec<&ValidationIssue> = format_check
        .issues
        .iter()
        .chain(expiry_check.issues.iter())
        .collect();
    let key = data.access_key();

    if as_json {
        let report = json!({
            "data": data,
            "access_key": key,
            "issues": issues,
        });
        println!("{}", to_json(&report)?);
        return Ok(());
    }

    println!("\n===============================================");
    println!("          MRZ {} DETAILED REPORT", data.format);
    println!("===============================================\n");
    println!("  Document Type:   {}", data.document_type);
    println!("  Issuing Country: {}", data.country_code);
    println!("  Document Number: {}", data.document_number);
    println!("  Surname:         {}", data.last_name);
    println!("  Given Names:     {}", data.first_name);
    println!("  Nationality:     {}", data.nationality);
    println!("  Date of Birth:   {}", data.date_of_birth);
    println!("  Sex:             {}", data.sex);
    println!("  Date of Expiry:  {}", data.expiry_date);
    println!("  Personal Number: {}", data.personal_number);
    println!(
        "  Composite Check: {}",
        if data.composite_valid { "PASSED" } else { "FAILED" }
    );

    println!();
    print_access_key(&key, false)?;

    if !issues.is_empty() {
        println!("\nISSUES FOUND:");
        for issue in issues {
            println!("  - [{}] {}", issue.issue_type, issue.message);
        }
    }

    println!("\nMRZ:\n{}", data.mrz_string);
    Ok(())
}
