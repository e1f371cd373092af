use mrz_burst::{MrzError, ScanConfig, ScanOutcome, ScanSession};

const LINE1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
const LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";

// Each frame reads the specimen with its own OCR mistakes.
fn frames() -> Vec<Option<String>> {
    vec![
        Some(format!(
            "UTOPIA\n{}\n{}",
            LINE1.replacen("ERIKSSON", "ERIKSS0N", 1),
            LINE2
        )),
        None,
        Some(format!("{}\n{}", LINE1, LINE2.replacen("7408122", "7408132", 1))),
        Some(format!(
            "{} {}",
            LINE1.replacen("MARIA", "MAR1A", 1),
            LINE2.replacen("L898902C3", "L8989O2C3", 1)
        )),
        Some("signature page, no zone".to_string()),
        Some(format!("{}\n{}", LINE1.replacen("UTO", "UT0", 1), LINE2)),
    ]
}

fn main() -> Result<(), MrzError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    println!("MRZ Burst Demo");
    println!("--------------");

    let mut session = ScanSession::new(ScanConfig::default())?;

    for (index, frame) in frames().iter().enumerate() {
        let outcome = session.process_frame(frame.as_deref());
        print!("frame {}: ", index + 1);
        match &outcome {
            ScanOutcome::NoCandidate => println!("no usable zone"),
            ScanOutcome::Pending { frames, needed } => {
                println!("holding {} of {} frames", frames, needed)
            }
            ScanOutcome::LowConfidence { consensus, threshold } => {
                println!("consensus confidence {} of {}", consensus.confidence, threshold);
                println!("{}", consensus.result);
            }
            ScanOutcome::Rejected { error, .. } => println!("consensus rejected: {}", error),
            ScanOutcome::Accepted { data, consensus } => {
                println!("accepted with confidence {}", consensus.confidence);
                println!("\nDOCUMENT:");
                println!("  Number:      {}", data.document_number);
                println!("  Holder:      {}, {}", data.last_name, data.first_name);
                println!("  Nationality: {}", data.nationality);
                println!("  Born:        {}", data.date_of_birth);
                println!("  Expires:     {}", data.expiry_date);
                println!("\n{}", data.mrz_string);
                return Ok(());
            }
        }
    }

    println!("no consensus reached");
    Ok(())
}
