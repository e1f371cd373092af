use mrz_burst::processing::normalizer::normalize;
use mrz_burst::processing::{BurstAggregator, CandidateScanner, FieldExtractor};
use mrz_burst::{AccessKey, MrzError, MrzFormat, MrzResult, ScanConfig, ScanOutcome, ScanSession};

const TD3_LINE1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
const TD3_LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";

const TD1_LINE1: &str = "I<UTOD231458907<<<<<<<<<<<<<<<";
const TD1_LINE2: &str = "7408122F1204159UTO<<<<<<<<<<<6";
const TD1_LINE3: &str = "ERIKSSON<<ANNA<MARIA<<<<<<<<<<";

fn put(line: &str, index: usize, c: char) -> String {
    line.chars()
        .enumerate()
        .map(|(i, original)| if i == index { c } else { original })
        .collect()
}

/// Specimen frames as an OCR engine might read them: line 1 noise in a
/// different column each time, two correctable line 2 misreads and one
/// frame with a birth date no single swap can repair.
fn noisy_frames() -> Vec<MrzResult> {
    vec![
        MrzResult::td3(put(TD3_LINE1, 7, '1'), TD3_LINE2),
        MrzResult::td3(put(TD3_LINE1, 17, '0'), put(TD3_LINE2, 5, 'O')),
        MrzResult::td3(put(TD3_LINE1, 30, 'K'), TD3_LINE2),
        MrzResult::td3(TD3_LINE1, put(TD3_LINE2, 16, '3')),
        MrzResult::td3(put(TD3_LINE1, 2, '0'), TD3_LINE2),
        MrzResult::td3(
            put(&put(TD3_LINE1, 10, '5'), 21, '4'),
            TD3_LINE2.replacen("ZE184226B", "ZE1B4226B", 1),
        ),
    ]
}

#[test]
fn test_icao_sample_end_to_end() {
    let text = format!("{}\n{}", TD3_LINE1, TD3_LINE2);
    let candidates = CandidateScanner::find_candidates(&text);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].format, MrzFormat::TD3);
    assert_eq!(candidates[0].score, 4);

    let data = FieldExtractor::with_reference_year(2026)
        .extract_candidate(&candidates[0])
        .unwrap();
    assert_eq!(data.last_name, "ERIKSSON");
    assert_eq!(data.first_name, "ANNA MARIA");
    assert_eq!(data.document_number, "L898902C3");
    assert_eq!(data.date_of_birth, "1974-08-12");
    assert_eq!(data.expiry_date, "2012-04-15");
    assert_eq!(data.sex, "F");
    assert_eq!(data.nationality, "UTO");
    assert_eq!(data.mrz_string, text);
}

#[test]
fn test_td3_round_trip() {
    let line1 = "P<D<<MUSTERMANN<<ERIKA<<<<<<<<<<<<<<<<<<<<<<";
    let line2 = "C01X00T478D<<6408125F2702283<<<<<<<<<<<<<<<4";
    let text = MrzResult::td3(line1, line2).to_mrz_text();

    let best = CandidateScanner::best_candidate(&text).unwrap();
    let data = FieldExtractor::with_reference_year(2030)
        .extract_candidate(&best)
        .unwrap();
    assert_eq!(data.country_code, "D");
    assert_eq!(data.nationality, "D");
    assert_eq!(data.last_name, "MUSTERMANN");
    assert_eq!(data.first_name, "ERIKA");
    assert_eq!(data.document_number, "C01X00T47");
    assert_eq!(data.date_of_birth, "1964-08-12");
    assert_eq!(data.expiry_date, "2027-02-28");
    assert_eq!(data.personal_number, "");
    assert_eq!(data.mrz_string, text);

    let rescanned = CandidateScanner::best_candidate(&data.mrz_string).unwrap();
    assert_eq!(rescanned, best);
}

#[test]
fn test_td1_round_trip() {
    let text = format!("{}\n{}\n{}", TD1_LINE1, TD1_LINE2, TD1_LINE3);
    let best = CandidateScanner::best_candidate(&text).unwrap();
    assert_eq!(best.format, MrzFormat::TD1);
    assert_eq!(best.score, 4);
    assert_eq!(best.line3.as_deref(), Some(TD1_LINE3));

    let data = FieldExtractor::with_reference_year(2026)
        .extract_candidate(&best)
        .unwrap();
    assert_eq!(data.document_type, "I");
    assert_eq!(data.document_number, "D23145890");
    assert_eq!(data.date_of_birth, "1974-08-12");
    assert_eq!(data.expiry_date, "2012-04-15");
    assert_eq!(data.last_name, "ERIKSSON");
    assert_eq!(data.first_name, "ANNA MARIA");
    assert_eq!(data.mrz_string, text);
}

#[test]
fn test_zone_without_line_breaks_inside_noise() {
    let text = format!("REPUBLIC OF UTOPIA PASSPORT {}{} 0000", TD3_LINE1, TD3_LINE2);
    let best = CandidateScanner::best_candidate(&text).unwrap();
    assert_eq!(best.line1, TD3_LINE1);
    assert_eq!(best.line2, TD3_LINE2);
    assert_eq!(best.score, 4);
}

#[test]
fn test_two_misreads_in_one_field_are_not_repaired() {
    let noisy = TD3_LINE2.replacen("L898902C3", "LB989O2C3", 1);
    let result = MrzResult::td3(TD3_LINE1, noisy);
    let extractor = FieldExtractor::with_reference_year(2026);
    assert!(extractor.extract(&result).is_none());
    assert!(AccessKey::from_result(&result).is_none());
}

#[test]
fn test_aggregator_converges_on_ground_truth() {
    let mut aggregator = BurstAggregator::new();
    let mut last = None;
    for frame in noisy_frames() {
        last = aggregator.aggregate(Some(frame));
    }
    let aggregated = last.unwrap();
    assert_eq!(aggregated.result, MrzResult::td3(TD3_LINE1, TD3_LINE2));
    // every frame but the one with the broken birth date
    assert_eq!(aggregated.confidence, 5);
}

#[test]
fn test_window_is_empty_after_max_frames() {
    let mut aggregator = BurstAggregator::new();
    let specimen = MrzResult::td3(TD3_LINE1, TD3_LINE2);
    for _ in 0..aggregator.max_frames() {
        aggregator.aggregate(Some(specimen.clone()));
    }
    assert!(aggregator.is_empty());
    assert!(aggregator.aggregate(Some(specimen)).is_none());
}

#[test]
fn test_burst_session_accepts_at_threshold() {
    let config = ScanConfig {
        accept_confidence: 5,
        reference_year: Some(2026),
        ..ScanConfig::default()
    };
    let mut session = ScanSession::new(config).unwrap();
    let texts: Vec<String> = noisy_frames()
        .iter()
        .map(MrzResult::to_mrz_text)
        .collect();

    let mut outcomes = Vec::new();
    for text in &texts {
        outcomes.push(session.process_frame(Some(text.as_str())));
    }

    assert_eq!(outcomes[0], ScanOutcome::Pending { frames: 1, needed: 3 });
    assert!(matches!(
        outcomes[2].error(),
        Some(MrzError::LowConfidence { confidence: 3, threshold: 5 })
    ));
    // the broken birth date drags the composite down with it: score 2
    assert_eq!(outcomes[3], ScanOutcome::NoCandidate);
    assert!(matches!(
        outcomes[4].error(),
        Some(MrzError::LowConfidence { confidence: 4, threshold: 5 })
    ));
    let data = outcomes[5].data().unwrap();
    assert_eq!(data.document_number, "L898902C3");
    assert_eq!(data.first_name, "ANNA MARIA");
    assert_eq!(data.personal_number, "ZE184226B");
    assert_eq!(session.frames_held(), 0);
}

#[test]
fn test_manual_key_matches_scanned_key() {
    let text = format!("{}\n{}", TD3_LINE1, TD3_LINE2);
    let scanned = ScanSession::new(ScanConfig::default())
        .unwrap()
        .scan_once(&text)
        .unwrap()
        .access_key();
    let manual = AccessKey::manual("l898902c3", "740812", "120415").unwrap();
    assert_eq!(scanned, manual);
}

#[test]
fn test_normalize_is_idempotent_on_ocr_output() {
    let samples = [
        "P<UTOERIKSSON«ANNA<MARIA\nL898902C36UTO7408122F1204159ZE184226B<<<<<10",
        "  i<uto d23145890 7 «««\t\r\n",
        "Nº 123 — passport ÄÖÜ",
    ];
    for sample in samples.iter() {
        for numeric in [false, true] {
            let once = normalize(sample, numeric);
            assert_eq!(normalize(&once, numeric), once);
        }
    }
}

#[test]
fn test_session_from_json_config() {
    let config = ScanConfig::from_json_str(
        r#"{"min_frames": 1, "max_frames": 2, "accept_confidence": 1, "reference_year": 2026}"#,
    )
    .unwrap();
    let mut session = ScanSession::new(config).unwrap();
    let text = format!("{}\n{}", TD3_LINE1, TD3_LINE2);
    let outcome = session.process_frame(Some(&text));
    assert!(outcome.is_accepted());
    assert_eq!(outcome.data().unwrap().expiry_date, "2012-04-15");

    assert!(matches!(
        ScanConfig::from_json_str(r#"{"min_frames": 4, "max_frames": 2}"#),
        Err(MrzError::Config(_))
    ));
}

#[test]
fn test_fillers_read_as_k_stay_out_of_fields() {
    let line1 = put(TD3_LINE1, 27, 'K');
    let line2 = put(TD3_LINE2, 37, 'K');
    let data = ScanSession::new(ScanConfig::default())
        .unwrap()
        .scan_once(&format!("{}\n{}", line1, line2))
        .unwrap();
    assert_eq!(data.first_name, "ANNA MARIA");
    assert_eq!(data.personal_number, "ZE184226B");
}

#[test]
fn test_passport_zone_missing_trailing_fillers() {
    let text = format!("{}\n{}", TD3_LINE1.trim_end_matches('<'), TD3_LINE2);
    let best = CandidateScanner::best_candidate(&text).unwrap();
    assert_eq!(best.line1, TD3_LINE1);
    assert_eq!(best.score, 4);
}
