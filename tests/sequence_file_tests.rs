//! File-level parser behavior: comments, malformed rows, and failure modes.

use std::io::Write;
use std::path::Path;

use stimseq::sequence::{load_sequence, ParseOptions};

fn sequence_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn comment_only_file_parses_to_zero_steps_without_error() {
    let file = sequence_file(
        "* an all-comment file\n\
         * nothing to play here\n\
         * 0,0,0,0,0,0,0,0,0,0,0\n",
    );

    let (sequence, report) = load_sequence(file.path(), &ParseOptions::default()).unwrap();
    assert!(sequence.is_empty());
    assert_eq!(report.comment_lines, 3);
    assert_eq!(report.skipped_rows, 0);
}

#[test]
fn malformed_rows_are_counted_and_valid_rows_keep_their_order() {
    let file = sequence_file(
        "* header comment\n\
         0,0,0,0,0,0,0,0,0,0,0\n\
         not,a,row\n\
         120,1,0,0,0,0,0,0,0,2,0\n\
         180,1,0,0,0,0,0,x,0,2,0\n\
         240,0,0,0,0,0,0,0,0,0,1\n\
         300,0,0,0,0,0,0,0,0,0,0,0\n\
         360,0,0,0,0,0,0,0,0,0,0\n",
    );

    let (sequence, report) = load_sequence(file.path(), &ParseOptions::default()).unwrap();

    // Three malformed rows (short, bad field, long); four survivors in order.
    assert_eq!(sequence.len(), 4);
    assert_eq!(report.skipped_rows, 3);
    assert_eq!(report.comment_lines, 1);

    let times: Vec<u32> = sequence.steps().iter().map(|s| s.time_ms).collect();
    assert_eq!(times, vec![0, 120, 240, 360]);
}

#[test]
fn parsing_the_same_file_twice_gives_identical_sequences() {
    let file = sequence_file(
        "0,0,0,0,0,0,0,0,0,0,0\n\
         55,1,0,0,0,0,0,0,0,9,1\n\
         90,0,0,0,0,0,0,0,0,0,0\n",
    );

    let options = ParseOptions::default();
    let first = load_sequence(file.path(), &options).unwrap();
    let second = load_sequence(file.path(), &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unreadable_path_is_a_failure_not_an_empty_success() {
    let missing = Path::new("/definitely/not/here/sequence.csv");
    assert!(load_sequence(missing, &ParseOptions::default()).is_err());
}

#[test]
fn minimum_time_step_from_options_is_applied() {
    let file = sequence_file(
        "0,0,0,0,0,0,0,0,0,0,0\n\
         20,1,0,0,0,0,0,0,0,0,0\n\
         50,0,1,0,0,0,0,0,0,0,0\n",
    );

    let options = ParseOptions {
        min_time_step_ms: 50,
        ..ParseOptions::default()
    };
    let (sequence, report) = load_sequence(file.path(), &options).unwrap();

    let times: Vec<u32> = sequence.steps().iter().map(|s| s.time_ms).collect();
    assert_eq!(times, vec![0, 50]);
    assert_eq!(report.skipped_rows, 1);
}
