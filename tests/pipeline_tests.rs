//! Whole-pipeline behaviour over in-memory programs
use gcode_cleaner::config::{CleanConfig, Stages};
use gcode_cleaner::geometry::Axis;
use gcode_cleaner::parser::{TokenizeOptions, tokenize};
use gcode_cleaner::pipeline::{Envelope, LineStream, Pipeline, Range};
use gcode_cleaner::{Line, Severity};
use rust_decimal::Decimal;

fn clean(text: &str) -> Vec<String> {
    Pipeline::default().run(text.lines()).collect()
}

fn clean_with(config: CleanConfig, text: &str) -> Vec<String> {
    Pipeline::new(config).run(text.lines()).collect()
}

fn canonical(text: &str) -> Vec<String> {
    tokenize(text.lines(), TokenizeOptions::default())
        .join()
        .collect()
}

#[test]
fn collinear_middle_point_is_removed() {
    assert_eq!(
        clean("G1 X0 Y0\nG1 X1 Y0\nG1 X2 Y0\n"),
        vec!["G1 X0 Y0", "G1 X2 Y0"]
    );
}

#[test]
fn repeated_identical_line_is_removed() {
    assert_eq!(clean("G1 X1 Y1\nG1 X1 Y1\n"), vec!["G1 X1 Y1"]);
}

#[test]
fn joined_output_tokenizes_to_itself() {
    let program = "g01 x1.50 y-.5 f1200.\nG0 Z+5\nM3 S12000\nG2 X1 Y1 I0.5 J0\nG4 P0.5";
    let once = canonical(program);
    assert_eq!(
        once,
        vec!["G1 X1.5 Y-0.5 F1200", "G0 Z5", "M3 S12000", "G2 X1 Y1 I0.5 J0", "G4 P0.5"]
    );
    assert_eq!(canonical(&once.join("\n")), once);
}

#[test]
fn dedup_line_is_idempotent() {
    let program = "G90\nG90\nG1 X1 Y1\nG1 X1 Y1\nG4 P1\nG4 P1\nM5\nM5\nG91 X1\nG91 X1";
    let once: Vec<String> = tokenize(program.lines(), TokenizeOptions::default())
        .augment()
        .dedup_line()
        .join()
        .collect();
    let twice: Vec<String> = tokenize(program.lines(), TokenizeOptions::default())
        .augment()
        .dedup_line()
        .dedup_line()
        .join()
        .collect();
    assert_eq!(once, twice);
    assert_eq!(
        once,
        vec!["G90", "G1 X1 Y1", "G4 P1", "G4 P1", "M5", "G91 X1", "G91 X1"]
    );
}

#[test]
fn linear_dedup_keeps_path_ends_and_never_adds_lines() {
    // A zigzag with collinear points on every straight leg
    let mut program = String::from("G0 X0 Y0\n");
    for leg in 0..10 {
        let y = if leg % 2 == 0 { 0 } else { 10 };
        for step in 1..=5 {
            program.push_str(&format!("G1 X{} Y{}\n", leg * 5 + step, y));
        }
    }
    let input = canonical(&program);
    let output: Vec<Line> = tokenize(program.lines(), TokenizeOptions::default())
        .augment()
        .dedup_linear(Decimal::new(5, 4), 4)
        .collect();

    assert!(output.len() <= input.len());
    assert_eq!(output[0].to_string(), input[0]);
    let last = output.last().unwrap();
    assert_eq!(last.position.get(Axis::X), Decimal::from(50));
    assert_eq!(last.position.get(Axis::Y), Decimal::from(10));
}

#[test]
fn several_linear_passes_shrink_further() {
    let program = "G1 X0 Y0\nX1\nX2\nX3\nX4\nX5\nX6\nX7\nX8";
    let one_pass = clean_with(
        CleanConfig {
            linear_passes: 1,
            ..CleanConfig::default()
        },
        program,
    );
    let three_passes = clean(program);
    assert!(three_passes.len() < one_pass.len());
    assert_eq!(three_passes.first().map(String::as_str), Some("G1 X0 Y0"));
    assert_eq!(three_passes.last().map(String::as_str), Some("X8"));
}

#[test]
fn unchanged_feed_is_not_restated() {
    assert_eq!(
        clean("G1 X0 Y0 F100\nG1 X5 Y7 F100\nG1 X9 Y0 F200"),
        vec!["G1 X0 Y0 F100", "G1 X5 Y7", "G1 X9 Y0 F200"]
    );
}

#[test]
fn multi_command_lines_are_split() {
    assert_eq!(
        clean("G21 G90 G17\nG0 X0 Y0 M3 S1000"),
        vec!["G21", "G90", "G17", "G0 X0 Y0 M3 S1000"]
    );
}

#[test]
fn envelope_drops_moves_outside() {
    let config = CleanConfig {
        envelope: Envelope {
            x: Some(Range {
                min: Some(Decimal::ZERO),
                max: Some(Decimal::from(10)),
            }),
            ..Envelope::default()
        },
        ..CleanConfig::default()
    };
    assert_eq!(
        clean_with(config, "G0 X0 Y0\nG1 X20 Y5 F300\nX6"),
        vec!["G0 X0 Y0", "G1 X6 Y5 F300"]
    );
}

fn envelope_x(max: i64) -> Envelope {
    Envelope {
        x: Some(Range {
            min: Some(Decimal::ZERO),
            max: Some(Decimal::from(max)),
        }),
        ..Envelope::default()
    }
}

#[test]
fn spindle_start_survives_a_dropped_move() {
    let config = CleanConfig {
        envelope: envelope_x(10),
        ..CleanConfig::default()
    };
    assert_eq!(
        clean_with(config, "G0 X0 Y0\nG0 X20 Y0 M3 S12000\nG1 X5 F100"),
        vec!["G0 X0 Y0", "M3 S12000", "G1 X5 F100"]
    );
}

#[test]
fn radius_arc_leaving_the_envelope_is_flagged() {
    let config = CleanConfig {
        envelope: envelope_x(10),
        stages: Stages {
            arc_center: false,
            ..Stages::default()
        },
        ..CleanConfig::default()
    };
    let lines: Vec<Line> = Pipeline::new(config)
        .lines("G0 X0 Y0\nG2 X0 Y10 R5".lines())
        .collect();
    assert_eq!(lines[1].to_string(), "G1 Y10");
    assert_eq!(lines[1].diagnostics[0].severity, Severity::Warning);
}

#[test]
fn repeated_flagged_lines_all_reach_the_output() {
    let lines: Vec<Line> = Pipeline::default()
        .lines("G0 X0 Y0\nG1 X1 X2 Y1\nG1 X1 X2 Y1".lines())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines.iter().filter(|l| l.is_flagged()).count(), 2);
}

#[test]
fn envelope_truncates_when_asked() {
    let config = CleanConfig {
        envelope: Envelope {
            x: Some(Range {
                min: None,
                max: Some(Decimal::from(10)),
            }),
            ..Envelope::default()
        },
        truncate: true,
        ..CleanConfig::default()
    };
    let out = clean_with(config, "G0 X0 Y0\nG1 X20 Y10 F100");
    assert_eq!(out, vec!["G0 X0 Y0", "G1 X10 Y5 F100"]);
}

#[test]
fn impossible_arc_is_kept_and_flagged() {
    let lines: Vec<Line> = Pipeline::default()
        .lines("G0 X0 Y0\nG2 X10 Y0 R2".lines())
        .collect();
    assert_eq!(lines[1].to_string(), "G2 X10 Y0 R2");
    assert_eq!(lines[1].diagnostics.len(), 1);
    assert_eq!(lines[1].diagnostics[0].severity, Severity::Error);
    assert_eq!(lines[1].diagnostics[0].line, 2);
}

#[test]
fn malformed_line_passes_through_verbatim() {
    let out = clean("G0 X0 Y0\nG1 X1 Q? Y2\nG1 X3 Y2");
    assert_eq!(out, vec!["G0 X0 Y0", "G1 X1 Q? Y2", "G1 X3 Y2"]);
}

#[test]
fn comments_survive_when_kept() {
    let config = CleanConfig {
        keep_comments: true,
        ..CleanConfig::default()
    };
    // a commented point is never merged away
    let out = clean_with(
        config,
        "(roughing)\nG0 X0 Y0 ; start\nG1 X1 Y0 (corner)\nG1 X2 Y0",
    );
    assert_eq!(
        out,
        vec!["(roughing)", "G0 X0 Y0 (start)", "G1 X1 Y0 (corner)", "G1 X2 Y0"]
    );
}

#[test]
fn every_pass_can_be_disabled() {
    let config = CleanConfig {
        strip_line_numbers: false,
        select_letters: Vec::new(),
        stages: Stages {
            repeated_tokens: false,
            single_command: false,
            arc_center: false,
            clip: false,
            linear: false,
            linear_to_arc: false,
            select_tokens: false,
            dedup_line: false,
        },
        ..CleanConfig::default()
    };
    let program = "N1 G90 G21\nN2 G1 X0 Y0 F100\nN3 G1 X1 Y0 F100\nN4 G1 X1 Y0 F100\nN5 G2 X3 Y0 R1";
    assert_eq!(clean_with(config, program), canonical_keeping_numbers(program));
}

fn canonical_keeping_numbers(text: &str) -> Vec<String> {
    let options = TokenizeOptions {
        strip_line_numbers: false,
        ..TokenizeOptions::default()
    };
    tokenize(text.lines(), options).join().collect()
}

#[test]
fn dense_polyline_becomes_an_arc() {
    let mut program = String::from("G0 X10 Y0\nG1 F500\n");
    for i in 1..=90 {
        let angle = (i as f64).to_radians();
        program.push_str(&format!(
            "G1 X{:.5} Y{:.5}\n",
            10.0 * angle.cos(),
            10.0 * angle.sin()
        ));
    }
    let config = CleanConfig {
        arc_tolerance: Decimal::new(2, 3),
        arc_max_segments: 200,
        ..CleanConfig::default()
    };
    let out = clean_with(config, &program);
    assert_eq!(out, vec!["G0 X10 Y0", "G1 F500", "G3 X0 Y10 I-10 J0"]);
}
