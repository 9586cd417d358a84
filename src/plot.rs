//! Sequence preview rendering.
//!
//! Draws a parsed sequence as one stacked track per channel so a sequence
//! file can be eyeballed before it reaches the rig: valve and piezo tracks
//! are 0/1 traces, the LED track shows the raw level. State holds until the
//! next step, so traces are drawn step-wise.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::sequence::Sequence;

const TRACK_HEIGHT: u32 = 110;
const WIDTH: u32 = 900;

/// Render a sequence to an SVG file, one track per channel.
pub fn plot_sequence(sequence: &Sequence, path: &Path) -> Result<(), Box<dyn Error>> {
    if sequence.is_empty() {
        return Err("cannot plot an empty sequence".into());
    }

    let steps = sequence.steps();
    let valve_count = sequence.valve_count();
    let tracks = valve_count + 2;
    let end_ms = steps.last().map(|s| s.time_ms).unwrap_or(0).max(1) as f64;

    let root = SVGBackend::new(path, (WIDTH, TRACK_HEIGHT * tracks as u32)).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((tracks, 1));

    for (track, area) in areas.iter().enumerate() {
        let (label, values, y_max) = track_values(sequence, track);

        let mut chart = ChartBuilder::on(area)
            .caption(&label, ("sans-serif", 16))
            .margin(8)
            .x_label_area_size(22)
            .y_label_area_size(40)
            .build_cartesian_2d(0f64..end_ms, 0f64..y_max * 1.1)?;

        chart
            .configure_mesh()
            .x_labels(10)
            .y_labels(3)
            .x_desc(if track == tracks - 1 { "Time (ms)" } else { "" })
            .draw()?;

        // Hold each value until the next step so the trace reads like the
        // output the rig will actually generate.
        let mut points: Vec<(f64, f64)> = Vec::with_capacity(steps.len() * 2);
        for (k, step) in steps.iter().enumerate() {
            let t = step.time_ms as f64;
            let next_t = steps
                .get(k + 1)
                .map(|s| s.time_ms as f64)
                .unwrap_or(end_ms);
            points.push((t, values[k]));
            points.push((next_t, values[k]));
        }

        chart.draw_series(LineSeries::new(points, BLUE.stroke_width(2)))?;
    }

    root.present()?;
    Ok(())
}

/// Label, per-step values, and y-axis scale for one channel track.
fn track_values(sequence: &Sequence, track: usize) -> (String, Vec<f64>, f64) {
    let steps = sequence.steps();
    let valve_count = sequence.valve_count();

    if track < valve_count {
        let values = steps
            .iter()
            .map(|s| if s.valves[track] { 1.0 } else { 0.0 })
            .collect();
        (format!("V{}", track + 1), values, 1.0)
    } else if track == valve_count {
        let values: Vec<f64> = steps.iter().map(|s| s.led_level as f64).collect();
        let y_max = values.iter().cloned().fold(1.0f64, f64::max);
        ("LED".to_string(), values, y_max)
    } else {
        let values = steps
            .iter()
            .map(|s| if s.piezo { 1.0 } else { 0.0 })
            .collect();
        ("Piezo".to_string(), values, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::TimeStep;

    fn step(time_ms: u32, led_level: u32) -> TimeStep {
        TimeStep {
            time_ms,
            valves: vec![false; 8],
            led_level,
            piezo: false,
        }
    }

    #[test]
    fn writes_an_svg_with_one_track_per_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.svg");

        let seq = Sequence::from_steps(8, vec![step(0, 0), step(100, 5), step(300, 0)]);
        plot_sequence(&seq, &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("LED"));
        assert!(svg.contains("Piezo"));
        assert!(svg.contains("V8"));
    }

    #[test]
    fn empty_sequence_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.svg");

        let seq = Sequence::from_steps(8, Vec::new());
        assert!(plot_sequence(&seq, &path).is_err());
    }
}
