use fsi_model::{compile_time_curve, segment_windows};
use fsi_project::CurveSegment;
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = CurveSegment> {
    prop_oneof![
        (-500.0..500.0f64, 0.01..2.0f64, 1u32..5).prop_map(|(max_vel, period, cycles)| {
            CurveSegment::Sine {
                max_vel,
                period,
                cycles,
            }
        }),
        (0.01..2.0f64).prop_map(|duration| CurveSegment::Hold { duration }),
        (-500.0..500.0f64, 0.01..2.0f64)
            .prop_map(|(max_vel, duration)| CurveSegment::Ramp { max_vel, duration }),
    ]
}

#[test]
fn scenario_two_windows() {
    let segments = [
        CurveSegment::Sine {
            max_vel: 400.0,
            period: 0.25,
            cycles: 2,
        },
        CurveSegment::Hold { duration: 0.5 },
    ];
    let starts: Vec<f64> = segment_windows(&segments).iter().map(|w| w.start).collect();
    assert_eq!(starts, [0.0, 0.5]);
    let curve = compile_time_curve(&segments).unwrap();
    assert_eq!(curve.total_duration(), 1.0);
    assert_eq!(curve.parts.len(), 1);
}

proptest! {
    #[test]
    fn windows_are_contiguous(segments in prop::collection::vec(segment(), 1..12)) {
        let windows = segment_windows(&segments);
        prop_assert_eq!(windows.len(), segments.len());
        prop_assert_eq!(windows[0].start, 0.0);
        for pair in windows.windows(2) {
            prop_assert!(pair[0].start <= pair[1].start);
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        let total: f64 = segments.iter().map(|s| s.duration()).sum();
        let last = windows.last().unwrap();
        prop_assert!((last.end - total).abs() <= 1e-9 * total.max(1.0));
    }

    #[test]
    fn at_most_one_window_is_active(
        segments in prop::collection::vec(segment(), 1..8),
        frac in 0.0..1.0f64,
    ) {
        let curve = compile_time_curve(&segments).unwrap();
        let t = frac * curve.total_duration();
        prop_assert!(curve.active_windows(t).count() <= 1);
        prop_assert_eq!(curve.active_windows(curve.total_duration()).count(), 0);
    }
}
