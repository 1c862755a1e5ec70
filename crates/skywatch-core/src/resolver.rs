// ── Fallback resolution ──
//
// Pure function from (previous state, cycle outcome, policy) to the next
// state. The store calls it once per completed cycle; nothing else decides
// what a resource shows.

use chrono::{DateTime, Utc};

use crate::resource::{ErrorDescriptor, FallbackPolicy, Origin, Outcome, Payload, ResourceState};

/// Compute the next state of a resource.
///
/// `placeholder` is only invoked when `SyntheticDefault` has no real value
/// to fall back to.
pub fn resolve(
    prev: &ResourceState,
    outcome: Outcome,
    policy: FallbackPolicy,
    placeholder: impl FnOnce() -> Option<Payload>,
    now: DateTime<Utc>,
) -> ResourceState {
    let error = match outcome {
        Outcome::Success(payload) => {
            return ResourceState {
                value: Some(payload.normalized()),
                origin: Origin::Live,
                last_updated_at: Some(now),
                last_error: None,
            };
        }
        Outcome::Empty => ErrorDescriptor::empty(),
        Outcome::Failure(error) => error,
    };

    let has_real = prev.origin.is_real() && prev.value.is_some();

    match policy {
        FallbackPolicy::None => ResourceState {
            origin: if has_real { prev.origin } else { Origin::Absent },
            last_error: Some(error),
            ..prev.clone()
        },
        FallbackPolicy::LastKnownGood => degrade(prev, has_real, error),
        FallbackPolicy::SyntheticDefault if has_real => degrade(prev, true, error),
        FallbackPolicy::SyntheticDefault => match placeholder() {
            Some(value) => ResourceState {
                value: Some(value.normalized()),
                origin: Origin::Synthetic,
                last_updated_at: Some(now),
                last_error: Some(error),
            },
            None => ResourceState {
                value: None,
                origin: Origin::Absent,
                last_updated_at: prev.last_updated_at,
                last_error: Some(error),
            },
        },
    }
}

/// Keep a real value as `Cached`; without one the resource is `Absent`.
fn degrade(prev: &ResourceState, has_real: bool, error: ErrorDescriptor) -> ResourceState {
    if has_real {
        ResourceState {
            origin: Origin::Cached,
            last_error: Some(error),
            ..prev.clone()
        }
    } else {
        ResourceState {
            value: None,
            origin: Origin::Absent,
            last_updated_at: prev.last_updated_at,
            last_error: Some(error),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{FireAlert, SensorReading, Severity, TelemetrySample};
    use crate::resource::ErrorKind;

    fn t(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, sec).unwrap()
    }

    fn sensors(temp: f64) -> Payload {
        Payload::Sensors(SensorReading { temperature: Some(temp), ..SensorReading::default() })
    }

    fn fail() -> Outcome {
        Outcome::Failure(ErrorDescriptor::transport("connection refused"))
    }

    fn sensor_placeholder() -> Option<Payload> {
        Some(Payload::Sensors(SensorReading::placeholder(t(59))))
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Ok,
        Empty,
        Fail,
    }

    fn outcome(step: Step, i: usize) -> Outcome {
        match step {
            Step::Ok => Outcome::Success(sensors(f64::from(u32::try_from(i).unwrap()))),
            Step::Empty => Outcome::Empty,
            Step::Fail => fail(),
        }
    }

    /// Every outcome sequence of length `len`.
    fn sequences(len: usize) -> Vec<Vec<Step>> {
        let mut all = vec![Vec::new()];
        for _ in 0..len {
            all = all
                .into_iter()
                .flat_map(|seq| {
                    [Step::Ok, Step::Empty, Step::Fail].into_iter().map(move |s| {
                        let mut next = seq.clone();
                        next.push(s);
                        next
                    })
                })
                .collect();
        }
        all
    }

    fn allowed(from: Origin, to: Origin) -> bool {
        from == to
            || matches!(
                (from, to),
                (Origin::Absent | Origin::Synthetic | Origin::Cached, Origin::Live)
                    | (Origin::Live, Origin::Cached)
                    | (Origin::Absent, Origin::Synthetic)
            )
    }

    #[test]
    fn success_is_live_and_clears_error() {
        let prev = ResourceState {
            last_error: Some(ErrorDescriptor::transport("x")),
            ..ResourceState::absent()
        };
        let next = resolve(&prev, Outcome::Success(sensors(30.0)), FallbackPolicy::None, || None, t(1));
        assert_eq!(next.origin, Origin::Live);
        assert_eq!(next.value, Some(sensors(30.0)));
        assert_eq!(next.last_updated_at, Some(t(1)));
        assert!(next.last_error.is_none());
    }

    #[test]
    fn none_policy_records_error_and_keeps_value() {
        let live = resolve(&ResourceState::absent(), Outcome::Success(sensors(1.0)), FallbackPolicy::None, || None, t(1));
        let after = resolve(&live, fail(), FallbackPolicy::None, || None, t(2));
        assert_eq!(after.origin, Origin::Live);
        assert_eq!(after.value, live.value);
        assert_eq!(after.last_updated_at, Some(t(1)));
        assert_eq!(after.last_error.unwrap().kind, ErrorKind::Transport);

        let never = resolve(&ResourceState::absent(), Outcome::Empty, FallbackPolicy::None, || None, t(2));
        assert_eq!(never.origin, Origin::Absent);
        assert_eq!(never.last_error.unwrap().kind, ErrorKind::Empty);
    }

    #[test]
    fn last_known_good_caches_then_recovers() {
        let policy = FallbackPolicy::LastKnownGood;
        let live = resolve(&ResourceState::absent(), Outcome::Success(sensors(1.0)), policy, || None, t(1));
        let cached = resolve(&live, fail(), policy, || None, t(2));
        assert_eq!(cached.origin, Origin::Cached);
        assert_eq!(cached.value, Some(sensors(1.0)));
        let still = resolve(&cached, Outcome::Empty, policy, || None, t(3));
        assert_eq!(still.origin, Origin::Cached);
        let back = resolve(&still, Outcome::Success(sensors(2.0)), policy, || None, t(4));
        assert_eq!(back.origin, Origin::Live);
        assert_eq!(back.value, Some(sensors(2.0)));
    }

    #[test]
    fn synthetic_only_before_first_real_value() {
        let policy = FallbackPolicy::SyntheticDefault;
        let synth = resolve(&ResourceState::absent(), fail(), policy, sensor_placeholder, t(1));
        assert_eq!(synth.origin, Origin::Synthetic);
        assert_eq!(synth.value, sensor_placeholder());
        assert!(synth.last_error.is_some());

        let live = resolve(&synth, Outcome::Success(sensors(33.0)), policy, sensor_placeholder, t(2));
        assert_eq!(live.origin, Origin::Live);

        let cached = resolve(&live, fail(), policy, sensor_placeholder, t(3));
        assert_eq!(cached.origin, Origin::Cached);
        assert_eq!(cached.value, Some(sensors(33.0)));
    }

    #[test]
    fn synthetic_without_placeholder_is_absent() {
        let next = resolve(&ResourceState::absent(), fail(), FallbackPolicy::SyntheticDefault, || None, t(1));
        assert_eq!(next.origin, Origin::Absent);
        assert!(next.value.is_none());
    }

    #[test]
    fn success_sorts_alerts() {
        let alert = |id: &str, sec: u32| FireAlert {
            id: id.into(),
            timestamp: Some(t(sec)),
            location: None,
            severity: Severity::High,
            confidence: crate::model::Confidence::new(90.0),
            description: None,
            temperature: None,
            image_url: None,
        };
        let next = resolve(
            &ResourceState::absent(),
            Outcome::Success(Payload::FireAlerts(vec![alert("1", 1), alert("2", 2)])),
            FallbackPolicy::SyntheticDefault,
            || None,
            t(3),
        );
        let ids: Vec<_> = next.value.unwrap().as_fire_alerts().unwrap().iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn origin_invariants_hold_for_every_sequence() {
        for policy in [FallbackPolicy::None, FallbackPolicy::LastKnownGood, FallbackPolicy::SyntheticDefault] {
            for seq in sequences(5) {
                let mut state = ResourceState::absent();
                let mut seen_success = false;
                for (i, step) in seq.iter().enumerate() {
                    let next = resolve(&state, outcome(*step, i), policy, sensor_placeholder, t(1));
                    assert!(
                        allowed(state.origin, next.origin),
                        "{policy:?} {seq:?}: {:?} -> {:?}",
                        state.origin,
                        next.origin
                    );
                    seen_success |= matches!(step, Step::Ok);
                    if seen_success {
                        assert_ne!(next.origin, Origin::Absent, "{policy:?} {seq:?}");
                        assert_ne!(next.origin, Origin::Synthetic, "{policy:?} {seq:?}");
                    }
                    if policy != FallbackPolicy::SyntheticDefault {
                        assert_ne!(next.origin, Origin::Synthetic);
                    }
                    if policy == FallbackPolicy::None {
                        assert_ne!(next.origin, Origin::Cached);
                    }
                    state = next;
                }
            }
        }
    }

    #[test]
    fn telemetry_is_not_normalized_away() {
        let sample = TelemetrySample { battery: Some(50.0), ..TelemetrySample::default() };
        let next = resolve(
            &ResourceState::absent(),
            Outcome::Success(Payload::Telemetry(sample.clone())),
            FallbackPolicy::None,
            || None,
            t(1),
        );
        assert_eq!(next.value, Some(Payload::Telemetry(sample)));
    }
}
