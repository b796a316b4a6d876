use super::*;

fn periodic(n: u64) -> CommandDebouncer {
    CommandDebouncer::new(DebouncePolicy::ChangeOrPeriodic { every_n_frames: n })
}

fn cooldown(ms: u64) -> CommandDebouncer {
    CommandDebouncer::new(DebouncePolicy::Cooldown {
        cooldown: Duration::from_millis(ms),
    })
}

#[test]
fn first_command_is_emitted() {
    let now = Instant::now();
    assert!(periodic(5).decide(Some(Command::Fire), now));
    assert!(cooldown(300).decide(Some(Command::Fire), now));
}

#[test]
fn no_command_never_emits_but_counts_frames() {
    let mut debouncer = periodic(3);
    let now = Instant::now();
    assert!(!debouncer.decide(None, now));
    assert!(!debouncer.decide(None, now));
    assert_eq!(debouncer.frame_count(), 2);
    assert_eq!(debouncer.last_emitted(), None);
}

#[test]
fn change_emits_on_transition_frame() {
    let mut debouncer = periodic(100);
    let now = Instant::now();
    assert!(debouncer.decide(Some(Command::MoveLeft), now));
    assert!(!debouncer.decide(Some(Command::MoveLeft), now));
    assert!(debouncer.decide(Some(Command::MoveRight), now));
    assert!(debouncer.decide(Some(Command::MoveLeft), now));
    assert_eq!(debouncer.last_emitted(), Some(Command::MoveLeft));
}

#[test]
fn held_command_is_reaffirmed_every_n_frames() {
    let n = 4;
    let mut debouncer = periodic(n);
    let now = Instant::now();
    assert!(debouncer.decide(Some(Command::Fire), now));

    let emitted: Vec<bool> = (1..=2 * n)
        .map(|_| debouncer.decide(Some(Command::Fire), now))
        .collect();
    assert_eq!(
        emitted,
        vec![false, false, false, true, false, false, false, true]
    );
}

#[test]
fn gap_frames_count_toward_the_period() {
    let mut debouncer = periodic(3);
    let now = Instant::now();
    assert!(debouncer.decide(Some(Command::Fire), now));
    assert!(!debouncer.decide(None, now));
    assert!(!debouncer.decide(None, now));
    assert!(debouncer.decide(Some(Command::Fire), now));
}

#[test]
fn cooldown_suppresses_until_elapsed() {
    let mut debouncer = cooldown(300);
    let start = Instant::now();
    assert!(debouncer.decide(Some(Command::Fire), start));
    for step in 1..=5 {
        let at = start + Duration::from_millis(50 * step);
        assert!(!debouncer.decide(Some(Command::Fire), at), "step {step}");
    }
    assert!(debouncer.decide(Some(Command::Fire), start + Duration::from_millis(300)));
    assert_eq!(debouncer.last_emit_at(), Some(start + Duration::from_millis(300)));
}

#[test]
fn cooldown_gates_changed_commands_too() {
    let mut debouncer = cooldown(300);
    let start = Instant::now();
    assert!(debouncer.decide(Some(Command::MoveLeft), start));
    assert!(!debouncer.decide(Some(Command::MoveRight), start + Duration::from_millis(100)));
    assert!(debouncer.decide(Some(Command::MoveRight), start + Duration::from_millis(400)));
}

#[test]
fn reset_forgets_history() {
    let mut debouncer = periodic(10);
    let now = Instant::now();
    assert!(debouncer.decide(Some(Command::Fire), now));
    debouncer.reset();
    assert_eq!(debouncer.frame_count(), 0);
    assert!(debouncer.decide(Some(Command::Fire), now));
}

#[test]
fn config_builds_matching_policy() {
    let config = DebounceConfig {
        mode: DebounceKind::Cooldown,
        every_n_frames: 7,
        cooldown_ms: 250,
    };
    assert_eq!(
        config.policy(),
        DebouncePolicy::Cooldown {
            cooldown: Duration::from_millis(250)
        }
    );
    assert_eq!(
        DebounceConfig {
            every_n_frames: 0,
            ..DebounceConfig::default()
        }
        .policy(),
        DebouncePolicy::ChangeOrPeriodic { every_n_frames: 1 }
    );
}
