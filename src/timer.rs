//! Multi-phase countdown for guided sessions.
//!
//! The whole timer is one [`TimerState`] value moved forward by
//! [`transition`]; [`SessionTimer`] owns the phase configuration and the
//! completion callback around it.

use log::{debug, info};
use serde::Serialize;

use crate::session::{
    prompt_index, validate_minutes, validate_phases, Preset, PromptTable, SessionError,
    SessionPhase, MAX_PHASE_MINUTES, MEAL_KEY, POST_MEAL_KEY,
};
use crate::util::format_clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl TimerStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TimerStatus::Completed | TimerStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerState {
    pub status: TimerStatus,
    pub phase_index: usize,
    pub remaining_secs: u32,
    pub total_elapsed_secs: u32,
}

impl TimerState {
    pub fn initial(phases: &[SessionPhase]) -> Self {
        Self {
            status: TimerStatus::Idle,
            phase_index: 0,
            remaining_secs: phases.first().map_or(0, SessionPhase::duration_secs),
            total_elapsed_secs: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Resume,
    Tick,
    Skip,
    Reset,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEffect {
    PhaseAdvanced { from: usize, to: usize },
    Completed { total_elapsed_secs: u32 },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: TimerState,
    pub effect: Option<TimerEffect>,
}

impl Transition {
    fn quiet(next: TimerState) -> Self {
        Self { next, effect: None }
    }
}

fn enter_next_phase(phases: &[SessionPhase], state: &TimerState) -> Option<Transition> {
    let to = state.phase_index + 1;
    let phase = phases.get(to)?;
    Some(Transition {
        next: TimerState {
            phase_index: to,
            remaining_secs: phase.duration_secs(),
            ..*state
        },
        effect: Some(TimerEffect::PhaseAdvanced {
            from: state.phase_index,
            to,
        }),
    })
}

fn complete(state: &TimerState, total_elapsed_secs: u32) -> Transition {
    Transition {
        next: TimerState {
            status: TimerStatus::Completed,
            remaining_secs: 0,
            total_elapsed_secs,
            ..*state
        },
        effect: Some(TimerEffect::Completed { total_elapsed_secs }),
    }
}

/// Computes the state that follows `command`. `None` means the command does
/// not apply in the current state and nothing changes.
pub fn transition(
    phases: &[SessionPhase],
    state: &TimerState,
    command: TimerCommand,
) -> Option<Transition> {
    use TimerCommand::*;
    use TimerStatus::*;

    let phase_secs = phases.get(state.phase_index)?.duration_secs();

    match (command, state.status) {
        (_, Completed | Cancelled) => None,

        (Start | Resume, Idle | Paused) => Some(Transition::quiet(TimerState {
            status: Running,
            ..*state
        })),
        (Start | Resume, Running) => None,

        (Pause, Running) => Some(Transition::quiet(TimerState {
            status: Paused,
            ..*state
        })),
        (Pause, _) => None,

        (Tick, Running) => {
            let remaining = state.remaining_secs.saturating_sub(1);
            if remaining > 0 {
                return Some(Transition::quiet(TimerState {
                    remaining_secs: remaining,
                    ..*state
                }));
            }
            let finished = TimerState {
                total_elapsed_secs: state.total_elapsed_secs.saturating_add(phase_secs),
                ..*state
            };
            enter_next_phase(phases, &finished)
                .or_else(|| Some(complete(&finished, finished.total_elapsed_secs)))
        }
        (Tick, _) => None,

        (Skip, _) => enter_next_phase(phases, state).or_else(|| {
            let elapsed_in_phase = phase_secs.saturating_sub(state.remaining_secs);
            Some(complete(
                state,
                state.total_elapsed_secs.saturating_add(elapsed_in_phase),
            ))
        }),

        (Reset, Idle | Paused) => Some(Transition::quiet(TimerState::initial(phases))),
        (Reset, Running) => None,

        (Cancel, _) => Some(Transition {
            next: TimerState {
                status: Cancelled,
                ..*state
            },
            effect: Some(TimerEffect::Cancelled),
        }),
    }
}

type CompletionCallback = Box<dyn FnOnce(u32) + Send>;

pub struct SessionTimer {
    phases: Vec<SessionPhase>,
    prompts: PromptTable,
    state: TimerState,
    on_complete: Option<CompletionCallback>,
}

impl std::fmt::Debug for SessionTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTimer")
            .field("phases", &self.phases)
            .field("state", &self.state)
            .field("has_callback", &self.on_complete.is_some())
            .finish()
    }
}

impl SessionTimer {
    pub fn new(phases: Vec<SessionPhase>, prompts: PromptTable) -> Result<Self, SessionError> {
        validate_phases(&phases)?;
        let state = TimerState::initial(&phases);
        Ok(Self {
            phases,
            prompts,
            state,
            on_complete: None,
        })
    }

    /// Registers the callback that receives the total elapsed seconds when
    /// the session completes. It runs at most once.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(u32) + Send + 'static,
    {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status
    }

    pub fn phases(&self) -> &[SessionPhase] {
        &self.phases
    }

    pub fn current_phase(&self) -> &SessionPhase {
        &self.phases[self.state.phase_index]
    }

    pub fn is_last_phase(&self) -> bool {
        self.state.phase_index + 1 == self.phases.len()
    }

    pub fn elapsed_in_phase(&self) -> u32 {
        self.current_phase()
            .duration_secs()
            .saturating_sub(self.state.remaining_secs)
    }

    /// Fraction of the active phase already done, 0.0..=1.0.
    pub fn phase_progress(&self) -> f64 {
        let total = self.current_phase().duration_secs();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.elapsed_in_phase()) / f64::from(total)
    }

    pub fn prompt(&self) -> Option<&str> {
        let prompts = self.prompts.for_phase(&self.current_phase().key);
        prompt_index(self.elapsed_in_phase(), prompts.len()).map(|i| prompts[i].as_str())
    }

    pub fn remaining_clock(&self) -> String {
        format_clock(self.state.remaining_secs)
    }

    /// Applies a command. Returns whether the state changed.
    pub fn dispatch(&mut self, command: TimerCommand) -> bool {
        let Some(Transition { next, effect }) = transition(&self.phases, &self.state, command)
        else {
            debug!("{:?} ignored while {}", command, self.state.status);
            return false;
        };
        self.state = next;

        match effect {
            Some(TimerEffect::PhaseAdvanced { from, to }) => {
                debug!(
                    "phase {} -> {} ({}), elapsed {}s",
                    from, to, self.phases[to].key, self.state.total_elapsed_secs
                );
            }
            Some(TimerEffect::Completed { total_elapsed_secs }) => {
                info!("session completed after {}s", total_elapsed_secs);
                if let Some(callback) = self.on_complete.take() {
                    callback(total_elapsed_secs);
                }
            }
            Some(TimerEffect::Cancelled) => {
                info!("session cancelled");
                self.on_complete = None;
            }
            None => {}
        }
        true
    }

    pub fn start(&mut self) -> bool {
        self.dispatch(TimerCommand::Start)
    }

    pub fn pause(&mut self) -> bool {
        self.dispatch(TimerCommand::Pause)
    }

    pub fn resume(&mut self) -> bool {
        self.dispatch(TimerCommand::Resume)
    }

    /// Start/pause toggle for hosts with a single play button.
    pub fn toggle(&mut self) -> bool {
        if self.state.is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn tick(&mut self) -> bool {
        self.dispatch(TimerCommand::Tick)
    }

    pub fn skip(&mut self) -> bool {
        self.dispatch(TimerCommand::Skip)
    }

    pub fn reset(&mut self) -> bool {
        self.dispatch(TimerCommand::Reset)
    }

    pub fn cancel(&mut self) -> bool {
        self.dispatch(TimerCommand::Cancel)
    }

    fn accepts_config_changes(&self) -> bool {
        matches!(self.state.status, TimerStatus::Idle | TimerStatus::Paused)
    }

    /// Changes a phase's duration. Refused (returns `Ok(false)`) while
    /// running or after the session ended. Editing the active phase restarts
    /// its countdown at the new duration.
    pub fn set_phase_minutes(&mut self, key: &str, minutes: u32) -> Result<bool, SessionError> {
        validate_minutes(key, minutes)?;
        let index = self
            .phases
            .iter()
            .position(|p| p.key == key)
            .ok_or_else(|| SessionError::UnknownPhase(key.to_string()))?;

        if !self.accepts_config_changes() {
            debug!("duration change for {:?} refused while {}", key, self.state.status);
            return Ok(false);
        }

        self.phases[index].minutes = minutes;
        if index == self.state.phase_index {
            self.state.remaining_secs = self.phases[index].duration_secs();
        }
        Ok(true)
    }

    /// Nudges the active phase's duration by `delta` minutes, kept within
    /// `1..=MAX_PHASE_MINUTES`.
    pub fn adjust_active_minutes(&mut self, delta: i32) -> Result<bool, SessionError> {
        let phase = self.current_phase();
        let minutes = phase
            .minutes
            .saturating_add_signed(delta)
            .clamp(1, MAX_PHASE_MINUTES);
        let key = phase.key.clone();
        self.set_phase_minutes(&key, minutes)
    }

    /// Applies a meal/post-meal preset to whichever of those phases exist.
    pub fn apply_preset(&mut self, preset: Preset) -> Result<bool, SessionError> {
        if !self.accepts_config_changes() {
            debug!("preset {} refused while {}", preset, self.state.status);
            return Ok(false);
        }
        let (meal, post) = preset.minutes();
        let mut changed = false;
        for (key, minutes) in [(MEAL_KEY, meal), (POST_MEAL_KEY, post)] {
            if self.phases.iter().any(|p| p.key == key) {
                changed |= self.set_phase_minutes(key, minutes)?;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{meal_support_phases, meal_support_prompts};
    use std::sync::{Arc, Mutex};

    fn two_minute_timer() -> SessionTimer {
        SessionTimer::new(
            vec![
                SessionPhase::new("a", "A", 1),
                SessionPhase::new("b", "B", 1),
            ],
            PromptTable::new(),
        )
        .unwrap()
    }

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl FnOnce(u32) + Send + 'static) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        (calls, move |total| sink.lock().unwrap().push(total))
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert!(SessionTimer::new(vec![], PromptTable::new()).is_err());
        assert!(SessionTimer::new(vec![SessionPhase::new("a", "A", 0)], PromptTable::new()).is_err());
    }

    #[test]
    fn initial_state() {
        let timer = SessionTimer::new(meal_support_phases(20, 15), meal_support_prompts()).unwrap();
        assert_eq!(
            *timer.state(),
            TimerState {
                status: TimerStatus::Idle,
                phase_index: 0,
                remaining_secs: 1200,
                total_elapsed_secs: 0,
            }
        );
    }

    #[test]
    fn ticks_through_phases_and_completes_once() {
        let (calls, cb) = recorder();
        let mut timer = two_minute_timer().on_complete(cb);
        assert!(timer.start());

        for _ in 0..60 {
            timer.tick();
        }
        assert_eq!(timer.state().phase_index, 1);
        assert_eq!(timer.state().remaining_secs, 60);
        assert_eq!(timer.state().total_elapsed_secs, 60);
        assert_eq!(timer.status(), TimerStatus::Running);

        for _ in 0..60 {
            timer.tick();
        }
        assert_eq!(timer.status(), TimerStatus::Completed);
        assert_eq!(timer.state().total_elapsed_secs, 120);

        // further ticks are ignored and never re-fire the callback
        assert!(!timer.tick());
        assert!(!timer.skip());
        assert_eq!(*calls.lock().unwrap(), vec![120]);
    }

    #[test]
    fn tick_is_ignored_unless_running() {
        let mut timer = two_minute_timer();
        assert!(!timer.tick());
        assert_eq!(timer.state().remaining_secs, 60);

        timer.start();
        timer.tick();
        timer.pause();
        assert!(!timer.tick());
        assert_eq!(timer.state().remaining_secs, 59);
    }

    #[test]
    fn start_pause_resume_are_idempotent() {
        let mut timer = two_minute_timer();
        assert!(!timer.pause());
        assert!(timer.start());
        assert!(!timer.start());
        assert!(!timer.resume());
        assert!(timer.pause());
        assert!(!timer.pause());
        assert!(timer.resume());
        assert!(timer.state().is_running());
    }

    #[test]
    fn skip_to_next_phase_adds_no_partial_time() {
        let mut timer = two_minute_timer();
        timer.start();
        for _ in 0..25 {
            timer.tick();
        }
        assert!(timer.skip());
        assert_eq!(timer.state().phase_index, 1);
        assert_eq!(timer.state().remaining_secs, 60);
        assert_eq!(timer.state().total_elapsed_secs, 0);
        assert!(timer.state().is_running());
    }

    #[test]
    fn skip_on_last_phase_counts_actual_elapsed() {
        let (calls, cb) = recorder();
        let mut timer = two_minute_timer().on_complete(cb);
        timer.start();
        for _ in 0..60 {
            timer.tick();
        }
        for _ in 0..20 {
            timer.tick();
        }
        assert_eq!(timer.state().remaining_secs, 40);
        assert!(timer.skip());
        assert_eq!(timer.status(), TimerStatus::Completed);
        assert_eq!(timer.state().total_elapsed_secs, 80);
        assert_eq!(*calls.lock().unwrap(), vec![80]);
    }

    #[test]
    fn cancel_never_fires_callback() {
        let (calls, cb) = recorder();
        let mut timer = two_minute_timer().on_complete(cb);
        timer.start();
        for _ in 0..90 {
            timer.tick();
        }
        assert!(timer.cancel());
        assert_eq!(timer.status(), TimerStatus::Cancelled);
        assert!(!timer.tick());
        assert!(!timer.skip());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn cancel_from_idle_and_paused() {
        let mut idle = two_minute_timer();
        assert!(idle.cancel());
        assert_eq!(idle.status(), TimerStatus::Cancelled);

        let mut paused = two_minute_timer();
        paused.start();
        paused.pause();
        assert!(paused.cancel());
        assert!(!paused.start());
    }

    #[test]
    fn reset_only_when_not_running() {
        let mut timer = two_minute_timer();
        timer.start();
        for _ in 0..70 {
            timer.tick();
        }
        assert!(!timer.reset());
        assert_eq!(timer.state().phase_index, 1);

        timer.pause();
        assert!(timer.reset());
        assert_eq!(*timer.state(), TimerState::initial(timer.phases()));
    }

    #[test]
    fn reconfigure_active_phase_resets_remaining() {
        let mut timer = two_minute_timer();
        assert_eq!(timer.set_phase_minutes("a", 3), Ok(true));
        assert_eq!(timer.state().remaining_secs, 180);

        assert_eq!(timer.set_phase_minutes("b", 5), Ok(true));
        assert_eq!(timer.state().remaining_secs, 180);

        timer.start();
        timer.tick();
        assert_eq!(timer.set_phase_minutes("a", 10), Ok(false));
        assert_eq!(timer.state().remaining_secs, 179);
        assert_eq!(timer.phases()[0].minutes, 3);

        timer.pause();
        assert_eq!(timer.set_phase_minutes("a", 2), Ok(true));
        assert_eq!(timer.state().remaining_secs, 120);

        timer.skip();
        assert_eq!(timer.state().remaining_secs, 300);
    }

    #[test]
    fn reconfigure_rejects_bad_input() {
        let mut timer = two_minute_timer();
        assert!(matches!(
            timer.set_phase_minutes("a", 0),
            Err(SessionError::NonPositiveDuration { .. })
        ));
        assert!(matches!(
            timer.set_phase_minutes("zzz", 4),
            Err(SessionError::UnknownPhase(_))
        ));
    }

    #[test]
    fn oversized_phases_fail_cleanly() {
        let err = SessionTimer::new(
            vec![SessionPhase::new("a", "A", 80_000_000)],
            PromptTable::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::DurationTooLong { .. }));

        let mut timer = two_minute_timer();
        assert!(matches!(
            timer.set_phase_minutes("b", MAX_PHASE_MINUTES + 1),
            Err(SessionError::DurationTooLong { .. })
        ));
        assert_eq!(timer.set_phase_minutes("a", MAX_PHASE_MINUTES), Ok(true));
        assert_eq!(timer.adjust_active_minutes(i32::MAX), Ok(true));
        assert_eq!(timer.current_phase().minutes, MAX_PHASE_MINUTES);
        assert_eq!(timer.adjust_active_minutes(i32::MIN), Ok(true));
        assert_eq!(timer.current_phase().minutes, 1);
    }

    #[test]
    fn presets_apply_by_key() {
        let mut timer =
            SessionTimer::new(meal_support_phases(20, 20), meal_support_prompts()).unwrap();
        assert_eq!(timer.apply_preset(Preset::LongMeal), Ok(true));
        assert_eq!(timer.phases()[0].minutes, 25);
        assert_eq!(timer.phases()[1].minutes, 15);
        assert_eq!(timer.state().remaining_secs, 25 * 60);

        timer.start();
        assert_eq!(timer.apply_preset(Preset::Short), Ok(false));
        assert_eq!(timer.phases()[0].minutes, 25);
    }

    #[test]
    fn adjust_never_drops_below_one_minute() {
        let mut timer = two_minute_timer();
        assert_eq!(timer.adjust_active_minutes(-5), Ok(true));
        assert_eq!(timer.current_phase().minutes, 1);
        assert_eq!(timer.adjust_active_minutes(4), Ok(true));
        assert_eq!(timer.state().remaining_secs, 300);
    }

    #[test]
    fn prompt_rotates_with_phase_time() {
        let prompts = PromptTable::new().with_phase("long", ["one", "two", "three"]);
        let mut timer =
            SessionTimer::new(vec![SessionPhase::new("long", "Long", 10)], prompts).unwrap();
        assert_eq!(timer.prompt(), Some("one"));

        timer.start();
        for _ in 0..125 {
            timer.tick();
        }
        assert_eq!(timer.elapsed_in_phase(), 125);
        assert_eq!(timer.prompt(), Some("three"));

        for _ in 0..60 {
            timer.tick();
        }
        assert_eq!(timer.prompt(), Some("one"));
    }

    #[test]
    fn progress_and_clock() {
        let mut timer = two_minute_timer();
        timer.start();
        for _ in 0..15 {
            timer.tick();
        }
        assert_eq!(timer.phase_progress(), 0.25);
        assert_eq!(timer.remaining_clock(), "0:45");
    }

    #[test]
    fn transition_function_is_pure() {
        let phases = vec![SessionPhase::new("only", "Only", 1)];
        let state = TimerState {
            status: TimerStatus::Running,
            phase_index: 0,
            remaining_secs: 1,
            total_elapsed_secs: 0,
        };
        let first = transition(&phases, &state, TimerCommand::Tick).unwrap();
        let second = transition(&phases, &state, TimerCommand::Tick).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.effect,
            Some(TimerEffect::Completed {
                total_elapsed_secs: 60
            })
        );
        assert!(transition(&phases, &first.next, TimerCommand::Tick).is_none());
    }
}
