//! Per-session state shared between the orchestrator and a game variant
//!
//! A game gets `&mut SessionCore` in every hook. Through it the game can read
//! the phase, pause and resume, count score, queue events and schedule
//! delayed actions, but it cannot produce a result on its own.

use super::clock::{SessionClock, Timer};
use super::events::SessionEvent;
use super::phase::{GameStateMachine, SessionPhase};
use super::result::{CompletionReason, SessionReport, SessionResult};
use super::scheduler::{Scheduler, TaskHandle};
use super::score::ScoreTracker;
use crate::audio::SoundCue;
use crate::host::Reporter;
use crate::settings::{SessionParams, SessionSettings};

/// Actions that can be deferred; `Game` carries the variant's own actions
#[derive(Debug, Clone, PartialEq)]
pub enum DelayedAction<A> {
    /// Leave the intro and start the clock
    StartTime,
    GameComplete,
    ShowCloseButton,
    Quit,
    Game(A),
}

/// How the session is left after completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishPlan {
    pub show_close_button: bool,
    /// Seconds before the close button appears / the automatic quit
    pub delay: f64,
}

impl FinishPlan {
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self {
            show_close_button: settings.show_close_button,
            delay: settings.end_game_delay,
        }
    }
}

#[derive(Debug)]
pub struct SessionCore<A> {
    settings: SessionSettings,
    params: SessionParams,
    pub machine: GameStateMachine,
    pub clock: SessionClock,
    pub timer: Timer,
    pub score: ScoreTracker,
    pub scheduler: Scheduler<DelayedAction<A>>,
    events: Vec<SessionEvent>,
    /// Active time at which the clock started
    session_start: f64,
    started: bool,
    complete: bool,
    restarted: bool,
    completion_requested: bool,
    outcome: Option<SessionResult>,
    close_button: Option<TaskHandle>,
    closed: bool,
    /// Sessions created so far (restarts included)
    session_index: u64,
}

impl<A> SessionCore<A> {
    pub fn new(settings: SessionSettings, params: SessionParams) -> Self {
        let timer = Timer::new(params.time_limit);
        Self {
            settings,
            params,
            machine: GameStateMachine::new(),
            clock: SessionClock::new(),
            timer,
            score: ScoreTracker::new(),
            scheduler: Scheduler::new(),
            events: Vec::new(),
            session_start: 0.0,
            started: false,
            complete: false,
            restarted: false,
            completion_requested: false,
            outcome: None,
            close_button: None,
            closed: false,
            session_index: 0,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    // === Phase ===

    pub fn phase(&self) -> SessionPhase {
        self.machine.current()
    }

    #[inline]
    pub fn is(&self, phase: SessionPhase) -> bool {
        self.machine.is(phase)
    }

    #[inline]
    pub fn in_range(&self, lo: SessionPhase, hi: SessionPhase) -> bool {
        self.machine.in_range(lo, hi)
    }

    /// Transition and publish. Entering `Completing` freezes the score.
    pub fn enter(&mut self, phase: SessionPhase) -> bool {
        if !self.machine.enter(phase) {
            return false;
        }
        if phase == SessionPhase::Completing {
            self.score.freeze();
        }
        self.emit(SessionEvent::PhaseChanged(phase));
        true
    }

    /// Forced reset to `Inited`
    pub(crate) fn reset_phase(&mut self) {
        self.machine.reset();
        self.emit(SessionEvent::PhaseChanged(SessionPhase::Inited));
    }

    pub fn pause(&mut self) -> bool {
        if !self.enter(SessionPhase::Paused) {
            return false;
        }
        self.clock.pause();
        true
    }

    pub fn play(&mut self) -> bool {
        if !self.is(SessionPhase::Paused) {
            return false;
        }
        self.clock.resume();
        self.enter(SessionPhase::InProgress)
    }

    // === Events ===

    pub fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    pub fn play_sound(&mut self, cue: SoundCue) {
        self.emit(SessionEvent::Sound(cue));
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // === Scheduling ===

    pub fn schedule(&mut self, delay: f64, action: DelayedAction<A>) -> TaskHandle {
        let now = self.clock.now();
        self.scheduler.schedule(now, delay, action)
    }

    pub fn schedule_game(&mut self, delay: f64, action: A) -> TaskHandle {
        self.schedule(delay, DelayedAction::Game(action))
    }

    pub(crate) fn set_close_button(&mut self, handle: Option<TaskHandle>) {
        self.close_button = handle;
    }

    pub(crate) fn cancel_close_button(&mut self) {
        if let Some(handle) = self.close_button.take() {
            self.scheduler.cancel(handle);
        }
    }

    // === Lifecycle flags ===

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn was_restarted(&self) -> bool {
        self.restarted
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn session_index(&self) -> u64 {
        self.session_index
    }

    /// Seed for the current session's content
    pub fn session_seed(&self) -> u64 {
        self.params
            .seed
            .wrapping_add(self.session_index.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    pub fn outcome(&self) -> Option<&SessionResult> {
        self.outcome.as_ref()
    }

    pub fn is_reported(&self) -> bool {
        self.outcome.is_some()
    }

    /// Active play time since the clock started; never negative
    pub fn elapsed(&self) -> f64 {
        if !self.started {
            return 0.0;
        }
        (self.clock.active_time() - self.session_start).max(0.0)
    }

    pub(crate) fn mark_started(&mut self) {
        self.clock.clear_pauses();
        self.session_start = self.clock.active_time();
        self.started = true;
    }

    pub(crate) fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub(crate) fn mark_restarted(&mut self) {
        self.restarted = true;
    }

    pub(crate) fn close(&mut self) {
        self.scheduler.teardown();
        self.closed = true;
    }

    /// Drop everything tied to the current session and count a new one
    pub(crate) fn reset_session(&mut self) {
        self.scheduler.teardown();
        self.timer = Timer::new(self.params.time_limit);
        self.score = ScoreTracker::new();
        self.started = false;
        self.complete = false;
        self.completion_requested = false;
        self.outcome = None;
        self.close_button = None;
        self.session_index += 1;
    }

    // === Completion ===

    /// Evaluate a completion predicate; on success enter `Completing`.
    ///
    /// With `auto_complete` the completion itself runs right after the
    /// current call (no delay) or as a delayed action.
    pub fn check_complete(&mut self, is_complete: bool, auto_complete: bool, delay: f64) -> bool {
        if self.complete {
            return true;
        }
        if !is_complete {
            return false;
        }
        self.complete = true;
        self.enter(SessionPhase::Completing);
        if auto_complete {
            if delay <= 0.0 {
                self.completion_requested = true;
            } else {
                self.schedule(delay, DelayedAction::GameComplete);
            }
        }
        true
    }

    pub(crate) fn take_completion_request(&mut self) -> bool {
        std::mem::take(&mut self.completion_requested)
    }

    /// Build the result and hand it to the reporter, at most once per session
    pub fn report<R: Reporter + ?Sized>(
        &mut self,
        reporter: &mut R,
        reason: CompletionReason,
        was_successful: bool,
    ) -> bool {
        if self.outcome.is_some() {
            log::debug!("Session already reported, dropping {:?}", reason);
            return false;
        }
        let result = SessionResult {
            score: self.score.score(),
            errors: self.score.errors(),
            was_successful,
            elapsed: self.elapsed(),
            reason,
        };
        log::info!(
            "Game complete: {} (complexity {}) reason={:?} time={:.1}/{} score={} errors={}",
            self.params.game_id,
            self.params.complexity,
            reason,
            result.elapsed,
            self.params.time_limit,
            result.score,
            result.errors
        );
        reporter.report(&SessionReport {
            game_id: self.params.game_id.clone(),
            complexity: self.params.complexity,
            result: result.clone(),
        });
        self.outcome = Some(result);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RecordingHost;

    fn core() -> SessionCore<()> {
        SessionCore::new(SessionSettings::default(), SessionParams::default())
    }

    fn to_in_progress(core: &mut SessionCore<()>) {
        core.enter(SessionPhase::Intro);
        core.enter(SessionPhase::Ready);
        core.enter(SessionPhase::InProgress);
        core.mark_started();
    }

    #[test]
    fn test_pause_play_excludes_window() {
        let mut core = core();
        to_in_progress(&mut core);
        core.clock.advance(4.0);
        assert!(core.pause());
        core.clock.advance(10.0);
        assert!(core.play());
        core.clock.advance(1.0);
        assert!((core.elapsed() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_phase_events_published() {
        let mut core = core();
        to_in_progress(&mut core);
        assert!(!core.enter(SessionPhase::Finished));
        let phases: Vec<_> = core
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::PhaseChanged(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![SessionPhase::Intro, SessionPhase::Ready, SessionPhase::InProgress]
        );
    }

    #[test]
    fn test_check_complete_freezes_and_requests() {
        let mut core = core();
        to_in_progress(&mut core);
        core.score.record_success();
        assert!(!core.check_complete(false, true, 0.0));
        assert!(core.check_complete(true, true, 0.0));
        assert!(core.is(SessionPhase::Completing));
        core.score.record_success();
        assert_eq!(core.score.score(), 1);
        assert!(core.take_completion_request());
        assert!(!core.take_completion_request());
    }

    #[test]
    fn test_delayed_completion_is_scheduled() {
        let mut core = core();
        to_in_progress(&mut core);
        core.check_complete(true, true, 2.0);
        assert!(!core.take_completion_request());
        assert_eq!(core.scheduler.pending(), 1);
    }

    #[test]
    fn test_report_once() {
        let mut core = core();
        let mut host = RecordingHost::default();
        to_in_progress(&mut core);
        assert!(core.report(&mut host, CompletionReason::Failure, false));
        assert!(!core.report(&mut host, CompletionReason::Success, true));
        assert_eq!(host.reports.len(), 1);
        assert_eq!(host.reports[0].result.reason, CompletionReason::Failure);
    }

    #[test]
    fn test_session_seed_changes_per_session() {
        let mut core = core();
        let first = core.session_seed();
        core.reset_session();
        assert_ne!(first, core.session_seed());
    }
}
