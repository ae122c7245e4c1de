//! Mini-game lifecycle driver
//!
//! `SessionOrchestrator` runs the generic flow: create content, intro, start
//! the clock, play, then timeout or completion, finish, report, leave. The
//! game variant plugs in through `MiniGame`.

use std::fmt;

use super::context::{DelayedAction, FinishPlan, SessionCore};
use super::events::{EffectKind, SessionEvent};
use super::phase::SessionPhase;
use super::result::CompletionReason;
use super::score::ScoreTracker;
use crate::audio::SoundCue;
use crate::history::LaunchHistory;
use crate::host::{NavigationRequest, Progression, SessionHost};
use crate::settings::{SessionParams, SessionSettings};

/// Capabilities a game variant provides to the orchestrator
pub trait MiniGame {
    /// Game-specific delayed actions
    type Action: Clone + fmt::Debug;
    /// Game-specific input events (collisions, drags, ...)
    type Input: fmt::Debug;

    /// Build everything for a fresh session
    fn create_content<H: SessionHost>(
        &mut self,
        core: &mut SessionCore<Self::Action>,
        host: &mut H,
    );

    /// Destroy the session's content
    fn remove_content(&mut self, core: &mut SessionCore<Self::Action>);

    /// Intro sequence; must eventually schedule `DelayedAction::StartTime`
    fn start(&mut self, core: &mut SessionCore<Self::Action>) {
        core.schedule(0.0, DelayedAction::StartTime);
    }

    /// Called once the clock is running
    fn time_started(&mut self, _core: &mut SessionCore<Self::Action>) {}

    /// Per-frame update while `InProgress`
    fn update(&mut self, core: &mut SessionCore<Self::Action>, dt: f64);

    fn handle_input(&mut self, core: &mut SessionCore<Self::Action>, input: Self::Input);

    fn run_action(&mut self, _core: &mut SessionCore<Self::Action>, _action: Self::Action) {}

    /// Polled after every update and input while the session is in progress
    fn is_complete(&self) -> bool;

    fn check_success(&self, score: &ScoreTracker) -> bool {
        score.is_successful()
    }

    /// Credit experience for the session so far
    fn compute_reward<H: Progression>(&self, core: &SessionCore<Self::Action>, host: &mut H);

    /// Game-side completion effects; decides how the session is left
    fn on_complete<H: SessionHost>(
        &mut self,
        core: &mut SessionCore<Self::Action>,
        _host: &mut H,
    ) -> FinishPlan {
        FinishPlan::from_settings(core.settings())
    }

    /// Timeout policy when the session does not end on timeout
    fn on_time_out(&mut self, _core: &mut SessionCore<Self::Action>) {}

    fn navigation_target(&self, core: &SessionCore<Self::Action>) -> NavigationRequest {
        NavigationRequest::Return {
            steps: core.settings().return_steps_back,
        }
    }
}

pub struct SessionOrchestrator<G: MiniGame> {
    core: SessionCore<G::Action>,
    game: G,
}

impl<G: MiniGame> SessionOrchestrator<G> {
    pub fn new(game: G, settings: SessionSettings, params: SessionParams) -> Self {
        Self {
            core: SessionCore::new(settings, params),
            game,
        }
    }

    pub fn core(&self) -> &SessionCore<G::Action> {
        &self.core
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn phase(&self) -> SessionPhase {
        self.core.phase()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.core.drain_events()
    }

    /// Create content, record the launch and start the intro
    pub fn launch<H: SessionHost>(
        &mut self,
        host: &mut H,
        history: &mut LaunchHistory,
        launched_at: f64,
    ) {
        if self.core.is_closed() {
            return;
        }
        self.game.create_content(&mut self.core, host);
        history.record_launch(&self.core.params().game_id, launched_at);
        self.start_game();
    }

    pub fn start_game(&mut self) {
        if !self.core.enter(SessionPhase::Intro) {
            return;
        }
        log::info!(
            "Starting {} (session {})",
            self.core.params().game_id,
            self.core.session_index()
        );
        self.game.start(&mut self.core);
    }

    /// Advance one frame: delayed actions, then timeout, then the game
    pub fn tick<H: SessionHost>(&mut self, host: &mut H, dt: f64) {
        if self.core.is_closed() {
            return;
        }
        self.core.clock.advance(dt);
        self.run_due(host);
        if self.core.is_closed() {
            return;
        }

        let now = self.core.clock.active_time();
        if self.core.timer.should_time_out(now) {
            self.time_out(host);
        }

        if self.core.is(SessionPhase::InProgress) {
            self.game.update(&mut self.core, dt);
            self.poll_complete();
        }
        self.process_completion(host);
    }

    /// Forward a game input (collision, drag, ...)
    pub fn handle<H: SessionHost>(&mut self, host: &mut H, input: G::Input) {
        if self.core.is_closed() {
            return;
        }
        self.game.handle_input(&mut self.core, input);
        self.poll_complete();
        self.process_completion(host);
    }

    /// Tear down and start over. A long enough unfinished session is
    /// reported as restarted first.
    pub fn restart_game<H: SessionHost>(&mut self, host: &mut H) {
        if self.core.is_closed() {
            return;
        }
        self.core.mark_restarted();
        if self.core.is_started()
            && !self.core.is_complete()
            && !self.core.is_reported()
            && self.core.elapsed() >= self.core.settings().abort_threshold
        {
            self.game.compute_reward(&self.core, host);
            self.core
                .report(host, CompletionReason::RestartedOverThreshold, false);
        }

        self.remove_content();
        self.core.reset_phase();
        self.game.create_content(&mut self.core, host);
        self.start_game();
    }

    /// Leave the session, now or after `delay` seconds
    pub fn quit_game<H: SessionHost>(&mut self, host: &mut H, delay: Option<f64>) {
        if self.core.is_closed() {
            return;
        }
        if let Some(delay) = delay.filter(|d| *d > 0.0) {
            self.core.schedule(delay, DelayedAction::Quit);
            return;
        }

        if self.core.is_started() && !self.core.is_reported() {
            let reason = CompletionReason::aborted(
                self.core.elapsed(),
                self.core.settings().abort_threshold,
            );
            self.game.compute_reward(&self.core, host);
            self.core.report(host, reason, false);
        }

        let target = self.game.navigation_target(&self.core);
        self.core.emit(SessionEvent::Sound(SoundCue::MusicStop));
        self.core.close();
        log::info!("Leaving session: {:?}", target);
        host.navigate(target);
    }

    pub fn close_button_clicked<H: SessionHost>(&mut self, host: &mut H) {
        if self.core.is_closed() {
            return;
        }
        self.core.play_sound(SoundCue::Click);
        self.quit_game(host, None);
    }

    /// Produce the result for a completed session and start finishing
    pub fn game_complete<H: SessionHost>(&mut self, host: &mut H) {
        self.complete_session(host, false);
    }

    fn complete_session<H: SessionHost>(&mut self, host: &mut H, timed_out: bool) {
        if self.core.is_closed() || self.core.is_reported() {
            return;
        }
        if !self.core.in_range(SessionPhase::InProgress, SessionPhase::Completing) {
            log::debug!("Ignoring completion in phase {}", self.core.phase().as_str());
            return;
        }

        self.core.play();
        if !self.core.is(SessionPhase::Completing) {
            self.core.enter(SessionPhase::Completing);
        }
        self.core.mark_complete();
        let now = self.core.clock.active_time();
        self.core.timer.freeze(now);
        self.core.play_sound(SoundCue::MusicStop);

        let success = !timed_out && self.game.check_success(&self.core.score);
        self.game.compute_reward(&self.core, host);
        let reason = if success {
            CompletionReason::Success
        } else {
            CompletionReason::Failure
        };
        self.core.report(host, reason, success);

        if self.core.settings().show_fireworks_on_complete {
            self.core.emit(SessionEvent::Effect(EffectKind::Celebrate));
        }
        if self.core.settings().show_timer {
            self.core.emit(SessionEvent::TimerVisible(false));
        }

        let plan = self.game.on_complete(&mut self.core, host);
        self.finish_game(host, plan);
    }

    fn finish_game<H: SessionHost>(&mut self, host: &mut H, plan: FinishPlan) {
        self.core.enter(SessionPhase::Finished);
        self.core.emit(SessionEvent::ExperienceGainShown);

        if plan.show_close_button {
            let handle = self.core.schedule(plan.delay, DelayedAction::ShowCloseButton);
            self.core.set_close_button(Some(handle));
        } else {
            self.quit_game(host, Some(plan.delay));
        }
    }

    fn start_time(&mut self) {
        if !self.core.enter(SessionPhase::Ready) || !self.core.enter(SessionPhase::InProgress) {
            return;
        }
        self.core.play_sound(SoundCue::MusicStart);
        self.core.mark_started();

        let now = self.core.clock.active_time();
        self.core.timer.start(now);
        if self.core.settings().show_timer && self.core.timer.is_running() {
            self.core.emit(SessionEvent::TimerVisible(true));
        }
        self.game.time_started(&mut self.core);
    }

    fn time_out<H: SessionHost>(&mut self, host: &mut H) {
        self.core.timer.expire();
        log::info!("Time out after {:.1}s", self.core.elapsed());

        if self.core.params().end_game_on_timeout {
            if self.core.enter(SessionPhase::TimedOut) {
                self.complete_session(host, true);
            }
        } else {
            self.game.on_time_out(&mut self.core);
        }
    }

    fn run_due<H: SessionHost>(&mut self, host: &mut H) {
        let now = self.core.clock.now();
        for task in self.core.scheduler.take_due(now) {
            if self.core.is_closed() || !self.core.scheduler.is_live(task.generation) {
                log::debug!("Dropping stale action {:?}", task.action);
                continue;
            }
            match task.action {
                DelayedAction::StartTime => self.start_time(),
                DelayedAction::GameComplete => self.game_complete(host),
                DelayedAction::ShowCloseButton => {
                    self.core.set_close_button(None);
                    self.core.emit(SessionEvent::CloseButtonShown);
                }
                DelayedAction::Quit => self.quit_game(host, None),
                DelayedAction::Game(action) => self.game.run_action(&mut self.core, action),
            }
            self.process_completion(host);
        }
    }

    fn poll_complete(&mut self) {
        if self.core.is(SessionPhase::InProgress) {
            let done = self.game.is_complete();
            self.core.check_complete(done, true, 0.0);
        }
    }

    fn process_completion<H: SessionHost>(&mut self, host: &mut H) {
        if self.core.take_completion_request() {
            self.game_complete(host);
        }
    }

    fn remove_content(&mut self) {
        self.core.cancel_close_button();
        self.core.reset_session();
        if self.core.settings().show_timer {
            self.core.emit(SessionEvent::TimerVisible(false));
        }
        self.core.play_sound(SoundCue::MusicStop);
        self.game.remove_content(&mut self.core);
    }
}
