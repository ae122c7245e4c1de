//! The word tunnel mini-game
//!
//! The player drags to fly through a scrolling tunnel and eats the correct
//! words. Correct words fill the reward ladder; a full ladder completes the
//! session. Wrong words and wall crashes cost a slot and slow the tunnel.

use glam::Vec2;
use serde_json::Value;

use super::difficulty::DifficultyController;
use super::generator::{TunnelGenerator, TunnelGeometry};
use super::scroll::Scroll;
use super::spawn::{ActiveWord, SpawnRules, SpawnScheduler, SpawnableWord, WordPools};
use crate::audio::SoundCue;
use crate::host::{CreditKind, NavigationRequest, Progression, SessionHost, VocabularyFilter};
use crate::session::{
    DelayedAction, Entity, EffectKind, FinishPlan, MiniGame, PresentCommand, RewardLadder,
    ScoreTracker, SessionCore, SessionEvent, SessionPhase,
};
use crate::settings::{GameConfig, TunnelParams, TunnelSettings};

/// Store key for the active seconds of the first successful session
pub const FIRST_COMPLETION_KEY: &str = "tunnelFirstCompletionTime";

/// Seed offset so spawning and the lane walk draw from different streams
const SPAWN_STREAM: u64 = 0xA076_1D64_78BD_642F;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TunnelInput {
    DragBegin,
    DragEnd,
    /// Player hit a wall at the given world position
    Crash { at: Vec2 },
    /// Player swallowed the active word with this id
    WordEaten(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelAction {
    CrashRecovery,
}

/// Everything that lives for exactly one session
#[derive(Debug, Clone)]
struct TunnelContent {
    generator: TunnelGenerator,
    spawner: SpawnScheduler,
    difficulty: DifficultyController,
    ladder: RewardLadder,
    scroll: Scroll,
    player_active: bool,
    dragging: bool,
}

impl TunnelContent {
    fn player_spawn_point(&self) -> Vec2 {
        self.generator.tunnel_center(self.generator.window_center())
    }
}

#[derive(Debug, Clone)]
pub struct TunnelGame {
    settings: TunnelSettings,
    params: TunnelParams,
    content: Option<TunnelContent>,
    /// Unique normalized words eaten this session
    eaten_words: Vec<String>,
}

impl TunnelGame {
    pub fn new(settings: TunnelSettings, params: TunnelParams) -> Self {
        Self {
            settings: settings.sanitized(),
            params,
            content: None,
            eaten_words: Vec::new(),
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.tunnel.clone(), config.tunnel_params.clone())
    }

    pub fn settings(&self) -> &TunnelSettings {
        &self.settings
    }

    /// Beginner level gets short two-syllable words; higher levels are
    /// unrestricted within the level
    pub fn vocabulary_filter(&self) -> VocabularyFilter {
        if self.params.word_complexity == 0 {
            VocabularyFilter {
                level: 1,
                and_below: true,
                only_active: false,
                block_count: 2,
                letter_count: 3,
            }
        } else {
            VocabularyFilter {
                level: self.params.word_complexity,
                and_below: true,
                only_active: false,
                block_count: -1,
                letter_count: -1,
            }
        }
    }

    /// Text the presenter shows for a word
    pub fn display_text(&self, word: &SpawnableWord) -> String {
        let text = if self.params.colorized_syllables {
            word.text.clone()
        } else {
            word.normalized()
        };
        if !self.params.capitalized {
            return text;
        }
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Experience per word: full credit unless errors outweigh the score
    pub fn experience_points(score: &ScoreTracker) -> f32 {
        let (s, e) = (score.score(), score.errors());
        if s < e {
            0.1
        } else if s < e * 2 {
            0.3
        } else {
            1.0
        }
    }

    pub fn speed(&self) -> Option<f32> {
        self.content.as_ref().map(|c| c.difficulty.speed())
    }

    pub fn ladder(&self) -> Option<&RewardLadder> {
        self.content.as_ref().map(|c| &c.ladder)
    }

    pub fn tunnel(&self) -> Option<&TunnelGenerator> {
        self.content.as_ref().map(|c| &c.generator)
    }

    pub fn active_words(&self) -> &[ActiveWord] {
        self.content
            .as_ref()
            .map(|c| c.spawner.active())
            .unwrap_or(&[])
    }

    /// World position the player flies at
    pub fn player_position(&self) -> Option<Vec2> {
        self.content.as_ref().map(|c| {
            let tile = c.generator.geometry().tile.x;
            Vec2::new(
                c.scroll.scrolled_px(tile) + tile / 2.0,
                c.player_spawn_point().y,
            )
        })
    }

    pub fn eaten_words(&self) -> &[String] {
        &self.eaten_words
    }

    pub fn is_dragging(&self) -> bool {
        self.content.as_ref().is_some_and(|c| c.dragging)
    }

    pub fn is_player_active(&self) -> bool {
        self.content.as_ref().is_some_and(|c| c.player_active)
    }

    fn crash(&mut self, core: &mut SessionCore<TunnelAction>, at: Vec2) {
        if !core.is(SessionPhase::InProgress) {
            return;
        }
        let Some(content) = self.content.as_mut() else {
            return;
        };
        if !content.player_active {
            return;
        }
        content.player_active = false;
        content.dragging = false;
        content.scroll.stop();

        core.pause();
        core.emit(SessionEvent::Effect(EffectKind::Crash { at }));
        core.emit(SessionEvent::Present(PresentCommand::Hide {
            entity: Entity::Player,
            duration: 0.2,
        }));
        if let Some(slot) = content.ladder.drop_last() {
            core.emit(SessionEvent::Present(PresentCommand::Hide {
                entity: Entity::RewardSlot(slot),
                duration: 0.5,
            }));
        }
        log::info!("Crash at {}, {} slots left", at, content.ladder.filled());
        core.schedule_game(self.settings.crash_recovery_delay, TunnelAction::CrashRecovery);
    }

    fn recover(&mut self, core: &mut SessionCore<TunnelAction>) {
        let Some(content) = self.content.as_mut() else {
            return;
        };
        if core.is(SessionPhase::Paused) {
            core.play();
        } else if !core.is(SessionPhase::InProgress) {
            return;
        }
        content.player_active = true;
        core.emit(SessionEvent::Present(PresentCommand::Spawn {
            entity: Entity::Player,
            at: content.player_spawn_point(),
            duration: 1.0,
        }));
        content.difficulty.on_error(&mut core.score);
    }

    fn eat(&mut self, core: &mut SessionCore<TunnelAction>, id: u32) {
        if !core.is(SessionPhase::InProgress) {
            return;
        }
        let Some(content) = self.content.as_mut() else {
            return;
        };
        if !content.player_active {
            return;
        }
        let Some(eaten) = content.spawner.eat(id) else {
            log::debug!("Ignoring eat of unknown word {}", id);
            return;
        };
        let clean = eaten.word.normalized();
        core.play_sound(SoundCue::Word(clean.clone()));

        if eaten.word.eatable {
            core.play_sound(SoundCue::Eatable);
            core.emit(SessionEvent::Present(PresentCommand::Hide {
                entity: Entity::Word(id),
                duration: 0.2,
            }));
            core.score.record_success();
            content.difficulty.on_success(&mut core.score);
            if let Some(slot) = content.ladder.fill() {
                core.emit(SessionEvent::Present(PresentCommand::Spawn {
                    entity: Entity::RewardSlot(slot),
                    at: eaten.position,
                    duration: 1.0,
                }));
            }
            if !self.eaten_words.contains(&clean) {
                self.eaten_words.push(clean);
            }
        } else {
            core.play_sound(SoundCue::NotEatable);
            core.emit(SessionEvent::Present(PresentCommand::Fade {
                entity: Entity::Word(id),
                alpha: 0.3,
                duration: 0.2,
            }));
            core.score.record_error();
            content.difficulty.on_error(&mut core.score);
            if let Some(slot) = content.ladder.drop_last() {
                core.emit(SessionEvent::Present(PresentCommand::Hide {
                    entity: Entity::RewardSlot(slot),
                    duration: 0.5,
                }));
            }
        }
    }
}

impl MiniGame for TunnelGame {
    type Action = TunnelAction;
    type Input = TunnelInput;

    fn create_content<H: SessionHost>(
        &mut self,
        core: &mut SessionCore<TunnelAction>,
        host: &mut H,
    ) {
        let entries = host.words(&self.vocabulary_filter());
        let pools = WordPools::from_entries(&entries);
        log::info!(
            "Tunnel words: {} eatable, {} not eatable",
            pools.eatable.len(),
            pools.not_eatable.len()
        );

        let seed = core.session_seed();
        let mut generator =
            TunnelGenerator::new(TunnelGeometry::from_settings(&self.settings), seed);
        generator.fill_window(0);

        self.content = Some(TunnelContent {
            generator,
            spawner: SpawnScheduler::new(
                SpawnRules::from_settings(&self.settings),
                pools,
                seed ^ SPAWN_STREAM,
            ),
            difficulty: DifficultyController::new(self.params.tunnel_speed, &self.settings),
            ladder: RewardLadder::new(self.settings.reward_slots),
            scroll: Scroll::default(),
            player_active: false,
            dragging: false,
        });
        self.eaten_words.clear();
        core.emit(SessionEvent::Present(PresentCommand::Hide {
            entity: Entity::Player,
            duration: 0.0,
        }));
    }

    fn remove_content(&mut self, core: &mut SessionCore<TunnelAction>) {
        if let Some(content) = self.content.take() {
            for word in content.spawner.active() {
                core.emit(SessionEvent::Present(PresentCommand::Hide {
                    entity: Entity::Word(word.id),
                    duration: 0.0,
                }));
            }
        }
        self.eaten_words.clear();
        core.emit(SessionEvent::Present(PresentCommand::Hide {
            entity: Entity::Player,
            duration: 0.0,
        }));
    }

    fn start(&mut self, core: &mut SessionCore<TunnelAction>) {
        if let Some(content) = self.content.as_mut() {
            content.player_active = true;
            core.emit(SessionEvent::Present(PresentCommand::Spawn {
                entity: Entity::Player,
                at: content.player_spawn_point(),
                duration: 0.3,
            }));
        }
        core.schedule(self.settings.intro_delay, DelayedAction::StartTime);
    }

    fn time_started(&mut self, core: &mut SessionCore<TunnelAction>) {
        core.play_sound(SoundCue::Intro);
        core.play_sound(SoundCue::Manual);
    }

    fn update(&mut self, core: &mut SessionCore<TunnelAction>, dt: f64) {
        let Some(content) = self.content.as_mut() else {
            return;
        };
        let tile = content.generator.geometry().tile.x;
        let full_speed = content.difficulty.scroll_speed_tiles(tile) as f64;
        let target = if content.dragging { full_speed } else { 0.0 };
        let rate = full_speed / self.settings.acceleration_time as f64;
        content.scroll.step(target, rate, dt);

        let column = content.scroll.column();
        if column > content.generator.window_center() {
            content.generator.advance_window(column);
        }

        let scrolled = content.scroll.scrolled_px(tile);
        if let Some(word) = content.spawner.update(scrolled, &content.generator) {
            core.emit(SessionEvent::Present(PresentCommand::Spawn {
                entity: Entity::Word(word.id),
                at: word.position,
                duration: 0.3,
            }));
        }

        let left_edge = scrolled - self.settings.view_width / 2.0;
        for id in content.spawner.collect_garbage(left_edge) {
            core.emit(SessionEvent::Present(PresentCommand::Hide {
                entity: Entity::Word(id),
                duration: 0.0,
            }));
        }
    }

    fn handle_input(&mut self, core: &mut SessionCore<TunnelAction>, input: TunnelInput) {
        match input {
            TunnelInput::DragBegin => {
                let allowed = core.in_range(SessionPhase::Ready, SessionPhase::InProgress);
                if let Some(content) = self.content.as_mut() {
                    if allowed && content.player_active {
                        content.dragging = true;
                    }
                }
            }
            TunnelInput::DragEnd => {
                if let Some(content) = self.content.as_mut() {
                    content.dragging = false;
                }
            }
            TunnelInput::Crash { at } => self.crash(core, at),
            TunnelInput::WordEaten(id) => self.eat(core, id),
        }
    }

    fn run_action(&mut self, core: &mut SessionCore<TunnelAction>, action: TunnelAction) {
        match action {
            TunnelAction::CrashRecovery => self.recover(core),
        }
    }

    fn is_complete(&self) -> bool {
        self.content.as_ref().is_some_and(|c| c.ladder.is_full())
    }

    fn compute_reward<H: Progression>(&self, core: &SessionCore<TunnelAction>, host: &mut H) {
        let points = Self::experience_points(&core.score);
        let unhinted = (25.0 + core.params().complexity as f32) / 25.0 * points;
        for word in &self.eaten_words {
            host.credit(word, CreditKind::Reading, points);
            host.credit(word, CreditKind::UnhintedReading, unhinted);
        }
    }

    fn on_complete<H: SessionHost>(
        &mut self,
        core: &mut SessionCore<TunnelAction>,
        host: &mut H,
    ) -> FinishPlan {
        if let Some(content) = self.content.as_mut() {
            content.player_active = false;
            content.dragging = false;
        }
        core.emit(SessionEvent::Present(PresentCommand::Hide {
            entity: Entity::Player,
            duration: 0.5,
        }));
        core.play_sound(SoundCue::EndGame);

        let successful = core.outcome().is_some_and(|r| r.was_successful);
        if successful && host.set_once(FIRST_COMPLETION_KEY, Value::from(core.elapsed())) {
            log::info!("First tunnel completion in {:.1}s", core.elapsed());
        }

        FinishPlan {
            show_close_button: false,
            delay: self.settings.finish_delay,
        }
    }

    fn navigation_target(&self, core: &SessionCore<TunnelAction>) -> NavigationRequest {
        if core.is_complete() {
            NavigationRequest::Advance
        } else {
            NavigationRequest::Return {
                steps: core.settings().return_steps_back,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::LaunchHistory;
    use crate::host::RecordingHost;
    use crate::persistence::KeyValueStore;
    use crate::session::{CompletionReason, SessionOrchestrator};
    use crate::settings::{SessionParams, SessionSettings};

    const DT: f64 = 1.0 / 60.0;

    fn launched() -> (SessionOrchestrator<TunnelGame>, RecordingHost) {
        let mut host = RecordingHost::with_words(&["ca^t", "hat", "bat"], &["dog", "fog", "log"]);
        let mut s = SessionOrchestrator::new(
            TunnelGame::new(TunnelSettings::default(), TunnelParams::default()),
            SessionSettings::default(),
            SessionParams::default(),
        );
        s.launch(&mut host, &mut LaunchHistory::new(), 0.0);
        run(&mut s, &mut host, 0.6);
        assert_eq!(s.phase(), SessionPhase::InProgress);
        (s, host)
    }

    fn run(s: &mut SessionOrchestrator<TunnelGame>, host: &mut RecordingHost, secs: f64) {
        for _ in 0..(secs / DT).round() as usize {
            s.tick(host, DT);
        }
    }

    /// Drag until a fresh word of the category is in the tunnel
    fn next_word(
        s: &mut SessionOrchestrator<TunnelGame>,
        host: &mut RecordingHost,
        eatable: bool,
    ) -> u32 {
        s.handle(host, TunnelInput::DragBegin);
        for _ in 0..60 * 120 {
            if let Some(w) = s
                .game()
                .active_words()
                .iter()
                .find(|w| w.word.eatable == eatable && !w.eaten)
            {
                return w.id;
            }
            s.tick(host, DT);
        }
        panic!("no word spawned");
    }

    fn filled(s: &SessionOrchestrator<TunnelGame>) -> usize {
        s.game().ladder().map_or(0, |l| l.filled())
    }

    #[test]
    fn test_full_ladder_completes_once() {
        let (mut s, mut host) = launched();
        for _ in 0..5 {
            let id = next_word(&mut s, &mut host, true);
            s.handle(&mut host, TunnelInput::WordEaten(id));
        }
        assert_eq!(s.phase(), SessionPhase::Finished);
        assert_eq!(host.reports.len(), 1);
        let result = &host.reports[0].result;
        assert_eq!(result.reason, CompletionReason::Success);
        assert_eq!(result.score, 5);
        assert!(host.store.get(FIRST_COMPLETION_KEY).is_some());

        let words = s.game().eaten_words().len();
        assert!(words >= 2);
        assert_eq!(host.credits.len(), words * 2);
        assert!(host.credits.iter().all(|c| c.word != "ca^t"));

        // Later eats are ignored and the session advances after the delay
        if let Some(id) = s.game().active_words().first().map(|w| w.id) {
            s.handle(&mut host, TunnelInput::WordEaten(id));
        }
        run(&mut s, &mut host, 5.5);
        assert_eq!(host.reports.len(), 1);
        assert_eq!(host.navigations, vec![NavigationRequest::Advance]);
    }

    #[test]
    fn test_crash_drops_slot_and_recovers() {
        let (mut s, mut host) = launched();
        let id = next_word(&mut s, &mut host, true);
        s.handle(&mut host, TunnelInput::WordEaten(id));
        assert_eq!(filled(&s), 1);
        let speed = s.game().speed().unwrap();
        let elapsed = s.core().elapsed();

        s.handle(&mut host, TunnelInput::Crash { at: Vec2::ZERO });
        assert_eq!(s.phase(), SessionPhase::Paused);
        assert_eq!(filled(&s), 0);
        assert!(!s.game().is_player_active());

        // Paused: further crashes, eats and drags are ignored
        s.handle(&mut host, TunnelInput::Crash { at: Vec2::ZERO });
        s.handle(&mut host, TunnelInput::DragBegin);
        assert!(!s.game().is_dragging());
        assert_eq!(filled(&s), 0);

        run(&mut s, &mut host, 1.1);
        assert_eq!(s.phase(), SessionPhase::InProgress);
        assert!(s.game().is_player_active());
        assert_eq!(s.core().score.errors(), 0);
        assert_eq!(s.core().score.streak(), 0);
        assert!((s.game().speed().unwrap() - speed / 1.1).abs() < 1e-3);
        assert!(s.core().elapsed() < elapsed + 0.2);

        // Crash with an empty ladder stays at zero
        s.handle(&mut host, TunnelInput::Crash { at: Vec2::ZERO });
        assert_eq!(filled(&s), 0);
    }

    #[test]
    fn test_wrong_pick_counts_error() {
        let (mut s, mut host) = launched();
        let good = next_word(&mut s, &mut host, true);
        s.handle(&mut host, TunnelInput::WordEaten(good));
        let bad = next_word(&mut s, &mut host, false);
        s.handle(&mut host, TunnelInput::WordEaten(bad));
        s.handle(&mut host, TunnelInput::WordEaten(bad));

        assert_eq!(s.core().score.score(), 1);
        assert_eq!(s.core().score.errors(), 1);
        assert_eq!(filled(&s), 0);
        let eaten = s.game().active_words().iter().find(|w| w.id == bad);
        assert!(eaten.is_some_and(|w| w.eaten));
    }

    #[test]
    fn test_drag_only_after_start() {
        let mut host = RecordingHost::with_words(&["cat"], &["dog"]);
        let mut s = SessionOrchestrator::new(
            TunnelGame::new(TunnelSettings::default(), TunnelParams::default()),
            SessionSettings::default(),
            SessionParams::default(),
        );
        s.launch(&mut host, &mut LaunchHistory::new(), 0.0);
        s.handle(&mut host, TunnelInput::DragBegin);
        assert!(!s.game().is_dragging());

        run(&mut s, &mut host, 0.6);
        s.handle(&mut host, TunnelInput::DragBegin);
        assert!(s.game().is_dragging());
        run(&mut s, &mut host, 1.0);
        assert!(s.core().score.score() == 0);
        assert!(s.game().tunnel().is_some_and(|t| t.window_center() > 0));

        s.handle(&mut host, TunnelInput::DragEnd);
        assert!(!s.game().is_dragging());
    }

    #[test]
    fn test_quit_returns_and_restart_rebuilds() {
        let (mut s, mut host) = launched();
        let id = next_word(&mut s, &mut host, true);
        s.handle(&mut host, TunnelInput::WordEaten(id));
        s.restart_game(&mut host);
        assert_eq!(host.queries.len(), 2);
        assert_eq!(filled(&s), 0);
        assert!(s.game().eaten_words().is_empty());
        assert!(s.game().active_words().is_empty());

        run(&mut s, &mut host, 0.6);
        s.quit_game(&mut host, None);
        assert_eq!(host.navigations, vec![NavigationRequest::Return { steps: 1 }]);
        assert!(host.store.get(FIRST_COMPLETION_KEY).is_none());
    }

    #[test]
    fn test_vocabulary_filter_by_complexity() {
        let beginner = TunnelGame::new(TunnelSettings::default(), TunnelParams::default());
        let filter = beginner.vocabulary_filter();
        assert_eq!((filter.level, filter.block_count, filter.letter_count), (1, 2, 3));
        assert!(!filter.only_active);

        let advanced = TunnelGame::new(
            TunnelSettings::default(),
            TunnelParams {
                word_complexity: 4,
                ..Default::default()
            },
        );
        let filter = advanced.vocabulary_filter();
        assert_eq!((filter.level, filter.block_count, filter.letter_count), (4, -1, -1));
        assert!(filter.and_below);
        assert!(!filter.only_active);
    }

    #[test]
    fn test_experience_points() {
        let mut score = ScoreTracker::new();
        assert_eq!(TunnelGame::experience_points(&score), 1.0);
        score.record_success();
        score.record_error();
        assert_eq!(TunnelGame::experience_points(&score), 0.3);
        score.record_error();
        assert_eq!(TunnelGame::experience_points(&score), 0.1);
        for _ in 0..3 {
            score.record_success();
        }
        assert_eq!(TunnelGame::experience_points(&score), 1.0);
    }

    #[test]
    fn test_display_text() {
        let word = SpawnableWord {
            text: "ca^t".to_string(),
            eatable: true,
            source_id: 0,
        };
        let game = TunnelGame::new(TunnelSettings::default(), TunnelParams::default());
        assert_eq!(game.display_text(&word), "Cat");

        let game = TunnelGame::new(
            TunnelSettings::default(),
            TunnelParams {
                colorized_syllables: true,
                capitalized: false,
                ..Default::default()
            },
        );
        assert_eq!(game.display_text(&word), "ca^t");
    }
}
