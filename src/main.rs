//! Word Tunnel headless runner
//!
//! Plays one session with a scripted bot against an in-memory host and
//! prints the report. Pass a JSON config path to override the defaults.

use word_tunnel::audio::{AudioMixer, SoundCue};
use word_tunnel::consts::{FRAME_DT, MAX_SUBSTEPS, OFFER_COOLDOWN};
use word_tunnel::host::RecordingHost;
use word_tunnel::session::{SessionEvent, SessionOrchestrator};
use word_tunnel::{GameConfig, LaunchHistory, TunnelGame, TunnelInput};

/// Host frame time; the session runs at FRAME_DT inside it
const HOST_DT: f64 = 1.0 / 30.0;
/// Give up after this much wall time
const MAX_RUN_TIME: f64 = 180.0;
/// The bot hits a wall once, at this time
const CRASH_AT: f64 = 12.0;
/// Every n-th wrong word the bot swallows by mistake
const MISTAKE_EVERY: u32 = 3;

const EATABLE: &[&str] = &["cat", "ma^ma", "sun", "hat", "pa^pa", "dog"];
const NOT_EATABLE: &[&str] = &["xq", "zzt", "qwv", "brk", "mmn"];

/// Drives inputs from what it sees near the player
struct Bot {
    crashed: bool,
    wrong_seen: u32,
    skipped: Vec<u32>,
}

impl Bot {
    fn new() -> Self {
        Self {
            crashed: false,
            wrong_seen: 0,
            skipped: Vec::new(),
        }
    }

    fn inputs(&mut self, game: &TunnelGame, now: f64) -> Vec<TunnelInput> {
        let Some(player) = game.player_position() else {
            return Vec::new();
        };
        let mut inputs = vec![TunnelInput::DragBegin];

        if !self.crashed && now >= CRASH_AT && game.is_player_active() {
            self.crashed = true;
            inputs.push(TunnelInput::Crash { at: player });
            return inputs;
        }

        let reach = game.settings().player_size / 2.0;
        for word in game.active_words() {
            if word.eaten || self.skipped.contains(&word.id) {
                continue;
            }
            if (word.position.x - player.x).abs() > reach {
                continue;
            }
            if word.word.eatable {
                inputs.push(TunnelInput::WordEaten(word.id));
            } else {
                self.wrong_seen += 1;
                if self.wrong_seen % MISTAKE_EVERY == 0 {
                    inputs.push(TunnelInput::WordEaten(word.id));
                } else {
                    self.skipped.push(word.id);
                }
            }
        }
        inputs
    }
}

fn load_config() -> GameConfig {
    let Some(path) = std::env::args().nth(1) else {
        return GameConfig::default();
    };
    match GameConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Could not load {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn log_events(events: Vec<SessionEvent>, mixer: &AudioMixer, game: &TunnelGame) {
    for event in events {
        match event {
            SessionEvent::PhaseChanged(phase) => log::info!("Phase -> {}", phase.as_str()),
            SessionEvent::Sound(cue) => {
                if let Some(volume) = mixer.volume_for(&cue) {
                    match &cue {
                        SoundCue::Word(word) => log::debug!("Say '{}' at {:.2}", word, volume),
                        other => log::debug!("Play {:?} at {:.2}", other, volume),
                    }
                }
            }
            SessionEvent::Present(command) => log::trace!("{:?}", command),
            SessionEvent::Effect(effect) => log::info!("Effect {:?}", effect),
            SessionEvent::TimerVisible(visible) => log::debug!("Timer visible: {}", visible),
            SessionEvent::CloseButtonShown => log::info!("Close button shown"),
            SessionEvent::ExperienceGainShown => {
                log::info!("Words eaten: {:?}", game.eaten_words())
            }
        }
    }
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Word Tunnel (headless) starting...");

    let config = load_config();
    let mut history = LaunchHistory::new();
    if !history.can_offer(0.0, OFFER_COOLDOWN) {
        log::info!("Mini-game offered too recently");
        return;
    }

    let mut host = RecordingHost::with_words(EATABLE, NOT_EATABLE);
    let mixer = AudioMixer::new();
    let mut bot = Bot::new();
    let mut session = SessionOrchestrator::new(
        TunnelGame::from_config(&config),
        config.session.clone(),
        config.params.clone(),
    );

    session.launch(&mut host, &mut history, 0.0);

    let mut now = 0.0;
    let mut accumulator = 0.0;
    while !session.core().is_closed() && now < MAX_RUN_TIME {
        now += HOST_DT;
        accumulator += HOST_DT;

        let mut steps = 0;
        while accumulator >= FRAME_DT && steps < MAX_SUBSTEPS {
            session.tick(&mut host, FRAME_DT);
            accumulator -= FRAME_DT;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS {
            accumulator = 0.0;
        }

        for input in bot.inputs(session.game(), now) {
            session.handle(&mut host, input);
        }
        let events = session.drain_events();
        log_events(events, &mixer, session.game());
    }

    if !session.core().is_closed() {
        log::warn!("Session still running after {:.0}s, quitting", MAX_RUN_TIME);
        session.quit_game(&mut host, None);
    }

    for report in &host.reports {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Could not serialize report: {}", e),
        }
        history.record_result(report.clone());
    }
    log::debug!("History: {}", history.to_json());
    log::info!(
        "Credits: {}, navigation: {:?}, store: {}",
        host.credits.len(),
        host.navigations,
        host.store.to_json()
    );
}
