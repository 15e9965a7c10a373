mod audio;
mod audio_api;
mod config;
mod loader;
mod model;
mod notes;
mod pattern;
mod players;
mod sched;
mod session;
mod shared;
mod tui;
mod vis;

use std::path::PathBuf;
use std::time::Duration;

use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use audio_api::AudioCommand;
use model::{Inference, SyncopateModel};
use notes::DrumMap;
use sched::AudioScheduler;
use session::Session;
use shared::{DisplayState, InputEvent};
use vis::{VAR_STATUS, VAR_STEP, VisValue, Visualization};

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope

    let project_dir: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let config = config::load_config(&project_dir).unwrap_or_default();

    let audio = audio::start_audio()?;
    audio.send(AudioCommand::SetBpm(config.bpm));
    players::register_players(&audio, &project_dir.join(&config.sample_dir), audio.sample_rate());

    // model construction failure is caught inside the session: the demo
    // keeps running, permanently not ready
    let model: anyhow::Result<Box<dyn Inference>> = match &config.model_path {
        Some(path) => SyncopateModel::from_file(path).map(|m| Box::new(m) as Box<dyn Inference>),
        None => Ok(Box::new(SyncopateModel::builtin())),
    };
    let mut session = Session::new(
        model,
        DrumMap::standard(),
        players::instrument_names(),
        config.note_dropout,
        config.onset_threshold,
    );

    let mut scheduler = AudioScheduler::new(audio.command_sender());
    let mut display = DisplayState::default();
    let transport = audio.command_sender();

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps

    loop {
        // one generation batch per tick until the matrix is full
        session.tick_fill();

        // step cursor follows the audio clock through the draw channel
        while let Some(step) = audio.poll_step() {
            display.set_variable(VAR_STEP, VisValue::Step(step));
        }
        display.set_variable(VAR_STATUS, VisValue::Text(session.status()));

        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &display);
        })?;

        for event in tui::input::poll_input(tick_rate)? {
            match event {
                InputEvent::Syncopate => session.syncopate(&mut scheduler, &mut display),
                InputEvent::PlayPause => session.play_pause(&transport, &mut display),
                InputEvent::Quit => {
                    drop(term);
                    return Ok(());
                }
            }
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
