use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc};

use explorer_leaderboard::{
    backend::{DataSource, MemoryDataSource, RealtimeDbClient},
    leaderboard::{ControllerHandle, RefreshController, SnapshotLoader},
    tui::{ui, App, Event as TuiEvent, EventHandler},
    Settings,
};

pub async fn run_tui(settings: Settings, demo: bool) -> Result<()> {
    // Disable logging to prevent screen corruption
    disable_logging_output();

    let source: Arc<dyn DataSource> = if demo {
        Arc::new(MemoryDataSource::demo())
    } else {
        Arc::new(RealtimeDbClient::new(&settings.backend)?)
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(250);
    let mut controller = RefreshController::new(SnapshotLoader::new(source), &settings.refresh);
    let sender = events.sender();
    controller.subscribe(move |state| {
        let _ = sender.send(TuiEvent::View(state));
    });
    controller.start();

    terminal.clear()?;

    let res = run_app(&mut terminal, App::new(), events, controller.handle());
    controller.shutdown();

    // Always restore terminal state, even if there was an error
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Application error: {}", err);
        Err(err)
    } else {
        Ok(())
    }
}

fn disable_logging_output() {
    // Redirect tracing output to a null writer to prevent screen corruption
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

    let null_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::sink)
        .with_filter(tracing_subscriber::filter::LevelFilter::OFF);

    let _ = tracing_subscriber::registry()
        .with(null_layer)
        .try_init();
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    events: EventHandler,
    handle: ControllerHandle,
) -> Result<()> {
    loop {
        if app.should_quit {
            return Ok(());
        }

        terminal.draw(|f| ui::draw(f, &app))?;

        let event = match events.next() {
            Some(event) => event,
            // poller thread is gone, nothing more will arrive
            None => return Ok(()),
        };

        match event {
            TuiEvent::Key(key) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    app.should_quit = true;
                }
                KeyCode::Char('r') => {
                    let handle = handle.clone();
                    tokio::spawn(async move {
                        handle.refresh().await;
                    });
                }
                KeyCode::Right | KeyCode::Tab => {
                    handle.select_metric(app.select_next_metric());
                }
                KeyCode::Left | KeyCode::BackTab => {
                    handle.select_metric(app.select_previous_metric());
                }
                KeyCode::Char(c @ '1'..='9') => {
                    let index = c as usize - '1' as usize;
                    if let Some(metric) = app.select_metric_at(index) {
                        handle.select_metric(metric);
                    }
                }
                KeyCode::Up => app.move_selection_up(),
                KeyCode::Down => app.move_selection_down(),
                _ => {}
            },
            TuiEvent::View(state) => {
                app.apply(state);
                app.last_updated = handle.last_updated();
            }
            TuiEvent::Resize(_, _) | TuiEvent::Tick => {
                // redraw happens at the top of the loop
            }
        }
    }
}
